/// A contact request. Every field is free text and may be empty; the
/// submitter address is only checked when the reply is sent.
#[derive(Debug)]
pub struct NewContact {
    pub name: String,
    pub company: String,
    pub email: String,
    /// Channel the lead came from, e.g. "google" or "referral".
    pub source: String,
    pub message: String,
}
