#[derive(Debug)]
pub struct NewBooking {
    pub name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    /// Calendar date as submitted. Together with `email` it identifies a booking.
    pub date: String,
    pub time: String,
}
