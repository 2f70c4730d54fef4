use crate::domain::{EmailAddress, NewBooking, NewContact};
use crate::email_client::EmailClient;
use anyhow::Context;
use tera::Tera;

const CONTACT_ADMIN: &str = "contact_admin.html";
const CONTACT_ACKNOWLEDGMENT: &str = "contact_acknowledgment.html";
const BOOKING_ADMIN: &str = "booking_admin.html";
const BOOKING_CONFIRMATION: &str = "booking_confirmation.html";

/// Sends the admin notification and the submitter reply for each
/// submission.
pub struct Notifier {
    email_client: EmailClient,
    templates: Tera,
    admin_inbox: EmailAddress,
    brand: String,
}

impl Notifier {
    pub fn new(
        email_client: EmailClient,
        admin_inbox: EmailAddress,
        brand: String,
    ) -> Result<Self, tera::Error> {
        Ok(Self {
            email_client,
            templates: email_templates()?,
            admin_inbox,
            brand,
        })
    }

    #[tracing::instrument(
        name = "Sending contact request notifications",
        skip_all,
        fields(submitter_email = %contact.email)
    )]
    pub async fn notify_contact(&self, contact: &NewContact) -> Result<(), anyhow::Error> {
        let mut context = tera::Context::new();
        context.insert("name", &contact.name);
        context.insert("company", &contact.company);
        context.insert("email", &contact.email);
        context.insert("source", &contact.source);
        context.insert("message", &contact.message);
        context.insert("team", &self.team());

        let admin_html = self
            .templates
            .render(CONTACT_ADMIN, &context)
            .context("Failed to render the contact admin notification")?;
        let acknowledgment_html = self
            .templates
            .render(CONTACT_ACKNOWLEDGMENT, &context)
            .context("Failed to render the contact acknowledgment")?;

        let admin_sender = format!("{} Contact", self.brand);
        let team = self.team();
        let (admin, submitter) = tokio::join!(
            self.email_client.send_email(
                &admin_sender,
                &self.admin_inbox,
                "📩 New Contact Request",
                &admin_html,
            ),
            self.reply(
                &team,
                &contact.email,
                "✅ We received your message",
                &acknowledgment_html,
            ),
        );
        settle(admin, submitter)
    }

    #[tracing::instrument(
        name = "Sending consultation booking notifications",
        skip_all,
        fields(submitter_email = %booking.email, date = %booking.date)
    )]
    pub async fn notify_booking(&self, booking: &NewBooking) -> Result<(), anyhow::Error> {
        let mut context = tera::Context::new();
        context.insert("name", &booking.name);
        context.insert("company", &booking.company);
        context.insert("email", &booking.email);
        context.insert("phone", &booking.phone);
        context.insert("date", &booking.date);
        context.insert("time", &booking.time);
        context.insert("team", &self.team());

        let admin_html = self
            .templates
            .render(BOOKING_ADMIN, &context)
            .context("Failed to render the booking admin notification")?;
        let confirmation_html = self
            .templates
            .render(BOOKING_CONFIRMATION, &context)
            .context("Failed to render the booking confirmation")?;

        let admin_sender = format!("{} Booking", self.brand);
        let team = self.team();
        let (admin, submitter) = tokio::join!(
            self.email_client.send_email(
                &admin_sender,
                &self.admin_inbox,
                "📅 New Free Consultation Booking",
                &admin_html,
            ),
            self.reply(
                &team,
                &booking.email,
                "✅ Free Consultation Confirmed",
                &confirmation_html,
            ),
        );
        settle(admin, submitter)
    }

    /// Submitted addresses are free text; one that does not parse fails the
    /// reply without reaching the mail API.
    async fn reply(
        &self,
        sender_name: &str,
        recipient: &str,
        subject: &str,
        html_content: &str,
    ) -> Result<(), anyhow::Error> {
        let recipient = EmailAddress::parse(recipient.to_owned()).map_err(anyhow::Error::msg)?;
        self.email_client
            .send_email(sender_name, &recipient, subject, html_content)
            .await?;
        Ok(())
    }

    fn team(&self) -> String {
        format!("{} Team", self.brand)
    }
}

/// Both sends have already resolved here; either failure fails the whole
/// notification.
fn settle(
    admin: Result<(), reqwest::Error>,
    submitter: Result<(), anyhow::Error>,
) -> Result<(), anyhow::Error> {
    match (admin, submitter) {
        (Ok(()), Ok(())) => Ok(()),
        (Err(e), Ok(())) => Err(anyhow::Error::new(e).context("Failed to notify the admin inbox")),
        (Ok(()), Err(e)) => Err(e.context("Failed to reply to the submitter")),
        (Err(admin_error), Err(submitter_error)) => {
            tracing::error!(
                error.cause_chain = ?submitter_error,
                "Failed to reply to the submitter"
            );
            Err(anyhow::Error::new(admin_error).context("Failed to notify the admin inbox"))
        }
    }
}

fn email_templates() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (
            CONTACT_ADMIN,
            include_str!("../templates/email/contact_admin.html"),
        ),
        (
            CONTACT_ACKNOWLEDGMENT,
            include_str!("../templates/email/contact_acknowledgment.html"),
        ),
        (
            BOOKING_ADMIN,
            include_str!("../templates/email/booking_admin.html"),
        ),
        (
            BOOKING_CONFIRMATION,
            include_str!("../templates/email/booking_confirmation.html"),
        ),
    ])?;
    Ok(tera)
}
