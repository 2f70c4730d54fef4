use crate::domain::EmailAddress;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};

pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: EmailAddress,
    authorization_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        sender: EmailAddress,
        authorization_token: Secret<String>,
        timeout: std::time::Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            sender,
            authorization_token,
        })
    }

    /// Sends a single HTML message from the configured sender address,
    /// displayed as `sender_name`.
    pub async fn send_email(
        &self,
        sender_name: &str,
        recipient: &EmailAddress,
        subject: &str,
        html_content: &str,
    ) -> Result<(), reqwest::Error> {
        let url = format!("{}/email", self.base_url);
        let from = format!("\"{}\" <{}>", sender_name, self.sender);
        let request_body = SendEmailRequest {
            from: &from,
            to: recipient.as_ref(),
            subject,
            html_body: html_content,
        };
        self.http_client
            .post(&url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Succeeds when the mail API answers at all, whatever the status.
    pub async fn check_reachable(&self) -> Result<(), reqwest::Error> {
        self.http_client.head(&self.base_url).send().await?;
        Ok(())
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
}
