use crate::domain::NewContact;
use crate::notifications::Notifier;
use crate::routes::{error_chain_fmt, json_message, ResponseMessage, SERVER_ERROR};
use crate::store::Store;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use std::fmt::Formatter;
use uuid::Uuid;

/// Every field is optional on the wire; missing or `null` ones are stored
/// empty.
#[derive(serde::Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub source: Option<String>,
    pub message: Option<String>,
}

impl From<ContactForm> for NewContact {
    fn from(form: ContactForm) -> Self {
        NewContact {
            name: form.name.unwrap_or_default(),
            company: form.company.unwrap_or_default(),
            email: form.email.unwrap_or_default(),
            source: form.source.unwrap_or_default(),
            message: form.message.unwrap_or_default(),
        }
    }
}

#[derive(thiserror::Error)]
pub enum ContactError {
    #[error("Failed to store the contact request")]
    PersistenceFailure(#[source] anyhow::Error),
    #[error("Failed to send contact request notifications")]
    NotificationFailure(#[source] anyhow::Error),
}

impl std::fmt::Debug for ContactError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ContactError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        json_message(self.status_code(), SERVER_ERROR)
    }
}

#[tracing::instrument(
    name = "Submitting a contact request",
    skip(form, store, notifier),
    fields(
        submitter_email = ?form.email,
        submitter_name = ?form.name,
    )
)]
pub async fn submit_contact(
    form: web::Json<ContactForm>,
    store: web::Data<Store>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, ContactError> {
    let contact = NewContact::from(form.0);

    let pool = store
        .ensure_connected()
        .await
        .context("Failed to connect to the database")
        .map_err(ContactError::PersistenceFailure)?;
    insert_contact(pool, &contact)
        .await
        .context("Failed to insert the contact request")
        .map_err(ContactError::PersistenceFailure)?;

    notifier
        .notify_contact(&contact)
        .await
        .map_err(ContactError::NotificationFailure)?;

    Ok(HttpResponse::Ok().json(ResponseMessage::new("Message sent successfully")))
}

#[tracing::instrument(name = "Saving the contact request in the database", skip(contact, pool))]
pub async fn insert_contact(pool: &PgPool, contact: &NewContact) -> Result<Uuid, sqlx::Error> {
    let contact_id = Uuid::new_v4();
    sqlx::query(
        r#"
    INSERT INTO contacts (id, name, company, email, source, message, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    "#,
    )
    .bind(contact_id)
    .bind(&contact.name)
    .bind(&contact.company)
    .bind(&contact.email)
    .bind(&contact.source)
    .bind(&contact.message)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to execute query: {:?}", e);
        e
    })?;
    Ok(contact_id)
}
