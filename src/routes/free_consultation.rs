use crate::domain::NewBooking;
use crate::notifications::Notifier;
use crate::routes::{error_chain_fmt, json_message, SERVER_ERROR};
use crate::store::{is_unique_violation, Store};
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use anyhow::Context;
use chrono::Utc;
use sqlx::PgPool;
use std::fmt::Formatter;
use uuid::Uuid;

const ALL_FIELDS_REQUIRED: &str = "All fields are required";

#[derive(serde::Deserialize)]
pub struct BookingForm {
    pub name: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
}

impl TryFrom<BookingForm> for NewBooking {
    type Error = String;
    fn try_from(form: BookingForm) -> Result<Self, Self::Error> {
        let name = required(form.name)?;
        let company = required(form.company)?;
        let email = required(form.email)?;
        let phone = required(form.phone)?;
        let date = required(form.date)?;
        let time = required(form.time)?;
        Ok(NewBooking {
            name,
            company,
            email,
            phone,
            date,
            time,
        })
    }
}

/// Present and non-empty. Whitespace counts as content.
fn required(field: Option<String>) -> Result<String, String> {
    match field {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ALL_FIELDS_REQUIRED.to_string()),
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmed {
    pub message: String,
    pub booking_id: Uuid,
}

#[derive(thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    ValidationError(String),
    #[error("You already booked a consultation for this date")]
    DuplicateBooking,
    #[error("Failed to store the booking")]
    PersistenceFailure(#[source] anyhow::Error),
    #[error("Failed to send booking notifications")]
    NotificationFailure(#[source] anyhow::Error),
}

impl std::fmt::Debug for BookingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::ValidationError(_) => StatusCode::BAD_REQUEST,
            BookingError::DuplicateBooking => StatusCode::CONFLICT,
            BookingError::PersistenceFailure(_) | BookingError::NotificationFailure(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            BookingError::ValidationError(_) | BookingError::DuplicateBooking => {
                json_message(self.status_code(), self.to_string())
            }
            _ => json_message(self.status_code(), SERVER_ERROR),
        }
    }
}

#[tracing::instrument(
    name = "Booking a free consultation",
    skip(form, store, notifier),
    fields(
        submitter_email = ?form.email,
        date = ?form.date,
        booking_id = tracing::field::Empty,
    )
)]
pub async fn book_consultation(
    form: web::Json<BookingForm>,
    store: web::Data<Store>,
    notifier: web::Data<Notifier>,
) -> Result<HttpResponse, BookingError> {
    let booking: NewBooking = form.0.try_into().map_err(BookingError::ValidationError)?;

    let pool = store
        .ensure_connected()
        .await
        .context("Failed to connect to the database")
        .map_err(BookingError::PersistenceFailure)?;
    let booking_id = insert_booking(pool, &booking).await.map_err(|e| {
        if is_unique_violation(&e) {
            BookingError::DuplicateBooking
        } else {
            BookingError::PersistenceFailure(
                anyhow::Error::new(e).context("Failed to insert the booking"),
            )
        }
    })?;
    tracing::Span::current().record("booking_id", &tracing::field::display(booking_id));

    notifier
        .notify_booking(&booking)
        .await
        .map_err(BookingError::NotificationFailure)?;

    Ok(HttpResponse::Ok().json(BookingConfirmed {
        message: "Consultation booked successfully".into(),
        booking_id,
    }))
}

/// Relies on the `(email, date)` unique constraint of `bookings`: a second
/// booking for the same pair fails with a unique violation.
#[tracing::instrument(name = "Saving the booking in the database", skip(booking, pool))]
pub async fn insert_booking(pool: &PgPool, booking: &NewBooking) -> Result<Uuid, sqlx::Error> {
    let booking_id = Uuid::new_v4();
    sqlx::query(
        r#"
    INSERT INTO bookings (id, name, company, email, phone, date, time, created_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
    "#,
    )
    .bind(booking_id)
    .bind(&booking.name)
    .bind(&booking.company)
    .bind(&booking.email)
    .bind(&booking.phone)
    .bind(&booking.date)
    .bind(&booking.time)
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            tracing::warn!("Booking already exists for this email and date");
        } else {
            tracing::error!("Failed to execute query: {:?}", e);
        }
        e
    })?;
    Ok(booking_id)
}
