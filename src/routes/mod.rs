mod contact_us;
mod free_consultation;
mod health_check;

pub use contact_us::*;
pub use free_consultation::*;
pub use health_check::*;

use actix_web::error::JsonPayloadError;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use std::fmt::Formatter;

/// Body of every non-empty response: a short human-readable message.
#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct ResponseMessage {
    pub message: String,
}

impl ResponseMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub fn json_message(status: StatusCode, message: impl Into<String>) -> HttpResponse {
    HttpResponse::build(status).json(ResponseMessage::new(message))
}

/// Shown to callers for every server-side failure.
pub const SERVER_ERROR: &str = "Server error";

/// The request body could not be read as the expected JSON object.
#[derive(thiserror::Error)]
#[error("Malformed request body")]
pub struct MalformedInput(#[source] JsonPayloadError);

impl std::fmt::Debug for MalformedInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for MalformedInput {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        json_message(self.status_code(), self.to_string())
    }
}

pub fn malformed_input(error: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::warn!(path = %req.path(), "Rejecting malformed request body: {}", error);
    MalformedInput(error).into()
}

pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

pub async fn method_not_allowed() -> HttpResponse {
    json_message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}
