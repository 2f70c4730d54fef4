use actix_web::body::MessageBody;
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::{self, HeaderValue};
use actix_web::web;
use actix_web_lab::middleware::Next;

/// Origins allowed to call the submission endpoints from a browser.
#[derive(Clone, Debug, Default)]
pub struct AllowedOrigins(Vec<String>);

impl AllowedOrigins {
    pub fn new(origins: Vec<String>) -> Self {
        Self(origins)
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.0.iter().any(|allowed| {
            if allowed == "*" {
                true
            } else if let Some(domain) = allowed.strip_prefix("*.") {
                origin_host(origin)
                    .map(|host| host.ends_with(&format!(".{}", domain)))
                    .unwrap_or(false)
            } else {
                allowed == origin
            }
        })
    }
}

fn origin_host(origin: &str) -> Option<&str> {
    let (_scheme, rest) = origin.split_once("://")?;
    Some(rest.split(':').next().unwrap_or(rest))
}

/// Decorates responses to allowed cross-origin requests. Requests from other
/// origins go through untouched and are left for the browser to block.
pub async fn apply_cors_headers(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, actix_web::Error> {
    let origin = req.headers().get(header::ORIGIN).cloned();
    let allowed = match (&origin, req.app_data::<web::Data<AllowedOrigins>>()) {
        (Some(origin), Some(allowed_origins)) => origin
            .to_str()
            .map(|origin| allowed_origins.allows(origin))
            .unwrap_or(false),
        _ => false,
    };

    let mut response = next.call(req).await?;
    match origin {
        Some(origin) if allowed => {
            let headers = response.headers_mut();
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.insert(header::VARY, HeaderValue::from_static("Origin"));
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("POST, OPTIONS"),
            );
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Content-Type"),
            );
        }
        Some(origin) => {
            tracing::debug!(origin = ?origin, "Cross-origin request from an origin that is not allowed");
        }
        None => {}
    }
    Ok(response)
}
