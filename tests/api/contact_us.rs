use crate::helpers::{spawn_app, when_sending_an_email, ADMIN_INBOX};
use lead_intake::routes::ResponseMessage;
use wiremock::matchers::any;
use wiremock::{Mock, ResponseTemplate};

fn contact_request() -> serde_json::Value {
    serde_json::json!({
        "name": "Alice",
        "company": "Acme",
        "email": "a@x.com",
        "source": "google",
        "message": "We would like a quote."
    })
}

#[tokio::test]
async fn contact_us_returns_200_for_valid_request() {
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;

    let response = app.post_contact_us(&contact_request()).await;

    assert_eq!(200, response.status().as_u16());
    let body: ResponseMessage = response.json().await.unwrap();
    assert_eq!(body.message, "Message sent successfully");
}

#[tokio::test]
async fn contact_us_persists_the_contact_request() {
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200))
        .mount(&app.email_server)
        .await;

    app.post_contact_us(&contact_request()).await;

    let saved: Vec<(String, String, String, String, String)> =
        sqlx::query_as("SELECT name, company, email, source, message FROM contacts")
            .fetch_all(&app.db_pool)
            .await
            .expect("Failed to fetch saved contact requests.");
    assert_eq!(saved.len(), 1);
    let (name, company, email, source, message) = &saved[0];
    assert_eq!(name, "Alice");
    assert_eq!(company, "Acme");
    assert_eq!(email, "a@x.com");
    assert_eq!(source, "google");
    assert_eq!(message, "We would like a quote.");
}

#[tokio::test]
async fn contact_us_notifies_the_admin_and_the_submitter() {
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    app.post_contact_us(&contact_request()).await;

    let mut recipients = app.email_recipients().await;
    recipients.sort();
    assert_eq!(recipients, vec!["a@x.com".to_string(), ADMIN_INBOX.to_string()]);
}

#[tokio::test]
async fn contact_us_accepts_an_empty_message() {
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let response = app
        .post_contact_us(&serde_json::json!({
            "name": "Alice",
            "company": "Acme",
            "email": "a@x.com",
            "message": ""
        }))
        .await;

    assert_eq!(200, response.status().as_u16());
    let (message, source): (String, String) =
        sqlx::query_as("SELECT message, source FROM contacts")
            .fetch_one(&app.db_pool)
            .await
            .expect("Failed to fetch saved contact request.");
    assert_eq!(message, "");
    assert_eq!(source, "");
}

#[tokio::test]
async fn contact_us_returns_400_for_malformed_body() {
    let app = spawn_app().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.email_server)
        .await;

    let test_cases = vec![
        (r#"{"name": "Alice", "email": "#, "truncated json"),
        (r#""Alice <a@x.com>""#, "not an object"),
        (r#"{"name": 42, "email": "a@x.com"}"#, "wrong field type"),
    ];

    for (body, description) in test_cases {
        let response = app.post_raw("/api/contact-us", body).await;

        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: ResponseMessage = response.json().await.unwrap();
        assert_eq!(body.message, "Malformed request body");
    }

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn contact_us_keeps_the_record_and_returns_500_when_submitter_email_is_unusable() {
    let test_cases = vec![
        (serde_json::json!({"name": "Alice", "message": "Hi"}), "missing email"),
        (
            serde_json::json!({"name": "Alice", "email": "alice-at-example", "message": "Hi"}),
            "invalid email",
        ),
    ];

    for (body, description) in test_cases {
        let app = spawn_app().await;
        when_sending_an_email()
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&app.email_server)
            .await;

        let response = app.post_contact_us(&body).await;

        assert_eq!(
            500,
            response.status().as_u16(),
            "The API did not fail with 500 when the payload had {}.",
            description
        );
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts")
            .fetch_one(&app.db_pool)
            .await
            .unwrap();
        assert_eq!(count, 1, "The contact with {} was not stored.", description);
        assert_eq!(app.email_recipients().await, vec![ADMIN_INBOX.to_string()]);
    }
}

#[tokio::test]
async fn contact_us_returns_500_when_an_email_fails_but_keeps_the_record() {
    let app = spawn_app().await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&app.email_server)
        .await;

    let response = app.post_contact_us(&contact_request()).await;

    assert_eq!(500, response.status().as_u16());
    let body: ResponseMessage = response.json().await.unwrap();
    assert_eq!(body.message, "Server error");

    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM contacts")
        .fetch_one(&app.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn contact_us_fails_if_only_the_admin_notification_fails() {
    let app = spawn_app().await;
    when_sending_an_email()
        .and(wiremock::matchers::body_partial_json(
            serde_json::json!({ "To": ADMIN_INBOX }),
        ))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&app.email_server)
        .await;
    when_sending_an_email()
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.email_server)
        .await;

    let response = app.post_contact_us(&contact_request()).await;

    assert_eq!(500, response.status().as_u16());
}

#[tokio::test]
async fn preflight_requests_are_acknowledged_with_cors_headers() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .request(
            reqwest::Method::OPTIONS,
            &format!("{}/api/contact-us", &app.address),
        )
        .header("Origin", "https://preview-42.lovable.app")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();

    assert_eq!(204, response.status().as_u16());
    assert_eq!(
        response.headers()["Access-Control-Allow-Origin"],
        "https://preview-42.lovable.app"
    );
    assert_eq!(
        response.headers()["Access-Control-Allow-Methods"],
        "POST, OPTIONS"
    );
}

#[tokio::test]
async fn origins_outside_the_allow_list_get_no_cors_headers() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .request(
            reqwest::Method::OPTIONS,
            &format!("{}/api/contact-us", &app.address),
        )
        .header("Origin", "https://evil.example")
        .send()
        .await
        .unwrap();

    assert_eq!(204, response.status().as_u16());
    assert!(response
        .headers()
        .get("Access-Control-Allow-Origin")
        .is_none());
}

#[tokio::test]
async fn other_methods_are_rejected_with_405() {
    let app = spawn_app().await;

    for method in [reqwest::Method::GET, reqwest::Method::PUT, reqwest::Method::DELETE] {
        let response = app.request(method.clone(), "/api/contact-us").await;

        assert_eq!(
            405,
            response.status().as_u16(),
            "{} was not rejected with 405 Method Not Allowed",
            method
        );
        let body: ResponseMessage = response.json().await.unwrap();
        assert_eq!(body.message, "Method not allowed");
    }
}
