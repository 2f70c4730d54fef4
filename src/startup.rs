use crate::configuration::Settings;
use crate::cors::{apply_cors_headers, AllowedOrigins};
use crate::notifications::Notifier;
use crate::routes::{
    book_consultation, health_check, malformed_input, method_not_allowed, preflight,
    submit_contact,
};
use crate::store::Store;
use actix_web::dev::Server;
use actix_web::http::Method;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use actix_web_lab::middleware::from_fn;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let email_client = configuration.email_client.client()?;
        match email_client.check_reachable().await {
            Ok(()) => tracing::info!("Mail API is reachable"),
            Err(e) => tracing::warn!(
                error.cause_chain = ?e,
                "Mail API is unreachable, notifications will fail until it recovers"
            ),
        }
        let admin_inbox = configuration
            .email_client
            .admin_inbox()
            .map_err(anyhow::Error::msg)?;
        let notifier = Notifier::new(
            email_client,
            admin_inbox,
            configuration.email_client.sender_name.clone(),
        )?;

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            Store::new(configuration.database),
            notifier,
            AllowedOrigins::new(configuration.application.allowed_origins),
        )?;
        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    store: Store,
    notifier: Notifier,
    allowed_origins: AllowedOrigins,
) -> Result<Server, anyhow::Error> {
    let store = Data::new(store);
    let notifier = Data::new(notifier);
    let allowed_origins = Data::new(allowed_origins);
    let server = HttpServer::new(move || {
        App::new()
            // Middleware
            .wrap(from_fn(apply_cors_headers))
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api")
                    .service(
                        web::resource("/contact-us")
                            .route(web::post().to(submit_contact))
                            .route(web::method(Method::OPTIONS).to(preflight))
                            .default_service(web::to(method_not_allowed)),
                    )
                    .service(
                        web::resource("/free-consultation")
                            .route(web::post().to(book_consultation))
                            .route(web::method(Method::OPTIONS).to(preflight))
                            .default_service(web::to(method_not_allowed)),
                    ),
            )
            .app_data(web::JsonConfig::default().error_handler(malformed_input))
            .app_data(store.clone())
            .app_data(notifier.clone())
            .app_data(allowed_origins.clone())
    })
    .listen(listener)?
    .run();
    Ok(server)
}
