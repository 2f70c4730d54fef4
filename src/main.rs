use lead_intake::configuration::get_configuration;
use lead_intake::startup::Application;
use lead_intake::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("lead_intake".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration()?;
    let application = Application::build(configuration).await?;
    tracing::info!(port = application.port(), "Listening for form submissions");
    application.run_until_stopped().await?;
    Ok(())
}
