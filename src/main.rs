use early_access::configuration::get_configuration;
use early_access::startup::Application;
use early_access::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Set up tracing
    let subscriber = get_subscriber("early_access".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    // Set up configuration; refuse to start on missing or invalid settings
    let configuration = get_configuration().expect("failed to read configuration");

    let application = Application::build(configuration).await?;
    tracing::info!(
        "Starting server and listening on port {}",
        application.port()
    );
    application.run_until_stopped().await?;

    Ok(())
}
