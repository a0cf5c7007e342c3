use once_cell::sync::Lazy;
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;
use wiremock::MockServer;

use early_access::{
    configuration::{get_configuration, DatabaseSettings, Settings},
    startup::{get_db_pool, Application},
    telemetry::{get_subscriber, init_subscriber},
};

static TRACING: Lazy<()> = Lazy::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            "test".into(),
            "early_access=debug,info".into(),
            std::io::stdout,
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            "test".into(),
            "early_access=debug,info".into(),
            std::io::sink,
        );
        init_subscriber(subscriber);
    }
});

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawns the application with a per-test database, a random port and the
/// mailing-list client pointed at a local mock server. `customise` tweaks
/// the settings before the application is built (e.g. the consent policy).
pub async fn spawn_app_with(customise: impl FnOnce(&mut Settings)) -> TestApp {
    // Set up subscriber for logging, only first time per run. Other times use existing subscriber.
    Lazy::force(&TRACING);

    let mailing_server = MockServer::start().await;
    let configuration = {
        // Get the configuration from file
        let mut c = get_configuration().expect("Failed to read configuration");
        // Use a different database for each test
        c.database.database_name = Uuid::new_v4().to_string();
        // Use a random OS port
        c.application.port = 0;
        c.mailing_list.base_url = Some(mailing_server.uri());
        customise(&mut c);
        c
    };

    // Set up database connection pool
    configure_database(&configuration.database).await;

    // Start the server
    let app = Application::build(configuration.clone())
        .await
        .expect("Failed to build application");
    let address = format!("http://127.0.0.1:{}", app.port());
    tokio::spawn(app.run_until_stopped());

    TestApp {
        address,
        db_pool: get_db_pool(&configuration.database),
        mailing_server,
    }
}

pub async fn configure_database(config: &DatabaseSettings) -> PgPool {
    // Create a database
    let mut connection = PgConnection::connect_with(&config.without_db())
        .await
        .expect("failed to connect to Postgres");

    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.database_name).as_str())
        .await
        .expect("failed to create the database");

    //Run migrations on the database
    let connection_pool = PgPool::connect_with(config.with_db())
        .await
        .expect("failed to connect to Postgres");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("failed to migrate the database");

    //Return the connection pool
    connection_pool
}

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub mailing_server: MockServer,
}

impl TestApp {
    pub async fn post_signup(&self, body: String) -> reqwest::Response {
        reqwest::Client::new()
            .post(&format!("{}/signups", &self.address))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .expect("failed to execute request")
    }
}
