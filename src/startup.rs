use std::net::TcpListener;

use axum::{
    extract::FromRef,
    routing::{get, post, IntoMakeService},
    Router, Server,
};
use hyper::server::conn::AddrIncoming;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::configuration::{DatabaseSettings, Settings};
use crate::mailing_list::MailingListClient;
use crate::routes::{create_signup, health_check};
use crate::telemetry::RouterExt;

pub struct Application {
    port: u16,
    server: Server<AddrIncoming, IntoMakeService<Router>>,
}

impl Application {
    /// Assembles the application from its configuration. Invalid settings
    /// (unknown provider requirements, bad list ids) fail here instead of at
    /// the first network call.
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let db_pool = get_db_pool(&configuration.database);
        let mailing_list = configuration.mailing_list.client()?;
        let policy = SignupPolicy {
            require_consent: configuration.application.require_consent,
        };

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(address)?;
        let port = listener.local_addr()?.port();

        let server = run(listener, db_pool, mailing_list, policy)?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> hyper::Result<()> {
        self.server.await
    }
}

pub fn get_db_pool(settings: &DatabaseSettings) -> PgPool {
    PgPoolOptions::new()
        .acquire_timeout(settings.acquire_timeout())
        .connect_lazy_with(settings.with_db())
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    mailing_list: MailingListClient,
    policy: SignupPolicy,
) -> Result<Server<AddrIncoming, IntoMakeService<Router>>, hyper::Error> {
    // Build app state
    let app_state = AppState {
        db_pool,
        mailing_list,
        policy,
    };

    // Create a router that will contain and match all routes for the application
    let app = Router::new()
        .route("/health_check", get(health_check))
        .route("/signups", post(create_signup))
        .add_axum_tracing_layer()
        .with_state(app_state);

    // Start the axum server and set up to use supplied listener
    Ok(Server::from_tcp(listener)?.serve(app.into_make_service()))
}

/// Submission policy resolved from configuration; see
/// `ApplicationSettings::require_consent`.
#[derive(Clone, Copy, Debug)]
pub struct SignupPolicy {
    pub require_consent: bool,
}

#[derive(Clone)]
struct AppState {
    db_pool: PgPool,
    mailing_list: MailingListClient,
    policy: SignupPolicy,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.db_pool.clone()
    }
}

impl FromRef<AppState> for MailingListClient {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.mailing_list.clone()
    }
}

impl FromRef<AppState> for SignupPolicy {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.policy
    }
}
