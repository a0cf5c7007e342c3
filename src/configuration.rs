use std::time::Duration;

use anyhow::Context;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::{
    postgres::{PgConnectOptions, PgSslMode},
    ConnectOptions,
};

use crate::mailing_list::{BrevoClient, MailchimpClient, MailingListClient};

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    // Grab the execution directory
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    // Set the configuration directory
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT");

    // Generate the name of the environment-specific config file.
    let environment_filename = format!("{}.yml", environment.as_str());

    // Initialize the configuration reader
    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub mailing_list: MailingListSettings,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    /// When enabled, a signup without an explicit consent flag is rejected
    /// before any network call is made.
    pub require_consent: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    pub require_ssl: bool,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub acquire_timeout_milliseconds: u64,
}

impl DatabaseSettings {
    pub fn with_db(&self) -> PgConnectOptions {
        let mut options = self.without_db().database(&self.database_name);

        // Set sqlx's log level to TRACE so that user must specify TRACE if they
        // want to see the sqlx logs. This prevents log spam.
        options.log_statements(tracing::log::LevelFilter::Trace);

        options
    }

    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Disable
        };

        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_milliseconds)
    }
}

/// The marketing provider the signup flow syncs contacts to.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailingListProvider {
    Mailchimp,
    Brevo,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MailingListSettings {
    pub provider: MailingListProvider,
    pub api_key: Secret<String>,
    pub list_id: String,
    /// Mailchimp region prefix, e.g. `us1`. Required for the Mailchimp
    /// provider unless `base_url` is set explicitly.
    pub server_prefix: Option<String>,
    /// Explicit API base URL; overrides the provider default. Tests point
    /// this at a mock server.
    pub base_url: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
}

impl MailingListSettings {
    /// Builds the configured provider client, failing fast on settings that
    /// would otherwise only blow up at the first network call.
    pub fn client(&self) -> Result<MailingListClient, anyhow::Error> {
        let timeout = self.timeout();
        match self.provider {
            MailingListProvider::Mailchimp => {
                let base_url = match &self.base_url {
                    Some(url) => url.clone(),
                    None => {
                        let prefix = self.server_prefix.as_deref().context(
                            "`mailing_list.server_prefix` is required for the mailchimp provider",
                        )?;
                        format!("https://{}.api.mailchimp.com/3.0", prefix)
                    }
                };
                let client = MailchimpClient::new(
                    base_url,
                    self.api_key.clone(),
                    self.list_id.clone(),
                    timeout,
                )
                .context("Failed to build the Mailchimp HTTP client")?;
                Ok(MailingListClient::Mailchimp(client))
            }
            MailingListProvider::Brevo => {
                let list_id = self
                    .list_id
                    .parse::<i64>()
                    .context("`mailing_list.list_id` must be numeric for the brevo provider")?;
                let base_url = self
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.brevo.com/v3".to_string());
                let client = BrevoClient::new(base_url, self.api_key.clone(), list_id, timeout)
                    .context("Failed to build the Brevo HTTP client")?;
                Ok(MailingListClient::Brevo(client))
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
}

/// The possible runtime environments for this application.
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either 'local' or 'production'",
                other
            )),
        }
    }
}
