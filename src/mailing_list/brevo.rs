use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::MailingListError;
use crate::domain::NewSignup;

/// Brevo-style contacts API. Contacts are created under `/contacts` and
/// updated in place at `/contacts/{email}`.
#[derive(Clone, Debug)]
pub struct BrevoClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
    list_id: i64,
}

impl BrevoClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        list_id: i64,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
            api_key,
            list_id,
        })
    }

    #[tracing::instrument(
        name = "Upserting contact in Brevo",
        skip(self, signup),
        fields(contact_email = %signup.email)
    )]
    pub async fn upsert_contact(&self, signup: &NewSignup) -> Result<(), MailingListError> {
        let url = format!("{}/contacts", self.base_url);
        let body = ContactRequest {
            email: signup.email.as_ref(),
            attributes: Attributes::from_signup(signup),
            list_ids: vec![self.list_id],
            update_enabled: true,
            email_blacklisted: false,
        };

        let response = self
            .http_client
            .post(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }

        let error: ErrorResponse = response.json().await?;
        if error.message.contains("Contact already exist") {
            tracing::info!("Contact already exists in Brevo, updating instead");
            return self.update_contact(signup).await;
        }

        Err(MailingListError::Api(error.message))
    }

    async fn update_contact(&self, signup: &NewSignup) -> Result<(), MailingListError> {
        let url = format!("{}/contacts/{}", self.base_url, signup.email.as_ref());
        let body = ContactUpdateRequest {
            attributes: Attributes::from_signup(signup),
            list_ids: vec![self.list_id],
            email_blacklisted: false,
        };

        let response = self
            .http_client
            .put(&url)
            .header("api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }

        let error: ErrorResponse = response.json().await?;
        Err(MailingListError::Api(error.message))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContactRequest<'a> {
    email: &'a str,
    attributes: Attributes<'a>,
    list_ids: Vec<i64>,
    update_enabled: bool,
    email_blacklisted: bool,
}

// PUT body must not carry the email, it is already in the path.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContactUpdateRequest<'a> {
    attributes: Attributes<'a>,
    list_ids: Vec<i64>,
    email_blacklisted: bool,
}

#[derive(Serialize)]
struct Attributes<'a> {
    #[serde(rename = "FIRSTNAME")]
    first_name: &'a str,
    #[serde(rename = "JOBROLE")]
    job_role: &'a str,
    #[serde(rename = "ORGSIZE")]
    organization_size: &'a str,
}

impl<'a> Attributes<'a> {
    fn from_signup(signup: &'a NewSignup) -> Self {
        Self {
            first_name: signup
                .first_name
                .as_ref()
                .map(AsRef::as_ref)
                .unwrap_or(""),
            job_role: signup.job_role.as_ref().map(AsRef::as_ref).unwrap_or(""),
            organization_size: signup
                .organization_size
                .map(|size| size.as_str())
                .unwrap_or(""),
        }
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    message: String,
}
