use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::MailingListError;
use crate::domain::{NewSignup, SignupStatus};

/// Mailchimp-style list member API. Members live under
/// `/lists/{list_id}/members`; existing members are addressed by the
/// hex-encoded lower-cased email.
#[derive(Clone, Debug)]
pub struct MailchimpClient {
    http_client: Client,
    base_url: String,
    api_key: Secret<String>,
    list_id: String,
}

impl MailchimpClient {
    pub fn new(
        base_url: String,
        api_key: Secret<String>,
        list_id: String,
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
        name = "Upserting contact in Mailchimp",
        skip(self, signup),
        fields(contact_email = %signup.email)
    )]
    pub async fn upsert_contact(&self, signup: &NewSignup) -> Result<(), MailingListError> {
        let url = format!("{}/lists/{}/members", self.base_url, self.list_id);
        let body = MemberRequest::from_signup(signup);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }

        let error: ErrorResponse = response.json().await?;
        if error.title == "Member Exists" {
            tracing::info!("Member already exists in Mailchimp, updating instead");
            return self.update_contact(signup).await;
        }

        Err(MailingListError::Api(format!(
            "{}: {}",
            error.title, error.detail
        )))
    }

    async fn update_contact(&self, signup: &NewSignup) -> Result<(), MailingListError> {
        let url = format!(
            "{}/lists/{}/members/{}",
            self.base_url,
            self.list_id,
            subscriber_hash(signup.email.as_ref())
        );
        let body = MemberRequest::from_signup(signup);

        let response = self
            .http_client
            .patch(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;
        if response.status().is_success() {
            return Ok(());
        }

        let error: ErrorResponse = response.json().await?;
        Err(MailingListError::Api(format!(
            "{}: {}",
            error.title, error.detail
        )))
    }
}

// The path identifier for an existing member is derived from the lower-cased
// email address.
fn subscriber_hash(email: &str) -> String {
    hex::encode(email.to_lowercase())
}

#[derive(Serialize)]
struct MemberRequest<'a> {
    email_address: &'a str,
    status: &'static str,
    merge_fields: MergeFields<'a>,
}

#[derive(Serialize)]
struct MergeFields<'a> {
    #[serde(rename = "FNAME")]
    first_name: &'a str,
    #[serde(rename = "JOBROLE")]
    job_role: &'a str,
    #[serde(rename = "ORGSIZE")]
    organization_size: &'a str,
}

impl<'a> MemberRequest<'a> {
    fn from_signup(signup: &'a NewSignup) -> Self {
        Self {
            email_address: signup.email.as_ref(),
            // Subscribed straight away so the provider starts sending
            status: SignupStatus::Subscribed.as_str(),
            merge_fields: MergeFields {
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
            },
        }
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    title: String,
    detail: String,
}
