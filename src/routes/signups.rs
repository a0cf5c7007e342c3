use anyhow::Context;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Form};
use serde::Deserialize;
use sqlx::PgPool;

use crate::domain::{FirstName, JobRole, NewSignup, OrganizationSize, SubscriberEmail};
use crate::error_chain_fmt;
use crate::mailing_list::MailingListClient;
use crate::startup::SignupPolicy;
use crate::storage::{self, StorageError};

#[derive(Debug, Deserialize)]
pub struct FormData {
    email: String,
    first_name: Option<String>,
    job_role: Option<String>,
    organization_size: Option<String>,
    consent: Option<bool>,
}

impl TryFrom<FormData> for NewSignup {
    type Error = String;

    fn try_from(form: FormData) -> Result<Self, Self::Error> {
        let email = SubscriberEmail::parse(form.email)?;
        let first_name = parse_optional(form.first_name, FirstName::parse)?;
        let job_role = parse_optional(form.job_role, JobRole::parse)?;
        let organization_size = form
            .organization_size
            .filter(|value| !value.trim().is_empty())
            .map(|value| OrganizationSize::parse(&value))
            .transpose()?;

        Ok(Self {
            email,
            first_name,
            job_role,
            organization_size,
        })
    }
}

// Unfilled optional form controls arrive as empty strings; treat those the
// same as an absent field.
fn parse_optional<T>(
    value: Option<String>,
    parse: impl FnOnce(String) -> Result<T, String>,
) -> Result<Option<T>, String> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(parse)
        .transpose()
}

/// The subscription flow: validate, persist (the authoritative write), then
/// sync the contact to the mailing list best-effort. The persistence write
/// always happens before the mailing-list call, and the mailing-list outcome
/// never changes the response the subscriber sees.
#[tracing::instrument(
    name = "Adding a new signup",
    skip(pool, mailing_list, policy, form),
    fields(signup_email = %form.email)
)]
pub async fn create_signup(
    State(pool): State<PgPool>,
    State(mailing_list): State<MailingListClient>,
    State(policy): State<SignupPolicy>,
    Form(form): Form<FormData>,
) -> Result<StatusCode, SignupError> {
    if policy.require_consent && !form.consent.unwrap_or(false) {
        return Err(SignupError::Validation(
            "You must consent to receiving updates to sign up.".into(),
        ));
    }

    let new_signup: NewSignup = form.try_into().map_err(SignupError::Validation)?;

    // Optional pre-check; two concurrent submissions can still both pass it,
    // so the unique constraint on the insert below remains the real guard.
    if storage::find_signup_by_email(&pool, &new_signup.email)
        .await
        .context("Failed to look up existing signups")?
        .is_some()
    {
        return Err(SignupError::AlreadyRegistered);
    }

    storage::insert_signup(&pool, &new_signup).await?;

    if let Err(e) = mailing_list.upsert_contact(&new_signup).await {
        // The row is saved; a failed sync must never surface to the subscriber.
        tracing::warn!("Failed to sync new signup to the mailing list: {:?}", e);
    }

    Ok(StatusCode::OK)
}

#[derive(thiserror::Error)]
pub enum SignupError {
    #[error("{0}")]
    Validation(String),
    #[error("This email is already registered for early access.")]
    AlreadyRegistered,
    #[error("Unable to complete registration. Please try again later.")]
    Unexpected(#[from] anyhow::Error),
}

impl std::fmt::Debug for SignupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

// A unique-constraint hit on the insert is the authoritative duplicate
// signal; anything else from the database is an opaque failure.
impl From<StorageError> for SignupError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::DuplicateEmail => SignupError::AlreadyRegistered,
            other => SignupError::Unexpected(
                anyhow::Error::from(other).context("Failed to save new signup"),
            ),
        }
    }
}

impl IntoResponse for SignupError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            SignupError::Validation(_) => StatusCode::BAD_REQUEST,
            SignupError::AlreadyRegistered => StatusCode::CONFLICT,
            SignupError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        match &self {
            SignupError::Unexpected(_) => tracing::error!("{:?}", self),
            _ => tracing::warn!("{:?}", self),
        }
        (status, self.to_string()).into_response()
    }
}
