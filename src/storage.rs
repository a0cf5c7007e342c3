use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{NewSignup, SignupStatus, SubscriberEmail};
use crate::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum StorageError {
    #[error("a signup with this email already exists")]
    DuplicateEmail,
    #[error("failed to execute a database query")]
    Database(#[from] sqlx::Error),
}

impl std::fmt::Debug for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[tracing::instrument(name = "Saving new signup details in the database", skip(pool, signup))]
pub async fn insert_signup(pool: &PgPool, signup: &NewSignup) -> Result<Uuid, StorageError> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
    INSERT INTO beta_signups (id, email, first_name, job_role, organization_size, status, subscribed_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
    "#,
    )
    .bind(id)
    .bind(signup.email.as_ref())
    .bind(signup.first_name.as_ref().map(AsRef::<str>::as_ref))
    .bind(signup.job_role.as_ref().map(AsRef::<str>::as_ref))
    .bind(signup.organization_size.map(|size| size.as_str()))
    .bind(SignupStatus::Pending.as_str())
    .bind(Utc::now())
    .execute(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            StorageError::DuplicateEmail
        } else {
            tracing::error!("Failed to execute query: {:?}", e);
            StorageError::Database(e)
        }
    })?;

    Ok(id)
}

/// Looks up an existing signup by email. Racy as a dedup guard on its own;
/// the unique constraint handled in [`insert_signup`] stays authoritative.
#[tracing::instrument(name = "Looking up signup by email", skip(pool, email))]
pub async fn find_signup_by_email(
    pool: &PgPool,
    email: &SubscriberEmail,
) -> Result<Option<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM beta_signups WHERE email = $1")
        .bind(email.as_ref())
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to execute query: {:?}", e);
            e
        })
}

// Postgres signals a violated unique constraint with SQLSTATE 23505.
fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(e) => e.code().as_deref() == Some("23505"),
        _ => false,
    }
}
