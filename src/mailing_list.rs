mod brevo;
mod mailchimp;

pub use brevo::BrevoClient;
pub use mailchimp::MailchimpClient;

use crate::domain::NewSignup;
use crate::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum MailingListError {
    #[error("the mailing list API rejected the request: {0}")]
    Api(String),
    #[error("failed to call the mailing list API")]
    Request(#[from] reqwest::Error),
}

impl std::fmt::Debug for MailingListError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// The one capability this service needs from a marketing provider:
/// create-or-update a contact keyed by email. The provider is picked once,
/// from configuration, never at the call site.
#[derive(Clone, Debug)]
pub enum MailingListClient {
    Mailchimp(MailchimpClient),
    Brevo(BrevoClient),
}

impl MailingListClient {
    pub async fn upsert_contact(&self, signup: &NewSignup) -> Result<(), MailingListError> {
        match self {
            Self::Mailchimp(client) => client.upsert_contact(signup).await,
            Self::Brevo(client) => client.upsert_contact(signup).await,
        }
    }
}
