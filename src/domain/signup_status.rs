use std::fmt::Display;

/// Lifecycle of a signup. A row is created as `Pending`; the other two states
/// are only ever set by the provider's double-opt-in flow, never by this
/// service.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignupStatus {
    Pending,
    Subscribed,
    Unsubscribed,
}

impl SignupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
        }
    }
}

impl Display for SignupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
