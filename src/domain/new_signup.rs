use super::{FirstName, JobRole, OrganizationSize, SubscriberEmail};

/// A validated signup, ready to be persisted and synced to the mailing list.
#[derive(Debug)]
pub struct NewSignup {
    pub email: SubscriberEmail,
    pub first_name: Option<FirstName>,
    pub job_role: Option<JobRole>,
    pub organization_size: Option<OrganizationSize>,
}
