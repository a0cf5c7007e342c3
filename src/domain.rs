mod first_name;
mod job_role;
mod new_signup;
mod organization_size;
mod signup_status;
mod subscriber_email;

pub use first_name::FirstName;
pub use job_role::JobRole;
pub use new_signup::NewSignup;
pub use organization_size::OrganizationSize;
pub use signup_status::SignupStatus;
pub use subscriber_email::SubscriberEmail;
