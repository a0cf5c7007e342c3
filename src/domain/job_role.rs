use unicode_segmentation::UnicodeSegmentation;

/// Free-text job role, same constraints as [`crate::domain::FirstName`].
#[derive(Clone, Debug)]
pub struct JobRole(String);

impl JobRole {
    pub fn parse(value: String) -> Result<JobRole, String> {
        let is_empty_or_whitespace = value.trim().is_empty();
        let is_too_long = value.graphemes(true).count() > 256;

        let forbidden_characters = ['/', '(', ')', '"', '<', '>', '\\', '{', '}'];
        let contains_forbidden_characters =
            value.chars().any(|g| forbidden_characters.contains(&g));

        if is_empty_or_whitespace || is_too_long || contains_forbidden_characters {
            Err(format!("{} is not a valid job role", value))
        } else {
            Ok(Self(value))
        }
    }
}

impl AsRef<str> for JobRole {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
