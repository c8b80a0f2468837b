//! Pre-submission form checks.
//!
//! Each validator stops at the first failed check: required fields first,
//! then formats, then lengths and matches.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ValidationError;
use crate::todos::TodoForm;

/// Longest accepted todo title, in characters
pub const MAX_TITLE_LEN: usize = 500;

/// Longest accepted todo description, in characters
pub const MAX_DESCRIPTION_LEN: usize = 2000;

/// Shortest accepted display name after trimming
pub const MIN_NAME_LEN: usize = 2;

/// The auth provider rejects shorter passwords
pub const MIN_PASSWORD_LEN: usize = 6;

/// Deliberately loose `local@domain.tld` shape
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email pattern"));

/// Login form values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Account creation form values
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

fn fail(message: &str) -> Result<(), ValidationError> {
    Err(ValidationError::new(message))
}

pub fn validate_login(form: &LoginForm) -> Result<(), ValidationError> {
    if form.email.is_empty() || form.password.is_empty() {
        return fail("Please enter email and password");
    }
    if !is_valid_email(&form.email) {
        return fail("Please enter a valid email");
    }
    Ok(())
}

pub fn validate_signup(form: &SignupForm) -> Result<(), ValidationError> {
    if form.name.is_empty()
        || form.email.is_empty()
        || form.password.is_empty()
        || form.confirm_password.is_empty()
    {
        return fail("Please fill in all fields");
    }
    if form.name.trim().chars().count() < MIN_NAME_LEN {
        return fail("Name must be at least 2 characters");
    }
    if !is_valid_email(&form.email) {
        return fail("Please enter a valid email address");
    }
    if form.password.chars().count() < MIN_PASSWORD_LEN {
        return fail("Password must be at least 6 characters");
    }
    if form.password != form.confirm_password {
        return fail("Passwords do not match");
    }
    Ok(())
}

pub fn validate_todo(form: &TodoForm) -> Result<(), ValidationError> {
    if form.title.trim().is_empty() {
        return fail("Title is required");
    }
    if form.title.chars().count() > MAX_TITLE_LEN {
        return fail("Title must be 500 characters or less");
    }
    if form.description.chars().count() > MAX_DESCRIPTION_LEN {
        return fail("Description must be 2000 characters or less");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(name: &str, email: &str, password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
        }
    }

    fn message(result: Result<(), ValidationError>) -> String {
        result.unwrap_err().message().to_string()
    }

    #[test]
    fn test_title_length_boundary() {
        assert!(validate_todo(&TodoForm::new("a".repeat(500))).is_ok());
        assert_eq!(
            message(validate_todo(&TodoForm::new("a".repeat(501)))),
            "Title must be 500 characters or less"
        );
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        assert!(validate_todo(&TodoForm::new("é".repeat(500))).is_ok());
    }

    #[test]
    fn test_title_required() {
        assert_eq!(message(validate_todo(&TodoForm::new(""))), "Title is required");
        assert_eq!(message(validate_todo(&TodoForm::new("   "))), "Title is required");
    }

    #[test]
    fn test_description_length() {
        let ok = TodoForm::new("t").with_description("d".repeat(2000));
        assert!(validate_todo(&ok).is_ok());

        let too_long = TodoForm::new("t").with_description("d".repeat(2001));
        assert_eq!(
            message(validate_todo(&too_long)),
            "Description must be 2000 characters or less"
        );
    }

    #[test]
    fn test_short_password_rejected() {
        let form = signup("Alice", "alice@example.com", "abc12", "abc12");
        assert_eq!(
            message(validate_signup(&form)),
            "Password must be at least 6 characters"
        );
    }

    #[test]
    fn test_signup_check_order() {
        // Empty fields win over every other problem
        let form = signup("A", "bad", "abc", "");
        assert_eq!(message(validate_signup(&form)), "Please fill in all fields");

        // Then name length, before the email format
        let form = signup(" A ", "bad", "abc", "abc");
        assert_eq!(message(validate_signup(&form)), "Name must be at least 2 characters");

        let form = signup("Alice", "alice@example", "abc", "abc");
        assert_eq!(message(validate_signup(&form)), "Please enter a valid email address");

        let form = signup("Alice", "alice@example.com", "secret1", "secret2");
        assert_eq!(message(validate_signup(&form)), "Passwords do not match");

        let form = signup("Alice", "alice@example.com", "secret1", "secret1");
        assert!(validate_signup(&form).is_ok());
    }

    #[test]
    fn test_login_checks() {
        assert_eq!(
            message(validate_login(&LoginForm::new("", "pw"))),
            "Please enter email and password"
        );
        assert_eq!(
            message(validate_login(&LoginForm::new("alice at example.com", "pw"))),
            "Please enter a valid email"
        );
        assert!(validate_login(&LoginForm::new("alice@example.com", "pw")).is_ok());
    }

    #[test]
    fn test_email_pattern_is_permissive() {
        assert!(is_valid_email("a@b.c"));
        assert!(is_valid_email("first.last+tag@sub.example.co.uk"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.d"));
        assert!(!is_valid_email("a@@b.c"));
    }
}
