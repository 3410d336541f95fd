use std::{borrow::Cow, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;
use url::Url;
use validator::ValidationError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$").expect("valid email regex")
});

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9 ()\-.]{7,20}$").expect("valid phone regex"));

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    ValidationError::new(code).with_message(Cow::Borrowed(message))
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_email_format(email: &str) -> Result<(), ValidationError> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(error("email", "Invalid email format"))
    }
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err(error("phone", "Phone number must be a valid phone number."))
    }
}

pub fn validate_date_of_birth(dob: &NaiveDate) -> Result<(), ValidationError> {
    let lower = NaiveDate::from_ymd_opt(1900, 1, 1);
    let upper = NaiveDate::from_ymd_opt(2999, 12, 31);
    match (lower, upper) {
        (Some(lower), Some(upper)) if (lower..=upper).contains(dob) => Ok(()),
        _ => Err(error("range", "Invalid Date")),
    }
}

/// Length, upper, lower, digit and non-alphanumeric requirements.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(error(
            "password_length",
            "Passwords must be at least 6 characters.",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(error(
            "password_digit",
            "Passwords must have at least one digit ('0'-'9').",
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(error(
            "password_lower",
            "Passwords must have at least one lowercase ('a'-'z').",
        ));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(error(
            "password_upper",
            "Passwords must have at least one uppercase ('A'-'Z').",
        ));
    }
    if password.chars().all(|c| c.is_alphanumeric()) {
        return Err(error(
            "password_non_alphanumeric",
            "Passwords must have at least one non alphanumeric character.",
        ));
    }
    Ok(())
}

/// Picture URLs are absolute http(s) URLs or paths under this server.
pub fn validate_picture_url(url: &str) -> Result<(), ValidationError> {
    let rooted_path =
        url.starts_with('/') && !url.starts_with("//") && !url.contains(char::is_whitespace);
    let absolute = Url::parse(url)
        .is_ok_and(|parsed| matches!(parsed.scheme(), "http" | "https") && parsed.has_host());
    if rooted_path || absolute {
        Ok(())
    } else {
        Err(error("url", "Url must be a valid URL."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_format_matches_login_keys() {
        assert!(is_valid_email("jane.doe+cars@dealer-adapt.ca"));
        assert!(!is_valid_email("jane.doe@localhost"));
        assert!(!is_valid_email("not an email"));
    }

    #[test]
    fn password_policy_requires_every_character_class() {
        assert!(validate_password("sS!1tring").is_ok());
        assert!(validate_password("sS!1").is_err());
        assert!(validate_password("ss!1tring").is_err());
        assert!(validate_password("SS!1TRING").is_err());
        assert!(validate_password("sS!xtring").is_err());
        assert!(validate_password("sS11tring").is_err());
    }

    #[test]
    fn date_of_birth_window() {
        let ok = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();
        let too_old = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        assert!(validate_date_of_birth(&ok).is_ok());
        assert!(validate_date_of_birth(&too_old).is_err());
    }

    #[test]
    fn picture_urls() {
        assert!(validate_picture_url("/CarImages/2020-Make1-Model1.jpg").is_ok());
        assert!(validate_picture_url("https://cdn.example.com/a.png").is_ok());
        assert!(validate_picture_url("//evil.example.com/a.png").is_err());
        assert!(validate_picture_url("ftp:/nope").is_err());
        assert!(validate_picture_url("ftp://files.example.com/a.png").is_err());
        assert!(validate_picture_url("https://").is_err());
        assert!(validate_picture_url("").is_err());
    }
}
