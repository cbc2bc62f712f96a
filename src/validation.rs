//! Input validation rules for the registration dialogue.
//!
//! Only email and phone are validated; the name step accepts any
//! non-empty text.

use std::sync::LazyLock;

use regex::Regex;

/// Local part of allowed characters, `@`, domain with at least one dot,
/// top-level segment of 2+ letters.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Optional leading `+`, then 10 or more digits.
static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,}$").unwrap());

/// Check that a string is a well-formed email address.
pub fn is_valid_email(text: &str) -> bool {
    EMAIL_RE.is_match(text)
}

/// Check that a string is a well-formed phone number.
pub fn is_valid_phone(text: &str) -> bool {
    PHONE_RE.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_emails_accepted() {
        for email in [
            "ann@example.com",
            "a.b_c%d+e-f@sub.domain.org",
            "USER123@HOST.IO",
            "x@y.co",
        ] {
            assert!(is_valid_email(email), "{email} should be valid");
        }
    }

    #[test]
    fn malformed_emails_rejected() {
        for email in [
            "",
            "bad-email",
            "missing-at.example.com",
            "no-tld@example",
            "short-tld@example.c",
            "spaces in@example.com",
            "trailing@example.com ",
            "@example.com",
        ] {
            assert!(!is_valid_email(email), "{email} should be invalid");
        }
    }

    #[test]
    fn well_formed_phones_accepted() {
        assert!(is_valid_phone("1234567890"));
        assert!(is_valid_phone("+1234567890"));
        assert!(is_valid_phone("12345678901234"));
    }

    #[test]
    fn malformed_phones_rejected() {
        for phone in [
            "",
            "123456789",      // nine digits
            "+123456789",     // nine digits with plus
            "12345abc890",    // letters
            "123 456 7890",   // spaces
            "++1234567890",   // double plus
            "1234567890+",    // plus at the end
        ] {
            assert!(!is_valid_phone(phone), "{phone} should be invalid");
        }
    }
}
