//! Input validation for submitted forms.
//!
//! Both checks are deliberately loose format checks, not deliverability
//! checks:
//!
//! - email: `local@domain.tld` where local is `[A-Za-z0-9._%+-]+`, domain is
//!   `[A-Za-z0-9.-]+` and the TLD is at least two ASCII letters
//! - phone: `^\+?1?\d{9,15}$`

/// Characters allowed in the local part of an email address.
fn is_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

/// Characters allowed in the domain part (before the TLD).
fn is_domain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-')
}

/// Basic email format check.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || !local.chars().all(is_local_char) {
        return false;
    }

    // The TLD is whatever follows the last dot; the domain greedily takes the rest.
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !host.is_empty()
        && host.chars().all(is_domain_char)
        && tld.len() >= 2
        && tld.chars().all(|c| c.is_ascii_alphabetic())
}

/// Basic phone number format check.
#[must_use]
pub fn is_valid_phone_number(phone: &str) -> bool {
    let rest = phone.strip_prefix('+').unwrap_or(phone);

    if !rest.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    // The optional leading `1` is absorbed by `\d{9,15}` whenever it can be,
    // so the accepted lengths are 9..=15, or 16 when the first digit is `1`.
    match rest.len() {
        9..=15 => true,
        16 => rest.starts_with('1'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.co"));
        assert!(is_valid_email("x_y%z-1@host-name.io"));
    }

    #[test]
    fn test_invalid_emails() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("no-at-sign.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user@localhost"));
        assert!(!is_valid_email("user@example.c"));
        assert!(!is_valid_email("user@example.c0m"));
        assert!(!is_valid_email("us er@example.com"));
        assert!(!is_valid_email("user@@example.com"));
    }

    #[test]
    fn test_valid_phone_numbers() {
        assert!(is_valid_phone_number("123456789"));
        assert!(is_valid_phone_number("+14155550123"));
        assert!(is_valid_phone_number("123456789012345"));
        assert!(is_valid_phone_number("1123456789012345"));
    }

    #[test]
    fn test_invalid_phone_numbers() {
        assert!(!is_valid_phone_number(""));
        assert!(!is_valid_phone_number("12345678"));
        assert!(!is_valid_phone_number("+"));
        assert!(!is_valid_phone_number("555-123-4567"));
        assert!(!is_valid_phone_number("2123456789012345"));
        assert!(!is_valid_phone_number("++123456789"));
    }
}
