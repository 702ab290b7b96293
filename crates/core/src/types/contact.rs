//! Contact details collected by the booking form and stored on users.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors produced when parsing contact details.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("email cannot be empty")]
    EmptyEmail,
    #[error("email must look like name@domain")]
    MalformedEmail,
    #[error("phone number cannot be empty")]
    EmptyPhone,
    #[error("phone number must contain 9 to 11 digits")]
    PhoneLength,
    #[error("phone number may only contain digits, spaces, dots, dashes and a leading +")]
    PhoneCharacters,
}

/// An email address with a minimal structural check.
///
/// Deliverability is not checked; the booking flow only needs something a
/// staff member can reply to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an email, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::EmptyEmail`] for blank input and
    /// [`ContactError::MalformedEmail`] when there is not exactly one `@`
    /// with text on both sides, or the address is too long.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::EmptyEmail);
        }
        let mut parts = s.split('@');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None) if !local.is_empty() && domain.contains('.')
                && !domain.starts_with('.') && !domain.ends_with('.')
        );
        if !valid || s.len() > Self::MAX_LENGTH {
            return Err(ContactError::MalformedEmail);
        }
        Ok(Self(s.to_lowercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

/// A phone number normalized to digits, keeping a leading `+` if present.
///
/// Vietnamese numbers are 10 digits locally (`0901234567`) or 11 with the
/// `+84` prefix; 9 digits covers older landlines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parse and normalize a phone number.
    ///
    /// # Errors
    ///
    /// Returns a [`ContactError`] when the input is blank, contains letters
    /// or other symbols, or has the wrong number of digits.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::EmptyPhone);
        }

        let (plus, rest) = s.strip_prefix('+').map_or((false, s), |r| (true, r));
        if !rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '.' | '-'))
        {
            return Err(ContactError::PhoneCharacters);
        }

        let digits: String = rest.chars().filter(char::is_ascii_digit).collect();
        if !(9..=11).contains(&digits.len()) {
            return Err(ContactError::PhoneLength);
        }

        Ok(Self(if plus { format!("+{digits}") } else { digits }))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ContactError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    fn from(phone: PhoneNumber) -> Self {
        phone.0
    }
}
