//! Mobile phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`PhoneNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    /// The input contains no digits.
    #[error("mobile phone number is required")]
    Empty,
    /// Digit count outside the accepted range.
    #[error("mobile phone number must be {min}-{max} digits")]
    InvalidLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
}

/// A mobile phone number, stored as digits only.
///
/// Formatting characters (spaces, dashes, `+`) are dropped on parse.
///
/// ```
/// use foody_core::PhoneNumber;
///
/// let phone = PhoneNumber::parse("0812-3456-7890").unwrap();
/// assert_eq!(phone.as_str(), "081234567890");
/// assert_eq!(phone.international(), "6281234567890");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Minimum number of digits.
    pub const MIN_DIGITS: usize = 8;
    /// Maximum number of digits.
    pub const MAX_DIGITS: usize = 15;

    /// Indonesian country calling code.
    const COUNTRY_CODE: &'static str = "62";

    /// Parse a phone number, keeping only its digits.
    ///
    /// # Errors
    ///
    /// Returns an error if there are no digits or the digit count is
    /// outside 8-15.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(PhoneError::Empty);
        }
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits.len()) {
            return Err(PhoneError::InvalidLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }
        Ok(Self(digits))
    }

    /// The digits as entered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number with the Indonesian `62` prefix.
    ///
    /// A leading trunk `0` is replaced; numbers already starting with `62`
    /// are returned unchanged.
    #[must_use]
    pub fn international(&self) -> String {
        if let Some(rest) = self.0.strip_prefix('0') {
            format!("{}{rest}", Self::COUNTRY_CODE)
        } else if self.0.starts_with(Self::COUNTRY_CODE) {
            self.0.clone()
        } else {
            format!("{}{}", Self::COUNTRY_CODE, self.0)
        }
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
