#![deny(unsafe_code)]

use std::fmt;

use chrono::NaiveDate;

/// Registration key in the `YYYYMMDD-XXXX` format.
///
/// Ordering is lexical. Lexical and chronological order agree only while every
/// key is fixed-width and zero-padded, which [`RegistrationKey::is_canonical`]
/// checks.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct RegistrationKey(String);

const DATE_WIDTH: usize = 8;
const SUFFIX_WIDTH: usize = 4;

impl RegistrationKey {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self(value.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Calendar date encoded in the prefix, if the key is canonical.
    pub fn date(&self) -> Option<NaiveDate> {
        if !self.is_canonical() {
            return None;
        }
        NaiveDate::parse_from_str(&self.0[..DATE_WIDTH], "%Y%m%d").ok()
    }

    pub fn is_canonical(&self) -> bool {
        let bytes = self.0.as_bytes();
        if bytes.len() != DATE_WIDTH + 1 + SUFFIX_WIDTH || bytes[DATE_WIDTH] != b'-' {
            return false;
        }
        let (date, suffix) = (&bytes[..DATE_WIDTH], &bytes[DATE_WIDTH + 1..]);
        if !date.iter().all(u8::is_ascii_digit) || !suffix.iter().all(u8::is_ascii_alphanumeric)
        {
            return false;
        }
        NaiveDate::parse_from_str(&self.0[..DATE_WIDTH], "%Y%m%d").is_ok()
    }
}

impl fmt::Display for RegistrationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
