use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Symbols a short code is drawn from.
pub const ALPHABET: &[u8; 63] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_";

/// Number of symbols in every short code.
pub const LENGTH: usize = 10;

/// A fixed-length identifier standing in for an original URL.
///
/// Short codes are exactly [`LENGTH`] symbols long and contain only symbols
/// from [`ALPHABET`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortCode(String);

impl ShortCode {
    /// Creates a new `ShortCode` after validating the input.
    pub fn new(code: impl AsRef<str>) -> Result<Self, CoreError> {
        let code = code.as_ref();
        Self::validate(code)?;
        Ok(Self(code.to_string()))
    }

    /// Creates a `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources
    /// (e.g. generators drawing from [`ALPHABET`], or rows read back from a
    /// store that only ever received validated codes).
    pub fn new_unchecked(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().to_string())
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns `true` if `symbol` belongs to [`ALPHABET`].
    pub fn is_symbol(symbol: u8) -> bool {
        symbol.is_ascii_alphanumeric() || symbol == b'_'
    }

    fn validate(code: &str) -> Result<(), CoreError> {
        if code.len() != LENGTH {
            return Err(CoreError::InvalidShortCode(format!(
                "expected {} symbols, got {}",
                LENGTH,
                code.len()
            )));
        }

        if let Some(symbol) = code.chars().find(|c| !c.is_ascii() || !Self::is_symbol(*c as u8)) {
            return Err(CoreError::InvalidShortCode(format!(
                "unexpected symbol {:?} in '{}'",
                symbol, code
            )));
        }

        Ok(())
    }
}

impl std::fmt::Debug for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShortCode").field(&self.0).finish()
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ShortCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for ShortCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShortCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}
