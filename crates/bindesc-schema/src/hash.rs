//! SHA-256 digests as they appear in descriptors.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors produced when parsing a [`Sha256Digest`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DigestError {
    /// The hex portion is not exactly 64 characters long.
    #[error("Invalid SHA256 digest: expected 64 hex characters, got {len} in '{value}'")]
    Length {
        /// Number of characters found after stripping any `sha256:` prefix.
        len: usize,
        /// The rejected input.
        value: String,
    },

    /// The value contains characters outside `[0-9a-fA-F]`.
    #[error("Invalid SHA256 digest: contains non-hex characters in '{0}'")]
    NonHex(String),
}

/// A validated SHA256 digest (64 hex characters)
///
/// Every digest in a descriptor is validated when it is parsed, so a
/// truncated or padded value (63 or 65 characters) is rejected at load time
/// instead of surfacing later as a confusing integrity failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Create a new `Sha256Digest`, validating the input.
    ///
    /// Accepts strings with or without a `sha256:` prefix and normalizes the
    /// stored value to lowercase.
    ///
    /// # Errors
    ///
    /// Returns [`DigestError::Length`] if the hex portion is not exactly 64
    /// characters, or [`DigestError::NonHex`] if it contains non-hex
    /// characters.
    pub fn new(s: impl Into<String>) -> Result<Self, DigestError> {
        let s = s.into();
        let hex = s.strip_prefix("sha256:").unwrap_or(&s);

        let len = hex.len();
        if len != 64 {
            return Err(DigestError::Length { len, value: s });
        }

        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex(s));
        }

        Ok(Self(hex.to_lowercase()))
    }

    /// Get the digest as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form (first 7 characters) for display.
    pub fn short(&self) -> &str {
        &self.0[..7]
    }

    /// Compare against a hex digest computed elsewhere, ignoring case.
    pub fn matches(&self, actual: &str) -> bool {
        self.0.eq_ignore_ascii_case(actual)
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl std::str::FromStr for Sha256Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Sha256Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DARWIN: &str = "cba11850c2516d18271d746cc58b511634207dd79700960a6a20d34eaa198628";

    #[test]
    fn accepts_64_hex_chars() {
        let digest = Sha256Digest::new(DARWIN).unwrap();
        assert_eq!(digest.as_str(), DARWIN);
        assert_eq!(digest.short(), "cba1185");
    }

    #[test]
    fn strips_prefix_and_lowercases() {
        let upper = format!("sha256:{}", DARWIN.to_uppercase());
        let digest = Sha256Digest::new(upper).unwrap();
        assert_eq!(digest.as_str(), DARWIN);
    }

    #[test]
    fn rejects_65_chars() {
        let padded = format!("{DARWIN}0");
        let err = Sha256Digest::new(padded).unwrap_err();
        assert!(matches!(err, DigestError::Length { len: 65, .. }));
    }

    #[test]
    fn rejects_63_chars() {
        let err = Sha256Digest::new(&DARWIN[1..]).unwrap_err();
        assert!(matches!(err, DigestError::Length { len: 63, .. }));
    }

    #[test]
    fn rejects_non_hex() {
        let bad = format!("{}z", &DARWIN[..63]);
        assert!(matches!(
            Sha256Digest::new(bad),
            Err(DigestError::NonHex(_))
        ));
    }

    #[test]
    fn matches_is_case_insensitive() {
        let digest = Sha256Digest::new(DARWIN).unwrap();
        assert!(digest.matches(&DARWIN.to_uppercase()));
        assert!(!digest.matches(&DARWIN[1..]));
    }
}
