//! Deterministic fixed-width identifiers derived from email addresses.
//!
//! Account stores built around a short, unique username column cannot hold
//! arbitrary email addresses. This crate maps an email to an opaque token
//! that always fits such a column:
//!
//! 1. lower-case the address (emails are matched case-insensitively);
//! 2. take the UTF-8 bytes, dropping anything that is not valid UTF-8;
//! 3. hash the bytes with SHA-256;
//! 4. encode the digest with the URL-safe base64 alphabet;
//! 5. truncate to the column width (30 characters by default).
//!
//! There is no salt and no randomness, so the same address always yields the
//! same identifier. Uniqueness is not checked here; the storage layer's
//! unique constraint and the collision resistance of the digest provide it.
//!
//! # Example
//!
//! ```
//! use email_identifier::{DEFAULT_WIDTH, encode};
//!
//! let identifier = encode("User@Example.com");
//! assert_eq!(identifier.as_str(), "tMmiiTI7IaAcPpQPFQ65uMVCWH8av9");
//! assert_eq!(identifier.as_str().len(), DEFAULT_WIDTH);
//! assert_eq!(identifier, encode("user@example.com"));
//! ```

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Width of the identifier column the codec targets by default.
pub const DEFAULT_WIDTH: usize = 30;

/// Length of an untruncated URL-safe base64 SHA-256 digest, padding included.
pub const MAX_WIDTH: usize = 44;

/// Errors raised when configuring an [`IdentifierCodec`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The requested width cannot be produced from a SHA-256 digest.
    #[error("identifier width must be between 1 and {max}, got {width}")]
    WidthOutOfRange {
        /// Width that was requested.
        width: usize,
        /// Largest width the codec can produce.
        max: usize,
    },
}

/// Opaque identifier derived from an email address.
///
/// Values produced by [`IdentifierCodec::encode`] contain only characters of
/// the URL-safe base64 alphabet (plus `=` padding when the width is
/// [`MAX_WIDTH`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailIdentifier(String);

impl EmailIdentifier {
    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Consume the identifier and return the owned text.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for EmailIdentifier {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for EmailIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<EmailIdentifier> for String {
    fn from(value: EmailIdentifier) -> Self {
        value.0
    }
}

/// Email to identifier codec bound to a fixed output width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentifierCodec {
    width: usize,
}

impl IdentifierCodec {
    /// Build a codec producing identifiers of exactly `width` characters.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::WidthOutOfRange`] when `width` is zero or larger
    /// than [`MAX_WIDTH`].
    ///
    /// # Examples
    ///
    /// ```
    /// use email_identifier::{IdentifierCodec, MAX_WIDTH};
    ///
    /// let codec = IdentifierCodec::new(MAX_WIDTH).expect("width in range");
    /// assert_eq!(codec.encode("user@example.com").as_str().len(), MAX_WIDTH);
    /// assert!(IdentifierCodec::new(0).is_err());
    /// ```
    pub const fn new(width: usize) -> Result<Self, CodecError> {
        if width == 0 || width > MAX_WIDTH {
            return Err(CodecError::WidthOutOfRange {
                width,
                max: MAX_WIDTH,
            });
        }
        Ok(Self { width })
    }

    /// Output width in characters.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Encode an email address.
    #[must_use]
    pub fn encode(&self, email: &str) -> EmailIdentifier {
        let lowered = email.to_lowercase();
        let digest = Sha256::digest(lowered.as_bytes());
        let mut encoded = URL_SAFE.encode(digest);
        // Base64 output is ASCII, so truncating by bytes keeps char boundaries.
        encoded.truncate(self.width);
        EmailIdentifier(encoded)
    }

    /// Encode raw bytes, skipping any sequence that is not valid UTF-8.
    ///
    /// # Examples
    ///
    /// ```
    /// use email_identifier::IdentifierCodec;
    ///
    /// let codec = IdentifierCodec::default();
    /// let garbled = b"user@\xffexample.com";
    /// assert_eq!(codec.encode_bytes(garbled), codec.encode("user@example.com"));
    /// ```
    #[must_use]
    pub fn encode_bytes(&self, raw: &[u8]) -> EmailIdentifier {
        let text: String = raw.utf8_chunks().map(|chunk| chunk.valid()).collect();
        self.encode(&text)
    }
}

impl Default for IdentifierCodec {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
        }
    }
}

/// Encode an email address with the default 30-character width.
#[must_use]
pub fn encode(email: &str) -> EmailIdentifier {
    IdentifierCodec::default().encode(email)
}

#[cfg(test)]
mod tests {
    //! Known-answer and property coverage for the codec.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("user@example.com", "tMmiiTI7IaAcPpQPFQ65uMVCWH8av9")]
    #[case("", "47DEQpj8HBSa-_TImW-5JCeuQeRkm5")]
    #[case("ünïcödé@example.com", "Hlb24sp_dkAgN1q4hHfVOgCjh-Ggb6")]
    #[case(
        "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaauser@example.com",
        "gBBjFITIzf-RC1Pwje0O85JOFwupbK"
    )]
    fn encodes_known_answers(#[case] email: &str, #[case] expected: &str) {
        assert_eq!(encode(email).as_str(), expected);
    }

    #[rstest]
    #[case("user@example.com", "USER@EXAMPLE.COM")]
    #[case("User@Example.Com", "uSeR@eXaMpLe.CoM")]
    #[case("ünïcödé@example.com", "ÜNÏCÖDÉ@EXAMPLE.COM")]
    fn encoding_ignores_case(#[case] lower: &str, #[case] upper: &str) {
        assert_eq!(encode(lower), encode(upper));
    }

    #[rstest]
    fn encoding_is_repeatable() {
        let first = encode("repeat@example.com");
        let second = encode("repeat@example.com");
        assert_eq!(first, second);
    }

    #[rstest]
    #[case("alice@example.com", "bob@example.com")]
    #[case("user@example.com", "user@example.co")]
    #[case("user@example.com", "user@example.com ")]
    fn distinct_emails_produce_distinct_identifiers(#[case] left: &str, #[case] right: &str) {
        assert_ne!(encode(left), encode(right));
    }

    #[rstest]
    fn long_emails_are_truncated_to_width() {
        let long_email = format!("{}@example.com", "x".repeat(500));
        let identifier = encode(&long_email);
        assert_eq!(identifier.as_str().len(), DEFAULT_WIDTH);
    }

    #[rstest]
    fn output_uses_url_safe_alphabet() {
        let identifier = IdentifierCodec::new(MAX_WIDTH)
            .expect("max width is valid")
            .encode("user@example.com");
        assert_eq!(
            identifier.as_str(),
            "tMmiiTI7IaAcPpQPFQ65uMVCWH8av9jw4cwf_F5HVRQ="
        );
        assert!(
            identifier
                .as_str()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '='))
        );
    }

    #[rstest]
    #[case(1)]
    #[case(DEFAULT_WIDTH)]
    #[case(MAX_WIDTH)]
    fn narrower_codecs_produce_prefixes(#[case] width: usize) {
        let codec = IdentifierCodec::new(width).expect("width in range");
        let full = IdentifierCodec::new(MAX_WIDTH)
            .expect("max width is valid")
            .encode("prefix@example.com");
        let narrow = codec.encode("prefix@example.com");
        assert_eq!(narrow.as_str().len(), width);
        assert!(full.as_str().starts_with(narrow.as_str()));
    }

    #[rstest]
    #[case(0)]
    #[case(MAX_WIDTH + 1)]
    fn rejects_widths_outside_digest_length(#[case] width: usize) {
        let error = IdentifierCodec::new(width).expect_err("width out of range");
        assert_eq!(
            error,
            CodecError::WidthOutOfRange {
                width,
                max: MAX_WIDTH
            }
        );
    }

    #[rstest]
    fn invalid_utf8_is_skipped() {
        let codec = IdentifierCodec::default();
        assert_eq!(
            codec.encode_bytes(b"\xc3user@example.com\xff"),
            codec.encode("user@example.com")
        );
    }

    #[rstest]
    fn serialises_as_plain_string() {
        let identifier = encode("user@example.com");
        let json = serde_json::to_string(&identifier).expect("serialise identifier");
        assert_eq!(json, "\"tMmiiTI7IaAcPpQPFQ65uMVCWH8av9\"");
    }
}
