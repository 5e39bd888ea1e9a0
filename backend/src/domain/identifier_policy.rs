//! Rules mapping an account's email to its stored identifier.
//!
//! The policy is a plain value handed to whoever needs it; nothing reads
//! process-wide settings at call time.

use email_identifier::IdentifierCodec;
use thiserror::Error;

use super::account::{Account, AccountId, Email, IDENTIFIER_MAX_LEN, Identifier};

/// Default reserved prefix for placeholder identifiers.
pub const DEFAULT_EMPTY_PREFIX: &str = "-";

/// Widest decimal rendering of an [`AccountId`] (`i64::MIN`).
const MAX_KEY_DIGITS: usize = 20;

/// Longest prefix that still leaves room for any account key.
pub const EMPTY_PREFIX_MAX_LEN: usize = IDENTIFIER_MAX_LEN - MAX_KEY_DIGITS;

/// Errors raised when building an [`IdentifierPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// The placeholder prefix was empty.
    #[error("empty-email prefix must not be empty")]
    EmptyPrefix,
    /// The placeholder prefix would not leave room for the account key.
    #[error("empty-email prefix must be at most {max} characters, got {actual}")]
    PrefixTooLong { max: usize, actual: usize },
}

/// Empty-email policy plus the codec used for email-derived identifiers.
///
/// # Examples
/// ```
/// use emailusernames::domain::{AccountId, Email, IdentifierPolicy};
///
/// let policy = IdentifierPolicy::new(true, "~").expect("valid policy");
/// assert_eq!(policy.placeholder_for(AccountId::new(42)).as_str(), "~42");
/// assert_eq!(
///     policy.encode(&Email::new("USER@example.com")).as_str(),
///     "tMmiiTI7IaAcPpQPFQ65uMVCWH8av9",
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierPolicy {
    allow_empty: bool,
    empty_prefix: String,
    codec: IdentifierCodec,
}

impl IdentifierPolicy {
    /// Build a policy, validating the placeholder prefix.
    pub fn new(allow_empty: bool, empty_prefix: impl Into<String>) -> Result<Self, PolicyError> {
        let empty_prefix = empty_prefix.into();
        let actual = empty_prefix.chars().count();
        if actual == 0 {
            return Err(PolicyError::EmptyPrefix);
        }
        if actual > EMPTY_PREFIX_MAX_LEN {
            return Err(PolicyError::PrefixTooLong {
                max: EMPTY_PREFIX_MAX_LEN,
                actual,
            });
        }
        Ok(Self {
            allow_empty,
            empty_prefix,
            codec: IdentifierCodec::default(),
        })
    }

    /// Policy rejecting accounts without an email.
    pub fn strict() -> Self {
        Self {
            allow_empty: false,
            empty_prefix: DEFAULT_EMPTY_PREFIX.to_owned(),
            codec: IdentifierCodec::default(),
        }
    }

    /// Policy accepting accounts without an email, using the default prefix.
    pub fn allowing_empty() -> Self {
        Self {
            allow_empty: true,
            ..Self::strict()
        }
    }

    /// Whether accounts without an email are permitted.
    pub fn allows_empty(&self) -> bool {
        self.allow_empty
    }

    /// Reserved placeholder prefix.
    pub fn empty_prefix(&self) -> &str {
        &self.empty_prefix
    }

    /// Identifier derived from an email.
    pub fn encode(&self, email: &Email) -> Identifier {
        Identifier::from(self.codec.encode(email.as_str()))
    }

    /// Identifier used for an email-less account before its key is known.
    pub fn provisional_placeholder(&self) -> Identifier {
        Identifier::from_bounded(self.empty_prefix.clone())
    }

    /// Permanent identifier of an email-less account.
    pub fn placeholder_for(&self, id: AccountId) -> Identifier {
        Identifier::from_bounded(format!("{}{}", self.empty_prefix, id))
    }

    /// Whether `identifier` is the bare provisional placeholder.
    pub fn is_provisional(&self, identifier: &Identifier) -> bool {
        identifier.as_str() == self.empty_prefix
    }

    /// Identifier an existing account must carry once saved.
    ///
    /// Returns `None` when the account has no email and the policy forbids
    /// that. Email-less accounts keep whatever identifier they already have,
    /// except the provisional placeholder, which is finalised with the key.
    pub fn identifier_for(&self, account: &Account) -> Option<Identifier> {
        if !account.email().is_empty() {
            return Some(self.encode(account.email()));
        }
        if !self.allow_empty {
            return None;
        }
        if self.is_provisional(account.identifier()) {
            Some(self.placeholder_for(account.id()))
        } else {
            Some(account.identifier().clone())
        }
    }
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        Self::strict()
    }
}
