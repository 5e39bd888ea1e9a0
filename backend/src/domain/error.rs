//! Errors surfaced by account operations.

use std::fmt;

use thiserror::Error;

use super::account::AccountValidationError;
use super::ports::AccountPersistenceError;

/// What collided when a write hit the identifier uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateSubject {
    /// Another account already uses the same email, case-insensitively.
    Email,
    /// Another account holds the bare provisional placeholder.
    Placeholder,
}

impl fmt::Display for DuplicateSubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Email => f.write_str("account email is not unique"),
            Self::Placeholder => f.write_str("placeholder identifier is already in use"),
        }
    }
}

/// Failures of account creation, lookup and save.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    /// An email is required but none was given.
    #[error("account email is empty")]
    EmptyIdentifier,
    /// The derived identifier is already stored for another account.
    #[error("{0}")]
    DuplicateIdentifier(DuplicateSubject),
    /// Accounts without an email cannot be resolved by email.
    #[error("account cannot be matched without email")]
    AmbiguousLookup,
    /// No account carries the identifier derived from the email.
    #[error("no account matches the given email")]
    NotFound,
    /// A value broke an account invariant.
    #[error(transparent)]
    Validation(#[from] AccountValidationError),
    /// Any other storage failure, passed through unchanged.
    #[error(transparent)]
    Persistence(#[from] AccountPersistenceError),
}

impl AccountError {
    /// Translate an identifier uniqueness violation into
    /// [`AccountError::DuplicateIdentifier`]; anything else passes through.
    pub(crate) fn from_write(error: AccountPersistenceError, subject: DuplicateSubject) -> Self {
        if error.is_identifier_conflict() {
            Self::DuplicateIdentifier(subject)
        } else {
            Self::Persistence(error)
        }
    }
}
