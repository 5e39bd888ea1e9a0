//! Account domain: email-keyed accounts over an identifier-keyed store.
//!
//! Purpose: let callers treat the email as the account's login key while
//! the store keeps a short unique identifier column. Identifiers are derived
//! from emails by [`IdentifierPolicy`]; all writes go through
//! [`AccountService`] so the derivation is applied consistently.
//!
//! Public surface:
//! - Account, NewAccount, Email, Identifier, Password: account aggregate and
//!   value types.
//! - IdentifierPolicy: empty-email rules and identifier derivation.
//! - AccountService: create, save, lookup and authentication by email.
//! - IdentifierMigration: one-shot conversion of a legacy store.
//! - AccountError: failures surfaced to callers.

pub mod account;
pub mod account_service;
pub mod error;
pub mod identifier_policy;
pub mod migration;
pub mod ports;

pub use self::account::{
    Account, AccountFlags, AccountId, AccountValidationError, Email, IDENTIFIER_MAX_LEN,
    Identifier, NewAccount, Password,
};
pub use self::account_service::{AccountResult, AccountService, FlagOverrides};
pub use self::error::{AccountError, DuplicateSubject};
pub use self::identifier_policy::{
    DEFAULT_EMPTY_PREFIX, EMPTY_PREFIX_MAX_LEN, IdentifierPolicy, PolicyError,
};
pub use self::migration::{IdentifierMigration, MigrationError, MigrationIssue, MigrationReport};
