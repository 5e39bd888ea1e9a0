//! Port for account persistence.
//!
//! The [`AccountRepository`] trait is the storage layer contract: an account
//! table keyed by a unique, bounded-width identifier, supporting insert,
//! update, point lookups and full scans. Adapters must report a write that
//! would duplicate a unique column as
//! [`AccountPersistenceError::UniqueViolation`] naming the column, so callers
//! can tell an identifier clash apart from any other constraint.

use async_trait::async_trait;

use crate::domain::{Account, AccountId, Identifier, NewAccount, Password};

use super::define_port_error;

/// Column name adapters report for identifier uniqueness violations.
pub const IDENTIFIER_FIELD: &str = "identifier";

define_port_error! {
    /// Persistence errors raised by account repository adapters.
    pub enum AccountPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "account repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "account repository query failed: {message}",
        /// A write would duplicate a unique column.
        UniqueViolation { field: String } => "unique constraint violated on {field}",
        /// The account to update does not exist.
        NotFound { id: i64 } => "account {id} does not exist",
    }
}

impl AccountPersistenceError {
    /// Whether this is a uniqueness violation on the identifier column.
    pub fn is_identifier_conflict(&self) -> bool {
        matches!(self, Self::UniqueViolation { field } if field == IDENTIFIER_FIELD)
    }
}

/// Port for account storage and retrieval.
///
/// Every write is a single atomic operation. `insert` stores the identifier
/// it is given verbatim; deriving identifiers from emails is the service's
/// job, which keeps this path usable for seeding legacy data.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Insert a new account and return it with its assigned key.
    async fn insert(&self, account: &NewAccount) -> Result<Account, AccountPersistenceError>;

    /// Overwrite the identifier, email and flags of an existing account.
    async fn update(&self, account: &Account) -> Result<(), AccountPersistenceError>;

    /// Fetch an account by its stored identifier.
    async fn find_by_identifier(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<Account>, AccountPersistenceError>;

    /// Fetch an account by key.
    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountPersistenceError>;

    /// Every account, in ascending key order.
    async fn list_all(&self) -> Result<Vec<Account>, AccountPersistenceError>;

    /// Number of stored accounts.
    async fn count(&self) -> Result<u64, AccountPersistenceError>;

    /// Check a password against the stored credential.
    ///
    /// Accounts without a usable password never verify.
    async fn verify_password(
        &self,
        id: AccountId,
        password: &Password,
    ) -> Result<bool, AccountPersistenceError>;
}
