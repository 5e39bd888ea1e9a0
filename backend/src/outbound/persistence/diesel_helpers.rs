//! Shared error mapping for Diesel account persistence.
//!
//! Diesel and pool failures are translated into [`AccountPersistenceError`]
//! here. Uniqueness violations keep the name of the offending column, taken
//! from the constraint name PostgreSQL reports, so the domain can tell an
//! identifier clash apart from any other unique index.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::AccountPersistenceError;

use super::pool::PoolError;

/// Table prefix PostgreSQL uses when naming constraints on `accounts`.
const ACCOUNTS_CONSTRAINT_PREFIX: &str = "accounts_";

/// Suffix PostgreSQL gives to constraints created by `UNIQUE`.
const UNIQUE_CONSTRAINT_SUFFIX: &str = "_key";

/// Map pool errors to account persistence connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> AccountPersistenceError {
    AccountPersistenceError::connection(error.into_message())
}

/// Column guarded by a default-named unique constraint on `accounts`.
///
/// Returns `None` for constraints that do not follow the
/// `accounts_<column>_key` naming scheme.
pub(crate) fn unique_column(constraint: &str) -> Option<&str> {
    constraint
        .strip_prefix(ACCOUNTS_CONSTRAINT_PREFIX)?
        .strip_suffix(UNIQUE_CONSTRAINT_SUFFIX)
        .filter(|column| !column.is_empty())
}

/// Map Diesel errors to account persistence errors.
pub(crate) fn map_diesel_error(error: DieselError) -> AccountPersistenceError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = ?info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => AccountPersistenceError::query("record not found"),
        DieselError::QueryBuilderError(_) => {
            AccountPersistenceError::query("database query error")
        }
        DieselError::DatabaseError(kind, info) => match kind {
            DatabaseErrorKind::UniqueViolation => {
                let field = info
                    .constraint_name()
                    .and_then(unique_column)
                    .unwrap_or("unknown");
                AccountPersistenceError::unique_violation(field)
            }
            DatabaseErrorKind::ClosedConnection => {
                AccountPersistenceError::connection("database connection error")
            }
            _ => AccountPersistenceError::query("database error"),
        },
        _ => AccountPersistenceError::query("database error"),
    }
}
