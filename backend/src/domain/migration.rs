//! All-or-nothing migration of an account store to email-derived identifiers.
//!
//! The migration runs in two passes over the full table. [`validate`]
//! collects every reason the store cannot be converted; only when it finds
//! none does [`apply`] re-save each account through the
//! [`AccountService`], recomputing its identifier. A partial rewrite would
//! leave the store with mixed identifier schemes and no way back, so
//! nothing is written unless the whole table validates.
//!
//! Exclusive access to the store is a precondition: accounts created between
//! the two passes are not re-validated, and the store's uniqueness
//! constraint remains the final authority.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::io::{self, Write};

use thiserror::Error;
use tracing::{info, warn};

use super::account_service::AccountService;
use super::ports::{AccountPersistenceError, AccountRepository};
use super::{Account, AccountError, Email, Identifier, IdentifierPolicy};

/// Reason a single account blocks the migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationIssue {
    /// The account has no email and the policy requires one.
    MissingEmail { identifier: Identifier },
    /// An earlier account already uses the same email, case-insensitively.
    DuplicateEmail {
        identifier: Identifier,
        email: Email,
        conflicting: Identifier,
    },
}

impl MigrationIssue {
    /// Pre-migration identifier of the offending account.
    pub fn identifier(&self) -> &Identifier {
        match self {
            Self::MissingEmail { identifier } | Self::DuplicateEmail { identifier, .. } => {
                identifier
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::MissingEmail { .. } => "missing_email",
            Self::DuplicateEmail { .. } => "duplicate_email",
        }
    }
}

impl fmt::Display for MigrationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEmail { identifier } => write!(
                f,
                "Cannot convert account '{identifier}' because email is not set."
            ),
            Self::DuplicateEmail {
                identifier,
                email,
                conflicting,
            } => write!(
                f,
                "Cannot convert account '{identifier}' because email '{email}' is already used by account '{conflicting}'."
            ),
        }
    }
}

/// Failures of a migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Validation found accounts that cannot be converted; nothing was
    /// written. Details went to the output sink.
    #[error("identifier migration failed: {issues} account(s) cannot be converted")]
    Aborted { issues: usize },
    /// The account table could not be read.
    #[error("failed to load accounts: {0}")]
    Load(#[source] AccountPersistenceError),
    /// A write failed during the apply pass.
    #[error("failed to migrate account: {0}")]
    Apply(#[source] AccountError),
    /// The output sink could not be written.
    #[error("failed to write migration output: {0}")]
    Output(#[from] io::Error),
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub migrated: usize,
}

/// Check that every account can receive a unique new identifier.
///
/// Returns all issues found, in account order; an empty list means the
/// store can be migrated.
///
/// # Examples
/// ```
/// use emailusernames::domain::migration::validate;
/// use emailusernames::domain::{Account, AccountFlags, AccountId, Email, Identifier, IdentifierPolicy};
///
/// let account = |id, name: &str, email: &str| {
///     let identifier = Identifier::new(name).expect("valid identifier");
///     Account::new(AccountId::new(id), identifier, Email::new(email), AccountFlags::default())
/// };
/// let accounts = [
///     account(1, "alice", "alice@example.com"),
///     account(2, "alice2", "ALICE@example.com"),
///     account(3, "ghost", ""),
/// ];
///
/// let issues = validate(&accounts, &IdentifierPolicy::strict());
/// assert_eq!(issues.len(), 2);
/// assert!(validate(&accounts[..1], &IdentifierPolicy::strict()).is_empty());
/// ```
pub fn validate(accounts: &[Account], policy: &IdentifierPolicy) -> Vec<MigrationIssue> {
    let mut seen: HashMap<String, &Identifier> = HashMap::new();
    let mut issues = Vec::new();

    for account in accounts {
        if account.email().is_empty() {
            if !policy.allows_empty() {
                issues.push(MigrationIssue::MissingEmail {
                    identifier: account.identifier().clone(),
                });
            }
            continue;
        }

        match seen.entry(account.email().normalized()) {
            Entry::Occupied(first) => issues.push(MigrationIssue::DuplicateEmail {
                identifier: account.identifier().clone(),
                email: account.email().clone(),
                conflicting: (*first.get()).clone(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(account.identifier());
            }
        }
    }

    issues
}

/// Re-save every account, recomputing identifiers. Returns the number of
/// accounts written.
///
/// Only call this with accounts that passed [`validate`].
pub async fn apply<R>(
    service: &AccountService<R>,
    accounts: Vec<Account>,
) -> Result<usize, AccountError>
where
    R: AccountRepository,
{
    let mut migrated = 0;
    for account in accounts {
        service.save(account).await?;
        migrated += 1;
    }
    Ok(migrated)
}

/// Validate-then-apply orchestration over an [`AccountService`].
#[derive(Debug)]
pub struct IdentifierMigration<R> {
    service: AccountService<R>,
}

impl<R> IdentifierMigration<R>
where
    R: AccountRepository,
{
    /// Wrap the service whose store will be migrated.
    pub fn new(service: AccountService<R>) -> Self {
        Self { service }
    }

    /// Run the migration.
    ///
    /// Progress goes to `output` when given, otherwise to standard output,
    /// or nowhere when `quiet` is set. On validation failure one line per
    /// issue is written before [`MigrationError::Aborted`] is returned, and
    /// no account has been modified.
    pub async fn run(
        &self,
        output: Option<&mut (dyn Write + Send)>,
        quiet: bool,
    ) -> Result<MigrationReport, MigrationError> {
        match output {
            Some(sink) => self.run_into(sink).await,
            None if quiet => self.run_into(&mut io::sink()).await,
            None => self.run_into(&mut io::stdout()).await,
        }
    }

    async fn run_into(
        &self,
        sink: &mut (dyn Write + Send),
    ) -> Result<MigrationReport, MigrationError> {
        let accounts = self
            .service
            .repository()
            .list_all()
            .await
            .map_err(MigrationError::Load)?;

        let issues = validate(&accounts, self.service.policy());
        if !issues.is_empty() {
            for issue in &issues {
                warn!(
                    identifier = %issue.identifier(),
                    kind = issue.kind(),
                    "account cannot be migrated"
                );
                writeln!(sink, "{issue}")?;
            }
            warn!(issues = issues.len(), "identifier migration aborted");
            return Err(MigrationError::Aborted {
                issues: issues.len(),
            });
        }

        let migrated = apply(&self.service, accounts)
            .await
            .map_err(MigrationError::Apply)?;
        writeln!(
            sink,
            "Successfully migrated identifiers for all {migrated} accounts"
        )?;
        sink.flush()?;
        info!(migrated, "identifier migration complete");
        Ok(MigrationReport { migrated })
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
