//! PostgreSQL-backed `AccountRepository` implementation using Diesel ORM.
//!
//! Each port method is a single statement, so every write is atomic on its
//! own. Identifier uniqueness is enforced by the `accounts_identifier_key`
//! constraint and surfaces as a uniqueness violation on the `identifier`
//! field.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;

use crate::domain::ports::{AccountPersistenceError, AccountRepository};
use crate::domain::{Account, AccountFlags, AccountId, Email, Identifier, NewAccount, Password};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::{AccountRow, AccountUpdate, NewAccountRow};
use super::password_hashing::{self, hash_password};
use super::pool::DbPool;
use super::schema::accounts;

/// Diesel-backed implementation of the `AccountRepository` port.
#[derive(Debug, Clone)]
pub struct DieselAccountRepository {
    pool: DbPool,
}

impl DieselAccountRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row to a domain account.
fn row_to_account(row: AccountRow) -> Result<Account, AccountPersistenceError> {
    let identifier = Identifier::new(row.identifier).map_err(|err| {
        AccountPersistenceError::query(format!("stored identifier for account {}: {err}", row.id))
    })?;
    Ok(Account::new(
        AccountId::new(row.id),
        identifier,
        Email::new(row.email),
        AccountFlags {
            active: row.is_active,
            staff: row.is_staff,
            superuser: row.is_superuser,
        },
    ))
}

#[async_trait]
impl AccountRepository for DieselAccountRepository {
    async fn insert(&self, account: &NewAccount) -> Result<Account, AccountPersistenceError> {
        let password_hash = account.password.as_ref().map(hash_password).transpose()?;
        let new_row = NewAccountRow {
            identifier: account.identifier.as_str(),
            email: account.email.as_str(),
            password_hash,
            is_active: account.flags.active,
            is_staff: account.flags.staff,
            is_superuser: account.flags.superuser,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(accounts::table)
            .values(&new_row)
            .returning(AccountRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        debug!(account_id = row.id, "account row inserted");
        row_to_account(row)
    }

    async fn update(&self, account: &Account) -> Result<(), AccountPersistenceError> {
        let flags = account.flags();
        let changeset = AccountUpdate {
            identifier: account.identifier().as_str(),
            email: account.email().as_str(),
            is_active: flags.active,
            is_staff: flags.staff,
            is_superuser: flags.superuser,
        };

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let updated_rows = diesel::update(accounts::table.find(account.id().get()))
            .set(&changeset)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if updated_rows == 0 {
            return Err(AccountPersistenceError::not_found(account.id().get()));
        }
        Ok(())
    }

    async fn find_by_identifier(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<Account>, AccountPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<AccountRow> = accounts::table
            .filter(accounts::identifier.eq(identifier.as_str()))
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_account).transpose()
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: Option<AccountRow> = accounts::table
            .find(id.get())
            .select(AccountRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        row.map(row_to_account).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Account>, AccountPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<AccountRow> = accounts::table
            .select(AccountRow::as_select())
            .order_by(accounts::id.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_account).collect()
    }

    async fn count(&self) -> Result<u64, AccountPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let total: i64 = accounts::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        u64::try_from(total)
            .map_err(|_| AccountPersistenceError::query(format!("negative row count {total}")))
    }

    async fn verify_password(
        &self,
        id: AccountId,
        password: &Password,
    ) -> Result<bool, AccountPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let stored: Option<Option<String>> = accounts::table
            .find(id.get())
            .select(accounts::password_hash)
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(stored
            .flatten()
            .is_some_and(|hash| password_hashing::verify_password(&hash, password)))
    }
}
