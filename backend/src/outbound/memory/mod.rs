//! In-process account store.
//!
//! Implements the `AccountRepository` port over a mutex-guarded map with the
//! same uniqueness semantics as the PostgreSQL adapter: identifiers are
//! unique and a clash is reported as a uniqueness violation on the
//! `identifier` field. Keys are assigned sequentially from 1.
//!
//! Passwords are held as given and compared directly, so this adapter is for
//! tests, demos and seeding fixtures only.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::ports::{AccountPersistenceError, AccountRepository, IDENTIFIER_FIELD};
use crate::domain::{Account, AccountId, Identifier, NewAccount, Password};

#[derive(Debug)]
struct StoredAccount {
    account: Account,
    password: Option<Password>,
}

#[derive(Debug, Default)]
struct StoreState {
    last_id: i64,
    rows: BTreeMap<AccountId, StoredAccount>,
}

impl StoreState {
    fn identifier_taken(&self, identifier: &Identifier, except: Option<AccountId>) -> bool {
        self.rows
            .iter()
            .any(|(id, row)| Some(*id) != except && row.account.identifier() == identifier)
    }
}

/// Mutex-guarded in-memory implementation of [`AccountRepository`].
#[derive(Debug, Default)]
pub struct InMemoryAccountRepository {
    state: Mutex<StoreState>,
}

impl InMemoryAccountRepository {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, StoreState>, AccountPersistenceError> {
        self.state
            .lock()
            .map_err(|_| AccountPersistenceError::connection("account store lock poisoned"))
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert(&self, account: &NewAccount) -> Result<Account, AccountPersistenceError> {
        let mut state = self.lock()?;
        if state.identifier_taken(&account.identifier, None) {
            return Err(AccountPersistenceError::unique_violation(IDENTIFIER_FIELD));
        }

        state.last_id += 1;
        let id = AccountId::new(state.last_id);
        let stored = Account::new(
            id,
            account.identifier.clone(),
            account.email.clone(),
            account.flags,
        );
        state.rows.insert(
            id,
            StoredAccount {
                account: stored.clone(),
                password: account.password.clone(),
            },
        );
        Ok(stored)
    }

    async fn update(&self, account: &Account) -> Result<(), AccountPersistenceError> {
        let mut state = self.lock()?;
        if state.identifier_taken(account.identifier(), Some(account.id())) {
            return Err(AccountPersistenceError::unique_violation(IDENTIFIER_FIELD));
        }
        let row = state
            .rows
            .get_mut(&account.id())
            .ok_or_else(|| AccountPersistenceError::not_found(account.id().get()))?;
        row.account = account.clone();
        Ok(())
    }

    async fn find_by_identifier(
        &self,
        identifier: &Identifier,
    ) -> Result<Option<Account>, AccountPersistenceError> {
        let state = self.lock()?;
        Ok(state
            .rows
            .values()
            .find(|row| row.account.identifier() == identifier)
            .map(|row| row.account.clone()))
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, AccountPersistenceError> {
        let state = self.lock()?;
        Ok(state.rows.get(&id).map(|row| row.account.clone()))
    }

    async fn list_all(&self) -> Result<Vec<Account>, AccountPersistenceError> {
        let state = self.lock()?;
        Ok(state.rows.values().map(|row| row.account.clone()).collect())
    }

    async fn count(&self) -> Result<u64, AccountPersistenceError> {
        let state = self.lock()?;
        u64::try_from(state.rows.len())
            .map_err(|err| AccountPersistenceError::query(format!("account count overflow: {err}")))
    }

    async fn verify_password(
        &self,
        id: AccountId,
        password: &Password,
    ) -> Result<bool, AccountPersistenceError> {
        let state = self.lock()?;
        Ok(state
            .rows
            .get(&id)
            .and_then(|row| row.password.as_ref())
            .is_some_and(|stored| stored == password))
    }
}
