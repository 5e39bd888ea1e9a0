//! Account creation, lookup and save keyed by email.
//!
//! This service is the only place that turns emails into stored
//! identifiers. It owns the placeholder two-step commit for accounts
//! without an email and translates identifier uniqueness violations into
//! [`AccountError::DuplicateIdentifier`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::ports::AccountRepository;
use crate::domain::{
    Account, AccountError, AccountFlags, DuplicateSubject, Email, IdentifierPolicy, NewAccount,
    Password,
};

/// Convenient result alias for account operations.
pub type AccountResult<T> = Result<T, AccountError>;

/// Optional flag changes applied after an account is created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagOverrides {
    pub active: Option<bool>,
    pub staff: Option<bool>,
}

impl FlagOverrides {
    fn is_empty(self) -> bool {
        self.active.is_none() && self.staff.is_none()
    }
}

/// Email-keyed account operations over an [`AccountRepository`].
#[derive(Debug)]
pub struct AccountService<R> {
    repository: Arc<R>,
    policy: IdentifierPolicy,
}

impl<R> Clone for AccountService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            policy: self.policy.clone(),
        }
    }
}

impl<R> AccountService<R> {
    /// Create a service over the given repository and policy.
    pub fn new(repository: Arc<R>, policy: IdentifierPolicy) -> Self {
        Self { repository, policy }
    }

    /// Identifier policy in force.
    pub fn policy(&self) -> &IdentifierPolicy {
        &self.policy
    }

    /// Underlying repository.
    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }
}

impl<R> AccountService<R>
where
    R: AccountRepository,
{
    /// Create an account identified by `email`.
    ///
    /// Overrides, when any is set, are applied by a second write.
    pub async fn create_account(
        &self,
        email: &Email,
        password: Option<Password>,
        overrides: FlagOverrides,
    ) -> AccountResult<Account> {
        let mut account = self
            .insert_for_email(email, password, AccountFlags::default())
            .await?;
        if overrides.is_empty() {
            return Ok(account);
        }
        if let Some(active) = overrides.active {
            account.set_active(active);
        }
        if let Some(staff) = overrides.staff {
            account.set_staff(staff);
        }
        self.save(account).await
    }

    /// Create an active staff superuser identified by `email`.
    pub async fn create_superuser(
        &self,
        email: &Email,
        password: Password,
    ) -> AccountResult<Account> {
        self.insert_for_email(email, Some(password), AccountFlags::superuser())
            .await
    }

    async fn insert_for_email(
        &self,
        email: &Email,
        password: Option<Password>,
        flags: AccountFlags,
    ) -> AccountResult<Account> {
        if email.is_empty() {
            return self.insert_without_email(password, flags).await;
        }

        let request = NewAccount::new(self.policy.encode(email), email.clone())
            .with_password(password)
            .with_flags(flags);
        let account = self
            .repository
            .insert(&request)
            .await
            .map_err(|err| AccountError::from_write(err, DuplicateSubject::Email))?;
        info!(account_id = %account.id(), "account created");
        Ok(account)
    }

    async fn insert_without_email(
        &self,
        password: Option<Password>,
        flags: AccountFlags,
    ) -> AccountResult<Account> {
        if !self.policy.allows_empty() {
            return Err(AccountError::EmptyIdentifier);
        }

        // The key is only known after the first write, so the placeholder is
        // committed bare and then finalised by a save.
        let request = NewAccount::new(self.policy.provisional_placeholder(), Email::empty())
            .with_password(password)
            .with_flags(flags);
        let provisional = self
            .repository
            .insert(&request)
            .await
            .map_err(|err| AccountError::from_write(err, DuplicateSubject::Placeholder))?;
        let account = self.save(provisional).await?;
        info!(account_id = %account.id(), "account created without email");
        Ok(account)
    }

    /// Persist `account`, recomputing its identifier first.
    ///
    /// Accounts with an email get the encoded email. Accounts without one
    /// keep their identifier, except a provisional placeholder, which becomes
    /// prefix + key. Fails with [`AccountError::EmptyIdentifier`] when the
    /// account has no email and the policy forbids that.
    pub async fn save(&self, mut account: Account) -> AccountResult<Account> {
        let identifier = self
            .policy
            .identifier_for(&account)
            .ok_or(AccountError::EmptyIdentifier)?;
        let subject = if account.email().is_empty() {
            DuplicateSubject::Placeholder
        } else {
            DuplicateSubject::Email
        };
        if self.policy.is_provisional(account.identifier()) && identifier != *account.identifier()
        {
            debug!(account_id = %account.id(), "finalising placeholder identifier");
        }

        account.set_identifier(identifier);
        self.repository
            .update(&account)
            .await
            .map_err(|err| AccountError::from_write(err, subject))?;
        Ok(account)
    }

    /// Replace the email of `account` and save it.
    ///
    /// Clearing the email of an account under the empty-email policy moves
    /// it to its permanent placeholder, releasing the old email's identifier.
    pub async fn change_email(&self, mut account: Account, email: Email) -> AccountResult<Account> {
        let had_email = !account.email().is_empty();
        account.set_email(email);
        if had_email && account.email().is_empty() && self.policy.allows_empty() {
            account.set_identifier(self.policy.placeholder_for(account.id()));
        }
        self.save(account).await
    }

    /// Fetch the account for `email`, matched case-insensitively.
    pub async fn get_account(&self, email: &Email) -> AccountResult<Account> {
        if email.is_empty() && self.policy.allows_empty() {
            return Err(AccountError::AmbiguousLookup);
        }
        self.repository
            .find_by_identifier(&self.policy.encode(email))
            .await?
            .ok_or(AccountError::NotFound)
    }

    /// Whether an account exists for `email`.
    pub async fn account_exists(&self, email: &Email) -> AccountResult<bool> {
        match self.get_account(email).await {
            Ok(_) => Ok(true),
            Err(AccountError::NotFound | AccountError::AmbiguousLookup) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Resolve `email` and check `password`.
    ///
    /// Returns `None` for unknown emails, wrong passwords and inactive
    /// accounts.
    pub async fn authenticate(
        &self,
        email: &Email,
        password: &Password,
    ) -> AccountResult<Option<Account>> {
        let account = match self.get_account(email).await {
            Ok(account) => account,
            Err(AccountError::NotFound | AccountError::AmbiguousLookup) => return Ok(None),
            Err(err) => return Err(err),
        };
        if !account.is_active() {
            debug!(account_id = %account.id(), "inactive account rejected");
            return Ok(None);
        }
        let verified = self
            .repository
            .verify_password(account.id(), password)
            .await?;
        Ok(verified.then_some(account))
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
