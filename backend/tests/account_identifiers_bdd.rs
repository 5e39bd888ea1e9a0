//! Behaviour tests for email-keyed account creation and lookup.
//!
//! These scenarios drive the account service over the in-memory store and
//! check identifier derivation, case-insensitive lookup and the empty-email
//! policy.

use std::sync::Arc;

use emailusernames::domain::{
    Account, AccountError, AccountService, DuplicateSubject, Email, FlagOverrides,
    IdentifierPolicy,
};
use emailusernames::outbound::memory::InMemoryAccountRepository;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::{ScenarioState, given, scenario, then, when};
use tokio::runtime::Runtime;

// -----------------------------------------------------------------------------
// Test World
// -----------------------------------------------------------------------------

/// Wrapper for non-Clone types to enable storage in `Slot`.
#[derive(Clone)]
struct RuntimeHandle(Arc<Runtime>);

type Service = AccountService<InMemoryAccountRepository>;

/// Test world holding the service and the latest outcomes.
#[derive(Default, ScenarioState)]
struct AccountWorld {
    runtime: Slot<RuntimeHandle>,
    service: Slot<Service>,
    created: Slot<Result<Account, AccountError>>,
    lookup: Slot<Result<Account, AccountError>>,
}

impl AccountWorld {
    fn setup(&self, policy: IdentifierPolicy) {
        let runtime = Runtime::new().expect("create runtime");
        let service = AccountService::new(Arc::new(InMemoryAccountRepository::new()), policy);
        self.runtime.set(RuntimeHandle(Arc::new(runtime)));
        self.service.set(service);
    }

    fn execute<T>(&self, operation: impl FnOnce(&Runtime, &Service) -> T) -> T {
        let runtime_handle = self.runtime.get().expect("runtime");
        let service = self.service.get().expect("service");
        operation(&runtime_handle.0, &service)
    }

    fn create(&self, email: &Email) -> Result<Account, AccountError> {
        self.execute(|runtime, service| {
            runtime.block_on(async {
                service
                    .create_account(email, None, FlagOverrides::default())
                    .await
            })
        })
    }

    fn find(&self, email: &Email) -> Result<Account, AccountError> {
        self.execute(|runtime, service| runtime.block_on(async { service.get_account(email).await }))
    }

    fn created_account(&self) -> Account {
        match self.created.get().expect("creation attempted") {
            Ok(account) => account,
            Err(err) => panic!("expected an account, got error: {err}"),
        }
    }

    fn creation_error(&self) -> AccountError {
        match self.created.get().expect("creation attempted") {
            Ok(account) => panic!("expected an error, got account {account}"),
            Err(err) => err,
        }
    }
}

#[fixture]
fn world() -> AccountWorld {
    AccountWorld::default()
}

// -----------------------------------------------------------------------------
// Given Steps
// -----------------------------------------------------------------------------

#[given("a strict account store")]
fn a_strict_account_store(world: &AccountWorld) {
    world.setup(IdentifierPolicy::strict());
}

#[given("a permissive account store")]
fn a_permissive_account_store(world: &AccountWorld) {
    world.setup(IdentifierPolicy::allowing_empty());
}

#[given("an account exists for {email}")]
fn an_account_exists_for(world: &AccountWorld, email: String) {
    world
        .create(&Email::new(email))
        .expect("seed account should be created");
}

// -----------------------------------------------------------------------------
// When Steps
// -----------------------------------------------------------------------------

#[when("an account is created for {email}")]
fn an_account_is_created_for(world: &AccountWorld, email: String) {
    world.created.set(world.create(&Email::new(email)));
}

#[when("an account is created without an email")]
fn an_account_is_created_without_an_email(world: &AccountWorld) {
    world.created.set(world.create(&Email::empty()));
}

#[when("the account for {email} is looked up")]
fn the_account_is_looked_up(world: &AccountWorld, email: String) {
    world.lookup.set(world.find(&Email::new(email)));
}

#[when("an empty email is looked up")]
fn the_account_for_an_empty_email_is_looked_up(world: &AccountWorld) {
    world.lookup.set(world.find(&Email::empty()));
}

// -----------------------------------------------------------------------------
// Then Steps
// -----------------------------------------------------------------------------

#[then("the account identifier is {identifier}")]
fn the_account_identifier_is(world: &AccountWorld, identifier: String) {
    assert_eq!(world.created_account().identifier().as_str(), identifier);
}

#[then("the lookup finds the account for {email}")]
fn the_lookup_finds_the_account(world: &AccountWorld, email: String) {
    match world.lookup.get().expect("lookup attempted") {
        Ok(account) => assert_eq!(account.email().as_str(), email),
        Err(err) => panic!("expected an account, got error: {err}"),
    }
}

#[then("creation fails because the account email is not unique")]
fn creation_fails_as_duplicate(world: &AccountWorld) {
    assert_eq!(
        world.creation_error(),
        AccountError::DuplicateIdentifier(DuplicateSubject::Email)
    );
}

#[then("creation fails because the account email is empty")]
fn creation_fails_as_empty(world: &AccountWorld) {
    assert_eq!(world.creation_error(), AccountError::EmptyIdentifier);
}

#[then("the lookup is ambiguous")]
fn the_lookup_is_ambiguous(world: &AccountWorld) {
    let result = world.lookup.get().expect("lookup attempted");
    assert!(
        matches!(result, Err(AccountError::AmbiguousLookup)),
        "expected an ambiguous lookup, got {result:?}"
    );
}

// -----------------------------------------------------------------------------
// Scenario Bindings
// -----------------------------------------------------------------------------

#[scenario(
    path = "tests/features/account_identifiers.feature",
    name = "Emails map to fixed-width identifiers"
)]
fn emails_map_to_fixed_width_identifiers(world: AccountWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/account_identifiers.feature",
    name = "Lookup ignores email case"
)]
fn lookup_ignores_email_case(world: AccountWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/account_identifiers.feature",
    name = "Emails differing only in case are duplicates"
)]
fn emails_differing_only_in_case_are_duplicates(world: AccountWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/account_identifiers.feature",
    name = "Accounts without an email are rejected by default"
)]
fn accounts_without_an_email_are_rejected_by_default(world: AccountWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/account_identifiers.feature",
    name = "Accounts without an email get placeholders when allowed"
)]
fn accounts_without_an_email_get_placeholders(world: AccountWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/account_identifiers.feature",
    name = "Looking up an empty email is ambiguous when allowed"
)]
fn looking_up_an_empty_email_is_ambiguous(world: AccountWorld) {
    let _ = world;
}
