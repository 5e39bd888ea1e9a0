//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Ports describe how the domain expects to talk to driven adapters. Each
//! trait exposes strongly typed errors so adapters map their failures into
//! predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod account_repository;

#[cfg(test)]
pub use account_repository::MockAccountRepository;
pub use account_repository::{AccountPersistenceError, AccountRepository, IDENTIFIER_FIELD};
