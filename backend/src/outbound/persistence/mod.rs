//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Implements the account repository port over the `accounts` table with
//! async support through `diesel-async` and `bb8` connection pooling.
//!
//! - **Thin adapter**: the repository only translates between Diesel rows and
//!   domain types. Identifier derivation stays in the domain.
//! - **Internal models**: row structs (`models.rs`) and the table definition
//!   (`schema.rs`) are never exposed to the domain.
//! - **Strongly typed errors**: all database errors are mapped to
//!   `AccountPersistenceError`.
//!
//! # Example
//!
//! ```no_run
//! use emailusernames::outbound::persistence::{DbPool, DieselAccountRepository, PoolConfig};
//!
//! # async fn connect() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/accounts")).await?;
//! let repository = DieselAccountRepository::new(pool);
//! # drop(repository);
//! # Ok(())
//! # }
//! ```

mod diesel_account_repository;
mod diesel_helpers;
mod models;
mod password_hashing;
mod pool;
mod schema;

pub use diesel_account_repository::DieselAccountRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
