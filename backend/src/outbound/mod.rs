//! Outbound adapters implementing domain ports.
//!
//! - **persistence**: PostgreSQL-backed account repository using Diesel ORM
//! - **memory**: in-process account repository for tests and fixtures
//!
//! Adapters are thin translators between domain types and storage
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
