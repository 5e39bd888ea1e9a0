//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate
//! with `diesel print-schema` after changing a migration.

diesel::table! {
    /// Account table keyed by a bounded-width unique identifier.
    accounts (id) {
        /// Surrogate key assigned by the database.
        id -> Int8,
        /// Login identifier; unique, at most 30 characters.
        identifier -> Varchar,
        /// Contact email; empty when none was given.
        email -> Varchar,
        /// Argon2 PHC string, or NULL for accounts without a usable password.
        password_hash -> Nullable<Text>,
        /// Whether the account may sign in.
        is_active -> Bool,
        /// Whether the account may use administrative tooling.
        is_staff -> Bool,
        /// Whether the account holds every permission.
        is_superuser -> Bool,
    }
}
