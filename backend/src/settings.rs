//! Identifier configuration loaded via OrthoConfig.
//!
//! Values come from `EMAILUSERNAMES_*` environment variables, configuration
//! files and command-line flags. [`IdentifierSettings::policy`] turns them
//! into the [`IdentifierPolicy`] handed to the account service.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_EMPTY_PREFIX, IdentifierPolicy, PolicyError};

/// Configuration values controlling identifier derivation.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EMAILUSERNAMES")]
pub struct IdentifierSettings {
    /// Allow accounts without an email address.
    #[ortho_config(default = false)]
    pub allow_empty: bool,
    /// Reserved prefix for placeholder identifiers.
    pub empty_prefix: Option<String>,
    /// Database connection URL for the migration command.
    pub database_url: Option<String>,
}

impl IdentifierSettings {
    /// Return the configured placeholder prefix, falling back to the default.
    pub fn empty_prefix(&self) -> &str {
        self.empty_prefix.as_deref().unwrap_or(DEFAULT_EMPTY_PREFIX)
    }

    /// Build the identifier policy described by these settings.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] when the placeholder prefix is empty or too
    /// long to leave room for an account key.
    pub fn policy(&self) -> Result<IdentifierPolicy, PolicyError> {
        IdentifierPolicy::new(self.allow_empty, self.empty_prefix())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for identifier configuration parsing.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const ALLOW_EMPTY: &str = "EMAILUSERNAMES_ALLOW_EMPTY";
    const EMPTY_PREFIX: &str = "EMAILUSERNAMES_EMPTY_PREFIX";
    const DATABASE_URL: &str = "EMAILUSERNAMES_DATABASE_URL";

    fn load_from_empty_args() -> IdentifierSettings {
        IdentifierSettings::load_from_iter([OsString::from("migrate-usernames")])
            .expect("config should load")
    }

    #[rstest]
    fn default_values_are_used_when_missing() {
        let _guard = lock_env([
            (ALLOW_EMPTY, None::<String>),
            (EMPTY_PREFIX, None::<String>),
            (DATABASE_URL, None::<String>),
        ]);

        let settings = load_from_empty_args();
        assert!(!settings.allow_empty);
        assert_eq!(settings.empty_prefix(), DEFAULT_EMPTY_PREFIX);
        assert!(settings.database_url.is_none());
        assert_eq!(
            settings.policy().expect("default policy"),
            IdentifierPolicy::strict()
        );
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            (ALLOW_EMPTY, Some("true".to_owned())),
            (EMPTY_PREFIX, Some("anon:".to_owned())),
            (DATABASE_URL, Some("postgres://localhost/accounts".to_owned())),
        ]);

        let settings = load_from_empty_args();
        let policy = settings.policy().expect("valid policy");
        assert!(policy.allows_empty());
        assert_eq!(policy.empty_prefix(), "anon:");
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/accounts")
        );
    }

    #[rstest]
    #[case("", PolicyError::EmptyPrefix)]
    #[case(
        "prefix-too-long",
        PolicyError::PrefixTooLong { max: 10, actual: 15 }
    )]
    fn invalid_prefixes_are_rejected(#[case] prefix: &str, #[case] expected: PolicyError) {
        let settings = IdentifierSettings {
            allow_empty: true,
            empty_prefix: Some(prefix.to_owned()),
            database_url: None,
        };

        assert_eq!(settings.policy().expect_err("invalid prefix"), expected);
    }
}
