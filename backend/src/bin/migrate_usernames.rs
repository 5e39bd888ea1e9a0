//! Convert every stored account to its email-derived identifier.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::ffi::OsString;
use std::io;
use std::sync::Arc;

use clap::Parser;
use emailusernames::domain::{AccountService, IdentifierMigration};
use emailusernames::outbound::persistence::{DbPool, DieselAccountRepository, PoolConfig};
use emailusernames::settings::IdentifierSettings;
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

const PROGRAM_NAME: &str = "migrate-usernames";

/// `migrate-usernames` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "migrate-usernames",
    about = "Replace stored account identifiers with identifiers derived from emails",
    version
)]
struct CliArgs {
    /// Suppress progress output.
    #[arg(long)]
    quiet: bool,
    /// Database connection URL. Falls back to `EMAILUSERNAMES_DATABASE_URL`,
    /// then `DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

fn main() -> io::Result<()> {
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = IdentifierSettings::load_from_iter([OsString::from(PROGRAM_NAME)])
        .map_err(|error| io::Error::other(format!("load settings: {error}")))?;
    let policy = settings.policy().map_err(|error| {
        io::Error::new(io::ErrorKind::InvalidInput, format!("invalid settings: {error}"))
    })?;

    let database_url = resolve_database_url(args.database_url.or(settings.database_url))?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(|error| io::Error::other(format!("create database pool: {error}")))?;

    let service = AccountService::new(Arc::new(DieselAccountRepository::new(pool)), policy);
    IdentifierMigration::new(service)
        .run(None, args.quiet)
        .await
        .map_err(|error| io::Error::other(error.to_string()))?;

    Ok(())
}

fn resolve_database_url(explicit: Option<String>) -> io::Result<String> {
    if let Some(value) = explicit {
        if value.trim().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "--database-url must not be empty when provided",
            ));
        }
        return Ok(value);
    }

    let from_env = env::var("DATABASE_URL").map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "database URL missing: set --database-url, EMAILUSERNAMES_DATABASE_URL or DATABASE_URL",
        )
    })?;
    if from_env.trim().is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "DATABASE_URL must not be empty",
        ));
    }
    Ok(from_env)
}

#[cfg(test)]
mod tests {
    //! Unit tests for CLI parsing helpers.

    use env_lock::lock_env;
    use rstest::rstest;

    use super::{CliArgs, Parser, resolve_database_url};

    #[rstest]
    fn flags_are_optional() {
        let args = CliArgs::try_parse_from(["migrate-usernames"]).expect("no flags needed");
        assert!(!args.quiet);
        assert!(args.database_url.is_none());
    }

    #[rstest]
    fn flags_are_parsed() {
        let args = CliArgs::try_parse_from([
            "migrate-usernames",
            "--quiet",
            "--database-url",
            "postgres://localhost/accounts",
        ])
        .expect("flags parse");
        assert!(args.quiet);
        assert_eq!(
            args.database_url.as_deref(),
            Some("postgres://localhost/accounts")
        );
    }

    #[rstest]
    fn resolve_database_url_prefers_explicit_value() {
        let _guard = lock_env([("DATABASE_URL", Some("postgres://env/db".to_owned()))]);
        let url = resolve_database_url(Some("postgres://flag/db".to_owned())).expect("explicit url");
        assert_eq!(url, "postgres://flag/db");
    }

    #[rstest]
    fn resolve_database_url_falls_back_to_environment() {
        let _guard = lock_env([("DATABASE_URL", Some("postgres://env/db".to_owned()))]);
        let url = resolve_database_url(None).expect("environment url");
        assert_eq!(url, "postgres://env/db");
    }

    #[rstest]
    fn resolve_database_url_requires_a_source() {
        let _guard = lock_env([("DATABASE_URL", None::<String>)]);
        let error = resolve_database_url(None).expect_err("missing url");
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
    }

    #[rstest]
    fn resolve_database_url_rejects_empty_explicit() {
        let error = resolve_database_url(Some("   ".to_owned())).expect_err("empty should fail");
        assert_eq!(error.kind(), std::io::ErrorKind::InvalidInput);
    }
}
