use std::env;
use std::path::PathBuf;

use crate::error::{EtlError, Result};
use crate::types::NullPolicy;

/// Connection parameters for the relational sink.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// `libsql://` and `http(s)://` URLs connect remotely; anything else is
    /// treated as a local database file path.
    pub url: String,
    pub auth_token: Option<String>,
}

/// Everything the pipeline needs, resolved up front. Components never read
/// process state themselves.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub raw_data_root: PathBuf,
    pub clean_data_root: PathBuf,
    pub null_policy: NullPolicy,
    pub database: DatabaseConfig,
}

/// Optional settings that take precedence over the environment, typically
/// coming from command-line flags.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub auth_token: Option<String>,
    pub raw_data_root: Option<PathBuf>,
    pub clean_data_root: Option<PathBuf>,
    pub null_policy: Option<NullPolicy>,
}

impl EtlConfig {
    /// Resolves the full configuration: overrides first, then the
    /// environment (`DATABASE_URL`, `DATABASE_AUTH_TOKEN`, `RAW_DATA_ROOT`,
    /// `CLEAN_DATA_ROOT`), then defaults. A database URL from neither
    /// source is a configuration error.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let url = overrides
            .database_url
            .or_else(|| env::var("DATABASE_URL").ok())
            .ok_or_else(|| {
                EtlError::Config(
                    "database URL not set; pass --database-url or set DATABASE_URL".to_string(),
                )
            })?;
        let auth_token = overrides
            .auth_token
            .or_else(|| env::var("DATABASE_AUTH_TOKEN").ok());
        let raw_data_root = overrides
            .raw_data_root
            .or_else(|| env::var("RAW_DATA_ROOT").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("dataset/raw"));
        let clean_data_root = overrides
            .clean_data_root
            .or_else(|| env::var("CLEAN_DATA_ROOT").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("dataset/clean"));

        Ok(Self {
            raw_data_root,
            clean_data_root,
            null_policy: overrides.null_policy.unwrap_or_default(),
            database: DatabaseConfig { url, auth_token },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_win_without_touching_the_environment() {
        let config = EtlConfig::resolve(ConfigOverrides {
            database_url: Some("warehouse.db".to_string()),
            auth_token: Some("token".to_string()),
            raw_data_root: Some(PathBuf::from("in")),
            clean_data_root: Some(PathBuf::from("out")),
            null_policy: Some(NullPolicy::ZeroFill),
        })
        .unwrap();
        assert_eq!(config.database.url, "warehouse.db");
        assert_eq!(config.database.auth_token.as_deref(), Some("token"));
        assert_eq!(config.raw_data_root, PathBuf::from("in"));
        assert_eq!(config.clean_data_root, PathBuf::from("out"));
        assert_eq!(config.null_policy, NullPolicy::ZeroFill);
    }

    #[test]
    fn policy_defaults_to_null_preserving() {
        let config = EtlConfig::resolve(ConfigOverrides {
            database_url: Some("warehouse.db".to_string()),
            ..ConfigOverrides::default()
        })
        .unwrap();
        assert_eq!(config.null_policy, NullPolicy::NullPreserving);
    }
}
