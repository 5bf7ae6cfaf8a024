//! Connection profiles for Snowflake.
//!
//! Profiles live in a `connections.toml` file, one table per named
//! connection, in the same place the Snowflake CLI looks for them:
//! `$SNOWFLAKE_HOME/connections.toml`, else `~/.snowflake/connections.toml`.
//!
//! ```toml
//! [hybrid_table_poc]
//! account = "myorg-myaccount"
//! user = "BENCH_USER"
//! token = "<programmatic access token>"
//! warehouse = "COMPUTE_WH"
//! ```

use crate::error::SnowflakeError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONNECTION_NAME: &str = "hybrid_table_poc";
pub const DEFAULT_DATABASE: &str = "HYBRID_TABLE_POC";
pub const DEFAULT_SCHEMA: &str = "PUBLIC";
pub const DEFAULT_TOKEN_TYPE: &str = "PROGRAMMATIC_ACCESS_TOKEN";

/// Overrides the profile's token when set.
pub const TOKEN_ENV_VAR: &str = "SNOWFLAKE_TOKEN";

/// One named table of `connections.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConnectionProfile {
    pub account: Option<String>,
    pub user: Option<String>,
    /// Explicit API host; defaults to `<account>.snowflakecomputing.com`.
    pub host: Option<String>,
    pub token: Option<String>,
    pub token_file_path: Option<PathBuf>,
    /// `PROGRAMMATIC_ACCESS_TOKEN`, `OAUTH` or `KEYPAIR_JWT`.
    pub token_type: Option<String>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
}

/// Which profile to load and what to override on top of it.
#[derive(Debug, Clone)]
pub struct SnowflakeSettings {
    pub connection_name: String,
    /// Explicit `connections.toml`; the standard locations are searched when unset.
    pub config_path: Option<PathBuf>,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
}

impl Default for SnowflakeSettings {
    fn default() -> Self {
        Self {
            connection_name: DEFAULT_CONNECTION_NAME.to_string(),
            config_path: None,
            warehouse: None,
            database: None,
            schema: None,
        }
    }
}

/// Fully resolved connection parameters.
#[derive(Clone)]
pub struct SnowflakeConnection {
    pub account: String,
    pub user: Option<String>,
    pub base_url: String,
    pub token: String,
    pub token_type: String,
    pub warehouse: Option<String>,
    pub database: String,
    pub schema: String,
    pub role: Option<String>,
}

impl std::fmt::Debug for SnowflakeConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnowflakeConnection")
            .field("account", &self.account)
            .field("user", &self.user)
            .field("base_url", &self.base_url)
            .field("token", &"***")
            .field("token_type", &self.token_type)
            .field("warehouse", &self.warehouse)
            .field("database", &self.database)
            .field("schema", &self.schema)
            .field("role", &self.role)
            .finish()
    }
}

impl SnowflakeSettings {
    /// Standard location of `connections.toml`.
    pub fn default_config_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("SNOWFLAKE_HOME") {
            return Some(PathBuf::from(home).join("connections.toml"));
        }
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join(".snowflake").join("connections.toml"))
    }

    /// Read the connections file and resolve the named profile.
    pub fn resolve(&self) -> Result<SnowflakeConnection, SnowflakeError> {
        let path = match &self.config_path {
            Some(path) => path.clone(),
            None => Self::default_config_path().ok_or_else(|| {
                SnowflakeError::Config(
                    "cannot locate connections.toml (set SNOWFLAKE_HOME or HOME)".to_string(),
                )
            })?,
        };
        let contents = read_file(&path)?;
        let mut profile = self.profile_from_str(&contents)?;

        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            profile.token = Some(token);
        }
        if profile.token.is_none() {
            if let Some(token_path) = &profile.token_file_path {
                profile.token = Some(read_file(token_path)?.trim().to_string());
            }
        }
        self.apply(profile)
    }

    /// Pick this connection's profile out of a `connections.toml` document.
    ///
    /// Top-level keys that are not tables, such as `default_connection_name`,
    /// are ignored.
    pub fn profile_from_str(&self, contents: &str) -> Result<ConnectionProfile, SnowflakeError> {
        let mut document: toml::Table = contents.parse()?;
        match document.remove(&self.connection_name) {
            Some(value @ toml::Value::Table(_)) => Ok(value.try_into()?),
            Some(_) => Err(SnowflakeError::Config(format!(
                "connection '{}' in connections.toml is not a table",
                self.connection_name
            ))),
            None => Err(SnowflakeError::Config(format!(
                "connection '{}' not found in connections.toml",
                self.connection_name
            ))),
        }
    }

    /// Merge overrides and defaults into a profile.
    pub fn apply(&self, profile: ConnectionProfile) -> Result<SnowflakeConnection, SnowflakeError> {
        let account = profile.account.ok_or_else(|| {
            SnowflakeError::Config(format!(
                "connection '{}' has no account",
                self.connection_name
            ))
        })?;
        let token = profile.token.ok_or_else(|| {
            SnowflakeError::Config(format!(
                "connection '{}' has no token (set token, token_file_path or {})",
                self.connection_name, TOKEN_ENV_VAR
            ))
        })?;
        let base_url = match profile.host {
            Some(host) if host.starts_with("http://") || host.starts_with("https://") => host,
            Some(host) => format!("https://{host}"),
            None => format!("https://{account}.snowflakecomputing.com"),
        };

        Ok(SnowflakeConnection {
            account,
            user: profile.user,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            token_type: profile
                .token_type
                .unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_string()),
            warehouse: self.warehouse.clone().or(profile.warehouse),
            database: self
                .database
                .clone()
                .or(profile.database)
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
            schema: self
                .schema
                .clone()
                .or(profile.schema)
                .unwrap_or_else(|| DEFAULT_SCHEMA.to_string()),
            role: profile.role,
        })
    }
}

fn read_file(path: &Path) -> Result<String, SnowflakeError> {
    std::fs::read_to_string(path).map_err(|source| SnowflakeError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CONNECTIONS: &str = r#"
[hybrid_table_poc]
account = "myorg-acct"
user = "BENCH"
token = "pat-123"
warehouse = "PROFILE_WH"
database = "PROFILE_DB"

[other]
account = "other-acct"
host = "snowflake.local:8443"
token = "t"
token_type = "OAUTH"
"#;

    #[test]
    fn test_profile_defaults_and_overrides() {
        let settings = SnowflakeSettings {
            warehouse: Some("CLI_WH".to_string()),
            ..Default::default()
        };
        let profile = settings.profile_from_str(CONNECTIONS).unwrap();
        let conn = settings.apply(profile).unwrap();

        assert_eq!(conn.base_url, "https://myorg-acct.snowflakecomputing.com");
        assert_eq!(conn.warehouse.as_deref(), Some("CLI_WH"));
        assert_eq!(conn.database, "PROFILE_DB");
        assert_eq!(conn.schema, DEFAULT_SCHEMA);
        assert_eq!(conn.token_type, DEFAULT_TOKEN_TYPE);
    }

    #[test]
    fn test_explicit_host() {
        let settings = SnowflakeSettings {
            connection_name: "other".to_string(),
            ..Default::default()
        };
        let conn = settings
            .apply(settings.profile_from_str(CONNECTIONS).unwrap())
            .unwrap();
        assert_eq!(conn.base_url, "https://snowflake.local:8443");
        assert_eq!(conn.database, DEFAULT_DATABASE);
        assert_eq!(conn.token_type, "OAUTH");
    }

    #[test]
    fn test_missing_connection() {
        let settings = SnowflakeSettings {
            connection_name: "absent".to_string(),
            ..Default::default()
        };
        let err = settings.profile_from_str(CONNECTIONS).unwrap_err();
        assert!(err.to_string().contains("absent"));
    }

    #[test]
    fn test_default_connection_name_key_is_ignored() {
        let contents = format!("default_connection_name = \"other\"\n{CONNECTIONS}");
        let settings = SnowflakeSettings::default();
        let profile = settings.profile_from_str(&contents).unwrap();
        assert_eq!(profile.account.as_deref(), Some("myorg-acct"));

        let scalar = SnowflakeSettings {
            connection_name: "default_connection_name".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            scalar.profile_from_str(&contents),
            Err(SnowflakeError::Config(_))
        ));
    }

    #[test]
    fn test_missing_token() {
        let settings = SnowflakeSettings::default();
        let profile = ConnectionProfile {
            account: Some("acct".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            settings.apply(profile),
            Err(SnowflakeError::Config(_))
        ));
    }

    #[test]
    fn test_token_is_not_debug_printed() {
        let settings = SnowflakeSettings::default();
        let conn = settings
            .apply(settings.profile_from_str(CONNECTIONS).unwrap())
            .unwrap();
        assert!(!format!("{conn:?}").contains("pat-123"));
    }

    #[test]
    fn test_resolve_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CONNECTIONS.as_bytes()).unwrap();

        let settings = SnowflakeSettings {
            connection_name: "other".to_string(),
            config_path: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let conn = settings.resolve().unwrap();
        assert_eq!(conn.account, "other-acct");
    }
}
