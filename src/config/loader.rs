//! Configuration loading from disk and the environment.
//!
//! Layering order, later wins:
//! 1. built-in defaults
//! 2. base TOML file (must contain the `base_urls` section)
//! 3. optional overlay file, deep-merged table by table
//! 4. environment overrides (`APP_ENVIRONMENT`, `APP_BIND_ADDRESS`, `SEQ_SERVER_URL`)

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use toml::{Table, Value};

use crate::config::schema::{AppConfig, Environment};
use crate::config::validation::{validate_config, ValidationError};

/// Section a base configuration file must define.
pub const REQUIRED_SECTION: &str = "base_urls";

pub const ENV_ENVIRONMENT: &str = "APP_ENVIRONMENT";
pub const ENV_BIND_ADDRESS: &str = "APP_BIND_ADDRESS";
pub const ENV_SEQ_SERVER_URL: &str = "SEQ_SERVER_URL";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("configuration does not match the schema: {0}")]
    Schema(#[source] toml::de::Error),

    #[error("required configuration section '{0}' is missing")]
    MissingSection(&'static str),

    #[error("invalid value for {key}: {message}")]
    InvalidOverride { key: &'static str, message: String },

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where the configuration bundle comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Layered files plus process environment.
    Files {
        base: Option<PathBuf>,
        overlay: Option<PathBuf>,
    },
    /// An already-built bundle; still validated.
    Inline(AppConfig),
}

impl ConfigSource {
    pub fn files(base: Option<PathBuf>, overlay: Option<PathBuf>) -> Self {
        ConfigSource::Files { base, overlay }
    }

    /// Resolve the source into a validated configuration.
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        match self {
            ConfigSource::Files { base, overlay } => load_layered(
                base.as_deref(),
                overlay.as_deref(),
                |key| std::env::var(key).ok(),
            ),
            ConfigSource::Inline(config) => {
                validate_config(config).map_err(ConfigError::Validation)?;
                Ok(config.clone())
            }
        }
    }
}

/// Load and validate configuration from a single TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    load_layered(Some(path), None, |_| None)
}

/// Load defaults, base file, overlay and environment overrides, then validate.
pub fn load_layered<F>(
    base: Option<&Path>,
    overlay: Option<&Path>,
    env: F,
) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut table = Table::new();

    if let Some(path) = base {
        table = read_table(path)?;
        if !table.contains_key(REQUIRED_SECTION) {
            return Err(ConfigError::MissingSection(REQUIRED_SECTION));
        }
    }

    if let Some(path) = overlay {
        if path.exists() {
            merge_tables(&mut table, read_table(path)?);
            tracing::debug!(path = %path.display(), "Configuration overlay applied");
        } else {
            tracing::debug!(path = %path.display(), "Configuration overlay not found, skipping");
        }
    }

    let mut config: AppConfig = Value::Table(table)
        .try_into()
        .map_err(ConfigError::Schema)?;

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn read_table(path: &Path) -> Result<Table, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    content.parse::<Table>().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Recursively merge `overlay` into `base`. Tables merge, everything else replaces.
fn merge_tables(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn apply_env_overrides<F>(config: &mut AppConfig, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env(ENV_ENVIRONMENT) {
        config.environment = value
            .parse::<Environment>()
            .map_err(|message| ConfigError::InvalidOverride {
                key: ENV_ENVIRONMENT,
                message,
            })?;
    }
    if let Some(value) = env(ENV_BIND_ADDRESS) {
        config.listener.bind_address = value;
    }
    if let Some(value) = env(ENV_SEQ_SERVER_URL) {
        config.telemetry.seq_server_url = value;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn write_temp(name: &str, content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("public-api-config-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_no_files_yields_defaults() {
        let config = load_layered(None, None, |_| None).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:5099");
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_base_file_requires_base_urls() {
        let path = write_temp("appsettings.toml", "environment = \"Development\"\n");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSection("base_urls")));
    }

    #[test]
    fn test_overlay_merges_nested_tables() {
        let base = write_temp(
            "appsettings.toml",
            r#"
            [base_urls]
            api_base = "http://api.local/api/"
            web_base = "http://web.local/"

            [listener]
            bind_address = "127.0.0.1:7000"
            "#,
        );
        let overlay = write_temp(
            "appsettings.test.toml",
            r#"
            [base_urls]
            web_base = "http://test.local/"
            "#,
        );

        let config = load_layered(Some(&base), Some(&overlay), |_| None).unwrap();
        assert_eq!(config.base_urls.api_base, "http://api.local/api/");
        assert_eq!(config.base_urls.web_base, "http://test.local/");
        assert_eq!(config.listener.bind_address, "127.0.0.1:7000");
    }

    #[test]
    fn test_missing_overlay_is_ignored() {
        let missing = std::env::temp_dir().join("does-not-exist.test.toml");
        assert!(load_layered(None, Some(&missing), |_| None).is_ok());
    }

    #[test]
    fn test_env_overrides_win() {
        let vars: HashMap<&str, &str> = HashMap::from([
            (ENV_ENVIRONMENT, "Development"),
            (ENV_SEQ_SERVER_URL, "http://seq:5341"),
        ]);
        let config =
            load_layered(None, None, |key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert!(config.environment.is_development());
        assert_eq!(config.telemetry.seq_server_url, "http://seq:5341");
    }

    #[test]
    fn test_invalid_environment_override() {
        let err = load_layered(None, None, |key| {
            (key == ENV_ENVIRONMENT).then(|| "qa".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { key: ENV_ENVIRONMENT, .. }));
    }

    #[test]
    fn test_validation_errors_surface() {
        let path = write_temp(
            "appsettings.toml",
            r#"
            [base_urls]
            web_base = "nope"
            "#,
        );
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }
}
