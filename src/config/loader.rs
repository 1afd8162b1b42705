//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => write!(f, "Invalid value for {}: {:?}", var, value),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: the TOML file if given (defaults otherwise), then
/// process environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut config, std::env::vars())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the deployment variables:
/// `PORT`, `BACKEND_HOST`, `BACKEND_PORT`, `BACKEND_USERNAME`, `BACKEND_PASSWD`, `BACKEND_DEST`.
pub fn apply_env_overrides<I>(config: &mut AppConfig, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        match key.as_str() {
            "PORT" => {
                let port = parse_port("PORT", &value)?;
                let host = config
                    .http
                    .bind_address
                    .rsplit_once(':')
                    .map(|(host, _)| host.to_string())
                    .unwrap_or_else(|| "0.0.0.0".to_string());
                config.http.bind_address = format!("{}:{}", host, port);
            }
            "BACKEND_HOST" => config.backend.host = value,
            "BACKEND_PORT" => config.backend.port = parse_port("BACKEND_PORT", &value)?,
            "BACKEND_USERNAME" => config.backend.username = non_empty(value),
            "BACKEND_PASSWD" => config.backend.password = non_empty(value),
            "BACKEND_DEST" => config.storage.dest = value.into(),
            _ => continue,
        }
        tracing::debug!(var = %key, "Applied environment override");
    }
    Ok(())
}

/// An empty variable counts as unset.
fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn parse_port(var: &'static str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            vars(&[
                ("PORT", "9000"),
                ("BACKEND_HOST", "db.internal"),
                ("BACKEND_PORT", "4000"),
                ("BACKEND_USERNAME", "alice"),
                ("BACKEND_PASSWD", "secret"),
                ("BACKEND_DEST", "/var/lib/level-time"),
                ("HOME", "/root"),
            ]),
        )
        .unwrap();

        assert_eq!(config.http.bind_address, "0.0.0.0:9000");
        assert_eq!(config.backend.address(), "db.internal:4000");
        assert!(config.backend.credentials().is_some());
        assert_eq!(config.storage.dest, std::path::PathBuf::from("/var/lib/level-time"));
    }

    #[test]
    fn empty_credentials_are_unset() {
        let mut config = AppConfig::default();
        apply_env_overrides(
            &mut config,
            vars(&[("BACKEND_USERNAME", ""), ("BACKEND_PASSWD", "")]),
        )
        .unwrap();

        assert_eq!(config.backend.username, None);
        assert_eq!(config.backend.password, None);
        assert!(config.backend.credentials().is_none());
    }

    #[test]
    fn bad_port_is_reported() {
        let mut config = AppConfig::default();
        let err = apply_env_overrides(&mut config, vars(&[("BACKEND_PORT", "http")])).unwrap_err();
        assert!(matches!(err, ConfigError::Env { var: "BACKEND_PORT", .. }));
    }

    #[test]
    fn loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http]\nbind_address = \"127.0.0.1:8181\"").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        // PORT in the test environment would override this
        if std::env::var("PORT").is_err() {
            assert_eq!(config.http.bind_address, "127.0.0.1:8181");
        }
    }

    #[test]
    fn invalid_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[http\nbind_address = ").unwrap();
        assert!(matches!(load_config(Some(file.path())), Err(ConfigError::Parse(_))));
    }
}
