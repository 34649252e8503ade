//! Core configuration loaded from TOML.
//!
//! ```toml
//! [database]
//! path = "academia.db"
//! busy_timeout_ms = 5000
//! cache_size_kib = 16384
//! wal = true
//!
//! [logging]
//! level = "info"
//! dir = "/var/log/academia"
//!
//! [grading]
//! passing_grade = 4.0
//! ```
//!
//! Every key is optional; missing keys take the defaults shown above.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    /// Parsed but semantically unusable.
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config TOML: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub grading: GradingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub busy_timeout_ms: u64,
    pub cache_size_kib: u32,
    pub wal: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("academia.db"),
            busy_timeout_ms: 5_000,
            cache_size_kib: 16_384,
            wal: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    /// Absolute directory for rolling log files; `None` keeps file logging off.
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GradingConfig {
    /// Lowest final grade that passes a subject (inclusive).
    pub passing_grade: f64,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self { passing_grade: 4.0 }
    }
}

impl CoreConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".to_string()));
        }
        if self.database.cache_size_kib == 0 {
            return Err(ConfigError::Invalid(
                "database.cache_size_kib must be greater than zero".to_string(),
            ));
        }
        if let Some(dir) = &self.logging.dir {
            if !dir.is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "logging.dir must be absolute, got `{}`",
                    dir.display()
                )));
            }
        }
        let grade = self.grading.passing_grade;
        if !grade.is_finite() || grade < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "grading.passing_grade must be a non-negative number, got {grade}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig};
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.database.cache_size_kib, 16_384);
        assert!(config.database.wal);
        assert_eq!(config.grading.passing_grade, 4.0);
        assert!(config.logging.dir.is_none());
    }

    #[test]
    fn sections_override_defaults_independently() {
        let config = CoreConfig::from_toml_str(
            r#"
            [database]
            path = "/tmp/uni.db"
            wal = false

            [grading]
            passing_grade = 55.0
            "#,
        )
        .unwrap();
        assert_eq!(config.database.path, PathBuf::from("/tmp/uni.db"));
        assert!(!config.database.wal);
        assert_eq!(config.database.busy_timeout_ms, 5_000);
        assert_eq!(config.grading.passing_grade, 55.0);
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_toml_str("[logging]\ndir = \"logs\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = CoreConfig::from_toml_str("[database]\nfilename = \"x.db\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn negative_passing_grade_is_rejected() {
        let err = CoreConfig::from_toml_str("[grading]\npassing_grade = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}
