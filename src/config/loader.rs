//! Configuration loader
//!
//! Loading pipeline:
//! 1. Size check and read
//! 2. Environment variable expansion (on raw text, before parsing)
//! 3. YAML parsing into [`AppConfig`]
//! 4. Validation (all issues collected; warnings are returned, errors fail)

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::schema::AppConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

/// Default upper bound on configuration file size.
pub const DEFAULT_MAX_CONFIG_SIZE: u64 = 1024 * 1024;

/// Non-fatal finding made while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// What was found
    pub message: String,
    /// Where it was found
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A loaded, validated configuration.
#[derive(Debug, Clone)]
pub struct LoadResult {
    /// The configuration
    pub config: AppConfig,
    /// Warnings from expansion and validation
    pub warnings: Vec<LoadWarning>,
    /// File it came from, if any
    pub source: Option<PathBuf>,
}

/// Loads configuration files.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    max_size: u64,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self {
            max_size: env_or("STUDYHELPER_MAX_CONFIG_SIZE", DEFAULT_MAX_CONFIG_SIZE),
        }
    }
}

impl ConfigLoader {
    /// Loader with an explicit size limit.
    #[must_use]
    pub const fn with_max_size(max_size: u64) -> Self {
        Self { max_size }
    }

    /// Loads `path`, or returns validated defaults when `path` is `None`.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn load_optional(&self, path: Option<&Path>) -> Result<LoadResult, ConfigError> {
        match path {
            Some(path) => self.load(path),
            None => {
                debug!("no configuration file; using defaults");
                Ok(LoadResult {
                    config: AppConfig::default(),
                    warnings: Vec::new(),
                    source: None,
                })
            }
        }
    }

    /// Loads and validates the configuration file at `path`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::MissingFile` if the file cannot be read
    /// - `ConfigError::TooLarge` above the size limit
    /// - `ConfigError::EnvVarNotSet` for `${VAR:?message}` with `VAR` unset
    /// - `ConfigError::ParseError` for invalid YAML or field values
    /// - `ConfigError::ValidationError` if validation finds errors
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        if metadata.len() > self.max_size {
            return Err(ConfigError::TooLarge {
                path: path.to_path_buf(),
                size: metadata.len(),
                limit: self.max_size,
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

        let mut result = self.load_str(raw, path)?;
        result.source = Some(path.to_path_buf());
        Ok(result)
    }

    /// Loads configuration from text; `path` is used in messages only.
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load), minus the file errors.
    pub fn load_str(&self, raw: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        let mut env = EnvSubstitution::new();
        let expanded = env.substitute(raw, path)?;
        let mut warnings = env.warnings;

        let config: AppConfig = if expanded.trim().is_empty() {
            AppConfig::default()
        } else {
            serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };

        let validation = Validator::new().validate(&config);
        if validation.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: validation.errors,
            });
        }
        for issue in validation.warnings {
            warnings.push(LoadWarning {
                message: issue.message,
                location: Some(issue.path),
            });
        }

        Ok(LoadResult {
            config,
            warnings,
            source: None,
        })
    }
}

// ============================================================================
// Environment Substitution
// ============================================================================

struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Expands environment references in raw YAML text.
    ///
    /// - `${VAR}`: value, or empty with a warning when unset
    /// - `${VAR:-default}`: value, or `default` when unset
    /// - `${VAR:?message}`: value, or an error when unset
    /// - `$$`: a literal `$`
    fn substitute(&mut self, raw: &str, path: &Path) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(raw.len());
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    out.push('$');
                }
                Some('{') => {
                    chars.next();
                    let spec = Self::parse_spec(&mut chars, path)?;
                    match std::env::var(&spec.name) {
                        Ok(value) => out.push_str(&value),
                        Err(_) => match spec.fallback {
                            Fallback::Default(value) => out.push_str(&value),
                            Fallback::Required(message) => {
                                warn!(var = %spec.name, %message, "required environment variable not set");
                                return Err(ConfigError::EnvVarNotSet {
                                    var: spec.name,
                                    path: path.to_path_buf(),
                                });
                            }
                            Fallback::Empty => self.warnings.push(LoadWarning {
                                message: format!(
                                    "environment variable '{}' is not set, using empty string",
                                    spec.name
                                ),
                                location: Some(path.display().to_string()),
                            }),
                        },
                    }
                }
                _ => out.push(c),
            }
        }
        Ok(out)
    }

    fn parse_spec(
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        path: &Path,
    ) -> Result<VarSpec, ConfigError> {
        let mut name = String::new();
        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    return Ok(VarSpec {
                        name,
                        fallback: Fallback::Empty,
                    });
                }
                ':' if chars.peek() == Some(&'-') => {
                    chars.next();
                    let value = Self::read_until_close(chars, &name, path)?;
                    return Ok(VarSpec {
                        name,
                        fallback: Fallback::Default(value),
                    });
                }
                ':' if chars.peek() == Some(&'?') => {
                    chars.next();
                    let message = Self::read_until_close(chars, &name, path)?;
                    return Ok(VarSpec {
                        name,
                        fallback: Fallback::Required(message),
                    });
                }
                c => name.push(c),
            }
        }
        Err(unclosed(&name, path))
    }

    fn read_until_close(
        chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
        name: &str,
        path: &Path,
    ) -> Result<String, ConfigError> {
        let mut value = String::new();
        for c in chars.by_ref() {
            if c == '}' {
                return Ok(value);
            }
            value.push(c);
        }
        Err(unclosed(name, path))
    }
}

struct VarSpec {
    name: String,
    fallback: Fallback,
}

enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

fn unclosed(name: &str, path: &Path) -> ConfigError {
    ConfigError::ParseError {
        path: path.to_path_buf(),
        line: None,
        message: format!("unclosed environment variable reference: ${{{name}"),
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn load(raw: &str) -> Result<LoadResult, ConfigError> {
        ConfigLoader::default().load_str(raw, Path::new("test.yaml"))
    }

    #[test]
    fn empty_text_gives_defaults() {
        let result = load("").unwrap();
        assert_eq!(result.config, AppConfig::default());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn expands_environment_references() {
        let path = std::env::var("PATH").unwrap_or_default();
        let result = load(
            "data:\n  practice: \"${PATH}\"\n  theory: ${STUDYHELPER_TEST_UNSET_THEORY:-none.json}\n",
        )
        .unwrap();
        assert_eq!(result.config.data.practice, path);
        assert_eq!(result.config.data.theory.as_deref(), Some("none.json"));
    }

    #[test]
    fn unset_variable_without_default_warns() {
        let result = load("completion:\n  practice_page: \"x${STUDYHELPER_TEST_NEVER_SET}\"\n").unwrap();
        assert_eq!(result.config.completion.practice_page, "x");
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn required_variable_fails_when_unset() {
        let err = load("data:\n  practice: ${STUDYHELPER_TEST_REQUIRED_UNSET:?set me}\n").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotSet { ref var, .. } if var == "STUDYHELPER_TEST_REQUIRED_UNSET"));
    }

    #[test]
    fn escaped_dollar_and_unclosed_reference() {
        let result = load("completion:\n  game_page: \"game$$.html\"\n").unwrap();
        assert_eq!(result.config.completion.game_page, "game$.html");
        assert!(matches!(load("data:\n  practice: ${OOPS\n"), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn validation_errors_fail_the_load() {
        let err = load("timing:\n  warn_at: 5\n  critical_at: 9\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn parse_error_carries_line() {
        let err = load("timing:\n  warn_at: [oops\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { line: Some(_), .. }));
    }

    #[test]
    fn loads_file_and_enforces_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timing:\n  boss_countdown: 30s").unwrap();
        let result = ConfigLoader::default().load(file.path()).unwrap();
        assert_eq!(result.config.timing.boss_countdown, Duration::from_secs(30));
        assert_eq!(result.source.as_deref(), Some(file.path()));

        let err = ConfigLoader::with_max_size(4).load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { limit: 4, .. }));
    }

    #[test]
    fn missing_file() {
        let err = ConfigLoader::default()
            .load(Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }
}
