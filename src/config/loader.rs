//! Configuration loader.
//!
//! Loading pipeline:
//! 1. Read the file (UTF-8 BOM stripped, size limited)
//! 2. Environment variable expansion (pre-parse, on raw text)
//! 3. YAML parsing into [`EngineConfig`]
//! 4. Validation

use std::path::Path;

use crate::config::EngineConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

/// Largest configuration file accepted (1 MB).
pub const MAX_CONFIG_SIZE: u64 = 1024 * 1024;

// ============================================================================
// Public API
// ============================================================================

/// A non-fatal problem found while loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadWarning {
    /// Description of the problem.
    pub message: String,
    /// Where it was found (file or field path).
    pub location: Option<String>,
}

/// Result of a successful load.
#[derive(Debug)]
pub struct LoadResult {
    /// The validated configuration.
    pub config: EngineConfig,
    /// Warnings collected along the way.
    pub warnings: Vec<LoadWarning>,
}

/// Loads engine configuration files.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    validator: Validator,
}

impl ConfigLoader {
    /// Creates a loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads and validates the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file is missing, unreadable or too large
    /// - A required environment variable is unset
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load(&mut self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        if metadata.len() > MAX_CONFIG_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{} bytes", metadata.len()),
                expected: format!("at most {MAX_CONFIG_SIZE} bytes"),
            });
        }

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        self.load_str(&raw, path)
    }

    /// Loads and validates configuration text. `source` is used in messages.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the file-system failures.
    pub fn load_str(&mut self, raw: &str, source: &Path) -> Result<LoadResult, ConfigError> {
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(raw, source)?;
        let mut warnings = env_sub.warnings;

        let config: EngineConfig = if substituted.trim().is_empty() {
            warnings.push(LoadWarning {
                message: "configuration file is empty, using defaults".to_string(),
                location: Some(source.display().to_string()),
            });
            EngineConfig::default()
        } else {
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
                path: source.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?
        };

        let result = self.validator.validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: source.display().to_string(),
                errors: result.errors,
            });
        }
        warnings.extend(result.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        Ok(LoadResult { config, warnings })
    }
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Pre-parse environment variable substitution.
///
/// Runs on raw YAML text BEFORE parsing so substituted values keep YAML type
/// inference (`size: ${BOARD_SIZE}` still parses as a number).
struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Substitutes environment variables in raw YAML text.
    ///
    /// Supports:
    /// - `${VAR}` - expand to value (empty string if unset with warning)
    /// - `${VAR:-default}` - expand to default if unset
    /// - `${VAR:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw_yaml: &str, source_path: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(raw_yaml.len());
        let mut chars = raw_yaml.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let spec = parse_var_spec(&mut chars, source_path)?;
                    match std::env::var(&spec.name) {
                        Ok(value) => result.push_str(&value),
                        Err(_) => match spec.fallback {
                            Fallback::Default(default) => result.push_str(&default),
                            Fallback::Required(message) => {
                                return Err(ConfigError::EnvVarNotSet {
                                    var: spec.name,
                                    message,
                                });
                            }
                            Fallback::Empty => {
                                self.warnings.push(LoadWarning {
                                    message: format!(
                                        "Environment variable '{}' is not set, using empty string",
                                        spec.name
                                    ),
                                    location: Some(source_path.display().to_string()),
                                });
                            }
                        },
                    }
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }
}

/// What to do when a referenced variable is unset.
enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

struct VarSpec {
    name: String,
    fallback: Fallback,
}

/// Parses the inside of `${...}`; the opening brace is already consumed.
fn parse_var_spec(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    source_path: &Path,
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
            ':' if matches!(chars.peek(), Some('-' | '?')) => {
                let required = chars.next() == Some('?');
                let rest = read_until_close(chars, source_path)?;
                let fallback = if required {
                    Fallback::Required(rest)
                } else {
                    Fallback::Default(rest)
                };
                return Ok(VarSpec { name, fallback });
            }
            _ => name.push(c),
        }
    }

    Err(unclosed(source_path, &name))
}

/// Reads up to the matching `}`, allowing nested braces in defaults.
fn read_until_close(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    source_path: &Path,
) -> Result<String, ConfigError> {
    let mut value = String::new();
    let mut depth = 1;

    for c in chars.by_ref() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(value);
                }
            }
            _ => {}
        }
        value.push(c);
    }

    Err(unclosed(source_path, &value))
}

fn unclosed(source_path: &Path, fragment: &str) -> ConfigError {
    ConfigError::ParseError {
        path: source_path.to_path_buf(),
        line: None,
        message: format!("Unclosed environment variable reference near '{fragment}'"),
    }
}

// ============================================================================
// Tests
// ============================================================================
