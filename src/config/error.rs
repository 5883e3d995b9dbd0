//! Error type for configuration loading and validation failures.

use serde_json::Value;

/// Configuration error.
///
/// Raised synchronously by validation and file handling; a configuration
/// value is never silently corrected.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// One or more required top-level sections are absent.
    MissingSections(Vec<String>),
    /// Required keys are absent from a section.
    MissingKeys { section: String, keys: Vec<String> },
    /// A section is present but is not a mapping.
    NotASection(String),
    /// A numeric parameter lies outside its valid range.
    OutOfRange { parameter: String, value: Value, min: f64, max: f64 },
    /// Polarization is neither 1 (horizontal) nor 2 (vertical).
    InvalidPolarization(Value),
    /// A parameter has the wrong type (e.g. a string where a number is expected).
    InvalidType { parameter: String, value: Value, expected: &'static str },
    /// Config file does not exist.
    NotFound(String),
    /// Config file extension is not one of the supported encodings.
    UnsupportedFormat(String),
    /// Failed to read or write the config file.
    Io(String),
    /// Failed to parse or serialize the config file contents.
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingSections(sections) => {
                write!(f, "Invalid configuration: missing CONFIG sections: {}", sections.join(", "))
            }
            ConfigError::MissingKeys { section, keys } => {
                write!(f, "Invalid configuration: missing {} keys: {}", section, keys.join(", "))
            }
            ConfigError::NotASection(section) => write!(f, "Invalid configuration: section {} must be a mapping", section),
            ConfigError::OutOfRange { parameter, value, min, max } => {
                write!(f, "Invalid configuration: {} {} outside valid range [{}, {}]", parameter, value, min, max)
            }
            ConfigError::InvalidPolarization(value) => {
                write!(f, "Invalid configuration: polarization {} must be 1 (H) or 2 (V)", value)
            }
            ConfigError::InvalidType { parameter, value, expected } => {
                write!(f, "Invalid configuration: {} must be {}, got {}", parameter, expected, value)
            }
            ConfigError::NotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::UnsupportedFormat(ext) => write!(f, "Unsupported config file format: {}", ext),
            ConfigError::Io(msg) => write!(f, "Config file I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}
