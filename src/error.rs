use std::path::PathBuf;
use thiserror::Error;

/// Main error type for probfuse
#[derive(Error, Debug)]
pub enum FusionError {
    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration validation errors
    #[error("Configuration validation failed: {errors:?}")]
    ConfigValidation { errors: Vec<ValidationError> },

    /// Configuration file not found
    #[error("Configuration file not found: {path:?}")]
    ConfigNotFound { path: PathBuf },

    /// Invalid configuration value
    #[error("Invalid configuration value at {path}: {message}")]
    InvalidConfigValue { path: String, message: String },

    /// A line in a run, judgment, preprocessed or evaluation file could not be parsed
    #[error("Malformed line {line_number} in {path:?}: expected {expected}, found {found}: '{line}'")]
    MalformedLine {
        path: PathBuf,
        line_number: usize,
        expected: String,
        found: String,
        line: String,
    },

    /// Normalization denominator is zero
    #[error("Degenerate input for normalization: min = {min}, max = {max}")]
    DegenerateInput { min: f64, max: f64 },

    /// A combination operator received no scores
    #[error("{operator} called with an empty score set")]
    EmptyScoreSet { operator: &'static str },

    /// Zero training topics were sampled for a run
    #[error("Run {run}: sampling {fraction} of {topics} topics yields no training topics")]
    InsufficientTrainingData {
        run: usize,
        topics: usize,
        fraction: f64,
    },

    /// Wrong number of runs/topics or other broken structural precondition
    #[error("Structural precondition violated: {0}")]
    Structural(String),

    /// Out-of-range fusion parameter
    #[error("Invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    /// IO errors
    #[error("IO error: {context}: {source}")]
    Io {
        source: std::io::Error,
        context: String,
    },

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML serialization error: {0}")]
    TomlSerialization(#[from] toml::ser::Error),

    /// JSON errors
    #[error("JSON error: {context}: {source}")]
    Json {
        source: serde_json::Error,
        context: String,
    },

    /// Generic errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FusionError {
    /// Wrap an IO error with context
    pub fn io(source: std::io::Error, context: impl Into<String>) -> Self {
        Self::Io {
            source,
            context: context.into(),
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Path to the configuration key that failed validation
    pub path: String,
    /// Error message describing the validation failure
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result type for probfuse operations
pub type Result<T> = std::result::Result<T, FusionError>;
