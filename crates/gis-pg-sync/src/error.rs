//! Error types for the layer synchronization library.

use thiserror::Error;

/// Main error type for synchronization runs.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing project variables, bad port, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database could not be reached
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Layer names collide after normalization; the run was aborted untouched
    #[error("Non-unique layer names in project: {}", .0.join(", "))]
    DuplicateNames(Vec<String>),

    /// Bulk import of a local layer failed
    #[error("Import failed for layer {layer}: {message}")]
    Import { layer: String, message: String },

    /// SQL statement against the target database failed
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    /// Style could not be transplanted between layers
    #[error("Style error on layer {layer}: {message}")]
    Style { layer: String, message: String },

    /// Host project rejected a mutation (unknown layer or group, etc.)
    #[error("Project error: {0}")]
    Host(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl Into<String>, context: impl Into<String>) -> Self {
        MigrateError::Connection {
            message: message.into(),
            context: context.into(),
        }
    }

    /// Create an Import error
    pub fn import(layer: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Import {
            layer: layer.into(),
            message: message.into(),
        }
    }

    /// Create a Style error
    pub fn style(layer: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Style {
            layer: layer.into(),
            message: message.into(),
        }
    }

    /// Process exit code for this error kind.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) | MigrateError::Json(_) => 1,
            MigrateError::Connection { .. } => 2,
            MigrateError::DuplicateNames(_) => 3,
            MigrateError::Import { .. } => 4,
            MigrateError::Database(_) => 5,
            MigrateError::Style { .. } => 6,
            MigrateError::Io(_) => 7,
            MigrateError::Host(_) => 8,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for synchronization operations.
pub type Result<T> = std::result::Result<T, MigrateError>;
