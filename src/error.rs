//! Error handling for cfn-forge.
//! Defines the error type and result alias used throughout the crate.

use std::io;
use thiserror::Error;

/// Errors raised while building, loading or rendering a template.
///
/// Every error is fatal: the first one aborts the build or render sequence
/// and no partial output is produced.
#[derive(Error, Debug)]
pub enum Error {
    /// A logical name is already registered in the same category.
    #[error("Duplicate name: {category} '{name}' is already defined.")]
    DuplicateName { category: &'static str, name: String },

    /// A logical name is empty or contains non-alphanumeric characters.
    #[error("Invalid name: {category} '{name}' must be non-empty and alphanumeric.")]
    InvalidName { category: &'static str, name: String },

    /// A property name is not part of the schema of a known resource type.
    #[error("Unknown property: '{property}' is not a property of {resource_type} ('{name}').")]
    UnknownProperty {
        name: String,
        resource_type: String,
        property: String,
    },

    /// A template section grew beyond the platform quota.
    #[error("Limit exceeded: a template holds at most {limit} {category}s.")]
    LimitExceeded { category: &'static str, limit: usize },

    /// A value cannot be serialized into the wire format.
    #[error("Unsupported value at {path}: {reason}.")]
    UnsupportedValue { path: String, reason: String },

    /// A parameter declaration is inconsistent with its type.
    #[error("Invalid parameter '{name}': {reason}.")]
    InvalidParameter { name: String, reason: String },

    /// Stack file loading or command-line configuration failures.
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    #[error("JSON error: {0}.")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML error: {0}.")]
    YamlError(#[from] serde_yaml::Error),
}

/// Convenience type alias for Results with [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
