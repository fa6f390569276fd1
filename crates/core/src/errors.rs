//! Error types for the metaguard core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. Checker
//! failures surface as [`CheckError`], which wraps detection errors. Expected
//! outcomes (a user dismissing a prompt, a detected
//! conflict) are never errors; they travel as
//! [`Decision::Cancel`](crate::decision::Decision::Cancel).

use thiserror::Error;

use crate::decision::Shape;

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Existence probe errors
// ---------------------------------------------------------------------------

/// Errors raised while computing the on-disk candidates for a component.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// Neither the component nor its registered type declares a suffix, so
    /// no descriptor file name can be built.
    #[error("missing suffix for {component_type}")]
    MissingSuffix { component_type: String },
}

// ---------------------------------------------------------------------------
// Conflict detection errors
// ---------------------------------------------------------------------------

/// Errors from a conflict detection backend.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// The baseline snapshot for the principal does not exist.
    #[error("no baseline found for '{principal}' at '{path}'")]
    BaselineMissing {
        principal: String,
        path: String,
    },

    /// The manifest file could not be read.
    #[error("manifest not readable at '{path}': {detail}")]
    Manifest {
        path: String,
        detail: String,
    },

    /// Generic I/O wrapper.
    #[error("conflict detection I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Checker errors
// ---------------------------------------------------------------------------

/// Failures a postcondition checker cannot express as `Cancel`.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The conflict detection backend failed.
    #[error("conflict detection failed: {0}")]
    Detection(#[from] DetectionError),

    /// Two composed checkers produced payloads of different shapes.
    #[error("cannot merge {found} payload into {expected} payload")]
    ShapeMismatch { expected: Shape, found: Shape },

    /// The checker does not accept this kind of input.
    #[error("{checker} does not accept {shape} input")]
    UnsupportedPayload {
        checker: &'static str,
        shape: Shape,
    },

    /// The notification layer failed while waiting for the user.
    #[error("prompt failed: {0}")]
    Prompt(String),
}
