//! # Error Types
//!
//! All fallible operations in the core crate return [`LabError`].
//!
//! ## Error Types
//! - `InputOutOfRange` - A tuning error or coordinate outside its accepted range
//! - `NotImplemented` - A placeholder model was asked to predict
//! - `UnknownModel` / `UnknownNote` - Unrecognised names in requests or config
//! - `InvalidParameter` - A simulation parameter that cannot be sent
//! - `Plot` - The SVG backend failed to draw a figure
//! - `Io`, `Json`, `Toml` - Persistence failures

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabError {
    /// A numeric input fell outside its accepted range or was not finite.
    ///
    /// # Example
    /// ```
    /// # use tuning_lab_core::LabError;
    /// let err = LabError::InputOutOfRange {
    ///     field: "tonic",
    ///     value: 75.0,
    ///     min: -50.0,
    ///     max: 50.0,
    /// };
    /// assert_eq!(err.to_string(), "tonic must be between -50 and 50 (got 75)");
    /// ```
    #[error("{field} must be between {min} and {max} (got {value})")]
    InputOutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// The selected model is a placeholder without a prediction routine.
    #[error("{0} not yet implemented")]
    NotImplemented(String),

    #[error("unknown model '{0}' (expected one of: dummy, physics, ml)")]
    UnknownModel(String),

    #[error("unknown note name '{0}'")]
    UnknownNote(String),

    #[error("invalid parameter {name}: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("plot error: {0}")]
    Plot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, LabError>;
