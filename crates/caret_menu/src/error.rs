//! Error types for the floating menu

use caret_core::EngineError;
use thiserror::Error;

/// Errors raised while configuring a floating menu
///
/// Runtime behaviour never fails: commands report `false` and lifecycle
/// calls are no-ops when they do not apply. Only construction and config
/// loading return errors.
#[derive(Error, Debug)]
pub enum MenuError {
    /// No host element was supplied
    #[error("Floating menu requires a host element")]
    MissingElement,

    /// The open or close key could not be parsed
    #[error("Invalid key binding: {0}")]
    InvalidKeyBinding(#[from] EngineError),

    /// A TOML configuration could not be parsed
    #[error("Invalid menu configuration: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result type for menu configuration
pub type Result<T> = std::result::Result<T, MenuError>;
