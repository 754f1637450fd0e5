//! Platform error types

use thiserror::Error;

/// Platform-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// A key name could not be mapped to a [`Key`](crate::Key)
    #[error("Unknown key name: {0}")]
    UnknownKey(String),

    /// A modifier prefix in a key chord was not recognised
    #[error("Unknown modifier '{modifier}' in key chord '{chord}'")]
    UnknownModifier {
        /// The offending modifier text
        modifier: String,
        /// The full chord that was being parsed
        chord: String,
    },

    /// A key chord had no key after its modifiers
    #[error("Empty key chord: {0:?}")]
    EmptyChord(String),
}

/// Result type for platform operations
pub type Result<T> = std::result::Result<T, PlatformError>;
