//! Engine error types

use caret_platform::PlatformError;
use thiserror::Error;

/// Errors raised while building documents, states, or keymaps
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A position lies outside the document
    #[error("Position {pos} out of range (document size {size})")]
    PositionOutOfRange {
        /// Requested position
        pos: usize,
        /// Content size of the document
        size: usize,
    },

    /// A node type name is not part of the schema
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// A text edit targeted a position outside any textblock
    #[error("Position {0} is not inside a textblock")]
    NotInTextblock(usize),

    /// A range edit spans more than one textblock
    #[error("Range {from}..{to} crosses a block boundary")]
    CrossesBlocks {
        /// Range start
        from: usize,
        /// Range end
        to: usize,
    },

    /// A transaction was applied to a state it was not created from
    #[error("Applying a mismatched transaction (state version {state}, transaction base {base})")]
    MismatchedTransaction {
        /// Version of the state the transaction was applied to
        state: u64,
        /// Version of the state the transaction was created from
        base: u64,
    },

    /// A keymap entry could not be parsed
    #[error("Invalid key binding: {0}")]
    InvalidKeyBinding(#[from] PlatformError),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
