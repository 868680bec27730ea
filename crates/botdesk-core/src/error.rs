//! Core domain errors.

use thiserror::Error;

/// Core domain errors for botdesk.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A `\u` escape was not followed by four hex digits.
    #[error("Malformed unicode escape at byte {position}")]
    MalformedEscape { position: usize },

    /// A UTF-16 surrogate escape without its pair.
    #[error("Unpaired surrogate \\u{unit:04x} at byte {position}")]
    UnpairedSurrogate { unit: u16, position: usize },
}
