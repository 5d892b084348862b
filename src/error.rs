//! Crate-wide error taxonomy.
//!
//! Every failure in metatune is local and recoverable: the screen keeps
//! running, the persisted override slot is never left half-written, and
//! the user sees either a toast or a modal. The variants below map the
//! failure classes the runtime distinguishes when deciding which kind of
//! feedback to show.

use thiserror::Error;

/// Failure classes surfaced by the override store and import pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// The override store or its backing file system could not be
    /// reached. Surfaced as a generic failure; never fatal to the screen.
    #[error("override store unavailable: {0}")]
    ResourceUnavailable(String),

    /// A candidate file's extension is not on the geo database
    /// whitelist. Nothing is written; the hint lists accepted formats.
    #[error("unsupported format, expected one of: {hint}")]
    ImportRejected {
        /// Joined list of accepted extensions, e.g. `.metadb/.db/.dat/.mmdb`.
        hint: String,
    },

    /// The candidate could not be resolved or its bytes could not be
    /// copied. The destination file is left untouched.
    #[error("import failed: {0}")]
    ImportFailed(String),

    /// The user dismissed a picker or declined a confirmation. Silent;
    /// no state change.
    #[error("cancelled by user")]
    CancelledByUser,

    /// Underlying I/O error from terminal setup or file handling.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
