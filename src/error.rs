use std::{io, result};

use thiserror::Error as ThisError;

/// The specific type of an error.
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Wrap a [std::io::Error], raised when opening or reading the source.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Indicate that an option of the configuration bag could not be resolved.
    #[error("invalid option `{option}`: {reason}")]
    Config {
        /// Name of the offending option, e.g. `col_sep`
        option: &'static str,
        /// What is wrong with the supplied value
        reason: String,
    },

    /// Indicate that the tokenizer found structurally invalid CSV data.
    #[error("CSV error: row {row} (byte: {byte}): {reason}")]
    MalformedInput {
        /// 1-based physical row index where parsing failed
        row: u64,
        /// Absolute byte offset where parsing failed
        byte: u64,
        /// Description of the failure
        reason: &'static str,
    },

    /// Indicate that an operation is invalid in the current state.
    #[error("invalid state: {0}")]
    State(&'static str),

    /// Indicate that an operation is not supported by the underlying source.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Indicate that cell bytes are not valid text for their encoding tag.
    #[error("cell is not valid {encoding} text")]
    InvalidEncoding {
        /// Name of the encoding tag carried by the cell
        encoding: &'static str,
    },
}

/// An error occurring when configuring a parser or reading CSV data.
#[derive(Debug, ThisError)]
#[error(transparent)]
pub struct Error(ErrorKind);

impl Error {
    pub(crate) fn new(kind: ErrorKind) -> Self {
        Self(kind)
    }

    pub(crate) fn config(option: &'static str, reason: impl Into<String>) -> Self {
        Self(ErrorKind::Config {
            option,
            reason: reason.into(),
        })
    }

    pub(crate) fn malformed(row: u64, byte: u64, reason: &'static str) -> Self {
        Self(ErrorKind::MalformedInput { row, byte, reason })
    }

    pub(crate) fn state(msg: &'static str) -> Self {
        Self(ErrorKind::State(msg))
    }

    /// Return whether the wrapped error is a [`std::io::Error`].
    pub fn is_io_error(&self) -> bool {
        matches!(self.0, ErrorKind::Io(_))
    }

    /// Return whether the error was raised while resolving options.
    pub fn is_config_error(&self) -> bool {
        matches!(self.0, ErrorKind::Config { .. })
    }

    /// Return whether the error signals malformed CSV input.
    pub fn is_malformed_input(&self) -> bool {
        matches!(self.0, ErrorKind::MalformedInput { .. })
    }

    /// Return a reference to the underlying [`ErrorKind`].
    pub fn kind(&self) -> &ErrorKind {
        &self.0
    }

    /// Unwraps the error into its underlying [`ErrorKind`].
    pub fn into_kind(self) -> ErrorKind {
        self.0
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self(ErrorKind::Io(err))
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> Self {
        match err.0 {
            ErrorKind::Io(inner) => inner,
            kind => Self::new(io::ErrorKind::Other, Error(kind)),
        }
    }
}

/// A type alias for `Result<T, pull_csv::Error>`.
pub type Result<T> = result::Result<T, Error>;
