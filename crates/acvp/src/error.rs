//! Error handling.

use alloc::string::String;
use core::fmt;

pub use crate::hex::HexError;

/// Shorthand for `Result<T, Error>`.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Aborts a vector set run.
///
/// Every error is fatal to the whole vector set. No partial
/// response is ever produced.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// A required field is absent.
    #[error("missing argument: `{0}`")]
    MissingArgument(&'static str),

    /// A field is present but its value is unrecognized or out
    /// of range.
    #[error("{0}")]
    InvalidArgument(#[from] InvalidArg),

    /// The document could not be parsed into the expected
    /// structure.
    #[error("malformed document: {0}")]
    MalformedDocument(String),

    /// Memory for a buffer of the given size could not be
    /// reserved.
    #[error("unable to allocate {0} bytes")]
    AllocationFailure(usize),

    /// A field could not be converted between hexadecimal and
    /// binary.
    #[error("hex conversion failure: `{field}`: {source}")]
    HexConversion {
        /// The offending field.
        field: &'static str,
        /// Why the conversion failed.
        source: HexError,
    },

    /// The algorithm or mode has no registered handler or is not
    /// supported by the harness.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The module under test reported a failure.
    #[error("crypto module failure: {0}")]
    CryptoModuleFailure(String),
}

impl Error {
    /// Returns the error's [`ErrorKind`].
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingArgument(_) => ErrorKind::MissingArgument,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::MalformedDocument(_) => ErrorKind::MalformedDocument,
            Self::AllocationFailure(_) => ErrorKind::AllocationFailure,
            Self::HexConversion { .. } => ErrorKind::HexConversion,
            Self::UnsupportedOperation(_) => ErrorKind::UnsupportedOperation,
            Self::CryptoModuleFailure(_) => ErrorKind::CryptoModuleFailure,
        }
    }

    pub(crate) fn hex(field: &'static str, source: HexError) -> Self {
        Self::HexConversion { field, source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedDocument(alloc::format!("{err}"))
    }
}

/// The general category of an [`Error`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// See [`Error::MissingArgument`].
    MissingArgument,
    /// See [`Error::InvalidArgument`].
    InvalidArgument,
    /// See [`Error::MalformedDocument`].
    MalformedDocument,
    /// See [`Error::AllocationFailure`].
    AllocationFailure,
    /// See [`Error::HexConversion`].
    HexConversion,
    /// See [`Error::UnsupportedOperation`].
    UnsupportedOperation,
    /// See [`Error::CryptoModuleFailure`].
    CryptoModuleFailure,
}

/// The argument is invalid.
pub(crate) fn invalid_arg(arg: &'static str, reason: impl Into<String>) -> Error {
    InvalidArg::new(arg, reason).into()
}

/// An argument is invalid.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub struct InvalidArg {
    arg: &'static str,
    reason: String,
}

impl InvalidArg {
    /// Creates an `InvalidArg`.
    #[inline]
    pub(crate) fn new(arg: &'static str, reason: impl Into<String>) -> Self {
        Self {
            arg,
            reason: reason.into(),
        }
    }

    /// The name of the offending field.
    pub const fn arg(&self) -> &'static str {
        self.arg
    }
}

impl fmt::Display for InvalidArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid argument: `{}`: {}", self.arg, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = invalid_arg("counterLength", "must be one of 8, 16, 24, or 32");
        assert_eq!(
            err.to_string(),
            "invalid argument: `counterLength`: must be one of 8, 16, 24, or 32"
        );
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);

        let err = Error::MissingArgument("tcId");
        assert_eq!(err.to_string(), "missing argument: `tcId`");
        assert_eq!(err.kind(), ErrorKind::MissingArgument);
    }

    #[test]
    fn test_malformed_from_serde() {
        let err = serde_json::from_str::<u32>("\"nope\"")
            .map_err(Error::from)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    }
}
