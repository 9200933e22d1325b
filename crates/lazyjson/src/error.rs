use alloc::string::String;
use core::fmt;

use bstr::BStr;
use thiserror::Error;

/// The category of an [`Error`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An unexpected byte was found while scanning.
    #[error("wrong symbol")]
    WrongSymbol,
    /// The input ended inside a token or an open structure.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    /// The node (or value) does not have the requested type.
    #[error("wrong type")]
    WrongType,
    /// The operation makes no sense for an otherwise well-typed node.
    #[error("wrong request")]
    WrongRequest,
    /// A JSONPath or expression could not be compiled.
    #[error("{0}")]
    Path(#[from] PathErrorKind),
}

/// Compilation failures for JSONPath queries and expressions.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathErrorKind {
    /// A name, operator or byte that is not known.
    #[error("unknown token")]
    UnknownToken,
    /// An expression that does not form a valid formula.
    #[error("wrong formula")]
    MalformedFormula,
    /// Path syntax that cannot be compiled.
    #[error("wrong path")]
    MalformedPath,
    /// Blank path or expression.
    #[error("empty request")]
    EmptyRequest,
}

/// Error returned by every fallible operation of the crate.
///
/// Scanning errors carry the byte offset and, for [`ErrorKind::WrongSymbol`],
/// the offending byte. Semantic errors carry a message instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct Error {
    kind: ErrorKind,
    offset: Option<usize>,
    symbol: Option<u8>,
    message: Option<String>,
}

impl Error {
    pub(crate) fn wrong_symbol(offset: usize, symbol: u8) -> Self {
        tracing::trace!(offset, symbol, "wrong symbol");
        Self {
            kind: ErrorKind::WrongSymbol,
            offset: Some(offset),
            symbol: Some(symbol),
            message: None,
        }
    }

    pub(crate) fn unexpected_end(offset: usize) -> Self {
        Self {
            kind: ErrorKind::UnexpectedEndOfInput,
            offset: Some(offset),
            symbol: None,
            message: None,
        }
    }

    pub(crate) fn wrong_type(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::WrongType, message)
    }

    pub(crate) fn wrong_request(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::WrongRequest, message)
    }

    pub(crate) fn path(kind: PathErrorKind, message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::Path(kind), message)
    }

    pub(crate) fn with_message(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            offset: None,
            symbol: None,
            message: Some(message.into()),
        }
    }

    pub(crate) fn at(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Byte offset into the scanned input, when the error came from scanning.
    #[must_use]
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    /// The offending byte of a [`ErrorKind::WrongSymbol`] error.
    #[must_use]
    pub fn symbol(&self) -> Option<u8> {
        self.symbol
    }

    /// Free-form detail attached to semantic errors.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)?;
        if let Some(symbol) = self.symbol {
            write!(f, " '{}'", BStr::new(&[symbol]))?;
        }
        if let Some(offset) = self.offset {
            write!(f, " at {offset}")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn display_includes_symbol_and_offset() {
        let err = Error::wrong_symbol(3, b'x');
        assert_eq!(err.to_string(), "wrong symbol 'x' at 3");
        assert_eq!(err.kind(), ErrorKind::WrongSymbol);
        assert_eq!(err.symbol(), Some(b'x'));
    }

    #[test]
    fn display_of_path_error_uses_message() {
        let err = Error::path(PathErrorKind::MalformedFormula, "formula has no open parenthesis");
        assert_eq!(err.to_string(), "wrong formula: formula has no open parenthesis");
    }

    #[test]
    fn unexpected_end_has_no_symbol() {
        let err = Error::unexpected_end(7);
        assert_eq!(err.to_string(), "unexpected end of input at 7");
        assert_eq!(err.symbol(), None);
    }
}
