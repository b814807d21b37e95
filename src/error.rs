/*!
A common error type across the library, with nested enumerations for the
syntax (lexical + structural) and path-expression concerns.

The parser is fail-fast: the first lexical or structural error aborts the
read and no partial tree is kept. Path compilation errors are surfaced by
[`Path::compile`](crate::Path::compile); the string-form query helpers
swallow them and return an empty result instead.
*/

use quick_xml::events::attributes::AttrError;
use quick_xml::Error as XMLError;
use std::io::Error as IOError;
use std::result::Result as StdResult;
use std::str::Utf8Error;
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// Public Types
// ------------------------------------------------------------------------------------------------

///
/// This provides a common error type across the library.
///
#[derive(Debug, Error)]
pub enum Error {
    /// An underlying reader or writer failure, propagated verbatim.
    #[error(transparent)]
    Io(#[from] IOError),

    /// A lexical or structural problem in the XML input.
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    /// A path expression that failed to compile.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The document declared a character encoding this library cannot decode
    /// and no charset reader was supplied in the read settings.
    #[error("the `{label}` character encoding is not supported and no charset reader was provided")]
    UnsupportedCharset {
        /// The encoding label as it appeared in the XML declaration.
        label: String,
    },
}

///
/// The lexical and structural error conditions raised while reading a
/// document. Positions are byte offsets into the decoded input.
///
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// Malformed markup reported by the token layer.
    #[error(transparent)]
    Lexer(#[from] XMLError),

    /// Malformed attribute syntax reported by the token layer.
    #[error(transparent)]
    Attribute(#[from] AttrError),

    /// The input was not valid UTF-8 after charset decoding.
    #[error(transparent)]
    Encoding(#[from] Utf8Error),

    /// A close tag named an element other than the innermost open one.
    #[error("element `{expected}` was closed by `{found}` (position {position})")]
    MismatchedEnd {
        /// Qualified name of the innermost open element.
        expected: String,
        /// Qualified name found in the close tag.
        found: String,
        /// Byte offset of the close tag.
        position: u64,
    },

    /// A close tag appeared with no element open.
    #[error("unexpected end element `{name}` (position {position})")]
    UnexpectedEnd {
        /// Qualified name found in the close tag.
        name: String,
        /// Byte offset of the close tag.
        position: u64,
    },

    /// The input ended with elements still open.
    #[error("unexpected end of input with {depth} element(s) still open")]
    UnexpectedEof {
        /// Number of unclosed elements.
        depth: usize,
    },

    /// An entity reference named an entity that is neither predefined nor in
    /// the caller-supplied entity map.
    #[error("unknown entity reference `&{name};` (position {position})")]
    UnknownEntity {
        /// The entity name between `&` and `;`.
        name: String,
        /// Byte offset of the reference.
        position: u64,
    },

    /// An `&` that does not begin a well-formed reference.
    #[error("malformed entity reference (position {position})")]
    BadEntity {
        /// Byte offset of the `&`.
        position: u64,
    },

    /// A numeric character reference that does not denote a Unicode scalar.
    #[error("invalid character reference `&#{reference};` (position {position})")]
    BadCharRef {
        /// The reference body between `&#` and `;`.
        reference: String,
        /// Byte offset of the reference.
        position: u64,
    },

    /// More than one element at the top level of the document while input
    /// validation is enabled.
    #[error("document has more than one root element (position {position})")]
    MultipleRoots {
        /// Byte offset of the second root.
        position: u64,
    },

    /// Significant content after the close of the root element while input
    /// validation is enabled.
    #[error("content after the document root element (position {position})")]
    TrailingContent {
        /// Byte offset of the trailing content.
        position: u64,
    },
}

///
/// The reasons a path expression can fail to compile.
///
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// The path was the empty string.
    #[error("empty path")]
    Empty,

    /// The path did not match the path grammar at all.
    #[error("invalid path `{path}`: {reason}")]
    Invalid {
        /// The offending path expression.
        path: String,
        /// A short description of the failure.
        reason: String,
    },

    /// A syntactically valid prefix was followed by unparseable trailing
    /// input.
    #[error("path `{path}` could not be fully parsed; remainder `{remainder}`")]
    Trailing {
        /// The offending path expression.
        path: String,
        /// The unconsumed remainder.
        remainder: String,
    },
}

///
/// This standard `Result` structure is used by every fallible operation in
/// the library.
///
pub type Result<T> = StdResult<T, Error>;

// ------------------------------------------------------------------------------------------------
// Public Functions
// ------------------------------------------------------------------------------------------------

pub(crate) fn mismatched_end<S1, S2>(expected: S1, found: S2, position: u64) -> Error
where
    S1: Into<String>,
    S2: Into<String>,
{
    Error::Syntax(SyntaxError::MismatchedEnd {
        expected: expected.into(),
        found: found.into(),
        position,
    })
}

pub(crate) fn unexpected_end<S>(name: S, position: u64) -> Error
where
    S: Into<String>,
{
    Error::Syntax(SyntaxError::UnexpectedEnd {
        name: name.into(),
        position,
    })
}

pub(crate) fn unexpected_eof(depth: usize) -> Error {
    Error::Syntax(SyntaxError::UnexpectedEof { depth })
}

pub(crate) fn unknown_entity<S>(name: S, position: u64) -> Error
where
    S: Into<String>,
{
    Error::Syntax(SyntaxError::UnknownEntity {
        name: name.into(),
        position,
    })
}

pub(crate) fn bad_entity(position: u64) -> Error {
    Error::Syntax(SyntaxError::BadEntity { position })
}

pub(crate) fn bad_char_ref<S>(reference: S, position: u64) -> Error
where
    S: Into<String>,
{
    Error::Syntax(SyntaxError::BadCharRef {
        reference: reference.into(),
        position,
    })
}

pub(crate) fn multiple_roots(position: u64) -> Error {
    Error::Syntax(SyntaxError::MultipleRoots { position })
}

pub(crate) fn trailing_content(position: u64) -> Error {
    Error::Syntax(SyntaxError::TrailingContent { position })
}

pub(crate) fn unsupported_charset<S>(label: S) -> Error
where
    S: Into<String>,
{
    Error::UnsupportedCharset {
        label: label.into(),
    }
}

pub(crate) fn invalid_path<S1, S2>(path: S1, reason: S2) -> PathError
where
    S1: Into<String>,
    S2: Into<String>,
{
    PathError::Invalid {
        path: path.into(),
        reason: reason.into(),
    }
}

pub(crate) fn trailing_path<S1, S2>(path: S1, remainder: S2) -> PathError
where
    S1: Into<String>,
    S2: Into<String>,
{
    PathError::Trailing {
        path: path.into(),
        remainder: remainder.into(),
    }
}
