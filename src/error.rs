use thiserror::Error;

use crate::spec::ElementType;

pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur while decoding BSON or producing Extended JSON.
#[derive(Debug, Error)]
#[non_exhaustive]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,

    /// The document key associated with the error, if any.
    pub key: Option<String>,

    /// The array index associated with the error, if any.
    pub index: Option<usize>,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(key) = self.key.as_deref() {
            write!(f, "Error at key \"{key}\": ")?;
        } else if let Some(index) = self.index {
            write!(f, "Error at array index {index}: ")?;
        }

        write!(f, "{}", self.kind)
    }
}

/// The types of errors that can occur in this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The framing of a BSON document was violated: a bad length prefix, a
    /// missing null terminator, or a payload that does not fit its declared
    /// size.
    #[error("Malformed BSON: {message}")]
    #[non_exhaustive]
    MalformedBson { message: String },

    /// A length-prefixed string was structurally invalid.
    #[error("Malformed string: {message}")]
    #[non_exhaustive]
    MalformedString { message: String },

    /// Invalid UTF-8 bytes were encountered while validation was enabled.
    #[error("Invalid UTF-8")]
    Utf8Encoding,

    /// An element carried a type tag this crate does not recognize.
    #[error("Unrecognized element type 0x{tag:02x}")]
    #[non_exhaustive]
    UnrecognizedElementType { tag: u8 },

    /// The provided options were self-contradictory.
    #[error("Invalid options: {message}")]
    #[non_exhaustive]
    OptionConflict { message: String },

    /// An object or array appeared in its own ancestor chain while encoding.
    #[error("Converting circular structure to Extended JSON")]
    CircularStructure,

    /// An error occurred when attempting to access a value in a document.
    #[error("An error occurred when attempting to access a document value: {kind}")]
    #[non_exhaustive]
    ValueAccess {
        /// The kind of error that occurred.
        kind: ValueAccessErrorKind,
    },

    /// A malformed ObjectId representation was provided.
    #[error("Invalid ObjectId: {message}")]
    #[non_exhaustive]
    ObjectId { message: String },

    /// A datetime could not be represented or formatted.
    #[error("Invalid DateTime: {message}")]
    #[non_exhaustive]
    Datetime { message: String },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self {
            kind,
            key: None,
            index: None,
        }
    }
}

/// The types of errors that can occur when attempting to access a value in a document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ValueAccessErrorKind {
    /// No value for the specified key was present in the document.
    #[error("The key was not present in the document")]
    NotPresent,

    /// The type of the value in the document did not match the requested type.
    #[error("Expected type {expected:?}, got type {actual:?}")]
    #[non_exhaustive]
    UnexpectedType {
        /// The actual type of the value.
        actual: ElementType,

        /// The expected type of the value.
        expected: ElementType,
    },
}

impl Error {
    pub(crate) fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub(crate) fn malformed_bson(message: impl ToString) -> Self {
        ErrorKind::MalformedBson {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn malformed_string(message: impl ToString) -> Self {
        ErrorKind::MalformedString {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn utf8_encoding() -> Self {
        ErrorKind::Utf8Encoding.into()
    }

    pub(crate) fn unrecognized_element_type(tag: u8) -> Self {
        ErrorKind::UnrecognizedElementType { tag }.into()
    }

    pub(crate) fn option_conflict(message: impl ToString) -> Self {
        ErrorKind::OptionConflict {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn circular_structure() -> Self {
        ErrorKind::CircularStructure.into()
    }

    pub(crate) fn value_access_not_present() -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::NotPresent,
        }
        .into()
    }

    pub(crate) fn value_access_unexpected_type(actual: ElementType, expected: ElementType) -> Self {
        ErrorKind::ValueAccess {
            kind: ValueAccessErrorKind::UnexpectedType { actual, expected },
        }
        .into()
    }

    pub(crate) fn object_id(message: impl ToString) -> Self {
        ErrorKind::ObjectId {
            message: message.to_string(),
        }
        .into()
    }

    pub(crate) fn datetime(message: impl ToString) -> Self {
        ErrorKind::Datetime {
            message: message.to_string(),
        }
        .into()
    }

    #[cfg(test)]
    pub(crate) fn is_malformed_bson(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedBson { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_option_conflict(&self) -> bool {
        matches!(self.kind, ErrorKind::OptionConflict { .. })
    }

    #[cfg(test)]
    pub(crate) fn is_value_access_not_present(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ValueAccess {
                kind: ValueAccessErrorKind::NotPresent,
                ..
            }
        )
    }

    #[cfg(test)]
    pub(crate) fn is_value_access_unexpected_type(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::ValueAccess {
                kind: ValueAccessErrorKind::UnexpectedType { .. },
                ..
            }
        )
    }
}
