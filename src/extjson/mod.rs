//! [Extended JSON](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/) encoding.
//!
//! Extended JSON is a projection of BSON into JSON text in which every typed
//! value is wrapped in an object with a `$`-prefixed discriminator key. The
//! canonical flavor is lossless; the relaxed flavor (the default) renders
//! common numeric and date values as plain JSON for readability and is
//! deliberately lossy for them.
//!
//! Encoding is streaming-first: [`Stringifier::stream`] returns a lazy
//! iterator of string chunks whose concatenation equals the non-streaming
//! encoding, so multi-million-element documents can be written out without
//! materializing the full text.
//!
//! ```
//! # fn main() -> bson_stream::error::Result<()> {
//! use bson_stream::{bson, extjson};
//!
//! let value = bson!({ "a": 1, "b": "hello", "c": true });
//! assert_eq!(extjson::stringify(&value)?, r#"{"a":1,"b":"hello","c":true}"#);
//! # Ok(())
//! # }
//! ```

mod stream;

pub use self::stream::ExtendedJsonStream;

use crate::{bson::Bson, document::Document, error::Result};

/// The largest integer a 64-bit float represents exactly; the bound of the
/// relaxed projection's plain-number form for 64-bit integers.
pub(crate) const MAX_SAFE_INTEGER: i64 = 9_007_199_254_740_991;
pub(crate) const MIN_SAFE_INTEGER: i64 = -MAX_SAFE_INTEGER;

/// Options controlling the Extended JSON flavor.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Emit the relaxed format (the default). When disabled, the canonical
    /// format is emitted instead.
    pub relaxed: bool,

    /// Emit the legacy projections for binary and regular expression values.
    pub legacy: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            relaxed: true,
            legacy: false,
        }
    }
}

/// Indentation for pretty output.
#[derive(Debug, Clone)]
pub enum Indent {
    /// Indent by the given number of spaces per level, capped at ten.
    Spaces(u8),

    /// Indent by the given string per level, used verbatim.
    Literal(String),
}

impl Indent {
    pub(crate) fn unit(&self) -> String {
        match self {
            Indent::Spaces(n) => " ".repeat((*n).min(10) as usize),
            Indent::Literal(s) => s.clone(),
        }
    }
}

impl From<u8> for Indent {
    fn from(n: u8) -> Self {
        Indent::Spaces(n)
    }
}

impl From<&str> for Indent {
    fn from(s: &str) -> Self {
        Indent::Literal(s.to_string())
    }
}

impl From<String> for Indent {
    fn from(s: String) -> Self {
        Indent::Literal(s)
    }
}

/// A filter applied to every (key, value) pair before projection.
pub enum Replacer<'a> {
    /// Invoked once per pair, the root included under the empty key.
    /// Returning `None` omits the entry from an object, emits `null` for an
    /// array element, and produces empty output at the root.
    Function(Box<dyn FnMut(&str, &Bson) -> Option<Bson> + 'a>),

    /// Restricts every object to the listed keys, preserving each object's
    /// own insertion order. Array elements are unaffected.
    AllowList(Vec<String>),
}

impl std::fmt::Debug for Replacer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Replacer::Function(_) => f.write_str("Replacer::Function(..)"),
            Replacer::AllowList(keys) => f.debug_tuple("Replacer::AllowList").field(keys).finish(),
        }
    }
}

/// A configured Extended JSON encoder.
///
/// The second and third arguments of the canonical `stringify` signature are
/// rendered here as builder methods: replacer, indentation, and flavor
/// options can each be set independently and in any order.
#[derive(Debug, Default)]
pub struct Stringifier<'a> {
    options: EncodeOptions,
    indent: Option<Indent>,
    replacer: Option<Replacer<'a>>,
}

impl<'a> Stringifier<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flavor options wholesale.
    pub fn options(mut self, options: EncodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Enables or disables the relaxed format.
    pub fn relaxed(mut self, relaxed: bool) -> Self {
        self.options.relaxed = relaxed;
        self
    }

    /// Enables or disables the legacy projections.
    pub fn legacy(mut self, legacy: bool) -> Self {
        self.options.legacy = legacy;
        self
    }

    /// Sets the indentation: a space count (capped at ten) or a literal
    /// string used verbatim.
    pub fn indent(mut self, indent: impl Into<Indent>) -> Self {
        self.indent = Some(indent.into());
        self
    }

    /// Sets a function replacer.
    pub fn replacer_fn(mut self, f: impl FnMut(&str, &Bson) -> Option<Bson> + 'a) -> Self {
        self.replacer = Some(Replacer::Function(Box::new(f)));
        self
    }

    /// Sets an allow-list replacer restricting object keys.
    pub fn allow_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replacer = Some(Replacer::AllowList(
            keys.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Lazily encodes the given value as a sequence of string chunks.
    pub fn stream(self, value: &'a Bson) -> ExtendedJsonStream<'a> {
        ExtendedJsonStream::new(stream::Root::Value(value), self)
    }

    /// Lazily encodes the given document as a sequence of string chunks.
    pub fn stream_document(self, doc: &'a Document) -> ExtendedJsonStream<'a> {
        ExtendedJsonStream::new(stream::Root::Document(doc), self)
    }

    /// Encodes the given value to a single string.
    pub fn stringify(self, value: &'a Bson) -> Result<String> {
        collect(self.stream(value))
    }

    /// Encodes the given document to a single string.
    pub fn stringify_document(self, doc: &'a Document) -> Result<String> {
        collect(self.stream_document(doc))
    }

    pub(crate) fn into_parts(self) -> (EncodeOptions, Option<String>, Option<Replacer<'a>>) {
        (
            self.options,
            self.indent.map(|i| i.unit()).filter(|u| !u.is_empty()),
            self.replacer,
        )
    }
}

fn collect(stream: ExtendedJsonStream<'_>) -> Result<String> {
    let mut out = String::new();
    for chunk in stream {
        out.push_str(&chunk?);
    }
    Ok(out)
}

/// Encodes the given value with default options.
pub fn stringify(value: &Bson) -> Result<String> {
    Stringifier::new().stringify(value)
}

/// Encodes the given document with default options.
pub fn stringify_document(doc: &Document) -> Result<String> {
    Stringifier::new().stringify_document(doc)
}
