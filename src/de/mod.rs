//! Deserializer

mod raw;

use std::collections::{HashMap, HashSet};

use crate::{
    bson::Array,
    document::Document,
    error::{Error, Result},
};

pub(crate) const MIN_BSON_DOCUMENT_SIZE: i32 = 4 + 1; // 4 bytes for length, one byte for null terminator
pub(crate) const MIN_BSON_STRING_SIZE: i32 = 4 + 1; // 4 bytes for length, one byte for null terminator
pub(crate) const MIN_CODE_WITH_SCOPE_SIZE: i32 = 4 + MIN_BSON_STRING_SIZE + MIN_BSON_DOCUMENT_SIZE;

/// Options controlling how BSON bytes are decoded into a document tree.
///
/// The defaults match the canonical deserializer: promotion enabled, all
/// strings validated as UTF-8, nothing kept raw.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Surface 64-bit integers as `Bson::Int64` unconditionally, never
    /// narrowing them. Conflicts with disabling `promote_values` or
    /// `promote_longs`.
    pub use_big_int64: bool,

    /// Narrow 64-bit integers to `Bson::Int32` when the value fits.
    /// Only applies while `promote_values` is enabled.
    pub promote_longs: bool,

    /// Accepted for option-record compatibility. Binary values in this
    /// crate always own their payload bytes directly.
    pub promote_buffers: bool,

    /// Surface values in their promoted forms: symbols as strings and
    /// 64-bit integers subject to `promote_longs` narrowing. When disabled,
    /// every element keeps its exact wire variant.
    pub promote_values: bool,

    /// Keys whose array values should have their embedded documents passed
    /// through as raw, unparsed byte buffers.
    pub fields_as_raw: HashSet<String>,

    /// Keep regular expression options exactly as stored instead of
    /// translating them to the portable flag set.
    pub bson_regexp: bool,

    /// Permit the buffer to extend past the document's declared size
    /// instead of requiring an exact match.
    pub allow_object_smaller_than_buffer_size: bool,

    /// Offset into the buffer at which the document starts.
    pub index: usize,

    /// Return embedded documents as raw, unparsed byte buffers.
    pub raw: bool,

    /// UTF-8 validation policy for keys and string payloads.
    pub validation: Utf8Validation,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            use_big_int64: false,
            promote_longs: true,
            promote_buffers: false,
            promote_values: true,
            fields_as_raw: HashSet::new(),
            bson_regexp: false,
            allow_object_smaller_than_buffer_size: false,
            index: 0,
            raw: false,
            validation: Utf8Validation::default(),
        }
    }
}

/// The UTF-8 validation policy applied to keys and string payloads.
#[derive(Debug, Clone)]
pub enum Utf8Validation {
    /// Validate all strings (`true`, the default) or none (`false`).
    /// Strings that fail validation while it is disabled decode lossily,
    /// with invalid sequences replaced by U+FFFD.
    All(bool),

    /// A per-key policy. The map must be non-empty and uniform: if every
    /// value is `true`, only the listed keys are validated; if every value
    /// is `false`, every key except the listed ones is validated. A key's
    /// setting is inherited by the entire subtree beneath it.
    Keys(HashMap<String, bool>),
}

impl Default for Utf8Validation {
    fn default() -> Self {
        Self::All(true)
    }
}

/// The resolved validation policy for one recursion level.
#[derive(Clone, Copy)]
pub(crate) enum Utf8Policy<'o> {
    Global(bool),
    Keys {
        keys: &'o HashMap<String, bool>,
        listed: bool,
    },
}

impl Utf8Policy<'_> {
    pub(crate) fn for_key(&self, key: &str) -> bool {
        match self {
            Self::Global(validate) => *validate,
            Self::Keys { keys, listed } => {
                if keys.contains_key(key) {
                    *listed
                } else {
                    !*listed
                }
            }
        }
    }
}

/// Validates the option record, surfacing `OptionConflict` for
/// self-contradictory settings, and resolves the root UTF-8 policy.
fn validate_options(options: &DecodeOptions) -> Result<Utf8Policy<'_>> {
    if options.use_big_int64 && !options.promote_values {
        return Err(Error::option_conflict(
            "use_big_int64 cannot be used with promote_values disabled",
        ));
    }
    if options.use_big_int64 && !options.promote_longs {
        return Err(Error::option_conflict(
            "use_big_int64 cannot be used with promote_longs disabled",
        ));
    }

    match &options.validation {
        Utf8Validation::All(validate) => Ok(Utf8Policy::Global(*validate)),
        Utf8Validation::Keys(keys) => {
            let mut values = keys.values();
            let first = *values
                .next()
                .ok_or_else(|| Error::option_conflict("UTF-8 validation setting cannot be empty"))?;
            if values.any(|v| *v != first) {
                return Err(Error::option_conflict(
                    "UTF-8 validation settings must be all true or all false",
                ));
            }
            Ok(Utf8Policy::Keys {
                keys,
                listed: first,
            })
        }
    }
}

/// Decodes a BSON document from a byte buffer.
///
/// ```
/// # fn main() -> bson_stream::error::Result<()> {
/// use bson_stream::{de::{decode_document, DecodeOptions}, doc};
///
/// let bytes = b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00";
/// let decoded = decode_document(bytes, &DecodeOptions::default())?;
/// assert_eq!(decoded, doc! { "hello": "world" });
/// # Ok(())
/// # }
/// ```
pub fn decode_document(bytes: &[u8], options: &DecodeOptions) -> Result<Document> {
    let utf8 = validate_options(options)?;
    raw::decode_document(bytes, options, utf8)
}

/// Decodes a BSON document from a byte buffer in array context, discarding
/// the synthetic numeric keys and returning the elements positionally.
pub fn decode_array(bytes: &[u8], options: &DecodeOptions) -> Result<Array> {
    let utf8 = validate_options(options)?;
    raw::decode_array(bytes, options, utf8)
}
