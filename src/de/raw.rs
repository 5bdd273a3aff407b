//! Single-pass decoding of BSON bytes into an owned tree.

use std::borrow::Cow;

use crate::{
    bson::{Array, Bson, DbRef, JavaScriptCodeWithScope, Regex, Timestamp},
    datetime::DateTime,
    de::{DecodeOptions, Utf8Policy, MIN_BSON_DOCUMENT_SIZE, MIN_CODE_WITH_SCOPE_SIZE},
    document::Document,
    error::{Error, Result},
    oid::ObjectId,
    raw::RawDocumentBuf,
    spec::{BinarySubtype, ElementType},
    Binary,
    DbPointer,
    Decimal128,
};

/// A cursor over a borrowed byte slice. Every read is bounds checked; an
/// overrun is a framing error, not a panic.
struct SliceReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> SliceReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn eof(&self) -> Error {
        Error::malformed_bson(format!("unexpected end of input at offset {}", self.pos))
    }

    fn read_u8(&mut self) -> Result<u8> {
        let b = *self.bytes.get(self.pos).ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(b)
    }

    fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or_else(|| self.eof())?;
        if end > self.bytes.len() {
            return Err(self.eof());
        }
        let s = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    fn read_i32(&mut self) -> Result<i32> {
        let s = self.read_exact(4)?;
        Ok(i32::from_le_bytes([s[0], s[1], s[2], s[3]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let s = self.read_exact(4)?;
        Ok(u32::from_le_bytes([s[0], s[1], s[2], s[3]]))
    }

    fn read_i64(&mut self) -> Result<i64> {
        let s = self.read_exact(8)?;
        Ok(i64::from_le_bytes([
            s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
        ]))
    }

    fn read_f64(&mut self) -> Result<f64> {
        let s = self.read_exact(8)?;
        Ok(f64::from_le_bytes([
            s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7],
        ]))
    }

    /// Reads up to (and consumes) the next null byte, returning the bytes
    /// before it.
    fn read_cstring_bytes(&mut self) -> Result<&'a [u8]> {
        let rest = &self.bytes[self.pos..];
        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| Error::malformed_bson("cstring missing null terminator"))?;
        self.pos += nul + 1;
        Ok(&rest[..nul])
    }

    /// Reads an embedded document or array: validates its length prefix and
    /// null terminator, consumes it, and returns the entire framed slice.
    fn read_subdocument(&mut self) -> Result<&'a [u8]> {
        let start = self.pos;
        let size = self.read_i32()?;
        if size < MIN_BSON_DOCUMENT_SIZE {
            return Err(Error::malformed_bson(format!(
                "embedded document size {} is too small",
                size
            )));
        }
        let size = size as usize;
        if self.bytes.len() - start < size {
            return Err(Error::malformed_bson(format!(
                "embedded document size {} exceeds remaining buffer length {}",
                size,
                self.bytes.len() - start
            )));
        }
        let doc = &self.bytes[start..start + size];
        if doc[size - 1] != 0 {
            return Err(Error::malformed_bson(
                "embedded document not null terminated",
            ));
        }
        self.pos = start + size;
        Ok(doc)
    }
}

/// Validates the outer framing of the document starting at `index`: a sane
/// length prefix, the buffer-length policy, and the null terminator.
fn frame(bytes: &[u8], index: usize, allow_smaller: bool) -> Result<&[u8]> {
    if bytes.len() < index || bytes.len() - index < MIN_BSON_DOCUMENT_SIZE as usize {
        return Err(Error::malformed_bson(format!(
            "buffer of length {} is too small for a document at offset {}",
            bytes.len(),
            index
        )));
    }
    let size = i32::from_le_bytes([
        bytes[index],
        bytes[index + 1],
        bytes[index + 2],
        bytes[index + 3],
    ]);
    if size < MIN_BSON_DOCUMENT_SIZE {
        return Err(Error::malformed_bson(format!(
            "document size {} is too small",
            size
        )));
    }
    let size = size as usize;
    if bytes.len() - index < size {
        return Err(Error::malformed_bson(format!(
            "document size {} exceeds buffer length {}",
            size,
            bytes.len() - index
        )));
    }
    if !allow_smaller && bytes.len() - index != size {
        return Err(Error::malformed_bson(format!(
            "document size {} does not match buffer length {}",
            size,
            bytes.len() - index
        )));
    }
    let doc = &bytes[index..index + size];
    if doc[size - 1] != 0 {
        return Err(Error::malformed_bson("document not null terminated"));
    }
    Ok(doc)
}

/// Per-recursion decoding context. The UTF-8 policy narrows to a plain
/// boolean as soon as a keyed subtree is entered; `raw` sticks for the whole
/// subtree it was enabled on.
#[derive(Clone, Copy)]
struct Ctx<'o> {
    utf8: Utf8Policy<'o>,
    raw: bool,
}

pub(crate) fn decode_document<'o>(
    bytes: &[u8],
    options: &'o DecodeOptions,
    utf8: Utf8Policy<'o>,
) -> Result<Document> {
    let doc = frame(
        bytes,
        options.index,
        options.allow_object_smaller_than_buffer_size,
    )?;
    let decoder = Decoder { options };
    decoder.decode_doc(doc, Ctx {
        utf8,
        raw: options.raw,
    })
}

pub(crate) fn decode_array<'o>(
    bytes: &[u8],
    options: &'o DecodeOptions,
    utf8: Utf8Policy<'o>,
) -> Result<Array> {
    let doc = frame(
        bytes,
        options.index,
        options.allow_object_smaller_than_buffer_size,
    )?;
    let decoder = Decoder { options };
    decoder.decode_arr(doc, Ctx {
        utf8,
        raw: options.raw,
    })
}

struct Decoder<'o> {
    options: &'o DecodeOptions,
}

impl<'o> Decoder<'o> {
    /// The element loop for document context. `bytes` is the framed document
    /// slice, length prefix and terminator included.
    fn decode_doc(&self, bytes: &[u8], ctx: Ctx<'o>) -> Result<Document> {
        let mut reader = SliceReader::new(bytes);
        reader.read_i32()?; // the framed size, already validated

        let mut doc = Document::new();
        loop {
            let tag = reader.read_u8()?;
            if tag == 0x00 {
                if reader.position() != bytes.len() {
                    return Err(Error::malformed_bson(format!(
                        "document terminated at offset {} before its declared size {}",
                        reader.position(),
                        bytes.len()
                    )));
                }
                break;
            }

            let key = read_key(&mut reader, ctx.utf8)?;
            let value = self
                .decode_value(&mut reader, tag, &key, ctx)
                .map_err(|e| {
                    if e.key.is_none() && e.index.is_none() {
                        e.with_key(key.clone())
                    } else {
                        e
                    }
                })?;
            doc.insert(key, value);
        }

        Ok(doc)
    }

    /// The element loop for array context: the synthetic numeric keys are
    /// discarded and elements are collected positionally.
    fn decode_arr(&self, bytes: &[u8], ctx: Ctx<'o>) -> Result<Array> {
        let mut reader = SliceReader::new(bytes);
        reader.read_i32()?;

        let mut arr = Array::new();
        loop {
            let tag = reader.read_u8()?;
            if tag == 0x00 {
                if reader.position() != bytes.len() {
                    return Err(Error::malformed_bson(format!(
                        "array terminated at offset {} before its declared size {}",
                        reader.position(),
                        bytes.len()
                    )));
                }
                break;
            }

            let key = read_key(&mut reader, ctx.utf8)?;
            let index = arr.len();
            let value = self
                .decode_value(&mut reader, tag, &key, ctx)
                .map_err(|e| {
                    if e.key.is_none() && e.index.is_none() {
                        e.with_index(index)
                    } else {
                        e
                    }
                })?;
            arr.push(value);
        }

        Ok(arr)
    }

    /// Decodes an embedded document element, applying raw passthrough and
    /// the database-reference rewrite.
    fn decode_embedded_doc(&self, bytes: &[u8], ctx: Ctx<'o>) -> Result<Bson> {
        if ctx.raw {
            return Ok(Bson::RawDocument(RawDocumentBuf::from_bytes(
                bytes.to_vec(),
            )?));
        }
        Ok(reinterpret_dbref(self.decode_doc(bytes, ctx)?))
    }

    fn decode_value(
        &self,
        reader: &mut SliceReader<'_>,
        tag: u8,
        key: &str,
        ctx: Ctx<'o>,
    ) -> Result<Bson> {
        let validate = ctx.utf8.for_key(key);
        let child_ctx = Ctx {
            utf8: Utf8Policy::Global(validate),
            raw: ctx.raw,
        };

        let element_type = ElementType::from(tag).ok_or_else(|| {
            Error::unrecognized_element_type(tag)
        })?;

        Ok(match element_type {
            ElementType::Double => Bson::Double(reader.read_f64()?),
            ElementType::String => Bson::String(read_string(reader, validate)?),
            ElementType::EmbeddedDocument => {
                let doc = reader.read_subdocument()?;
                self.decode_embedded_doc(doc, child_ctx)?
            }
            ElementType::Array => {
                let doc = reader.read_subdocument()?;
                let ctx = Ctx {
                    raw: child_ctx.raw || self.options.fields_as_raw.contains(key),
                    ..child_ctx
                };
                Bson::Array(self.decode_arr(doc, ctx)?)
            }
            ElementType::Binary => self.decode_binary(reader)?,
            ElementType::Undefined => Bson::Undefined,
            ElementType::ObjectId => {
                let mut buf = [0u8; 12];
                buf.copy_from_slice(reader.read_exact(12)?);
                Bson::ObjectId(ObjectId::from_bytes(buf))
            }
            ElementType::Boolean => {
                let b = reader.read_u8()?;
                if b > 1 {
                    return Err(Error::malformed_bson(format!(
                        "boolean must be stored as 0 or 1, found {}",
                        b
                    )));
                }
                Bson::Boolean(b != 0)
            }
            ElementType::DateTime => Bson::DateTime(DateTime::from_millis(reader.read_i64()?)),
            ElementType::Null => Bson::Null,
            ElementType::RegularExpression => {
                let pattern = read_cstring(reader, validate)?;
                let options = read_cstring(reader, validate)?;
                let options = if self.options.bson_regexp {
                    options
                } else {
                    translate_regex_options(&options)
                };
                Bson::RegularExpression(Regex { pattern, options })
            }
            ElementType::DbPointer => {
                let namespace = read_string(reader, validate)?;
                let mut buf = [0u8; 12];
                buf.copy_from_slice(reader.read_exact(12)?);
                Bson::DbPointer(DbPointer {
                    namespace,
                    id: ObjectId::from_bytes(buf),
                })
            }
            ElementType::JavaScriptCode => Bson::JavaScriptCode(read_string(reader, validate)?),
            ElementType::Symbol => {
                let symbol = read_string(reader, validate)?;
                if self.options.promote_values {
                    Bson::String(symbol)
                } else {
                    Bson::Symbol(symbol)
                }
            }
            ElementType::JavaScriptCodeWithScope => {
                let start = reader.position();
                let total_size = reader.read_i32()?;
                if total_size < MIN_CODE_WITH_SCOPE_SIZE {
                    return Err(Error::malformed_bson(format!(
                        "code with scope size {} is too small",
                        total_size
                    )));
                }

                let code = read_string(reader, validate)?;
                let scope_bytes = reader.read_subdocument()?;
                let consumed = reader.position() - start;
                if total_size as usize != consumed {
                    return Err(Error::malformed_bson(format!(
                        "code with scope declared size {} does not match its contents ({} bytes)",
                        total_size, consumed
                    )));
                }

                let scope = self.decode_doc(scope_bytes, child_ctx)?;
                Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope })
            }
            ElementType::Int32 => Bson::Int32(reader.read_i32()?),
            ElementType::Timestamp => {
                // Two unsigned little-endian reads; reassembling the halves
                // with signed shifts would corrupt high-bit values.
                let increment = reader.read_u32()?;
                let time = reader.read_u32()?;
                Bson::Timestamp(Timestamp { time, increment })
            }
            ElementType::Int64 => {
                let n = reader.read_i64()?;
                if self.options.use_big_int64 {
                    Bson::Int64(n)
                } else if self.options.promote_longs && self.options.promote_values {
                    match i32::try_from(n) {
                        Ok(i) => Bson::Int32(i),
                        Err(_) => Bson::Int64(n),
                    }
                } else {
                    Bson::Int64(n)
                }
            }
            ElementType::Decimal128 => {
                let mut buf = [0u8; 16];
                buf.copy_from_slice(reader.read_exact(16)?);
                Bson::Decimal128(Decimal128::from_bytes(buf))
            }
            ElementType::MinKey => Bson::MinKey,
            ElementType::MaxKey => Bson::MaxKey,
        })
    }

    fn decode_binary(&self, reader: &mut SliceReader<'_>) -> Result<Bson> {
        let len = reader.read_i32()?;
        if len < 0 {
            return Err(Error::malformed_bson(format!(
                "binary length {} is negative",
                len
            )));
        }
        let len = len as usize;
        let subtype = BinarySubtype::from(reader.read_u8()?);
        let payload = reader.read_exact(len)?;

        let bytes = match subtype {
            BinarySubtype::BinaryOld => {
                if len < 4 {
                    return Err(Error::malformed_bson(
                        "sub-type 0x02 binary has no inner declared length",
                    ));
                }
                let inner =
                    i32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
                if inner < 0 || inner as usize != len - 4 {
                    return Err(Error::malformed_bson(format!(
                        "sub-type 0x02 binary declares inner length {} for a payload of {} bytes",
                        inner,
                        len - 4
                    )));
                }
                payload[4..].to_vec()
            }
            _ => payload.to_vec(),
        };

        Ok(Bson::Binary(Binary { subtype, bytes }))
    }
}

/// Reads an element key, applying the UTF-8 policy keyed by the key's own
/// (lossily decoded) spelling.
fn read_key(reader: &mut SliceReader<'_>, utf8: Utf8Policy<'_>) -> Result<String> {
    let bytes = reader.read_cstring_bytes()?;
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => {
            let lossy = String::from_utf8_lossy(bytes).into_owned();
            if utf8.for_key(&lossy) {
                Err(Error::utf8_encoding().with_key(lossy))
            } else {
                Ok(lossy)
            }
        }
    }
}

/// Reads a length-prefixed string: a signed 32-bit length inclusive of the
/// trailing null, the payload, and the null itself.
fn read_string(reader: &mut SliceReader<'_>, validate: bool) -> Result<String> {
    let len = reader.read_i32()?;
    if len < 1 {
        return Err(Error::malformed_string(format!(
            "string length {} is too small",
            len
        )));
    }
    let len = len as usize;
    if reader.remaining() < len {
        return Err(Error::malformed_string(format!(
            "string length {} exceeds remaining buffer length {}",
            len,
            reader.remaining()
        )));
    }

    let bytes = reader.read_exact(len - 1)?;
    if reader.read_u8()? != 0 {
        return Err(Error::malformed_string("string missing null terminator"));
    }

    decode_utf8(bytes, validate).map(Cow::into_owned)
}

fn read_cstring(reader: &mut SliceReader<'_>, validate: bool) -> Result<String> {
    let bytes = reader.read_cstring_bytes()?;
    decode_utf8(bytes, validate).map(Cow::into_owned)
}

fn decode_utf8(bytes: &[u8], validate: bool) -> Result<Cow<'_, str>> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(Cow::Borrowed(s)),
        Err(_) if validate => Err(Error::utf8_encoding()),
        Err(_) => Ok(String::from_utf8_lossy(bytes)),
    }
}

/// Translates stored regular expression options to the portable flag set:
/// `m` and `i` carry over, `s` becomes `g`, anything else is dropped.
fn translate_regex_options(options: &str) -> String {
    options
        .chars()
        .filter_map(|c| match c {
            'm' | 'i' => Some(c),
            's' => Some('g'),
            _ => None,
        })
        .collect()
}

/// Rewrites a decoded document into a [`DbRef`] when it has the reference
/// shape: a string `$ref`, any `$id`, an optional string `$db`, and no other
/// `$`-prefixed keys.
fn reinterpret_dbref(mut doc: Document) -> Bson {
    if doc
        .iter()
        .any(|(k, _)| k.starts_with('$') && k != "$ref" && k != "$id" && k != "$db")
    {
        return Bson::Document(doc);
    }
    if !matches!(doc.get("$ref"), Some(Bson::String(_))) || doc.get("$id").is_none() {
        return Bson::Document(doc);
    }
    if doc.contains_key("$db") && !matches!(doc.get("$db"), Some(Bson::String(_))) {
        return Bson::Document(doc);
    }

    let Some(Bson::String(collection)) = doc.remove("$ref") else {
        return Bson::Document(doc);
    };
    let Some(id) = doc.remove("$id") else {
        return Bson::Document(doc);
    };
    let db = match doc.remove("$db") {
        Some(Bson::String(db)) => Some(db),
        _ => None,
    };

    Bson::DbRef(DbRef {
        collection,
        id: Box::new(id),
        db,
        extra: doc,
    })
}
