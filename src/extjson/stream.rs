//! The chunk-producing Extended JSON encoder.
//!
//! Traversal is driven by an explicit stack of frames rather than recursion:
//! each call to [`Iterator::next`] advances the walk until the internal
//! buffer passes a soft chunk size at an element boundary, then yields it.
//! Typed wrappers are always written whole, so a chunk boundary never falls
//! inside one.

use std::fmt::Write as _;
use std::mem;

use serde_json::Value;

use crate::{
    bson::{Array, Bson},
    document::Document,
    error::{Error, Result},
    extjson::{EncodeOptions, Replacer, Stringifier},
};

/// Soft chunk size: the buffer is yielded at the next element boundary after
/// growing past this.
const CHUNK_SIZE: usize = 64 * 1024;

/// The root of the traversal.
pub(crate) enum Root<'a> {
    Value(&'a Bson),
    Document(&'a Document),
    Taken,
}

/// A value handle that is either borrowed from the input tree or owned
/// (produced by a replacer or decoded from a raw sub-document).
enum ValueCow<'a> {
    Borrowed(&'a Bson),
    Owned(Bson),
}

enum DocRef<'a> {
    Borrowed(&'a Document),
    Owned(Document),
}

impl DocRef<'_> {
    fn get(&self) -> &Document {
        match self {
            DocRef::Borrowed(d) => d,
            DocRef::Owned(d) => d,
        }
    }
}

enum ArrRef<'a> {
    Borrowed(&'a Array),
    Owned(Array),
}

impl ArrRef<'_> {
    fn get(&self) -> &Array {
        match self {
            ArrRef::Borrowed(a) => a,
            ArrRef::Owned(a) => a,
        }
    }
}

enum FrameKind<'a> {
    Doc {
        doc: DocRef<'a>,
        /// Entry positions that survived allow-list filtering, if one is set.
        keys: Option<Vec<usize>>,
    },
    Arr {
        arr: ArrRef<'a>,
    },
}

struct Frame<'a> {
    kind: FrameKind<'a>,
    /// Cursor over the (filtered) entries.
    idx: usize,
    /// Entries actually written; drives separator and closing-bracket
    /// placement, which `idx` cannot once a replacer omits entries.
    emitted: usize,
}

impl Frame<'_> {
    fn container_ptr(&self) -> *const () {
        match &self.kind {
            FrameKind::Doc { doc, .. } => doc.get() as *const Document as *const (),
            FrameKind::Arr { arr } => arr.get() as *const Array as *const (),
        }
    }

    fn len(&self) -> usize {
        match &self.kind {
            FrameKind::Doc { doc, keys } => keys.as_ref().map_or(doc.get().len(), Vec::len),
            FrameKind::Arr { arr } => arr.get().len(),
        }
    }
}

/// One entry pulled out of the top frame, fully detached from the stack
/// borrow: the key is cloned and the value is either a borrow of the input
/// tree or a clone out of an owned container.
enum Entry<'a> {
    Pair(String, ValueCow<'a>),
    Element(usize, ValueCow<'a>),
}

/// A finite, non-restartable lazy sequence of Extended JSON text chunks.
///
/// The concatenation of all yielded chunks equals the non-streaming encoding
/// of the same input with the same options. After yielding an error the
/// sequence is exhausted.
pub struct ExtendedJsonStream<'a> {
    root: Root<'a>,
    stack: Vec<Frame<'a>>,
    buf: String,
    options: EncodeOptions,
    indent: Option<String>,
    replacer: Option<Replacer<'a>>,
    started: bool,
    done: bool,
}

impl<'a> ExtendedJsonStream<'a> {
    pub(crate) fn new(root: Root<'a>, config: Stringifier<'a>) -> Self {
        let (options, indent, replacer) = config.into_parts();
        Self {
            root,
            stack: Vec::new(),
            buf: String::new(),
            options,
            indent,
            replacer,
            started: false,
            done: false,
        }
    }

    /// Advances the traversal by one element, entry, or bracket. Returns
    /// `true` once the walk is complete.
    fn step(&mut self) -> Result<bool> {
        if !self.started {
            self.started = true;
            return self.start();
        }
        if self.stack.is_empty() {
            return Ok(true);
        }
        self.advance_top()?;
        Ok(false)
    }

    fn start(&mut self) -> Result<bool> {
        match mem::replace(&mut self.root, Root::Taken) {
            Root::Value(value) => {
                let node = match &mut self.replacer {
                    Some(Replacer::Function(f)) => match f("", value) {
                        Some(replaced) => ValueCow::Owned(replaced),
                        None => return Ok(true),
                    },
                    _ => ValueCow::Borrowed(value),
                };
                self.emit_node(node)?;
                Ok(false)
            }
            Root::Document(doc) => {
                if let Some(Replacer::Function(_)) = &self.replacer {
                    // The replacer sees the root as a value under the empty
                    // key, which requires materializing it once.
                    let owned = Bson::Document(doc.clone());
                    let Some(Replacer::Function(f)) = &mut self.replacer else {
                        return Ok(true);
                    };
                    match f("", &owned) {
                        Some(replaced) => self.emit_node(ValueCow::Owned(replaced))?,
                        None => return Ok(true),
                    }
                } else {
                    self.push_doc(DocRef::Borrowed(doc))?;
                }
                Ok(false)
            }
            Root::Taken => Ok(true),
        }
    }

    /// Writes the next entry of the top frame, or its closing bracket.
    fn advance_top(&mut self) -> Result<()> {
        let depth = self.stack.len();
        let Some(top) = self.stack.last_mut() else {
            return Ok(());
        };

        if top.idx >= top.len() {
            let emitted = top.emitted;
            let closer = match top.kind {
                FrameKind::Doc { .. } => '}',
                FrameKind::Arr { .. } => ']',
            };
            self.stack.pop();
            if emitted > 0 {
                self.write_newline_indent(self.stack.len());
            }
            self.buf.push(closer);
            return Ok(());
        }

        let cursor = top.idx;
        top.idx += 1;

        let entry = match &top.kind {
            FrameKind::Doc { doc, keys } => {
                let entry_idx = keys.as_ref().map_or(cursor, |k| k[cursor]);
                match doc_entry(doc, entry_idx) {
                    Some(entry) => entry,
                    None => return Ok(()),
                }
            }
            FrameKind::Arr { arr } => match arr_element(arr, cursor) {
                Some(entry) => entry,
                None => return Ok(()),
            },
        };
        let was_first = top.emitted == 0;

        match entry {
            Entry::Pair(key, value) => {
                let value = match &mut self.replacer {
                    Some(Replacer::Function(f)) => match f(&key, value.as_bson()) {
                        Some(replaced) => ValueCow::Owned(replaced),
                        None => return Ok(()), // entry omitted
                    },
                    _ => value,
                };

                self.bump_emitted();
                if !was_first {
                    self.buf.push(',');
                }
                self.write_newline_indent(depth);
                write_json_string(&mut self.buf, &key);
                self.buf.push(':');
                if self.indent.is_some() {
                    self.buf.push(' ');
                }
                self.emit_node(value)
            }
            Entry::Element(index, value) => {
                let value = match &mut self.replacer {
                    Some(Replacer::Function(f)) => {
                        match f(&index.to_string(), value.as_bson()) {
                            Some(replaced) => Some(ValueCow::Owned(replaced)),
                            None => None, // array slots render as null
                        }
                    }
                    _ => Some(value),
                };

                self.bump_emitted();
                if !was_first {
                    self.buf.push(',');
                }
                self.write_newline_indent(depth);
                match value {
                    Some(value) => self.emit_node(value),
                    None => {
                        self.buf.push_str("null");
                        Ok(())
                    }
                }
            }
        }
    }

    fn bump_emitted(&mut self) {
        if let Some(top) = self.stack.last_mut() {
            top.emitted += 1;
        }
    }

    fn write_newline_indent(&mut self, depth: usize) {
        if let Some(unit) = &self.indent {
            self.buf.push('\n');
            for _ in 0..depth {
                self.buf.push_str(unit);
            }
        }
    }

    /// Routes a value: containers are pushed as frames (with the opening
    /// bracket written immediately), everything else is written whole.
    fn emit_node(&mut self, node: ValueCow<'a>) -> Result<()> {
        match node {
            ValueCow::Borrowed(Bson::Document(doc)) => self.push_doc(DocRef::Borrowed(doc)),
            ValueCow::Borrowed(Bson::Array(arr)) => self.push_arr(ArrRef::Borrowed(arr)),
            ValueCow::Borrowed(Bson::RawDocument(raw)) => {
                self.push_doc(DocRef::Owned(raw.decode()?))
            }
            ValueCow::Borrowed(scalar) => self.write_scalar(scalar),
            ValueCow::Owned(Bson::Document(doc)) => self.push_doc(DocRef::Owned(doc)),
            ValueCow::Owned(Bson::Array(arr)) => self.push_arr(ArrRef::Owned(arr)),
            ValueCow::Owned(Bson::RawDocument(raw)) => self.push_doc(DocRef::Owned(raw.decode()?)),
            ValueCow::Owned(ref scalar) => self.write_scalar(scalar),
        }
    }

    fn check_cycle(&self, candidate: *const ()) -> Result<()> {
        if self.stack.iter().any(|f| f.container_ptr() == candidate) {
            return Err(Error::circular_structure());
        }
        Ok(())
    }

    fn push_doc(&mut self, doc: DocRef<'a>) -> Result<()> {
        self.check_cycle(doc.get() as *const Document as *const ())?;

        let keys = match &self.replacer {
            Some(Replacer::AllowList(allowed)) => {
                let d = doc.get();
                Some(
                    (0..d.len())
                        .filter(|&i| {
                            d.get_index(i)
                                .map_or(false, |(k, _)| allowed.iter().any(|a| a == k))
                        })
                        .collect(),
                )
            }
            _ => None,
        };

        self.buf.push('{');
        self.stack.push(Frame {
            kind: FrameKind::Doc { doc, keys },
            idx: 0,
            emitted: 0,
        });
        Ok(())
    }

    fn push_arr(&mut self, arr: ArrRef<'a>) -> Result<()> {
        self.check_cycle(arr.get() as *const Array as *const ())?;

        self.buf.push('[');
        self.stack.push(Frame {
            kind: FrameKind::Arr { arr },
            idx: 0,
            emitted: 0,
        });
        Ok(())
    }

    /// Writes a non-container value, typed wrapper projections included, in
    /// one piece at the current depth.
    fn write_scalar(&mut self, value: &Bson) -> Result<()> {
        let projected = value.extjson_value(&self.options)?;
        let depth = self.stack.len();
        write_json_value(
            &mut self.buf,
            &projected,
            self.indent.as_deref(),
            depth,
        );
        Ok(())
    }
}

impl ValueCow<'_> {
    fn as_bson(&self) -> &Bson {
        match self {
            ValueCow::Borrowed(b) => b,
            ValueCow::Owned(b) => b,
        }
    }
}

/// Detaches the entry at `idx` from a document frame. Borrowed containers
/// hand out borrows of the input tree; owned ones (replacer output, decoded
/// raw documents) clone the child out.
fn doc_entry<'a>(doc: &DocRef<'a>, idx: usize) -> Option<Entry<'a>> {
    match doc {
        DocRef::Borrowed(d) => d
            .get_index(idx)
            .map(|(k, v)| Entry::Pair(k.clone(), ValueCow::Borrowed(v))),
        DocRef::Owned(d) => d
            .get_index(idx)
            .map(|(k, v)| Entry::Pair(k.clone(), ValueCow::Owned(v.clone()))),
    }
}

fn arr_element<'a>(arr: &ArrRef<'a>, idx: usize) -> Option<Entry<'a>> {
    match arr {
        ArrRef::Borrowed(a) => a.get(idx).map(|v| Entry::Element(idx, ValueCow::Borrowed(v))),
        ArrRef::Owned(a) => a
            .get(idx)
            .map(|v| Entry::Element(idx, ValueCow::Owned(v.clone()))),
    }
}

impl Iterator for ExtendedJsonStream<'_> {
    type Item = Result<String>;

    fn next(&mut self) -> Option<Result<String>> {
        if self.done {
            return None;
        }

        loop {
            match self.step() {
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
                Ok(true) => {
                    self.done = true;
                    if self.buf.is_empty() {
                        return None;
                    }
                    return Some(Ok(mem::take(&mut self.buf)));
                }
                Ok(false) => {
                    if self.buf.len() >= CHUNK_SIZE {
                        return Some(Ok(mem::take(&mut self.buf)));
                    }
                }
            }
        }
    }
}

impl std::iter::FusedIterator for ExtendedJsonStream<'_> {}

/// Writes a `serde_json::Value` with this module's indentation rules,
/// starting at the given depth. Scalar formatting defers to the value's own
/// `Display`, keeping streamed bytes identical to `serde_json` output.
fn write_json_value(buf: &mut String, value: &Value, indent: Option<&str>, depth: usize) {
    match value {
        Value::Null => buf.push_str("null"),
        Value::Bool(true) => buf.push_str("true"),
        Value::Bool(false) => buf.push_str("false"),
        Value::Number(n) => {
            let _ = write!(buf, "{}", n);
        }
        Value::String(s) => write_json_string(buf, s),
        Value::Array(items) => {
            if items.is_empty() {
                buf.push_str("[]");
                return;
            }
            buf.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                newline_indent(buf, indent, depth + 1);
                write_json_value(buf, item, indent, depth + 1);
            }
            newline_indent(buf, indent, depth);
            buf.push(']');
        }
        Value::Object(map) => {
            if map.is_empty() {
                buf.push_str("{}");
                return;
            }
            buf.push('{');
            for (i, (k, v)) in map.iter().enumerate() {
                if i > 0 {
                    buf.push(',');
                }
                newline_indent(buf, indent, depth + 1);
                write_json_string(buf, k);
                buf.push(':');
                if indent.is_some() {
                    buf.push(' ');
                }
                write_json_value(buf, v, indent, depth + 1);
            }
            newline_indent(buf, indent, depth);
            buf.push('}');
        }
    }
}

fn newline_indent(buf: &mut String, indent: Option<&str>, depth: usize) {
    if let Some(unit) = indent {
        buf.push('\n');
        for _ in 0..depth {
            buf.push_str(unit);
        }
    }
}

/// JSON string escaping matching `serde_json`: quotes, backslashes, and
/// control characters only.
fn write_json_string(buf: &mut String, s: &str) {
    buf.push('"');
    for c in s.chars() {
        match c {
            '"' => buf.push_str("\\\""),
            '\\' => buf.push_str("\\\\"),
            '\u{08}' => buf.push_str("\\b"),
            '\t' => buf.push_str("\\t"),
            '\n' => buf.push_str("\\n"),
            '\u{0C}' => buf.push_str("\\f"),
            '\r' => buf.push_str("\\r"),
            c if (c as u32) < 0x20 => {
                let _ = write!(buf, "\\u{:04x}", c as u32);
            }
            c => buf.push(c),
        }
    }
    buf.push('"');
}
