//! BSON definition

mod json;

use std::fmt::{self, Debug, Display};

use crate::{
    binary::Binary,
    datetime::DateTime,
    decimal128::Decimal128,
    document::Document,
    oid::ObjectId,
    raw::RawDocumentBuf,
    spec::ElementType,
};

/// Possible BSON value types.
#[derive(Clone, PartialEq)]
pub enum Bson {
    /// 64-bit binary floating point
    Double(f64),
    /// String
    String(String),
    /// Array
    Array(Array),
    /// Embedded document
    Document(Document),
    /// Boolean value
    Boolean(bool),
    /// Null value
    Null,
    /// Regular expression
    RegularExpression(Regex),
    /// JavaScript code
    JavaScriptCode(String),
    /// JavaScript code with scope
    JavaScriptCodeWithScope(JavaScriptCodeWithScope),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Timestamp
    Timestamp(Timestamp),
    /// Binary data
    Binary(Binary),
    /// [ObjectId](http://dochub.mongodb.org/core/objectids)
    ObjectId(ObjectId),
    /// UTC datetime
    DateTime(DateTime),
    /// Symbol (Deprecated)
    Symbol(String),
    /// [128-bit decimal floating point](https://github.com/mongodb/specifications/blob/master/source/bson-decimal128/decimal128.rst)
    Decimal128(Decimal128),
    /// Undefined value (Deprecated)
    Undefined,
    /// Max key
    MaxKey,
    /// Min key
    MinKey,
    /// DBPointer (Deprecated)
    DbPointer(DbPointer),
    /// A database reference, recognized on decode from its `$ref`/`$id` shape
    DbRef(DbRef),
    /// An embedded document kept as unparsed bytes by the `raw` decoding
    /// options
    RawDocument(RawDocumentBuf),
}

/// Alias for `Vec<Bson>`.
pub type Array = Vec<Bson>;

impl Default for Bson {
    fn default() -> Self {
        Bson::Null
    }
}

impl Debug for Bson {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bson::Double(p) => write!(f, "Double({:?})", p),
            Bson::String(s) => write!(f, "String({:?})", s),
            Bson::Array(vec) => {
                write!(f, "Array(")?;
                Debug::fmt(vec, f)?;
                write!(f, ")")
            }
            Bson::Document(doc) => Debug::fmt(doc, f),
            Bson::Boolean(b) => write!(f, "Boolean({:?})", b),
            Bson::Null => write!(f, "Null"),
            Bson::RegularExpression(regex) => Debug::fmt(regex, f),
            Bson::JavaScriptCode(s) => write!(f, "JavaScriptCode({:?})", s),
            Bson::JavaScriptCodeWithScope(code) => Debug::fmt(code, f),
            Bson::Int32(v) => write!(f, "Int32({:?})", v),
            Bson::Int64(v) => write!(f, "Int64({:?})", v),
            Bson::Timestamp(t) => Debug::fmt(t, f),
            Bson::Binary(b) => Debug::fmt(b, f),
            Bson::ObjectId(id) => Debug::fmt(id, f),
            Bson::DateTime(date_time) => Debug::fmt(date_time, f),
            Bson::Symbol(sym) => write!(f, "Symbol({:?})", sym),
            Bson::Decimal128(d) => Debug::fmt(d, f),
            Bson::Undefined => write!(f, "Undefined"),
            Bson::MinKey => write!(f, "MinKey"),
            Bson::MaxKey => write!(f, "MaxKey"),
            Bson::DbPointer(p) => Debug::fmt(p, f),
            Bson::DbRef(d) => Debug::fmt(d, f),
            Bson::RawDocument(d) => Debug::fmt(d, f),
        }
    }
}

impl Display for Bson {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bson::Double(f) => write!(fmt, "{}", f),
            Bson::String(s) => write!(fmt, "\"{}\"", s),
            Bson::Array(vec) => {
                fmt.write_str("[")?;

                let mut first = true;
                for bson in vec {
                    if !first {
                        fmt.write_str(", ")?;
                    }

                    write!(fmt, "{}", bson)?;
                    first = false;
                }

                fmt.write_str("]")
            }
            Bson::Document(doc) => write!(fmt, "{}", doc),
            Bson::Boolean(b) => write!(fmt, "{}", b),
            Bson::Null => write!(fmt, "null"),
            Bson::RegularExpression(regex) => write!(fmt, "{}", regex),
            Bson::JavaScriptCode(code) | Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, .. }) => {
                fmt.write_str(code)
            }
            Bson::Int32(i) => write!(fmt, "{}", i),
            Bson::Int64(i) => write!(fmt, "{}", i),
            Bson::Timestamp(t) => write!(fmt, "{}", t),
            Bson::Binary(b) => write!(fmt, "{}", b),
            Bson::ObjectId(id) => write!(fmt, "ObjectId(\"{}\")", id),
            Bson::DateTime(date_time) => write!(fmt, "DateTime(\"{}\")", date_time),
            Bson::Symbol(sym) => write!(fmt, "Symbol(\"{}\")", sym),
            Bson::Decimal128(d) => write!(fmt, "{}", d),
            Bson::Undefined => fmt.write_str("undefined"),
            Bson::MinKey => fmt.write_str("MinKey"),
            Bson::MaxKey => fmt.write_str("MaxKey"),
            Bson::DbPointer(p) => write!(fmt, "{}", p),
            Bson::DbRef(d) => write!(fmt, "{}", d),
            Bson::RawDocument(d) => write!(fmt, "{:?}", d),
        }
    }
}

impl Bson {
    /// Get the `ElementType` of this value.
    ///
    /// Values that only exist after decoding (database references and raw
    /// sub-documents) report [`ElementType::EmbeddedDocument`], the type of
    /// their wire representation.
    pub fn element_type(&self) -> ElementType {
        match self {
            Bson::Double(..) => ElementType::Double,
            Bson::String(..) => ElementType::String,
            Bson::Array(..) => ElementType::Array,
            Bson::Document(..) => ElementType::EmbeddedDocument,
            Bson::Boolean(..) => ElementType::Boolean,
            Bson::Null => ElementType::Null,
            Bson::RegularExpression(..) => ElementType::RegularExpression,
            Bson::JavaScriptCode(..) => ElementType::JavaScriptCode,
            Bson::JavaScriptCodeWithScope(..) => ElementType::JavaScriptCodeWithScope,
            Bson::Int32(..) => ElementType::Int32,
            Bson::Int64(..) => ElementType::Int64,
            Bson::Timestamp(..) => ElementType::Timestamp,
            Bson::Binary(..) => ElementType::Binary,
            Bson::ObjectId(..) => ElementType::ObjectId,
            Bson::DateTime(..) => ElementType::DateTime,
            Bson::Symbol(..) => ElementType::Symbol,
            Bson::Decimal128(..) => ElementType::Decimal128,
            Bson::Undefined => ElementType::Undefined,
            Bson::MaxKey => ElementType::MaxKey,
            Bson::MinKey => ElementType::MinKey,
            Bson::DbPointer(..) => ElementType::DbPointer,
            Bson::DbRef(..) => ElementType::EmbeddedDocument,
            Bson::RawDocument(..) => ElementType::EmbeddedDocument,
        }
    }

    /// If `self` is `Double`, returns its value. Returns `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// If `self` is `String`, returns its value. Returns `None` otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s),
            _ => None,
        }
    }

    /// If `self` is `Array`, returns its value. Returns `None` otherwise.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Bson::Array(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is `Document`, returns its value. Returns `None` otherwise.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Bson::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// If `self` is `Boolean`, returns its value. Returns `None` otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// If `self` is `Int32`, returns its value. Returns `None` otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Bson::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// If `self` is `Int32` or `Int64`, returns its value widened to an
    /// `i64`. Returns `None` otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Int32(v) => Some(i64::from(*v)),
            Bson::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// If `self` is `ObjectId`, returns its value. Returns `None` otherwise.
    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            Bson::ObjectId(v) => Some(*v),
            _ => None,
        }
    }

    /// If `self` is `DateTime`, returns its value. Returns `None` otherwise.
    pub fn as_datetime(&self) -> Option<&DateTime> {
        match self {
            Bson::DateTime(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is `Symbol`, returns its value. Returns `None` otherwise.
    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Bson::Symbol(v) => Some(v),
            _ => None,
        }
    }

    /// If `self` is `Timestamp`, returns its value. Returns `None` otherwise.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Bson::Timestamp(timestamp) => Some(*timestamp),
            _ => None,
        }
    }

    /// If `self` is `Null`, returns `()`. Returns `None` otherwise.
    pub fn as_null(&self) -> Option<()> {
        match self {
            Bson::Null => Some(()),
            _ => None,
        }
    }
}

impl From<f32> for Bson {
    fn from(a: f32) -> Bson {
        Bson::Double(a.into())
    }
}

impl From<f64> for Bson {
    fn from(a: f64) -> Bson {
        Bson::Double(a)
    }
}

impl From<&str> for Bson {
    fn from(s: &str) -> Bson {
        Bson::String(s.to_owned())
    }
}

impl From<String> for Bson {
    fn from(a: String) -> Bson {
        Bson::String(a)
    }
}

impl From<&String> for Bson {
    fn from(a: &String) -> Bson {
        Bson::String(a.clone())
    }
}

impl From<bool> for Bson {
    fn from(a: bool) -> Bson {
        Bson::Boolean(a)
    }
}

impl From<i32> for Bson {
    fn from(a: i32) -> Bson {
        Bson::Int32(a)
    }
}

impl From<i64> for Bson {
    fn from(a: i64) -> Bson {
        Bson::Int64(a)
    }
}

impl From<u8> for Bson {
    fn from(a: u8) -> Bson {
        Bson::Int32(a.into())
    }
}

impl From<u16> for Bson {
    fn from(a: u16) -> Bson {
        Bson::Int32(a.into())
    }
}

impl From<u32> for Bson {
    fn from(a: u32) -> Bson {
        Bson::Int64(a.into())
    }
}

impl From<Document> for Bson {
    fn from(a: Document) -> Bson {
        Bson::Document(a)
    }
}

impl From<Regex> for Bson {
    fn from(regex: Regex) -> Bson {
        Bson::RegularExpression(regex)
    }
}

impl From<JavaScriptCodeWithScope> for Bson {
    fn from(code_with_scope: JavaScriptCodeWithScope) -> Bson {
        Bson::JavaScriptCodeWithScope(code_with_scope)
    }
}

impl From<Binary> for Bson {
    fn from(binary: Binary) -> Bson {
        Bson::Binary(binary)
    }
}

impl From<Timestamp> for Bson {
    fn from(ts: Timestamp) -> Bson {
        Bson::Timestamp(ts)
    }
}

impl From<ObjectId> for Bson {
    fn from(id: ObjectId) -> Bson {
        Bson::ObjectId(id)
    }
}

impl From<DateTime> for Bson {
    fn from(dt: DateTime) -> Bson {
        Bson::DateTime(dt)
    }
}

impl From<Decimal128> for Bson {
    fn from(d: Decimal128) -> Bson {
        Bson::Decimal128(d)
    }
}

impl From<DbPointer> for Bson {
    fn from(p: DbPointer) -> Bson {
        Bson::DbPointer(p)
    }
}

impl From<DbRef> for Bson {
    fn from(d: DbRef) -> Bson {
        Bson::DbRef(d)
    }
}

impl From<RawDocumentBuf> for Bson {
    fn from(d: RawDocumentBuf) -> Bson {
        Bson::RawDocument(d)
    }
}

impl<T: Into<Bson>> From<Vec<T>> for Bson {
    fn from(v: Vec<T>) -> Bson {
        Bson::Array(v.into_iter().map(|val| val.into()).collect())
    }
}

impl<T: Into<Bson>> From<Option<T>> for Bson {
    fn from(a: Option<T>) -> Bson {
        match a {
            None => Bson::Null,
            Some(t) => t.into(),
        }
    }
}

/// Represents a BSON timestamp value.
///
/// Both fields are unsigned; the wire stores the increment in the low four
/// bytes and the time in the high four.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    /// The number of seconds since the Unix epoch.
    pub time: u32,

    /// An incrementing ordinal for operations within a given second.
    pub increment: u32,
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Timestamp({}, {})", self.time, self.increment)
    }
}

/// Represents a BSON regular expression value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    /// The regex pattern to match.
    pub pattern: String,

    /// The options for the regex.
    ///
    /// Options are identified by characters, which must be stored in
    /// alphabetical order. Valid options are 'i' for case insensitive
    /// matching, 'm' for multiline matching, 'x' for verbose mode, 'l' to
    /// make \w, \W, etc. locale dependent, 's' for dotall mode ('.' matches
    /// everything), and 'u' to make \w, \W, etc. match unicode.
    pub options: String,
}

impl Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.options)
    }
}

/// Represents a BSON code with scope value.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptCodeWithScope {
    /// The JavaScript code.
    pub code: String,

    /// The scope document containing variable bindings.
    pub scope: Document,
}

impl Display for JavaScriptCodeWithScope {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.code)
    }
}

/// Represents a DBPointer. (Deprecated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPointer {
    /// The namespace being pointed into.
    pub namespace: String,

    /// The id of the document being pointed at.
    pub id: ObjectId,
}

impl Display for DbPointer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DBPointer({}, {})", self.namespace, self.id)
    }
}

/// A reference to a document in another collection.
///
/// The decoder produces this value for any embedded document whose only
/// `$`-prefixed keys are `$ref` (a string), `$id`, and optionally `$db` (a
/// string); any remaining keys are carried in `extra`.
#[derive(Debug, Clone, PartialEq)]
pub struct DbRef {
    /// The name of the collection the referenced document lives in.
    pub collection: String,

    /// The `_id` of the referenced document.
    pub id: Box<Bson>,

    /// The database the referenced document lives in, if not the current one.
    pub db: Option<String>,

    /// Any additional (non-`$`-prefixed) fields of the reference document,
    /// in their original order.
    pub extra: Document,
}

impl Display for DbRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DBRef(\"{}\", {})", self.collection, self.id)?;
        if let Some(db) = self.db.as_deref() {
            write!(f, " in \"{}\"", db)?;
        }
        Ok(())
    }
}
