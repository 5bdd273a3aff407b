//! BSON, short for Binary JSON, is a binary-encoded serialization of JSON-like documents.
//! Like JSON, BSON supports the embedding of documents and arrays within other documents
//! and arrays. BSON also contains extensions that allow representation of data types that
//! are not part of the JSON spec. For example, BSON has a datetime type and a binary data type.
//!
//! ```text
//! // JSON equivalent
//! {"hello": "world"}
//!
//! // BSON encoding
//! \x16\x00\x00\x00                   // total document size
//! \x02                               // 0x02 = type String
//! hello\x00                          // field name
//! \x06\x00\x00\x00world\x00          // field value
//! \x00                               // 0x00 = type EOO ('end of object')
//! ```
//!
//! This crate covers one direction of the wire format plus its textual
//! projection: decoding BSON bytes into a typed document tree, and encoding
//! such a tree as [Extended JSON](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/).
//! Encoding is incremental, producing a lazy sequence of string chunks, so
//! that very large documents never have to be materialized as one string.
//!
//! For more information about BSON itself, see [bsonspec.org](http://bsonspec.org).
//!
//! ## Decoding BSON
//!
//! [`Document`]s are decoded from byte buffers in a single pass with strict
//! structural validation:
//!
//! ```rust
//! use bson_stream::{doc, Document};
//!
//! # fn main() -> bson_stream::error::Result<()> {
//! let bytes = hex::decode("0C0000001069000100000000").unwrap();
//! let decoded = Document::decode_from_slice(&bytes)?; // { "i": 1 }
//! assert_eq!(decoded, doc! { "i": 1 });
//! # Ok(())
//! # }
//! ```
//!
//! Decoding is configurable through [`de::DecodeOptions`]: numeric
//! promotion, per-key UTF-8 validation, and raw passthrough of embedded
//! documents are all controlled there. Embedded documents matching the
//! database-reference shape (`$ref`/`$id`, optionally `$db`) surface as
//! [`DbRef`] values.
//!
//! ## Encoding Extended JSON
//!
//! The encoder walks a tree with an explicit stack and yields string chunks
//! whose concatenation equals the non-streaming encoding:
//!
//! ```rust
//! use bson_stream::{bson, extjson::Stringifier};
//!
//! # fn main() -> bson_stream::error::Result<()> {
//! let value = bson!({ "a": 1, "b": "hello", "c": true });
//!
//! let mut text = String::new();
//! for chunk in Stringifier::new().stream(&value) {
//!     text.push_str(&chunk?);
//! }
//! assert_eq!(text, r#"{"a":1,"b":"hello","c":true}"#);
//! # Ok(())
//! # }
//! ```
//!
//! The relaxed flavor is the default; [`extjson::Stringifier::relaxed`]
//! disables it in favor of the lossless canonical flavor, and
//! [`extjson::Stringifier::legacy`] switches binary and regular expression
//! values to their legacy projections. Indentation and `JSON.stringify`
//! style replacers (a filtering function or a key allow-list) are supported.
//!
//! ## Building documents
//!
//! The [`doc!`] and [`bson!`] macros build trees literally:
//!
//! ```rust
//! use bson_stream::doc;
//!
//! let doc = doc! {
//!    "hello": "world",
//!    "int": 5,
//!    "subdoc": { "cat": true },
//! };
//! assert_eq!(doc.get_str("hello").unwrap(), "world");
//! ```
//!
//! ## Minimum supported Rust version (MSRV)
//!
//! The MSRV for this crate is currently 1.81. This will rarely be increased,
//! and if it ever is, it will only happen in a minor or major version
//! release.

#![allow(clippy::cognitive_complexity, clippy::derive_partial_eq_without_eq)]

#[doc(inline)]
pub use self::{
    binary::Binary,
    bson::{Array, Bson, DbPointer, DbRef, JavaScriptCodeWithScope, Regex, Timestamp},
    datetime::DateTime,
    decimal128::Decimal128,
    document::Document,
    oid::ObjectId,
    raw::RawDocumentBuf,
};

#[macro_use]
mod macros;
mod base64;
pub mod binary;
mod bson;
pub mod datetime;
pub mod de;
pub mod decimal128;
pub mod document;
pub mod error;
pub mod extjson;
pub mod oid;
pub mod raw;
pub mod spec;

#[cfg(test)]
mod tests;
