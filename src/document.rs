//! A BSON document represented as an associative map with insertion ordering.

use std::{
    fmt::{self, Debug, Display, Formatter},
    iter::{Extend, FromIterator, IntoIterator},
};

use ahash::RandomState;
use indexmap::IndexMap;

use crate::{
    bson::{Array, Bson, Timestamp},
    datetime::DateTime,
    error::{Error, Result},
    oid::ObjectId,
    spec::ElementType,
    Binary,
    Decimal128,
};

/// A BSON document represented as an associative map with insertion ordering.
#[derive(Clone, PartialEq, Default)]
pub struct Document {
    inner: IndexMap<String, Bson, RandomState>,
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str("{")?;

        let mut first = true;
        for (k, v) in self {
            if first {
                first = false;
                fmt.write_str(" ")?;
            } else {
                fmt.write_str(", ")?;
            }

            write!(fmt, "\"{}\": {}", k, v)?;
        }

        write!(fmt, "{}}}", if !first { " " } else { "" })
    }
}

impl Debug for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "Document(")?;
        Debug::fmt(&self.inner, fmt)?;
        write!(fmt, ")")
    }
}

/// An iterator over Document entries.
pub struct IntoIter {
    inner: indexmap::map::IntoIter<String, Bson>,
}

/// An owning iterator over Document entries.
pub struct Iter<'a> {
    inner: indexmap::map::Iter<'a, String, Bson>,
}

/// An iterator over a Document's keys.
pub struct Keys<'a> {
    inner: indexmap::map::Keys<'a, String, Bson>,
}

/// An iterator over a Document's values.
pub struct Values<'a> {
    inner: indexmap::map::Values<'a, String, Bson>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a String;

    fn next(&mut self) -> Option<&'a String> {
        self.inner.next()
    }
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a Bson;

    fn next(&mut self) -> Option<&'a Bson> {
        self.inner.next()
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.inner.into_iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Bson);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.inner.iter(),
        }
    }
}

impl FromIterator<(String, Bson)> for Document {
    fn from_iter<T: IntoIterator<Item = (String, Bson)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl Iterator for IntoIter {
    type Item = (String, Bson);

    fn next(&mut self) -> Option<(String, Bson)> {
        self.inner.next()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a String, &'a Bson);

    fn next(&mut self) -> Option<(&'a String, &'a Bson)> {
        self.inner.next()
    }
}

impl Document {
    /// Creates a new empty Document.
    pub fn new() -> Document {
        Document {
            inner: IndexMap::default(),
        }
    }

    /// Decodes a BSON document from a byte slice with default options.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Document> {
        crate::de::decode_document(bytes, &crate::de::DecodeOptions::default())
    }

    /// Decodes a BSON document from a byte slice with the given options.
    pub fn decode_from_slice_with_options(
        bytes: &[u8],
        options: &crate::de::DecodeOptions,
    ) -> Result<Document> {
        crate::de::decode_document(bytes, options)
    }

    /// Gets an iterator over the entries of the map.
    pub fn iter(&self) -> Iter {
        self.into_iter()
    }

    /// Clears the document, removing all values.
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Returns a reference to the Bson corresponding to the key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Bson> {
        self.inner.get(key.as_ref())
    }

    /// Gets a mutable reference to the Bson corresponding to the key.
    pub fn get_mut(&mut self, key: impl AsRef<str>) -> Option<&mut Bson> {
        self.inner.get_mut(key.as_ref())
    }

    fn get_with<'a, T>(
        &'a self,
        key: impl AsRef<str>,
        expected_type: ElementType,
        f: impl Fn(&'a Bson) -> Option<T>,
    ) -> Result<T> {
        let key = key.as_ref();
        let bson = self
            .get(key)
            .ok_or_else(Error::value_access_not_present)
            .map_err(|e| e.with_key(key))?;
        f(bson)
            .ok_or_else(|| Error::value_access_unexpected_type(bson.element_type(), expected_type))
            .map_err(|e| e.with_key(key))
    }

    /// Gets the value for the given key if one is present and is of type
    /// `Double`.
    pub fn get_f64(&self, key: impl AsRef<str>) -> Result<f64> {
        self.get_with(key, ElementType::Double, Bson::as_f64)
    }

    /// Gets the value for the given key if one is present and is of type
    /// `String`.
    pub fn get_str(&self, key: impl AsRef<str>) -> Result<&str> {
        self.get_with(key, ElementType::String, Bson::as_str)
    }

    /// Gets the value for the given key if one is present and is of type
    /// `Array`.
    pub fn get_array(&self, key: impl AsRef<str>) -> Result<&Array> {
        self.get_with(key, ElementType::Array, Bson::as_array)
    }

    /// Gets the value for the given key if one is present and is of type
    /// `Document`.
    pub fn get_document(&self, key: impl AsRef<str>) -> Result<&Document> {
        self.get_with(key, ElementType::EmbeddedDocument, Bson::as_document)
    }

    /// Gets the value for the given key if one is present and is of type
    /// `Boolean`.
    pub fn get_bool(&self, key: impl AsRef<str>) -> Result<bool> {
        self.get_with(key, ElementType::Boolean, Bson::as_bool)
    }

    /// Gets the value for the given key if one is present and is of type
    /// `Int32`.
    pub fn get_i32(&self, key: impl AsRef<str>) -> Result<i32> {
        self.get_with(key, ElementType::Int32, Bson::as_i32)
    }

    /// Gets the value for the given key if one is present and is of type
    /// `Int64`.
    pub fn get_i64(&self, key: impl AsRef<str>) -> Result<i64> {
        self.get_with(key, ElementType::Int64, |b| match b {
            Bson::Int64(v) => Some(*v),
            _ => None,
        })
    }

    /// Gets the value for the given key if one is present and is of type
    /// `Timestamp`.
    pub fn get_timestamp(&self, key: impl AsRef<str>) -> Result<Timestamp> {
        self.get_with(key, ElementType::Timestamp, Bson::as_timestamp)
    }

    /// Gets the value for the given key if one is present and is of type
    /// `Binary`.
    pub fn get_binary(&self, key: impl AsRef<str>) -> Result<&Binary> {
        self.get_with(key, ElementType::Binary, |b| match b {
            Bson::Binary(binary) => Some(binary),
            _ => None,
        })
    }

    /// Gets the value for the given key if one is present and is of type
    /// `ObjectId`.
    pub fn get_object_id(&self, key: impl AsRef<str>) -> Result<ObjectId> {
        self.get_with(key, ElementType::ObjectId, Bson::as_object_id)
    }

    /// Gets the value for the given key if one is present and is of type
    /// `DateTime`.
    pub fn get_datetime(&self, key: impl AsRef<str>) -> Result<&DateTime> {
        self.get_with(key, ElementType::DateTime, Bson::as_datetime)
    }

    /// Gets the value for the given key if one is present and is of type
    /// `Decimal128`.
    pub fn get_decimal128(&self, key: impl AsRef<str>) -> Result<&Decimal128> {
        self.get_with(key, ElementType::Decimal128, |b| match b {
            Bson::Decimal128(d) => Some(d),
            _ => None,
        })
    }

    /// Returns true if the map contains a value for the specified key.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.inner.contains_key(key.as_ref())
    }

    /// Gets a collection of all keys in the document.
    pub fn keys(&self) -> Keys {
        Keys {
            inner: self.inner.keys(),
        }
    }

    /// Gets a collection of all values in the document.
    pub fn values(&self) -> Values {
        Values {
            inner: self.inner.values(),
        }
    }

    /// Returns the number of elements in the document.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the document contains no elements.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Gets an entry by its position in insertion order.
    pub(crate) fn get_index(&self, index: usize) -> Option<(&String, &Bson)> {
        self.inner.get_index(index)
    }

    /// Sets the value of the entry with the key, overwriting (and returning)
    /// any previous value with the same key while preserving its position.
    pub fn insert(&mut self, key: impl Into<String>, val: impl Into<Bson>) -> Option<Bson> {
        self.inner.insert(key.into(), val.into())
    }

    /// Takes the value of the entry out of the document, and returns it.
    /// Computes in **O(n)** time (average), preserving the order of the
    /// remaining entries.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Bson> {
        self.inner.shift_remove(key.as_ref())
    }
}

impl Extend<(String, Bson)> for Document {
    fn extend<T: IntoIterator<Item = (String, Bson)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
