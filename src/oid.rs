//! ObjectId

use std::fmt;

use crate::error::{Error, Result};

/// A wrapper around a raw 12-byte ObjectId representation.
///
/// The layout is a 4-byte big-endian timestamp in seconds since the Unix
/// epoch, a 5-byte random value, and a 3-byte incrementing counter. This
/// crate treats the twelve bytes as opaque; it never generates new ids.
#[derive(Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct ObjectId {
    id: [u8; 12],
}

impl ObjectId {
    /// Constructs a new ObjectId wrapper around the raw byte representation.
    pub const fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId { id: bytes }
    }

    /// Creates an ObjectId from a 24-character hexadecimal string.
    pub fn parse_str(s: impl AsRef<str>) -> Result<ObjectId> {
        let s = s.as_ref();

        let bytes: Vec<u8> = hex::decode(s.as_bytes())
            .map_err(|e| Error::object_id(format!("invalid hex string \"{}\": {}", s, e)))?;
        if bytes.len() != 12 {
            return Err(Error::object_id(format!(
                "expected a 24-character hexadecimal string, got \"{}\"",
                s
            )));
        }

        let mut byte_array: [u8; 12] = [0; 12];
        byte_array[..].copy_from_slice(&bytes[..]);
        Ok(ObjectId::from_bytes(byte_array))
    }

    /// Returns the raw byte representation of this ObjectId.
    pub const fn bytes(&self) -> [u8; 12] {
        self.id
    }

    /// Retrieves the timestamp from the leading four bytes, in seconds since
    /// the Unix epoch.
    pub fn timestamp(&self) -> u32 {
        let mut buf = [0; 4];
        buf.copy_from_slice(&self.id[0..4]);
        u32::from_be_bytes(buf)
    }

    /// Converts this ObjectId to its 24-character hexadecimal representation.
    pub fn to_hex(self) -> String {
        hex::encode(self.id)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("ObjectId").field(&self.to_hex()).finish()
    }
}

impl From<[u8; 12]> for ObjectId {
    fn from(bytes: [u8; 12]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl std::str::FromStr for ObjectId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}
