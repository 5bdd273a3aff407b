//! Module containing functionality related to BSON binary values.

use std::fmt;

use crate::spec::BinarySubtype;

/// Represents a BSON binary value: a subtype byte and an owned payload.
///
/// The payload is always the logical data; for subtype `0x02` the redundant
/// inner length prefix present on the wire is stripped during decoding.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// The subtype of the binary value.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binary")
            .field("subtype", &self.subtype)
            .field("bytes", &format!("0x{}", hex::encode(&self.bytes)))
            .finish()
    }
}

impl fmt::Display for Binary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Binary({:#x}, {})",
            u8::from(self.subtype),
            crate::base64::encode(&self.bytes)
        )
    }
}

impl Binary {
    /// Creates a generic-subtype `Binary` from the given bytes.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            subtype: BinarySubtype::Generic,
            bytes: bytes.into(),
        }
    }

    /// Creates a `Binary` from the given base64 string and subtype.
    pub fn from_base64(
        input: impl AsRef<str>,
        subtype: impl Into<Option<BinarySubtype>>,
    ) -> crate::error::Result<Self> {
        let bytes = crate::base64::decode(input.as_ref())
            .map_err(|e| crate::error::Error::malformed_string(format!("invalid base64: {}", e)))?;
        let subtype = subtype.into().unwrap_or(BinarySubtype::Generic);
        Ok(Binary { subtype, bytes })
    }
}
