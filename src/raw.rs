//! An owned, framing-validated BSON document byte buffer.
//!
//! [`RawDocumentBuf`] is what the decoder produces for sub-documents kept
//! opaque via the `raw` or `fields_as_raw` decoding options: the declared
//! length and null terminator are verified, but the elements inside are not
//! parsed until [`RawDocumentBuf::decode`] is called.

use std::fmt;

use crate::{
    de::{decode_document, DecodeOptions},
    error::{Error, Result},
    Document,
};

/// An owned slice of raw BSON document bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RawDocumentBuf {
    bytes: Vec<u8>,
}

impl RawDocumentBuf {
    /// Constructs a new `RawDocumentBuf` from the given bytes, verifying the
    /// length prefix and the trailing null terminator.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();

        if bytes.len() < 5 {
            return Err(Error::malformed_bson(format!(
                "document too small: {} bytes",
                bytes.len()
            )));
        }
        let size = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if size < 5 || size as usize != bytes.len() {
            return Err(Error::malformed_bson(format!(
                "declared length {} does not match buffer length {}",
                size,
                bytes.len()
            )));
        }
        if bytes[bytes.len() - 1] != 0 {
            return Err(Error::malformed_bson("document not null terminated"));
        }

        Ok(Self { bytes })
    }

    /// The raw bytes, including the length prefix and null terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The declared length of the document in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this is the empty document.
    pub fn is_empty(&self) -> bool {
        self.bytes.len() == 5
    }

    /// Fully decodes the contained document with default options.
    pub fn decode(&self) -> Result<Document> {
        self.decode_with_options(&DecodeOptions::default())
    }

    /// Fully decodes the contained document with the given options.
    pub fn decode_with_options(&self, options: &DecodeOptions) -> Result<Document> {
        decode_document(&self.bytes, options)
    }
}

impl fmt::Debug for RawDocumentBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawDocumentBuf")
            .field("data", &hex::encode(&self.bytes))
            .finish()
    }
}

impl TryFrom<Vec<u8>> for RawDocumentBuf {
    type Error = Error;

    fn try_from(bytes: Vec<u8>) -> Result<Self> {
        Self::from_bytes(bytes)
    }
}
