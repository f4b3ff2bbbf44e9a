//! Decoded message handed out by the scanner.

use crate::header::{self, ContentType, Header};
use crate::Result;

/// One message (or header block) cut from an mbox stream.
///
/// The raw bytes are kept as delimited; only the header block is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    raw: Vec<u8>,
    headers: Vec<Header>,
    body_offset: usize,
}

impl Message {
    /// Decode the header block at the start of `raw`.
    pub fn parse(raw: Vec<u8>) -> Result<Self> {
        let block = header::decode(&raw)?;
        let body_offset = block.len();
        Ok(Self {
            raw,
            headers: block.into_headers(),
            body_offset,
        })
    }

    /// All header fields in order of appearance.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// All values of a header, matched case-insensitively.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// The parsed `Content-Type` header, if present.
    pub fn content_type(&self) -> Option<ContentType> {
        self.header("Content-Type").map(ContentType::parse)
    }

    /// Bytes after the header block.
    pub fn body(&self) -> &[u8] {
        &self.raw[self.body_offset..]
    }

    /// The message exactly as delimited in the stream.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Size of the raw message in bytes.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    /// Whether the raw message is empty.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Consume the message, returning its raw bytes.
    pub fn into_raw(self) -> Vec<u8> {
        self.raw
    }
}
