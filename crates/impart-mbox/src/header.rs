//! Header validity probe.
//!
//! Field syntax is checked line by line here so that an obviously invalid
//! block can be rejected before its end is in the buffer; decoding proper
//! (unfolding, encoded words) is delegated to `mailparse`.

use std::collections::HashSet;

use mailparse::{parse_content_type, parse_headers};

use crate::{Result, ScanError};

/// Minimum number of distinct fields a header block must carry before the
/// separator line in front of it is believed.
pub const MIN_CANDIDATE_FIELDS: usize = 2;

// MARK: - Header

/// A decoded header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Field name as written (e.g., "Content-Type").
    pub name: String,

    /// Unfolded, decoded field value.
    pub value: String,
}

// MARK: - Content Type

/// The parts of a `Content-Type` field the scanner cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Lower-cased media type (e.g., "multipart/alternative").
    pub mimetype: String,

    /// The `boundary` parameter, if declared.
    pub boundary: Option<String>,
}

impl ContentType {
    /// Parse a raw `Content-Type` field value.
    pub fn parse(value: &str) -> Self {
        let parsed = parse_content_type(value);
        Self {
            mimetype: parsed.mimetype.to_ascii_lowercase(),
            boundary: parsed.params.get("boundary").filter(|b| !b.is_empty()).cloned(),
        }
    }

    /// Whether this is a `multipart/*` type.
    pub fn is_multipart(&self) -> bool {
        self.mimetype.starts_with("multipart/")
    }

    /// The closing delimiter line (`--boundary--`) of a multipart body.
    ///
    /// `None` for non-multipart types, even when they carry a boundary.
    pub fn terminator(&self) -> Option<String> {
        if !self.is_multipart() {
            return None;
        }
        self.boundary.as_ref().map(|b| format!("--{}--", b))
    }
}

// MARK: - Header Block

/// A complete, decoded header block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBlock {
    headers: Vec<Header>,
    len: usize,
}

impl HeaderBlock {
    /// Decoded fields in order of appearance.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Consume the block, returning its fields.
    pub fn into_headers(self) -> Vec<Header> {
        self.headers
    }

    /// Bytes covered by the block, including the blank line ending it.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the block covers no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First value of a field, matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// All values of a field, matched case-insensitively.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    /// Number of distinct field names.
    pub fn distinct_fields(&self) -> usize {
        self.headers
            .iter()
            .map(|h| h.name.to_ascii_lowercase())
            .collect::<HashSet<_>>()
            .len()
    }

    /// The parsed `Content-Type` field, if present.
    pub fn content_type(&self) -> Option<ContentType> {
        self.get("Content-Type").map(ContentType::parse)
    }

    /// Whether the block declares a `multipart/*` body.
    pub fn is_multipart(&self) -> bool {
        self.content_type().is_some_and(|ct| ct.is_multipart())
    }
}

// MARK: - Probe

/// Outcome of probing the bytes after a separator line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The block is not finished yet and every line so far is plausible.
    Incomplete,

    /// The bytes cannot be a header block.
    Rejected(String),

    /// A complete header block.
    Accepted(HeaderBlock),
}

/// Probe `data`, which starts right after a separator line.
///
/// `complete` means no more bytes will follow `data`; an unfinished block is
/// then taken to run to its end. The block must carry at least `min_fields`
/// distinct fields to be accepted.
pub fn probe(data: &[u8], complete: bool, min_fields: usize) -> Probe {
    let mut pos = 0;
    let mut first = true;

    let end = loop {
        if pos >= data.len() {
            if complete {
                break data.len();
            }
            return Probe::Incomplete;
        }

        let rest = &data[pos..];
        let (line, next) = match rest.iter().position(|&b| b == b'\n') {
            Some(n) => (&rest[..n], pos + n + 1),
            None if complete => (rest, data.len()),
            None => return Probe::Incomplete,
        };
        let line = line.strip_suffix(b"\r").unwrap_or(line);

        if line.is_empty() {
            break next;
        }
        if matches!(line[0], b' ' | b'\t') {
            if first {
                return Probe::Rejected("continuation line before the first field".into());
            }
        } else if let Err(reason) = check_field_name(line) {
            return Probe::Rejected(reason.into());
        }

        first = false;
        pos = next;
    };

    let headers = match parse_headers(&data[..end]) {
        Ok((headers, _)) => headers,
        Err(e) => return Probe::Rejected(e.to_string()),
    };
    let block = HeaderBlock {
        headers: headers
            .iter()
            .map(|h| Header {
                name: h.get_key(),
                value: h.get_value(),
            })
            .collect(),
        len: end,
    };

    let fields = block.distinct_fields();
    if fields < min_fields {
        return Probe::Rejected(format!("only {} distinct header fields", fields));
    }
    Probe::Accepted(block)
}

/// Decode the header block at the start of a confirmed message.
pub fn decode(data: &[u8]) -> Result<HeaderBlock> {
    match probe(data, true, 0) {
        Probe::Accepted(block) => Ok(block),
        Probe::Rejected(reason) => Err(ScanError::HeaderDecode(reason)),
        Probe::Incomplete => Err(ScanError::HeaderDecode("incomplete header block".into())),
    }
}

fn check_field_name(line: &[u8]) -> std::result::Result<(), &'static str> {
    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or("line without a field name")?;
    let name = &line[..colon];
    if name.is_empty() || !name.iter().all(|b| (33..=126).contains(b)) {
        return Err("malformed field name");
    }
    Ok(())
}
