//! Multipart containment tracking.
//!
//! While a message body holds an unterminated multipart section, a separator
//! candidate may just be text inside one of its parts. The tracker answers
//! whether the closing `--boundary--` line has been seen before a given
//! offset, scanning each body line at most once.

use crate::header::HeaderBlock;

/// Looks for the closing delimiter of a message's multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryTracker {
    terminator: Vec<u8>,
    line_start: usize,
    found: Option<usize>,
}

impl BoundaryTracker {
    /// Create a tracker scanning from `body_start` for `terminator`.
    pub fn new(terminator: impl Into<Vec<u8>>, body_start: usize) -> Self {
        Self {
            terminator: terminator.into(),
            line_start: body_start,
            found: None,
        }
    }

    /// Build a tracker for the body following `headers`, or `None` when the
    /// message is not multipart or declares no boundary.
    pub fn for_headers(headers: &HeaderBlock, body_start: usize) -> Option<Self> {
        let terminator = headers.content_type()?.terminator()?;
        Some(Self::new(terminator, body_start))
    }

    /// The terminator line being searched for.
    pub fn terminator(&self) -> &[u8] {
        &self.terminator
    }

    /// Offset of the terminator line, once seen.
    pub fn found(&self) -> Option<usize> {
        self.found
    }

    /// Whether the terminator occurs on a complete line starting before `limit`.
    ///
    /// `data` must be the same window on every call, possibly grown.
    pub fn terminated_before(&mut self, data: &[u8], limit: usize) -> bool {
        if let Some(at) = self.found {
            return at < limit;
        }

        let limit = limit.min(data.len());
        while self.line_start < limit {
            let start = self.line_start;
            let Some(len) = data[start..].iter().position(|&b| b == b'\n') else {
                break;
            };
            self.line_start = start + len + 1;

            if self.is_terminator(&data[start..start + len]) {
                tracing::trace!(offset = start, "multipart terminator found");
                self.found = Some(start);
                return true;
            }
        }
        false
    }

    fn is_terminator(&self, line: &[u8]) -> bool {
        // transport padding after the delimiter is allowed
        let end = line
            .iter()
            .rposition(|b| !b.is_ascii_whitespace())
            .map_or(0, |i| i + 1);
        line[..end] == self.terminator[..]
    }
}
