//! Split engine.
//!
//! [`split`] decides, for the unconsumed window of a stream, whether a token
//! can be emitted yet. It never reads; the caller grows the window when asked
//! and drops the consumed prefix after an emit. Everything learned about the
//! window between calls lives in a [`ScanState`] owned by the caller, so
//! bytes already examined are not examined again.
//!
//! # Message mode
//!
//! ```text
//! From alice 2015          <- opening separator (first non-blank line)
//! From: alice@example.com  \
//! Subject: hi               | token
//!                           |
//! body                     /
//!                          <- blank line before a separator, not part of the token
//! From bob 2015            <- next separator, left for the following call
//! ```
//!
//! A following separator candidate is accepted when the bytes after it parse
//! as a header block with at least two distinct fields and it does not sit
//! inside the current message's unterminated multipart body.
//!
//! A contained candidate that itself declares a multipart body is held back.
//! If the next plausible candidate still finds the enclosing body
//! unterminated, the enclosing message is taken to have lost its closing
//! delimiter and is cut at the held-back candidate.

use std::ops::Range;

use crate::config::ScanMode;
use crate::error::{FormatViolation, Result, ScanError};
use crate::header::{self, Probe, MIN_CANDIDATE_FIELDS};
use crate::multipart::BoundaryTracker;
use crate::separator::{is_separator_line, Separator, SeparatorFinder, PREFIX};

/// End-of-header markers in header-only mode: a line end plus two blank lines.
const HEADER_END_MARKERS: [&[u8]; 2] = [b"\n\n\n", b"\n\r\n\r\n"];

/// Bytes of a marker that may already sit at the end of a window.
const MARKER_OVERLAP: usize = 4;

// MARK: - Outcome

/// Result of one split attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Split {
    /// Nothing can be decided until the window grows.
    NeedMoreData,

    /// A token was found. `consumed` bytes of the window are done with and
    /// must be dropped before the next call.
    Emit {
        /// Byte range of the token within the window.
        token: Range<usize>,
        /// Bytes to drop from the front of the window.
        consumed: usize,
    },

    /// The stream holds no further tokens.
    Exhausted,
}

// MARK: - State

/// What the multipart tracker knows about the current message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
enum Containment {
    /// The opening header block has not been decoded yet.
    #[default]
    Unknown,

    /// Not a multipart message; no candidate is contained.
    Unbounded,

    /// Multipart with a declared boundary.
    Tracking(BoundaryTracker),
}

/// Scan progress within the current window.
///
/// Offsets are relative to the window start. The state is reset whenever a
/// token is emitted, since the caller then drops the consumed prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanState {
    finder: SeparatorFinder,
    opening: Option<Separator>,
    pending: Option<Separator>,
    containment: Containment,
    fallback: Option<Separator>,
    nested: Option<Separator>,
    marker_search: usize,
}

impl ScanState {
    /// Fresh state for a new window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything about the current window.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Whether the state has learned anything about the current window.
    pub fn is_fresh(&self) -> bool {
        *self == Self::default()
    }

    fn inside_multipart(&mut self, window: &[u8], body_start: usize, limit: usize) -> Result<bool> {
        if self.containment == Containment::Unknown {
            let headers = header::decode(&window[body_start..limit])?;
            let body = body_start + headers.len();
            self.containment = match BoundaryTracker::for_headers(&headers, body) {
                Some(tracker) => Containment::Tracking(tracker),
                None => Containment::Unbounded,
            };
        }

        Ok(match &mut self.containment {
            Containment::Tracking(tracker) => !tracker.terminated_before(window, limit),
            _ => false,
        })
    }

    /// Whether the multipart terminator occurs anywhere in the window.
    fn terminated_in(&mut self, window: &[u8]) -> bool {
        match &mut self.containment {
            Containment::Tracking(tracker) => tracker.terminated_before(window, window.len()),
            _ => true,
        }
    }
}

// MARK: - Split

/// Run one split attempt over `window`.
///
/// `at_eof` means the window will never grow again. Structural violations
/// are returned as errors; they are terminal for the stream.
pub fn split(window: &[u8], at_eof: bool, mode: ScanMode, state: &mut ScanState) -> Result<Split> {
    if window.is_empty() {
        return Ok(if at_eof {
            Split::Exhausted
        } else {
            Split::NeedMoreData
        });
    }

    match mode {
        ScanMode::Messages => split_message(window, at_eof, state),
        ScanMode::HeadersOnly => Ok(split_header(window, at_eof, state)),
    }
}

fn split_message(window: &[u8], at_eof: bool, state: &mut ScanState) -> Result<Split> {
    let opening = match state.opening {
        Some(opening) => opening,
        None => match find_opening(window, at_eof)? {
            Opening::Found(opening) => {
                state.opening = Some(opening);
                state.finder = SeparatorFinder::starting_at(opening.next_line());
                opening
            }
            Opening::NeedMoreData => return Ok(Split::NeedMoreData),
            Opening::Exhausted => return Ok(Split::Exhausted),
        },
    };
    let body_start = opening.next_line();

    loop {
        let Some(candidate) = state.pending.take().or_else(|| state.finder.find_next(window)) else {
            return finish_message(window, at_eof, body_start, state);
        };

        let headers = match header::probe(&window[candidate.next_line()..], at_eof, MIN_CANDIDATE_FIELDS) {
            Probe::Incomplete => {
                state.pending = Some(candidate);
                return Ok(Split::NeedMoreData);
            }
            Probe::Rejected(reason) => {
                tracing::trace!(offset = candidate.start, %reason, "separator candidate rejected");
                continue;
            }
            Probe::Accepted(headers) => headers,
        };

        if state.inside_multipart(window, body_start, candidate.start)? {
            if let Some(nested) = state.nested {
                tracing::debug!(
                    offset = nested.start,
                    "multipart body left unterminated before a new multipart message"
                );
                return Ok(emit(window, body_start, nested.start, state));
            }
            tracing::trace!(offset = candidate.start, "separator candidate inside multipart body");
            if headers.is_multipart() {
                state.nested = Some(candidate);
            }
            state.fallback.get_or_insert(candidate);
            continue;
        }

        return Ok(emit(window, body_start, candidate.start, state));
    }
}

/// No further separator is available in the window.
fn finish_message(window: &[u8], at_eof: bool, body_start: usize, state: &mut ScanState) -> Result<Split> {
    if !at_eof {
        return Ok(Split::NeedMoreData);
    }
    if window.last() != Some(&b'\n') {
        return Err(ScanError::InvalidFormat(FormatViolation::UnterminatedLine));
    }

    if let Some(fallback) = state.fallback {
        if !state.terminated_in(window) {
            tracing::debug!(
                offset = fallback.start,
                "multipart terminator never found, cutting at first plausible separator"
            );
            return Ok(emit(window, body_start, fallback.start, state));
        }
    }

    let consumed = window.len();
    tracing::trace!(start = body_start, end = consumed, "last message runs to end of stream");
    state.reset();
    Ok(Split::Emit {
        token: body_start..consumed,
        consumed,
    })
}

fn emit(window: &[u8], body_start: usize, next: usize, state: &mut ScanState) -> Split {
    let end = body_start + trimmed_len(&window[body_start..next]);
    tracing::trace!(start = body_start, end, consumed = next, "message delimited");
    state.reset();
    Split::Emit {
        token: body_start..end,
        consumed: next,
    }
}

/// Length of `span` without the blank line that precedes the next separator.
///
/// Only one line break is dropped, and only when the span ends in a blank
/// line. `span` always starts right after a line break.
fn trimmed_len(span: &[u8]) -> usize {
    let without = if span.ends_with(b"\r\n") {
        span.len() - 2
    } else if span.ends_with(b"\n") {
        span.len() - 1
    } else {
        return span.len();
    };

    if without == 0 || span[..without].ends_with(b"\n") {
        without
    } else {
        span.len()
    }
}

// MARK: - Opening Separator

enum Opening {
    Found(Separator),
    NeedMoreData,
    Exhausted,
}

/// Locate the separator that opens the window: the first non-blank line.
fn find_opening(window: &[u8], at_eof: bool) -> Result<Opening> {
    let mut start = 0;
    loop {
        let rest = &window[start..];
        match rest.iter().position(|&b| b == b'\n') {
            Some(len) => {
                let line = &rest[..len];
                if line.is_empty() || line == b"\r" {
                    start += len + 1;
                    continue;
                }
                if is_separator_line(line) {
                    return Ok(Opening::Found(Separator {
                        start,
                        end: start + len,
                    }));
                }
                return Err(ScanError::InvalidFormat(FormatViolation::MissingSeparator));
            }
            // only blank lines remain
            None if rest.is_empty() => {
                return Ok(if at_eof {
                    Opening::Exhausted
                } else {
                    Opening::NeedMoreData
                });
            }
            None if at_eof => {
                return Err(ScanError::InvalidFormat(FormatViolation::UnterminatedLine));
            }
            None => {
                let n = rest.len().min(PREFIX.len());
                if rest[..n] == PREFIX[..n] || rest == b"\r" {
                    return Ok(Opening::NeedMoreData);
                }
                return Err(ScanError::InvalidFormat(FormatViolation::MissingSeparator));
            }
        }
    }
}

// MARK: - Header-only Mode

fn split_header(window: &[u8], at_eof: bool, state: &mut ScanState) -> Split {
    if let Some(end) = find_header_end(window, state.marker_search) {
        state.reset();
        return Split::Emit {
            token: 0..end,
            consumed: end,
        };
    }

    if !at_eof {
        // a marker may straddle the end of the window
        state.marker_search = window.len().saturating_sub(MARKER_OVERLAP);
        return Split::NeedMoreData;
    }

    // best effort: whatever is left is the last header block
    state.reset();
    Split::Emit {
        token: 0..window.len(),
        consumed: window.len(),
    }
}

fn find_header_end(window: &[u8], from: usize) -> Option<usize> {
    (from..window.len()).find_map(|i| {
        let rest = &window[i..];
        HEADER_END_MARKERS
            .iter()
            .find(|marker| rest.starts_with(marker))
            .map(|marker| i + marker.len())
    })
}
