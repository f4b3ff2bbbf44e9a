//! Separator candidate finder.
//!
//! An mbox separator is a line starting with `From ` whose last four
//! characters look like a year between 1000 and 2999. The year check is the
//! historical way of telling a real envelope line apart from body text that
//! happens to start with "From ".

pub(crate) const PREFIX: &[u8] = b"From ";

// MARK: - Separator

/// A line that passed the separator heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separator {
    /// Offset of the `F` in `From `.
    pub start: usize,

    /// Offset of the line feed closing the line.
    pub end: usize,
}

impl Separator {
    /// Offset of the first byte after the separator line.
    pub fn next_line(&self) -> usize {
        self.end + 1
    }

    /// Length of the separator line including its line break.
    pub fn len(&self) -> usize {
        self.end + 1 - self.start
    }

    /// Always false: a separator line holds at least `From ` and a line feed.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Check a single line (without its line feed) against the separator heuristic.
pub fn is_separator_line(line: &[u8]) -> bool {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    line.starts_with(PREFIX) && has_year_suffix(line)
}

fn has_year_suffix(line: &[u8]) -> bool {
    match line {
        [.., century, d1, d2, d3] => {
            matches!(century, b'1' | b'2')
                && d1.is_ascii_digit()
                && d2.is_ascii_digit()
                && d3.is_ascii_digit()
        }
        _ => false,
    }
}

// MARK: - Finder

/// Resumable line-by-line search for separator lines.
///
/// The finder only ever stands at the start of a line. Complete lines it has
/// looked at are never examined again, and a trailing partial line is left
/// for the next call, so repeated calls over a growing window stay linear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeparatorFinder {
    line_start: usize,
}

impl SeparatorFinder {
    /// Create a finder positioned at the start of the window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a finder positioned at `offset`, which must be a line start.
    pub fn starting_at(offset: usize) -> Self {
        Self { line_start: offset }
    }

    /// Offset of the next line to examine.
    pub fn offset(&self) -> usize {
        self.line_start
    }

    /// Return the next separator in `data`, or `None` if every complete line
    /// has been examined.
    pub fn find_next(&mut self, data: &[u8]) -> Option<Separator> {
        while self.line_start < data.len() {
            let start = self.line_start;
            let len = data[start..].iter().position(|&b| b == b'\n')?;
            let end = start + len;
            self.line_start = end + 1;

            let line = &data[start..end];
            if is_separator_line(line) {
                return Some(Separator { start, end });
            }
            if line.starts_with(PREFIX) {
                tracing::trace!(offset = start, "From line without a year suffix");
            }
        }
        None
    }
}

/// Collect every separator among the complete lines of `data`.
pub fn find_separators(data: &[u8]) -> Vec<Separator> {
    let mut finder = SeparatorFinder::new();
    std::iter::from_fn(|| finder.find_next(data)).collect()
}
