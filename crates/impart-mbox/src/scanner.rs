//! Pull iterator over an mbox byte source.
//!
//! The scanner owns a growing buffer over any [`Read`]. Each [`advance`]
//! runs the split engine over the unconsumed part of the buffer, reads more
//! only when the engine asks for it, and decodes the emitted token into a
//! [`Message`]. The first error is sticky.
//!
//! [`advance`]: Scanner::advance

use std::io::{self, Read};

use crate::config::{ScanConfig, ScanMode};
use crate::message::Message;
use crate::split::{split, ScanState, Split};
use crate::{Result, ScanError};

/// Reads messages (or header blocks) from an mbox stream.
#[derive(Debug)]
pub struct Scanner<R> {
    reader: R,
    config: ScanConfig,
    buf: Vec<u8>,
    start: usize,
    size: usize,
    eof: bool,
    state: ScanState,
    message: Option<Message>,
    position: u64,
    error: Option<ScanError>,
    started: bool,
    exhausted: bool,
    error_reported: bool,
}

impl<R: Read> Scanner<R> {
    /// Create a scanner with default buffer sizing.
    pub fn new(reader: R, mode: ScanMode) -> Self {
        let config = ScanConfig::new(mode);
        Self {
            size: config.initial_buffer,
            reader,
            config,
            buf: Vec::new(),
            start: 0,
            eof: false,
            state: ScanState::new(),
            message: None,
            position: 0,
            error: None,
            started: false,
            exhausted: false,
            error_reported: false,
        }
    }

    /// Create a scanner from a full configuration.
    pub fn with_config(reader: R, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let mut scanner = Self::new(reader, config.mode);
        scanner.size = config.initial_buffer;
        scanner.config = config;
        Ok(scanner)
    }

    /// Set the initial and maximum buffer sizes.
    ///
    /// Fails once [`advance`](Self::advance) has been called.
    pub fn set_buffer(&mut self, initial: usize, max: usize) -> Result<()> {
        if self.started {
            return Err(ScanError::AlreadyStarted);
        }
        let config = self.config.clone().with_buffer(initial, max);
        config.validate()?;
        self.size = initial;
        self.config = config;
        Ok(())
    }

    /// Move to the next message.
    ///
    /// Returns `false` when the stream is exhausted or an error occurred;
    /// [`error`](Self::error) tells the two apart.
    pub fn advance(&mut self) -> bool {
        self.message = None;
        if self.error.is_some() || self.exhausted {
            return false;
        }
        self.started = true;

        match self.scan_next() {
            Ok(Some(message)) => {
                self.message = Some(message);
                true
            }
            Ok(None) => {
                tracing::trace!(position = self.position, "mbox exhausted");
                self.exhausted = true;
                false
            }
            Err(err) => {
                tracing::debug!(position = self.position, error = %err, "mbox scan failed");
                self.error = Some(err);
                false
            }
        }
    }

    /// The first error encountered, if any. Never cleared.
    pub fn error(&self) -> Option<&ScanError> {
        self.error.as_ref()
    }

    /// The message found by the last successful [`advance`](Self::advance).
    pub fn current(&self) -> Option<&Message> {
        if self.error.is_some() {
            return None;
        }
        self.message.as_ref()
    }

    /// Bytes of the stream consumed by successfully decoded messages.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// The scanner's configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Consume the scanner, returning the byte source.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn scan_next(&mut self) -> Result<Option<Message>> {
        loop {
            let window = &self.buf[self.start..];
            match split(window, self.eof, self.config.mode, &mut self.state)? {
                Split::Emit { token, consumed } => {
                    let raw = window[token].to_vec();
                    self.start += consumed;
                    let message = Message::parse(raw)?;
                    self.position += consumed as u64;
                    return Ok(Some(message));
                }
                Split::NeedMoreData if self.eof => return Ok(None),
                Split::NeedMoreData => self.fill()?,
                Split::Exhausted => return Ok(None),
            }
        }
    }

    /// Read more bytes, compacting and growing the buffer as needed.
    fn fill(&mut self) -> Result<()> {
        if self.start > 0 {
            self.buf.drain(..self.start);
            self.start = 0;
        }

        if self.buf.len() >= self.size {
            let max = self.config.max_buffer;
            if self.size >= max {
                return Err(ScanError::ResourceExceeded { max });
            }
            self.size = self.size.saturating_mul(2).min(max);
            tracing::debug!(size = self.size, "growing scan buffer");
        }

        let filled = self.buf.len();
        self.buf.resize(self.size, 0);
        let read = loop {
            match self.reader.read(&mut self.buf[filled..]) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => break other,
            }
        };

        match read {
            Ok(0) => {
                self.buf.truncate(filled);
                self.eof = true;
                Ok(())
            }
            Ok(n) => {
                self.buf.truncate(filled + n);
                Ok(())
            }
            Err(e) => {
                self.buf.truncate(filled);
                Err(e.into())
            }
        }
    }
}

/// Yields each message, then the sticky error once, then `None`.
///
/// Messages are moved out, so [`Scanner::current`] is empty while iterating.
impl<R: Read> Iterator for Scanner<R> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.advance() {
            return self.message.take().map(Ok);
        }
        if self.error_reported {
            return None;
        }
        let err = self.error.clone()?;
        self.error_reported = true;
        Some(Err(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FormatViolation;
    use std::io::Cursor;

    const TWO_MESSAGES: &str = "From a 2015\nFrom: a@x\nSubject: one\n\nfirst\n\nFrom b 2015\nFrom: b@x\nSubject: two\n\nsecond\n";

    /// Hands out at most `step` bytes per read.
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "gone"))
        }
    }

    #[test]
    fn test_advance_through_messages() {
        let mut scanner = Scanner::new(Cursor::new(TWO_MESSAGES), ScanMode::Messages);
        assert!(scanner.current().is_none());

        assert!(scanner.advance());
        let first = scanner.current().unwrap();
        assert_eq!(first.header("Subject"), Some("one"));
        assert_eq!(first.body(), b"first\n");
        assert_eq!(scanner.position(), 43);

        assert!(scanner.advance());
        assert_eq!(scanner.current().unwrap().header("subject"), Some("two"));
        assert_eq!(scanner.position(), TWO_MESSAGES.len() as u64);

        assert!(!scanner.advance());
        assert!(scanner.error().is_none());
        assert!(scanner.current().is_none());
        assert!(!scanner.advance());
    }

    #[test]
    fn test_byte_at_a_time_source() {
        let reader = Trickle {
            data: TWO_MESSAGES.as_bytes(),
            step: 1,
        };
        let mut scanner = Scanner::new(reader, ScanMode::Messages);
        scanner.set_buffer(1, 1024).unwrap();

        let subjects: Vec<String> = scanner
            .by_ref()
            .map(|m| m.unwrap().header("Subject").unwrap().to_string())
            .collect();
        assert_eq!(subjects, vec!["one", "two"]);
        assert_eq!(scanner.position(), TWO_MESSAGES.len() as u64);
    }

    #[test]
    fn test_error_is_sticky() {
        let mut scanner = Scanner::new(Cursor::new("Subject: nope\n\nbody\n"), ScanMode::Messages);
        assert!(!scanner.advance());
        let expected = ScanError::InvalidFormat(FormatViolation::MissingSeparator);
        assert_eq!(scanner.error(), Some(&expected));
        assert!(scanner.current().is_none());
        assert!(!scanner.advance());
        assert_eq!(scanner.error(), Some(&expected));
    }

    #[test]
    fn test_iterator_reports_error_once() {
        let scanner = Scanner::new(Cursor::new("From a 2015\nFrom: a\nTo: b\n\nno newline"), ScanMode::Messages);
        let results: Vec<_> = scanner.collect();
        assert_eq!(
            results,
            vec![Err(ScanError::InvalidFormat(FormatViolation::UnterminatedLine))]
        );
    }

    #[test]
    fn test_buffer_limit() {
        let mut scanner = Scanner::new(Cursor::new(TWO_MESSAGES), ScanMode::Messages);
        scanner.set_buffer(8, 16).unwrap();
        assert!(!scanner.advance());
        assert_eq!(scanner.error(), Some(&ScanError::ResourceExceeded { max: 16 }));
    }

    #[test]
    fn test_set_buffer_after_start() {
        let mut scanner = Scanner::new(Cursor::new(TWO_MESSAGES), ScanMode::Messages);
        assert!(scanner.set_buffer(16, 8).is_err());
        assert!(scanner.advance());
        assert_eq!(scanner.set_buffer(16, 1024), Err(ScanError::AlreadyStarted));
    }

    #[test]
    fn test_io_error_is_reported() {
        let mut scanner = Scanner::new(Broken, ScanMode::Messages);
        assert!(!scanner.advance());
        assert!(matches!(
            scanner.error(),
            Some(ScanError::Io {
                kind: io::ErrorKind::ConnectionReset,
                ..
            })
        ));
    }

    #[test]
    fn test_with_config_validates() {
        let config = ScanConfig::new(ScanMode::HeadersOnly).with_buffer(0, 10);
        assert!(Scanner::with_config(Cursor::new(""), config).is_err());

        let config = ScanConfig::new(ScanMode::HeadersOnly).with_buffer(64, 128);
        let scanner = Scanner::with_config(Cursor::new(""), config).unwrap();
        assert_eq!(scanner.config().mode, ScanMode::HeadersOnly);
    }

    #[test]
    fn test_position_stops_before_undecodable_message() {
        let data = "From a 2015\nnot a header\n\nbody\n";
        let mut scanner = Scanner::new(Cursor::new(data), ScanMode::Messages);
        assert!(!scanner.advance());
        assert!(matches!(scanner.error(), Some(ScanError::HeaderDecode(_))));
        assert_eq!(scanner.position(), 0);
    }

    #[test]
    fn test_empty_stream() {
        let mut scanner = Scanner::new(Cursor::new(""), ScanMode::Messages);
        assert!(!scanner.advance());
        assert!(scanner.error().is_none());
        assert_eq!(scanner.position(), 0);
    }
}
