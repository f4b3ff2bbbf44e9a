//! Scanner configuration.

use serde::{Deserialize, Serialize};

use crate::{Result, ScanError};

/// Default initial buffer size (4 KiB).
pub const DEFAULT_INITIAL_BUFFER: usize = 4 * 1024;

/// Default maximum buffer size (64 MiB).
pub const DEFAULT_MAX_BUFFER: usize = 64 * 1024 * 1024;

// MARK: - Scan Mode

/// What a scanner emits per token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Whole messages delimited by `From ` separator lines.
    #[default]
    Messages,

    /// Header blocks ending in two blank lines, without separators. Meant for
    /// statistics sweeps that never look at bodies.
    HeadersOnly,
}

impl ScanMode {
    /// Map a "headers only" flag to a mode.
    pub fn from_headers_only(headers_only: bool) -> Self {
        if headers_only {
            Self::HeadersOnly
        } else {
            Self::Messages
        }
    }

    /// Whether this mode emits header blocks only.
    pub fn is_headers_only(&self) -> bool {
        matches!(self, Self::HeadersOnly)
    }
}

// MARK: - Scan Config

/// Scanner settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Token kind to emit.
    pub mode: ScanMode,

    /// Size the read buffer starts at.
    pub initial_buffer: usize,

    /// Size the read buffer may grow to. A message (or header block) plus the
    /// separator line after it must fit.
    pub max_buffer: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            mode: ScanMode::Messages,
            initial_buffer: DEFAULT_INITIAL_BUFFER,
            max_buffer: DEFAULT_MAX_BUFFER,
        }
    }
}

impl ScanConfig {
    /// Default settings for `mode`.
    pub fn new(mode: ScanMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Replace the buffer sizing.
    pub fn with_buffer(mut self, initial: usize, max: usize) -> Self {
        self.initial_buffer = initial;
        self.max_buffer = max;
        self
    }

    /// Check that the buffer sizing is usable.
    pub fn validate(&self) -> Result<()> {
        if self.initial_buffer == 0 {
            return Err(ScanError::Config("initial buffer size must be positive".into()));
        }
        if self.initial_buffer > self.max_buffer {
            return Err(ScanError::Config(format!(
                "initial buffer size {} exceeds maximum {}",
                self.initial_buffer, self.max_buffer
            )));
        }
        Ok(())
    }
}
