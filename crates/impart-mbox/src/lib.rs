//! impart-mbox: Incremental mbox scanner
//!
//! This crate splits an mbox stream into individual messages, or into bare
//! header blocks for statistics sweeps, without loading the whole stream.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        impart-mbox                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  separator     │ "From " line heuristic and resumable finder │
//! │  header        │ Header block probe and decoding             │
//! │  multipart     │ Closing boundary tracking                   │
//! │  split         │ Pure split engine over a byte window        │
//! │  scanner       │ Pull iterator over any io::Read             │
//! │  message       │ Decoded message handed to callers           │
//! │  config        │ Scan mode and buffer sizing                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Features
//!
//! - `cli`: Build the `impart-mbox` command-line tool (default off)
//!
//! # Example
//!
//! ```rust
//! use impart_mbox::{ScanMode, Scanner};
//!
//! let mbox = "From alice 2015\nFrom: alice@example.com\nSubject: Hello\n\nHi!\n";
//! let mut scanner = Scanner::new(mbox.as_bytes(), ScanMode::Messages);
//! while scanner.advance() {
//!     let message = scanner.current().unwrap();
//!     println!("{:?}", message.header("Subject"));
//! }
//! assert!(scanner.error().is_none());
//! ```

pub mod config;
pub mod error;
pub mod header;
pub mod message;
pub mod multipart;
pub mod scanner;
pub mod separator;
pub mod split;

pub use config::{ScanConfig, ScanMode, DEFAULT_INITIAL_BUFFER, DEFAULT_MAX_BUFFER};
pub use error::{FormatViolation, Result, ScanError};
pub use header::{ContentType, Header, HeaderBlock};
pub use message::Message;
pub use scanner::Scanner;
pub use separator::{is_separator_line, Separator, SeparatorFinder};
pub use split::{split, ScanState, Split};
