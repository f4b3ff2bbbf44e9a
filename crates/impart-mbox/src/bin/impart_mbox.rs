//! CLI tool for sweeping an mbox archive
//!
//! Prints one line per message with its byte position, size, sender and
//! subject, followed by a summary.
//!
//! # Usage
//!
//! ```bash
//! # List every message in an archive
//! impart-mbox archive.mbox
//!
//! # Header blocks only, as JSON lines, from stdin
//! cat headers.txt | impart-mbox --headers-only --json -
//!
//! # Show rejected separator candidates
//! RUST_LOG=impart_mbox=trace impart-mbox archive.mbox
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use impart_mbox::{Message, ScanConfig, ScanMode, Scanner, DEFAULT_INITIAL_BUFFER, DEFAULT_MAX_BUFFER};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "impart-mbox")]
#[command(about = "Split an mbox archive into messages and list them", long_about = None)]
struct Cli {
    /// Archive to read, or "-" for stdin
    path: PathBuf,

    /// Scan header blocks separated by two blank lines instead of messages
    #[arg(long)]
    headers_only: bool,

    /// Initial read buffer size in bytes
    #[arg(long, default_value_t = DEFAULT_INITIAL_BUFFER)]
    initial_buffer: usize,

    /// Largest message (plus the following separator) the scanner will hold
    #[arg(long, default_value_t = DEFAULT_MAX_BUFFER)]
    max_buffer: usize,

    /// Print JSON lines instead of text
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = ScanConfig::new(ScanMode::from_headers_only(cli.headers_only))
        .with_buffer(cli.initial_buffer, cli.max_buffer);

    let reader: Box<dyn Read> = if cli.path.as_os_str() == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(File::open(&cli.path)?)
    };
    let mut scanner = Scanner::with_config(reader, config)?;

    let mut out = BufWriter::new(io::stdout().lock());
    let mut count = 0usize;
    let mut start = scanner.position();
    while scanner.advance() {
        if let Some(message) = scanner.current() {
            print_message(&mut out, cli.json, count, start, message)?;
        }
        count += 1;
        start = scanner.position();
    }

    let total = scanner.position();
    if cli.json {
        let summary = json!({ "messages": count, "bytes": total, "error": scanner.error().map(|e| e.to_string()) });
        writeln!(out, "{summary}")?;
    } else {
        writeln!(out, "{count} messages, {total} bytes")?;
    }
    out.flush()?;

    match scanner.error() {
        Some(err) => Err(format!("stopped at byte {total}: {err}").into()),
        None => Ok(()),
    }
}

fn print_message(out: &mut impl Write, as_json: bool, index: usize, position: u64, message: &Message) -> io::Result<()> {
    let from = message.header("From").unwrap_or("");
    let subject = message.header("Subject").unwrap_or("");

    if as_json {
        let line = json!({
            "index": index,
            "position": position,
            "size": message.len(),
            "from": from,
            "subject": subject,
        });
        writeln!(out, "{line}")
    } else {
        writeln!(out, "{index:>6} {position:>12} {:>8}  {from}  {subject}", message.len())
    }
}
