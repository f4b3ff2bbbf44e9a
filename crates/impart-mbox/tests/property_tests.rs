//! Property-based tests for archive reconstruction and chunking invariance

use std::io::{self, Read};

use impart_mbox::{Scanner, ScanMode};
use proptest::prelude::*;

/// Hands out at most `step` bytes per read.
struct Trickle {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[derive(Debug, Clone)]
struct GeneratedMessage {
    separator: String,
    content: String,
}

fn body_line() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z ,.]{0,30}",
        "From [a-z ]{0,20}",
        ">From [a-z]{1,8} 2015",
    ]
}

fn message() -> impl Strategy<Value = GeneratedMessage> {
    (
        "[a-z]{1,8}",
        1000u32..3000,
        "[A-Za-z]{1,10}( [A-Za-z]{1,10}){0,3}",
        prop::collection::vec(body_line(), 0..6),
        "[a-z][a-z ]{0,20}",
    )
        .prop_map(|(sender, year, subject, lines, last)| {
            let mut content = format!("From: {sender}@example.com\nSubject: {subject}\n\n");
            for line in lines {
                content.push_str(&line);
                content.push('\n');
            }
            content.push_str(&last);
            content.push('\n');
            GeneratedMessage {
                separator: format!("From {sender}@example.com  Thu Jan  1 00:00:01 {year}\n"),
                content,
            }
        })
}

fn scan_raw(reader: impl Read, initial: usize) -> Vec<Vec<u8>> {
    let mut scanner = Scanner::new(reader, ScanMode::Messages);
    scanner.set_buffer(initial, 1 << 20).unwrap();
    scanner.map(|m| m.unwrap().into_raw()).collect()
}

proptest! {
    #[test]
    fn test_separator_plus_token_reconstructs_archive(
        messages in prop::collection::vec(message(), 1..8)
    ) {
        let archive: String = messages
            .iter()
            .map(|m| format!("{}{}", m.separator, m.content))
            .collect();

        let tokens = scan_raw(archive.as_bytes(), 4096);
        prop_assert_eq!(tokens.len(), messages.len());

        let mut rebuilt = Vec::new();
        for (message, token) in messages.iter().zip(&tokens) {
            rebuilt.extend_from_slice(message.separator.as_bytes());
            rebuilt.extend_from_slice(token);
        }
        prop_assert_eq!(rebuilt, archive.into_bytes());
    }

    #[test]
    fn test_blank_line_before_separator_is_dropped(
        messages in prop::collection::vec(message(), 1..8)
    ) {
        let archive: String = messages
            .iter()
            .map(|m| format!("{}{}\n", m.separator, m.content))
            .collect();

        let tokens = scan_raw(archive.as_bytes(), 4096);
        prop_assert_eq!(tokens.len(), messages.len());

        let last = messages.len() - 1;
        for (i, (message, token)) in messages.iter().zip(&tokens).enumerate() {
            // the final message runs to the end of the stream
            let expected = if i == last {
                format!("{}\n", message.content)
            } else {
                message.content.clone()
            };
            prop_assert_eq!(token, expected.as_bytes());
        }
    }

    #[test]
    fn test_chunking_does_not_change_tokens(
        messages in prop::collection::vec(message(), 1..6),
        step in 1usize..64,
        initial in 1usize..64,
    ) {
        let archive: String = messages
            .iter()
            .map(|m| format!("{}{}\n", m.separator, m.content))
            .collect();

        let whole = scan_raw(archive.as_bytes(), 4096);
        let trickled = scan_raw(
            Trickle { data: archive.into_bytes(), pos: 0, step },
            initial,
        );
        prop_assert_eq!(whole, trickled);
    }
}
