//! Test fixture loading utilities

use std::path::PathBuf;

/// Get the path to a fixture file
#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// First message of `one_message.mbox`, without its separator line
#[allow(dead_code)]
pub const FIRST_MESSAGE: &str = "From: herp.derp at example.com (Herp Derp)
Date: Thu, 01 Jan 2015 00:00:01 +0100
Subject: Test

This is a simple test.

And, by the way, this is how a \"From\" line is escaped in mboxo format:

>From Herp Derp with love.

Bye.
";

/// Body of the first message
#[allow(dead_code)]
pub const FIRST_MESSAGE_BODY: &str = "This is a simple test.

And, by the way, this is how a \"From\" line is escaped in mboxo format:

>From Herp Derp with love.

Bye.
";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_path() {
        let path = fixture_path("one_message.mbox");
        assert!(path.to_string_lossy().contains("test_fixtures"));
    }

    #[test]
    fn test_load_fixture() {
        let content = load_fixture("one_message.mbox");
        assert!(content.starts_with("From herp.derp"));
        assert!(content.ends_with(FIRST_MESSAGE));
    }
}
