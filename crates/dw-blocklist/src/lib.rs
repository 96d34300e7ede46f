//! Hosts-file style blocklists with exact authority matching.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

const COMMENT_MARKER: char = '#';

/// Immutable set of blocked request authorities (`host` or `host:port`),
/// built once at startup and shared read-only with request interception.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blocklist {
    entries: HashSet<String>,
}

impl Blocklist {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses hosts-file style text. Lines starting with `#` are comments;
    /// every other line contributes its last whitespace-separated token,
    /// which drops the conventional leading IP column of a hosts file.
    ///
    /// The comment check is a prefix check on the raw line, so an indented
    /// `#` does not start a comment.
    pub fn from_hosts_text(text: &str) -> Self {
        let mut entries = HashSet::new();
        for line in text.lines() {
            if line.starts_with(COMMENT_MARKER) {
                continue;
            }
            if let Some(token) = line.split_ascii_whitespace().next_back() {
                entries.insert(token.to_owned());
            }
        }
        Self { entries }
    }

    /// Loads hosts-file style text from disk. A missing or unreadable file
    /// means "no blocklist configured" and yields an empty set, not an error.
    pub fn from_hosts_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_hosts_text(&text),
            Err(_) => Self::empty(),
        }
    }

    /// Returns true if the authority is present in the set. Membership is
    /// exact string equality: no case folding, no default-port elision, no
    /// subdomain or suffix rules.
    pub fn is_blocked(&self, authority: &str) -> bool {
        self.entries.contains(authority)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
