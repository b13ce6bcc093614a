//! Parser for the user's edited configuration template.
//!
//! Input is `key = value` lines. Only the first `=` splits a line, so values
//! may contain `=`. A value wrapped in double quotes loses one pair of them,
//! and a chat auto-link of the form `[text](url)` collapses to `text`.
//! Anything else that does not look like `key = value` is skipped.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// Configuration key → value, as typed by the user.
pub type ParsedConfig = HashMap<String, String>;

/// Chat auto-link, `[text](url)`.
static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[(.*?)\]\(.*?\)$").unwrap());

pub fn parse_config(text: &str) -> ParsedConfig {
    let mut config = ParsedConfig::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let mut value = value.trim();
        if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
            value = &value[1..value.len() - 1];
        }
        let value = match MARKDOWN_LINK.captures(value) {
            Some(caps) => caps[1].to_owned(),
            None => value.to_owned(),
        };

        config.insert(key.to_owned(), value);
    }

    config
}
