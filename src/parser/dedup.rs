//! Deduplicator. Two passes: message-level fingerprinting with
//! a fast unique-check short-circuit, and block-level content dedup gated
//! on heuristic triggers. A regex-pattern failure inside this stage is
//! skipped per-pattern rather than aborting the whole dedup run.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Message;

const LONG_MESSAGE_THRESHOLD: usize = 500;

static CONTENT_DEDUP_INDICATORS: &[&str] = &["http://", "https://", "Added by", "View thread"];

static RE_FILE_SIZE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\d+(\.\d+)?\s?(KB|MB|GB)\)").unwrap());
static RE_IMAGE_ATTACHMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[.*\]\(\S+\)").unwrap());

/// Message-level dedup (first pass): keep first occurrence per
/// `(username, timestamp[:20], text[:100].trim)` fingerprint. Skipped
/// entirely when every fingerprint is already unique (testable property #5).
fn dedupe_messages(messages: Vec<Message>) -> Vec<Message> {
    let fingerprints: Vec<_> = messages.iter().map(|m| m.fingerprint()).collect();
    let unique: HashSet<_> = fingerprints.iter().cloned().collect();
    if unique.len() == fingerprints.len() {
        return messages;
    }

    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(messages.len());
    for (msg, fp) in messages.into_iter().zip(fingerprints) {
        if seen.insert(fp) {
            out.push(msg);
        }
    }
    out
}

fn has_content_dedup_trigger(msg: &Message) -> bool {
    if msg.text.len() > LONG_MESSAGE_THRESHOLD {
        return true;
    }
    if CONTENT_DEDUP_INDICATORS.iter().any(|ind| msg.text.contains(ind)) {
        return true;
    }
    if safe_is_match(&RE_FILE_SIZE, &msg.text) || safe_is_match(&RE_IMAGE_ATTACHMENT, &msg.text) {
        return true;
    }
    has_intra_message_line_duplication(&msg.text)
}

fn has_intra_message_line_duplication(text: &str) -> bool {
    let mut seen = HashSet::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if !seen.insert(line) {
            return true;
        }
    }
    false
}

/// Catch a single pattern's failure without aborting the remaining
/// patterns. `Regex::is_match` doesn't itself fail at call time once
/// compiled, so this guards the one place compilation could plausibly be
/// data-dependent in a future pattern set.
fn safe_is_match(re: &Regex, text: &str) -> bool {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| re.is_match(text))).unwrap_or(false)
}

fn content_block_key(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Block-level content dedup (second pass): only runs when a
/// message trips a heuristic trigger, and then only deduplicates within
/// that message's own content blocks (split on blank lines), keeping the
/// first occurrence of each block.
fn dedupe_blocks(mut messages: Vec<Message>) -> Vec<Message> {
    for msg in messages.iter_mut() {
        if !has_content_dedup_trigger(msg) {
            continue;
        }
        let blocks: Vec<&str> = msg.text.split("\n\n").collect();
        let mut seen = HashSet::new();
        let mut kept = Vec::with_capacity(blocks.len());
        for block in blocks {
            let key = content_block_key(block);
            if key.is_empty() || seen.insert(key) {
                kept.push(block);
            }
        }
        msg.text = kept.join("\n\n");
    }
    messages
}

pub fn dedupe(messages: Vec<Message>) -> Vec<Message> {
    let deduped = dedupe_messages(messages);
    dedupe_blocks(deduped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    fn msg(username: &str, timestamp: &str, text: &str) -> Message {
        let mut m = Message::new();
        m.username = username.to_string();
        m.timestamp = Some(timestamp.to_string());
        m.text = text.to_string();
        m
    }

    #[test]
    fn removes_exact_duplicate_messages() {
        let messages = vec![
            msg("Alex", "10:30 AM", "hello there"),
            msg("Alex", "10:30 AM", "hello there"),
        ];
        let out = dedupe(messages);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn fast_path_leaves_unique_fingerprints_untouched() {
        let messages = vec![
            msg("Alex", "10:30 AM", "hello there"),
            msg("Bea", "10:31 AM", "hi back"),
        ];
        let out = dedupe(messages);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn folds_repeated_link_preview_block() {
        let text = "Check this out https://example.com/a\n\nAdded by Example\n\nAdded by Example";
        let messages = vec![msg("Alex", "10:30 AM", text)];
        let out = dedupe(messages);
        assert_eq!(out[0].text.matches("Added by Example").count(), 1);
    }
}
