//! Continuation merger. A non-fatal stage: any internal failure is logged
//! and the stage returns its input unmodified rather than propagating an
//! error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Message, UNKNOWN_USER};

static RE_TIMESTAMP_LEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\[[^\]]+\](\(https?://[^)]+\))?|\d{1,2}:\d{2}\s?[AaPp]?[Mm]?)").unwrap()
});

fn is_timestamp_candidate(msg: &Message) -> bool {
    if msg.username != UNKNOWN_USER {
        return false;
    }
    let text = msg.text.trim();
    if text.is_empty() {
        return false;
    }

    // (a) text begins with a recognized timestamp pattern.
    if RE_TIMESTAMP_LEADING.is_match(text) {
        return true;
    }

    // (b) first line is a timestamp and further content lines follow.
    let mut lines = text.lines();
    if let Some(first) = lines.next() {
        if RE_TIMESTAMP_LEADING.is_match(first.trim()) && lines.next().is_some() {
            return true;
        }
    }

    // (c) entire text equals the message's own captured timestamp.
    if let Some(ts) = &msg.timestamp {
        if text == ts.trim() {
            return true;
        }
    }

    false
}

/// Fold orphan timestamp-only "Unknown User" fragments into the most
/// recent authored message. Returns a new list; the
/// original is left untouched so a caught failure can fall back to it.
pub fn merge_continuations(messages: Vec<Message>) -> Vec<Message> {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| merge_inner(&messages)));
    match result {
        Ok(merged) => merged,
        Err(_) => {
            tracing::warn!("continuation merger failed; returning unmerged messages");
            messages
        }
    }
}

fn merge_inner(messages: &[Message]) -> Vec<Message> {
    let mut out: Vec<Message> = Vec::with_capacity(messages.len());

    for msg in messages {
        if is_timestamp_candidate(msg) {
            if let Some(last_known_author) = out.iter_mut().rev().find(|m| m.username != UNKNOWN_USER) {
                if !last_known_author.text.is_empty() {
                    last_known_author.text.push('\n');
                    last_known_author.text.push('\n');
                }
                last_known_author.text.push_str(msg.text.trim());
                last_known_author.reactions.extend(msg.reactions.iter().cloned());
                if last_known_author.thread_info.is_none() {
                    last_known_author.thread_info = msg.thread_info.clone();
                }
                continue;
            }
        }
        out.push(msg.clone());
    }

    out
}
