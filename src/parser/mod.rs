//! The ingest pipeline: lines in, normalized `Message` records out.
//!
//! Control flow: `preprocess` → `detector` → (`line` ⇄ `boundary`
//! ⇄ `builder`) → `dedup` → `continuation` → `validate`. Callers drive this
//! from `crate::pipeline::Formatter`, which also owns fallback selection
//! between the `intelligent` path below and `flexible`.

pub mod boundary;
pub mod builder;
pub mod continuation;
pub mod dedup;
pub mod detector;
pub mod flexible;
pub mod line;
pub mod names;
pub mod preprocess;
pub mod validate;

use crate::types::{Message, ParseContext, Profile};

/// Run the structural ("intelligent") parser over already-preprocessed text
/// with an already-selected profile, returning the raw built message list
/// (before dedup/continuation repair, which the driver applies uniformly
/// regardless of which parser produced the list).
///
/// `detector → parser → (intelligent|flexible)` is not actually cyclic:
/// the profile is threaded in here explicitly rather than re-detected by
/// this function or any stage it calls.
pub fn parse_intelligent(text: &str, ctx: &mut ParseContext) -> Vec<Message> {
    let lines = line::classify_all(text);
    builder::build_messages(&lines, ctx)
}

/// Post-parse repair shared by both the intelligent and flexible parsers:
/// dedup, then continuation merge, in that order.
pub fn repair(messages: Vec<Message>) -> Vec<Message> {
    let deduped = dedup::dedupe(messages);
    continuation::merge_continuations(deduped)
}

pub fn detect(text: &str) -> (Profile, f64) {
    let lines = line::classify_all(text);
    detector::detect_profile(&lines)
}
