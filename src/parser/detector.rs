//! Format detector. Scores each profile over a window of the
//! first ~50 non-empty lines and selects the best match, falling back to
//! `standard` on ties or low confidence.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Profile;

use super::line::{Feature, Line};

const DETECTOR_WINDOW: usize = 50;
const CONFIDENCE_DIVISOR: f64 = 0.3;

// Generic bracket content (not a digit-leading timestamp shape) so this
// also credits one-line `Name [Mon Dth at HH:MM AM]` dated headers, the
// same fix applied to `parser::boundary`'s copy of this pattern.
static RE_NAME_TIME_ONE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][\w' .-]+\s+(\d{1,2}:\d{2}\s?[AaPp][Mm]?|\[[^\]]+\])").unwrap()
});
static RE_NAME_LINKED_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][\w' .-]+\s+\[\d{1,2}:\d{2}\s?[AaPp][Mm]?\]\(https?://").unwrap());
static RE_BRACKET_MESSAGE_FROM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Message from .+\]").unwrap());
static RE_BRACKET_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Time: .+\]").unwrap());
static RE_BRACKET_THREAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Thread: .+\]").unwrap());
static RE_BRACKET_CHANNEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Channel: .+\]").unwrap());
static RE_THREAD_REPLIES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+\s+repl(y|ies)\b").unwrap());
static RE_THREAD_TS: Lazy<Regex> = Lazy::new(|| Regex::new(r"thread_ts=").unwrap());
static RE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^---+$").unwrap());
static RE_CHANNEL_JOINED: Lazy<Regex> = Lazy::new(|| Regex::new(r"joined the channel").unwrap());
static RE_CHANNEL_TOPIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"set the channel topic").unwrap());
static RE_CHANNEL_PINNED: Lazy<Regex> = Lazy::new(|| Regex::new(r"pinned a message").unwrap());
static RE_EMOJI_SHORTCODE: Lazy<Regex> = Lazy::new(|| Regex::new(r":[\w+-]+:").unwrap());
static RE_VIEW_THREAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"View thread").unwrap());
static RE_WEEKDAY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday)\b").unwrap()
});
static RE_UPLOADED_FILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"uploaded a file:").unwrap());
static RE_SLACK_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Message from .+\]").unwrap());
static RE_USER_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<@U[A-Z0-9]+>").unwrap());
static RE_TIMESTAMP_ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}:\d{2}(\s?[AaPp][Mm])?").unwrap());

struct Scores {
    standard: f64,
    bracket: f64,
    dm: f64,
    thread: f64,
    channel: f64,
}

fn window<'a>(lines: &'a [Line]) -> Vec<&'a Line> {
    lines
        .iter()
        .filter(|l| !l.has(Feature::Empty))
        .take(DETECTOR_WINDOW)
        .collect()
}

fn score_profiles(lines: &[Line]) -> (Scores, usize) {
    let win = window(lines);
    let n = win.len().max(1);

    let mut standard = 0usize;
    let mut bracket = 0usize;
    let mut dm = 0usize;
    let mut thread = 0usize;
    let mut channel = 0usize;

    for (i, line) in win.iter().enumerate() {
        let t = line.trimmed.as_str();

        if RE_NAME_TIME_ONE_LINE.is_match(t) || line.has(Feature::IsDateSeparator) {
            standard += 1;
        }
        if line.has(Feature::TimestampOnly) {
            standard += 1;
        }
        if RE_NAME_LINKED_TIME.is_match(t) {
            standard += 1;
        }

        if RE_BRACKET_MESSAGE_FROM.is_match(t)
            || RE_BRACKET_TIME.is_match(t)
            || RE_BRACKET_THREAD.is_match(t)
            || RE_BRACKET_CHANNEL.is_match(t)
        {
            bracket += 2;
        }

        if line.has(Feature::HasBracketedTime) && t.contains("](") {
            let next_is_name = win
                .get(i + 1)
                .map(|l| l.has(Feature::LooksLikeName))
                .unwrap_or(false);
            let prev_is_name = i > 0 && win[i - 1].has(Feature::LooksLikeName);
            if (next_is_name || prev_is_name) && !RE_THREAD_TS.is_match(t) {
                dm += 1;
            }
        }

        if RE_THREAD_REPLIES.is_match(t) {
            thread += 2;
        }
        if RE_SEPARATOR.is_match(t) {
            thread += 1;
        }
        if RE_THREAD_TS.is_match(t) {
            thread += 2;
        }

        if RE_CHANNEL_JOINED.is_match(t) || RE_CHANNEL_TOPIC.is_match(t) || RE_CHANNEL_PINNED.is_match(t) {
            channel += 2;
        }
    }

    (
        Scores {
            standard: standard as f64 / n as f64,
            bracket: bracket as f64 / n as f64,
            dm: dm as f64 / n as f64,
            thread: thread as f64 / n as f64,
            channel: channel as f64 / n as f64,
        },
        n,
    )
}

/// Select the parsing profile for the whole call and its confidence score.
/// Sticky per call: once chosen, callers pass `profile` into every later
/// stage rather than re-detecting it.
pub fn detect_profile(lines: &[Line]) -> (Profile, f64) {
    let (scores, n) = score_profiles(lines);

    let total_strong_hits = [scores.bracket, scores.dm, scores.thread, scores.channel]
        .iter()
        .map(|s| s * n as f64)
        .sum::<f64>()
        + scores.standard * n as f64;
    let confidence = (total_strong_hits / (n as f64 * CONFIDENCE_DIVISOR)).min(1.0);

    let candidates = [
        (Profile::Channel, scores.channel),
        (Profile::Thread, scores.thread),
        (Profile::Bracket, scores.bracket),
        (Profile::Dm, scores.dm),
        (Profile::Standard, scores.standard),
    ];

    let best = candidates
        .iter()
        .cloned()
        .fold((Profile::Standard, 0.0_f64), |acc, cur| {
            if cur.1 > acc.1 { cur } else { acc }
        });

    if confidence < 0.15 || best.1 <= 0.0 {
        (Profile::Standard, confidence)
    } else {
        (best.0, confidence)
    }
}

/// Heuristic gate: true when at least two strong Slack indicators appear.
pub fn is_likely_slack(text: &str) -> bool {
    let mut hits = 0u32;
    if RE_EMOJI_SHORTCODE.is_match(text) {
        hits += 1;
    }
    if RE_TIMESTAMP_ANY.is_match(text) {
        hits += 1;
    }
    if RE_USER_MENTION.is_match(text) {
        hits += 1;
    }
    if RE_VIEW_THREAD.is_match(text) {
        hits += 1;
    }
    if RE_WEEKDAY.is_match(text) {
        hits += 1;
    }
    if RE_CHANNEL_JOINED.is_match(text) {
        hits += 1;
    }
    if RE_UPLOADED_FILE.is_match(text) {
        hits += 1;
    }
    if RE_SLACK_MARKER.is_match(text) {
        hits += 1;
    }
    hits >= 2
}
