//! Flexible parser, used as a fallback. Same `ParseContext`-consuming
//! contract as the intelligent pipeline, simpler heuristics: the
//! "try the smart path, fall back to the dumb, reliable path" shape.
//!
//! Splits on blank-line-delimited blocks instead of running the boundary
//! state machine; each block's first line is checked for a name/time
//! header, everything else in the block becomes that message's text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Message, ParseContext};

use super::names::{collapse_doubled, is_doubled};

static RE_NAME_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][\w' .-]*?)\s{1,4}(\[[^\]]+\]|\d{1,2}:\d{2}\s?[AaPp]?[Mm]?)").unwrap()
});
static RE_NAME_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][\w' .-]{1,60}$").unwrap());
static RE_TIME_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\[[^\]]+\](\(https?://[^)]+\))?|\d{1,2}:\d{2}\s?[AaPp]?[Mm]?)$").unwrap());
static RE_DATE_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(Today|Yesterday|Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday|January|February|March|April|May|June|July|August|September|October|November|December)\b",
    )
    .unwrap()
});

fn blocks(text: &str) -> Vec<Vec<&str>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Update (and return) the running date anchor when `line` is a date
/// separator; shared with the intelligent builder so both parsers agree on
/// propagating the date forward until a new date separator appears.
pub fn parse_date_separator(line: &str, current: Option<chrono::NaiveDate>) -> Option<chrono::NaiveDate> {
    if !RE_DATE_SEPARATOR.is_match(line) {
        return current;
    }
    // Only ever used to anchor time-only timestamps for display, never to
    // validate wall-clock correctness, so an unparsed date separator still
    // counts as "a date is now known" even when we can't resolve its
    // literal calendar date.
    chrono::NaiveDate::parse_from_str(line, "%B %d, %Y")
        .or_else(|_| chrono::NaiveDate::parse_from_str(line, "%B %d"))
        .ok()
        .or(current)
}

pub fn parse_flexible(text: &str, ctx: &mut ParseContext) -> Vec<Message> {
    let mut out = Vec::new();

    for block in blocks(text) {
        if block.is_empty() {
            continue;
        }
        if RE_DATE_SEPARATOR.is_match(block[0].trim()) && block.len() == 1 {
            ctx.current_date = parse_date_separator(block[0].trim(), ctx.current_date);
            continue;
        }

        let mut msg = Message::new();
        let first = block[0].trim();
        let mut body_start = 1;

        if let Some(caps) = RE_NAME_TIME.captures(first) {
            msg.username = normalize(caps.get(1).map(|m| m.as_str()).unwrap_or_default());
            msg.timestamp = caps.get(2).map(|m| m.as_str().to_string());
        } else if RE_NAME_ONLY.is_match(first) && block.len() > 1 && RE_TIME_ONLY.is_match(block[1].trim()) {
            msg.username = normalize(first);
            msg.timestamp = Some(block[1].trim().to_string());
            body_start = 2;
        } else {
            msg.username = "Unknown User".to_string();
            body_start = 0;
        }

        msg.text = block[body_start..].join("\n").trim().to_string();
        if let Some(date) = ctx.current_date {
            if msg.timestamp.is_some() {
                msg.date = Some(date);
            }
        }
        if msg.is_worth_keeping() {
            out.push(msg);
        }
    }

    out
}

fn normalize(raw: &str) -> String {
    if is_doubled(raw) {
        collapse_doubled(raw)
    } else {
        raw.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Profile;

    #[test]
    fn splits_blocks_on_blank_lines() {
        let text = "Alex Mittell 10:30 AM\nHello there\n\nBea Diaz 10:31 AM\nHi back";
        let mut ctx = ParseContext::new(Profile::Standard);
        let messages = parse_flexible(text, &mut ctx);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].username, "Alex Mittell");
        assert_eq!(messages[1].username, "Bea Diaz");
    }

    #[test]
    fn handles_separate_name_and_time_lines() {
        let text = "Jacob Frey\n10:30 AM\nHey everyone";
        let mut ctx = ParseContext::new(Profile::Standard);
        let messages = parse_flexible(text, &mut ctx);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].username, "Jacob Frey");
        assert!(messages[0].text.contains("Hey everyone"));
    }
}
