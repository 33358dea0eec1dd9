//! Message builder. Walks the boundary-analyzed line stream and
//! assembles `Message` records: username/timestamp extraction, date-context
//! propagation, reaction accumulation, and the "never drop a message that
//! carries reactions" rule.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Message, ParseContext, Reaction};

use super::boundary::{BoundaryAnalyzer, LineRole};
use super::line::{Feature, Line};
use super::names::{collapse_doubled, is_doubled};

static RE_NAME_TIME_ONE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][\w' .-]*?)\s{1,4}(\[[^\]]+\]|\d{1,2}:\d{2}\s?[AaPp][Mm])").unwrap()
});
static RE_BRACKET_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Message from (.+?)\]").unwrap());
static RE_BRACKET_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Time:\s*(.+?)\]").unwrap());
static RE_TIME_LINKED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\[[^\]]+\]\(https?://[^)]+\))").unwrap());
static RE_TIME_BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\[[^\]]+\])").unwrap());
static RE_TIME_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}:\d{2}\s?[AaPp]?[Mm]?)").unwrap());
static RE_APP_TAG_TIME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^APP\s+(.+)$").unwrap());
static RE_THREAD_REPLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"thread_ts=|^replied to a thread:").unwrap());
static RE_REACTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:!\[(:[\w+-]+:)\]\(\S+\)|(:[\w+-]+:))\s*(\d+)?").unwrap()
});

/// Prefer linked-bracket > bracket > dated > bare.
fn extract_timestamp(text: &str) -> Option<String> {
    if let Some(m) = RE_TIME_LINKED.find(text) {
        return Some(m.as_str().to_string());
    }
    if let Some(m) = RE_TIME_BRACKETED.find(text) {
        return Some(m.as_str().to_string());
    }
    if let Some(m) = RE_TIME_BARE.find(text) {
        return Some(m.as_str().to_string());
    }
    None
}

struct Header {
    username: Option<String>,
    timestamp: Option<String>,
    consumed: usize,
}

/// Determine how many lines (1..=3) the message-start header occupies and
/// what name/timestamp it carries, mirroring the pattern priority the
/// boundary analyzer used to flag this line as a start.
fn parse_header(lines: &[Line], idx: usize) -> Header {
    let line = &lines[idx];
    let text = &line.trimmed;

    if let Some(caps) = RE_NAME_TIME_ONE_LINE.captures(text) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        let ts = extract_timestamp(text);
        return Header {
            username: name,
            timestamp: ts,
            consumed: 1,
        };
    }

    if let Some(caps) = RE_BRACKET_HEADER.captures(text) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        // Optional `[Time: ...]` line directly after.
        if let Some(next) = lines.get(idx + 1) {
            if let Some(tcaps) = RE_BRACKET_TIME.captures(&next.trimmed) {
                return Header {
                    username: name,
                    timestamp: tcaps.get(1).map(|m| m.as_str().to_string()),
                    consumed: 2,
                };
            }
        }
        return Header {
            username: name,
            timestamp: None,
            consumed: 1,
        };
    }

    // APP-tagged bot layout: Name, (optional doubled Name), APP <dated time>.
    if line.has(Feature::LooksLikeName) {
        let mut consumed = 1usize;
        let mut name = text.clone();
        if let Some(next) = lines.get(idx + 1) {
            if next.trimmed == *text {
                consumed = 2;
            }
        }
        if let Some(app_line) = lines.get(idx + consumed) {
            if app_line.has(Feature::IsAppTag) {
                let ts = RE_APP_TAG_TIME
                    .captures(&app_line.trimmed)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
                    .or_else(|| extract_timestamp(&app_line.trimmed));
                return Header {
                    username: Some(name.clone()),
                    timestamp: ts,
                    consumed: consumed + 1,
                };
            }
        }

        // Plain "Name" then "time" pair (optionally a linked-time middle
        // line, as in the DM variant).
        for offset in 1..=3 {
            match lines.get(idx + offset) {
                Some(candidate) if candidate.has(Feature::Empty) => continue,
                Some(candidate)
                    if candidate.has(Feature::HasTimestamp) || candidate.has(Feature::TimestampOnly) =>
                {
                    let ts = extract_timestamp(&candidate.trimmed);
                    return Header {
                        username: Some(name),
                        timestamp: ts,
                        consumed: offset + 1,
                    };
                }
                Some(candidate) if candidate.has(Feature::LooksLikeName) => {
                    name = candidate.trimmed.clone();
                    continue;
                }
                _ => break,
            }
        }
        return Header {
            username: Some(name),
            timestamp: None,
            consumed: 1,
        };
    }

    if line.has(Feature::IsAvatarUrl) {
        for offset in 1..=3 {
            if let Some(candidate) = lines.get(idx + offset) {
                if candidate.has(Feature::LooksLikeName) {
                    let ts = lines
                        .get(idx + offset + 1)
                        .filter(|l| l.has(Feature::HasTimestamp) || l.has(Feature::TimestampOnly))
                        .and_then(|l| extract_timestamp(&l.trimmed));
                    let consumed = if ts.is_some() { offset + 2 } else { offset + 1 };
                    return Header {
                        username: Some(candidate.trimmed.clone()),
                        timestamp: ts,
                        consumed,
                    };
                }
            }
        }
        return Header {
            username: None,
            timestamp: None,
            consumed: 1,
        };
    }

    // DM: timestamp-only linked line followed by a name within two lines.
    if line.has(Feature::HasBracketedTime) && text.contains("](") {
        let ts = extract_timestamp(text);
        for offset in 1..=2 {
            if let Some(candidate) = lines.get(idx + offset) {
                if candidate.has(Feature::LooksLikeName) {
                    return Header {
                        username: Some(candidate.trimmed.clone()),
                        timestamp: ts,
                        consumed: offset + 1,
                    };
                }
            }
        }
        return Header {
            username: None,
            timestamp: ts,
            consumed: 1,
        };
    }

    Header {
        username: None,
        timestamp: extract_timestamp(text),
        consumed: 1,
    }
}

fn parse_reaction(text: &str) -> Option<Reaction> {
    let caps = RE_REACTION.captures(text)?;
    let name = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())?;
    let count = caps
        .get(3)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .unwrap_or(1);
    Some(Reaction { name, count })
}

/// Build the normalized message list for one call. The builder never
/// re-detects the profile; it is threaded in via `ctx.profile`.
pub fn build_messages(lines: &[Line], ctx: &mut ParseContext) -> Vec<Message> {
    let mut analyzer = BoundaryAnalyzer::new(ctx.profile);
    let roles = analyzer.analyze(lines);

    let mut out: Vec<Message> = Vec::new();
    let mut current: Option<Message> = None;

    let mut idx = 0usize;
    while idx < lines.len() {
        let role = roles[idx];
        let line = &lines[idx];

        match role {
            LineRole::MessageStart => {
                if let Some(msg) = current.take() {
                    if msg.is_worth_keeping() {
                        out.push(msg);
                    }
                }

                let header = parse_header(lines, idx);
                // No captured name on a timestamp-only/linked-timestamp
                // start: left as "Unknown User" for the continuation
                // merger to repair against the prior authored message.
                let username = header
                    .username
                    .map(|n| normalize_username(&n))
                    .unwrap_or_else(|| "Unknown User".to_string());

                let mut msg = Message::new();
                msg.username = username;
                msg.timestamp = header.timestamp.clone();
                msg.is_thread_reply = header
                    .timestamp
                    .as_deref()
                    .map(|t| RE_THREAD_REPLY.is_match(t))
                    .unwrap_or(false);
                if let Some(date) = ctx.current_date {
                    if header
                        .timestamp
                        .as_deref()
                        .map(|t| !t.contains(',') && !contains_month_name(t))
                        .unwrap_or(false)
                    {
                        msg.date = Some(date);
                    }
                }

                idx += header.consumed.max(1);
                current = Some(msg);
                continue;
            }
            LineRole::Metadata => {
                if line.has(Feature::IsDateSeparator) {
                    ctx.current_date = crate::parser::flexible::parse_date_separator(&line.trimmed, ctx.current_date);
                } else if line.has(Feature::IsReaction) {
                    if let Some(reaction) = parse_reaction(&line.trimmed) {
                        if let Some(msg) = current.as_mut() {
                            msg.reactions.push(reaction);
                        }
                    }
                } else if line.has(Feature::IsThreadCounter) {
                    if let Some(msg) = current.as_mut() {
                        msg.thread_info = Some(line.trimmed.clone());
                        msg.is_thread_start = true;
                    }
                } else if line.trimmed.contains("(edited)") {
                    if let Some(msg) = current.as_mut() {
                        msg.is_edited = true;
                    }
                }
            }
            LineRole::Continuation => {
                if let Some(msg) = current.as_mut() {
                    if !msg.text.is_empty() {
                        msg.text.push('\n');
                    }
                    msg.text.push_str(&line.raw);
                }
            }
            LineRole::Skip => {}
        }

        idx += 1;
    }

    if let Some(msg) = current.take() {
        if msg.is_worth_keeping() {
            out.push(msg);
        }
    }

    out
}

fn contains_month_name(s: &str) -> bool {
    const MONTHS: &[&str] = &[
        "January", "February", "March", "April", "May", "June", "July", "August", "September",
        "October", "November", "December", "Jan", "Feb", "Mar", "Apr", "Jun", "Jul", "Aug", "Sep",
        "Oct", "Nov", "Dec",
    ];
    MONTHS.iter().any(|m| s.contains(m))
}

fn normalize_username(raw: &str) -> String {
    let collapsed = if is_doubled(raw) {
        collapse_doubled(raw)
    } else {
        raw.trim().to_string()
    };
    if collapsed.is_empty() {
        "Unknown User".to_string()
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::line::classify_all;
    use crate::types::Profile;

    fn ctx(profile: Profile) -> ParseContext {
        ParseContext::new(profile)
    }

    #[test]
    fn builds_single_doubled_name_message() {
        let text = "Alex MittellAlex Mittell  [Feb 6th at 7:47 PM](https://example.com/p1)\n\nHey all, see the update\n\n4 files";
        let lines = classify_all(text);
        let mut c = ctx(Profile::Standard);
        let messages = build_messages(&lines, &mut c);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].username, "Alex Mittell");
        assert!(messages[0].timestamp.as_deref().unwrap().contains("7:47 PM"));
        assert!(messages[0].text.contains("Hey all,"));
    }

    #[test]
    fn retains_message_with_only_reactions() {
        let text = "Jacob Frey [10:30 AM]\n:+1: 3";
        let lines = classify_all(text);
        let mut c = ctx(Profile::Standard);
        let messages = build_messages(&lines, &mut c);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].reactions.len(), 1);
    }

    #[test]
    fn app_tagged_bot_message_keeps_its_name() {
        let text = "Clay\nClay\nAPP  Jun 8th at 6:28 PM\nHi there, this is an automated note.";
        let lines = classify_all(text);
        let mut c = ctx(Profile::Standard);
        let messages = build_messages(&lines, &mut c);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].username, "Clay");
        assert!(!messages[0].text.contains("APP"));
    }
}
