//! Line classifier. Stateless and deterministic: every `Line`
//! is tagged once from pure regex/substring tests and never re-derived.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

use super::names::is_doubled;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Empty,
    HasTimestamp,
    TimestampOnly,
    HasBracketedTime,
    HasDatedTime,
    HasUrl,
    HasUserMention,
    LooksLikeName,
    LooksLikeDoubledName,
    IsAvatarUrl,
    IsReaction,
    IsThreadCounter,
    IsDateSeparator,
    IsAppTag,
    IsPreviewMeta,
}

#[derive(Debug, Clone)]
pub struct Line {
    pub raw: String,
    pub trimmed: String,
    pub indent: usize,
    pub index: usize,
    pub features: HashSet<Feature>,
}

impl Line {
    pub fn has(&self, f: Feature) -> bool {
        self.features.contains(&f)
    }
}

static RE_TIME_BARE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{2}(\s?[AaPp][Mm])?$").unwrap());
static RE_TIME_AMPM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d{1,2}:\d{2}\s?[AaPp][Mm]\b").unwrap());
static RE_TIME_BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d{1,2}:\d{2}\s?[AaPp][Mm]\]").unwrap());
static RE_TIME_BRACKETED_LINKED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\d{1,2}:\d{2}\s?[AaPp][Mm]?\]\(https?://[^)]+\)").unwrap());
static RE_TIME_DATED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[[A-Z][a-z]+ \d{1,2}(st|nd|rd|th)? at \d{1,2}:\d{2}\s?[AaPp][Mm]\]").unwrap()
});
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").unwrap());
static RE_USER_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<@U[A-Z0-9]+>").unwrap());
static RE_AVATAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[\]\(https://ca\.slack-edge\.com/\S+\)").unwrap());
static RE_REACTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(!\[:[\w+-]+:\]\(\S+\)|:[\w+-]+:)\s*(\d+)?").unwrap());
static RE_THREAD_COUNTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\s+repl(y|ies)\b|^View thread\b|^Last reply\b").unwrap()
});
static RE_DATE_SEPARATOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(Today|Yesterday|Monday|Tuesday|Wednesday|Thursday|Friday|Saturday|Sunday|January|February|March|April|May|June|July|August|September|October|November|December)\b",
    )
    .unwrap()
});
static RE_APP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"^APP\b").unwrap());
static RE_NAME_LIKE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z][a-zA-Z'.-]*\s?){1,4}$").unwrap());
static RE_PREVIEW_ADDED_BY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Added by\b").unwrap());
static RE_PREVIEW_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\d+(\.\d+)?\s?(KB|MB|GB)\)").unwrap());
static RE_PREVIEW_HANDLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][\w .]+\s\(@[\w.-]+\)\son\s\w+").unwrap());
static RE_PREVIEW_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z].*[.!?]$").unwrap());

pub fn classify_line(raw: &str, index: usize) -> Line {
    let trimmed = raw.trim_end();
    let indent = trimmed.len() - trimmed.trim_start().len();
    let content = trimmed.trim();

    let mut features = HashSet::new();

    if content.is_empty() {
        features.insert(Feature::Empty);
    }
    if RE_TIME_BRACKETED_LINKED.is_match(content) {
        features.insert(Feature::HasBracketedTime);
        features.insert(Feature::HasTimestamp);
    } else if RE_TIME_DATED.is_match(content) {
        features.insert(Feature::HasDatedTime);
        features.insert(Feature::HasTimestamp);
    } else if RE_TIME_BRACKETED.is_match(content) {
        features.insert(Feature::HasBracketedTime);
        features.insert(Feature::HasTimestamp);
    } else if RE_TIME_AMPM.is_match(content) || RE_TIME_BARE.is_match(content) {
        features.insert(Feature::HasTimestamp);
    }
    if RE_TIME_BARE.is_match(content) || RE_TIME_AMPM.is_match(content) {
        features.insert(Feature::TimestampOnly);
    }
    if RE_URL.is_match(content) {
        features.insert(Feature::HasUrl);
    }
    if RE_USER_MENTION.is_match(content) {
        features.insert(Feature::HasUserMention);
    }
    if RE_AVATAR.is_match(content) {
        features.insert(Feature::IsAvatarUrl);
    }
    if RE_REACTION.is_match(content) {
        features.insert(Feature::IsReaction);
    }
    if RE_THREAD_COUNTER.is_match(content) {
        features.insert(Feature::IsThreadCounter);
    }
    if RE_DATE_SEPARATOR.is_match(content) {
        features.insert(Feature::IsDateSeparator);
    }
    if RE_APP_TAG.is_match(content) {
        features.insert(Feature::IsAppTag);
    }
    if RE_NAME_LIKE.is_match(content) && !content.is_empty() {
        features.insert(Feature::LooksLikeName);
        if is_doubled(content) {
            features.insert(Feature::LooksLikeDoubledName);
        }
    }
    if RE_PREVIEW_ADDED_BY.is_match(content)
        || RE_PREVIEW_SIZE.is_match(content)
        || RE_PREVIEW_HANDLE.is_match(content)
        || (RE_PREVIEW_SENTENCE.is_match(content) && !features.contains(&Feature::HasTimestamp))
    {
        features.insert(Feature::IsPreviewMeta);
    }

    Line {
        raw: raw.to_string(),
        trimmed: content.to_string(),
        indent,
        index,
        features,
    }
}

pub fn classify_all(text: &str) -> Vec<Line> {
    text.lines()
        .enumerate()
        .map(|(i, l)| classify_line(l, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_bracketed_linked_time() {
        let line = classify_line(
            "Alex Mittell  [Feb 6th at 7:47 PM](https://example.com/p1)",
            0,
        );
        assert!(line.has(Feature::HasTimestamp));
        assert!(line.has(Feature::HasDatedTime) || line.has(Feature::HasBracketedTime));
    }

    #[test]
    fn classifies_avatar_line() {
        let line = classify_line("![](https://ca.slack-edge.com/T1-U1-abc-64)", 0);
        assert!(line.has(Feature::IsAvatarUrl));
    }

    #[test]
    fn classifies_thread_counter() {
        let line = classify_line("4 replies", 0);
        assert!(line.has(Feature::IsThreadCounter));
    }

    #[test]
    fn classifies_date_separator() {
        let line = classify_line("Yesterday", 0);
        assert!(line.has(Feature::IsDateSeparator));
    }
}
