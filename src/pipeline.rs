//! Pipeline driver: the crate's external entry points, guard rails,
//! fallback-parser selection, and catastrophic-failure handling.
//! `Formatter` owns the settings, the lookup maps, and the single-writer
//! memoization cache.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::config::FormatterSettings;
use crate::error::FormatError;
use crate::parser::{self, detector, line, preprocess};
use crate::render::{self, RenderContext};
use crate::types::{Message, ParseContext, Profile};

const MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;
const MAX_INPUT_LINES: usize = 50_000;
const WARN_INPUT_BYTES: usize = 1024 * 1024;
const WARN_INPUT_LINES: usize = 10_000;
const CACHE_ENTRY_LIMIT_BYTES: usize = 2 * 1024 * 1024;
const CACHE_TOTAL_LIMIT_BYTES: usize = 20 * 1024 * 1024;
const CHUNK_SIZE_BYTES: usize = 100 * 1024;
const DEBUG_MAX_UNPARSED_LINES: usize = 50;
const CATASTROPHIC_FALLBACK_LINES: usize = 100;

static RE_USER_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<@U[A-Z0-9]+>").unwrap());
static RE_TIMESTAMP_ANY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}:\d{2}(\s?[AaPp][Mm])?").unwrap());
static RE_METADATA_BLACKLIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(Language|TypeScript|Last updated|\d+)$").unwrap());

#[derive(Default)]
struct Cache {
    entries: HashMap<String, String>,
    order: VecDeque<String>,
    total_bytes: usize,
}

impl Cache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn insert(&mut self, key: String, value: String) {
        let added = key.len() + value.len();
        if added > CACHE_ENTRY_LIMIT_BYTES {
            return;
        }
        while self.total_bytes + added > CACHE_TOTAL_LIMIT_BYTES {
            match self.order.pop_front() {
                Some(oldest) => {
                    if let Some(v) = self.entries.remove(&oldest) {
                        self.total_bytes = self.total_bytes.saturating_sub(oldest.len() + v.len());
                    }
                }
                None => break,
            }
        }
        self.total_bytes += added;
        self.order.push_back(key.clone());
        self.entries.insert(key, value);
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.total_bytes = 0;
    }
}

struct RunStats {
    profile: Profile,
    messages: Vec<Message>,
    unparsed_lines: Vec<String>,
}

pub struct Formatter {
    settings: FormatterSettings,
    user_map: HashMap<String, String>,
    emoji_map: HashMap<String, String>,
    cache: Mutex<Cache>,
}

impl Formatter {
    pub fn new(settings: FormatterSettings) -> Self {
        Self {
            settings,
            user_map: HashMap::new(),
            emoji_map: HashMap::new(),
            cache: Mutex::new(Cache::default()),
        }
    }

    /// Quick heuristic gate for "is this worth running the full pipeline on".
    pub fn is_likely_slack(&self, text: &str) -> bool {
        detector::is_likely_slack(text)
    }

    /// Replaces configuration and invalidates the cache. Mandatory because
    /// rendering (not just parsing) depends on settings.
    pub fn update_settings(
        &mut self,
        settings: FormatterSettings,
        user_map: HashMap<String, String>,
        emoji_map: HashMap<String, String>,
    ) {
        self.settings = settings;
        self.user_map = user_map;
        self.emoji_map = emoji_map;
        self.cache.lock().unwrap().clear();
    }

    /// Runs the full pipeline. Infallible by contract: every non-rejected
    /// input produces *some* Markdown.
    pub fn format_slack_content(&self, text: &str) -> String {
        self.run(text).0
    }

    /// `format_slack_content` wrapped in YAML frontmatter.
    pub fn build_note_with_frontmatter(&self, text: &str) -> String {
        let (body, stats) = self.run(text);
        self.wrap_frontmatter(&body, stats.as_ref())
    }

    /// Optional chunked mode. Splits on line boundaries into
    /// ≤100KB chunks, processes sequentially in strict input order, and
    /// concatenates with a `---` separator. `on_chunk(done, total)` is the
    /// synchronous stand-in for "yielding control between chunks" (the
    /// crate has no suspension points of its own).
    pub fn format_slack_content_chunked(
        &self,
        text: &str,
        mut on_chunk: Option<&mut dyn FnMut(usize, usize)>,
    ) -> String {
        let chunks = split_into_chunks(text, CHUNK_SIZE_BYTES);
        let total = chunks.len();
        let mut rendered = Vec::with_capacity(total);
        for (i, chunk) in chunks.iter().enumerate() {
            rendered.push(self.format_slack_content(chunk));
            if let Some(cb) = on_chunk.as_deref_mut() {
                cb(i + 1, total);
            }
        }
        rendered.join("\n\n---\n\n")
    }

    fn run(&self, text: &str) -> (String, Option<RunStats>) {
        if let Some(rejection) = self.check_guardrails(text) {
            return (rejection, None);
        }

        if let Some(cached) = self.cache.lock().unwrap().get(text) {
            return (cached, None);
        }

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.run_pipeline(text)));

        match result {
            Ok((rendered, stats)) => {
                self.maybe_cache(text, &rendered);
                (rendered, Some(stats))
            }
            Err(_) => {
                tracing::warn!("pipeline panicked; emitting catastrophic-fallback callout");
                self.cache.lock().unwrap().clear();
                (catastrophic_fallback(text), None)
            }
        }
    }

    fn check_guardrails(&self, text: &str) -> Option<String> {
        let bytes = text.len();
        let lines = text.lines().count();

        if bytes > MAX_INPUT_BYTES {
            let err = FormatError::InputTooLarge { bytes, limit: MAX_INPUT_BYTES };
            return Some(format!("❌ **Input too large**\n\n{}. Nothing was parsed.", err));
        }
        if lines > MAX_INPUT_LINES {
            let err = FormatError::TooManyLines { lines, limit: MAX_INPUT_LINES };
            return Some(format!("❌ **Input too large**\n\n{}. Nothing was parsed.", err));
        }
        if bytes > WARN_INPUT_BYTES || lines > WARN_INPUT_LINES {
            tracing::warn!(bytes, lines, "large Slack paste, parsing anyway");
        }
        None
    }

    fn run_pipeline(&self, text: &str) -> (String, RunStats) {
        let preprocessed = preprocess::preprocess(text, self.settings.max_lines);
        let (profile, _confidence) = parser::detect(&preprocessed);

        let mut ctx = ParseContext {
            profile,
            user_map: self.user_map.clone(),
            emoji_map: self.emoji_map.clone(),
            current_date: None,
            debug: self.settings.debug,
        };

        let intelligent = parser::parse_intelligent(&preprocessed, &mut ctx);
        let lines = line::classify_all(&preprocessed);
        let non_empty_line_count = lines
            .iter()
            .filter(|l| !l.has(line::Feature::Empty))
            .count()
            .max(1);

        let messages = if needs_fallback(&intelligent, non_empty_line_count) {
            tracing::warn!("intelligent parser output failed quality gates, switching to flexible parser");
            let mut fallback_ctx = ParseContext {
                profile,
                user_map: self.user_map.clone(),
                emoji_map: self.emoji_map.clone(),
                current_date: None,
                debug: self.settings.debug,
            };
            parser::flexible::parse_flexible(&preprocessed, &mut fallback_ctx)
        } else {
            intelligent
        };

        let repaired = parser::repair(messages);
        let issues = parser::validate::validate(&repaired);
        for issue in &issues {
            tracing::warn!(?issue, "structure validator issue");
        }

        let render_ctx = RenderContext {
            settings: &self.settings,
            user_map: &self.user_map,
            emoji_map: &self.emoji_map,
        };
        let mut rendered = render::render_profile(profile, &repaired, &render_ctx);

        let unparsed_lines: Vec<String> = lines
            .iter()
            .filter(|l| !l.has(line::Feature::Empty) && !l.trimmed.is_empty())
            .filter(|l| repaired.iter().all(|m| !m.text.contains(l.trimmed.as_str())))
            .map(|l| l.raw.clone())
            .take(DEBUG_MAX_UNPARSED_LINES)
            .collect();

        if self.settings.debug {
            rendered.push_str(&debug_appendix(&unparsed_lines));
        }

        (
            rendered,
            RunStats {
                profile,
                messages: repaired,
                unparsed_lines,
            },
        )
    }

    fn maybe_cache(&self, input: &str, output: &str) {
        if input.len() + output.len() <= CACHE_ENTRY_LIMIT_BYTES {
            self.cache.lock().unwrap().insert(input.to_string(), output.to_string());
        }
    }

    fn wrap_frontmatter(&self, body: &str, stats: Option<&RunStats>) -> String {
        let participants = stats
            .map(|s| {
                let mut names: Vec<&str> = s.messages.iter().map(|m| m.username.as_str()).collect();
                names.sort_unstable();
                names.dedup();
                names.len()
            })
            .unwrap_or(0);
        let message_count = stats.map(|s| s.messages.len()).unwrap_or(0);
        let format = stats.map(|s| s.profile.to_string()).unwrap_or_else(|| Profile::Standard.to_string());
        let date = stats
            .and_then(|s| s.messages.iter().find_map(|m| m.date))
            .map(|d| d.format("%Y-%m-%d").to_string());

        let front = Frontmatter {
            cssclasses: &self.settings.frontmatter_css_class,
            participants,
            messages: message_count,
            format,
            date,
            title: self.settings.frontmatter_title.clone(),
        };

        let yaml = serde_yaml::to_string(&front).unwrap_or_default();
        format!("---\n{}---\n\n{}", yaml, body)
    }
}

#[derive(Serialize)]
struct Frontmatter<'a> {
    cssclasses: &'a str,
    participants: usize,
    messages: usize,
    format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

/// Fallback-selection criteria: any one of these switches the whole input
/// over to the flexible parser.
fn needs_fallback(messages: &[Message], non_empty_line_count: usize) -> bool {
    if messages.is_empty() {
        return true;
    }
    let short_count = messages.iter().filter(|m| m.text.trim().chars().count() < 10).count();
    if short_count * 2 > messages.len() {
        return true;
    }
    if messages
        .iter()
        .any(|m| m.username.chars().count() <= 2 || RE_METADATA_BLACKLIST.is_match(m.username.trim()))
    {
        return true;
    }
    if messages.len() as f64 > 0.8 * non_empty_line_count as f64 {
        return true;
    }
    if messages.iter().any(|m| m.text.trim().is_empty() && m.reactions.is_empty()) {
        return true;
    }
    false
}

fn catastrophic_fallback(text: &str) -> String {
    let first_lines: Vec<&str> = text.lines().take(CATASTROPHIC_FALLBACK_LINES).collect();
    let mentions = RE_USER_MENTION.find_iter(text).count();
    let timestamps = RE_TIMESTAMP_ANY.find_iter(text).count();

    format!(
        "> [!warning]+ Parsing failed, showing raw input\n> Detected {} mention(s) and {} timestamp-like token(s).\n\n```\n{}\n```",
        mentions,
        timestamps,
        first_lines.join("\n")
    )
}

fn debug_appendix(unparsed: &[String]) -> String {
    if unparsed.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n\n---\n\n**Debug Information**\n\nUnparsed lines:\n\n```\n");
    out.push_str(&unparsed.join("\n"));
    out.push_str("\n```\n");
    out
}

fn split_into_chunks(text: &str, max_bytes: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if !current.is_empty() && current.len() + line.len() + 1 > max_bytes {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> Formatter {
        Formatter::new(FormatterSettings::default())
    }

    #[test]
    fn rejects_oversize_input() {
        let huge = "x".repeat(MAX_INPUT_BYTES + 1);
        let f = formatter();
        let out = f.format_slack_content(&huge);
        assert!(out.starts_with("❌ **Input too large**"));
    }

    #[test]
    fn formats_single_message() {
        let f = formatter();
        let out = f.format_slack_content("Jacob Frey [10:30 AM]\n\nHello everyone");
        assert!(out.contains("[!slack]+ Message from"));
        assert!(out.contains("Hello everyone"));
    }

    #[test]
    fn caches_repeated_calls() {
        let f = formatter();
        let text = "Jacob Frey [10:30 AM]\n\nHello everyone";
        let first = f.format_slack_content(text);
        let second = f.format_slack_content(text);
        assert_eq!(first, second);
    }

    #[test]
    fn update_settings_invalidates_cache() {
        let mut f = formatter();
        let text = "Jacob Frey [10:30 AM]\n\nHello everyone";
        let _ = f.format_slack_content(text);
        assert!(f.cache.lock().unwrap().get(text).is_some());
        let mut settings = FormatterSettings::default();
        settings.debug = true;
        f.update_settings(settings, HashMap::new(), HashMap::new());
        assert!(f.cache.lock().unwrap().get(text).is_none());
    }

    #[test]
    fn frontmatter_contains_expected_keys() {
        let f = formatter();
        let out = f.build_note_with_frontmatter("Jacob Frey [10:30 AM]\n\nHello everyone");
        assert!(out.starts_with("---\n"));
        assert!(out.contains("cssclasses: slack-conversation"));
        assert!(out.contains("messages: 1"));
        assert!(out.contains("participants: 1"));
    }

    #[test]
    fn chunked_mode_concatenates_with_separator() {
        let f = formatter();
        let text = "Jacob Frey [10:30 AM]\n\nHello\n\nBea Diaz [10:31 AM]\n\nHi";
        let mut calls = 0;
        let mut cb = |_done: usize, _total: usize| calls += 1;
        let out = f.format_slack_content_chunked(text, Some(&mut cb));
        assert!(!out.is_empty());
        assert!(calls >= 1);
    }
}
