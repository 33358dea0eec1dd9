//! Shared data model: the `Message`/`Profile`/`ParseContext` records that
//! flow between every pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The parsing profile selected by the format detector and threaded
/// explicitly through every later stage (never reconstructed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    Standard,
    Bracket,
    Mixed,
    Dm,
    Thread,
    Channel,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Standard
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Profile::Standard => "standard",
            Profile::Bracket => "bracket",
            Profile::Mixed => "mixed",
            Profile::Dm => "dm",
            Profile::Thread => "thread",
            Profile::Channel => "channel",
        };
        f.write_str(s)
    }
}

pub const UNKNOWN_USER: &str = "Unknown User";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub name: String,
    pub count: u32,
}

/// A single normalized message, built by the message builder and mutated
/// only by the continuation merger thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "default_username")]
    pub username: String,
    pub timestamp: Option<String>,
    pub date: Option<chrono::NaiveDate>,
    pub text: String,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    pub thread_info: Option<String>,
    #[serde(default)]
    pub is_thread_reply: bool,
    #[serde(default)]
    pub is_thread_start: bool,
    #[serde(default)]
    pub is_edited: bool,
}

fn default_username() -> String {
    UNKNOWN_USER.to_string()
}

impl Message {
    pub fn new() -> Self {
        Self {
            username: UNKNOWN_USER.to_string(),
            timestamp: None,
            date: None,
            text: String::new(),
            reactions: Vec::new(),
            thread_info: None,
            is_thread_reply: false,
            is_thread_start: false,
            is_edited: false,
        }
    }

    /// A message is retained only if it carries non-empty text or
    /// non-empty reactions.
    pub fn is_worth_keeping(&self) -> bool {
        !self.text.trim().is_empty() || !self.reactions.is_empty()
    }

    /// Fingerprint used by the message-level deduplicator.
    pub fn fingerprint(&self) -> (String, String, String) {
        let ts_prefix: String = self
            .timestamp
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(20)
            .collect();
        let text_prefix: String = self.text.trim().chars().take(100).collect();
        (self.username.clone(), ts_prefix, text_prefix)
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only context threaded through parsing: the selected profile, the
/// lookup maps for mentions/emoji, and the running calendar-date anchor for
/// time-only timestamps.
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub profile: Profile,
    pub user_map: HashMap<String, String>,
    pub emoji_map: HashMap<String, String>,
    pub current_date: Option<chrono::NaiveDate>,
    pub debug: bool,
}

impl ParseContext {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            user_map: HashMap::new(),
            emoji_map: HashMap::new(),
            current_date: None,
            debug: false,
        }
    }
}

/// A report-only issue surfaced by the structure validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyTextNoReactions { index: usize },
    MetadataOnlyText { index: usize, matched: String },
    ImplausiblyShortUsername { index: usize, username: String },
}
