use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Default configuration constants
const DEFAULT_DETECT_CODE_BLOCKS: bool = true;
const DEFAULT_CONVERT_USER_MENTIONS: bool = true;
const DEFAULT_REPLACE_EMOJI: bool = true;
const DEFAULT_PARSE_SLACK_TIMES: bool = true;
const DEFAULT_HIGHLIGHT_THREADS: bool = true;
const DEFAULT_CONVERT_SLACK_LINKS: bool = true;
const DEFAULT_MAX_LINES: usize = 50_000;
const DEFAULT_FRONTMATTER_CSS_CLASS: &str = "slack-conversation";
const DEFAULT_DEBUG: bool = false;

/// Settings controlling the ingest pipeline and renderers. Every field here
/// corresponds one-to-one to a named option in the external interface;
/// parsing itself never reads environment or file state directly.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FormatterSettings {
    pub detect_code_blocks: bool,
    pub convert_user_mentions: bool,
    pub replace_emoji: bool,
    pub parse_slack_times: bool,
    pub highlight_threads: bool,
    pub convert_slack_links: bool,
    pub max_lines: usize,
    #[serde(default)]
    pub time_zone: String,
    pub frontmatter_css_class: String,
    #[serde(default)]
    pub frontmatter_title: Option<String>,
    pub debug: bool,
}

impl Default for FormatterSettings {
    fn default() -> Self {
        Self {
            detect_code_blocks: DEFAULT_DETECT_CODE_BLOCKS,
            convert_user_mentions: DEFAULT_CONVERT_USER_MENTIONS,
            replace_emoji: DEFAULT_REPLACE_EMOJI,
            parse_slack_times: DEFAULT_PARSE_SLACK_TIMES,
            highlight_threads: DEFAULT_HIGHLIGHT_THREADS,
            convert_slack_links: DEFAULT_CONVERT_SLACK_LINKS,
            max_lines: DEFAULT_MAX_LINES,
            time_zone: String::new(),
            frontmatter_css_class: DEFAULT_FRONTMATTER_CSS_CLASS.to_string(),
            frontmatter_title: None,
            debug: DEFAULT_DEBUG,
        }
    }
}

impl FormatterSettings {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut settings = config::Config::builder();

        let defaults = FormatterSettings::default();
        settings = settings
            .set_default("detect_code_blocks", defaults.detect_code_blocks)?
            .set_default("convert_user_mentions", defaults.convert_user_mentions)?
            .set_default("replace_emoji", defaults.replace_emoji)?
            .set_default("parse_slack_times", defaults.parse_slack_times)?
            .set_default("highlight_threads", defaults.highlight_threads)?
            .set_default("convert_slack_links", defaults.convert_slack_links)?
            .set_default("max_lines", defaults.max_lines as i64)?
            .set_default("time_zone", defaults.time_zone.clone())?
            .set_default("frontmatter_css_class", defaults.frontmatter_css_class.clone())?
            .set_default("debug", defaults.debug)?;

        // Load from config file if provided
        if let Some(path) = config_path
            && Path::new(path).exists()
        {
            settings = settings.add_source(config::File::with_name(path));
        }

        // Override with environment variables, e.g. SLACK_FMT_MAX_LINES
        settings = settings.add_source(
            config::Environment::with_prefix("SLACK_FMT")
                .prefix_separator("_")
                .separator("__"),
        );

        let settings = settings.build()?.try_deserialize()?;
        Ok(settings)
    }
}
