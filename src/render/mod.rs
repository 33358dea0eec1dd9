//! Renderer. One `Renderer` trait, three profile-specific implementations.

pub mod bracket;
pub mod callout;
pub mod mixed;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::FormatterSettings;
use crate::types::{Message, Profile, Reaction};

pub struct RenderContext<'a> {
    pub settings: &'a FormatterSettings,
    pub user_map: &'a HashMap<String, String>,
    pub emoji_map: &'a HashMap<String, String>,
}

pub trait Renderer {
    fn render(&self, messages: &[Message], ctx: &RenderContext) -> String;
}

pub fn render_profile(profile: Profile, messages: &[Message], ctx: &RenderContext) -> String {
    match profile {
        Profile::Bracket => bracket::BracketRenderer.render(messages, ctx),
        Profile::Mixed => mixed::MixedRenderer.render(messages, ctx),
        Profile::Standard | Profile::Dm | Profile::Thread | Profile::Channel => {
            callout::CalloutRenderer.render(messages, ctx)
        }
    }
}

static RE_USER_MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"<@(U[A-Z0-9]+)>").unwrap());
static RE_EMOJI_SHORTCODE: Lazy<Regex> = Lazy::new(|| Regex::new(r":([\w+-]+):").unwrap());
static RE_SLACK_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(https?://[^|>]+)\|([^>]+)>").unwrap());
static RE_THREAD_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"thread_ts=\S+").unwrap());

/// Valid, plausible `[[wiki-link]]` name: no leading digit, no characters
/// disallowed in a wiki link target.
pub fn display_name(name: &str) -> String {
    let trimmed = name.trim();
    let is_plausible = !trimmed.is_empty()
        && !trimmed.chars().next().unwrap().is_ascii_digit()
        && !trimmed.chars().any(|c| "[]|#^\\/:".contains(c));
    if is_plausible {
        format!("[[{}]]", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Apply the cosmetic, config-gated content transforms: user
/// mention rewriting, emoji replacement, Slack link collapsing, thread
/// highlighting. Each is a pure string rewrite over the already-assembled
/// message text; none of them affect parsing.
pub fn apply_content_transforms(text: &str, ctx: &RenderContext) -> String {
    let mut out = text.to_string();

    if ctx.settings.convert_user_mentions {
        out = RE_USER_MENTION
            .replace_all(&out, |caps: &regex::Captures| {
                let id = &caps[1];
                ctx.user_map
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| format!("@{}", id))
            })
            .to_string();
    }

    if ctx.settings.replace_emoji {
        out = RE_EMOJI_SHORTCODE
            .replace_all(&out, |caps: &regex::Captures| {
                let code = &caps[1];
                ctx.emoji_map
                    .get(code)
                    .cloned()
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .to_string();
    }

    if ctx.settings.convert_slack_links {
        out = RE_SLACK_LINK.replace_all(&out, "[$2]($1)").to_string();
    }

    if ctx.settings.highlight_threads {
        out = RE_THREAD_URL.replace_all(&out, "**$0**").to_string();
    }

    out
}

/// Prefix every line of `text` with the Markdown callout quote marker.
pub fn quote_lines(text: &str) -> String {
    if text.is_empty() {
        return "> ".to_string();
    }
    text.lines()
        .map(|l| if l.is_empty() { ">".to_string() } else { format!("> {}", l) })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format reactions, falling back to a bracketed placeholder in-place on
/// failure rather than aborting the render. Reaction data is always
/// well-formed internally, so the only realistic failure is a future
/// formatter becoming fallible; the `Result`-returning shape keeps that
/// path already wired up.
pub fn format_reactions(reactions: &[Reaction]) -> String {
    try_format_reactions(reactions).unwrap_or_else(|_| "[Error formatting reactions]".to_string())
}

fn try_format_reactions(reactions: &[Reaction]) -> Result<String, crate::error::FormatError> {
    if reactions.is_empty() {
        return Ok(String::new());
    }
    let parts: Result<Vec<String>, crate::error::FormatError> = reactions
        .iter()
        .map(|r| {
            if r.name.contains('\n') {
                return Err(crate::error::FormatError::Internal(
                    "reaction name contains a newline".to_string(),
                ));
            }
            Ok(format!("{} {}", r.name, r.count))
        })
        .collect();
    Ok(parts?.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plausible_name_becomes_wiki_link() {
        assert_eq!(display_name("Alex Mittell"), "[[Alex Mittell]]");
    }

    #[test]
    fn digit_leading_name_stays_raw() {
        assert_eq!(display_name("123 Bot"), "123 Bot");
    }

    #[test]
    fn name_with_disallowed_chars_stays_raw() {
        assert_eq!(display_name("Team/Ops"), "Team/Ops");
    }

    #[test]
    fn quotes_every_line() {
        assert_eq!(quote_lines("a\nb"), "> a\n> b");
    }

    #[test]
    fn formats_reactions_joined() {
        let reactions = vec![
            Reaction { name: ":+1:".to_string(), count: 3 },
            Reaction { name: ":tada:".to_string(), count: 1 },
        ];
        assert_eq!(format_reactions(&reactions), ":+1: 3, :tada: 1");
    }
}
