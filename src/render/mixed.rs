//! Adaptive/mixed renderer: picks `bracket`, `minimal`, or `standard` per
//! message rather than for the whole document.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Message, UNKNOWN_USER};

use super::{apply_content_transforms, format_reactions, quote_lines, RenderContext, Renderer};

static RE_BRACKET_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(Message from|Time:|Thread:|Channel:) ").unwrap());

pub struct MixedRenderer;

impl Renderer for MixedRenderer {
    fn render(&self, messages: &[Message], ctx: &RenderContext) -> String {
        messages
            .iter()
            .map(|m| render_one(m, ctx))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

enum Style {
    Bracket,
    Minimal,
    Standard,
}

/// Per-message re-classification: this reads only the message's own
/// already-normalized text, never the rendered output of a previous call,
/// so it cannot oscillate across repeated runs of the same pipeline
/// invocation.
fn classify(msg: &Message) -> Style {
    if RE_BRACKET_ARTIFACT.is_match(&msg.text) {
        Style::Bracket
    } else if msg.username == UNKNOWN_USER {
        Style::Minimal
    } else {
        Style::Standard
    }
}

fn render_one(msg: &Message, ctx: &RenderContext) -> String {
    match classify(msg) {
        Style::Bracket => super::bracket::BracketRenderer.render(std::slice::from_ref(msg), ctx),
        Style::Standard => super::callout::CalloutRenderer.render(std::slice::from_ref(msg), ctx),
        Style::Minimal => render_minimal(msg, ctx),
    }
}

fn render_minimal(msg: &Message, ctx: &RenderContext) -> String {
    let mut lines = vec!["> [!info]".to_string()];
    let body = apply_content_transforms(&msg.text, ctx);
    if !body.is_empty() {
        lines.push(quote_lines(&body));
    }
    if !msg.reactions.is_empty() {
        lines.push(format!("> {}", format_reactions(&msg.reactions)));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatterSettings;
    use crate::types::Message;
    use std::collections::HashMap;

    fn ctx(settings: &FormatterSettings, user_map: &std::collections::HashMap<String, String>, emoji_map: &std::collections::HashMap<String, String>) -> RenderContext<'_> {
        RenderContext { settings, user_map, emoji_map }
    }

    #[test]
    fn unknown_user_renders_minimal() {
        let mut msg = Message::new();
        msg.text = "some stray content".to_string();
        let settings = FormatterSettings::default();
        let (um, em) = (HashMap::new(), HashMap::new());
        let out = MixedRenderer.render(std::slice::from_ref(&msg), &ctx(&settings, &um, &em));
        assert!(out.starts_with("> [!info]"));
    }

    #[test]
    fn bracket_artifact_in_text_renders_bracket_style() {
        let mut msg = Message::new();
        msg.username = "Alex".to_string();
        msg.text = "[Message from Bea]\nhi".to_string();
        let settings = FormatterSettings::default();
        let (um, em) = (HashMap::new(), HashMap::new());
        let out = MixedRenderer.render(std::slice::from_ref(&msg), &ctx(&settings, &um, &em));
        assert!(out.contains("[!slack]+ [Message from"));
    }

    #[test]
    fn plain_authored_message_renders_standard() {
        let mut msg = Message::new();
        msg.username = "Jacob Frey".to_string();
        msg.text = "hello".to_string();
        let settings = FormatterSettings::default();
        let (um, em) = (HashMap::new(), HashMap::new());
        let out = MixedRenderer.render(std::slice::from_ref(&msg), &ctx(&settings, &um, &em));
        assert!(out.starts_with("> [!slack]+ Message from"));
    }
}
