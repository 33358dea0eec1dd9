//! Bracket renderer: identical structure to the callout renderer but
//! with bracket-wrapped header/time/reaction lines.

use crate::types::Message;

use super::{apply_content_transforms, display_name, format_reactions, quote_lines, RenderContext, Renderer};

pub struct BracketRenderer;

impl Renderer for BracketRenderer {
    fn render(&self, messages: &[Message], ctx: &RenderContext) -> String {
        messages
            .iter()
            .map(|m| render_one(m, ctx))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn render_one(msg: &Message, ctx: &RenderContext) -> String {
    let label = if msg.is_thread_reply { "Thread Reply from" } else { "Message from" };
    let header = format!("> [!slack]+ [{} {}]", label, display_name(&msg.username));

    let mut lines = vec![header];
    if let Some(ts) = &msg.timestamp {
        lines.push(format!("> [Time: {}]", ts));
    }
    lines.push(">".to_string());

    let body = apply_content_transforms(&msg.text, ctx);
    if !body.is_empty() {
        lines.push(quote_lines(&body));
    }

    if !msg.reactions.is_empty() {
        lines.push(format!("> [Reactions: {}]", format_reactions(&msg.reactions)));
    }
    if let Some(thread) = &msg.thread_info {
        lines.push(format!("> [Thread: {}]", thread));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormatterSettings;
    use crate::types::Message;
    use std::collections::HashMap;

    #[test]
    fn wraps_header_and_time_in_brackets() {
        let mut msg = Message::new();
        msg.username = "Alex Mittell".to_string();
        msg.timestamp = Some("10:30 AM".to_string());
        msg.text = "Hi".to_string();

        let settings = FormatterSettings::default();
        let user_map = HashMap::new();
        let emoji_map = HashMap::new();
        let ctx = RenderContext { settings: &settings, user_map: &user_map, emoji_map: &emoji_map };

        let out = BracketRenderer.render(std::slice::from_ref(&msg), &ctx);
        assert!(out.contains("[!slack]+ [Message from [[Alex Mittell]]]"));
        assert!(out.contains("[Time: 10:30 AM]"));
    }
}
