//! Structure validator. Report-only: never mutates the message
//! list, never drops a message from it. Consumed by the driver's debug
//! appendix and by `tracing::warn!` logging.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Message, ValidationIssue};

const SHORT_USERNAME_THRESHOLD: usize = 2;

static RE_METADATA_ONLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(Language|TypeScript|JavaScript|Last updated|\d+ files?|\d+ repl(y|ies))$").unwrap()
});

pub fn validate(messages: &[Message]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for (index, msg) in messages.iter().enumerate() {
        if msg.text.trim().is_empty() && msg.reactions.is_empty() {
            issues.push(ValidationIssue::EmptyTextNoReactions { index });
        }
        if RE_METADATA_ONLY.is_match(msg.text.trim()) {
            issues.push(ValidationIssue::MetadataOnlyText {
                index,
                matched: msg.text.trim().to_string(),
            });
        }
        if msg.username.chars().count() <= SHORT_USERNAME_THRESHOLD {
            issues.push(ValidationIssue::ImplausiblyShortUsername {
                index,
                username: msg.username.clone(),
            });
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Message;

    #[test]
    fn flags_empty_text_without_reactions() {
        let mut m = Message::new();
        m.username = "Jacob Frey".to_string();
        let issues = validate(&[m]);
        assert!(matches!(issues[0], ValidationIssue::EmptyTextNoReactions { index: 0 }));
    }

    #[test]
    fn flags_metadata_only_text() {
        let mut m = Message::new();
        m.username = "Jacob Frey".to_string();
        m.text = "TypeScript".to_string();
        let issues = validate(&[m]);
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::MetadataOnlyText { .. })));
    }

    #[test]
    fn flags_implausibly_short_username() {
        let mut m = Message::new();
        m.username = "Al".to_string();
        m.text = "hi".to_string();
        let issues = validate(&[m]);
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::ImplausiblyShortUsername { .. })));
    }

    #[test]
    fn no_issues_for_well_formed_message() {
        let mut m = Message::new();
        m.username = "Jacob Frey".to_string();
        m.text = "Hello everyone".to_string();
        assert!(validate(&[m]).is_empty());
    }
}
