//! Boundary analyzer, the hardest sub-component. Implemented as a
//! three-state machine rather than a regex cascade: every line is
//! classified once (`crate::parser::line`) and this module only asks
//! "given `(state, features, profile, lookahead≤3)`, what role does this
//! line play?"

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Profile;

use super::line::{Feature, Line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    MessageStart,
    Continuation,
    Metadata,
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Outside,
    InMessage,
    InPreview,
}

// Bracket content is matched generically (`\[[^\]]+\]`) rather than
// re-deriving a narrower timestamp shape here, so this also accepts the
// dated one-line header (`Name [Mon Dth at HH:MM AM/PM]`) that
// `parser::builder`'s own header parser already recognizes.
static RE_NAME_TIME_ONE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Z][\w' .-]*?)\s{1,4}(\[[^\]]+\]|\d{1,2}:\d{2}\s?[AaPp][Mm])").unwrap()
});
static RE_BRACKET_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[Message from (.+?)\]").unwrap());
static RE_EDITED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(edited\)").unwrap());
static RE_PREVIEW_IMAGE_ATTRIBUTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^!\[.+\]\(https?://\S+\)").unwrap());

/// A three-line lookahead window starting at `idx` (inclusive), used by the
/// pairing and anchor-absorption rules below.
fn lookahead<'a>(lines: &'a [Line], idx: usize, span: usize) -> &'a [Line] {
    let end = (idx + span + 1).min(lines.len());
    &lines[idx..end]
}

fn is_name_line(line: &Line) -> bool {
    line.has(Feature::LooksLikeName) && !line.has(Feature::Empty) && !line.has(Feature::IsDateSeparator)
}

fn is_timestamp_owner_line(line: &Line) -> bool {
    line.has(Feature::HasTimestamp) || line.has(Feature::TimestampOnly)
}

/// A block starting at `idx` looks like a folded-in link preview card when
/// it contains at least one recognized preview signature.
fn is_preview_block(lines: &[Line], idx: usize) -> bool {
    let window = lookahead(lines, idx, 3);
    window.iter().any(|l| {
        l.has(Feature::IsPreviewMeta) || RE_PREVIEW_IMAGE_ATTRIBUTION.is_match(&l.trimmed)
    })
}

pub struct BoundaryAnalyzer {
    profile: Profile,
    state: State,
    prev_line_had_url: bool,
    has_authored_message: bool,
}

impl BoundaryAnalyzer {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            state: State::Outside,
            prev_line_had_url: false,
            has_authored_message: false,
        }
    }

    /// Classify every line in one forward pass, threading the running state
    /// and a bounded lookahead into each decision.
    pub fn analyze(&mut self, lines: &[Line]) -> Vec<LineRole> {
        let mut roles = Vec::with_capacity(lines.len());
        for idx in 0..lines.len() {
            let role = self.step(lines, idx);
            self.transition(lines, idx, role);
            roles.push(role);
        }
        roles
    }

    fn step(&mut self, lines: &[Line], idx: usize) -> LineRole {
        let line = &lines[idx];

        if line.has(Feature::Empty) {
            return LineRole::Skip;
        }

        // Metadata capture lines never open a new message, regardless of state.
        if line.has(Feature::IsReaction) {
            return LineRole::Metadata;
        }
        if line.has(Feature::IsThreadCounter) {
            return LineRole::Metadata;
        }
        if RE_EDITED.is_match(&line.trimmed) {
            return LineRole::Metadata;
        }
        if line.has(Feature::IsDateSeparator) {
            return LineRole::Metadata;
        }

        if self.state == State::InPreview {
            if is_preview_block(lines, idx) || !is_name_line(line) {
                // Stay folded into the previous message until something
                // clearly reopens a new one.
                if self.looks_like_start(lines, idx) {
                    return self.start_or_tiebreak(lines, idx);
                }
                return LineRole::Continuation;
            }
        }

        if self.looks_like_start(lines, idx) {
            return self.start_or_tiebreak(lines, idx);
        }

        // Unattributable small avatar image after a message body: skip.
        if line.has(Feature::IsAvatarUrl) && self.state == State::InMessage {
            return LineRole::Skip;
        }

        LineRole::Continuation
    }

    /// Rule 1-4, profile-gated.
    fn looks_like_start(&self, lines: &[Line], idx: usize) -> bool {
        let line = &lines[idx];
        let text = &line.trimmed;

        if RE_NAME_TIME_ONE_LINE.is_match(text) {
            return true;
        }
        if self.profile == Profile::Bracket && RE_BRACKET_HEADER.is_match(text) {
            return true;
        }

        // Name, then (optionally a linked-time line), then a time line.
        if is_name_line(line) {
            let win = lookahead(lines, idx, 3);
            for (offset, candidate) in win.iter().enumerate().skip(1) {
                if is_timestamp_owner_line(candidate) || candidate.has(Feature::IsAppTag) {
                    if self.profile == Profile::Dm && offset > 2 {
                        break;
                    }
                    return true;
                }
                if candidate.has(Feature::Empty) {
                    continue;
                }
                if !is_name_line(candidate) {
                    break;
                }
            }
        }

        // Avatar anchor: avatar line followed within 1-3 lines by a name line.
        if line.has(Feature::IsAvatarUrl) {
            let win = lookahead(lines, idx, 3);
            if win.iter().skip(1).any(is_name_line) {
                return true;
            }
        }

        // DM profile: `[HH:MM](url)`-only lines start a message only when a
        // name line follows within two lines.
        if self.profile == Profile::Dm
            && line.has(Feature::HasBracketedTime)
            && line.trimmed.contains("](")
        {
            let win = lookahead(lines, idx, 2);
            return win.iter().skip(1).any(is_name_line);
        }

        false
    }

    /// A start candidate always opens a new message here; the preview/avatar
    /// tie-break (spec.md §4.D: "avatar wins as the anchor" when a preview
    /// block precedes it) is about what the *preceding* lines fold into, not
    /// about this line's own role, so there is nothing left to branch on.
    fn start_or_tiebreak(&mut self, _lines: &[Line], _idx: usize) -> LineRole {
        self.has_authored_message = true;
        LineRole::MessageStart
    }

    fn transition(&mut self, lines: &[Line], idx: usize, role: LineRole) {
        let line = &lines[idx];
        let prior_line_had_url = self.prev_line_had_url;

        self.state = match role {
            LineRole::MessageStart => State::InMessage,
            LineRole::Metadata | LineRole::Skip => self.state,
            LineRole::Continuation => {
                if self.state == State::InMessage && prior_line_had_url && is_preview_block(lines, idx) {
                    State::InPreview
                } else {
                    self.state
                }
            }
        };

        self.prev_line_had_url = line.has(Feature::HasUrl);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::line::classify_all;

    #[test]
    fn name_time_one_line_is_start() {
        let lines = classify_all("Alex Mittell [10:30 AM]\nHello there");
        let mut analyzer = BoundaryAnalyzer::new(Profile::Standard);
        let roles = analyzer.analyze(&lines);
        assert_eq!(roles[0], LineRole::MessageStart);
        assert_eq!(roles[1], LineRole::Continuation);
    }

    #[test]
    fn name_then_time_pair_is_start() {
        let lines = classify_all("Jacob Frey\n10:30 AM\nHey everyone");
        let mut analyzer = BoundaryAnalyzer::new(Profile::Standard);
        let roles = analyzer.analyze(&lines);
        assert_eq!(roles[0], LineRole::MessageStart);
    }

    #[test]
    fn reaction_line_is_metadata() {
        let lines = classify_all(":+1: 3");
        let mut analyzer = BoundaryAnalyzer::new(Profile::Standard);
        let roles = analyzer.analyze(&lines);
        assert_eq!(roles[0], LineRole::Metadata);
    }

    #[test]
    fn thread_counter_is_metadata() {
        let lines = classify_all("4 replies");
        let mut analyzer = BoundaryAnalyzer::new(Profile::Standard);
        let roles = analyzer.analyze(&lines);
        assert_eq!(roles[0], LineRole::Metadata);
    }

    #[test]
    fn bracket_header_is_start_in_bracket_profile() {
        let lines = classify_all("[Message from Alex]\n[Time: 10:30 AM]\nHi");
        let mut analyzer = BoundaryAnalyzer::new(Profile::Bracket);
        let roles = analyzer.analyze(&lines);
        assert_eq!(roles[0], LineRole::MessageStart);
    }
}
