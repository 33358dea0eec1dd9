//! Crate-level scenario tests against representative pasted-in Slack
//! conversation excerpts.

use slack_paste_formatter::{Formatter, FormatterSettings};

fn formatter() -> Formatter {
    Formatter::new(FormatterSettings::default())
}

#[test]
fn doubled_name_single_message_renders_one_callout() {
    let input = "Alex MittellAlex Mittell  [Feb 6th at 7:47 PM](https://example.com/p1)\n\nHey all, see the update\n\n4 files";
    let out = formatter().format_slack_content(input);

    assert_eq!(out.matches("[!slack]+ Message from").count(), 1);
    assert!(out.contains("[!slack]+ Message from [[Alex Mittell]]"));
    assert!(out.contains("7:47 PM"));
    assert!(out.contains("Hey all,"));
}

#[test]
fn dm_two_bursts_stay_separate_messages() {
    let input = "[10:30](https://example.com/a)\nAlex Mittell\nFirst burst body\n\n[10:31](https://example.com/b)\nAlex Mittell\nSecond burst body";
    let out = formatter().format_slack_content(input);

    assert_eq!(out.matches("[!slack]+ Message from").count(), 2);
    assert!(out.contains("First burst body"));
    assert!(out.contains("Second burst body"));
}

#[test]
fn continuation_fold_merges_orphan_timestamp_fragment() {
    let input = "Jacob Frey [7:30 PM]\n\nHere's the first part\n\n[7:48](https://example.com/p2)\nhere is more detail";
    let out = formatter().format_slack_content(input);

    assert_eq!(out.matches("[!slack]+ Message from").count(), 1);
    assert!(out.contains("Here's the first part"));
    assert!(out.contains("here is more detail"));
}

#[test]
fn app_tagged_bot_message_keeps_its_own_name() {
    let input = "Clay\nClay\nAPP  Jun 8th at 6:28 PM\nHi there, this update is automated.";
    let out = formatter().format_slack_content(input);

    assert!(out.contains("[!slack]+ Message from [[Clay]]"));
    assert!(!out.contains("Unknown User"));
}

#[test]
fn link_preview_after_url_does_not_create_new_message() {
    let input = "Jacob Frey [10:30 AM]\n\nCheck this out https://example.com/a\n![X (formerly Twitter)](https://example.com/thumb.png)\nAdded by Twitter";
    let out = formatter().format_slack_content(input);

    assert_eq!(out.matches("[!slack]+ Message from").count(), 1);
    assert!(out.contains("Added by Twitter"));
}

#[test]
fn oversize_input_is_rejected_without_parsing() {
    let huge = "x".repeat(6 * 1024 * 1024);
    let out = formatter().format_slack_content(&huge);
    assert!(out.starts_with("❌ **Input too large**"));
}

#[test]
fn is_likely_slack_gate_requires_two_indicators() {
    let f = formatter();
    assert!(f.is_likely_slack("10:30 AM\n<@U12345> said :wave:\nView thread"));
    assert!(!f.is_likely_slack("just some plain text"));
}

#[test]
fn frontmatter_wrapper_carries_expected_keys() {
    let input = "Jacob Frey [10:30 AM]\n\nHello everyone\n\nBea Diaz [10:31 AM]\n\nHi Jacob";
    let out = formatter().build_note_with_frontmatter(input);

    assert!(out.starts_with("---\n"));
    assert!(out.contains("cssclasses: slack-conversation"));
    assert!(out.contains("messages: 2"));
    assert!(out.contains("participants: 2"));
    assert!(out.contains("format: "));
}

#[test]
fn distinct_authored_messages_yield_matching_callout_count() {
    let input = "Jacob Frey [10:30 AM]\n\nFirst\n\nBea Diaz [10:31 AM]\n\nSecond\n\nCy Park [10:32 AM]\n\nThird";
    let out = formatter().format_slack_content(input);
    assert_eq!(out.matches("[!slack]+ Message from").count(), 3);
}
