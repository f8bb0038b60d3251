use test_utils::feedback_fixture;

use super::feedback_as_text;
use super::format_feedback;
use super::FeedbackPanel;
use crate::domain::models::Feedback;
use crate::domain::models::FeedbackItem;

#[test]
fn it_splits_numbered_items_and_bullets() {
    let items = format_feedback("1. Do X - tip A - tip B\n2. Do Y");

    assert_eq!(
        items,
        vec![
            FeedbackItem {
                number: Some("1.".to_string()),
                text: "Do X".to_string(),
                bullets: vec!["tip A".to_string(), "tip B".to_string()],
            },
            FeedbackItem {
                number: Some("2.".to_string()),
                text: "Do Y".to_string(),
                bullets: vec![],
            },
        ]
    );
}

#[test]
fn it_keeps_unnumbered_text_whole() {
    let items = format_feedback("Great job today - keep practicing!");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].number, None);
    assert_eq!(items[0].text, "Great job today - keep practicing!");
    assert!(items[0].bullets.is_empty());
}

#[test]
fn it_keeps_numbered_text_without_hyphens_unbulleted() {
    let items = format_feedback("1. Palabras: hola, adiós");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].number, Some("1.".to_string()));
    assert_eq!(items[0].text, "Palabras: hola, adiós");
    assert!(items[0].bullets.is_empty());
}

#[test]
fn it_keeps_leading_text_before_first_number() {
    let items = format_feedback("Summary:\n1. hola\n2. adiós");

    assert_eq!(items.len(), 3);
    assert_eq!(items[0].number, None);
    assert_eq!(items[0].text, "Summary:");
    assert_eq!(items[1].number, Some("1.".to_string()));
    assert_eq!(items[2].number, Some("2.".to_string()));
}

#[test]
fn it_does_not_split_decimals() {
    let items = format_feedback("1. Score 4.5 out of 5");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].text, "Score 4.5 out of 5");
}

#[test]
fn it_splits_multi_digit_numbers_once() {
    let items = format_feedback("10. diez\n11. once");

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].number, Some("10.".to_string()));
    assert_eq!(items[1].number, Some("11.".to_string()));
}

#[test]
fn it_returns_nothing_for_empty_text() {
    assert!(format_feedback("").is_empty());
    assert!(format_feedback("  \n").is_empty());
}

#[test]
fn it_formats_fixture_as_text() {
    let items = format_feedback(feedback_fixture());

    insta::assert_snapshot!(feedback_as_text(&items), @r###"
    1. Español words learned: hola, adiós, gracias, por favor
    2. Overall evaluation score: 4/5
    3. Feedback:
      • Practice greetings daily
      • Review the accents on adiós
      • Try longer sentences
    "###);
}

#[test]
fn it_renders_failed_feedback_as_single_line() {
    let feedback = Feedback::failure("Failed to get feedback. Error: HTTP error! status: 502");
    let lines = FeedbackPanel::new(&feedback).as_lines();

    assert_eq!(lines.len(), 1);
}

#[test]
fn it_renders_one_line_per_item_and_bullet() {
    let feedback = Feedback::new("1. Do X - tip A - tip B\n2. Do Y");
    let lines = FeedbackPanel::new(&feedback).as_lines();

    assert_eq!(lines.len(), 4);
}
