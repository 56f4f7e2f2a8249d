// tests/extractor.rs

use proptest::prelude::*;
use runwatch::progress::{DEFAULT_MESSAGE, ProgressSnapshot, discovery_line, extract_progress};

fn lines(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

#[test]
fn first_unit_in_progress() {
    let snapshot = extract_progress(&lines(&["[1/3] pkg-a: Running build..."]), Some(3));

    assert_eq!(snapshot.current_package.as_deref(), Some("pkg-a"));
    assert_eq!(snapshot.current_index, Some(1));
    assert_eq!(snapshot.completed_count, 0);
    assert_eq!(snapshot.message, "Processing pkg-a (1/3)");
}

#[test]
fn completed_unit_then_next_unit() {
    let logs = lines(&["[1/3] pkg-a: completed", "[2/3] pkg-b: Running..."]);
    let snapshot = extract_progress(&logs, Some(3));

    assert_eq!(snapshot.completed_count, 1);
    assert_eq!(snapshot.current_package.as_deref(), Some("pkg-b"));
    assert_eq!(snapshot.current_index, Some(2));
    assert_eq!(snapshot.message, "Processing pkg-b (2/3)");
}

#[test]
fn empty_buffer_yields_default() {
    let snapshot = extract_progress(&[], Some(7));
    assert_eq!(snapshot, ProgressSnapshot::default());
    assert_eq!(snapshot.message, DEFAULT_MESSAGE);
}

#[test]
fn total_from_markers_when_not_known() {
    let snapshot = extract_progress(&lines(&["[2/4] lib: building"]), None);
    assert_eq!(snapshot.message, "Processing lib (2/4)");
}

#[test]
fn known_total_overrides_marker_total() {
    let snapshot = extract_progress(&lines(&["[2/4] lib: building"]), Some(10));
    assert_eq!(snapshot.message, "Processing lib (2/10)");
}

#[test]
fn newest_marker_wins_for_current_unit() {
    let logs = lines(&[
        "[1/3] pkg-a: Running build...",
        "[3/3] pkg-c: Running build...",
        "[2/3] pkg-b: Running build...",
    ]);
    let snapshot = extract_progress(&logs, Some(3));
    assert_eq!(snapshot.current_package.as_deref(), Some("pkg-b"));
    assert_eq!(snapshot.current_index, Some(2));
}

#[test]
fn completion_count_is_highest_completed_index() {
    let logs = lines(&[
        "[2/5] pkg-b: finished",
        "[1/5] pkg-a: success",
        "[3/5] pkg-c: Running",
    ]);
    let snapshot = extract_progress(&logs, None);
    assert_eq!(snapshot.completed_count, 2);
}

#[test]
fn completion_tokens_are_case_insensitive() {
    let snapshot = extract_progress(&lines(&["[1/2] a: COMPLETED in 3s"]), None);
    assert_eq!(snapshot.completed_count, 1);
}

#[test]
fn success_glyph_marks_completion_without_label() {
    let logs = lines(&["✅ [3/5]", "some unrelated line"]);
    let snapshot = extract_progress(&logs, Some(5));

    assert_eq!(snapshot.completed_count, 3);
    assert_eq!(snapshot.current_package, None);
    assert_eq!(snapshot.message, "Processed 3/5");
}

#[test]
fn check_mark_glyphs_in_action_count_as_completion() {
    let logs = lines(&["[1/2] pkg-a: ✓", "[2/2] pkg-b: done ✔"]);
    let snapshot = extract_progress(&logs, None);
    assert_eq!(snapshot.completed_count, 2);
}

#[test]
fn discovery_line_never_names_current_unit() {
    let logs = vec![discovery_line(4, "Found 4 packages")];
    let snapshot = extract_progress(&logs, None);

    assert_eq!(logs[0], "[0/4] discovery: Found 4 packages");
    assert_eq!(snapshot.current_package, None);
    assert_eq!(snapshot.current_index, None);
    assert_eq!(snapshot.message, "Processed 0/4");
}

#[test]
fn discovery_line_does_not_shadow_older_unit() {
    let logs = vec![
        "[1/4] pkg-a: Running".to_string(),
        discovery_line(4, "Found 4 packages"),
    ];
    let snapshot = extract_progress(&logs, Some(4));
    assert_eq!(snapshot.current_package.as_deref(), Some("pkg-a"));
}

#[test]
fn unmarked_buffer_reports_last_line() {
    let snapshot = extract_progress(&lines(&["compiling", "   ", "linking"]), None);
    assert_eq!(snapshot.current_package, None);
    assert_eq!(snapshot.message, "linking");
}

#[test]
fn fallback_message_strips_markers_and_colours() {
    let logs = lines(&["\x1b[31m❌ build failed\x1b[0m"]);
    let snapshot = extract_progress(&logs, None);
    assert_eq!(snapshot.message, "build failed");
}

#[test]
fn warning_marker_prefixed_unit_is_still_a_unit() {
    let logs = lines(&["⚠️ [2/3] pkg-b: deprecated option"]);
    let snapshot = extract_progress(&logs, None);
    assert_eq!(snapshot.current_package.as_deref(), Some("pkg-b"));
    assert_eq!(snapshot.current_index, Some(2));
}

#[test]
fn blank_buffer_uses_default_message() {
    let snapshot = extract_progress(&lines(&["", "   "]), None);
    assert_eq!(snapshot.message, DEFAULT_MESSAGE);
}

#[test]
fn snapshot_serializes_camel_case() {
    let snapshot = extract_progress(&lines(&["[1/3] pkg-a: Running build..."]), Some(3));
    let json = serde_json::to_value(&snapshot).unwrap();

    assert_eq!(
        json,
        serde_json::json!({
            "currentPackage": "pkg-a",
            "currentIndex": 1,
            "completedCount": 0,
            "message": "Processing pkg-a (1/3)",
        })
    );
}

fn log_line() -> impl Strategy<Value = String> {
    prop_oneof![
        (1u64..20, 1u64..20, "[a-z]{1,8}", "[A-Za-z ]{0,12}")
            .prop_map(|(i, n, label, action)| format!("[{i}/{n}] {label}: {action}")),
        (1u64..20, 1u64..20).prop_map(|(i, n)| format!("✅ [{i}/{n}]")),
        "[a-z ]{0,30}",
    ]
}

proptest! {
    #[test]
    fn extraction_is_idempotent(
        logs in proptest::collection::vec(log_line(), 0..20),
        total in proptest::option::of(1u64..50),
    ) {
        prop_assert_eq!(extract_progress(&logs, total), extract_progress(&logs, total));
    }

    #[test]
    fn message_is_never_empty(
        logs in proptest::collection::vec(log_line(), 0..20),
        total in proptest::option::of(1u64..50),
    ) {
        let snapshot = extract_progress(&logs, total);
        prop_assert!(!snapshot.message.is_empty());
    }

    #[test]
    fn completed_count_never_exceeds_largest_index(
        logs in proptest::collection::vec(log_line(), 0..20),
    ) {
        let snapshot = extract_progress(&logs, None);
        prop_assert!(snapshot.completed_count < 20);
    }
}
