//! Serialization tests against the checkpoint file format

use super::*;
use serde_json::{json, Value};

/// Existence-check checkpoint as written by earlier runs
fn existence_checkpoint_fixture() -> Value {
    json!({
        "Aspirin": "EXISTS",
        "Xyzzy123NotReal": "MISSING",
        "Foo": "ERROR"
    })
}

/// Linked-id checkpoint: QIDs, plus "" for checked-without-link
fn linked_checkpoint_fixture() -> Value {
    json!({
        "D000001": "Q411065",
        "D000002": ""
    })
}

#[test]
fn existence_checkpoint_deserializes() {
    let snapshot: Snapshot = serde_json::from_value(existence_checkpoint_fixture()).unwrap();

    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot.get("Aspirin"), Some(&Outcome::Exists));
    assert_eq!(snapshot.get("Xyzzy123NotReal"), Some(&Outcome::Missing));
    assert_eq!(snapshot.get("Foo"), Some(&Outcome::Error));
}

#[test]
fn linked_checkpoint_distinguishes_empty_link_from_absent() {
    let snapshot: Snapshot = serde_json::from_value(linked_checkpoint_fixture()).unwrap();

    assert_eq!(snapshot.get("D000001").and_then(Outcome::linked_id), Some("Q411065"));
    assert_eq!(snapshot.get("D000002"), Some(&Outcome::Linked(String::new())));
    assert!(!snapshot.is_eligible("D000002"), "checked-without-link is final");
    assert!(snapshot.is_eligible("D000003"), "never-checked key is eligible");
}

#[test]
fn snapshot_serializes_as_flat_sorted_object() {
    let snapshot: Snapshot = serde_json::from_value(existence_checkpoint_fixture()).unwrap();
    let text = serde_json::to_string(&snapshot).unwrap();

    assert_eq!(
        text,
        r#"{"Aspirin":"EXISTS","Foo":"ERROR","Xyzzy123NotReal":"MISSING"}"#
    );
}

#[test]
fn only_error_outcomes_are_retryable() {
    assert!(Outcome::Error.is_retryable());
    assert!(!Outcome::Exists.is_retryable());
    assert!(!Outcome::Missing.is_retryable());
    assert!(!Outcome::Linked(String::new()).is_retryable());
    assert!(!Outcome::Linked("Q1".into()).is_retryable());
}

#[test]
fn merge_overwrites_error_entries() {
    let mut snapshot: Snapshot = serde_json::from_value(existence_checkpoint_fixture()).unwrap();
    let batch = Batch::new(1, vec![LookupKey::from("Foo")]);

    let written = snapshot.merge(BatchOutcomes::uniform(&batch, Outcome::Exists));

    assert_eq!(written, 1);
    assert_eq!(snapshot.get("Foo"), Some(&Outcome::Exists));
    assert_eq!(snapshot.len(), 3);
}

#[test]
fn counts_tally_each_kind() {
    let snapshot: Snapshot = [
        ("a", Outcome::Exists),
        ("b", Outcome::Missing),
        ("c", Outcome::Missing),
        ("d", Outcome::Error),
        ("e", Outcome::Linked("Q7".into())),
        ("f", Outcome::Linked(String::new())),
    ]
    .into_iter()
    .map(|(k, o)| (LookupKey::from(k), o))
    .collect();

    let counts = snapshot.counts();
    assert_eq!(counts.exists, 1);
    assert_eq!(counts.missing, 2);
    assert_eq!(counts.error, 1);
    assert_eq!(counts.linked, 1);
    assert_eq!(counts.unlinked, 1);
    assert_eq!(counts.total(), 6);
}
