//! Subject resolution tests

use super::{Subject, SubjectClass, SubjectKey, SubjectResolver};

fn hierarchy() -> (SubjectClass, SubjectClass, SubjectClass) {
    let record = SubjectClass::new("Record");
    let content = SubjectClass::extends("Content", &record);
    let article = SubjectClass::extends("Article", &content);
    (record, content, article)
}

// ============================================================================
// Identity Resolution Tests
// ============================================================================

#[test]
fn test_class_identities_most_derived_first() {
    let (_, _, article) = hierarchy();

    let keys = SubjectResolver::identities_for(&Subject::from(&article));
    assert_eq!(
        keys,
        vec![
            SubjectKey::All,
            SubjectKey::from("Article"),
            SubjectKey::from("Content"),
            SubjectKey::from("Record"),
        ]
    );
}

#[test]
fn test_instance_resolves_through_class() {
    let (_, _, article) = hierarchy();
    let instance = article.instance().with_attribute("owner_id", 7);

    assert_eq!(
        SubjectResolver::identities_for(&Subject::from(instance)),
        SubjectResolver::identities_for(&Subject::from(&article)),
    );
}

#[test]
fn test_tag_and_wildcard_identities() {
    assert_eq!(
        SubjectResolver::identities_for(&Subject::tag("dashboard")),
        vec![SubjectKey::All, SubjectKey::from("dashboard")]
    );
    assert_eq!(SubjectResolver::identities_for(&Subject::All), vec![SubjectKey::All]);
}

#[test]
fn test_explicit_interfaces_are_identities() {
    let article = SubjectClass::with_ancestors("Article", ["Commentable", "Record"]);

    let keys = SubjectResolver::identities_for(&Subject::from(&article));
    assert!(keys.contains(&SubjectKey::from("Commentable")));
    assert_eq!(keys.last(), Some(&SubjectKey::from("Record")));
}

#[test]
fn test_any_of_union_without_duplicates() {
    let (record, content, _) = hierarchy();
    let subject = Subject::any_of([Subject::from(&content), Subject::from(&record)]);

    assert_eq!(
        SubjectResolver::identities_for(&subject),
        vec![SubjectKey::All, SubjectKey::from("Content"), SubjectKey::from("Record")]
    );
}

// ============================================================================
// Probe Flattening Tests
// ============================================================================

#[test]
fn test_probes_flatten_nested_any_of() {
    let (record, content, article) = hierarchy();
    let subject = Subject::any_of([
        Subject::from(&article),
        Subject::any_of([Subject::from(&content), Subject::from(&record)]),
    ]);

    let probes = SubjectResolver::probes(&subject);
    assert_eq!(probes.len(), 3);
    assert_eq!(probes[0], &Subject::from(&article));
    assert_eq!(probes[2], &Subject::from(&record));
}

#[test]
fn test_probes_single_subject() {
    let subject = Subject::tag("reports");
    assert_eq!(SubjectResolver::probes(&subject), vec![&subject]);
}
