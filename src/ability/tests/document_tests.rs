//! Rule document loading tests

use cretoai_ability::{Ability, AbilityError, RuleDocument, Subject};
use std::io::Write;
use tempfile::NamedTempFile;

const DOCUMENT: &str = r#"{
  "classes": [{"name": "Content"}, {"name": "Article", "extends": "Content"}],
  "aliases": [{"target": "modify", "sources": ["update", "destroy"]}],
  "rules": [
    {"effect": "grant", "actions": "read", "subjects": "all"},
    {"effect": "grant", "actions": ["modify"], "subjects": ["Article"],
     "conditions": {"owner_id": 1, "title": {"$regex": "^Rust"}, "tag": ["a", "b"]}},
    {"effect": "deny", "actions": "publish", "subjects": "Content",
     "raw": {"fragment": "published_at IS NULL", "params": []}}
  ]
}"#;

fn write_document(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

// ============================================================================
// LOADING
// ============================================================================

#[test]
fn test_load_from_path() {
    let file = write_document(DOCUMENT);
    let document = RuleDocument::from_path(file.path()).unwrap();

    assert_eq!(document.classes.len(), 2);
    assert_eq!(document.aliases.len(), 1);
    assert_eq!(document.rules.len(), 3);
}

#[test]
fn test_missing_file() {
    let err = RuleDocument::from_path("/nonexistent/rules.json").unwrap_err();
    assert!(matches!(err, AbilityError::Io(_)));
}

#[test]
fn test_invalid_json() {
    let file = write_document("{ not json");
    let err = RuleDocument::from_path(file.path()).unwrap_err();
    assert!(matches!(err, AbilityError::Document(_)));
}

#[test]
fn test_invalid_pattern_is_configuration_error() {
    let document = RuleDocument::from_json_str(
        r#"{"rules": [{"effect": "grant", "actions": "read", "conditions": {"title": {"$regex": "("}}}]}"#,
    )
    .unwrap();

    assert!(document.apply(&mut Ability::new()).unwrap_err().is_configuration());
}

// ============================================================================
// APPLYING
// ============================================================================

#[test]
fn test_applied_document_drives_checks() {
    let document = RuleDocument::from_json_str(DOCUMENT).unwrap();
    let mut ability = Ability::new();
    let registry = document.apply(&mut ability).unwrap();

    let article = registry.get("Article").cloned().unwrap();
    assert_eq!(article.lineage(), vec!["Article", "Content"]);

    let own = article
        .instance()
        .with_attribute("owner_id", 1)
        .with_attribute("title", "Rust in practice")
        .with_attribute("tag", "a");
    let foreign = own.clone().with_attribute("owner_id", 2);

    assert!(ability.allowed("show", &Subject::from(&article)).unwrap());
    assert!(ability.allowed("destroy", &Subject::from(own)).unwrap());
    assert!(ability.denied("update", &Subject::from(foreign)).unwrap());
}

#[test]
fn test_raw_rule_reaches_query_bridge() {
    let document = RuleDocument::from_json_str(DOCUMENT).unwrap();
    let mut ability = Ability::new();
    let registry = document.apply(&mut ability).unwrap();
    let article = Subject::from(registry.class_or_root("Article"));

    let rules = ability.rule_set_for_query("publish", &article).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].raw_query().map(|q| q.fragment.as_str()), Some("published_at IS NULL"));
    assert!(ability.allowed("publish", &article).unwrap_err().is_configuration());
}

#[test]
fn test_document_permissions() {
    let document = RuleDocument::from_json_str(DOCUMENT).unwrap();
    let mut ability = Ability::new();
    document.apply(&mut ability).unwrap();

    let permissions = ability.permissions();
    assert_eq!(permissions.granted("index"), &["all"]);
    assert_eq!(permissions.granted("destroy"), &["Article"]);
    assert_eq!(permissions.granted("edit"), &["Article"]);
    assert_eq!(permissions.denied("publish"), &["Content"]);
}
