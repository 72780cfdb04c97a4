//! Tests for record normalization

use super::*;
use crate::config::NormalizeConfig;
use crate::types::JsonValue;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeSet;
use test_case::test_case;

fn sanitizer() -> KeySanitizer {
    let config = NormalizeConfig::default();
    KeySanitizer::new(config.marker_suffix, config.boolean_vocabulary)
}

// ============================================================================
// Key Sanitizer
// ============================================================================

#[test_case("archived?", "is_archived")]
#[test_case("published_for_web?", "is_published_for_web")]
#[test_case("default?", "is_default")]
#[test_case("billable?", "billable")]
#[test_case("archived??", "is_archived" ; "repeated suffix")]
fn test_sanitize_marked_keys(key: &str, expected: &str) {
    assert_eq!(sanitizer().sanitize(key).as_deref(), Some(expected));
}

#[test]
fn test_show_resources_is_boolean() {
    assert_eq!(
        sanitizer().sanitize("show_resources?").as_deref(),
        Some("is_show_resources")
    );
}

#[test_case("archived" ; "vocabulary word without marker")]
#[test_case("is_archived" ; "already sanitized")]
#[test_case("what?s_new" ; "marker inside key")]
#[test_case("" ; "empty key")]
fn test_unmarked_keys_untouched(key: &str) {
    assert_eq!(sanitizer().sanitize(key), None);
}

#[test]
fn test_custom_suffix_and_vocabulary() {
    let sanitizer = KeySanitizer::new("_flag", BTreeSet::from(["locked".to_string()]));
    assert_eq!(sanitizer.sanitize("locked_flag").as_deref(), Some("is_locked"));
    assert_eq!(sanitizer.sanitize("archived_flag").as_deref(), Some("archived"));
    assert_eq!(sanitizer.sanitize("archived?"), None);
}

#[test]
fn test_empty_suffix_disables_renaming() {
    let sanitizer = KeySanitizer::new("", BTreeSet::new());
    assert_eq!(sanitizer.sanitize("anything?"), None);
}

#[test]
fn test_sanitize_nested_structures() {
    let record = json!({
        "id": 1,
        "active?": true,
        "settings": {"visible?": false, "color": "red"},
        "tags": [{"required?": true}, {"label": "x"}, 3, null]
    });
    assert_eq!(
        walk(record, &sanitizer()),
        json!({
            "id": 1,
            "is_active": true,
            "settings": {"is_visible": false, "color": "red"},
            "tags": [{"is_required": true}, {"label": "x"}, 3, null]
        })
    );
}

// ============================================================================
// Map Flattener
// ============================================================================

fn flattener() -> MapFlattener {
    MapFlattener::new(NormalizeConfig::default().dynamic_map_fields)
}

#[test]
fn test_flatten_dynamic_map() {
    let record = json!({
        "name": "Acme",
        "roles_users": {"u1": "admin", "u2": {"level": 3}}
    });
    assert_eq!(
        walk(record, &flattener()),
        json!({
            "name": "Acme",
            "roles_users": [
                {"key": "u1", "value": "admin"},
                {"key": "u2", "value": {"level": 3}}
            ]
        })
    );
}

#[test]
fn test_flatten_nested_dynamic_map() {
    let record = json!({"groups": [{"roles_users": {"a": 1}}]});
    assert_eq!(
        walk(record, &flattener()),
        json!({"groups": [{"roles_users": [{"key": "a", "value": 1}]}]})
    );
}

#[test_case(json!({"roles_users": []}) ; "already an array")]
#[test_case(json!({"roles_users": null}) ; "null")]
#[test_case(json!({"roles": {"a": 1}}) ; "field not configured")]
fn test_flatten_leaves_other_values(record: JsonValue) {
    assert_eq!(walk(record.clone(), &flattener()), record);
}

#[test]
fn test_flatten_preserves_content() {
    let map = json!({"k1": "v1", "k2": [1, 2], "k3": {"deep": true}});
    let flat = walk(json!({"roles_users": map.clone()}), &flattener());

    let rebuilt: serde_json::Map<String, JsonValue> = flat["roles_users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|pair| {
            (
                pair["key"].as_str().unwrap().to_string(),
                pair["value"].clone(),
            )
        })
        .collect();
    assert_eq!(JsonValue::Object(rebuilt), map);
}

// ============================================================================
// Normalizer
// ============================================================================

#[test]
fn test_archived_record_dropped() {
    let normalizer = Normalizer::default();
    assert_eq!(normalizer.prepare(json!({"archived?": true, "name": "x"})), None);
}

#[test]
fn test_unarchived_record_kept_and_renamed() {
    let normalizer = Normalizer::default();
    assert_eq!(
        normalizer.prepare(json!({"archived?": false, "name": "y"})),
        Some(json!({"is_archived": false, "name": "y"}))
    );
}

#[test_case(json!({"archived": true}), true ; "plain key")]
#[test_case(json!({"archived?": true}), true ; "marked key")]
#[test_case(json!({"archived?": "true"}), false ; "string flag")]
#[test_case(json!({"is_archived": true}), false ; "renamed key not consulted")]
#[test_case(json!({"child": {"archived?": true}}), false ; "nested flag")]
#[test_case(json!([1, 2]), false ; "non object record")]
fn test_is_archived(record: JsonValue, expected: bool) {
    assert_eq!(Normalizer::default().is_archived(&record), expected);
}

#[test]
fn test_normalize_is_idempotent() {
    let normalizer = Normalizer::default();
    let record = json!({
        "archived?": false,
        "enabled??": true,
        "notes?": "n",
        "roles_users": {"u1?": "r"},
        "items": [{"hidden?": true, "roles_users": {"x": "y"}}]
    });
    let once = normalizer.normalize(record);
    let twice = normalizer.normalize(once.clone());
    assert_eq!(once, twice);
}

#[test]
fn test_normalize_fixed_point_without_marked_keys() {
    let normalizer = Normalizer::default();
    let record = json!({"id": 7, "nested": {"a": [1, {"b": "c"}]}, "updated_at": "2025-01-01T00:00:00Z"});
    assert_eq!(normalizer.normalize(record.clone()), record);
}

#[test]
fn test_rename_runs_before_flatten() {
    let normalizer = Normalizer::default();
    assert_eq!(
        normalizer.normalize(json!({"roles_users?": {"u1": "admin"}})),
        json!({"roles_users": [{"key": "u1", "value": "admin"}]})
    );
}
