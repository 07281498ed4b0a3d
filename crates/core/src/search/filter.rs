//! Filter evaluation for store queries.
//!
//! Evaluates a [`Filter`] against a [`Document`]. Conditions are AND-ed and
//! only top-level fields are consulted:
//!
//! | condition  | field missing | field present                               |
//! |------------|---------------|---------------------------------------------|
//! | `Eq`       | no match      | [`Value::loose_eq`]                         |
//! | `Contains` | no match      | substring of the value's `Display` output   |
//! | `Range`    | match         | match (permissive, see [`Condition::Range`]) |

use crate::document::Document;
use crate::filter_types::{Condition, Filter};

/// Check if a document matches every condition of the filter.
pub fn matches_filter(doc: &Document, filter: &Filter) -> bool {
    filter
        .conditions()
        .iter()
        .all(|(field, cond)| evaluate_condition(doc, field, cond))
}

fn evaluate_condition(doc: &Document, field: &str, cond: &Condition) -> bool {
    match cond {
        Condition::Range { .. } => true,
        Condition::Eq(expected) => doc.get(field).is_some_and(|v| v.loose_eq(expected)),
        Condition::Contains(needle) => doc
            .get(field)
            .is_some_and(|v| v.to_string().contains(needle.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Value;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn doc(json: serde_json::Value) -> Document {
        Document::from_json(json).unwrap()
    }

    #[test]
    fn test_eq_string() {
        let d = doc(json!({"type": "grammar"}));
        assert!(matches_filter(&d, &Filter::all().eq("type", "grammar")));
        assert!(!matches_filter(&d, &Filter::all().eq("type", "vocabulary")));
    }

    #[test]
    fn test_eq_integer_vs_float() {
        let d = doc(json!({"frequency": 3}));
        assert!(matches_filter(&d, &Filter::all().eq("frequency", 3.0)));
    }

    #[test]
    fn test_eq_large_integer_vs_float_is_exact() {
        let d = Document::new().with("n", 9_007_199_254_740_993i64);
        assert!(!matches_filter(&d, &Filter::all().eq("n", 9_007_199_254_740_992.0)));
        assert!(matches_filter(&d, &Filter::all().eq("n", 9_007_199_254_740_993i64)));
    }

    #[test]
    fn test_eq_string_vs_number_mismatch() {
        let d = doc(json!({"x": "42"}));
        assert!(!matches_filter(&d, &Filter::all().eq("x", 42i64)));
    }

    #[test]
    fn test_missing_field_returns_false() {
        let d = doc(json!({}));
        assert!(!matches_filter(&d, &Filter::all().eq("missing", "anything")));
        assert!(!matches_filter(&d, &Filter::all().contains("missing", "a")));
    }

    #[test]
    fn test_contains_substring() {
        let d = doc(json!({"conversation_id": "conv_u1_2024"}));
        assert!(matches_filter(&d, &Filter::all().contains("conversation_id", "u1")));
        assert!(!matches_filter(&d, &Filter::all().contains("conversation_id", "u2")));
    }

    #[test]
    fn test_contains_uses_string_representation() {
        let d = doc(json!({"score": 1234}));
        assert!(matches_filter(&d, &Filter::all().contains("score", "23")));
    }

    #[test]
    fn test_contains_is_not_a_regex() {
        let d = doc(json!({"item": "past tense"}));
        assert!(!matches_filter(&d, &Filter::all().contains("item", "p.st")));
    }

    #[test]
    fn test_range_always_satisfied() {
        let yesterday = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let d = Document::new().with("created_at", yesterday);
        let far_future = Value::Timestamp(Utc.with_ymd_and_hms(2099, 1, 1, 0, 0, 0).unwrap());
        let filter = Filter::all().range("created_at", Some(far_future), None);
        assert!(matches_filter(&d, &filter));
    }

    #[test]
    fn test_range_on_missing_field_satisfied() {
        let d = doc(json!({"user_id": "u1"}));
        let filter = Filter::all()
            .eq("user_id", "u1")
            .range("timestamp", Some(Value::Integer(0)), Some(Value::Integer(1)));
        assert!(matches_filter(&d, &filter));
    }

    #[test]
    fn test_range_does_not_rescue_failed_equality() {
        let d = doc(json!({"user_id": "u2"}));
        let filter = Filter::all()
            .eq("user_id", "u1")
            .range("created_at", None, None);
        assert!(!matches_filter(&d, &filter));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        assert!(matches_filter(&doc(json!({"any": 1})), &Filter::all()));
        assert!(matches_filter(&Document::new(), &Filter::all()));
    }

    #[test]
    fn test_multiple_conditions_are_anded() {
        let d = doc(json!({"user_id": "u1", "type": "grammar", "item": "past tense"}));
        let hit = Filter::all()
            .eq("user_id", "u1")
            .eq("type", "grammar")
            .eq("item", "past tense");
        let miss = Filter::all().eq("user_id", "u1").eq("type", "vocabulary");
        assert!(matches_filter(&d, &hit));
        assert!(!matches_filter(&d, &miss));
    }
}
