//! Value ordering for cursor sorts.
//!
//! Values of the same kind compare naturally (numbers numerically across
//! integer/float, strings lexicographically, timestamps chronologically).
//! Values of different kinds order by kind, following the usual document
//! database sequence: null < numbers < strings < maps < arrays < booleans <
//! timestamps.

use crate::document::{Document, Value};
use std::borrow::Cow;
use std::cmp::Ordering;

/// Sort direction for [`Cursor::sort`](crate::storage::Cursor::sort).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// Maps the conventional `1` / `-1` direction flags. Any negative number
    /// is descending.
    pub fn from_flag(flag: i32) -> Self {
        if flag < 0 {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        }
    }
}

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Integer(_) | Value::Float(_) => 1,
        Value::String(_) => 2,
        Value::Map(_) => 3,
        Value::Array(_) => 4,
        Value::Boolean(_) => 5,
        Value::Timestamp(_) => 6,
    }
}

/// Total order over values.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x.cmp(y),
        (x, y) if x.is_numeric() && y.is_numeric() => {
            let (xf, yf) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            xf.partial_cmp(&yf).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Boolean(x), Value::Boolean(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xe, ye) in x.iter().zip(y.iter()) {
                let ord = compare_values(xe, ye);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Map(_), Value::Map(_)) => a.to_string().cmp(&b.to_string()),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

/// The value a document sorts by. A missing field sorts as integer zero.
pub fn sort_key<'a>(doc: &'a Document, field: &str) -> Cow<'a, Value> {
    match doc.get(field) {
        Some(v) => Cow::Borrowed(v),
        None => Cow::Owned(Value::Integer(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_numbers_compare_across_types() {
        assert_eq!(
            compare_values(&Value::Integer(2), &Value::Float(1.5)),
            Ordering::Greater
        );
        assert_eq!(
            compare_values(&Value::Float(2.0), &Value::Integer(2)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_strings_lexicographic() {
        assert_eq!(
            compare_values(&Value::from("apple"), &Value::from("banana")),
            Ordering::Less
        );
    }

    #[test]
    fn test_timestamps_chronological() {
        let early = Value::Timestamp(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let late = Value::Timestamp(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
        assert_eq!(compare_values(&early, &late), Ordering::Less);
    }

    #[test]
    fn test_mixed_kinds_order_by_rank() {
        assert_eq!(
            compare_values(&Value::Null, &Value::Integer(-5)),
            Ordering::Less
        );
        assert_eq!(
            compare_values(&Value::from("a"), &Value::Integer(1_000)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_missing_field_sorts_as_zero() {
        let doc = Document::new();
        assert_eq!(*sort_key(&doc, "frequency"), Value::Integer(0));
        assert_eq!(
            compare_values(&sort_key(&doc, "frequency"), &Value::Integer(1)),
            Ordering::Less
        );
    }

    #[test]
    fn test_direction_from_flag() {
        assert_eq!(SortDirection::from_flag(-1), SortDirection::Descending);
        assert_eq!(SortDirection::from_flag(1), SortDirection::Ascending);
    }
}
