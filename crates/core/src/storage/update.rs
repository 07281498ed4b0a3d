//! Update operators applied to a document in place.
//!
//! Supported operators, applied in this order:
//!
//! 1. `$set`: overwrite the field with the operand.
//! 2. `$inc`: add a numeric operand, treating a missing field as zero.
//! 3. `$currentDate`: stamp the clock's current instant, ignoring the operand.
//! 4. `$max`: keep `max(current_or_zero, operand)`.
//!
//! Every operator accepts a dotted path (`skill_profile.grammar`). Missing
//! intermediate segments are created as empty mappings; descending through a
//! value that is not a mapping is a type mismatch.
//!
//! Numeric rules for `$inc` and `$max`:
//!
//! | current        | operand   | result                              |
//! |----------------|-----------|-------------------------------------|
//! | missing        | numeric   | operand (`$inc`) / max(0, operand)  |
//! | integer        | integer   | integer (overflow is an error)      |
//! | integer/float  | float     | float                               |
//! | non-numeric    | any       | `TypeMismatch`                      |
//! | any            | non-num.  | `InvalidUpdate`                     |

use crate::config::ID_FIELD;
use crate::document::{Document, Value};
use crate::error::{Result, StoreError};
use crate::search::compare_values;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A set of update operators targeting one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Vec<(String, Value)>,
    inc: Vec<(String, Value)>,
    current_date: Vec<String>,
    max: Vec<(String, Value)>,
}

impl Update {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set.push((field.into(), value.into()));
        self
    }

    pub fn inc(mut self, field: impl Into<String>, delta: impl Into<Value>) -> Self {
        self.inc.push((field.into(), delta.into()));
        self
    }

    pub fn current_date(mut self, field: impl Into<String>) -> Self {
        self.current_date.push(field.into());
        self
    }

    pub fn max(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.max.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
            && self.inc.is_empty()
            && self.current_date.is_empty()
            && self.max.is_empty()
    }

    /// Parses `{"$set": {..}, "$inc": {..}, "$currentDate": {..}, "$max": {..}}`.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| StoreError::InvalidUpdate(format!("expected an object, got {}", json)))?;

        let mut update = Self::new();
        for (op, fields) in object {
            if !matches!(op.as_str(), "$set" | "$inc" | "$currentDate" | "$max") {
                return Err(StoreError::InvalidUpdate(format!(
                    "unsupported operator '{}'",
                    op
                )));
            }
            let fields = fields.as_object().ok_or_else(|| {
                StoreError::InvalidUpdate(format!("operand of '{}' must be an object", op))
            })?;
            for (field, operand) in fields {
                let value = Value::from(operand.clone());
                update = match op.as_str() {
                    "$set" => update.set(field.as_str(), value),
                    "$inc" => update.inc(field.as_str(), require_numeric(op, field, value)?),
                    "$currentDate" => update.current_date(field.as_str()),
                    _ => update.max(field.as_str(), require_numeric(op, field, value)?),
                };
            }
        }
        Ok(update)
    }
}

fn require_numeric(op: &str, field: &str, value: Value) -> Result<Value> {
    if value.is_numeric() {
        Ok(value)
    } else {
        Err(StoreError::InvalidUpdate(format!(
            "{} on '{}' needs a numeric operand, got {}",
            op,
            field,
            value.type_name()
        )))
    }
}

/// Applies every operator of `update` to `doc`.
///
/// On error the document may be partially modified; callers that need
/// all-or-nothing semantics apply to a copy (the collection does).
pub fn apply_update(doc: &mut Document, update: &Update, now: DateTime<Utc>) -> Result<()> {
    for (path, value) in &update.set {
        if is_identity_path(path) {
            if doc.get(ID_FIELD) == Some(value) {
                continue;
            }
            return Err(StoreError::ImmutableField(path.clone()));
        }
        let (parent, leaf) = parent_map(doc.fields_mut(), path)?;
        parent.insert(leaf.to_string(), value.clone());
    }

    for (path, delta) in &update.inc {
        guard_identity(path)?;
        let delta = require_numeric("$inc", path, delta.clone())?;
        let (parent, leaf) = parent_map(doc.fields_mut(), path)?;
        let next = match parent.get(leaf) {
            None => delta,
            Some(current) => add_numeric(path, current, &delta)?,
        };
        parent.insert(leaf.to_string(), next);
    }

    for path in &update.current_date {
        guard_identity(path)?;
        let (parent, leaf) = parent_map(doc.fields_mut(), path)?;
        parent.insert(leaf.to_string(), Value::Timestamp(now));
    }

    for (path, candidate) in &update.max {
        guard_identity(path)?;
        let candidate = require_numeric("$max", path, candidate.clone())?;
        let (parent, leaf) = parent_map(doc.fields_mut(), path)?;
        let current = match parent.get(leaf) {
            None => Value::Integer(0),
            Some(v) if v.is_numeric() => v.clone(),
            Some(v) => {
                return Err(StoreError::TypeMismatch {
                    field: path.clone(),
                    expected: "number",
                    found: v.type_name(),
                })
            }
        };
        let next = match compare_values(&candidate, &current) {
            Ordering::Greater => candidate,
            _ => current,
        };
        parent.insert(leaf.to_string(), next);
    }

    Ok(())
}

fn is_identity_path(path: &str) -> bool {
    path.split('.').next() == Some(ID_FIELD)
}

fn guard_identity(path: &str) -> Result<()> {
    if is_identity_path(path) {
        Err(StoreError::ImmutableField(path.to_string()))
    } else {
        Ok(())
    }
}

fn add_numeric(path: &str, current: &Value, delta: &Value) -> Result<Value> {
    match (current, delta) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(*b)
            .map(Value::Integer)
            .ok_or_else(|| StoreError::Overflow(path.to_string())),
        (a, b) if a.is_numeric() => {
            Ok(Value::Float(a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0)))
        }
        (other, _) => Err(StoreError::TypeMismatch {
            field: path.to_string(),
            expected: "number",
            found: other.type_name(),
        }),
    }
}

/// Walks a dotted path, creating empty mappings for missing intermediate
/// segments, and returns the mapping that owns the leaf plus the leaf name.
fn parent_map<'m, 'p>(
    fields: &'m mut BTreeMap<String, Value>,
    path: &'p str,
) -> Result<(&'m mut BTreeMap<String, Value>, &'p str)> {
    let segments: Vec<&'p str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| StoreError::InvalidPath(path.to_string()))?;

    let mut current = fields;
    for (depth, segment) in parents.iter().enumerate() {
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Map(BTreeMap::new()));
        current = match entry {
            Value::Map(m) => m,
            other => {
                return Err(StoreError::TypeMismatch {
                    field: segments[..=depth].join("."),
                    expected: "map",
                    found: other.type_name(),
                })
            }
        };
    }
    Ok((current, *leaf))
}
