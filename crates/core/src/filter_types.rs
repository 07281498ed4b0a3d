//! Filter types used by the storage layer and the query matcher.
//!
//! A [`Filter`] is an AND of per-field [`Condition`]s. It can be built with
//! the chainable constructors or parsed from the Mongo-style JSON vocabulary
//! (`{"field": literal}`, `{"$regex": ..}`, `{"$gte": .., "$lt": ..}`).

use crate::config::ID_FIELD;
use crate::document::Value;
use crate::error::{Result, StoreError};

/// A single condition on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field is present and equal to the literal (numbers compare across
    /// integer/float).
    Eq(Value),
    /// Field is present and its string representation contains the needle.
    /// Spelled `$regex` in the JSON vocabulary but matched as a plain substring.
    Contains(String),
    /// `$gte` / `$lt` bounds. Always satisfied: range filters select records
    /// loosely (e.g. "today's lesson") and callers depend on that. This is a
    /// known approximation, not a comparison.
    Range {
        gte: Option<Value>,
        lt: Option<Value>,
    },
}

/// Conjunction of field conditions. An empty filter matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, Condition)>,
}

impl Filter {
    /// The match-everything filter.
    pub fn all() -> Self {
        Self::default()
    }

    /// Filter on the identity field.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self::all().eq(ID_FIELD, id.into())
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((field.into(), Condition::Eq(value.into())));
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl Into<String>) -> Self {
        self.conditions
            .push((field.into(), Condition::Contains(needle.into())));
        self
    }

    pub fn range(
        mut self,
        field: impl Into<String>,
        gte: Option<Value>,
        lt: Option<Value>,
    ) -> Self {
        self.conditions
            .push((field.into(), Condition::Range { gte, lt }));
        self
    }

    pub fn conditions(&self) -> &[(String, Condition)] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Parses the JSON filter vocabulary.
    ///
    /// A field whose value is an object made only of `$`-prefixed keys is an
    /// operator object; any other value (including plain objects) is an
    /// equality literal. Unknown operators are rejected.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        let object = json
            .as_object()
            .ok_or_else(|| StoreError::InvalidFilter(format!("expected an object, got {}", json)))?;

        let mut filter = Self::all();
        for (field, operand) in object {
            if field.starts_with('$') {
                return Err(StoreError::InvalidFilter(format!(
                    "top-level operator '{}' is not supported",
                    field
                )));
            }
            match operand.as_object() {
                Some(ops) if !ops.is_empty() && ops.keys().any(|k| k.starts_with('$')) => {
                    filter.push_operators(field, ops)?;
                }
                _ => {
                    filter = filter.eq(field.as_str(), Value::from(operand.clone()));
                }
            }
        }
        Ok(filter)
    }

    fn push_operators(
        &mut self,
        field: &str,
        ops: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<()> {
        let mut gte = None;
        let mut lt = None;
        let mut has_range = false;

        for (op, operand) in ops {
            match op.as_str() {
                "$regex" => {
                    let needle = operand.as_str().ok_or_else(|| {
                        StoreError::InvalidFilter(format!("$regex on '{}' needs a string", field))
                    })?;
                    self.conditions
                        .push((field.to_string(), Condition::Contains(needle.to_string())));
                }
                "$gte" => {
                    gte = Some(Value::from(operand.clone()));
                    has_range = true;
                }
                "$lt" => {
                    lt = Some(Value::from(operand.clone()));
                    has_range = true;
                }
                other if other.starts_with('$') => {
                    return Err(StoreError::InvalidFilter(format!(
                        "unsupported operator '{}' on '{}'",
                        other, field
                    )));
                }
                other => {
                    return Err(StoreError::InvalidFilter(format!(
                        "operator object on '{}' mixes operators with plain key '{}'",
                        field, other
                    )));
                }
            }
        }

        if has_range {
            self.conditions
                .push((field.to_string(), Condition::Range { gte, lt }));
        }
        Ok(())
    }
}
