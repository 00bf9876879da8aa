//! # Selector Queries
//!
//! Predicate-based reads against a collection. A selector is a conjunction
//! of conditions and renders to the database's `_find` body.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Selector operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    /// Equals
    #[serde(rename = "$eq")]
    Eq,

    /// Greater than or equal
    #[serde(rename = "$gte")]
    Gte,

    /// Less than or equal
    #[serde(rename = "$lte")]
    Lte,
}

impl Operator {
    /// Operator name in the query language
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "$eq",
            Operator::Gte => "$gte",
            Operator::Lte => "$lte",
        }
    }
}

/// A single field predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Field to test
    pub field: String,

    /// Comparison operator
    pub operator: Operator,

    /// Value to compare against
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Check if a document matches this condition
    pub fn matches(&self, doc: &Value) -> bool {
        let Some(field_value) = doc.get(&self.field) else {
            return false;
        };

        match self.operator {
            Operator::Eq => field_value == &self.value,
            Operator::Gte => matches!(
                compare_json_values(field_value, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lte => matches!(
                compare_json_values(field_value, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Order two JSON values of the same kind; mixed kinds are unordered
fn compare_json_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// A set of conditions combined with AND logic
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    pub conditions: Vec<Condition>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Selector matching `field == value`
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().and(Condition::new(field, Operator::Eq, value.into()))
    }

    /// Add a `field >= value` condition
    pub fn gte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.and(Condition::new(field, Operator::Gte, value.into()))
    }

    /// Add a `field <= value` condition
    pub fn lte(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.and(Condition::new(field, Operator::Lte, value.into()))
    }

    /// Check if a document matches every condition
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|c| c.matches(doc))
    }

    /// Render the selector object.
    ///
    /// A field with a single equality renders as `{field: value}`; any other
    /// combination renders as an operator object, e.g.
    /// `{"timestamp": {"$gte": 1, "$lte": 2}}`.
    pub fn to_selector(&self) -> Value {
        let mut fields: Map<String, Value> = Map::new();
        let mut field_order: Vec<&str> = Vec::new();

        for condition in &self.conditions {
            if !field_order.contains(&condition.field.as_str()) {
                field_order.push(&condition.field);
            }
        }

        for field in field_order {
            let conditions: Vec<&Condition> = self
                .conditions
                .iter()
                .filter(|c| c.field == field)
                .collect();

            let rendered = match conditions.as_slice() {
                [only] if only.operator == Operator::Eq => only.value.clone(),
                many => Value::Object(
                    many.iter()
                        .map(|c| (c.operator.as_str().to_string(), c.value.clone()))
                        .collect(),
                ),
            };
            fields.insert(field.to_string(), rendered);
        }

        Value::Object(fields)
    }

    /// Render the full `_find` request body
    pub fn to_query(&self) -> Value {
        json!({ "selector": self.to_selector() })
    }

    /// Render one page of a `_find` request, resuming after `bookmark`
    pub fn to_page_query(&self, limit: usize, bookmark: Option<&str>) -> Value {
        let mut query = self.to_query();
        query["limit"] = json!(limit);
        if let Some(bookmark) = bookmark {
            query["bookmark"] = json!(bookmark);
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_renders_plain_value() {
        let selector = Selector::eq("link", "https://example.org");
        assert_eq!(
            selector.to_query(),
            json!({"selector": {"link": "https://example.org"}})
        );
    }

    #[test]
    fn test_range_merges_into_one_operator_object() {
        let selector = Selector::new().gte("timestamp", 10).lte("timestamp", 20);
        assert_eq!(
            selector.to_selector(),
            json!({"timestamp": {"$gte": 10, "$lte": 20}})
        );
    }

    #[test]
    fn test_single_bound_renders_operator_object() {
        let selector = Selector::new().lte("timestamp", 5);
        assert_eq!(selector.to_selector(), json!({"timestamp": {"$lte": 5}}));
    }

    #[test]
    fn test_matches_range_inclusive() {
        let selector = Selector::new().gte("timestamp", 10).lte("timestamp", 20);
        assert!(selector.matches(&json!({"timestamp": 10})));
        assert!(selector.matches(&json!({"timestamp": 20})));
        assert!(!selector.matches(&json!({"timestamp": 9})));
        assert!(!selector.matches(&json!({"timestamp": 21})));
    }

    #[test]
    fn test_missing_field_never_matches() {
        assert!(!Selector::eq("_id", "a").matches(&json!({"link": "a"})));
        assert!(!Selector::new().gte("timestamp", 0).matches(&json!({})));
    }

    #[test]
    fn test_mixed_kinds_do_not_compare() {
        let selector = Selector::new().gte("timestamp", 10);
        assert!(!selector.matches(&json!({"timestamp": "99"})));
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        assert!(Selector::new().matches(&json!({"anything": 1})));
        assert_eq!(Selector::new().to_selector(), json!({}));
    }

    #[test]
    fn test_page_query_carries_limit_and_bookmark() {
        let selector = Selector::eq("link", "l");
        assert_eq!(
            selector.to_page_query(200, None),
            json!({"selector": {"link": "l"}, "limit": 200})
        );
        assert_eq!(
            selector.to_page_query(10, Some("g1AAAA")),
            json!({"selector": {"link": "l"}, "limit": 10, "bookmark": "g1AAAA"})
        );
    }
}
