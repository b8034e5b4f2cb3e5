//! Filter expression tree.
//!
//! The tree is built bottom-up by the parser and never links back to parent
//! nodes; evaluation passes whatever context it needs down as arguments.

use crate::resource::value::{ScalarValue, format_datetime};
use crate::schema::SchemaAttribute;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    Eq,
    Ne,
    Co,
    Sw,
    Ew,
    Gt,
    Ge,
    Lt,
    Le,
    /// Present; takes no value
    Pr,
}

impl Comparator {
    pub fn parse(word: &str) -> Option<Self> {
        let comparator = match word.to_ascii_lowercase().as_str() {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "co" => Self::Co,
            "sw" => Self::Sw,
            "ew" => Self::Ew,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            "pr" => Self::Pr,
            _ => return None,
        };
        Some(comparator)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Co => "co",
            Self::Sw => "sw",
            Self::Ew => "ew",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Pr => "pr",
        }
    }

    pub fn is_substring(&self) -> bool {
        matches!(self, Self::Co | Self::Sw | Self::Ew)
    }

    pub fn is_ordering(&self) -> bool {
        matches!(self, Self::Gt | Self::Ge | Self::Lt | Self::Le)
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Literal on the right-hand side of a comparison, already converted to the
/// attribute's type.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareValue {
    String(String),
    Boolean(bool),
    Number(Decimal),
    DateTime(DateTime<FixedOffset>),
    Null,
}

impl CompareValue {
    pub fn to_json(&self) -> Value {
        match self {
            Self::String(s) => Value::String(s.clone()),
            Self::Boolean(b) => Value::Bool(*b),
            Self::Number(n) => ScalarValue::Decimal(*n).to_json(),
            Self::DateTime(dt) => Value::String(format_datetime(dt)),
            Self::Null => Value::Null,
        }
    }
}

/// A resolved attribute reference inside a filter.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributePath {
    /// The attribute the comparison reads; a sub-attribute for `name.givenName`
    pub attribute: Arc<SchemaAttribute>,
    /// The path as written
    pub text: String,
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    And(Box<FilterNode>, Box<FilterNode>),
    Or(Box<FilterNode>, Box<FilterNode>),
    Not(Box<FilterNode>),
    Comparison {
        path: AttributePath,
        comparator: Comparator,
        value: CompareValue,
    },
    /// `attr[filter]`, optionally followed by `.sub` in PATCH paths
    ValuePath {
        attribute: Arc<SchemaAttribute>,
        filter: Box<FilterNode>,
        sub_attribute: Option<Arc<SchemaAttribute>>,
    },
}

impl FilterNode {
    /// Literal of a leaf comparison.
    pub fn compare_value(&self) -> Option<&CompareValue> {
        match self {
            Self::Comparison { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The `attr eq value` terms when the filter is nothing but a conjunction
    /// of equality comparisons, e.g. `type eq "work" and primary eq true`.
    pub fn equality_terms(&self) -> Option<Vec<(&Arc<SchemaAttribute>, &CompareValue)>> {
        match self {
            Self::Comparison {
                path,
                comparator: Comparator::Eq,
                value,
            } if *value != CompareValue::Null => Some(vec![(&path.attribute, value)]),
            Self::And(left, right) => {
                let mut terms = left.equality_terms()?;
                terms.extend(right.equality_terms()?);
                Some(terms)
            }
            _ => None,
        }
    }
}
