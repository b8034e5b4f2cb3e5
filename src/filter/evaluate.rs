//! Filter evaluation against documents.
//!
//! Missing attributes never match: `pr` is false and every comparison,
//! `ne` included, is false. Multi-valued attributes match when any of their
//! values does.

use super::ast::{CompareValue, Comparator, FilterNode};
use crate::resource::document::{AttributeMap, AttributeNode, Document};
use crate::resource::value::ScalarValue;
use crate::schema::SchemaAttribute;
use std::cmp::Ordering;

impl FilterNode {
    /// Whether `document` satisfies this filter.
    pub fn matches(&self, document: &Document) -> bool {
        evaluate(self, Scope::Document(document))
    }

    /// Whether one entry of a multi-valued complex attribute satisfies this
    /// filter. Used for value-path filters such as `emails[type eq "work"]`.
    pub fn matches_entry(&self, entry: &AttributeMap) -> bool {
        evaluate(self, Scope::Entry(entry))
    }
}

#[derive(Clone, Copy)]
enum Scope<'d> {
    Document(&'d Document),
    Entry(&'d AttributeMap),
}

fn evaluate(node: &FilterNode, scope: Scope<'_>) -> bool {
    match node {
        FilterNode::And(left, right) => evaluate(left, scope) && evaluate(right, scope),
        FilterNode::Or(left, right) => evaluate(left, scope) || evaluate(right, scope),
        FilterNode::Not(inner) => !evaluate(inner, scope),
        FilterNode::Comparison {
            path,
            comparator,
            value,
        } => {
            let attribute = &path.attribute;
            if *comparator == Comparator::Pr && attribute.is_complex() {
                return complex_present(attribute, scope);
            }
            let values = scalars_in_scope(attribute, scope);
            values
                .iter()
                .any(|scalar| compare(scalar, *comparator, value, attribute.case_exact))
        }
        FilterNode::ValuePath {
            attribute, filter, ..
        } => match scope {
            Scope::Document(document) => match document.get(attribute) {
                Some(AttributeNode::MultiComplex { values, .. }) => {
                    values.iter().any(|entry| filter.matches_entry(entry))
                }
                Some(AttributeNode::Complex { value, .. }) => filter.matches_entry(value),
                _ => false,
            },
            Scope::Entry(_) => false,
        },
    }
}

fn complex_present(attribute: &SchemaAttribute, scope: Scope<'_>) -> bool {
    let node = match scope {
        Scope::Document(document) => document.get(attribute),
        Scope::Entry(entry) => entry.get(&attribute.name),
    };
    node.is_some_and(|n| !n.is_empty())
}

fn scalars_in_scope<'d>(attribute: &SchemaAttribute, scope: Scope<'d>) -> Vec<&'d ScalarValue> {
    match scope {
        Scope::Document(document) => document.values_of(attribute),
        Scope::Entry(entry) => entry
            .get(&attribute.name)
            .map(AttributeNode::scalars)
            .unwrap_or_default(),
    }
}

fn compare(
    scalar: &ScalarValue,
    comparator: Comparator,
    literal: &CompareValue,
    case_exact: bool,
) -> bool {
    match (comparator, literal) {
        (Comparator::Pr, _) => match scalar {
            ScalarValue::String(s) | ScalarValue::Reference(s) | ScalarValue::Binary(s) => {
                !s.is_empty()
            }
            ScalarValue::Any(v) => !v.is_null(),
            _ => true,
        },
        // a present value is never equal to null
        (Comparator::Eq, CompareValue::Null) => false,
        (Comparator::Ne, CompareValue::Null) => true,
        (_, CompareValue::Null) => false,
        (comparator, literal) => {
            if let ScalarValue::Any(raw) = scalar {
                return compare_any(raw, comparator, literal, case_exact);
            }
            let Some(rhs) = literal_as_scalar(literal) else {
                return false;
            };
            if comparator.is_substring() {
                return substring(scalar, comparator, &rhs, case_exact);
            }
            let Some(ordering) = scalar.compare(&rhs, case_exact) else {
                return false;
            };
            match comparator {
                Comparator::Eq => ordering == Ordering::Equal,
                Comparator::Ne => ordering != Ordering::Equal,
                Comparator::Gt => ordering == Ordering::Greater,
                Comparator::Ge => ordering != Ordering::Less,
                Comparator::Lt => ordering == Ordering::Less,
                Comparator::Le => ordering != Ordering::Greater,
                _ => false,
            }
        }
    }
}

fn literal_as_scalar(literal: &CompareValue) -> Option<ScalarValue> {
    match literal {
        CompareValue::String(s) => Some(ScalarValue::String(s.clone())),
        CompareValue::Boolean(b) => Some(ScalarValue::Boolean(*b)),
        CompareValue::Number(n) => Some(ScalarValue::Decimal(*n)),
        CompareValue::DateTime(dt) => Some(ScalarValue::DateTime(*dt)),
        CompareValue::Null => None,
    }
}

fn substring(scalar: &ScalarValue, comparator: Comparator, rhs: &ScalarValue, case_exact: bool) -> bool {
    let (Some(haystack), Some(needle)) = (scalar.as_str(), rhs.as_str()) else {
        return false;
    };
    let (haystack, needle) = if case_exact {
        (haystack.to_string(), needle.to_string())
    } else {
        (haystack.to_lowercase(), needle.to_lowercase())
    };
    match comparator {
        Comparator::Co => haystack.contains(&needle),
        Comparator::Sw => haystack.starts_with(&needle),
        Comparator::Ew => haystack.ends_with(&needle),
        _ => false,
    }
}

fn compare_any(
    raw: &serde_json::Value,
    comparator: Comparator,
    literal: &CompareValue,
    case_exact: bool,
) -> bool {
    match raw {
        serde_json::Value::String(s) => {
            compare(&ScalarValue::String(s.clone()), comparator, literal, case_exact)
        }
        other => match comparator {
            Comparator::Eq => *other == literal.to_json(),
            Comparator::Ne => *other != literal.to_json(),
            _ => false,
        },
    }
}
