//! Recursive-descent parser for filters and PATCH paths.
//!
//! Grammar (keywords and operators are case-insensitive):
//!
//! ```text
//! filter    = or
//! or        = and *("or" and)
//! and       = unary *("and" unary)
//! unary     = "not" "(" filter ")" / "(" filter ")" / attrExp
//! attrExp   = attrPath "pr"
//!           / attrPath compareOp compValue
//!           / attrPath "[" filter "]"
//! path      = attrPath / attrPath "[" filter "]" ["." subAttr]
//! ```
//!
//! Attribute paths are resolved against the resource type while parsing, and
//! literals are checked against the resolved attribute's type, so a parsed
//! [`FilterNode`] never refers to an unknown attribute.

use super::ast::{AttributePath, CompareValue, Comparator, FilterNode};
use super::lexer::{Token, TokenKind, tokenize};
use crate::error::FilterError;
use crate::resource::value::parse_datetime;
use crate::schema::{AttributeType, ResourceType, SchemaAttribute};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;

/// Parse a filter expression.
pub fn parse_filter(input: &str, resource_type: &ResourceType) -> Result<FilterNode, FilterError> {
    let mut parser = Parser::new(input, resource_type)?;
    if parser.tokens.is_empty() {
        return Err(FilterError::new("empty filter", input, 0));
    }
    let node = parser.or(None)?;
    parser.expect_end()?;
    Ok(node)
}

/// A parsed PATCH `path`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathExpression {
    /// Top-level attribute the path starts at
    pub attribute: Arc<SchemaAttribute>,
    /// Value filter selecting entries of a multi-valued attribute
    pub filter: Option<FilterNode>,
    pub sub_attribute: Option<Arc<SchemaAttribute>>,
}

/// Parse an attribute path of the form `attr`, `attr.sub`, `attr[filter]`
/// or `attr[filter].sub`, optionally prefixed with a schema URI.
pub fn parse_path(input: &str, resource_type: &ResourceType) -> Result<PathExpression, FilterError> {
    let mut parser = Parser::new(input, resource_type)?;
    let token = parser.next_token()?;
    let text = token
        .word()
        .ok_or_else(|| parser.error_at("expected attribute path", &token))?
        .to_string();

    let resolved = resource_type
        .find_attribute(&text)
        .ok_or_else(|| parser.error_at("unknown attribute", &token))?;

    if parser.peek_kind() != Some(&TokenKind::LBracket) {
        parser.expect_end()?;
        return Ok(match top_level_of(resource_type, &resolved) {
            Some(parent) => PathExpression {
                attribute: parent,
                filter: None,
                sub_attribute: Some(resolved),
            },
            None => PathExpression {
                attribute: resolved,
                filter: None,
                sub_attribute: None,
            },
        });
    }

    if !resolved.is_complex() || resolved.is_sub_attribute() {
        return Err(parser.error_at("value filter requires a complex attribute", &token));
    }

    parser.pos += 1;
    let filter = parser.or(Some(&resolved))?;
    parser.expect(TokenKind::RBracket)?;

    let sub_attribute = match parser.peek().cloned() {
        None => None,
        Some(token) => {
            parser.pos += 1;
            let name = token
                .word()
                .and_then(|w| w.strip_prefix('.'))
                .ok_or_else(|| parser.error_at("expected '.subAttribute'", &token))?;
            let sub = resolved
                .sub_attribute(name)
                .ok_or_else(|| parser.error_at("unknown sub-attribute", &token))?;
            Some(Arc::clone(sub))
        }
    };
    parser.expect_end()?;

    Ok(PathExpression {
        attribute: resolved,
        filter: Some(filter),
        sub_attribute,
    })
}

fn top_level_of(
    resource_type: &ResourceType,
    attribute: &SchemaAttribute,
) -> Option<Arc<SchemaAttribute>> {
    let parent = attribute.parent_name.as_ref()?;
    resource_type.find_attribute(&format!("{}:{}", attribute.schema_uri, parent))
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    resource_type: &'a ResourceType,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str, resource_type: &'a ResourceType) -> Result<Self, FilterError> {
        Ok(Self {
            input,
            tokens: tokenize(input)?,
            pos: 0,
            resource_type,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn next_token(&mut self) -> Result<Token, FilterError> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| FilterError::new("unexpected end of expression", "", self.input.len()))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), FilterError> {
        let token = self.next_token()?;
        if token.kind == kind {
            Ok(())
        } else {
            Err(self.error_at(&format!("expected {}", describe(&kind)), &token))
        }
    }

    fn expect_end(&self) -> Result<(), FilterError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error_at("unexpected trailing input", token)),
        }
    }

    fn error_at(&self, message: &str, token: &Token) -> FilterError {
        FilterError::new(message, &self.input[token.start..token.end], token.start)
    }

    fn or(&mut self, scope: Option<&Arc<SchemaAttribute>>) -> Result<FilterNode, FilterError> {
        let mut node = self.and(scope)?;
        while self.peek().is_some_and(|t| t.is_keyword("or")) {
            self.pos += 1;
            let right = self.and(scope)?;
            node = FilterNode::Or(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn and(&mut self, scope: Option<&Arc<SchemaAttribute>>) -> Result<FilterNode, FilterError> {
        let mut node = self.unary(scope)?;
        while self.peek().is_some_and(|t| t.is_keyword("and")) {
            self.pos += 1;
            let right = self.unary(scope)?;
            node = FilterNode::And(Box::new(node), Box::new(right));
        }
        Ok(node)
    }

    fn unary(&mut self, scope: Option<&Arc<SchemaAttribute>>) -> Result<FilterNode, FilterError> {
        let token = self.next_token()?;

        if token.is_keyword("not") && self.peek_kind() == Some(&TokenKind::LParen) {
            self.pos += 1;
            let inner = self.or(scope)?;
            self.expect(TokenKind::RParen)?;
            return Ok(FilterNode::Not(Box::new(inner)));
        }

        match &token.kind {
            TokenKind::LParen => {
                let inner = self.or(scope)?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Word(text) => self.attribute_expression(text, &token, scope),
            _ => Err(self.error_at("expected attribute path", &token)),
        }
    }

    fn attribute_expression(
        &mut self,
        text: &str,
        token: &Token,
        scope: Option<&Arc<SchemaAttribute>>,
    ) -> Result<FilterNode, FilterError> {
        let attribute = self
            .resolve(text, scope)
            .ok_or_else(|| self.error_at("unknown attribute", token))?;

        if self.peek_kind() == Some(&TokenKind::LBracket) {
            if scope.is_some() {
                return Err(self.error_at("nested value filters are not allowed", token));
            }
            if !attribute.is_complex() || attribute.is_sub_attribute() {
                return Err(self.error_at("value filter requires a complex attribute", token));
            }
            self.pos += 1;
            let inner = self.or(Some(&attribute))?;
            self.expect(TokenKind::RBracket)?;
            return Ok(FilterNode::ValuePath {
                attribute,
                filter: Box::new(inner),
                sub_attribute: None,
            });
        }

        let op_token = self.next_token()?;
        let comparator = op_token
            .word()
            .and_then(Comparator::parse)
            .ok_or_else(|| self.error_at("expected comparison operator", &op_token))?;

        let attribute = if comparator != Comparator::Pr && attribute.is_complex() {
            // comparisons on a complex attribute read its `value` sub-attribute
            attribute
                .sub_attribute("value")
                .cloned()
                .ok_or_else(|| self.error_at("cannot compare a complex attribute", token))?
        } else {
            attribute
        };

        let value = if comparator == Comparator::Pr {
            CompareValue::Null
        } else {
            let literal = self.next_token()?;
            self.literal(&attribute, comparator, &literal)?
        };

        Ok(FilterNode::Comparison {
            path: AttributePath {
                attribute,
                text: text.to_string(),
            },
            comparator,
            value,
        })
    }

    fn resolve(
        &self,
        text: &str,
        scope: Option<&Arc<SchemaAttribute>>,
    ) -> Option<Arc<SchemaAttribute>> {
        match scope {
            None => self.resource_type.find_attribute(text),
            Some(parent) => {
                let name = match text.split_once('.') {
                    Some((prefix, rest)) if prefix.eq_ignore_ascii_case(&parent.name) => rest,
                    _ => text,
                };
                parent.sub_attribute(name).cloned()
            }
        }
    }

    /// Convert a literal token to the attribute's type.
    fn literal(
        &self,
        attribute: &SchemaAttribute,
        comparator: Comparator,
        token: &Token,
    ) -> Result<CompareValue, FilterError> {
        let raw = match &token.kind {
            TokenKind::Str(s) => CompareValue::String(s.clone()),
            TokenKind::Word(w) if w.eq_ignore_ascii_case("true") => CompareValue::Boolean(true),
            TokenKind::Word(w) if w.eq_ignore_ascii_case("false") => CompareValue::Boolean(false),
            TokenKind::Word(w) if w.eq_ignore_ascii_case("null") => CompareValue::Null,
            TokenKind::Word(w) => Decimal::from_str(w)
                .or_else(|_| Decimal::from_scientific(w))
                .map(CompareValue::Number)
                .map_err(|_| self.error_at("invalid comparison value", token))?,
            _ => return Err(self.error_at("expected comparison value", token)),
        };

        let mismatch = |what: &str| {
            self.error_at(
                &format!(
                    "'{}' on {} attribute '{}' {}",
                    comparator,
                    attribute.data_type,
                    attribute.scim_name(),
                    what
                ),
                token,
            )
        };

        if raw == CompareValue::Null {
            return match comparator {
                Comparator::Eq | Comparator::Ne => Ok(CompareValue::Null),
                _ => Err(mismatch("cannot compare with null")),
            };
        }

        match (attribute.data_type, raw) {
            (AttributeType::Any, value) => Ok(value),
            (AttributeType::Boolean, value @ CompareValue::Boolean(_)) => {
                if comparator.is_substring() || comparator.is_ordering() {
                    Err(mismatch("is not supported"))
                } else {
                    Ok(value)
                }
            }
            (t, value @ CompareValue::Number(_)) if t.is_numeric() => {
                if comparator.is_substring() {
                    Err(mismatch("is not supported"))
                } else {
                    Ok(value)
                }
            }
            (AttributeType::DateTime, CompareValue::String(s)) => {
                if comparator.is_substring() {
                    return Err(mismatch("is not supported"));
                }
                parse_datetime(&s)
                    .map(CompareValue::DateTime)
                    .ok_or_else(|| mismatch("requires an RFC 3339 timestamp"))
            }
            (t, value @ CompareValue::String(_)) if t.is_textual() => Ok(value),
            _ => Err(mismatch("has an incompatible value")),
        }
    }
}

fn describe(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::LParen => "'('",
        TokenKind::RParen => "')'",
        TokenKind::LBracket => "'['",
        TokenKind::RBracket => "']'",
        TokenKind::Word(_) => "word",
        TokenKind::Str(_) => "string",
    }
}
