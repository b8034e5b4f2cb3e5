//! Tokenizer for RFC 7644 §3.4.2.2 filter expressions.
//!
//! Keywords are not recognised here: `pr`, `and` or `not` are ordinary words
//! until the parser decides, by position, what they mean.

use crate::error::FilterError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    LParen,
    RParen,
    LBracket,
    RBracket,
    /// Attribute path, operator, keyword or number
    Word(String),
    /// Quoted string literal, unescaped
    Str(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub kind: TokenKind,
    /// Byte offset of the first character
    pub start: usize,
    /// Byte offset one past the last character
    pub end: usize,
}

impl Token {
    pub fn word(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Word(word) => Some(word),
            _ => None,
        }
    }

    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.word().is_some_and(|w| w.eq_ignore_ascii_case(keyword))
    }
}

pub(crate) fn tokenize(input: &str) -> Result<Vec<Token>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let single = match c {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            _ => None,
        };

        if c.is_whitespace() {
            chars.next();
        } else if let Some(kind) = single {
            chars.next();
            tokens.push(Token {
                kind,
                start,
                end: start + 1,
            });
        } else if c == '"' {
            chars.next();
            let (value, end) = read_string(input, start, &mut chars)?;
            tokens.push(Token {
                kind: TokenKind::Str(value),
                start,
                end,
            });
        } else {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if c.is_whitespace() || matches!(c, '(' | ')' | '[' | ']' | '"') {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            tokens.push(Token {
                kind: TokenKind::Word(input[start..end].to_string()),
                start,
                end,
            });
        }
    }

    Ok(tokens)
}

fn read_string(
    input: &str,
    start: usize,
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> Result<(String, usize), FilterError> {
    let mut value = String::new();
    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((value, i + 1)),
            '\\' => {
                let (j, escaped) = chars.next().ok_or_else(|| unterminated(input, start))?;
                match escaped {
                    '"' => value.push('"'),
                    '\\' => value.push('\\'),
                    '/' => value.push('/'),
                    'b' => value.push('\u{0008}'),
                    'f' => value.push('\u{000C}'),
                    'n' => value.push('\n'),
                    'r' => value.push('\r'),
                    't' => value.push('\t'),
                    'u' => {
                        let hex: String = (0..4).filter_map(|_| chars.next().map(|(_, h)| h)).collect();
                        let decoded = u32::from_str_radix(&hex, 16)
                            .ok()
                            .and_then(char::from_u32)
                            .ok_or_else(|| {
                                FilterError::new("invalid unicode escape", format!("\\u{}", hex), j - 1)
                            })?;
                        value.push(decoded);
                    }
                    other => {
                        return Err(FilterError::new(
                            "invalid escape sequence",
                            format!("\\{}", other),
                            j - 1,
                        ));
                    }
                }
            }
            other => value.push(other),
        }
    }
    Err(unterminated(input, start))
}

fn unterminated(input: &str, start: usize) -> FilterError {
    FilterError::new("unterminated string literal", &input[start..], start)
}
