//! Route patterns.
//!
//! Syntax follows the common Express-style convention:
//!
//! - literal text matches itself;
//! - `:name` captures one path segment (`[^/]+?`);
//! - `:name(\d+)` captures with a custom expression;
//! - a `?`, `*` or `+` after a parameter makes it optional, zero-or-more,
//!   or one-or-more segments;
//! - an unnamed `(expr)` group or a bare `*` captures under `"0"`, `"1"`, …
//!
//! A `/` directly before a parameter belongs to it, so `/:page?` also
//! matches the bare prefix.

use std::collections::BTreeMap;

use regex::Regex;

use crate::error::{Error, Result};

/// How a pattern is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// Require the whole path to match. With `false`, the pattern only has
    /// to match a prefix ending at a segment boundary.
    pub exact: bool,
    /// Make a trailing slash significant.
    pub strict: bool,
    /// Match case-sensitively.
    pub sensitive: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            exact: true,
            strict: false,
            sensitive: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Param(Param),
}

#[derive(Debug, Clone, PartialEq)]
struct Param {
    name: String,
    prefix: Option<char>,
    expr: String,
    optional: bool,
    repeat: bool,
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    regex: Regex,
    keys: Vec<String>,
}

impl RoutePattern {
    pub fn compile(pattern: &str, options: MatchOptions) -> Result<Self> {
        let tokens = tokenize(pattern)?;
        let keys = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Param(p) => Some(p.name.clone()),
                Token::Literal(_) => None,
            })
            .collect();
        let regex = Regex::new(&to_regex(&tokens, options)).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
            keys,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parameter names in capture order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Test `path`; on a match return the captured parameters.
    ///
    /// Optional parameters that did not participate are left out.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.keys
                .iter()
                .enumerate()
                .filter_map(|(i, key)| {
                    caps.get(i + 1).map(|m| (key.clone(), m.as_str().to_string()))
                })
                .collect(),
        )
    }
}

fn invalid(pattern: &str, message: &str) -> Error {
    Error::InvalidPattern {
        pattern: pattern.to_string(),
        message: message.to_string(),
    }
}

fn tokenize(pattern: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut unnamed = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            literal.push(chars[i + 1]);
            i += 2;
            continue;
        }

        let starts_param = c == ':'
            && chars
                .get(i + 1)
                .is_some_and(|n| n.is_ascii_alphanumeric() || *n == '_');
        if !(starts_param || c == '(' || c == '*') {
            literal.push(c);
            i += 1;
            continue;
        }

        let mut j = i;
        let mut name = String::new();
        let mut expr = None;

        if c == '*' {
            expr = Some(".*".to_string());
            j += 1;
        } else {
            if starts_param {
                j += 1;
                while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                    name.push(chars[j]);
                    j += 1;
                }
            }
            if chars.get(j) == Some(&'(') {
                let (group, end) = read_group(&chars, j)
                    .ok_or_else(|| invalid(pattern, "unbalanced group"))?;
                if group.is_empty() {
                    return Err(invalid(pattern, "empty group"));
                }
                expr = Some(non_capturing(&group));
                j = end;
            }
        }

        let (optional, repeat) = match chars.get(j) {
            Some('?') if c != '*' => {
                j += 1;
                (true, false)
            }
            Some('*') if c != '*' => {
                j += 1;
                (true, true)
            }
            Some('+') if c != '*' => {
                j += 1;
                (false, true)
            }
            _ => (false, false),
        };

        let prefix = if literal.ends_with('/') {
            literal.pop();
            Some('/')
        } else {
            None
        };
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }

        if name.is_empty() {
            name = unnamed.to_string();
            unnamed += 1;
        }
        tokens.push(Token::Param(Param {
            name,
            prefix,
            expr: expr.unwrap_or_else(|| "[^/]+?".to_string()),
            optional,
            repeat,
        }));
        i = j;
    }

    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    Ok(tokens)
}

/// Read a parenthesized group starting at `open`. Returns the inner text and
/// the index just past the closing paren.
fn read_group(chars: &[char], open: usize) -> Option<(String, usize)> {
    let mut depth = 0usize;
    let mut inner = String::new();
    let mut k = open;
    while k < chars.len() {
        let c = chars[k];
        if c == '\\' && k + 1 < chars.len() {
            if depth > 0 {
                inner.push(c);
                inner.push(chars[k + 1]);
            }
            k += 2;
            continue;
        }
        match c {
            '(' => {
                if depth > 0 {
                    inner.push(c);
                }
                depth += 1;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((inner, k + 1));
                }
                inner.push(c);
            }
            _ => inner.push(c),
        }
        k += 1;
    }
    None
}

/// Turn capturing groups inside a custom expression into non-capturing
/// ones so parameter indices stay aligned.
fn non_capturing(expr: &str) -> String {
    let chars: Vec<char> = expr.chars().collect();
    let mut out = String::with_capacity(expr.len());
    let mut k = 0;
    while k < chars.len() {
        let c = chars[k];
        if c == '\\' && k + 1 < chars.len() {
            out.push(c);
            out.push(chars[k + 1]);
            k += 2;
            continue;
        }
        out.push(c);
        if c == '(' && chars.get(k + 1) != Some(&'?') {
            out.push_str("?:");
        }
        k += 1;
    }
    out
}

fn to_regex(tokens: &[Token], options: MatchOptions) -> String {
    let mut tokens = tokens.to_vec();
    let ends_with_slash = matches!(tokens.last(), Some(Token::Literal(t)) if t.ends_with('/'));
    if !options.strict && ends_with_slash {
        if let Some(Token::Literal(t)) = tokens.last_mut() {
            t.pop();
        }
    }

    let mut route = String::new();
    for token in &tokens {
        match token {
            Token::Literal(text) => route.push_str(&regex::escape(text)),
            Token::Param(p) => {
                let prefix = p.prefix.map(|c| regex::escape(&c.to_string())).unwrap_or_default();
                let capture = if p.repeat {
                    format!("(?:{expr})(?:{prefix}(?:{expr}))*", expr = p.expr, prefix = prefix)
                } else {
                    p.expr.clone()
                };
                if p.optional {
                    if prefix.is_empty() {
                        route.push_str(&format!("({})?", capture));
                    } else {
                        route.push_str(&format!("(?:{}({}))?", prefix, capture));
                    }
                } else {
                    route.push_str(&format!("{}({})", prefix, capture));
                }
            }
        }
    }

    if options.exact {
        if !options.strict {
            route.push_str("/?");
        }
        route.push('$');
    } else if !(options.strict && ends_with_slash) {
        route.push_str("(?:/|$)");
    }

    let flags = if options.sensitive { "" } else { "(?i)" };
    format!("{}^{}", flags, route)
}
