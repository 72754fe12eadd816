//! Route url matching.
//!
//! String urls use express-style patterns: `:name` captures one segment,
//! `:name?` an optional segment, `*` the rest of the path (exposed as param
//! `"0"`, `"1"`, ...). Matching is case-insensitive and a trailing slash is
//! optional. Regex urls are used as-is, with named groups exposed by name and
//! unnamed ones by position. A prefix match hands the rest of the path to a
//! sub-router.

use regex::Regex;
use std::collections::BTreeMap;

/// Result of a successful match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    pub params: BTreeMap<String, String>,
    /// Path below the matched prefix, starting with `/`. Always `/` for an
    /// exact match.
    pub sub_path: String,
}

#[derive(Debug, Clone)]
pub struct PathMatcher {
    exact: Regex,
    prefix: Regex,
    keys: Vec<String>,
}

enum Token {
    Literal(char),
    Param { name: String, optional: bool },
    Wildcard,
}

impl PathMatcher {
    /// Compile an express-style pattern.
    pub fn parse(pattern: &str) -> Result<Self, regex::Error> {
        let trimmed = if pattern.len() > 1 {
            pattern.trim_end_matches('/')
        } else {
            pattern
        };

        let mut keys = Vec::new();
        let mut wildcards = 0usize;
        let mut body = String::new();
        for token in tokenize(trimmed) {
            match token {
                Token::Literal(c) => body.push_str(&regex::escape(&c.to_string())),
                Token::Param { name, optional } => {
                    keys.push(name);
                    if optional && body.ends_with('/') {
                        body.pop();
                        body.push_str("(?:/([^/]+?))?");
                    } else if optional {
                        body.push_str("([^/]+?)?");
                    } else {
                        body.push_str("([^/]+?)");
                    }
                }
                Token::Wildcard => {
                    keys.push(wildcards.to_string());
                    wildcards += 1;
                    body.push_str("(.*)");
                }
            }
        }
        let body = body.trim_end_matches('/');

        Ok(Self {
            exact: Regex::new(&format!("(?i)^{body}/?$"))?,
            prefix: Regex::new(&format!("(?i)^{body}(?:/|$)"))?,
            keys,
        })
    }

    /// Use a compiled regex as the matcher.
    pub fn from_regex(regex: Regex) -> Self {
        let keys = regex
            .capture_names()
            .skip(1)
            .enumerate()
            .map(|(i, name)| name.map(str::to_string).unwrap_or_else(|| i.to_string()))
            .collect();
        Self {
            prefix: regex.clone(),
            exact: regex,
            keys,
        }
    }

    /// Match the whole path.
    pub fn matches(&self, path: &str) -> Option<PathMatch> {
        self.capture(&self.exact, path, false)
    }

    /// Match the url followed by `/...` or the end of the path.
    pub fn matches_prefix(&self, path: &str) -> Option<PathMatch> {
        self.capture(&self.prefix, path, true)
    }

    fn capture(&self, regex: &Regex, path: &str, prefix: bool) -> Option<PathMatch> {
        let captures = regex.captures(path)?;
        let whole = captures.get(0)?;

        let mut params = BTreeMap::new();
        for (key, group) in self.keys.iter().zip(captures.iter().skip(1)) {
            if let Some(group) = group {
                params.insert(key.clone(), decode(group.as_str()));
            }
        }

        let rest = if prefix {
            &path[whole.end()..]
        } else {
            ""
        };
        Some(PathMatch {
            params,
            sub_path: format!("/{}", rest.trim_start_matches('/')),
        })
    }
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek().is_some_and(|n| is_name_char(*n)) => {
                let mut name = String::new();
                while let Some(n) = chars.peek().copied().filter(|n| is_name_char(*n)) {
                    name.push(n);
                    chars.next();
                }
                let optional = chars.next_if_eq(&'?').is_some();
                tokens.push(Token::Param { name, optional });
            }
            '*' => tokens.push(Token::Wildcard),
            other => tokens.push(Token::Literal(other)),
        }
    }
    tokens
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string())
}
