//! Path pattern language for fingerprinted relative paths.
//!
//! A relative path may embed token segments:
//!
//! ```text
//! js/app#[.{fingerprint}]!.js
//!       ^^^^^^^^^^^^^^^^^^ token segment
//! ```
//!
//! | Suffix | Mode       | Target path            | Routes                    |
//! |--------|------------|------------------------|---------------------------|
//! | none   | required   | always substituted     | fingerprinted only        |
//! | `!`    | preferred  | substituted            | plain + fingerprinted     |
//! | `?`    | optional   | omitted                | plain + fingerprinted     |
//!
//! Inside a segment, `{name}` is replaced by the token value and
//! `{name=value}` carries an embedded value that wins over the one supplied
//! at resolution time (used by compressed variants to keep the primary's
//! fingerprint).

use std::fmt;

use thiserror::Error;

/// Name of the content fingerprint token.
pub const FINGERPRINT_TOKEN: &str = "fingerprint";

/// Expression inserted when no configured fingerprint pattern matches.
pub const DEFAULT_EXPRESSION: &str = "#[.{fingerprint}]?";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("malformed path pattern `{pattern}`: {reason}")]
    Malformed { pattern: String, reason: &'static str },

    #[error("token `{token}` not provided for path pattern `{pattern}`")]
    MissingToken { token: String, pattern: String },
}

/// Supplies token values during resolution.
pub trait TokenSource {
    fn token(&self, name: &str) -> Option<&str>;
}

impl TokenSource for [(&str, &str)] {
    fn token(&self, name: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == name).map(|(_, v)| *v)
    }
}

impl<const N: usize> TokenSource for [(&str, &str); N] {
    fn token(&self, name: &str) -> Option<&str> {
        self.as_slice().token(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenMode {
    Required,
    Preferred,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Variable { name: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token { parts: Vec<Part>, mode: TokenMode },
}

/// A parsed relative path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    segments: Vec<Segment>,
}

/// Result of substituting tokens into a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: String,
    /// Token values that were substituted, in pattern order.
    pub tokens: Vec<(String, String)>,
}

impl ResolvedPath {
    pub fn token(&self, name: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl PathPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let malformed = |reason| PatternError::Malformed {
            pattern: raw.to_string(),
            reason,
        };

        let mut segments = Vec::new();
        let mut rest = raw;
        while let Some(start) = rest.find("#[") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let body_start = start + 2;
            let end = rest[body_start..]
                .find(']')
                .ok_or_else(|| malformed("missing ']' token"))?
                + body_start;
            let parts = parse_token_body(&rest[body_start..end]).map_err(malformed)?;

            let mut next = end + 1;
            let mode = match rest.as_bytes().get(next) {
                Some(b'!') => {
                    next += 1;
                    TokenMode::Preferred
                }
                Some(b'?') => {
                    next += 1;
                    TokenMode::Optional
                }
                _ => TokenMode::Required,
            };
            segments.push(Segment::Token { parts, mode });
            rest = &rest[next..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Ok(Self { segments })
    }

    /// Substitute token values.
    ///
    /// With `apply_preferences`, optional (`?`) segments are dropped, which
    /// yields the on-disk target path. Without it, every segment whose
    /// values are available is rendered.
    pub fn resolve(
        &self,
        source: &(impl TokenSource + ?Sized),
        apply_preferences: bool,
    ) -> Result<ResolvedPath, PatternError> {
        let mut path = String::new();
        let mut tokens = Vec::new();

        for segment in &self.segments {
            let (parts, mode) = match segment {
                Segment::Literal(text) => {
                    path.push_str(text);
                    continue;
                }
                Segment::Token { parts, mode } => (parts, *mode),
            };
            if apply_preferences && mode == TokenMode::Optional {
                continue;
            }

            let mut rendered = String::new();
            let mut used = Vec::new();
            let mut missing = None;
            for part in parts {
                match part {
                    Part::Literal(text) => rendered.push_str(text),
                    Part::Variable { name, value } => {
                        match value.as_deref().or_else(|| source.token(name)) {
                            Some(v) => {
                                rendered.push_str(v);
                                used.push((name.clone(), v.to_string()));
                            }
                            None => {
                                missing = Some(name);
                                break;
                            }
                        }
                    }
                }
            }

            match missing {
                Some(name) if mode == TokenMode::Required => {
                    return Err(PatternError::MissingToken {
                        token: name.clone(),
                        pattern: self.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    path.push_str(&rendered);
                    tokens.extend(used);
                }
            }
        }

        Ok(ResolvedPath { path, tokens })
    }

    /// Every concrete pattern this one can be served under.
    ///
    /// Each preferred or optional segment doubles the variants: one without
    /// the segment and one where it is required. The first variant is always
    /// the label (no optional segments).
    pub fn expand(&self) -> Vec<PathPattern> {
        let mut variants: Vec<Vec<Segment>> = vec![Vec::new()];
        for segment in &self.segments {
            match segment {
                Segment::Token { parts, mode } if *mode != TokenMode::Required => {
                    let mut next = Vec::with_capacity(variants.len() * 2);
                    for variant in variants {
                        let mut with = variant.clone();
                        with.push(Segment::Token {
                            parts: parts.clone(),
                            mode: TokenMode::Required,
                        });
                        next.push(variant);
                        next.push(with);
                    }
                    variants = next;
                }
                _ => {
                    for variant in &mut variants {
                        variant.push(segment.clone());
                    }
                }
            }
        }
        variants
            .into_iter()
            .map(|segments| PathPattern { segments })
            .collect()
    }

    /// The path with every token segment removed.
    pub fn label(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Literal(text) => Some(text.as_str()),
                Segment::Token { .. } => None,
            })
            .collect()
    }

    /// Bake token values into the pattern as `{name=value}`.
    pub fn embed(&self, source: &(impl TokenSource + ?Sized)) -> PathPattern {
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Token { parts, mode } => Segment::Token {
                    parts: parts
                        .iter()
                        .map(|part| match part {
                            Part::Variable { name, value: None } => Part::Variable {
                                name: name.clone(),
                                value: source.token(name).map(str::to_string),
                            },
                            other => other.clone(),
                        })
                        .collect(),
                    mode: *mode,
                },
                other => other.clone(),
            })
            .collect();
        PathPattern { segments }
    }
}

fn parse_token_body(body: &str) -> Result<Vec<Part>, &'static str> {
    let mut parts = Vec::new();
    let mut rest = body;
    let mut has_variable = false;

    while let Some(open) = rest.find('{') {
        if open > 0 {
            parts.push(Part::Literal(rest[..open].to_string()));
        }
        let close = rest[open..].find('}').ok_or("missing '}' token")? + open;
        let inner = &rest[open + 1..close];
        let (name, value) = match inner.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (inner, None),
        };
        if name.is_empty() {
            return Err("empty token name");
        }
        parts.push(Part::Variable {
            name: name.to_string(),
            value,
        });
        has_variable = true;
        rest = &rest[close + 1..];
    }
    if !rest.is_empty() {
        parts.push(Part::Literal(rest.to_string()));
    }
    if !has_variable {
        return Err("token segment without a '{name}' placeholder");
    }
    Ok(parts)
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => f.write_str(text)?,
                Segment::Token { parts, mode } => {
                    f.write_str("#[")?;
                    for part in parts {
                        match part {
                            Part::Literal(text) => f.write_str(text)?,
                            Part::Variable { name, value: None } => write!(f, "{{{name}}}")?,
                            Part::Variable {
                                name,
                                value: Some(value),
                            } => write!(f, "{{{name}={value}}}")?,
                        }
                    }
                    f.write_str("]")?;
                    match mode {
                        TokenMode::Required => {}
                        TokenMode::Preferred => f.write_str("!")?,
                        TokenMode::Optional => f.write_str("?")?,
                    }
                }
            }
        }
        Ok(())
    }
}

/// Insert a fingerprint expression into a relative path.
///
/// `suffix` is the extension part claimed by the matching fingerprint rule
/// (`.lib.module.js` for `*.lib.module.js`). When it is empty or does not
/// match, the expression goes before the last extension of the file name,
/// or at the end for names without one. Paths that already carry a token
/// segment are returned unchanged.
pub fn insert_expression(relative_path: &str, suffix: &str, expression: &str) -> String {
    if relative_path.contains("#[") || expression.is_empty() {
        return relative_path.to_string();
    }

    let file_start = relative_path.rfind('/').map_or(0, |i| i + 1);
    let file = &relative_path[file_start..];

    let split = if !suffix.is_empty()
        && file.len() > suffix.len()
        && file
            .to_ascii_lowercase()
            .ends_with(&suffix.to_ascii_lowercase())
    {
        file.len() - suffix.len()
    } else {
        match file.rfind('.') {
            Some(dot) if dot > 0 => dot,
            _ => file.len(),
        }
    };

    let at = file_start + split;
    format!(
        "{}{}{}",
        &relative_path[..at],
        expression,
        &relative_path[at..]
    )
}
