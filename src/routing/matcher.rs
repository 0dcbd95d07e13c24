//! Path pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns (`/movies`, `/movies/:id`, `/files/*path`)
//! - Match request paths segment by segment
//! - Capture named parameters
//!
//! # Design Decisions
//! - Literal segments are case-sensitive
//! - Empty segments are ignored, so trailing slashes do not matter
//! - Request path segments are percent-decoded before comparison
//! - A `*name` splat must be last and captures at least one segment
//! - No regex to guarantee O(n) matching

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use percent_encoding::percent_decode_str;

use crate::http::request::Params;
use crate::routing::RouteError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    Splat(String),
}

/// A compiled route pattern.
#[derive(Debug, Clone)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern. It must start with `/`.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut names = HashSet::new();
        let mut segments = Vec::new();
        let parts: Vec<&str> = split(pattern).collect();
        for (i, part) in parts.iter().enumerate() {
            let segment = if let Some(name) = part.strip_prefix(':') {
                Segment::Param(name.to_string())
            } else if let Some(name) = part.strip_prefix('*') {
                if i + 1 != parts.len() {
                    return Err(invalid("splat must be the last segment"));
                }
                Segment::Splat(name.to_string())
            } else {
                Segment::Literal(part.to_string())
            };

            if let Segment::Param(name) | Segment::Splat(name) = &segment {
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid("parameter names must be non-empty [A-Za-z0-9_]"));
                }
                if !names.insert(name.clone()) {
                    return Err(invalid("duplicate parameter name"));
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            raw: normalize(pattern),
            segments,
        })
    }

    /// Normalized pattern text, e.g. `/movies/:id`.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match `path`, returning captured parameters on success.
    pub fn capture(&self, path: &str) -> Option<Params> {
        let parts: Vec<Cow<'_, str>> = split(path).map(decode_segment).collect();
        let mut params = Params::default();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(expected) => {
                    if parts.get(i).map(|p| p.as_ref()) != Some(expected.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.as_str(), parts.get(i)?.as_ref());
                }
                Segment::Splat(name) => {
                    if i >= parts.len() {
                        return None;
                    }
                    params.insert(name.as_str(), parts[i..].join("/"));
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }

    pub fn matches(&self, path: &str) -> bool {
        self.capture(path).is_some()
    }
}

impl PartialEq for PathPattern {
    /// Patterns are equal when they match the same paths, whatever the
    /// parameter names.
    fn eq(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| match (a, b) {
                (Segment::Literal(a), Segment::Literal(b)) => a == b,
                (Segment::Param(_), Segment::Param(_)) => true,
                (Segment::Splat(_), Segment::Splat(_)) => true,
                _ => false,
            })
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// `%2F` decodes inside its segment; it never splits one.
fn decode_segment(segment: &str) -> Cow<'_, str> {
    percent_decode_str(segment).decode_utf8_lossy()
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn normalize(pattern: &str) -> String {
    let joined = split(pattern).collect::<Vec<_>>().join("/");
    format!("/{}", joined)
}
