//! Route pattern matching
//!
//! Patterns are stored as plain strings in the permission store. Three
//! token kinds are understood:
//!
//! - literal segments, matched verbatim (`/bezs/filenest`)
//! - parameter segments, a `:` followed by a name, matching exactly one
//!   non-empty segment (`/bezs/file-nest/:fileType`)
//! - a trailing `*`, matching the remainder of the path including nothing
//!   at all (`/bezs/admin/*` matches `/bezs/admin` too)
//!
//! Matching is anchored at both ends and a trailing slash is insignificant
//! on either side. A pattern that does not parse matches nothing.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Reasons a stored pattern cannot be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("Pattern is empty")]
    Empty,

    #[error("Pattern must start with '/': {0}")]
    NotAbsolute(String),

    #[error("Empty segment {position} in pattern {pattern}")]
    EmptySegment { pattern: String, position: usize },

    #[error("Invalid parameter name '{name}' in pattern {pattern}")]
    InvalidParameter { pattern: String, name: String },

    #[error("Wildcard must be the whole final segment in pattern {0}")]
    MisplacedWildcard(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Parameter(String),
    Wildcard,
}

/// A parsed route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Parse a pattern string
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        if pattern == "*" {
            return Ok(Self {
                source: pattern.to_string(),
                segments: vec![Segment::Wildcard],
            });
        }

        let raw_segments =
            split_segments(pattern).ok_or_else(|| PatternError::NotAbsolute(pattern.to_string()))?;
        let last = raw_segments.len().saturating_sub(1);

        let mut segments = Vec::with_capacity(raw_segments.len());
        for (position, raw) in raw_segments.into_iter().enumerate() {
            let segment = if raw.is_empty() {
                return Err(PatternError::EmptySegment {
                    pattern: pattern.to_string(),
                    position,
                });
            } else if raw == "*" {
                if position != last {
                    return Err(PatternError::MisplacedWildcard(pattern.to_string()));
                }
                Segment::Wildcard
            } else if raw.contains('*') {
                return Err(PatternError::MisplacedWildcard(pattern.to_string()));
            } else if let Some(name) = raw.strip_prefix(':') {
                if !is_valid_parameter_name(name) {
                    return Err(PatternError::InvalidParameter {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                Segment::Parameter(name.to_string())
            } else {
                Segment::Literal(raw.to_string())
            };
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// Whether this pattern covers the entire given path
    pub fn matches(&self, path: &str) -> bool {
        if has_dot_segment(path) {
            return false;
        }
        let Some(path_segments) = split_segments(path) else {
            return false;
        };

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => return true,
                Segment::Literal(literal) => match path_segments.get(index) {
                    Some(actual) if actual == literal => {}
                    _ => return false,
                },
                Segment::Parameter(_) => match path_segments.get(index) {
                    Some(actual) if !actual.is_empty() => {}
                    _ => return false,
                },
            }
        }

        self.segments.len() == path_segments.len()
    }

    /// Whether the pattern grants every path (`*` or `/*`)
    pub fn is_catch_all(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::Wildcard])
    }

    /// Names of the parameter segments, in order
    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Parameter(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// The pattern as it was stored
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Split an absolute path into segments, ignoring one trailing slash run.
/// Returns `None` for relative input.
fn split_segments(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix('/')?;
    let rest = rest.trim_end_matches('/');
    if rest.is_empty() {
        return Some(Vec::new());
    }
    Some(rest.split('/').collect())
}

/// Whether any segment of `path` is `.` or `..`, written literally or
/// percent-encoded. URL parsers resolve these segments, so the path the
/// upstream finally serves differs from the one that was checked.
///
/// Backslashes count as separators, as they do for `http` URLs.
pub fn has_dot_segment(path: &str) -> bool {
    path.split(['/', '\\']).any(is_dot_segment)
}

fn is_dot_segment(segment: &str) -> bool {
    let decoded = segment.to_ascii_lowercase().replace("%2e", ".");
    decoded == "." || decoded == ".."
}

fn is_valid_parameter_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check a single stored pattern against a path. Unparseable patterns never
/// match.
pub fn matches(pattern: &str, path: &str) -> bool {
    match RoutePattern::parse(pattern) {
        Ok(pattern) => pattern.matches(path),
        Err(e) => {
            debug!("Ignoring unresolvable route pattern: {e}");
            false
        }
    }
}

/// Check whether any of the stored patterns covers the path
pub fn matches_any<'a, I>(patterns: I, path: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    patterns.into_iter().any(|pattern| matches(pattern, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_pattern_is_anchored() {
        assert!(matches("/bezs/admin", "/bezs/admin"));
        assert!(!matches("/bezs/admin", "/bezs/administration"));
        assert!(!matches("/bezs/admin", "/bezs/admin/users"));
        assert!(!matches("/bezs/admin/users", "/bezs/admin"));
    }

    #[test]
    fn test_trailing_slash_is_insignificant() {
        assert!(matches("/bezs/admin/", "/bezs/admin"));
        assert!(matches("/bezs/admin", "/bezs/admin/"));
        assert!(matches("/", "/"));
        assert!(matches("/", "//"));
    }

    #[test]
    fn test_wildcard_matches_remainder() {
        assert!(matches("/bezs/admin/*", "/bezs/admin/users/5"));
        assert!(matches("/bezs/admin/*", "/bezs/admin/users"));
        assert!(!matches("/bezs/admin/*", "/bezs/administration"));
    }

    #[test]
    fn test_wildcard_matches_its_own_prefix() {
        assert!(matches("/bezs/admin/*", "/bezs/admin"));
        assert!(matches("/bezs/admin/*", "/bezs/admin/"));
    }

    #[test]
    fn test_parameter_segment_matches_exactly_one_segment() {
        assert!(matches("/bezs/file-nest/:fileType", "/bezs/file-nest/images"));
        assert!(!matches(
            "/bezs/file-nest/:fileType",
            "/bezs/file-nest/images/extra"
        ));
        assert!(!matches("/bezs/file-nest/:fileType", "/bezs/file-nest"));
    }

    #[test]
    fn test_parameter_and_wildcard_combine() {
        let pattern = RoutePattern::parse("/bezs/:app/settings/*").unwrap();
        assert!(pattern.matches("/bezs/chat/settings"));
        assert!(pattern.matches("/bezs/chat/settings/models/gpt"));
        assert!(!pattern.matches("/bezs/chat/profile"));
        assert_eq!(pattern.parameter_names().collect::<Vec<_>>(), vec!["app"]);
    }

    #[test]
    fn test_bare_wildcard_is_catch_all() {
        let pattern = RoutePattern::parse("*").unwrap();
        assert!(pattern.is_catch_all());
        assert!(pattern.matches("/"));
        assert!(pattern.matches("/bezs/anything/at/all"));
        assert!(RoutePattern::parse("/*").unwrap().is_catch_all());
        assert!(!RoutePattern::parse("/bezs/*").unwrap().is_catch_all());
    }

    #[test]
    fn test_malformed_patterns_are_rejected() {
        assert_eq!(RoutePattern::parse(""), Err(PatternError::Empty));
        assert!(matches!(
            RoutePattern::parse("bezs/admin"),
            Err(PatternError::NotAbsolute(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/bezs//admin"),
            Err(PatternError::EmptySegment { position: 1, .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/bezs/:/x"),
            Err(PatternError::InvalidParameter { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/bezs/:na.me"),
            Err(PatternError::InvalidParameter { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/bezs/*/admin"),
            Err(PatternError::MisplacedWildcard(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/bezs/adm*"),
            Err(PatternError::MisplacedWildcard(_))
        ));
    }

    #[test]
    fn test_malformed_pattern_matches_nothing() {
        assert!(!matches("/bezs/*/admin", "/bezs/x/admin"));
        assert!(!matches("", "/"));
        assert!(!matches("bezs", "bezs"));
    }

    #[test]
    fn test_relative_path_never_matches() {
        assert!(!matches("/bezs/admin", "bezs/admin"));
        assert!(!matches("*", "bezs"));
    }

    #[test]
    fn test_dot_segments_are_detected() {
        assert!(has_dot_segment("/bezs/dashboard/../admin"));
        assert!(has_dot_segment("/bezs/./filenest"));
        assert!(has_dot_segment("/bezs/dashboard/%2e%2e/admin"));
        assert!(has_dot_segment("/bezs/dashboard/.%2E/admin"));
        assert!(has_dot_segment("/bezs/dashboard/%2E/admin"));
        assert!(has_dot_segment("/bezs/dashboard/..\\admin"));
        assert!(has_dot_segment("/bezs/filenest/.."));

        assert!(!has_dot_segment("/bezs/filenest/report.pdf"));
        assert!(!has_dot_segment("/bezs/filenest/...hidden"));
        assert!(!has_dot_segment("/bezs/filenest/..%2fadmin"));
        assert!(!has_dot_segment("/"));
    }

    #[test]
    fn test_wildcard_does_not_cover_dot_segments() {
        let pattern = RoutePattern::parse("/bezs/filenest/*").unwrap();
        assert!(!pattern.matches("/bezs/filenest/../admin/users"));
        assert!(!pattern.matches("/bezs/filenest/%2e%2e/admin"));

        let pattern = RoutePattern::parse("/bezs/:app/docs").unwrap();
        assert!(!pattern.matches("/bezs/../docs"));
    }

    #[test]
    fn test_matches_any_skips_bad_patterns() {
        let patterns = ["/bezs/*/bad", "/bezs/filenest/docs"];
        assert!(matches_any(patterns, "/bezs/filenest/docs"));
        assert!(!matches_any(patterns, "/bezs/filenest/videos"));
        assert!(!matches_any(Vec::<&str>::new(), "/"));
    }

    #[test]
    fn test_pattern_round_trips_through_display() {
        let pattern: RoutePattern = "/bezs/file-nest/:fileType".parse().unwrap();
        assert_eq!(pattern.to_string(), "/bezs/file-nest/:fileType");
        assert_eq!(pattern.as_str(), "/bezs/file-nest/:fileType");
    }
}
