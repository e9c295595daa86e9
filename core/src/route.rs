//! Route patterns and the route table.
//!
//! A pattern is a path template such as `/users/{user_id}` or
//! `/files/{file_path:path}`. An ordinary placeholder matches exactly one
//! non-empty segment; a `:path` placeholder matches the rest of the path,
//! separators included.
//!
//! When several patterns match a path, the one with a static segment at the
//! first differing position wins over a placeholder, and a placeholder wins
//! over a path capture. Remaining ties keep declaration order.

use crate::error::RouteError;
use http::Method;
use std::cmp::Ordering;
use std::fmt;

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal text
    Static(String),
    /// Single-segment placeholder
    Param(String),
    /// Placeholder capturing the remaining path
    Path(String),
}

impl Segment {
    const fn rank(&self) -> u8 {
        match self {
            Self::Static(_) => 0,
            Self::Param(_) => 1,
            Self::Path(_) => 2,
        }
    }

    fn placeholder(&self) -> Option<&str> {
        match self {
            Self::Static(_) => None,
            Self::Param(name) | Self::Path(name) => Some(name),
        }
    }
}

/// A parsed path template.
///
/// # Examples
///
/// ```
/// use parambind_core::route::RoutePattern;
///
/// let pattern = RoutePattern::parse("/files/{file_path:path}").unwrap();
/// let captures = pattern.matches("/files/a/b/c").unwrap();
/// assert_eq!(captures.get("file_path"), Some("a/b/c"));
///
/// let single = RoutePattern::parse("/not_path/{file_path}").unwrap();
/// assert!(single.matches("/not_path/a/b/c").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
}

impl RoutePattern {
    /// Parse a path template.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] when the template does not start with `/`, a
    /// placeholder is malformed or repeated, uses an unknown convertor, or a
    /// `:path` placeholder is not the last segment.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        let Some(body) = raw.strip_prefix('/') else {
            return Err(RouteError::MissingLeadingSlash(raw.to_string()));
        };
        let trailing_slash = !body.is_empty() && body.ends_with('/');
        let body = body.strip_suffix('/').unwrap_or(body);

        let mut segments = Vec::new();
        if !body.is_empty() {
            for part in body.split('/') {
                segments.push(parse_segment(raw, part)?);
            }
        }

        let mut seen: Vec<&str> = Vec::new();
        for (index, segment) in segments.iter().enumerate() {
            if let Some(name) = segment.placeholder() {
                if seen.contains(&name) {
                    return Err(RouteError::DuplicatePlaceholder {
                        pattern: raw.to_string(),
                        name: name.to_string(),
                    });
                }
                seen.push(name);
            }
            if matches!(segment, Segment::Path(_)) && index + 1 != segments.len() {
                return Err(RouteError::PathCaptureNotLast(raw.to_string()));
            }
        }
        if trailing_slash && matches!(segments.last(), Some(Segment::Path(_))) {
            return Err(RouteError::PathCaptureNotLast(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
            trailing_slash,
        })
    }

    /// The template as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether `name` is a placeholder of this pattern.
    #[must_use]
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.segments.iter().any(|s| s.placeholder() == Some(name))
    }

    /// Match a decoded request path, returning the placeholder captures.
    #[must_use]
    pub fn matches(&self, path: &str) -> Option<Captures> {
        let mut rest = path.strip_prefix('/')?;
        let mut captures = Captures::default();
        if self.segments.is_empty() {
            return rest.is_empty().then_some(captures);
        }
        let last = self.segments.len() - 1;
        for (index, segment) in self.segments.iter().enumerate() {
            if let Segment::Path(name) = segment {
                captures.push(name, rest);
                return Some(captures);
            }
            let (part, after) = match rest.split_once('/') {
                Some((part, after)) => (part, Some(after)),
                None => (rest, None),
            };
            match segment {
                Segment::Static(text) if text == part => {}
                Segment::Param(name) if !part.is_empty() => captures.push(name, part),
                _ => return None,
            }
            match (index == last, after) {
                (false, Some(after)) => rest = after,
                (true, None) if !self.trailing_slash => return Some(captures),
                (true, Some("")) if self.trailing_slash => return Some(captures),
                _ => return None,
            }
        }
        None
    }

    /// Specificity ordering: smaller is more specific.
    fn specificity(&self, other: &Self) -> Ordering {
        let ours = self.segments.iter().map(Segment::rank);
        let theirs = other.segments.iter().map(Segment::rank);
        ours.cmp(theirs)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segment(raw: &str, part: &str) -> Result<Segment, RouteError> {
    let malformed = || RouteError::MalformedPlaceholder {
        pattern: raw.to_string(),
        segment: part.to_string(),
    };
    match (part.strip_prefix('{'), part.strip_suffix('}')) {
        (Some(_), Some(_)) => {
            let inner = &part[1..part.len() - 1];
            let (name, convertor) = match inner.split_once(':') {
                Some((name, convertor)) => (name, Some(convertor)),
                None => (inner, None),
            };
            let valid_name = !name.is_empty()
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !name.starts_with(|c: char| c.is_ascii_digit());
            if !valid_name {
                return Err(malformed());
            }
            match convertor {
                None | Some("str") => Ok(Segment::Param(name.to_string())),
                Some("path") => Ok(Segment::Path(name.to_string())),
                Some(other) => Err(RouteError::UnknownConvertor {
                    pattern: raw.to_string(),
                    convertor: other.to_string(),
                }),
            }
        }
        (None, None) if part.contains(['{', '}']) => Err(malformed()),
        (None, None) if part.is_empty() => Err(malformed()),
        (None, None) => Ok(Segment::Static(part.to_string())),
        _ => Err(malformed()),
    }
}

/// Placeholder values captured from a path, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures {
    entries: Vec<(String, String)>,
}

impl Captures {
    fn push(&mut self, name: &str, value: &str) {
        self.entries.push((name.to_string(), value.to_string()));
    }

    /// Value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All captures.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Outcome of a route lookup.
#[derive(Debug)]
pub enum Lookup<'a, T> {
    /// Path and method matched
    Found {
        /// Pattern that matched
        pattern: &'a RoutePattern,
        /// Payload registered for the route
        target: &'a T,
        /// Placeholder values
        captures: Captures,
    },
    /// Some pattern matched the path, none for this method
    MethodNotAllowed(Vec<Method>),
    /// No pattern matched the path
    NotFound,
}

#[derive(Debug)]
struct Entry<T> {
    method: Method,
    pattern: RoutePattern,
    target: T,
}

/// Routes in declaration order, looked up by method and path.
#[derive(Debug)]
pub struct RouteTable<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T> RouteTable<T> {
    /// Create an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register `target` for `method` and `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::Duplicate`] when the same method and template are
    /// already registered.
    pub fn insert(&mut self, method: Method, pattern: RoutePattern, target: T) -> Result<(), RouteError> {
        if self
            .entries
            .iter()
            .any(|e| e.method == method && e.pattern == pattern)
        {
            return Err(RouteError::Duplicate {
                method: method.to_string(),
                pattern: pattern.raw,
            });
        }
        self.entries.push(Entry {
            method,
            pattern,
            target,
        });
        Ok(())
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the most specific route for `method` and `path`.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup<'_, T> {
        let mut best: Option<(&Entry<T>, Captures)> = None;
        let mut allowed: Vec<Method> = Vec::new();
        for entry in &self.entries {
            let Some(captures) = entry.pattern.matches(path) else {
                continue;
            };
            if entry.method != *method {
                if !allowed.contains(&entry.method) {
                    allowed.push(entry.method.clone());
                }
                continue;
            }
            let better = best
                .as_ref()
                .is_none_or(|(current, _)| entry.pattern.specificity(&current.pattern) == Ordering::Less);
            if better {
                best = Some((entry, captures));
            }
        }
        match best {
            Some((entry, captures)) => Lookup::Found {
                pattern: &entry.pattern,
                target: &entry.target,
                captures,
            },
            None if allowed.is_empty() => Lookup::NotFound,
            None => Lookup::MethodNotAllowed(allowed),
        }
    }

    /// Iterate over `(method, pattern, target)` in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Method, &RoutePattern, &T)> {
        self.entries.iter().map(|e| (&e.method, &e.pattern, &e.target))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    fn table(routes: &[(&str, &'static str)]) -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        for (pattern, name) in routes {
            table
                .insert(Method::GET, RoutePattern::parse(pattern).unwrap(), *name)
                .unwrap();
        }
        table
    }

    fn found(lookup: Lookup<'_, &'static str>) -> (&'static str, Captures) {
        match lookup {
            Lookup::Found { target, captures, .. } => (*target, captures),
            other => panic!("expected a match, got {other:?}"),
        }
    }

    #[test]
    fn test_static_segment_beats_placeholder() {
        let routes = table(&[("/users/{user_id}", "read_user"), ("/users/me", "read_user_me")]);
        let (name, _) = found(routes.lookup(&Method::GET, "/users/me"));
        assert_eq!(name, "read_user_me");

        let (name, captures) = found(routes.lookup(&Method::GET, "/users/someone"));
        assert_eq!(name, "read_user");
        assert_eq!(captures.get("user_id"), Some("someone"));
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        let routes = table(&[("/items/{a}", "first"), ("/items/{b}", "second")]);
        let (name, _) = found(routes.lookup(&Method::GET, "/items/1"));
        assert_eq!(name, "first");
    }

    #[test]
    fn test_placeholder_beats_path_capture() {
        let routes = table(&[("/files/{rest:path}", "capture"), ("/files/{name}", "single")]);
        assert_eq!(found(routes.lookup(&Method::GET, "/files/a.txt")).0, "single");
        assert_eq!(found(routes.lookup(&Method::GET, "/files/a/b")).0, "capture");
    }

    #[test]
    fn test_path_capture_keeps_separators() {
        let pattern = RoutePattern::parse("/files/{file_path:path}").unwrap();
        for path in ["a/b/c", "/a/b/c", "~/", "a.txt"] {
            let captures = pattern.matches(&format!("/files/{path}")).unwrap();
            assert_eq!(captures.get("file_path"), Some(path));
        }
    }

    #[test]
    fn test_single_placeholder_rejects_separators() {
        let pattern = RoutePattern::parse("/not_path/{file_path}").unwrap();
        assert!(pattern.matches("/not_path/a/b/c").is_none());
        assert!(pattern.matches("/not_path//a/b/c").is_none());
        assert!(pattern.matches("/not_path/~/").is_none());
        assert!(pattern.matches("/not_path/").is_none());
        assert_eq!(pattern.matches("/not_path/~").unwrap().get("file_path"), Some("~"));
    }

    #[test]
    fn test_trailing_slash_is_significant() {
        let pattern = RoutePattern::parse("/items/").unwrap();
        assert!(pattern.matches("/items/").is_some());
        assert!(pattern.matches("/items").is_none());

        let root = RoutePattern::parse("/").unwrap();
        assert!(root.matches("/").is_some());
        assert!(root.matches("/x").is_none());
    }

    #[test]
    fn test_method_not_allowed() {
        let routes = table(&[("/items/{item_id}", "get_item")]);
        match routes.lookup(&Method::DELETE, "/items/3") {
            Lookup::MethodNotAllowed(allowed) => assert_eq!(allowed, vec![Method::GET]),
            other => panic!("expected 405, got {other:?}"),
        }
        assert!(matches!(routes.lookup(&Method::GET, "/nothing"), Lookup::NotFound));
    }

    #[test]
    fn test_pattern_errors() {
        assert!(matches!(RoutePattern::parse("items"), Err(RouteError::MissingLeadingSlash(_))));
        assert!(matches!(
            RoutePattern::parse("/{a}/{a}"),
            Err(RouteError::DuplicatePlaceholder { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/{rest:path}/tail"),
            Err(RouteError::PathCaptureNotLast(_))
        ));
        assert!(matches!(
            RoutePattern::parse("/{id:int}"),
            Err(RouteError::UnknownConvertor { .. })
        ));
        assert!(matches!(
            RoutePattern::parse("/{bad name}"),
            Err(RouteError::MalformedPlaceholder { .. })
        ));
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let mut routes = table(&[("/items/", "a")]);
        let err = routes
            .insert(Method::GET, RoutePattern::parse("/items/").unwrap(), "b")
            .unwrap_err();
        assert!(matches!(err, RouteError::Duplicate { .. }));
    }
}
