//! Handler parameter declarations.
//!
//! A [`Param`] names a value a handler needs, its [`Shape`], whether it is
//! required, and optionally where it comes from. Without an explicit source
//! the binder infers one: a name that is a placeholder of the route pattern
//! binds from the path, a scalar binds from the query string, anything
//! structured binds from the JSON body.

use crate::shape::{Presence, Shape};
use serde_json::Value;
use std::fmt;

/// Where a parameter value is read from. Variants are ordered by binding
/// precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    /// Named segment of the matched pattern
    Path,
    /// Query-string entry
    Query,
    /// Header field (case-insensitive)
    Header,
    /// Cookie value
    Cookie,
    /// JSON request body
    Body,
}

impl Source {
    /// Name used as the first element of a finding location.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declaration of one handler parameter.
///
/// # Examples
///
/// ```
/// use parambind_core::{Param, Shape, Source};
///
/// let size = Param::query("size", Shape::float().ge(0).lt(10.5));
/// assert_eq!(size.source(), Some(Source::Query));
/// assert!(size.is_required());
///
/// let q = Param::new("q", Shape::str()).optional().alias("item-query");
/// assert_eq!(q.source(), None);
/// assert_eq!(q.lookup_key(Source::Query), "item-query");
/// ```
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    source: Option<Source>,
    shape: Shape,
    presence: Presence,
    alias: Option<String>,
    convert_underscores: bool,
    embed: bool,
    example: Option<Value>,
}

impl Param {
    fn with_source(name: impl Into<String>, shape: Shape, source: Option<Source>) -> Self {
        Self {
            name: name.into(),
            source,
            shape,
            presence: Presence::Required,
            alias: None,
            convert_underscores: true,
            embed: false,
            example: None,
        }
    }

    /// Required parameter whose source is inferred from the route.
    #[must_use]
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self::with_source(name, shape, None)
    }

    /// Parameter bound from a path placeholder.
    #[must_use]
    pub fn path(name: impl Into<String>, shape: Shape) -> Self {
        Self::with_source(name, shape, Some(Source::Path))
    }

    /// Parameter bound from the query string.
    #[must_use]
    pub fn query(name: impl Into<String>, shape: Shape) -> Self {
        Self::with_source(name, shape, Some(Source::Query))
    }

    /// Parameter bound from a header. Underscores in the name become hyphens
    /// unless [`Param::keep_underscores`] is set.
    #[must_use]
    pub fn header(name: impl Into<String>, shape: Shape) -> Self {
        Self::with_source(name, shape, Some(Source::Header))
    }

    /// Parameter bound from a cookie.
    #[must_use]
    pub fn cookie(name: impl Into<String>, shape: Shape) -> Self {
        Self::with_source(name, shape, Some(Source::Cookie))
    }

    /// Parameter bound from the JSON body, even when its shape is scalar.
    #[must_use]
    pub fn body(name: impl Into<String>, shape: Shape) -> Self {
        Self::with_source(name, shape, Some(Source::Body))
    }

    /// Make the parameter optional with a `null` default.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.shape = self.shape.nullable();
        self.presence = Presence::Default(Value::Null);
        self
    }

    /// Make the parameter optional with the given default.
    #[must_use]
    pub fn default(mut self, value: Value) -> Self {
        self.presence = Presence::Default(value);
        self
    }

    /// Look the value up under `alias` instead of the parameter name.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Use the header name exactly as written, without converting `_` to `-`.
    #[must_use]
    pub const fn keep_underscores(mut self) -> Self {
        self.convert_underscores = false;
        self
    }

    /// Expect a single body parameter nested under its name rather than as
    /// the whole body.
    #[must_use]
    pub const fn embed(mut self) -> Self {
        self.embed = true;
        self
    }

    /// Attach an example value (documentation metadata only).
    #[must_use]
    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Parameter name, as seen by the handler.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Explicit source, if declared.
    #[must_use]
    pub const fn source(&self) -> Option<Source> {
        self.source
    }

    /// Declared shape.
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Requiredness.
    #[must_use]
    pub const fn presence(&self) -> &Presence {
        &self.presence
    }

    /// Whether absence is a finding.
    #[must_use]
    pub const fn is_required(&self) -> bool {
        matches!(self.presence, Presence::Required)
    }

    /// Whether the body value is nested under the parameter name.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        self.embed
    }

    /// Example value, if any.
    #[must_use]
    pub const fn example_value(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    /// Key used to read the value from `source`.
    #[must_use]
    pub fn lookup_key(&self, source: Source) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match source {
            Source::Header if self.convert_underscores => self.name.replace('_', "-"),
            _ => self.name.clone(),
        }
    }
}
