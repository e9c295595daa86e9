//! Structured validation findings.
//!
//! A failed bind never surfaces as a single exception: every problem found
//! while binding a request becomes one [`Finding`], and all findings for the
//! request are collected into a [`ValidationError`].
//!
//! Each finding carries:
//! - `loc`: where the value came from (`["query", "size"]`, `["body", "item", "price"]`)
//! - `msg`: a human-readable message
//! - `type`: a machine-readable tag (`type_error.integer`, `value_error.missing`, ...)
//! - `ctx`: optional context such as the violated limit or the permitted values

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use thiserror::Error;

/// One step of a finding location: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocPart {
    /// Source name, parameter name or object field
    Key(String),
    /// Position inside a list
    Index(usize),
}

impl From<&str> for LocPart {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for LocPart {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for LocPart {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for LocPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// Location of a value inside a request.
pub type Loc = Vec<LocPart>;

/// Extend a location by one step.
#[must_use]
pub fn child(loc: &[LocPart], part: impl Into<LocPart>) -> Loc {
    let mut next = loc.to_vec();
    next.push(part.into());
    next
}

/// The reason a value was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    /// Required value absent
    Missing,
    /// `null` given for a non-optional value
    NoneNotAllowed,
    /// Not an integer
    Integer,
    /// Not a float
    Float,
    /// Not one of the boolean tokens
    Bool,
    /// Not a string
    Str,
    /// Not one of the enumeration literals
    Enum {
        /// Permitted literals, in declaration order
        permitted: Vec<String>,
    },
    /// Not a UUID
    Uuid,
    /// Not a datetime
    DateTime,
    /// Not a date
    Date,
    /// Not a time of day
    Time,
    /// Not a duration
    Duration,
    /// Not a list
    List,
    /// Not a set
    Set,
    /// Not an object
    Dict,
    /// Not a URL
    Url,
    /// URL scheme outside the allowed set
    UrlScheme {
        /// Schemes the shape accepts
        allowed: Vec<String>,
    },
    /// Not an email address
    Email,
    /// String shorter than `min_length`
    MinLength(usize),
    /// String longer than `max_length`
    MaxLength(usize),
    /// String does not match the declared pattern
    Pattern(String),
    /// Number not greater than the limit
    NotGt(Number),
    /// Number not greater than or equal to the limit
    NotGe(Number),
    /// Number not less than the limit
    NotLt(Number),
    /// Number not less than or equal to the limit
    NotLe(Number),
    /// Request body is not valid JSON
    JsonDecode(String),
    /// No member of a union accepted the value
    NoUnionMatch,
}

impl ErrorKind {
    /// Machine-readable tag.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Missing => "value_error.missing",
            Self::NoneNotAllowed => "type_error.none.not_allowed",
            Self::Integer => "type_error.integer",
            Self::Float => "type_error.float",
            Self::Bool => "type_error.bool",
            Self::Str => "type_error.str",
            Self::Enum { .. } => "type_error.enum",
            Self::Uuid => "type_error.uuid",
            Self::DateTime => "value_error.datetime",
            Self::Date => "value_error.date",
            Self::Time => "value_error.time",
            Self::Duration => "value_error.duration",
            Self::List => "type_error.list",
            Self::Set => "type_error.set",
            Self::Dict => "type_error.dict",
            Self::Url => "value_error.url",
            Self::UrlScheme { .. } => "value_error.url.scheme",
            Self::Email => "value_error.email",
            Self::MinLength(_) => "value_error.any_str.min_length",
            Self::MaxLength(_) => "value_error.any_str.max_length",
            Self::Pattern(_) => "value_error.str.regex",
            Self::NotGt(_) => "value_error.number.not_gt",
            Self::NotGe(_) => "value_error.number.not_ge",
            Self::NotLt(_) => "value_error.number.not_lt",
            Self::NotLe(_) => "value_error.number.not_le",
            Self::JsonDecode(_) => "value_error.jsondecode",
            Self::NoUnionMatch => "type_error.union",
        }
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Missing => "field required".to_string(),
            Self::NoneNotAllowed => "none is not an allowed value".to_string(),
            Self::Integer => "value is not a valid integer".to_string(),
            Self::Float => "value is not a valid float".to_string(),
            Self::Bool => "value could not be parsed to a boolean".to_string(),
            Self::Str => "str type expected".to_string(),
            Self::Enum { permitted } => {
                let quoted: Vec<String> = permitted.iter().map(|v| format!("'{v}'")).collect();
                format!(
                    "value is not a valid enumeration member; permitted: {}",
                    quoted.join(", ")
                )
            }
            Self::Uuid => "value is not a valid uuid".to_string(),
            Self::DateTime => "invalid datetime format".to_string(),
            Self::Date => "invalid date format".to_string(),
            Self::Time => "invalid time format".to_string(),
            Self::Duration => "invalid duration format".to_string(),
            Self::List => "value is not a valid list".to_string(),
            Self::Set => "value is not a valid set".to_string(),
            Self::Dict => "value is not a valid dict".to_string(),
            Self::Url => "invalid or missing URL scheme".to_string(),
            Self::UrlScheme { .. } => "URL scheme not permitted".to_string(),
            Self::Email => "value is not a valid email address".to_string(),
            Self::MinLength(limit) => format!("ensure this value has at least {limit} characters"),
            Self::MaxLength(limit) => format!("ensure this value has at most {limit} characters"),
            Self::Pattern(pattern) => format!("string does not match regex \"{pattern}\""),
            Self::NotGt(limit) => format!("ensure this value is greater than {limit}"),
            Self::NotGe(limit) => format!("ensure this value is greater than or equal to {limit}"),
            Self::NotLt(limit) => format!("ensure this value is less than {limit}"),
            Self::NotLe(limit) => format!("ensure this value is less than or equal to {limit}"),
            Self::JsonDecode(detail) => detail.clone(),
            Self::NoUnionMatch => "value does not match any of the allowed shapes".to_string(),
        }
    }

    /// Contextual data, when the kind has any.
    #[must_use]
    pub fn context(&self) -> Option<Map<String, Value>> {
        let (key, value) = match self {
            Self::Enum { permitted } => (
                "enum_values",
                Value::Array(permitted.iter().cloned().map(Value::String).collect()),
            ),
            Self::UrlScheme { allowed } => (
                "allowed_schemes",
                Value::Array(allowed.iter().cloned().map(Value::String).collect()),
            ),
            Self::MinLength(limit) | Self::MaxLength(limit) => {
                ("limit_value", Value::from(*limit))
            }
            Self::Pattern(pattern) => ("pattern", Value::String(pattern.clone())),
            Self::NotGt(limit) | Self::NotGe(limit) | Self::NotLt(limit) | Self::NotLe(limit) => {
                ("limit_value", Value::Number(limit.clone()))
            }
            _ => return None,
        };
        let mut ctx = Map::new();
        ctx.insert(key.to_string(), value);
        Some(ctx)
    }

    /// Attach a location, producing a finding.
    #[must_use]
    pub fn at(self, loc: Loc) -> Finding {
        Finding {
            loc,
            msg: self.message(),
            kind: self.tag().to_string(),
            ctx: self.context(),
        }
    }
}

/// A single binding or coercion failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    /// Source category, parameter name, then nested path
    pub loc: Loc,
    /// Human-readable message
    pub msg: String,
    /// Machine-readable error kind
    #[serde(rename = "type")]
    pub kind: String,
    /// Violated bound, permitted values and similar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ctx: Option<Map<String, Value>>,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc: Vec<String> = self.loc.iter().map(ToString::to_string).collect();
        write!(f, "{}: {} ({})", loc.join("."), self.msg, self.kind)
    }
}

/// All findings produced while binding one request.
#[derive(Error, Debug, Clone, PartialEq, Default)]
#[error("{} validation finding(s)", .findings.len())]
pub struct ValidationError {
    findings: Vec<Finding>,
}

impl ValidationError {
    /// Create an error from a list of findings.
    #[must_use]
    pub const fn new(findings: Vec<Finding>) -> Self {
        Self { findings }
    }

    /// Shortcut for a single finding.
    #[must_use]
    pub fn single(finding: Finding) -> Self {
        Self {
            findings: vec![finding],
        }
    }

    /// The findings, in reporting order.
    #[must_use]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Consume the error, returning its findings.
    #[must_use]
    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    /// Number of findings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.findings.len()
    }

    /// Whether no finding has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

impl From<Vec<Finding>> for ValidationError {
    fn from(findings: Vec<Finding>) -> Self {
        Self::new(findings)
    }
}
