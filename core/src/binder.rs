//! Request-to-handler binding.
//!
//! A [`BindPlan`] is compiled once per route from the route pattern and the
//! handler's parameter declarations. Binding a request walks the plan in
//! source precedence order (path, query, header, cookie, body), coerces each
//! value through its shape and collects every finding before failing, so a
//! single response can report all problems at once.

use crate::error::{BoundError, RouteError};
use crate::finding::{ErrorKind, Finding, Loc, LocPart, ValidationError};
use crate::param::{Param, Source};
use crate::request::RawRequest;
use crate::route::{Captures, RoutePattern};
use crate::shape::Presence;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
struct Planned {
    param: Param,
    source: Source,
    key: String,
}

/// Compiled binding instructions for one route.
#[derive(Debug, Clone)]
pub struct BindPlan {
    params: Vec<Planned>,
    body_embedded: bool,
}

impl BindPlan {
    /// Resolve each parameter's source against `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::DuplicateParam`] for repeated names and
    /// [`RouteError::UnknownPathParam`] for an explicit path parameter that
    /// is not a placeholder of `pattern`.
    pub fn new(pattern: &RoutePattern, params: Vec<Param>) -> Result<Self, RouteError> {
        let mut planned: Vec<Planned> = Vec::with_capacity(params.len());
        for param in params {
            if planned.iter().any(|p| p.param.name() == param.name()) {
                return Err(RouteError::DuplicateParam {
                    pattern: pattern.to_string(),
                    name: param.name().to_string(),
                });
            }
            let source = match param.source() {
                Some(Source::Path) if !pattern.has_placeholder(param.name()) => {
                    return Err(RouteError::UnknownPathParam {
                        pattern: pattern.to_string(),
                        name: param.name().to_string(),
                    });
                }
                Some(source) => source,
                None if pattern.has_placeholder(param.name()) => Source::Path,
                None if param.shape().is_scalar() => Source::Query,
                None => Source::Body,
            };
            let key = match source {
                Source::Path => param.name().to_string(),
                other => param.lookup_key(other),
            };
            planned.push(Planned { param, source, key });
        }
        planned.sort_by_key(|p| p.source);

        let body_params: Vec<&Planned> = planned.iter().filter(|p| p.source == Source::Body).collect();
        let body_embedded = body_params.len() > 1 || body_params.iter().any(|p| p.param.is_embedded());

        Ok(Self {
            params: planned,
            body_embedded,
        })
    }

    /// Where each parameter binds from, in binding order.
    pub fn sources(&self) -> impl Iterator<Item = (&str, Source)> {
        self.params.iter().map(|p| (p.param.name(), p.source))
    }

    /// Whether body parameters are read as keys of a body object.
    #[must_use]
    pub const fn body_embedded(&self) -> bool {
        self.body_embedded
    }

    fn reads_body(&self) -> bool {
        self.params.iter().any(|p| p.source == Source::Body)
    }

    /// Bind `request` using the placeholder values in `captures`.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] carrying every finding. A malformed JSON
    /// body short-circuits with a single `value_error.jsondecode` finding.
    pub fn bind(&self, captures: &Captures, request: &RawRequest) -> Result<Bound, ValidationError> {
        let body = if self.reads_body() {
            match request.json_body() {
                Ok(Some(Value::Null)) | Ok(None) => None,
                Ok(Some(body)) => Some(body),
                Err(err) => {
                    return Err(ValidationError::single(
                        ErrorKind::JsonDecode(err.to_string()).at(vec!["body".into()]),
                    ));
                }
            }
        } else {
            None
        };

        let mut values = Map::new();
        let mut sent = Map::new();
        let mut findings: Vec<Finding> = Vec::new();
        for planned in &self.params {
            let loc: Loc = if planned.source == Source::Body && !self.body_embedded {
                vec![LocPart::from("body")]
            } else {
                vec![planned.source.as_str().into(), planned.key.as_str().into()]
            };
            let raw = self.raw_value(planned, captures, request, body.as_ref());
            match (raw, planned.param.presence()) {
                (Some(raw), _) => match planned.param.shape().validate(&raw, &loc) {
                    Ok(value) => {
                        let name = planned.param.name().to_string();
                        sent.insert(name.clone(), planned.param.shape().prune_unset(&raw, value.clone()));
                        values.insert(name, value);
                    }
                    Err(mut errs) => findings.append(&mut errs),
                },
                (None, Presence::Default(default)) => {
                    values.insert(planned.param.name().to_string(), default.clone());
                }
                (None, Presence::Required) => findings.push(ErrorKind::Missing.at(loc)),
            }
        }

        if findings.is_empty() {
            Ok(Bound { values, sent })
        } else {
            Err(ValidationError::new(findings))
        }
    }

    fn raw_value(
        &self,
        planned: &Planned,
        captures: &Captures,
        request: &RawRequest,
        body: Option<&Value>,
    ) -> Option<Value> {
        let key = planned.key.as_str();
        let sequence = planned.param.shape().is_sequence();
        let text = |s: &str| Value::String(s.to_string());
        let many = |items: Vec<&str>| (!items.is_empty()).then(|| Value::Array(items.into_iter().map(text).collect()));
        match planned.source {
            Source::Path => captures.get(key).map(text),
            Source::Query if sequence => many(request.query_all(key)),
            Source::Query => request.query_last(key).map(text),
            Source::Header if sequence => many(request.header_all(key)),
            Source::Header => request.header_first(key).map(text),
            Source::Cookie => request.cookie(key).map(text),
            Source::Body if self.body_embedded => body
                .and_then(Value::as_object)
                .and_then(|object| object.get(key))
                .cloned(),
            Source::Body => body.cloned(),
        }
    }
}

/// Canonical values produced by a successful bind, keyed by parameter name.
///
/// Alongside the default-filled values, a bound request remembers which
/// parameters and model fields the client actually sent; see [`Bound::sent`].
///
/// # Examples
///
/// ```
/// use parambind_core::Bound;
/// use serde_json::json;
///
/// let bound = Bound::from_value(json!({"item_id": 42, "q": null})).unwrap();
/// let item_id: i64 = bound.get("item_id").unwrap();
/// let q: Option<String> = bound.get("q").unwrap();
/// assert_eq!(item_id, 42);
/// assert_eq!(q, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bound {
    values: Map<String, Value>,
    sent: Map<String, Value>,
}

impl Bound {
    /// Wrap an object of already-canonical values. Returns `None` for
    /// anything other than a JSON object.
    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(values) => Some(Self {
                sent: values.clone(),
                values,
            }),
            _ => None,
        }
    }

    /// Read parameter `name` as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`BoundError::Unknown`] when nothing was bound under `name`
    /// and [`BoundError::Decode`] when the value does not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, name: &str) -> Result<T, BoundError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| BoundError::Unknown(name.to_string()))?;
        T::deserialize(value).map_err(|source| BoundError::Decode {
            name: name.to_string(),
            source,
        })
    }

    /// Raw canonical value of parameter `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Parameter `name` restricted to what the client sent: model fields
    /// filled from defaults are left out, at any depth. `None` when the
    /// parameter itself was not sent.
    ///
    /// Echo this value when the response model uses
    /// [`ResponseModel::exclude_unset`](crate::ResponseModel::exclude_unset).
    #[must_use]
    pub fn sent(&self, name: &str) -> Option<&Value> {
        self.sent.get(name)
    }

    /// Take parameter `name` out of the map. [`Bound::sent`] is unaffected.
    #[must_use]
    pub fn take(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    /// All values as a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }

    /// Number of bound parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
