//! Response shaping.
//!
//! When a route declares its output type, the handler's return value is
//! re-validated against that shape before it is sent. Fields the shape does
//! not declare disappear, defaults are filled in, and the exclusion set is
//! applied last so an excluded field never leaves the process regardless of
//! what the handler returned.

use crate::error::ShapeError;
use crate::finding::LocPart;
use crate::shape::Shape;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Declared output type of a route plus field filters.
///
/// # Examples
///
/// ```
/// use parambind_core::{FieldSpec, ModelSchema, ResponseModel, Shape};
/// use serde_json::json;
///
/// let user = ModelSchema::new(
///     "UserIn",
///     vec![
///         FieldSpec::required("user_name", Shape::str()),
///         FieldSpec::required("password", Shape::str()),
///     ],
/// );
/// let model = ResponseModel::new(Shape::model(user)).exclude(["password"]);
/// let out = model.render(&json!({"user_name": "leo", "password": "pass_w0rd"})).unwrap();
/// assert_eq!(out, json!({"user_name": "leo"}));
/// ```
#[derive(Debug, Clone)]
pub struct ResponseModel {
    shape: Shape,
    include: Option<BTreeSet<String>>,
    exclude: BTreeSet<String>,
    exclude_none: bool,
    exclude_unset: bool,
}

impl ResponseModel {
    /// Shape the output as `shape`, with no field filters.
    #[must_use]
    pub const fn new(shape: Shape) -> Self {
        Self {
            shape,
            include: None,
            exclude: BTreeSet::new(),
            exclude_none: false,
            exclude_unset: false,
        }
    }

    /// Keep only these top-level fields.
    #[must_use]
    pub fn include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Never emit these top-level fields.
    #[must_use]
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Drop fields whose value is `null`, at any depth.
    #[must_use]
    pub const fn exclude_none(mut self) -> Self {
        self.exclude_none = true;
        self
    }

    /// Drop model fields absent from the handler output instead of filling
    /// their defaults. A handler echoing client input returns
    /// [`Bound::sent`](crate::Bound::sent) so that "absent" means "not sent
    /// by the client".
    #[must_use]
    pub const fn exclude_unset(mut self) -> Self {
        self.exclude_unset = true;
        self
    }

    /// Declared shape.
    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Shape `output` for sending.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] when `output` does not satisfy the declared
    /// shape (a missing required field, a wrong type).
    pub fn render(&self, output: &Value) -> Result<Value, ShapeError> {
        let loc = [LocPart::from("response")];
        let mut shaped = self
            .shape
            .validate(output, &loc)
            .map_err(|findings| ShapeError(findings.into()))?;
        if self.exclude_unset {
            shaped = self.shape.prune_unset(output, shaped);
        }
        shaped = self.filter_fields(shaped);
        if self.exclude_none {
            shaped = strip_nulls(shaped);
        }
        Ok(shaped)
    }

    fn filter_fields(&self, value: Value) -> Value {
        match value {
            Value::Object(object) => Value::Object(self.filter_object(object)),
            Value::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(object) => Value::Object(self.filter_object(object)),
                        other => other,
                    })
                    .collect(),
            ),
            other => other,
        }
    }

    fn filter_object(&self, object: Map<String, Value>) -> Map<String, Value> {
        object
            .into_iter()
            .filter(|(key, _)| {
                self.include.as_ref().is_none_or(|include| include.contains(key))
                    && !self.exclude.contains(key)
            })
            .collect()
    }
}

fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
