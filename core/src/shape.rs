//! Declared value shapes and their validation.
//!
//! A [`Shape`] is the declared type of a parameter, a model field or a
//! response. Validating a JSON value against a shape either yields the
//! canonical value (coerced, defaults filled, undeclared fields dropped) or
//! the complete list of findings.

use crate::coerce;
use crate::finding::{ErrorKind, Finding, LocPart, child};
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::sync::Arc;

/// Constraints on string values.
#[derive(Debug, Clone, Default)]
pub struct StrRules {
    /// Minimum length in characters
    pub min_length: Option<usize>,
    /// Maximum length in characters
    pub max_length: Option<usize>,
    /// Pattern the whole value must match
    pub pattern: Option<Regex>,
}

/// Numeric bounds. Limits are kept as JSON numbers so findings report them
/// exactly as declared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumRules {
    /// Exclusive lower bound
    pub gt: Option<Number>,
    /// Inclusive lower bound
    pub ge: Option<Number>,
    /// Exclusive upper bound
    pub lt: Option<Number>,
    /// Inclusive upper bound
    pub le: Option<Number>,
}

impl NumRules {
    fn check(&self, value: f64) -> Result<(), ErrorKind> {
        let limit = |n: &Number| n.as_f64().unwrap_or(f64::NAN);
        if let Some(gt) = &self.gt {
            if value.partial_cmp(&limit(gt)) != Some(std::cmp::Ordering::Greater) {
                return Err(ErrorKind::NotGt(gt.clone()));
            }
        }
        if let Some(ge) = &self.ge {
            if !(value >= limit(ge)) {
                return Err(ErrorKind::NotGe(ge.clone()));
            }
        }
        if let Some(lt) = &self.lt {
            if !(value < limit(lt)) {
                return Err(ErrorKind::NotLt(lt.clone()));
            }
        }
        if let Some(le) = &self.le {
            if !(value <= limit(le)) {
                return Err(ErrorKind::NotLe(le.clone()));
            }
        }
        Ok(())
    }
}

/// Numbers usable as bounds. Non-finite floats yield no bound.
pub trait Limit {
    /// Convert to a JSON number.
    fn into_number(self) -> Option<Number>;
}

macro_rules! int_limit {
    ($($ty:ty),*) => {
        $(impl Limit for $ty {
            fn into_number(self) -> Option<Number> {
                Some(Number::from(self))
            }
        })*
    };
}

int_limit!(i32, i64, u32, u64, usize);

impl Limit for f64 {
    fn into_number(self) -> Option<Number> {
        Number::from_f64(self)
    }
}

/// A closed set of string literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumShape {
    name: String,
    values: Vec<String>,
}

impl EnumShape {
    /// Declare an enumeration.
    ///
    /// # Examples
    ///
    /// ```
    /// use parambind_core::shape::EnumShape;
    ///
    /// let models = EnumShape::new("ModelName", ["alexnet", "resnet", "lenet"]);
    /// assert!(models.contains("lenet"));
    /// assert!(!models.contains("internet"));
    /// ```
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Enumeration name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Permitted literals, in declaration order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Whether `literal` is a member.
    #[must_use]
    pub fn contains(&self, literal: &str) -> bool {
        self.values.iter().any(|v| v == literal)
    }
}

/// Whether a field must be supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    /// Absence is a `value_error.missing` finding
    Required,
    /// Absence takes this value (`Value::Null` for "no value")
    Default(Value),
}

/// One field of a model.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    name: String,
    shape: Shape,
    presence: Presence,
    alias: Option<String>,
    example: Option<Value>,
}

impl FieldSpec {
    /// A required field.
    #[must_use]
    pub fn required(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            presence: Presence::Required,
            alias: None,
            example: None,
        }
    }

    /// An optional field defaulting to `null`; the shape is wrapped in
    /// [`Shape::Optional`].
    #[must_use]
    pub fn optional(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape: shape.nullable(),
            presence: Presence::Default(Value::Null),
            alias: None,
            example: None,
        }
    }

    /// A field with an explicit default.
    #[must_use]
    pub fn with_default(name: impl Into<String>, shape: Shape, default: Value) -> Self {
        Self {
            name: name.into(),
            shape,
            presence: Presence::Default(default),
            alias: None,
            example: None,
        }
    }

    /// Read the field from input under another key.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Attach an example value (documentation metadata only).
    #[must_use]
    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Key looked up in input.
    #[must_use]
    pub fn input_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
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

    /// Example value, if any.
    #[must_use]
    pub const fn example_value(&self) -> Option<&Value> {
        self.example.as_ref()
    }
}

/// A named record of fields.
///
/// Models compose rather than inherit: [`ModelSchema::extend`] builds a new
/// record from a base record plus extra fields.
#[derive(Debug, Clone)]
pub struct ModelSchema {
    name: String,
    fields: Vec<FieldSpec>,
    example: Option<Value>,
}

impl ModelSchema {
    /// Declare a model.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
            example: None,
        }
    }

    /// A model made of `base`'s fields followed by `extra`.
    ///
    /// An extra field with the same name as a base field replaces it in place.
    #[must_use]
    pub fn extend(base: &Self, name: impl Into<String>, extra: Vec<FieldSpec>) -> Self {
        let mut fields = base.fields.clone();
        for field in extra {
            match fields.iter_mut().find(|f| f.name == field.name) {
                Some(existing) => *existing = field,
                None => fields.push(field),
            }
        }
        Self {
            name: name.into(),
            fields,
            example: None,
        }
    }

    /// Attach a whole-model example (documentation metadata only).
    #[must_use]
    pub fn example(mut self, example: Value) -> Self {
        self.example = Some(example);
        self
    }

    /// Model name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields, in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Whole-model example, if any.
    #[must_use]
    pub const fn example_value(&self) -> Option<&Value> {
        self.example.as_ref()
    }

    fn validate(&self, value: &Value, loc: &[LocPart]) -> Result<Value, Vec<Finding>> {
        let Value::Object(input) = value else {
            return Err(vec![ErrorKind::Dict.at(loc.to_vec())]);
        };
        let mut output = Map::new();
        let mut findings = Vec::new();
        for field in &self.fields {
            let key = field.input_key();
            let field_loc = child(loc, key);
            match (input.get(key), &field.presence) {
                (Some(raw), _) => match field.shape.validate(raw, &field_loc) {
                    Ok(valid) => {
                        output.insert(field.name.clone(), valid);
                    }
                    Err(mut errs) => findings.append(&mut errs),
                },
                (None, Presence::Default(default)) => {
                    output.insert(field.name.clone(), default.clone());
                }
                (None, Presence::Required) => findings.push(ErrorKind::Missing.at(field_loc)),
            }
        }
        if findings.is_empty() {
            Ok(Value::Object(output))
        } else {
            Err(findings)
        }
    }
}

/// Declared type of a value.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Anything, passed through untouched
    Any,
    /// String with optional length/pattern rules
    Str(StrRules),
    /// Integer with optional bounds
    Int(NumRules),
    /// Float with optional bounds
    Float(NumRules),
    /// Boolean
    Bool,
    /// One of a fixed set of literals
    Enum(EnumShape),
    /// UUID
    Uuid,
    /// Datetime (RFC 3339 output)
    DateTime,
    /// Calendar date
    Date,
    /// Time of day
    Time,
    /// Duration (float seconds output)
    Duration,
    /// URL, optionally restricted to some schemes
    Url {
        /// Accepted schemes; `None` accepts any
        allowed_schemes: Option<Vec<String>>,
    },
    /// Email address
    Email,
    /// Homogeneous list
    List(Box<Shape>),
    /// List with duplicates removed (first occurrence kept)
    Set(Box<Shape>),
    /// Object whose keys and values both have a shape
    Map {
        /// Shape applied to each key (as text)
        key: Box<Shape>,
        /// Shape applied to each value
        value: Box<Shape>,
    },
    /// Structured record
    Model(Arc<ModelSchema>),
    /// `null` or the inner shape
    Optional(Box<Shape>),
    /// First member that accepts the value wins
    Union(Vec<Shape>),
}

impl Shape {
    /// Unconstrained string.
    #[must_use]
    pub fn str() -> Self {
        Self::Str(StrRules::default())
    }

    /// Unconstrained integer.
    #[must_use]
    pub fn int() -> Self {
        Self::Int(NumRules::default())
    }

    /// Unconstrained float.
    #[must_use]
    pub fn float() -> Self {
        Self::Float(NumRules::default())
    }

    /// URL restricted to `http` and `https`.
    #[must_use]
    pub fn http_url() -> Self {
        Self::Url {
            allowed_schemes: Some(vec!["http".to_string(), "https".to_string()]),
        }
    }

    /// List of `inner`.
    #[must_use]
    pub fn list(inner: Self) -> Self {
        Self::List(Box::new(inner))
    }

    /// Set of `inner`.
    #[must_use]
    pub fn set(inner: Self) -> Self {
        Self::Set(Box::new(inner))
    }

    /// Map from `key` to `value`.
    #[must_use]
    pub fn map(key: Self, value: Self) -> Self {
        Self::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// Structured record.
    #[must_use]
    pub fn model(schema: ModelSchema) -> Self {
        Self::Model(Arc::new(schema))
    }

    /// Allow `null`. Already-optional shapes are returned unchanged.
    #[must_use]
    pub fn nullable(self) -> Self {
        match self {
            Self::Optional(_) | Self::Any => self,
            other => Self::Optional(Box::new(other)),
        }
    }

    /// Set a maximum length on a string shape; other shapes are unchanged.
    #[must_use]
    pub fn max_length(self, limit: usize) -> Self {
        self.map_str(|rules| rules.max_length = Some(limit))
    }

    /// Set a minimum length on a string shape; other shapes are unchanged.
    #[must_use]
    pub fn min_length(self, limit: usize) -> Self {
        self.map_str(|rules| rules.min_length = Some(limit))
    }

    /// Require a string shape to match `pattern` starting at its first
    /// character. Add `$` to the pattern to also pin the end.
    #[must_use]
    pub fn pattern(self, pattern: Regex) -> Self {
        self.map_str(|rules| rules.pattern = Some(pattern))
    }

    /// Exclusive lower bound on a numeric shape.
    #[must_use]
    pub fn gt(self, limit: impl Limit) -> Self {
        match limit.into_number() {
            Some(limit) => self.map_num(|rules| rules.gt = Some(limit)),
            None => self,
        }
    }

    /// Inclusive lower bound on a numeric shape.
    #[must_use]
    pub fn ge(self, limit: impl Limit) -> Self {
        match limit.into_number() {
            Some(limit) => self.map_num(|rules| rules.ge = Some(limit)),
            None => self,
        }
    }

    /// Exclusive upper bound on a numeric shape.
    #[must_use]
    pub fn lt(self, limit: impl Limit) -> Self {
        match limit.into_number() {
            Some(limit) => self.map_num(|rules| rules.lt = Some(limit)),
            None => self,
        }
    }

    /// Inclusive upper bound on a numeric shape.
    #[must_use]
    pub fn le(self, limit: impl Limit) -> Self {
        match limit.into_number() {
            Some(limit) => self.map_num(|rules| rules.le = Some(limit)),
            None => self,
        }
    }

    fn map_str(self, apply: impl FnOnce(&mut StrRules)) -> Self {
        match self {
            Self::Str(mut rules) => {
                apply(&mut rules);
                Self::Str(rules)
            }
            Self::Optional(inner) => Self::Optional(Box::new(inner.map_str(apply))),
            other => other,
        }
    }

    fn map_num(self, apply: impl FnOnce(&mut NumRules)) -> Self {
        match self {
            Self::Int(mut rules) => {
                apply(&mut rules);
                Self::Int(rules)
            }
            Self::Float(mut rules) => {
                apply(&mut rules);
                Self::Float(rules)
            }
            Self::Optional(inner) => Self::Optional(Box::new(inner.map_num(apply))),
            other => other,
        }
    }

    /// The shape with any [`Shape::Optional`] wrappers removed.
    #[must_use]
    pub fn peeled(&self) -> &Self {
        match self {
            Self::Optional(inner) => inner.peeled(),
            other => other,
        }
    }

    /// Whether the shape is a single value that can come from text.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self.peeled(),
            Self::List(_) | Self::Set(_) | Self::Map { .. } | Self::Model(_) | Self::Union(_)
        )
    }

    /// Whether the shape collects repeated text entries (list or set of scalars).
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        match self.peeled() {
            Self::List(inner) | Self::Set(inner) => inner.is_scalar(),
            _ => false,
        }
    }

    /// Remove model fields that `source` does not carry, recursing into
    /// nested models, lists and map values. `shaped` is the validated form
    /// of `source`, so anything left is a field that was actually given.
    #[must_use]
    pub fn prune_unset(&self, source: &Value, shaped: Value) -> Value {
        match (self.peeled(), source, shaped) {
            (Self::Model(schema), Value::Object(given), Value::Object(mut out)) => {
                let mut kept = Map::new();
                for field in schema.fields() {
                    let given_value = given.get(field.input_key()).or_else(|| given.get(field.name()));
                    if let (Some(inner_source), Some(inner)) = (given_value, out.remove(field.name())) {
                        kept.insert(field.name().to_string(), field.shape().prune_unset(inner_source, inner));
                    }
                }
                Value::Object(kept)
            }
            (Self::List(inner), Value::Array(given), Value::Array(out)) if given.len() == out.len() => {
                Value::Array(
                    given
                        .iter()
                        .zip(out)
                        .map(|(source, shaped)| inner.prune_unset(source, shaped))
                        .collect(),
                )
            }
            (Self::Map { value, .. }, Value::Object(given), Value::Object(out)) => Value::Object(
                out.into_iter()
                    .map(|(key, shaped)| match given.get(&key) {
                        Some(source) => {
                            let pruned = value.prune_unset(source, shaped);
                            (key, pruned)
                        }
                        None => (key, shaped),
                    })
                    .collect(),
            ),
            (_, _, shaped) => shaped,
        }
    }

    /// Validate `value`, reporting findings under `loc`.
    ///
    /// # Errors
    ///
    /// Returns every finding collected for the value and its children.
    pub fn validate(&self, value: &Value, loc: &[LocPart]) -> Result<Value, Vec<Finding>> {
        let single = |kind: ErrorKind| vec![kind.at(loc.to_vec())];
        if value.is_null() {
            return match self {
                Self::Optional(_) | Self::Any => Ok(Value::Null),
                _ => Err(single(ErrorKind::NoneNotAllowed)),
            };
        }
        match self {
            Self::Any => Ok(value.clone()),
            Self::Optional(inner) => inner.validate(value, loc),
            Self::Str(rules) => validate_str(value, rules).map_err(single),
            Self::Int(rules) => coerce::to_int(value)
                .and_then(|int| checked_int(int, rules))
                .map_err(single),
            Self::Float(rules) => coerce::to_float(value)
                .and_then(|float| {
                    rules.check(float)?;
                    coerce::float_value(float)
                })
                .map_err(single),
            Self::Bool => coerce::to_bool(value).map(Value::Bool).map_err(single),
            Self::Enum(shape) => match value {
                Value::String(literal) if shape.contains(literal) => Ok(value.clone()),
                _ => Err(single(ErrorKind::Enum {
                    permitted: shape.values.clone(),
                })),
            },
            Self::Uuid => coerce::to_uuid(value).map(Value::String).map_err(single),
            Self::DateTime => coerce::to_datetime(value)
                .map(|dt| Value::String(dt.to_rfc3339()))
                .map_err(single),
            Self::Date => coerce::to_date(value)
                .map(|date| Value::String(date.to_string()))
                .map_err(single),
            Self::Time => coerce::to_time(value)
                .map(|time| Value::String(time.to_string()))
                .map_err(single),
            Self::Duration => coerce::to_duration_seconds(value)
                .and_then(coerce::float_value)
                .map_err(single),
            Self::Url { allowed_schemes } => coerce::to_url(value, allowed_schemes.as_deref())
                .map(Value::String)
                .map_err(single),
            Self::Email => coerce::to_email(value).map(Value::String).map_err(single),
            Self::List(inner) => {
                let Value::Array(items) = value else {
                    return Err(single(ErrorKind::List));
                };
                validate_items(inner, items, loc).map(Value::Array)
            }
            Self::Set(inner) => {
                let Value::Array(items) = value else {
                    return Err(single(ErrorKind::Set));
                };
                let mut unique: Vec<Value> = Vec::with_capacity(items.len());
                for item in validate_items(inner, items, loc)? {
                    if !unique.contains(&item) {
                        unique.push(item);
                    }
                }
                Ok(Value::Array(unique))
            }
            Self::Map { key, value: value_shape } => {
                let Value::Object(entries) = value else {
                    return Err(single(ErrorKind::Dict));
                };
                validate_entries(key, value_shape, entries, loc).map(Value::Object)
            }
            Self::Model(schema) => schema.validate(value, loc),
            Self::Union(members) => {
                let mut findings = Vec::new();
                for member in members {
                    match member.validate(value, loc) {
                        Ok(valid) => return Ok(valid),
                        Err(mut errs) => findings.append(&mut errs),
                    }
                }
                if findings.is_empty() {
                    findings.push(ErrorKind::NoUnionMatch.at(loc.to_vec()));
                }
                Err(findings)
            }
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn checked_int(int: i64, rules: &NumRules) -> Result<Value, ErrorKind> {
    rules.check(int as f64)?;
    Ok(Value::from(int))
}

fn validate_str(value: &Value, rules: &StrRules) -> Result<Value, ErrorKind> {
    let text = coerce::to_str(value)?;
    let length = text.chars().count();
    if let Some(min) = rules.min_length {
        if length < min {
            return Err(ErrorKind::MinLength(min));
        }
    }
    if let Some(max) = rules.max_length {
        if length > max {
            return Err(ErrorKind::MaxLength(max));
        }
    }
    if let Some(pattern) = &rules.pattern {
        if pattern.find(&text).is_none_or(|found| found.start() != 0) {
            return Err(ErrorKind::Pattern(pattern.as_str().to_string()));
        }
    }
    Ok(Value::String(text))
}

fn validate_items(inner: &Shape, items: &[Value], loc: &[LocPart]) -> Result<Vec<Value>, Vec<Finding>> {
    let mut output = Vec::with_capacity(items.len());
    let mut findings = Vec::new();
    for (index, item) in items.iter().enumerate() {
        match inner.validate(item, &child(loc, index)) {
            Ok(valid) => output.push(valid),
            Err(mut errs) => findings.append(&mut errs),
        }
    }
    if findings.is_empty() {
        Ok(output)
    } else {
        Err(findings)
    }
}

fn validate_entries(
    key_shape: &Shape,
    value_shape: &Shape,
    entries: &Map<String, Value>,
    loc: &[LocPart],
) -> Result<Map<String, Value>, Vec<Finding>> {
    let mut output = Map::new();
    let mut findings = Vec::new();
    for (key, item) in entries {
        let entry_loc = child(loc, key.as_str());
        let key_text = match key_shape.validate(&Value::String(key.clone()), &child(&entry_loc, "__key__")) {
            Ok(Value::String(text)) => Some(text),
            Ok(other) => Some(other.to_string()),
            Err(mut errs) => {
                findings.append(&mut errs);
                None
            }
        };
        match value_shape.validate(item, &entry_loc) {
            Ok(valid) => {
                if let Some(key_text) = key_text {
                    output.insert(key_text, valid);
                }
            }
            Err(mut errs) => findings.append(&mut errs),
        }
    }
    if findings.is_empty() {
        Ok(output)
    } else {
        Err(findings)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn body(field: &str) -> Vec<LocPart> {
        vec!["body".into(), field.into()]
    }

    fn image() -> ModelSchema {
        ModelSchema::new(
            "Image",
            vec![
                FieldSpec::required("url", Shape::http_url()),
                FieldSpec::required("name", Shape::str()),
            ],
        )
    }

    fn item() -> ModelSchema {
        ModelSchema::new(
            "Item",
            vec![
                FieldSpec::required("name", Shape::str()),
                FieldSpec::optional("description", Shape::str().max_length(300)),
                FieldSpec::required("price", Shape::float().gt(0)),
                FieldSpec::optional("tax", Shape::float()),
                FieldSpec::with_default("tags", Shape::set(Shape::str()), json!([])),
                FieldSpec::optional("images", Shape::list(Shape::model(image()))),
            ],
        )
    }

    #[test]
    fn test_model_fills_defaults_and_drops_extras() {
        let shape = Shape::model(item());
        let out = shape
            .validate(&json!({"name": "something", "price": 10, "secret": 1}), &body("item"))
            .unwrap();
        assert_eq!(
            out,
            json!({
                "name": "something",
                "description": null,
                "price": 10.0,
                "tax": null,
                "tags": [],
                "images": null
            })
        );
    }

    #[test]
    fn test_model_reports_nested_locations() {
        let shape = Shape::model(item());
        let errs = shape
            .validate(
                &json!({"price": -5, "images": [{"url": "http://example.com/a.jpg"}]}),
                &body("item"),
            )
            .unwrap_err();
        let locs: Vec<Value> = errs.iter().map(|f| serde_json::to_value(&f.loc).unwrap()).collect();
        assert_eq!(
            locs,
            vec![
                json!(["body", "item", "name"]),
                json!(["body", "item", "price"]),
                json!(["body", "item", "images", 0, "name"]),
            ]
        );
        assert_eq!(errs[1].kind, "value_error.number.not_gt");
        assert_eq!(errs[1].msg, "ensure this value is greater than 0");
    }

    #[test]
    fn test_set_deduplicates_in_order() {
        let out = Shape::set(Shape::str())
            .validate(&json!(["rock", "metal", "rock", "bar"]), &[])
            .unwrap();
        assert_eq!(out, json!(["rock", "metal", "bar"]));
    }

    #[test]
    fn test_map_coerces_keys_and_values() {
        let shape = Shape::map(Shape::int(), Shape::float());
        let out = shape.validate(&json!({"1": "5.5", "2": 2}), &[]).unwrap();
        assert_eq!(out, json!({"1": 5.5, "2": 2.0}));

        let errs = shape.validate(&json!({"x": 1.0}), &["body".into()]).unwrap_err();
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].kind, "type_error.integer");
        assert_eq!(serde_json::to_value(&errs[0].loc).unwrap(), json!(["body", "x", "__key__"]));
    }

    #[test]
    fn test_null_only_for_optional() {
        assert_eq!(Shape::str().nullable().validate(&Value::Null, &[]).unwrap(), Value::Null);
        let errs = Shape::str().validate(&Value::Null, &body("name")).unwrap_err();
        assert_eq!(errs[0].kind, "type_error.none.not_allowed");
    }

    #[test]
    fn test_string_rules() {
        let shape = Shape::str().min_length(2).max_length(5);
        assert!(shape.validate(&json!("four"), &[]).is_ok());
        assert_eq!(shape.validate(&json!("eleven"), &[]).unwrap_err()[0].kind, "value_error.any_str.max_length");
        assert_eq!(shape.validate(&json!("a"), &[]).unwrap_err()[0].kind, "value_error.any_str.min_length");

        let fixed = Shape::str().pattern(Regex::new("^fixedquery$").unwrap());
        let errs = fixed.validate(&json!("other"), &[]).unwrap_err();
        assert_eq!(errs[0].msg, "string does not match regex \"^fixedquery$\"");
    }

    #[test]
    fn test_pattern_is_anchored_at_start() {
        let prefix = Shape::str().pattern(Regex::new("fixed").unwrap());
        assert_eq!(prefix.validate(&json!("fixedquery"), &[]), Ok(json!("fixedquery")));
        let errs = prefix.validate(&json!("notfixed"), &[]).unwrap_err();
        assert_eq!(errs[0].kind, "value_error.str.regex");
    }

    #[test]
    fn test_union_takes_first_match() {
        let with_hash = ModelSchema::new("InDb", vec![FieldSpec::required("hashed", Shape::str())]);
        let plain = ModelSchema::new("Out", vec![FieldSpec::required("name", Shape::str())]);
        let shape = Shape::Union(vec![Shape::model(with_hash), Shape::model(plain)]);
        let out = shape.validate(&json!({"name": "leo", "password": "x"}), &[]).unwrap();
        assert_eq!(out, json!({"name": "leo"}));
    }

    #[test]
    fn test_extend_appends_and_replaces() {
        let base = ModelSchema::new(
            "UserBase",
            vec![
                FieldSpec::required("username", Shape::str()),
                FieldSpec::optional("full_name", Shape::str()),
            ],
        );
        let in_db = ModelSchema::extend(&base, "UserInDB", vec![FieldSpec::required("hashed_password", Shape::str())]);
        let names: Vec<&str> = in_db.fields().iter().map(FieldSpec::name).collect();
        assert_eq!(names, ["username", "full_name", "hashed_password"]);
        assert_eq!(base.fields().len(), 2);
    }

    #[test]
    fn test_enum_rejects_unknown_literal() {
        let shape = Shape::Enum(EnumShape::new("ModelName", ["alexnet", "resnet", "lenet"]));
        assert_eq!(shape.validate(&json!("resnet"), &[]).unwrap(), json!("resnet"));
        let errs = shape.validate(&json!("internet"), &["path".into(), "model_name".into()]).unwrap_err();
        assert_eq!(errs[0].kind, "type_error.enum");
    }

    proptest! {
        #[test]
        fn prop_well_formed_nested_model_round_trips(
            name in "[a-zA-Z ]{1,12}",
            price in 0.01f64..1_000.0,
            tags in proptest::collection::btree_set("[a-z]{1,6}", 0..4),
            image_names in proptest::collection::vec("[a-z]{1,8}", 0..3),
        ) {
            let images: Vec<Value> = image_names
                .iter()
                .map(|n| json!({"url": format!("http://example.com/{n}.jpg"), "name": n}))
                .collect();
            let input = json!({
                "name": name,
                "description": null,
                "price": price,
                "tax": null,
                "tags": tags.into_iter().collect::<Vec<_>>(),
                "images": images,
            });
            let out = Shape::model(item()).validate(&input, &[]).unwrap();
            prop_assert_eq!(out, input);
        }
    }
}
