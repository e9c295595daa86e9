//! Scalar coercion.
//!
//! Values arrive either as text (path segments, query entries, headers,
//! cookies) or as JSON. Text is carried as `Value::String`, so every function
//! here takes a JSON value and returns the canonical JSON value for the
//! declared type.

use crate::finding::ErrorKind;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::{Number, Value};

/// Tokens accepted as `true` (compared case-insensitively).
pub const TRUE_TOKENS: [&str; 4] = ["1", "true", "yes", "on"];

/// Tokens accepted as `false` (compared case-insensitively).
pub const FALSE_TOKENS: [&str; 4] = ["0", "false", "no", "off"];

/// Parse a boolean token.
///
/// # Examples
///
/// ```
/// use parambind_core::coerce::parse_bool_token;
///
/// assert_eq!(parse_bool_token("Yes"), Some(true));
/// assert_eq!(parse_bool_token("off"), Some(false));
/// assert_eq!(parse_bool_token("maybe"), None);
/// ```
#[must_use]
pub fn parse_bool_token(token: &str) -> Option<bool> {
    let lowered = token.trim().to_ascii_lowercase();
    if TRUE_TOKENS.contains(&lowered.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&lowered.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Coerce to an integer.
///
/// Strings must parse fully (`"3.14"` fails). JSON floats are accepted only
/// when integral.
///
/// # Errors
///
/// Returns [`ErrorKind::Integer`] when the value is not an integer.
pub fn to_int(value: &Value) -> Result<i64, ErrorKind> {
    match value {
        Value::String(text) => text.trim().parse::<i64>().map_err(|_| ErrorKind::Integer),
        Value::Number(number) => number_to_int(number).ok_or(ErrorKind::Integer),
        _ => Err(ErrorKind::Integer),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn number_to_int(number: &Number) -> Option<i64> {
    if let Some(int) = number.as_i64() {
        return Some(int);
    }
    if number.is_u64() {
        return None;
    }
    let float = number.as_f64()?;
    let in_range = float >= i64::MIN as f64 && float < i64::MAX as f64;
    (float.fract() == 0.0 && in_range).then_some(float as i64)
}

/// Coerce to a float. Integer and float literals are both accepted; `nan`
/// and `inf` are not, since a bound value must be representable in JSON.
///
/// # Errors
///
/// Returns [`ErrorKind::Float`] for non-numeric or non-finite input.
pub fn to_float(value: &Value) -> Result<f64, ErrorKind> {
    let float = match value {
        Value::String(text) => text.trim().parse::<f64>().map_err(|_| ErrorKind::Float)?,
        Value::Number(number) => number.as_f64().ok_or(ErrorKind::Float)?,
        _ => return Err(ErrorKind::Float),
    };
    if float.is_finite() {
        Ok(float)
    } else {
        Err(ErrorKind::Float)
    }
}

/// Coerce to a boolean.
///
/// # Errors
///
/// Returns [`ErrorKind::Bool`] for anything outside the token sets.
pub fn to_bool(value: &Value) -> Result<bool, ErrorKind> {
    match value {
        Value::Bool(flag) => Ok(*flag),
        Value::String(text) => parse_bool_token(text).ok_or(ErrorKind::Bool),
        Value::Number(number) => match number.as_i64() {
            Some(1) => Ok(true),
            Some(0) => Ok(false),
            _ => Err(ErrorKind::Bool),
        },
        _ => Err(ErrorKind::Bool),
    }
}

/// Coerce to a string. Numbers are stringified.
///
/// # Errors
///
/// Returns [`ErrorKind::Str`] for booleans, arrays and objects.
pub fn to_str(value: &Value) -> Result<String, ErrorKind> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        _ => Err(ErrorKind::Str),
    }
}

/// Coerce to a UUID, canonicalized as lowercase hyphenated text.
///
/// # Errors
///
/// Returns [`ErrorKind::Uuid`] when the text is not a UUID.
pub fn to_uuid(value: &Value) -> Result<String, ErrorKind> {
    let Value::String(text) = value else {
        return Err(ErrorKind::Uuid);
    };
    uuid::Uuid::parse_str(text.trim())
        .map(|id| id.hyphenated().to_string())
        .map_err(|_| ErrorKind::Uuid)
}

/// Coerce to a datetime.
///
/// Accepts RFC 3339, naive `YYYY-MM-DD[T ]HH:MM:SS[.f]` (taken as UTC), or a
/// Unix timestamp in seconds.
///
/// # Errors
///
/// Returns [`ErrorKind::DateTime`] when no format applies.
pub fn to_datetime(value: &Value) -> Result<DateTime<FixedOffset>, ErrorKind> {
    match value {
        Value::String(text) => parse_datetime(text.trim()).ok_or(ErrorKind::DateTime),
        Value::Number(number) => {
            let seconds = number.as_f64().ok_or(ErrorKind::DateTime)?;
            from_unix_seconds(seconds).ok_or(ErrorKind::DateTime)
        }
        _ => Err(ErrorKind::DateTime),
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive).fixed_offset());
        }
    }
    text.parse::<f64>().ok().and_then(from_unix_seconds)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn from_unix_seconds(seconds: f64) -> Option<DateTime<FixedOffset>> {
    if !seconds.is_finite() {
        return None;
    }
    let whole = seconds.floor();
    let nanos = ((seconds - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999)).map(|dt| dt.fixed_offset())
}

/// Coerce to a calendar date (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns [`ErrorKind::Date`] on malformed input.
pub fn to_date(value: &Value) -> Result<NaiveDate, ErrorKind> {
    let Value::String(text) = value else {
        return Err(ErrorKind::Date);
    };
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|_| ErrorKind::Date)
}

/// Coerce to a time of day (`HH:MM[:SS[.f]]`).
///
/// # Errors
///
/// Returns [`ErrorKind::Time`] on malformed input.
pub fn to_time(value: &Value) -> Result<NaiveTime, ErrorKind> {
    let Value::String(text) = value else {
        return Err(ErrorKind::Time);
    };
    let text = text.trim();
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|_| ErrorKind::Time)
}

/// Coerce to a duration, expressed in seconds.
///
/// Accepts a number of seconds, `[-]HH:MM:SS[.f]`, `N day[s], HH:MM:SS` and
/// ISO 8601 durations such as `P1DT2H30M`.
///
/// # Errors
///
/// Returns [`ErrorKind::Duration`] on malformed input.
pub fn to_duration_seconds(value: &Value) -> Result<f64, ErrorKind> {
    match value {
        Value::Number(number) => number.as_f64().ok_or(ErrorKind::Duration),
        Value::String(text) => parse_duration(text.trim()).ok_or(ErrorKind::Duration),
        _ => Err(ErrorKind::Duration),
    }
}

fn parse_duration(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    if let Ok(seconds) = text.parse::<f64>() {
        return seconds.is_finite().then_some(seconds);
    }
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let seconds = if body.starts_with('P') || body.starts_with('p') {
        parse_iso_duration(&body[1..])?
    } else {
        parse_clock_duration(body)?
    };
    Some(if negative { -seconds } else { seconds })
}

fn parse_clock_duration(text: &str) -> Option<f64> {
    let (days, clock) = match text.split_once(',') {
        Some((day_part, clock)) => {
            let count = day_part
                .trim()
                .trim_end_matches("days")
                .trim_end_matches("day")
                .trim();
            (count.parse::<f64>().ok()?, clock.trim())
        }
        None => (0.0, text),
    };
    let parts: Vec<&str> = clock.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<f64>().ok()?, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        [m, s] => (0.0, m.parse::<f64>().ok()?, s.parse::<f64>().ok()?),
        _ => return None,
    };
    Some(days * 86_400.0 + hours * 3_600.0 + minutes * 60.0 + seconds)
}

fn parse_iso_duration(text: &str) -> Option<f64> {
    let mut total = 0.0;
    let mut in_time = false;
    let mut digits = String::new();
    let mut saw_unit = false;
    for ch in text.chars() {
        match ch.to_ascii_uppercase() {
            'T' if digits.is_empty() => in_time = true,
            c if c.is_ascii_digit() || c == '.' => digits.push(c),
            unit => {
                let amount = digits.parse::<f64>().ok()?;
                digits.clear();
                let scale = match (unit, in_time) {
                    ('W', false) => 604_800.0,
                    ('D', false) => 86_400.0,
                    ('H', true) => 3_600.0,
                    ('M', true) => 60.0,
                    ('S', true) => 1.0,
                    _ => return None,
                };
                total += amount * scale;
                saw_unit = true;
            }
        }
    }
    (saw_unit && digits.is_empty()).then_some(total)
}

/// Check a URL and, when `allowed` is given, its scheme.
///
/// The original text is kept as the canonical value.
///
/// # Errors
///
/// Returns [`ErrorKind::Url`] for unparseable input and
/// [`ErrorKind::UrlScheme`] for a scheme outside `allowed`.
pub fn to_url(value: &Value, allowed: Option<&[String]>) -> Result<String, ErrorKind> {
    let Value::String(text) = value else {
        return Err(ErrorKind::Str);
    };
    let text = text.trim();
    let parsed = url::Url::parse(text).map_err(|_| ErrorKind::Url)?;
    if let Some(allowed) = allowed {
        if !allowed.iter().any(|scheme| scheme == parsed.scheme()) {
            return Err(ErrorKind::UrlScheme {
                allowed: allowed.to_vec(),
            });
        }
        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ErrorKind::Url);
        }
    }
    Ok(text.to_string())
}

/// Check an email address (`local@domain.tld`).
///
/// # Errors
///
/// Returns [`ErrorKind::Email`] when the address is malformed.
pub fn to_email(value: &Value) -> Result<String, ErrorKind> {
    let Value::String(text) = value else {
        return Err(ErrorKind::Str);
    };
    let text = text.trim();
    let Some((local, domain)) = text.rsplit_once('@') else {
        return Err(ErrorKind::Email);
    };
    let domain_ok = domain
        .split('.')
        .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
        && domain.contains('.');
    let local_ok = !local.is_empty() && !local.contains('@') && !local.chars().any(char::is_whitespace);
    if domain_ok && local_ok {
        Ok(text.to_string())
    } else {
        Err(ErrorKind::Email)
    }
}

/// Build a JSON number from a float, rejecting NaN and infinities.
///
/// # Errors
///
/// Returns [`ErrorKind::Float`] for non-finite input.
pub fn float_value(float: f64) -> Result<Value, ErrorKind> {
    Number::from_f64(float).map(Value::Number).ok_or(ErrorKind::Float)
}
