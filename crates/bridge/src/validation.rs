//! Argument validators applied before a call crosses the bridge.
//!
//! Inputs arrive as untyped JSON, the same shape a webview hands to its
//! preload layer. Coercions follow the JavaScript rules the UI side relies on
//! (`String(x)` for text, `!!x` for flags) so the privileged side only ever
//! sees well-formed values.

use serde_json::Value;
use shared::{
    limits::{
        clamp_chars, MAX_BRIDGE_ENTRY_CHARS, MAX_LIST_ENTRIES, MAX_REFRESH_INTERVAL_MS,
        MAX_UNLOCK_PASS_CHARS, MAX_UNLOCK_USER_CHARS, MIN_REFRESH_INTERVAL_MS,
    },
    protocol::Credentials,
};
use thiserror::Error;
use zeroize::Zeroize;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("expected an array of entries")]
    NotAnArray,
    #[error("list has {len} entries, at most {max} are allowed")]
    TooManyEntries { len: usize, max: usize },
    #[error("refresh interval must be a finite number")]
    IntervalNotNumber,
    #[error("refresh interval {value} ms is outside [{min}, {max}]")]
    IntervalOutOfRange { value: f64, min: u64, max: u64 },
    #[error("credentials must be an object")]
    CredentialsNotObject,
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Checks a list payload and returns it with every element coerced to a
/// string and clamped.
pub fn validate_entry_list(value: &Value) -> Result<Vec<String>, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::NotAnArray);
    };
    if items.len() > MAX_LIST_ENTRIES {
        return Err(ValidationError::TooManyEntries {
            len: items.len(),
            max: MAX_LIST_ENTRIES,
        });
    }

    Ok(items
        .iter()
        .map(|item| clamp_chars(&coerce_to_string(item), MAX_BRIDGE_ENTRY_CHARS))
        .collect())
}

/// Accepts only JSON numbers inside the refresh bounds. Strings are not
/// parsed. A fractional interval is truncated to whole milliseconds.
pub fn validate_refresh_interval(value: &Value) -> Result<u64, ValidationError> {
    let Some(interval) = value.as_f64().filter(|n| n.is_finite()) else {
        return Err(ValidationError::IntervalNotNumber);
    };

    let min = MIN_REFRESH_INTERVAL_MS as f64;
    let max = MAX_REFRESH_INTERVAL_MS as f64;
    if !(min..=max).contains(&interval) {
        return Err(ValidationError::IntervalOutOfRange {
            value: interval,
            min: MIN_REFRESH_INTERVAL_MS,
            max: MAX_REFRESH_INTERVAL_MS,
        });
    }

    Ok(interval.trunc() as u64)
}

pub fn sanitize_credentials(value: &Value) -> Result<Credentials, ValidationError> {
    let Value::Object(fields) = value else {
        return Err(ValidationError::CredentialsNotObject);
    };

    let mut user = field_text(fields.get("user"));
    let mut pass = field_text(fields.get("pass"));
    let sanitized = sanitize_credential_pair(&user, &pass);
    user.zeroize();
    pass.zeroize();
    sanitized
}

/// Trims, clamps and requires both fields.
pub fn sanitize_credential_pair(user: &str, pass: &str) -> Result<Credentials, ValidationError> {
    let user = clamp_chars(user.trim(), MAX_UNLOCK_USER_CHARS);
    if user.is_empty() {
        return Err(ValidationError::MissingField("user"));
    }
    let pass = clamp_chars(pass.trim(), MAX_UNLOCK_PASS_CHARS);
    if pass.is_empty() {
        return Err(ValidationError::MissingField("pass"));
    }

    Ok(Credentials::new(user, pass))
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(value) => coerce_to_string(value),
    }
}

/// Overwrites every string held in `value`.
pub fn wipe_strings(value: &mut Value) {
    match value {
        Value::String(text) => text.zeroize(),
        Value::Array(items) => items.iter_mut().for_each(wipe_strings),
        Value::Object(fields) => fields.values_mut().for_each(wipe_strings),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// JavaScript truthiness.
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// JavaScript `String(x)`. JSON integers are printed with all their digits,
/// including those past the range a JavaScript number holds exactly.
pub fn coerce_to_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => match number.as_f64() {
            Some(n) if number.is_f64() => js_number_text(n),
            _ => number.to_string(),
        },
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => coerce_to_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// `Number.prototype.toString()` for the finite values JSON can carry.
fn js_number_text(n: f64) -> String {
    if n == 0.0 {
        // Covers -0.
        return "0".to_string();
    }
    if (1e-6..1e21).contains(&n.abs()) {
        return n.to_string();
    }
    let text = format!("{n:e}");
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => text,
    }
}
