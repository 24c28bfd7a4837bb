//! Trusted helpers available to every layout.
//!
//! Registered on each compiled template's Tera instance:
//!
//! | Name              | Kind                     | Purpose                              |
//! |-------------------|--------------------------|--------------------------------------|
//! | `format_date`     | filter                   | ISO/epoch date → configured format   |
//! | `format_datetime` | filter                   | ISO/epoch timestamp → date + time    |
//! | `money`           | filter                   | number → two decimals                |
//! | `age`             | filter                   | normalised age string                |
//! | `has_value`       | filter, tester, function | present and non-empty                |
//!
//! The same functions back `field` node formats.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tera::Tera;

use medidoc_core::{normalize_age, Settings};

use crate::layout::FieldFormat;

/// Formatting options threaded into helpers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub date_format: String,
    pub datetime_format: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions::from(&Settings::default())
    }
}

impl From<&Settings> for RenderOptions {
    fn from(settings: &Settings) -> Self {
        RenderOptions {
            date_format: settings.date_format.clone(),
            datetime_format: settings.datetime_format.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Value helpers
// ---------------------------------------------------------------------------

/// Present and non-empty: not null, not a blank string, not an empty list or map.
pub fn has_value(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// Walk `segments` from `root`. Numeric segments index into arrays.
pub fn lookup<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Display form of a JSON value. Whole floats print without a fraction.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Array(items) => items
            .iter()
            .map(display)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .get("name")
            .map(display)
            .unwrap_or_default(),
    }
}

fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.naive_utc()),
        Value::String(s) => {
            let s = s.trim();
            DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.naive_utc())
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
                .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
        }
        _ => None,
    }
}

/// Format a date-like value. Unparseable input is shown unchanged.
pub fn format_timestamp(value: &Value, format: &str) -> String {
    match parse_timestamp(value) {
        Some(ts) => ts.format(format).to_string(),
        None => display(value),
    }
}

/// Two-decimal amount. Non-numeric input is shown unchanged.
pub fn format_money(value: &Value) -> String {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match amount {
        Some(a) => format!("{a:.2}"),
        None => display(value),
    }
}

/// Apply a `field` node format.
pub fn apply_format(value: &Value, format: Option<FieldFormat>, options: &RenderOptions) -> String {
    match format {
        None => display(value),
        Some(FieldFormat::Date) => format_timestamp(value, &options.date_format),
        Some(FieldFormat::Datetime) => format_timestamp(value, &options.datetime_format),
        Some(FieldFormat::Money) => format_money(value),
        Some(FieldFormat::Age) => normalize_age(value),
        Some(FieldFormat::Upper) => display(value).to_uppercase(),
        Some(FieldFormat::Lower) => display(value).to_lowercase(),
    }
}

// ---------------------------------------------------------------------------
// Tera registration
// ---------------------------------------------------------------------------

fn format_arg(args: &HashMap<String, Value>, default: &str) -> String {
    args.get("format")
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

/// Register every helper on `tera`.
pub fn register(tera: &mut Tera, options: &RenderOptions) {
    let date_format = options.date_format.clone();
    tera.register_filter(
        "format_date",
        move |value: &Value, args: &HashMap<String, Value>| -> tera::Result<Value> {
            Ok(Value::String(format_timestamp(value, &format_arg(args, &date_format))))
        },
    );

    let datetime_format = options.datetime_format.clone();
    tera.register_filter(
        "format_datetime",
        move |value: &Value, args: &HashMap<String, Value>| -> tera::Result<Value> {
            Ok(Value::String(format_timestamp(value, &format_arg(args, &datetime_format))))
        },
    );

    tera.register_filter("money", |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
        Ok(Value::String(format_money(value)))
    });

    tera.register_filter("age", |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
        Ok(Value::String(normalize_age(value)))
    });

    tera.register_filter("has_value", |value: &Value, _: &HashMap<String, Value>| -> tera::Result<Value> {
        Ok(Value::Bool(has_value(value)))
    });

    tera.register_tester("has_value", |value: Option<&Value>, _: &[Value]| -> tera::Result<bool> {
        Ok(value.map(has_value).unwrap_or(false))
    });

    tera.register_function("has_value", |args: &HashMap<String, Value>| -> tera::Result<Value> {
        Ok(Value::Bool(args.get("value").map(has_value).unwrap_or(false)))
    });
}
