//! Live data records handed to document templates.
//!
//! These mirror what the application already holds for a patient visit. Any
//! field not modelled here is preserved in `extra` so custom templates can
//! still reach it by name.
//!
//! Scalars arrive as either strings or numbers depending on the caller. The
//! `lenient` adapters accept both, so a payload is never refused over a
//! scalar's JSON type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Serde adapters for scalars whose JSON type varies between callers.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn text_of(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    fn number_of(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(text_of(Value::deserialize(d)?))
    }

    pub fn string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(text_of(Value::deserialize(d)?).unwrap_or_default())
    }

    /// Unparseable amounts read as zero.
    pub fn number<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(number_of(&Value::deserialize(d)?).unwrap_or(0.0))
    }

    pub fn optional_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(number_of(&Value::deserialize(d)?))
    }
}

/// Hospital identity printed on letterheads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalInfo {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub address: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_logo: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A registered patient.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    /// Either a number of years, a free-text age, or `{years, months, days}`.
    #[serde(default)]
    pub age: Value,
    #[serde(default, deserialize_with = "lenient::string")]
    pub gender: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A billed line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillService {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default = "one", deserialize_with = "lenient::number")]
    pub quantity: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub rate: f64,
}

fn one() -> f64 {
    1.0
}

impl BillService {
    pub fn amount(&self) -> f64 {
        self.quantity * self.rate
    }
}

/// An invoice for services rendered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    #[serde(default, deserialize_with = "lenient::string")]
    pub invoice_number: String,
    #[serde(default)]
    pub services: Vec<BillService>,
    #[serde(default, deserialize_with = "lenient::number")]
    pub subtotal: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub additional_discount: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub total_amount: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    pub amount_paid: f64,
    /// ISO date or timestamp, or epoch millis. Formatted at render time.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub created_at: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Bill {
    pub fn balance_due(&self) -> f64 {
        (self.total_amount - self.amount_paid).max(0.0)
    }
}

/// A payment recorded against a bill.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(default, deserialize_with = "lenient::string")]
    pub payment_method: String,
    #[serde(default, deserialize_with = "lenient::optional_number", skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `patientData` bundle used by bill, receipt and OPD token documents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientBill {
    #[serde(default)]
    pub patient: Patient,
    #[serde(default)]
    pub bill: Bill,
    #[serde(default)]
    pub payment: Vec<Payment>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Vital signs captured at an OPD visit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub blood_pressure: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub oxygen_saturation: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A prescribed medicine line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub frequency: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub duration: String,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Normalise an age value into a display string.
///
/// Numbers and bare numeric strings are treated as years. Objects of the
/// form `{years, months, days}` list their non-zero parts. Free text is
/// passed through trimmed. Anything else is empty.
pub fn normalize_age(age: &Value) -> String {
    match age {
        Value::Number(n) => format!("{} Years", whole(n)),
        Value::String(s) => {
            let s = s.trim();
            if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
                format!("{s} Years")
            } else {
                s.to_string()
            }
        }
        Value::Object(parts) => {
            let mut out = Vec::new();
            for (key, unit) in [("years", "Years"), ("months", "Months"), ("days", "Days")] {
                let count = match parts.get(key) {
                    Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
                    Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
                    _ => 0.0,
                };
                if count > 0.0 {
                    out.push(format!("{} {unit}", trim_fraction(count)));
                }
            }
            out.join(" ")
        }
        _ => String::new(),
    }
}

fn whole(n: &serde_json::Number) -> String {
    match n.as_i64() {
        Some(i) => i.to_string(),
        None => n.as_f64().map(trim_fraction).unwrap_or_else(|| n.to_string()),
    }
}

/// `35.0` → `35`, `2.5` → `2.5`.
fn trim_fraction(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}
