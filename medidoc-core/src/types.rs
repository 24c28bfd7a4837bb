//! Domain types for the template store.
//!
//! All types are serializable/deserializable via serde + serde_yaml. Field
//! names are camelCase on the wire so stored records match the layout
//! parameter names that templates reference.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed identifier for a hospital whose templates are stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HospitalId(pub String);

impl fmt::Display for HospitalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for HospitalId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for HospitalId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The fixed categories of printable document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentType {
    Header,
    Bill,
    Receipt,
    LabReport,
    MergedLabReport,
    LabBilling,
    DischargeSummary,
    ConsentForm,
    OpdRx,
    OpdPrescription,
    BillToken,
}

impl DocumentType {
    /// All document types in a stable order.
    pub fn all() -> &'static [DocumentType] {
        &[
            DocumentType::Header,
            DocumentType::Bill,
            DocumentType::Receipt,
            DocumentType::LabReport,
            DocumentType::MergedLabReport,
            DocumentType::LabBilling,
            DocumentType::DischargeSummary,
            DocumentType::ConsentForm,
            DocumentType::OpdRx,
            DocumentType::OpdPrescription,
            DocumentType::BillToken,
        ]
    }

    /// Stable machine key (camelCase, same as the serde form).
    pub fn key(&self) -> &'static str {
        match self {
            DocumentType::Header => "header",
            DocumentType::Bill => "bill",
            DocumentType::Receipt => "receipt",
            DocumentType::LabReport => "labReport",
            DocumentType::MergedLabReport => "mergedLabReport",
            DocumentType::LabBilling => "labBilling",
            DocumentType::DischargeSummary => "dischargeSummary",
            DocumentType::ConsentForm => "consentForm",
            DocumentType::OpdRx => "opdRx",
            DocumentType::OpdPrescription => "opdPrescription",
            DocumentType::BillToken => "billToken",
        }
    }

    /// Human-readable name used in messages and error placeholders.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::Header => "header",
            DocumentType::Bill => "bill",
            DocumentType::Receipt => "receipt",
            DocumentType::LabReport => "lab report",
            DocumentType::MergedLabReport => "merged lab report",
            DocumentType::LabBilling => "lab billing",
            DocumentType::DischargeSummary => "discharge summary",
            DocumentType::ConsentForm => "consent form",
            DocumentType::OpdRx => "OPD Rx",
            DocumentType::OpdPrescription => "OPD prescription",
            DocumentType::BillToken => "bill token",
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    /// Accepts the camelCase key or a kebab/snake-case spelling
    /// (`bill-token`, `bill_token`, `billToken`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        DocumentType::all()
            .iter()
            .copied()
            .find(|d| d.key().to_ascii_lowercase() == folded)
            .ok_or_else(|| {
                let keys: Vec<&str> = DocumentType::all().iter().map(|d| d.key()).collect();
                format!("unknown document type '{s}'; expected one of: {}", keys.join(", "))
            })
    }
}

/// Lifecycle status of a lab-test template.
///
/// Only `inactive` hides a template; any other stored status (`draft`,
/// `archived`, ...) is kept verbatim in [`LabTestStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum LabTestStatus {
    #[default]
    Active,
    Inactive,
    Other(String),
}

impl LabTestStatus {
    pub fn as_str(&self) -> &str {
        match self {
            LabTestStatus::Active => "active",
            LabTestStatus::Inactive => "inactive",
            LabTestStatus::Other(status) => status,
        }
    }
}

impl From<String> for LabTestStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "active" => LabTestStatus::Active,
            "inactive" => LabTestStatus::Inactive,
            _ => LabTestStatus::Other(status),
        }
    }
}

impl From<LabTestStatus> for String {
    fn from(status: LabTestStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for LabTestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// An administrator-authored layout for one document type.
///
/// `value` holds the layout source. Templates are versioned only by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Template {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            updated_at: Some(Utc::now()),
        }
    }
}

/// One measured parameter of a lab test (e.g. "Haemoglobin", "g/dL").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTestParameter {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normal_range: Option<String>,
}

/// A lab-test definition managed by the lab-template manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTestTemplate {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub status: LabTestStatus,
    #[serde(default)]
    pub parameters: Vec<LabTestParameter>,
}

/// Every stored template of one hospital.
///
/// Absent document types and empty arrays are equivalent: both mean "use
/// the bundled default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TemplateSet {
    #[serde(default)]
    pub templates: BTreeMap<DocumentType, Vec<Template>>,
    #[serde(default)]
    pub lab_tests: Vec<LabTestTemplate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TemplateSet {
    /// Stored variants for `document`, in order. Empty when none are stored.
    pub fn templates(&self, document: DocumentType) -> &[Template] {
        self.templates
            .get(&document)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up a stored variant by exact name.
    pub fn find(&self, document: DocumentType, name: &str) -> Option<&Template> {
        self.templates(document).iter().find(|t| t.name == name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
