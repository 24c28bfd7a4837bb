//! Bundled default layouts, one per document type.
//!
//! Baked into the binary with `include_str!`. Used whenever a hospital has no
//! stored template for a document, or the operator picks "System Default".

use medidoc_core::{DocumentType, Template};

/// Display name of every bundled default.
pub const SYSTEM_DEFAULT: &str = "System Default";

/// A bundled default layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinTemplate {
    pub document: DocumentType,
    /// Layout schema version the source was written against.
    pub version: u32,
    pub source: &'static str,
}

impl BuiltinTemplate {
    pub fn name(&self) -> &'static str {
        SYSTEM_DEFAULT
    }

    /// As a storable [`Template`], for seeding a hospital's store.
    pub fn to_template(&self) -> Template {
        Template {
            name: SYSTEM_DEFAULT.to_string(),
            value: self.source.to_string(),
            updated_at: None,
        }
    }
}

const fn builtin(document: DocumentType, source: &'static str) -> BuiltinTemplate {
    BuiltinTemplate { document, version: 1, source }
}

const HEADER: BuiltinTemplate =
    builtin(DocumentType::Header, include_str!("templates/header.yaml"));
const BILL: BuiltinTemplate = builtin(DocumentType::Bill, include_str!("templates/bill.yaml"));
const RECEIPT: BuiltinTemplate =
    builtin(DocumentType::Receipt, include_str!("templates/receipt.yaml"));
const LAB_REPORT: BuiltinTemplate =
    builtin(DocumentType::LabReport, include_str!("templates/lab_report.yaml"));
const MERGED_LAB_REPORT: BuiltinTemplate = builtin(
    DocumentType::MergedLabReport,
    include_str!("templates/merged_lab_report.yaml"),
);
const LAB_BILLING: BuiltinTemplate =
    builtin(DocumentType::LabBilling, include_str!("templates/lab_billing.yaml"));
const DISCHARGE_SUMMARY: BuiltinTemplate = builtin(
    DocumentType::DischargeSummary,
    include_str!("templates/discharge_summary.yaml"),
);
const CONSENT_FORM: BuiltinTemplate =
    builtin(DocumentType::ConsentForm, include_str!("templates/consent_form.yaml"));
const OPD_RX: BuiltinTemplate =
    builtin(DocumentType::OpdRx, include_str!("templates/opd_rx.yaml"));
const OPD_PRESCRIPTION: BuiltinTemplate = builtin(
    DocumentType::OpdPrescription,
    include_str!("templates/opd_prescription.yaml"),
);
const BILL_TOKEN: BuiltinTemplate =
    builtin(DocumentType::BillToken, include_str!("templates/bill_token.yaml"));

/// The bundled default for `document`.
pub fn builtin_for(document: DocumentType) -> &'static BuiltinTemplate {
    match document {
        DocumentType::Header => &HEADER,
        DocumentType::Bill => &BILL,
        DocumentType::Receipt => &RECEIPT,
        DocumentType::LabReport => &LAB_REPORT,
        DocumentType::MergedLabReport => &MERGED_LAB_REPORT,
        DocumentType::LabBilling => &LAB_BILLING,
        DocumentType::DischargeSummary => &DISCHARGE_SUMMARY,
        DocumentType::ConsentForm => &CONSENT_FORM,
        DocumentType::OpdRx => &OPD_RX,
        DocumentType::OpdPrescription => &OPD_PRESCRIPTION,
        DocumentType::BillToken => &BILL_TOKEN,
    }
}

/// Every bundled default, in [`DocumentType::all`] order.
pub fn all() -> Vec<&'static BuiltinTemplate> {
    DocumentType::all().iter().map(|d| builtin_for(*d)).collect()
}
