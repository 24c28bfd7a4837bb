//! Per-document parameter contracts.
//!
//! Stored templates reference their inputs by these names, so the lists are
//! part of the stable surface: renaming a parameter breaks every stored
//! custom template of that document type.

use crate::types::DocumentType;

/// Expected JSON shape of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A JSON object (patient, hospital, bill, form data).
    Object,
    /// A JSON array (reports, lab tests, comorbidities).
    Array,
    /// Output handle: the id of the node the rendered tree is mounted under.
    OutputHandle,
}

/// One named parameter of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

/// Sub-components a contract makes available besides data parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// The resolved hospital header render tree (`kind: header`).
    HospitalHeader,
    /// Named styles from the layout's `styles:` table (`class:`).
    Styles,
}

/// The ordered parameter list and grants for one document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterContract {
    pub document: DocumentType,
    pub params: &'static [Param],
    pub grants: &'static [Grant],
}

/// Name of the output-handle parameter.
pub const REF_PARAM: &str = "ref";

const fn object(name: &'static str) -> Param {
    Param { name, kind: ParamKind::Object }
}

const fn array(name: &'static str) -> Param {
    Param { name, kind: ParamKind::Array }
}

const REF: Param = Param { name: REF_PARAM, kind: ParamKind::OutputHandle };

impl ParameterContract {
    /// Names in contract order.
    pub fn names(&self) -> Vec<&'static str> {
        self.params.iter().map(|p| p.name).collect()
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn grants(&self, grant: Grant) -> bool {
        self.grants.contains(&grant)
    }

    /// Whether this contract carries an output handle.
    pub fn has_ref(&self) -> bool {
        self.params.iter().any(|p| p.kind == ParamKind::OutputHandle)
    }
}

const HEADER: &[Param] = &[object("hospitalInfo")];
const PATIENT_DATA: &[Param] = &[object("patientData"), object("hospital"), REF];
const CONSENT_FORM: &[Param] = &[object("patient"), object("hospitalInfo"), REF];
const OPD_RX: &[Param] = &[object("patient"), object("hospital"), REF];
const OPD_PRESCRIPTION: &[Param] = &[
    object("patient"),
    object("vitals"),
    array("prescription"),
    array("labTests"),
    array("selectedComorbidities"),
    object("hospital"),
    REF,
];
const DISCHARGE_SUMMARY: &[Param] =
    &[object("formData"), object("patient"), object("hospital"), REF];
const LAB_REPORT: &[Param] =
    &[object("reportData"), object("patientData"), object("hospital"), REF];
const MERGED_LAB_REPORT: &[Param] =
    &[array("reportsData"), object("patientData"), object("hospital"), REF];
const LAB_BILLING: &[Param] = &[object("hospital"), object("labData"), REF];

const NONE: &[Grant] = &[];
const STYLES: &[Grant] = &[Grant::Styles];
const HEADER_ONLY: &[Grant] = &[Grant::HospitalHeader];
const HEADER_AND_STYLES: &[Grant] = &[Grant::HospitalHeader, Grant::Styles];

impl DocumentType {
    /// The fixed parameter contract for this document type.
    pub fn contract(&self) -> ParameterContract {
        let (params, grants) = match self {
            DocumentType::Header => (HEADER, STYLES),
            DocumentType::Bill | DocumentType::Receipt => (PATIENT_DATA, HEADER_AND_STYLES),
            DocumentType::ConsentForm => (CONSENT_FORM, HEADER_ONLY),
            DocumentType::BillToken => (PATIENT_DATA, NONE),
            DocumentType::OpdRx => (OPD_RX, NONE),
            DocumentType::OpdPrescription => (OPD_PRESCRIPTION, HEADER_ONLY),
            DocumentType::DischargeSummary => (DISCHARGE_SUMMARY, HEADER_AND_STYLES),
            DocumentType::LabReport => (LAB_REPORT, HEADER_AND_STYLES),
            DocumentType::MergedLabReport => (MERGED_LAB_REPORT, HEADER_AND_STYLES),
            DocumentType::LabBilling => (LAB_BILLING, NONE),
        };

        ParameterContract { document: *self, params, grants }
    }
}
