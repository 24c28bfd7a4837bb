//! Per-document data payloads and their argument assembly.
//!
//! Each payload knows which document it feeds and how to lay itself out as
//! named template arguments. The renderer adds `ref` and the hospital header.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use medidoc_core::{normalize_age, DocumentType, HospitalInfo, Medicine, Patient, PatientBill, Vitals};

use crate::error::RenderError;
use crate::invoker::TemplateArgs;

/// Data for one document type.
pub trait DocumentData {
    fn document(&self) -> DocumentType;

    /// Hospital identity used to render the header sub-document.
    fn hospital_info(&self) -> &HospitalInfo;

    /// Contract arguments, without `ref`.
    fn arguments(&self) -> Result<TemplateArgs, RenderError>;
}

/// The hospital header on its own.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderDoc {
    pub hospital_info: HospitalInfo,
}

impl DocumentData for HeaderDoc {
    fn document(&self) -> DocumentType {
        DocumentType::Header
    }

    fn hospital_info(&self) -> &HospitalInfo {
        &self.hospital_info
    }

    fn arguments(&self) -> Result<TemplateArgs, RenderError> {
        let mut args = TemplateArgs::new();
        args.insert("hospitalInfo", &self.hospital_info)?;
        Ok(args)
    }
}

/// Bill, receipt and bill token all take `patientData, hospital`.
macro_rules! patient_bill_document {
    ($(#[$meta:meta])* $name:ident, $document:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub patient_data: PatientBill,
            pub hospital: HospitalInfo,
        }

        impl DocumentData for $name {
            fn document(&self) -> DocumentType {
                $document
            }

            fn hospital_info(&self) -> &HospitalInfo {
                &self.hospital
            }

            fn arguments(&self) -> Result<TemplateArgs, RenderError> {
                let mut args = TemplateArgs::new();
                args.insert("patientData", &self.patient_data)?;
                args.insert("hospital", &self.hospital)?;
                Ok(args)
            }
        }
    };
}

patient_bill_document!(
    /// An itemised invoice.
    BillDoc,
    DocumentType::Bill
);
patient_bill_document!(
    /// A payment receipt.
    ReceiptDoc,
    DocumentType::Receipt
);
patient_bill_document!(
    /// The OPD token slip handed over at registration.
    BillTokenDoc,
    DocumentType::BillToken
);

/// A single lab test report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabReportDoc {
    /// `{testName, reportDate, parameters: [{name, value, unit, normalRange}], remarks}`.
    pub report_data: Value,
    pub patient_data: Patient,
    pub hospital: HospitalInfo,
}

impl DocumentData for LabReportDoc {
    fn document(&self) -> DocumentType {
        DocumentType::LabReport
    }

    fn hospital_info(&self) -> &HospitalInfo {
        &self.hospital
    }

    fn arguments(&self) -> Result<TemplateArgs, RenderError> {
        let mut args = TemplateArgs::new();
        args.insert("reportData", &self.report_data)?;
        args.insert("patientData", &self.patient_data)?;
        args.insert("hospital", &self.hospital)?;
        Ok(args)
    }
}

/// Several lab reports for one patient printed together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedLabReportDoc {
    pub reports_data: Vec<Value>,
    pub patient_data: Patient,
    pub hospital: HospitalInfo,
}

impl DocumentData for MergedLabReportDoc {
    fn document(&self) -> DocumentType {
        DocumentType::MergedLabReport
    }

    fn hospital_info(&self) -> &HospitalInfo {
        &self.hospital
    }

    /// The patient's age is passed as its display string.
    fn arguments(&self) -> Result<TemplateArgs, RenderError> {
        let mut patient = self.patient_data.clone();
        patient.age = Value::String(normalize_age(&patient.age));

        let mut args = TemplateArgs::new();
        args.insert("reportsData", &self.reports_data)?;
        args.insert("patientData", &patient)?;
        args.insert("hospital", &self.hospital)?;
        Ok(args)
    }
}

/// Bill for lab investigations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabBillingDoc {
    pub hospital: HospitalInfo,
    /// `{invoiceNumber, date, patientName, referredBy, tests: [{name, price}], totalAmount, paidAmount}`.
    pub lab_data: Value,
}

impl DocumentData for LabBillingDoc {
    fn document(&self) -> DocumentType {
        DocumentType::LabBilling
    }

    fn hospital_info(&self) -> &HospitalInfo {
        &self.hospital
    }

    fn arguments(&self) -> Result<TemplateArgs, RenderError> {
        let mut args = TemplateArgs::new();
        args.insert("hospital", &self.hospital)?;
        args.insert("labData", &self.lab_data)?;
        Ok(args)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DischargeSummaryDoc {
    /// Free-form form fields (`diagnosis`, `clinicalSummary`, `medications`, ...).
    pub form_data: Value,
    pub patient: Patient,
    pub hospital: HospitalInfo,
}

impl DocumentData for DischargeSummaryDoc {
    fn document(&self) -> DocumentType {
        DocumentType::DischargeSummary
    }

    fn hospital_info(&self) -> &HospitalInfo {
        &self.hospital
    }

    fn arguments(&self) -> Result<TemplateArgs, RenderError> {
        let mut args = TemplateArgs::new();
        args.insert("formData", &self.form_data)?;
        args.insert("patient", &self.patient)?;
        args.insert("hospital", &self.hospital)?;
        Ok(args)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentFormDoc {
    pub patient: Patient,
    pub hospital_info: HospitalInfo,
}

impl DocumentData for ConsentFormDoc {
    fn document(&self) -> DocumentType {
        DocumentType::ConsentForm
    }

    fn hospital_info(&self) -> &HospitalInfo {
        &self.hospital_info
    }

    fn arguments(&self) -> Result<TemplateArgs, RenderError> {
        let mut args = TemplateArgs::new();
        args.insert("patient", &self.patient)?;
        args.insert("hospitalInfo", &self.hospital_info)?;
        Ok(args)
    }
}

/// Blank Rx pad with the patient's particulars.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpdRxDoc {
    pub patient: Patient,
    pub hospital: HospitalInfo,
}

impl DocumentData for OpdRxDoc {
    fn document(&self) -> DocumentType {
        DocumentType::OpdRx
    }

    fn hospital_info(&self) -> &HospitalInfo {
        &self.hospital
    }

    fn arguments(&self) -> Result<TemplateArgs, RenderError> {
        let mut args = TemplateArgs::new();
        args.insert("patient", &self.patient)?;
        args.insert("hospital", &self.hospital)?;
        Ok(args)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpdPrescriptionDoc {
    pub patient: Patient,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default)]
    pub prescription: Vec<Medicine>,
    /// Test names or `{name, ...}` objects.
    #[serde(default)]
    pub lab_tests: Vec<Value>,
    #[serde(default)]
    pub selected_comorbidities: Vec<String>,
    pub hospital: HospitalInfo,
}

impl DocumentData for OpdPrescriptionDoc {
    fn document(&self) -> DocumentType {
        DocumentType::OpdPrescription
    }

    fn hospital_info(&self) -> &HospitalInfo {
        &self.hospital
    }

    fn arguments(&self) -> Result<TemplateArgs, RenderError> {
        let mut args = TemplateArgs::new();
        args.insert("patient", &self.patient)?;
        args.insert("vitals", &self.vitals)?;
        args.insert("prescription", &self.prescription)?;
        args.insert("labTests", &self.lab_tests)?;
        args.insert("selectedComorbidities", &self.selected_comorbidities)?;
        args.insert("hospital", &self.hospital)?;
        Ok(args)
    }
}

/// Any document payload, chosen by document type at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyDocument {
    Header(HeaderDoc),
    Bill(BillDoc),
    Receipt(ReceiptDoc),
    LabReport(LabReportDoc),
    MergedLabReport(MergedLabReportDoc),
    LabBilling(LabBillingDoc),
    DischargeSummary(DischargeSummaryDoc),
    ConsentForm(ConsentFormDoc),
    OpdRx(OpdRxDoc),
    OpdPrescription(OpdPrescriptionDoc),
    BillToken(BillTokenDoc),
}

impl AnyDocument {
    /// Deserialise the payload for `document` from JSON.
    pub fn from_value(document: DocumentType, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match document {
            DocumentType::Header => AnyDocument::Header(serde_json::from_value(value)?),
            DocumentType::Bill => AnyDocument::Bill(serde_json::from_value(value)?),
            DocumentType::Receipt => AnyDocument::Receipt(serde_json::from_value(value)?),
            DocumentType::LabReport => AnyDocument::LabReport(serde_json::from_value(value)?),
            DocumentType::MergedLabReport => {
                AnyDocument::MergedLabReport(serde_json::from_value(value)?)
            }
            DocumentType::LabBilling => AnyDocument::LabBilling(serde_json::from_value(value)?),
            DocumentType::DischargeSummary => {
                AnyDocument::DischargeSummary(serde_json::from_value(value)?)
            }
            DocumentType::ConsentForm => AnyDocument::ConsentForm(serde_json::from_value(value)?),
            DocumentType::OpdRx => AnyDocument::OpdRx(serde_json::from_value(value)?),
            DocumentType::OpdPrescription => {
                AnyDocument::OpdPrescription(serde_json::from_value(value)?)
            }
            DocumentType::BillToken => AnyDocument::BillToken(serde_json::from_value(value)?),
        })
    }

    fn inner(&self) -> &dyn DocumentData {
        match self {
            AnyDocument::Header(d) => d,
            AnyDocument::Bill(d) => d,
            AnyDocument::Receipt(d) => d,
            AnyDocument::LabReport(d) => d,
            AnyDocument::MergedLabReport(d) => d,
            AnyDocument::LabBilling(d) => d,
            AnyDocument::DischargeSummary(d) => d,
            AnyDocument::ConsentForm(d) => d,
            AnyDocument::OpdRx(d) => d,
            AnyDocument::OpdPrescription(d) => d,
            AnyDocument::BillToken(d) => d,
        }
    }
}

impl DocumentData for AnyDocument {
    fn document(&self) -> DocumentType {
        self.inner().document()
    }

    fn hospital_info(&self) -> &HospitalInfo {
        self.inner().hospital_info()
    }

    fn arguments(&self) -> Result<TemplateArgs, RenderError> {
        self.inner().arguments()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merged_report_normalises_age() {
        let doc = MergedLabReportDoc {
            patient_data: Patient {
                name: "Asha".into(),
                age: json!({"years": 1, "months": 2, "days": 0}),
                ..Default::default()
            },
            ..Default::default()
        };
        let args = doc.arguments().expect("args");
        assert_eq!(args.values()["patientData"]["age"], "1 Years 2 Months");
    }

    #[test]
    fn from_value_picks_payload_by_document() {
        let value = json!({
            "patientData": {
                "patient": {"name": "John Doe"},
                "bill": {"invoiceNumber": "INV-1"}
            },
            "hospital": {"name": "Test Hospital"}
        });
        let doc = AnyDocument::from_value(DocumentType::BillToken, value).expect("parse");
        assert_eq!(doc.document(), DocumentType::BillToken);
        assert_eq!(doc.hospital_info().name, "Test Hospital");
        let args = doc.arguments().expect("args");
        let names: Vec<&String> = args.values().keys().collect();
        assert_eq!(names, ["hospital", "patientData"]);
    }

    #[test]
    fn from_value_accepts_numeric_vitals_and_contacts() {
        let doc = AnyDocument::from_value(
            DocumentType::OpdPrescription,
            json!({
                "patient": {"name": "John Doe", "contactNumber": 9876543210u64, "registrationNumber": 42},
                "vitals": {"temperature": 98.6, "heartRate": 72},
                "hospital": {"name": "Test Hospital", "contactNumber": 5550100}
            }),
        )
        .expect("parse");
        let args = doc.arguments().expect("args");
        assert_eq!(args.values()["vitals"]["temperature"], "98.6");
        assert_eq!(args.values()["patient"]["contactNumber"], "9876543210");
        assert_eq!(args.values()["patient"]["registrationNumber"], "42");
    }

    #[test]
    fn from_value_accepts_date_only_bill() {
        let doc = AnyDocument::from_value(
            DocumentType::BillToken,
            json!({
                "patientData": {
                    "patient": {"name": "John Doe"},
                    "bill": {"createdAt": "2024-03-05", "slotNumber": 4}
                },
                "hospital": {"name": "Test Hospital"}
            }),
        )
        .expect("parse");
        let args = doc.arguments().expect("args");
        assert_eq!(args.values()["patientData"]["bill"]["createdAt"], "2024-03-05");
        assert_eq!(args.values()["patientData"]["bill"]["invoiceNumber"], "");
    }

    #[test]
    fn from_value_rejects_wrong_shape() {
        assert!(AnyDocument::from_value(DocumentType::Header, json!({"hospital": {}})).is_err());
    }
}
