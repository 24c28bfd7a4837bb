//! Representative sample data for every document type.
//!
//! Used to preview and check layouts before they are stored.

use serde_json::json;

use medidoc_core::{
    Bill, BillService, DocumentType, HospitalInfo, Medicine, Patient, PatientBill, Payment, Vitals,
};

use crate::documents::{
    AnyDocument, BillDoc, BillTokenDoc, ConsentFormDoc, DischargeSummaryDoc, HeaderDoc,
    LabBillingDoc, LabReportDoc, MergedLabReportDoc, OpdPrescriptionDoc, OpdRxDoc, ReceiptDoc,
};

pub fn hospital() -> HospitalInfo {
    HospitalInfo {
        name: "Test Hospital".into(),
        address: "Test City".into(),
        contact_number: Some("+91 98765 43210".into()),
        email: Some("care@testhospital.example".into()),
        ..Default::default()
    }
}

pub fn patient() -> Patient {
    Patient {
        name: "John Doe".into(),
        age: json!(35),
        gender: "Male".into(),
        registration_number: Some("REG1".into()),
        contact_number: Some("999".into()),
        address: Some("X".into()),
        ..Default::default()
    }
}

pub fn patient_bill() -> PatientBill {
    PatientBill {
        patient: patient(),
        bill: Bill {
            invoice_number: "INV-1".into(),
            services: vec![BillService {
                name: "Consultation".into(),
                quantity: 1.0,
                rate: 500.0,
            }],
            subtotal: 500.0,
            additional_discount: 0.0,
            total_amount: 500.0,
            amount_paid: 500.0,
            created_at: json!("2024-03-05T10:30:00Z"),
            ..Default::default()
        },
        payment: vec![Payment {
            payment_method: "Cash".into(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn cbc() -> serde_json::Value {
    json!({
        "testName": "Complete Blood Count",
        "reportDate": "2024-03-05",
        "parameters": [
            {"name": "Haemoglobin", "value": "13.8", "unit": "g/dL", "normalRange": "13 - 17"},
            {"name": "WBC", "value": "7200", "unit": "/cumm", "normalRange": "4000 - 11000"}
        ]
    })
}

/// Sample payload for `document`.
pub fn sample(document: DocumentType) -> AnyDocument {
    match document {
        DocumentType::Header => AnyDocument::Header(HeaderDoc {
            hospital_info: hospital(),
        }),
        DocumentType::Bill => AnyDocument::Bill(BillDoc {
            patient_data: patient_bill(),
            hospital: hospital(),
        }),
        DocumentType::Receipt => AnyDocument::Receipt(ReceiptDoc {
            patient_data: patient_bill(),
            hospital: hospital(),
        }),
        DocumentType::BillToken => AnyDocument::BillToken(BillTokenDoc {
            patient_data: patient_bill(),
            hospital: hospital(),
        }),
        DocumentType::LabReport => AnyDocument::LabReport(LabReportDoc {
            report_data: cbc(),
            patient_data: patient(),
            hospital: hospital(),
        }),
        DocumentType::MergedLabReport => AnyDocument::MergedLabReport(MergedLabReportDoc {
            reports_data: vec![
                cbc(),
                json!({
                    "testName": "Blood Sugar (Fasting)",
                    "parameters": [
                        {"name": "Glucose", "value": "92", "unit": "mg/dL", "normalRange": "70 - 100"}
                    ],
                    "remarks": "Fasting sample"
                }),
            ],
            patient_data: Patient {
                age: json!({"years": 35, "months": 4, "days": 0}),
                ..patient()
            },
            hospital: hospital(),
        }),
        DocumentType::LabBilling => AnyDocument::LabBilling(LabBillingDoc {
            hospital: hospital(),
            lab_data: json!({
                "invoiceNumber": "LAB-7",
                "date": "2024-03-05",
                "patientName": "John Doe",
                "referredBy": "Dr. Rao",
                "tests": [
                    {"name": "Complete Blood Count", "price": 300},
                    {"name": "Lipid Profile", "price": 650}
                ],
                "totalAmount": 950,
                "paidAmount": 950
            }),
        }),
        DocumentType::DischargeSummary => AnyDocument::DischargeSummary(DischargeSummaryDoc {
            form_data: json!({
                "admissionDate": "2024-03-01",
                "dischargeDate": "2024-03-05",
                "doctorName": "Dr. Mehta",
                "diagnosis": "Acute gastroenteritis",
                "clinicalSummary": "Admitted with vomiting and dehydration. Improved on IV fluids.",
                "treatment": "IV fluids, antiemetics, oral rehydration",
                "medications": [
                    {"name": "ORS", "frequency": "After each loose stool", "duration": "3 days"},
                    {"name": "Ondansetron 4mg", "frequency": "SOS", "duration": "2 days"}
                ],
                "followUp": "Review after one week"
            }),
            patient: patient(),
            hospital: hospital(),
        }),
        DocumentType::ConsentForm => AnyDocument::ConsentForm(ConsentFormDoc {
            patient: patient(),
            hospital_info: hospital(),
        }),
        DocumentType::OpdRx => AnyDocument::OpdRx(OpdRxDoc {
            patient: patient(),
            hospital: hospital(),
        }),
        DocumentType::OpdPrescription => AnyDocument::OpdPrescription(OpdPrescriptionDoc {
            patient: patient(),
            vitals: Vitals {
                blood_pressure: Some("120/80".into()),
                heart_rate: Some("78".into()),
                temperature: Some("98.6 F".into()),
                ..Default::default()
            },
            prescription: vec![Medicine {
                name: "Paracetamol 650mg".into(),
                frequency: "1-0-1".into(),
                duration: "5 days".into(),
                instructions: Some("After food".into()),
            }],
            lab_tests: vec![json!("Complete Blood Count"), json!({"name": "Lipid Profile"})],
            selected_comorbidities: vec!["Diabetes".into(), "Hypertension".into()],
            hospital: hospital(),
        }),
    }
}
