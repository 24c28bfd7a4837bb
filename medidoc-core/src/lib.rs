//! medidoc core library: document types, parameter contracts, live data
//! records, the per-hospital template store, and settings.
//!
//! - [`types`]: document types, stored templates, lab-test catalogue
//! - [`contract`]: the fixed parameter contract of each document type
//! - [`records`]: patient/bill/hospital data handed to templates
//! - [`store`]: load / save / edit / delete stored templates
//! - [`config`]: `~/.medidoc/config.yaml`
//! - [`lab`]: lab-template manager filtering
//! - [`error`]: [`StoreError`]

pub mod config;
pub mod contract;
pub mod error;
pub mod lab;
pub mod records;
pub mod store;
pub mod types;

pub use config::Settings;
pub use contract::{Grant, Param, ParamKind, ParameterContract, REF_PARAM};
pub use error::StoreError;
pub use lab::LabTestFilter;
pub use records::{
    normalize_age, Bill, BillService, HospitalInfo, Medicine, Patient, PatientBill, Payment,
    Vitals,
};
pub use types::{
    DocumentType, HospitalId, LabTestParameter, LabTestStatus, LabTestTemplate, Template,
    TemplateSet,
};
