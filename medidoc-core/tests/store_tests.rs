//! Template store error-message, atomic-write-safety, and mutation tests.

use assert_fs::prelude::*;
use medidoc_core::{
    store::{self, TemplateDelete, TemplateEdit, TemplateUpdate},
    types::{DocumentType, HospitalId, Template},
    StoreError,
};
use predicates::prelude::predicate;
use std::fs;

fn hospital() -> HospitalId {
    HospitalId::from("city_care")
}

fn layout(label: &str) -> String {
    format!("version: 1\nbody:\n  - kind: text\n    text: \"{label}\"\n")
}

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = home.path().join(".medidoc").join("hospitals").join("city_care");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(dir.join("templates.yaml"), b": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = store::fetch_templates_at(home.path(), &hospital()).unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("templates.yaml"));
}

#[test]
fn load_unknown_document_type_returns_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let dir = home.path().join(".medidoc").join("hospitals").join("city_care");
    fs::create_dir_all(&dir).expect("mkdir");
    fs::write(
        dir.join("templates.yaml"),
        b"templates:\n  invoice:\n    - name: x\n      value: y\n",
    )
    .expect("write");

    let err = store::fetch_templates_at(home.path(), &hospital()).unwrap_err();
    assert!(matches!(err, StoreError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Atomic write safety
// ---------------------------------------------------------------------------

#[test]
fn save_cleans_up_tmp_file() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    store::upsert_template_at(
        home.path(),
        &hospital(),
        DocumentType::Bill,
        Template::new("Classic", layout("bill")),
    )
    .expect("upsert");

    home.child(".medidoc/hospitals/city_care/templates.yaml")
        .assert(predicate::path::exists());
    home.child(".medidoc/hospitals/city_care/templates.yaml.tmp")
        .assert(predicate::path::missing());
}

#[test]
fn stored_file_uses_camel_case_document_keys() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    store::upsert_template_at(
        home.path(),
        &hospital(),
        DocumentType::DischargeSummary,
        Template::new("Detailed", layout("summary")),
    )
    .expect("upsert");

    home.child(".medidoc/hospitals/city_care/templates.yaml")
        .assert(predicate::str::contains("dischargeSummary:"))
        .assert(predicate::str::contains("name: Detailed"));
}

// ---------------------------------------------------------------------------
// 3. Mutations
// ---------------------------------------------------------------------------

#[test]
fn update_replaces_whole_array() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    for name in ["A", "B", "C"] {
        store::upsert_template_at(
            home.path(),
            &hospital(),
            DocumentType::LabReport,
            Template::new(name, layout(name)),
        )
        .expect("upsert");
    }

    let set = store::update_templates_at(
        home.path(),
        &hospital(),
        TemplateUpdate {
            field: DocumentType::LabReport,
            templates: vec![Template::new("Z", layout("Z"))],
        },
    )
    .expect("update");

    let names: Vec<&str> = set
        .templates(DocumentType::LabReport)
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(names, vec!["Z"]);
}

#[test]
fn edit_and_delete_by_index() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    for name in ["First", "Second"] {
        store::upsert_template_at(
            home.path(),
            &hospital(),
            DocumentType::ConsentForm,
            Template::new(name, layout(name)),
        )
        .expect("upsert");
    }

    store::edit_template_at(
        home.path(),
        &hospital(),
        TemplateEdit {
            field: DocumentType::ConsentForm,
            index: 1,
            template: Template::new("Second (revised)", layout("revised")),
        },
    )
    .expect("edit");

    let set = store::delete_template_at(
        home.path(),
        &hospital(),
        TemplateDelete { field: DocumentType::ConsentForm, index: 0 },
    )
    .expect("delete");

    let remaining = set.templates(DocumentType::ConsentForm);
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, "Second (revised)");

    let reloaded = store::fetch_templates_at(home.path(), &hospital()).expect("fetch");
    assert_eq!(reloaded.templates, set.templates);
}

#[test]
fn delete_out_of_range_leaves_file_untouched() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    store::upsert_template_at(
        home.path(),
        &hospital(),
        DocumentType::OpdRx,
        Template::new("Rx", layout("rx")),
    )
    .expect("upsert");
    let path = store::templates_path_at(home.path(), &hospital());
    let before = fs::read(&path).expect("read");

    let err = store::delete_template_at(
        home.path(),
        &hospital(),
        TemplateDelete { field: DocumentType::OpdRx, index: 5 },
    )
    .unwrap_err();
    assert!(err.to_string().contains("index 5"), "got: {err}");
    assert_eq!(before, fs::read(&path).expect("read again"));
}

#[test]
fn hospitals_are_listed_sorted() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    for id in ["zenith", "apollo"] {
        store::hospital_dir_at(home.path(), &HospitalId::from(id)).expect("mkdir");
    }
    let names = store::list_hospitals_at(home.path()).expect("list");
    assert_eq!(names, vec![HospitalId::from("apollo"), HospitalId::from("zenith")]);
}
