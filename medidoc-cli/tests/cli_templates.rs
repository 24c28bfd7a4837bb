use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;

use medidoc_core::{store, DocumentType, HospitalId, Template};
use tempfile::TempDir;

const VALID_TOKEN: &str = r#"
body:
  - kind: text
    text: "Slot No : {{ patientData.bill.invoiceNumber }}"
"#;

const SCRIPT_TAG: &str = r#"
body:
  - kind: element
    tag: script
"#;

const BILL_TOKEN_DATA: &str = r#"{
  "patientData": {
    "patient": {"name": "John Doe", "age": 35, "gender": "Male", "registrationNumber": "REG1", "contactNumber": "999", "address": "X"},
    "bill": {"invoiceNumber": "INV-1", "services": [{"name": "Consultation", "quantity": 1, "rate": 500}],
             "subtotal": 500, "additionalDiscount": 0, "totalAmount": 500, "amountPaid": 500,
             "createdAt": "2024-03-05T10:30:00Z"},
    "payment": [{"paymentMethod": "Cash"}]
  },
  "hospital": {"name": "Test Hospital", "address": "Test City"}
}"#;

fn medidoc(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("medidoc"));
    cmd.env("HOME", home).env("USERPROFILE", home).env_remove("RUST_LOG");
    cmd
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write fixture");
    path
}

#[test]
fn defaults_lists_every_document_type() {
    let home = TempDir::new().expect("home");
    medidoc(home.path())
        .arg("defaults")
        .assert()
        .success()
        .stdout(contains("billToken"))
        .stdout(contains("mergedLabReport"))
        .stdout(contains("reportsData, patientData, hospital, ref"));
}

#[test]
fn defaults_prints_layout_source() {
    let home = TempDir::new().expect("home");
    medidoc(home.path())
        .args(["defaults", "bill-token"])
        .assert()
        .success()
        .stdout(contains("Slot No :"))
        .stdout(contains("kind: field"));
}

#[test]
fn add_list_and_delete_round_trip() {
    let home = TempDir::new().expect("home");
    let layout = write_file(&home, "token.yaml", VALID_TOKEN);

    medidoc(home.path())
        .args(["templates", "add", "bill-token", "Thermal", "--hospital", "city", "--file"])
        .arg(&layout)
        .assert()
        .success()
        .stdout(contains("✓ Saved 'Thermal' as billToken template #0"));

    assert!(store::templates_path_at(home.path(), &HospitalId::from("city")).exists());

    medidoc(home.path())
        .args(["templates", "list", "--hospital", "city", "--type", "billToken"])
        .assert()
        .success()
        .stdout(contains("Thermal"));

    medidoc(home.path())
        .args(["templates", "delete", "bill-token", "0", "--hospital", "city"])
        .assert()
        .success()
        .stdout(contains("now uses the bundled default"));

    medidoc(home.path())
        .args(["templates", "list", "--hospital", "city", "--type", "bill-token"])
        .assert()
        .success()
        .stdout(contains("System Default (bundled)"))
        .stdout(contains("Thermal").not());
}

#[test]
fn invalid_layout_is_refused_unless_forced() {
    let home = TempDir::new().expect("home");
    let layout = write_file(&home, "bad.yaml", SCRIPT_TAG);

    medidoc(home.path())
        .args(["templates", "add", "bill", "Bad", "--hospital", "city", "--file"])
        .arg(&layout)
        .assert()
        .failure()
        .stderr(contains("does not compile as a bill template"))
        .stderr(contains("tag `script` is not allowed"));
    assert!(!store::templates_path_at(home.path(), &HospitalId::from("city")).exists());

    medidoc(home.path())
        .args(["templates", "add", "bill", "Bad", "--hospital", "city", "--force", "--file"])
        .arg(&layout)
        .assert()
        .success()
        .stderr(contains("WARN"))
        .stderr(contains("storing anyway"))
        .stderr(contains("tag `script` is not allowed"));
}

#[test]
fn edit_keeps_name_and_replaces_source() {
    let home = TempDir::new().expect("home");
    let hospital = HospitalId::from("city");
    store::upsert_template_at(
        home.path(),
        &hospital,
        DocumentType::BillToken,
        Template::new("Thermal", "body: []\n"),
    )
    .expect("seed");
    let layout = write_file(&home, "token.yaml", VALID_TOKEN);

    medidoc(home.path())
        .args(["templates", "edit", "bill-token", "0", "--hospital", "city", "--file"])
        .arg(&layout)
        .assert()
        .success()
        .stdout(contains("('Thermal')"));

    let set = store::fetch_templates_at(home.path(), &hospital).expect("fetch");
    assert_eq!(set.templates(DocumentType::BillToken)[0].value, VALID_TOKEN);
}

#[test]
fn delete_out_of_range_fails() {
    let home = TempDir::new().expect("home");
    medidoc(home.path())
        .args(["templates", "delete", "bill", "3", "--hospital", "city"])
        .assert()
        .failure()
        .stderr(contains("no bill template at index 3"));
}

#[test]
fn check_renders_with_sample_data() {
    let home = TempDir::new().expect("home");
    let layout = write_file(&home, "token.yaml", VALID_TOKEN);
    medidoc(home.path())
        .args(["templates", "check", "bill-token", "--format", "text", "--file"])
        .arg(&layout)
        .assert()
        .success()
        .stdout(contains("✓ bill token layout is valid"))
        .stdout(contains("Slot No : INV-1"));
}

#[test]
fn check_reports_runtime_failures() {
    let home = TempDir::new().expect("home");
    let layout = write_file(
        &home,
        "helper.yaml",
        "body:\n  - kind: text\n    text: \"{{ nonExistentHelper() }}\"\n",
    );
    medidoc(home.path())
        .args(["templates", "check", "header", "--file"])
        .arg(&layout)
        .assert()
        .failure()
        .stderr(contains("fails with sample data"));
}

#[test]
fn render_bill_token_from_data_file() {
    let home = TempDir::new().expect("home");
    let data = write_file(&home, "token.json", BILL_TOKEN_DATA);
    medidoc(home.path())
        .args(["render", "--type", "bill-token", "--hospital", "city", "--format", "text", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(contains("Slot No :"))
        .stdout(contains("INV-1"))
        .stdout(contains("John Doe"));
}

#[test]
fn render_accepts_loosely_typed_payload() {
    let home = TempDir::new().expect("home");
    let data = write_file(
        &home,
        "token.json",
        r#"{
  "patientData": {
    "patient": {"name": "John Doe", "age": 35.0, "contactNumber": 9876543210, "registrationNumber": 1042},
    "bill": {"invoiceNumber": "INV-1", "services": [{"name": "Consultation", "rate": "500"}],
             "createdAt": "2024-03-05"}
  },
  "hospital": {"name": "Test Hospital"}
}"#,
    );
    medidoc(home.path())
        .args(["render", "--type", "bill-token", "--hospital", "city", "--format", "text", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(contains("INV-1"))
        .stdout(contains("05/03/2024"))
        .stdout(contains("35 Years"))
        .stdout(contains("Reg No : 1042"))
        .stdout(contains("Consultation : 500.00"))
        .stdout(contains("Error rendering").not());
}

#[test]
fn render_json_tree() {
    let home = TempDir::new().expect("home");
    let data = write_file(&home, "token.json", BILL_TOKEN_DATA);
    medidoc(home.path())
        .args(["render", "-t", "billToken", "--hospital", "city", "--format", "json", "-d"])
        .arg(&data)
        .assert()
        .success()
        .stdout(contains("\"type\": \"element\""))
        .stdout(contains("\"id\": \"billToken-print\""));
}

#[test]
fn broken_stored_template_renders_placeholder() {
    let home = TempDir::new().expect("home");
    store::upsert_template_at(
        home.path(),
        &HospitalId::from("city"),
        DocumentType::BillToken,
        Template::new("Broken", "body: ["),
    )
    .expect("seed");
    let data = write_file(&home, "token.json", BILL_TOKEN_DATA);

    medidoc(home.path())
        .args(["render", "--type", "bill-token", "--hospital", "city", "--format", "text", "--data"])
        .arg(&data)
        .assert()
        .success()
        .stdout(contains("Error rendering bill token template"))
        .stderr(contains("render failed"));
}

#[test]
fn render_writes_output_file() {
    let home = TempDir::new().expect("home");
    let data = write_file(&home, "token.json", BILL_TOKEN_DATA);
    let out = home.path().join("token.html");
    medidoc(home.path())
        .args(["render", "--type", "bill-token", "--hospital", "city", "--data"])
        .arg(&data)
        .arg("--out")
        .arg(&out)
        .assert()
        .success()
        .stdout(contains("✓ Wrote bill token"));

    let html = fs::read_to_string(&out).expect("output");
    assert!(html.starts_with("<div"));
    assert!(html.contains("INV-1"));
    assert!(!home.path().join("token.html.tmp").exists());
}

#[test]
fn render_rejects_mismatched_payload() {
    let home = TempDir::new().expect("home");
    let data = write_file(&home, "token.json", BILL_TOKEN_DATA);
    medidoc(home.path())
        .args(["render", "--type", "header", "--hospital", "city", "--data"])
        .arg(&data)
        .assert()
        .failure()
        .stderr(contains("does not match the header payload"));
}

#[test]
fn default_hospital_comes_from_config() {
    let home = TempDir::new().expect("home");
    fs::create_dir_all(home.path().join(".medidoc")).expect("mkdir");
    fs::write(home.path().join(".medidoc/config.yaml"), "default_hospital: city\n").expect("config");
    let layout = write_file(&home, "token.yaml", VALID_TOKEN);

    medidoc(home.path())
        .args(["templates", "add", "bill-token", "Thermal", "--file"])
        .arg(&layout)
        .assert()
        .success()
        .stdout(contains("for 'city'"));
}

#[test]
fn missing_hospital_is_explained() {
    let home = TempDir::new().expect("home");
    medidoc(home.path())
        .args(["templates", "list"])
        .assert()
        .failure()
        .stderr(contains("pass --hospital"));
}

#[test]
fn unknown_document_type_is_rejected() {
    let home = TempDir::new().expect("home");
    medidoc(home.path())
        .args(["defaults", "prescriptionPad"])
        .assert()
        .failure()
        .stderr(contains("unknown document type"));
}
