use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;

use tempfile::TempDir;

fn medidoc(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("medidoc"));
    cmd.env("HOME", home).env("USERPROFILE", home).env_remove("RUST_LOG");
    cmd
}

fn seed(home: &Path) {
    medidoc(home)
        .args([
            "lab-tests", "add", "Complete Blood Count", "--department", "Haematology",
            "--param", "Haemoglobin|g/dL|13 - 17", "--param", "WBC|/cumm|4000 - 11000",
            "--hospital", "city",
        ])
        .assert()
        .success()
        .stdout(contains("✓ Saved lab test 'Complete Blood Count'"));
    medidoc(home)
        .args(["lab-tests", "add", "Lipid Profile", "--department", "Biochemistry", "--hospital", "city"])
        .assert()
        .success();
    medidoc(home)
        .args(["lab-tests", "add", "ESR", "--department", "Haematology", "--inactive", "--hospital", "city"])
        .assert()
        .success();
}

#[test]
fn inactive_tests_are_hidden_by_default() {
    let home = TempDir::new().expect("home");
    seed(home.path());

    medidoc(home.path())
        .args(["lab-tests", "list", "--hospital", "city"])
        .assert()
        .success()
        .stdout(contains("Complete Blood Count"))
        .stdout(contains("Lipid Profile"))
        .stdout(contains("ESR").not());

    medidoc(home.path())
        .args(["lab-tests", "list", "--hospital", "city", "--show-inactive"])
        .assert()
        .success()
        .stdout(contains("ESR"))
        .stdout(contains("inactive"));
}

#[test]
fn query_filters_by_department() {
    let home = TempDir::new().expect("home");
    seed(home.path());

    medidoc(home.path())
        .args(["lab-tests", "list", "--hospital", "city", "--query", "haem", "--show-inactive", "--json"])
        .assert()
        .success()
        .stdout(contains("\"name\": \"Complete Blood Count\""))
        .stdout(contains("\"normalRange\": \"13 - 17\""))
        .stdout(contains("\"name\": \"ESR\""))
        .stdout(contains("Lipid Profile").not());
}

#[test]
fn empty_catalogue_says_so() {
    let home = TempDir::new().expect("home");
    medidoc(home.path())
        .args(["lab-tests", "list", "--hospital", "city"])
        .assert()
        .success()
        .stdout(contains("No lab tests found."));
}

#[test]
fn parameter_without_name_is_rejected() {
    let home = TempDir::new().expect("home");
    medidoc(home.path())
        .args(["lab-tests", "add", "CBC", "--param", "|g/dL", "--hospital", "city"])
        .assert()
        .failure()
        .stderr(contains("has no name"));
}
