//! "Show Inactive" toggle and search behaviour of the lab-template manager.

use std::collections::BTreeSet;

use medidoc_core::{LabTestFilter, LabTestStatus, LabTestTemplate};
use rstest::rstest;

fn catalogue() -> Vec<LabTestTemplate> {
    [
        ("CBC", "Haematology", LabTestStatus::Active),
        ("ESR", "Haematology", LabTestStatus::Inactive),
        ("Lipid Profile", "Biochemistry", LabTestStatus::Active),
        ("Liver Function Test", "Biochemistry", LabTestStatus::Inactive),
        ("Urine Routine", "Pathology", LabTestStatus::Active),
        ("Blood Culture", "Microbiology", LabTestStatus::Other("draft".into())),
    ]
    .into_iter()
    .map(|(name, department, status)| LabTestTemplate {
        name: name.to_string(),
        department: Some(department.to_string()),
        status,
        parameters: vec![],
    })
    .collect()
}

fn names(filter: &LabTestFilter, templates: &[LabTestTemplate]) -> BTreeSet<String> {
    filter
        .apply(templates)
        .into_iter()
        .map(|t| t.name.clone())
        .collect()
}

#[rstest]
#[case("", false, &["Blood Culture", "CBC", "Lipid Profile", "Urine Routine"])]
#[case("", true, &["Blood Culture", "CBC", "ESR", "Lipid Profile", "Liver Function Test", "Urine Routine"])]
#[case("micro", false, &["Blood Culture"])]
#[case("li", false, &["Lipid Profile"])]
#[case("li", true, &["Lipid Profile", "Liver Function Test"])]
#[case("HAEMATOLOGY", true, &["CBC", "ESR"])]
fn filter_membership(
    #[case] query: &str,
    #[case] show_inactive: bool,
    #[case] expected: &[&str],
) {
    let filter = LabTestFilter { query: query.to_string(), show_inactive };
    let expected: BTreeSet<String> = expected.iter().map(|s| s.to_string()).collect();
    assert_eq!(names(&filter, &catalogue()), expected);
}

#[test]
fn toggling_show_inactive_only_adds_inactive_matches() {
    let templates = catalogue();
    for query in ["", "li", "bio", "nothing-matches"] {
        let hidden = names(&LabTestFilter { query: query.into(), show_inactive: false }, &templates);
        let shown = names(&LabTestFilter { query: query.into(), show_inactive: true }, &templates);

        assert!(hidden.is_subset(&shown));
        let added: Vec<&LabTestTemplate> = templates
            .iter()
            .filter(|t| shown.contains(&t.name) && !hidden.contains(&t.name))
            .collect();
        assert!(
            added.iter().all(|t| t.status == LabTestStatus::Inactive),
            "toggle must only reveal inactive templates (query {query:?})"
        );
        assert!(
            templates
                .iter()
                .filter(|t| hidden.contains(&t.name))
                .all(|t| t.status != LabTestStatus::Inactive),
            "toggle off must hide only inactive templates (query {query:?})"
        );
    }
}

#[test]
fn stored_catalogue_with_unknown_status_still_loads() {
    let home = tempfile::TempDir::new().expect("home");
    let hospital = medidoc_core::HospitalId::from("city");
    let path = medidoc_core::store::templates_path_at(home.path(), &hospital);
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(
        &path,
        "labTests:\n  - name: Blood Culture\n    status: draft\n  - name: ESR\n    status: inactive\n",
    )
    .expect("write");

    let set = medidoc_core::store::fetch_templates_at(home.path(), &hospital).expect("fetch");
    let visible = LabTestFilter::default().apply(&set.lab_tests);
    let names: Vec<&str> = visible.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["Blood Culture"]);
}
