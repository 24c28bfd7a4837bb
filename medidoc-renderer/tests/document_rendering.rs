use medidoc_core::{store, DocumentType, HospitalId, Template, TemplateSet};
use medidoc_renderer::{
    render_document, samples, DocumentData, DocumentRenderer, RenderNode, RenderOptions,
    RenderState, TemplateSelection,
};
use rstest::rstest;
use tempfile::TempDir;

fn store_with(document: DocumentType, templates: Vec<Template>) -> TemplateSet {
    let mut set = TemplateSet::default();
    set.templates.insert(document, templates);
    set
}

fn root_id(tree: &RenderNode) -> Option<&str> {
    match tree {
        RenderNode::Element(e) => e.attrs.get("id").map(String::as_str),
        RenderNode::Text { .. } => None,
    }
}

#[rstest]
#[case(DocumentType::Header)]
#[case(DocumentType::Bill)]
#[case(DocumentType::Receipt)]
#[case(DocumentType::LabReport)]
#[case(DocumentType::MergedLabReport)]
#[case(DocumentType::LabBilling)]
#[case(DocumentType::DischargeSummary)]
#[case(DocumentType::ConsentForm)]
#[case(DocumentType::OpdRx)]
#[case(DocumentType::OpdPrescription)]
#[case(DocumentType::BillToken)]
fn every_default_renders_its_sample(#[case] document: DocumentType) {
    let data = samples::sample(document);
    let result = render_document(
        &data,
        &TemplateSet::default(),
        TemplateSelection::Auto,
        &RenderOptions::default(),
    );
    assert!(result.is_rendered(), "{document}: {:?}", result.error());
    assert!(!result.tree().texts().is_empty(), "{document} rendered no text");
    assert!(!result.tree().contains_text("Error rendering"), "{document} embeds a failed header");
}

#[test]
fn bill_token_shows_slot_and_invoice() {
    let data = samples::sample(DocumentType::BillToken);
    let result = render_document(
        &data,
        &TemplateSet::default(),
        TemplateSelection::Auto,
        &RenderOptions::default(),
    );
    assert!(result.is_rendered(), "{:?}", result.error());
    assert!(result.tree().contains_text("Slot No :"));
    assert!(result.tree().contains_text("INV-1"));
}

#[test]
fn empty_store_falls_back_to_default_every_time() {
    let data = samples::sample(DocumentType::Bill);
    let templates = store_with(DocumentType::Bill, vec![]);
    let mut renderer = DocumentRenderer::new(DocumentType::Bill, &templates, RenderOptions::default());
    assert_eq!(renderer.state(), RenderState::Unselected);

    let first = renderer.render(&data).clone();
    assert!(first.is_rendered(), "{:?}", first.error());
    for _ in 0..3 {
        assert_eq!(renderer.render(&data), &first);
        assert_eq!(renderer.state(), RenderState::Rendered);
    }
    assert!(renderer.resolved().builtin);
}

#[test]
fn documents_with_a_header_include_the_hospital_header() {
    let data = samples::sample(DocumentType::Bill);
    let result = render_document(
        &data,
        &TemplateSet::default(),
        TemplateSelection::Auto,
        &RenderOptions::default(),
    );
    let html = result.tree().to_html();
    assert!(html.contains("data-document=\"header\""), "{html}");
    assert!(result.tree().contains_text("Test Hospital"));
    assert!(result.tree().contains_text("500.00"));
}

#[test]
fn invalid_stored_template_yields_placeholder() {
    let data = samples::sample(DocumentType::Bill);
    let templates = store_with(DocumentType::Bill, vec![Template::new("Broken", "body: [")]);
    let mut renderer = DocumentRenderer::new(DocumentType::Bill, &templates, RenderOptions::default());
    renderer.select(TemplateSelection::Auto);
    assert_eq!(renderer.state(), RenderState::TemplateChosen);

    let result = renderer.render(&data).clone();
    assert!(!result.is_rendered());
    assert!(result.tree().contains_text("Error rendering bill template"));
    assert_eq!(renderer.state(), RenderState::RenderFailed);
}

#[test]
fn undefined_helper_yields_placeholder() {
    let data = samples::sample(DocumentType::LabReport);
    let templates = store_with(
        DocumentType::LabReport,
        vec![Template::new(
            "Custom",
            "body:\n  - kind: text\n    text: \"{{ nonExistentHelper() }}\"\n",
        )],
    );
    let result = render_document(&data, &templates, TemplateSelection::Auto, &RenderOptions::default());
    assert!(result.tree().contains_text("Error rendering"));
    assert!(result.error().is_some_and(|e| e.contains("nonExistentHelper")));
}

#[test]
fn patient_without_email_still_renders() {
    let data = samples::sample(DocumentType::OpdRx);
    let templates = store_with(
        DocumentType::OpdRx,
        vec![Template::new(
            "Contact",
            "body:\n  - kind: text\n    text: \"Email: {{ patient.email }}\"\n",
        )],
    );
    let result = render_document(&data, &templates, TemplateSelection::Auto, &RenderOptions::default());
    assert!(result.is_rendered(), "error: {:?}", result.error());
    assert_eq!(result.tree().texts(), vec!["Email: "]);
}

#[test]
fn broken_header_does_not_break_the_document() {
    let data = samples::sample(DocumentType::Receipt);
    let templates = store_with(DocumentType::Header, vec![Template::new("Broken", "body: [")]);
    let result = render_document(&data, &templates, TemplateSelection::Auto, &RenderOptions::default());
    assert!(result.is_rendered(), "{:?}", result.error());
    assert!(result.tree().contains_text("Error rendering header template"));
    assert!(result.tree().contains_text("PAYMENT RECEIPT"));
}

#[test]
fn named_selection_picks_variant() {
    let data = samples::sample(DocumentType::OpdRx);
    let templates = store_with(
        DocumentType::OpdRx,
        vec![
            Template::new("Compact", "body:\n  - kind: text\n    text: compact\n"),
            Template::new("Full", "body:\n  - kind: field\n    path: patient.name\n"),
        ],
    );
    let options = RenderOptions::default();

    let auto = render_document(&data, &templates, TemplateSelection::Auto, &options);
    assert_eq!(auto.tree().texts(), vec!["compact"]);

    let full = render_document(&data, &templates, TemplateSelection::Named("Full".into()), &options);
    assert_eq!(full.tree().texts(), vec!["John Doe"]);

    let default = render_document(&data, &templates, TemplateSelection::SystemDefault, &options);
    assert!(default.tree().contains_text("Rx"));
}

#[test]
fn mount_handle_becomes_root_id() {
    let data = samples::sample(DocumentType::BillToken);
    let templates = TemplateSet::default();
    let mut renderer = DocumentRenderer::new(DocumentType::BillToken, &templates, RenderOptions::default());
    renderer.mount_at("token-42");
    let result = renderer.render(&data);
    assert_eq!(root_id(result.tree()), Some("token-42"));
}

#[test]
fn wrong_payload_fails_without_panicking() {
    let data = samples::sample(DocumentType::Bill);
    let templates = TemplateSet::default();
    let mut renderer = DocumentRenderer::new(DocumentType::LabReport, &templates, RenderOptions::default());
    let result = renderer.render(&data);
    assert!(result.tree().contains_text("Error rendering lab report template"));
    assert_eq!(renderer.state(), RenderState::RenderFailed);
}

#[test]
fn merged_report_prints_normalised_age() {
    let data = samples::sample(DocumentType::MergedLabReport);
    let result = render_document(
        &data,
        &TemplateSet::default(),
        TemplateSelection::Auto,
        &RenderOptions::default(),
    );
    assert!(result.tree().contains_text("35 Years 4 Months"));
    assert!(result.tree().contains_text("1. "));
    assert!(result.tree().contains_text("Glucose"));
}

#[test]
fn date_format_follows_options() {
    let data = samples::sample(DocumentType::Bill);
    let options = RenderOptions {
        date_format: "%Y-%m-%d".into(),
        ..RenderOptions::default()
    };
    let result = render_document(&data, &TemplateSet::default(), TemplateSelection::Auto, &options);
    assert!(result.tree().contains_text("2024-03-05"));
}

#[test]
fn stored_templates_are_read_from_the_store() {
    let home = TempDir::new().expect("tempdir");
    let hospital = HospitalId::from("city-care");
    store::upsert_template_at(
        home.path(),
        &hospital,
        DocumentType::ConsentForm,
        Template::new("Short", "body:\n  - kind: text\n    text: \"Consent of {{ patient.name }}\"\n"),
    )
    .expect("upsert");

    let templates = store::fetch_templates_at(home.path(), &hospital).expect("fetch");
    let data = samples::sample(DocumentType::ConsentForm);
    let result = render_document(&data, &templates, TemplateSelection::Auto, &RenderOptions::default());
    assert_eq!(result.tree().texts(), vec!["Consent of John Doe"]);
    assert_eq!(data.document(), DocumentType::ConsentForm);
}
