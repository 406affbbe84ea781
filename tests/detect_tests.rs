use form_pilot::detect::detector::{DetectionSession, candidate_elements, detect_fields};
use form_pilot::detect::field_model::SemanticType;
use form_pilot::detect::labels::resolve_label;
use form_pilot::detect::rules::{
    RULES, build_haystack, classify_text, compiled_rule_count, matching_types,
};
use form_pilot::dom::document::{Document, Element};
use form_pilot::selector::locator::Locator;

mod common;
use crate::common::utils::{application_page, labelled_inputs};

// =========================================================================
// Rule table
// =========================================================================

#[test]
fn every_rule_compiles() {
    assert_eq!(
        compiled_rule_count(),
        RULES.len(),
        "Every classification pattern must be a valid regex"
    );
}

#[test]
fn every_rule_is_reachable_in_order() {
    // One sample per table row, in table order.
    let samples = [
        "email address",
        "phone number",
        "demo video",
        "pitch deck link",
        "linkedin profile",
        "twitter handle",
        "company website",
        "url",
        "startup name",
        "first name",
        "surname",
        "full name",
        "what problem are you solving",
        "your solution",
        "why now?",
        "who are your competitors",
        "what is your unfair advantage",
        "market size",
        "how much are you raising",
        "tell us about your team",
        "current traction",
        "how did you hear about us",
        "existing investors",
        "one-liner",
        "company description",
        "street address",
        "city",
        "state",
        "postal code",
        "country",
        "name",
        "company",
    ];
    assert_eq!(samples.len(), RULES.len(), "One sample per rule");

    for (rule, sample) in RULES.iter().zip(samples) {
        assert_eq!(
            classify_text(sample, false),
            Some(rule.semantic_type),
            "Sample '{}' should classify through rule '{}'",
            sample,
            rule.pattern
        );
    }
}

#[test]
fn classification_is_case_insensitive_and_pure() {
    let haystack = build_haystack(&[Some("  Work EMAIL "), None, Some("contact_email")]);
    assert_eq!(haystack, "work email contact_email");
    assert_eq!(classify_text(&haystack, false), Some(SemanticType::Email));
    assert_eq!(
        classify_text(&haystack, false),
        classify_text(&haystack, false),
        "Same text, same answer"
    );
    assert_eq!(classify_text("", false), None, "Empty haystack");
    assert_eq!(classify_text("favourite colour", false), None, "No rule matches");
}

#[test]
fn url_rules_never_classify_textareas() {
    assert_eq!(classify_text("video link", false), Some(SemanticType::VideoUrl));
    assert_eq!(classify_text("video link", true), None);
    assert_eq!(
        classify_text("describe your demo video", true),
        Some(SemanticType::Description),
        "Textarea falls through to the free-text rules"
    );
}

#[test]
fn specific_rules_beat_generic_ones() {
    assert_eq!(classify_text("company name", false), Some(SemanticType::CompanyName));
    assert_eq!(classify_text("contact name", false), Some(SemanticType::ContactName));
    assert_eq!(classify_text("youtube url", false), Some(SemanticType::VideoUrl));
    assert_eq!(
        classify_text("describe the problem", true),
        Some(SemanticType::Problem),
        "Narrative questions win over 'describe'"
    );
    assert_eq!(
        classify_text("short description (100 characters)", true),
        Some(SemanticType::ShortDescription)
    );
}

#[test]
fn ambiguous_labels_are_flagged() {
    // Outcome depends on table order; the first entry is what wins.
    let overlaps = [
        ("company name", SemanticType::CompanyName, SemanticType::ContactName),
        ("company email", SemanticType::Email, SemanticType::CompanyName),
        ("company website", SemanticType::Website, SemanticType::CompanyName),
    ];
    for (text, winner, loser) in overlaps {
        let types = matching_types(text, false);
        assert!(types.len() > 1, "'{}' should match several rules: {:?}", text, types);
        assert_eq!(types[0], winner, "'{}' winner", text);
        assert!(types.contains(&loser), "'{}' also matches {:?}", text, loser);
        assert_eq!(classify_text(text, false), Some(winner));
    }

    assert_eq!(
        matching_types("contact name", false),
        vec![SemanticType::ContactName],
        "Both name rules map to the same type"
    );
}

// =========================================================================
// Labels
// =========================================================================

#[test]
fn label_resolution_order() {
    let mut doc = Document::new();
    let root = doc.root();
    doc.append(root, Element::new("label").attr("for", "em").text("Work email"));
    let by_for = doc.append(
        root,
        Element::new("input").attr("id", "em").attr("aria-label", "ignored"),
    );
    let enclosing = doc.append(
        root,
        Element::new("label")
            .text("Your name")
            .child(Element::new("input").attr("name", "n")),
    );
    let by_aria = doc.append(root, Element::new("input").attr("aria-label", "City"));
    doc.append(root, Element::new("span").attr("id", "raise-h").text("Amount raising"));
    let by_labelledby =
        doc.append(root, Element::new("input").attr("aria-labelledby", "raise-h"));
    let fieldset = doc.append(
        root,
        Element::new("fieldset")
            .child(Element::new("legend").text("Mailing address"))
            .child(Element::new("input")),
    );

    let enclosed_input = doc.children(enclosing)[0];
    let legend_input = doc.children(fieldset)[1];

    assert_eq!(resolve_label(&doc, by_for).as_deref(), Some("Work email"));
    assert_eq!(resolve_label(&doc, enclosed_input).as_deref(), Some("Your name"));
    assert_eq!(resolve_label(&doc, by_aria).as_deref(), Some("City"));
    assert_eq!(resolve_label(&doc, by_labelledby).as_deref(), Some("Amount raising"));
    assert_eq!(resolve_label(&doc, legend_input).as_deref(), Some("Mailing address"));
}

#[test]
fn enclosing_label_skips_option_text() {
    let mut doc = Document::new();
    let root = doc.root();
    let label = doc.append(
        root,
        Element::new("label").text("Country").child(
            Element::new("select")
                .child(Element::new("option").text("United States"))
                .child(Element::new("option").text("Canada")),
        ),
    );
    let select = doc.children(label)[0];
    assert_eq!(resolve_label(&doc, select).as_deref(), Some("Country"));
}

// =========================================================================
// Candidate discovery
// =========================================================================

#[test]
fn detects_application_page() {
    let mut doc = application_page();
    let fields = detect_fields(&mut doc);

    assert_eq!(fields.len(), 3);
    assert_eq!(
        fields.iter().map(|f| f.index).collect::<Vec<_>>(),
        vec![0, 1, 2],
        "Indices follow document order"
    );

    assert_eq!(fields[0].semantic_type, Some(SemanticType::Email));
    assert_eq!(fields[0].selector, Locator::Name("email".into()));
    assert_eq!(fields[0].input_type, "text");

    assert_eq!(fields[1].semantic_type, Some(SemanticType::CompanyName));
    assert_eq!(fields[1].placeholder.as_deref(), Some("Company Name"));
    assert!(matches!(fields[1].selector, Locator::Marker(_)));

    assert_eq!(fields[2].semantic_type, Some(SemanticType::Description));
    assert_eq!(fields[2].tag, "textarea");
    assert_eq!(fields[2].input_type, "textarea");
    assert_eq!(fields[2].label.as_deref(), Some("Describe your company"));
}

#[test]
fn textarea_body_is_a_value_not_a_prompt() {
    let mut doc = Document::new();
    let root = doc.root();
    doc.append(
        root,
        Element::new("form").child(Element::new("textarea").text("Describe your company")),
    );

    let fields = detect_fields(&mut doc);
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].current_value, "Describe your company");
    assert!(fields[0].has_value(), "Prefilled, so nothing gets suggested");
    assert_eq!(fields[0].label, None);
    assert_eq!(fields[0].semantic_type, None, "Values are not classified");

    let mut placeholder_page = Document::new();
    let root = placeholder_page.root();
    placeholder_page.append(
        root,
        Element::new("textarea").attr("placeholder", "Describe your company"),
    );
    let fields = detect_fields(&mut placeholder_page);
    assert_eq!(fields[0].semantic_type, Some(SemanticType::Description));
    assert!(!fields[0].has_value());
}

#[test]
fn skips_non_fillable_controls() {
    let mut doc = Document::new();
    let root = doc.root();
    doc.append(
        root,
        Element::new("form")
            .child(Element::new("input").attr("type", "hidden").attr("name", "csrf"))
            .child(Element::new("input").attr("type", "checkbox").attr("name", "agree"))
            .child(Element::new("input").attr("type", "submit"))
            .child(Element::new("input").attr("name", "a").attr("disabled", ""))
            .child(Element::new("input").attr("name", "b").attr("readonly", ""))
            .child(Element::new("input").attr("name", "c").attr("style", "display: none"))
            .child(
                Element::new("div")
                    .attr("aria-hidden", "true")
                    .child(Element::new("input").attr("name", "d")),
            )
            .child(Element::new("input").attr("type", "email").attr("name", "visible")),
    );

    let fields = detect_fields(&mut doc);
    assert_eq!(fields.len(), 1, "Only the visible email input qualifies");
    assert_eq!(fields[0].name.as_deref(), Some("visible"));
    assert_eq!(fields[0].input_type, "email");
}

#[test]
fn loose_controls_are_found_once() {
    let mut doc = Document::new();
    let root = doc.root();
    doc.append(root, Element::new("input").attr("name", "before"));
    doc.append(
        root,
        Element::new("form").child(Element::new("input").attr("name", "inside")),
    );
    doc.append(root, Element::new("textarea").attr("name", "after"));

    let candidates = candidate_elements(&doc);
    assert_eq!(candidates.len(), 3, "Form pass and sweep overlap without duplicates");

    let fields = detect_fields(&mut doc);
    let names: Vec<_> = fields.iter().filter_map(|f| f.name.as_deref()).collect();
    assert_eq!(names, vec!["before", "inside", "after"]);
}

#[test]
fn empty_page_yields_no_fields() {
    let mut doc = Document::new();
    assert!(detect_fields(&mut doc).is_empty());
}

#[test]
fn current_values_are_reported() {
    let mut doc = Document::new();
    let root = doc.root();
    doc.append(
        root,
        Element::new("form")
            .child(Element::new("input").attr("name", "email").attr("value", "x@y.z"))
            .child(
                Element::new("select")
                    .attr("name", "stage")
                    .child(Element::new("option").attr("value", "").text("Pick one"))
                    .child(Element::new("option").attr("value", "seed").text("Seed")),
            ),
    );

    let fields = detect_fields(&mut doc);
    assert_eq!(fields[0].current_value, "x@y.z");
    assert!(fields[0].has_value());
    assert_eq!(fields[1].current_value, "", "First option value is empty");
    assert!(!fields[1].has_value());
}

#[test]
fn rescanning_unchanged_page_is_stable() {
    let mut doc = labelled_inputs(&["First name", "Last name", "Email", "Website"]);
    let mut session = DetectionSession::new();

    let first = session.scan(&mut doc);
    let second = session.scan(&mut doc);
    assert_eq!(first, second, "Same session, same fields");

    let fresh = detect_fields(&mut doc);
    assert_eq!(first, fresh, "Injected markers are reused by a new session");
}

#[test]
fn field_serializes_camel_case() {
    let mut doc = application_page();
    let fields = detect_fields(&mut doc);
    let json = serde_json::to_value(&fields[1]).unwrap();

    assert_eq!(json["semanticType"], "companyName");
    assert_eq!(json["inputType"], "text");
    assert_eq!(json["selector"]["kind"], "marker");
    assert_eq!(json["currentValue"], "");
}
