use form_pilot::detect::field_model::Field;
use form_pilot::dom::document::{Document, Element, NodeId};
use form_pilot::mapping::mapping_model::Profile;
use form_pilot::mapping::resolver::MappingResolver;
use form_pilot::mapping::service::MappingService;
use form_pilot::store::local_store::LocalStore;

use std::time::Duration;

/// Email by name, company name by placeholder, description by enclosing label.
///
/// The description prompt is label text around an empty textarea. Text
/// inside a `<textarea>` is its initial value, so
/// `<textarea>Describe your company</textarea>` would be a prefilled,
/// unclassified field instead (see `textarea_body_is_a_value_not_a_prompt`).
pub fn application_page() -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    doc.append(
        root,
        Element::new("form")
            .child(Element::new("input").attr("name", "email"))
            .child(Element::new("input").attr("placeholder", "Company Name"))
            .child(
                Element::new("label")
                    .text("Describe your company")
                    .child(Element::new("textarea")),
            ),
    );
    doc
}

/// Same shape as `application_page`, but the second field asks for a
/// LinkedIn URL.
pub fn linkedin_page() -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    doc.append(
        root,
        Element::new("form")
            .child(Element::new("input").attr("name", "email"))
            .child(Element::new("input").attr("placeholder", "LinkedIn URL"))
            .child(
                Element::new("label")
                    .text("Describe your company")
                    .child(Element::new("textarea")),
            ),
    );
    doc
}

/// A page with one labelled input per entry, in order.
pub fn labelled_inputs(labels: &[&str]) -> Document {
    let mut doc = Document::new();
    let root = doc.root();
    let mut form = Element::new("form");
    for label in labels {
        form = form.child(
            Element::new("label")
                .text(label)
                .child(Element::new("input").attr("type", "text")),
        );
    }
    doc.append(root, form);
    doc
}

pub fn application_profile() -> Profile {
    Profile::new()
        .with("email", "a@b.com")
        .with("companyName", "Acme")
        .with("description", "We do X")
}

pub fn resolver_with(
    service: impl MappingService + 'static,
    profile: &Profile,
    context: &str,
) -> MappingResolver {
    let mut resolver = MappingResolver::new(
        Box::new(service),
        LocalStore::in_memory(),
        Duration::from_secs(600),
    );
    resolver
        .save_profile(profile)
        .expect("in-memory profile save");
    resolver
        .save_context(context)
        .expect("in-memory context save");
    resolver
}

/// Element a field's locator currently points at.
pub fn element_of(doc: &Document, field: &Field) -> NodeId {
    field
        .selector
        .resolve(doc)
        .unwrap_or_else(|| panic!("locator {} should resolve", field.selector))
}

pub fn value_of(doc: &Document, field: &Field) -> String {
    doc.value(element_of(doc, field)).to_string()
}
