use form_pilot::dom::document::{Document, Element, EventKind, NodeId};
use form_pilot::dom::snapshot::{NodeSnapshot, document_from_snapshot, snapshot_document};
use form_pilot::error::FormPilotError;
use serde_json::json;

mod common;
use crate::common::utils::application_page;

// =========================================================================
// Snapshots
// =========================================================================

#[test]
fn snapshot_keeps_live_values() {
    let mut doc = application_page();
    let email = doc.elements_with_attr("name", "email")[0];
    doc.set_value(email, "a@b.com");

    let snap = snapshot_document(&doc);
    let reloaded = document_from_snapshot(&snap).unwrap();
    let email = reloaded.elements_with_attr("name", "email")[0];
    assert_eq!(reloaded.value(email), "a@b.com");
    assert_eq!(snapshot_document(&reloaded), snap);
}

#[test]
fn html_root_is_unwrapped_to_body() {
    let snap: NodeSnapshot = serde_json::from_value(json!({
        "tag": "html",
        "children": [
            {"tag": "head"},
            {"tag": "body", "children": [{"tag": "input", "attrs": {"name": "q"}}]}
        ]
    }))
    .unwrap();

    let doc = document_from_snapshot(&snap).unwrap();
    let children = doc.children(doc.root());
    assert_eq!(children.len(), 1);
    assert_eq!(doc.tag(children[0]), "input");
}

#[test]
fn html_without_body_is_rejected() {
    let snap: NodeSnapshot = serde_json::from_value(json!({"tag": "html"})).unwrap();
    assert!(matches!(
        document_from_snapshot(&snap),
        Err(FormPilotError::PageStructure(_))
    ));
}

// =========================================================================
// Tree and visibility
// =========================================================================

#[test]
fn hidden_ancestors_hide_descendants() {
    let mut doc = Document::new();
    let root = doc.root();
    let wrapper = doc.append(
        root,
        Element::new("div")
            .attr("style", "display: none")
            .child(Element::new("input").attr("name", "secret")),
    );
    let visible = doc.append(root, Element::new("input").attr("name", "shown"));
    let aria = doc.append(root, Element::new("input").attr("aria-hidden", "true"));

    let secret = doc.children(wrapper)[0];
    assert!(doc.is_hidden(secret));
    assert!(!doc.is_hidden(visible));
    assert!(doc.is_hidden(aria));
}

#[test]
fn removed_subtree_is_detached() {
    let mut doc = application_page();
    let email = doc.elements_with_attr("name", "email")[0];
    assert!(doc.is_attached(email));

    doc.remove(email);
    assert!(!doc.is_attached(email));
    assert!(!doc.set_value(email, "x"), "Detached elements refuse writes");
    assert!(doc.elements_with_attr("name", "email").is_empty());

    doc.remove(email);
    doc.remove(NodeId(10_000));
    assert_eq!(doc.elements().len(), 4, "Stale and foreign ids are ignored");
}

// =========================================================================
// Values and events
// =========================================================================

#[test]
fn select_accepts_only_its_options() {
    let mut doc = Document::new();
    let root = doc.root();
    let select = doc.append(
        root,
        Element::new("select")
            .child(Element::new("option").attr("value", "de").text("Germany"))
            .child(Element::new("option").text("France")),
    );

    assert!(doc.set_value(select, "germany"));
    assert_eq!(doc.value(select), "de");
    assert_eq!(doc.selected_text(select).as_deref(), Some("Germany"));

    doc.set_value(select, "France");
    assert_eq!(doc.value(select), "France", "Option without value uses its text");

    doc.set_value(select, "Atlantis");
    assert_eq!(doc.value(select), "");
    assert_eq!(doc.selected_text(select), None);
}

#[test]
fn dispatch_records_and_runs_listeners_in_order() {
    let mut doc = application_page();
    let email = doc.elements_with_attr("name", "email")[0];
    doc.add_listener(
        email,
        Box::new(|kind: EventKind, value: &mut String| {
            if kind == EventKind::Change {
                *value = value.to_lowercase();
            }
        }),
    );

    doc.set_value(email, "A@B.COM");
    doc.dispatch(email, EventKind::Input);
    assert_eq!(doc.value(email), "A@B.COM");
    doc.dispatch(email, EventKind::Change);
    assert_eq!(doc.value(email), "a@b.com");

    let kinds: Vec<_> = doc.events().iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Input, EventKind::Change]);
    assert!(doc.events().iter().all(|e| e.target == email));
}
