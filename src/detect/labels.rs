use crate::dom::document::{Document, NodeId};

/// Resolve the human label of a form control.
///
/// Order: `<label for=id>`, enclosing `<label>`, `aria-label`,
/// `aria-labelledby`, nearest `<fieldset>` legend.
pub fn resolve_label(doc: &Document, el: NodeId) -> Option<String> {
    label_for_id(doc, el)
        .or_else(|| enclosing_label(doc, el))
        .or_else(|| non_empty(doc.attr(el, "aria-label")))
        .or_else(|| labelled_by(doc, el))
        .or_else(|| fieldset_legend(doc, el))
}

fn non_empty(text: Option<&str>) -> Option<String> {
    text.map(collapse_whitespace).filter(|t| !t.is_empty())
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn label_for_id(doc: &Document, el: NodeId) -> Option<String> {
    let id = doc.attr(el, "id")?;
    doc.elements_with_attr("for", id)
        .into_iter()
        .filter(|l| doc.tag(*l) == "label")
        .find_map(|l| non_empty(Some(&text_without(doc, l, el))))
}

fn enclosing_label(doc: &Document, el: NodeId) -> Option<String> {
    let label = doc
        .ancestors(el)
        .into_iter()
        .find(|a| doc.tag(*a) == "label")?;
    non_empty(Some(&text_without(doc, label, el)))
}

fn labelled_by(doc: &Document, el: NodeId) -> Option<String> {
    let ids = doc.attr(el, "aria-labelledby")?;
    let text = ids
        .split_whitespace()
        .filter_map(|id| doc.elements_with_attr("id", id).into_iter().next())
        .map(|n| doc.text_content(n))
        .collect::<Vec<_>>()
        .join(" ");
    non_empty(Some(&text))
}

fn fieldset_legend(doc: &Document, el: NodeId) -> Option<String> {
    let fieldset = doc
        .ancestors(el)
        .into_iter()
        .find(|a| doc.tag(*a) == "fieldset")?;
    let legend = doc
        .children(fieldset)
        .iter()
        .find(|c| doc.tag(**c) == "legend")?;
    non_empty(Some(&doc.text_content(*legend)))
}

/// Text of `root`'s subtree, skipping the control itself and the contents of
/// other form controls (option lists, textarea bodies).
fn text_without(doc: &Document, root: NodeId, control: NodeId) -> String {
    let mut parts = vec![doc.own_text(root).trim().to_string()];
    let mut skipped: Vec<NodeId> = vec![];

    for node in doc.descendants(root) {
        let inside_skipped = doc.ancestors(node).iter().any(|a| skipped.contains(a));
        if node == control
            || inside_skipped
            || matches!(doc.tag(node), "select" | "textarea" | "input" | "option")
        {
            skipped.push(node);
            continue;
        }
        parts.push(doc.own_text(node).trim().to_string());
    }

    collapse_whitespace(&parts.join(" "))
}
