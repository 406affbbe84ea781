use std::collections::{HashMap, HashSet};

use crate::detect::field_model::Field;
use crate::detect::labels::{collapse_whitespace, resolve_label};
use crate::detect::rules::{build_haystack, classify_text, matching_types};
use crate::dom::document::{Document, NodeId};
use crate::selector::builder::build_locator;
use crate::selector::locator::Locator;

/// Input types that carry free-form values the engine can fill.
const FILLABLE_INPUT_TYPES: &[&str] = &["text", "email", "tel", "url", "number", "search"];

/// De-duplication key: two sightings with the same key are the same field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    pub tag: String,
    pub name: String,
    pub input_type: String,
    pub position: usize,
}

/// Structural kind reported in `Field::input_type`.
pub fn input_kind(doc: &Document, el: NodeId) -> String {
    match doc.tag(el) {
        "textarea" => "textarea".into(),
        "select" => "select".into(),
        _ => doc
            .attr(el, "type")
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "text".into()),
    }
}

fn is_candidate(doc: &Document, el: NodeId) -> bool {
    let fillable = match doc.tag(el) {
        "textarea" | "select" => true,
        "input" => FILLABLE_INPUT_TYPES.contains(&input_kind(doc, el).as_str()),
        _ => false,
    };

    fillable
        && doc.attr(el, "disabled").is_none()
        && doc.attr(el, "readonly").is_none()
        && !doc.is_hidden(el)
}

/// Live candidate list in document order, de-duplicated.
///
/// Controls inside `<form>` elements are collected first, then a
/// document-wide sweep picks up loose controls; the key
/// `(tag, name, inputType, position)` keeps the overlap from registering
/// twice. This list is also the index fallback at fill time.
pub fn candidate_elements(doc: &Document) -> Vec<NodeId> {
    let all = doc.elements();
    let position: HashMap<NodeId, usize> = all.iter().enumerate().map(|(i, n)| (*n, i)).collect();

    let in_forms = all
        .iter()
        .filter(|n| doc.tag(**n) == "form")
        .flat_map(|form| doc.descendants(*form));
    let sweep = all.iter().copied();

    let mut seen: HashSet<FieldKey> = HashSet::new();
    let mut out: Vec<(usize, NodeId)> = vec![];

    for el in in_forms.chain(sweep) {
        if !is_candidate(doc, el) {
            continue;
        }
        let Some(pos) = position.get(&el).copied() else {
            continue;
        };
        let key = field_key(doc, el, pos);
        if seen.insert(key) {
            out.push((pos, el));
        }
    }

    out.sort_by_key(|(pos, _)| *pos);
    out.into_iter().map(|(_, el)| el).collect()
}

fn field_key(doc: &Document, el: NodeId, position: usize) -> FieldKey {
    FieldKey {
        tag: doc.tag(el).to_string(),
        name: doc.attr(el, "name").unwrap_or("").to_string(),
        input_type: input_kind(doc, el),
        position,
    }
}

/// Registry of fields seen by earlier scans of the same page.
///
/// Rescanning an unchanged DOM returns the same fields with the same
/// locators; a locator is only rebuilt when it no longer resolves to the
/// element it was created for.
#[derive(Debug, Default)]
pub struct DetectionSession {
    registry: HashMap<NodeId, Locator>,
}

impl DetectionSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan the document and return every candidate field. Never fails; an
    /// empty page yields an empty list.
    pub fn scan(&mut self, doc: &mut Document) -> Vec<Field> {
        let candidates = candidate_elements(doc);
        let mut registry = HashMap::new();

        let fields: Vec<Field> = candidates
            .iter()
            .enumerate()
            .map(|(index, el)| {
                let selector = match self.registry.get(el) {
                    Some(existing) if existing.resolve(doc) == Some(*el) => existing.clone(),
                    _ => build_locator(doc, *el, index),
                };
                registry.insert(*el, selector.clone());
                describe_field(doc, *el, index, selector)
            })
            .collect();

        tracing::debug!(fields = fields.len(), "detection pass complete");
        self.registry = registry;
        fields
    }

    /// Forget every registered field (navigation to a new page).
    pub fn reset(&mut self) {
        self.registry.clear();
    }
}

/// One-shot detection with a fresh session.
pub fn detect_fields(doc: &mut Document) -> Vec<Field> {
    DetectionSession::new().scan(doc)
}

/// Build the `Field` record for one element.
pub fn describe_field(doc: &Document, el: NodeId, index: usize, selector: Locator) -> Field {
    let text_attr = |name: &str| {
        doc.attr(el, name)
            .map(collapse_whitespace)
            .filter(|v| !v.is_empty())
    };

    let label = resolve_label(doc, el);
    let placeholder = text_attr("placeholder");
    let name = text_attr("name");
    let aria_label = text_attr("aria-label");

    let haystack = build_haystack(&[
        label.as_deref(),
        placeholder.as_deref(),
        name.as_deref(),
        aria_label.as_deref(),
    ]);
    let is_textarea = doc.tag(el) == "textarea";
    let semantic_type = classify_text(&haystack, is_textarea);
    if tracing::enabled!(tracing::Level::DEBUG) {
        let candidates = matching_types(&haystack, is_textarea);
        if candidates.len() > 1 {
            tracing::debug!(index, ?candidates, chosen = ?semantic_type, "ambiguous field text");
        }
    }

    Field {
        index,
        selector,
        tag: doc.tag(el).to_string(),
        input_type: input_kind(doc, el),
        name,
        label,
        placeholder,
        semantic_type,
        current_value: doc.value(el).to_string(),
    }
}

/// Re-read a field's live value (validation time).
pub fn refresh_value(doc: &Document, field: &Field) -> Option<String> {
    field
        .selector
        .resolve(doc)
        .map(|el| doc.value(el).to_string())
}
