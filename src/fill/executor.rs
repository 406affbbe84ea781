use serde::Serialize;

use crate::detect::detector::candidate_elements;
use crate::dom::document::{Document, EventKind, NodeId};
use crate::mapping::mapping_model::Mapping;
use crate::selector::locator::MARKER_ATTR;

/// Result of applying a batch of mappings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    /// Elements located and written.
    pub filled: usize,
    /// Non-empty mappings whose element could not be found.
    pub skipped: usize,
    /// The mappings that were written, in application order.
    pub applied: Vec<Mapping>,
}

/// Locate a mapping's element.
///
/// A mapping without a locator takes its index into the live candidate list
/// recomputed now. A mapping whose locator no longer resolves only falls
/// back to that index when the candidate there carries no id, name or
/// marker: any of those would belong to a different locator, so the
/// original element is gone and the mapping is skipped.
pub fn resolve_target(doc: &Document, mapping: &Mapping) -> Option<NodeId> {
    let by_index = || {
        let index = mapping.index?;
        candidate_elements(doc).get(index).copied()
    };

    match &mapping.selector {
        None => by_index(),
        Some(selector) => selector
            .resolve(doc)
            .or_else(|| by_index().filter(|el| !carries_identity(doc, *el))),
    }
}

fn carries_identity(doc: &Document, el: NodeId) -> bool {
    ["id", "name", MARKER_ATTR]
        .iter()
        .any(|attr| doc.attr(el, attr).is_some_and(|v| !v.trim().is_empty()))
}

/// Set the value and fire `input` then `change`, the way a user edit would.
pub fn write_value(doc: &mut Document, el: NodeId, value: &str) -> bool {
    if !doc.set_value(el, value) {
        return false;
    }
    doc.dispatch(el, EventKind::Input);
    doc.dispatch(el, EventKind::Change);
    true
}

/// Apply one mapping. Empty mappings and missing elements are no-ops.
pub fn apply_mapping(doc: &mut Document, mapping: &Mapping) -> bool {
    if mapping.is_empty() {
        return false;
    }
    match resolve_target(doc, mapping) {
        Some(el) => write_value(doc, el, &mapping.value),
        None => false,
    }
}

/// Apply every mapping. Shared by "Fill form" and single-field apply.
pub fn apply_mappings(doc: &mut Document, mappings: &[Mapping]) -> FillReport {
    let mut report = FillReport::default();

    for mapping in mappings.iter().filter(|m| !m.is_empty()) {
        if apply_mapping(doc, mapping) {
            report.filled += 1;
            report.applied.push(mapping.clone());
        } else {
            tracing::debug!(
                selector = ?mapping.selector,
                index = ?mapping.index,
                "mapping target not found; skipped"
            );
            report.skipped += 1;
        }
    }

    report
}
