use serde::Serialize;

use crate::detect::field_model::{Field, SemanticType};
use crate::dom::document::Document;
use crate::fill::executor::{apply_mapping, resolve_target};
use crate::mapping::mapping_model::{FieldSuggestion, Mapping};
use crate::selector::locator::Locator;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PanelState {
    /// Showing a value with apply / edit / deny.
    Offered,
    /// Suggestion text is editable; `draft` is the working copy.
    Editing { draft: String },
    /// Service had nothing; only dismiss is offered.
    Empty,
}

/// A suggestion shown next to its field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingSuggestion {
    pub id: u64,
    pub selector: Locator,
    pub index: usize,
    pub field_label: String,
    pub value: Option<String>,
    pub reasoning: String,
    pub state: PanelState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKey {
    Char(char),
    Backspace,
    Enter,
    Escape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionOutcome {
    Applied { value: String },
    Denied,
    Dismissed,
    /// Escape: draft discarded, original suggestion shown again.
    Reverted,
    /// Still open (edit started or draft changed).
    Open,
    /// Field gained a value since the suggestion appeared; nothing written.
    FieldHasValue,
    /// Element no longer on the page.
    TargetGone,
    NotFound,
}

/// What the field looked like when a suggestion was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Denial {
    selector: Locator,
    value: String,
    field_state: FieldState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldState {
    live_value: String,
    label: Option<String>,
    placeholder: Option<String>,
    semantic_type: Option<SemanticType>,
}

impl FieldState {
    fn of(doc: &Document, field: &Field) -> Self {
        let live_value = field
            .selector
            .resolve(doc)
            .map(|el| doc.value(el).to_string())
            .unwrap_or_default();
        Self {
            live_value,
            label: field.label.clone(),
            placeholder: field.placeholder.clone(),
            semantic_type: field.semantic_type,
        }
    }
}

/// Interactive accept / edit / deny suggestions for one page session.
#[derive(Debug, Default)]
pub struct InlineSuggestions {
    next_id: u64,
    pending: Vec<PendingSuggestion>,
    denials: Vec<Denial>,
    fields: Vec<(u64, Field)>,
}

impl InlineSuggestions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> &[PendingSuggestion] {
        &self.pending
    }

    pub fn get(&self, id: u64) -> Option<&PendingSuggestion> {
        self.pending.iter().find(|p| p.id == id)
    }

    /// Surface a suggestion next to `field`. Returns `None` when it must not
    /// be shown: the field is gone or already holds a value, or the same
    /// value was denied for this field and the field has not changed since.
    pub fn present(
        &mut self,
        doc: &Document,
        field: &Field,
        suggestion: &FieldSuggestion,
    ) -> Option<u64> {
        let el = field.selector.resolve(doc)?;
        if !doc.value(el).trim().is_empty() {
            return None;
        }

        let state_now = FieldState::of(doc, field);
        if let Some(value) = &suggestion.value {
            let denied_before = self.denials.iter().position(|d| {
                d.selector == field.selector && d.value == *value
            });
            if let Some(pos) = denied_before {
                if self.denials[pos].field_state == state_now {
                    return None;
                }
                self.denials.remove(pos);
            }
        }

        self.forget_selector(&field.selector);

        self.next_id += 1;
        let id = self.next_id;
        self.pending.push(PendingSuggestion {
            id,
            selector: field.selector.clone(),
            index: field.index,
            field_label: field.display_label(),
            value: suggestion.value.clone(),
            reasoning: suggestion.reasoning.clone(),
            state: match suggestion.value {
                Some(_) => PanelState::Offered,
                None => PanelState::Empty,
            },
        });
        self.fields.push((id, field.clone()));
        Some(id)
    }

    fn forget_selector(&mut self, selector: &Locator) {
        let stale: Vec<u64> = self
            .pending
            .iter()
            .filter(|p| &p.selector == selector)
            .map(|p| p.id)
            .collect();
        for id in stale {
            self.close(id);
        }
    }

    fn close(&mut self, id: u64) -> Option<(PendingSuggestion, Field)> {
        let pos = self.pending.iter().position(|p| p.id == id)?;
        let suggestion = self.pending.remove(pos);
        let field_pos = self.fields.iter().position(|(fid, _)| *fid == id)?;
        let (_, field) = self.fields.remove(field_pos);
        Some((suggestion, field))
    }

    /// Apply the suggestion (or the committed draft) through the fill path.
    pub fn accept(&mut self, doc: &mut Document, id: u64) -> SuggestionOutcome {
        let value = match self.get(id) {
            None => return SuggestionOutcome::NotFound,
            Some(p) => match &p.state {
                PanelState::Editing { draft } => Some(draft.clone()),
                PanelState::Offered => p.value.clone(),
                PanelState::Empty => None,
            },
        };
        let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
            return SuggestionOutcome::NotFound;
        };
        let Some((suggestion, field)) = self.close(id) else {
            return SuggestionOutcome::NotFound;
        };

        let mapping = Mapping {
            index: Some(suggestion.index),
            selector: Some(field.selector.clone()),
            value: value.clone(),
        };

        match resolve_target(doc, &mapping) {
            None => SuggestionOutcome::TargetGone,
            Some(el) if !doc.value(el).trim().is_empty() => SuggestionOutcome::FieldHasValue,
            Some(_) => {
                if apply_mapping(doc, &mapping) {
                    SuggestionOutcome::Applied { value }
                } else {
                    SuggestionOutcome::TargetGone
                }
            }
        }
    }

    /// Make the suggestion text editable.
    pub fn begin_edit(&mut self, id: u64) -> SuggestionOutcome {
        let Some(p) = self.pending.iter_mut().find(|p| p.id == id) else {
            return SuggestionOutcome::NotFound;
        };
        if let PanelState::Offered = p.state {
            p.state = PanelState::Editing {
                draft: p.value.clone().unwrap_or_default(),
            };
        }
        SuggestionOutcome::Open
    }

    /// Keyboard input while editing: Enter commits, Escape reverts.
    pub fn key(&mut self, doc: &mut Document, id: u64, key: EditKey) -> SuggestionOutcome {
        let Some(p) = self.pending.iter_mut().find(|p| p.id == id) else {
            return SuggestionOutcome::NotFound;
        };
        let PanelState::Editing { draft } = &mut p.state else {
            return SuggestionOutcome::Open;
        };

        match key {
            EditKey::Char(c) => {
                draft.push(c);
                SuggestionOutcome::Open
            }
            EditKey::Backspace => {
                draft.pop();
                SuggestionOutcome::Open
            }
            EditKey::Escape => {
                p.state = PanelState::Offered;
                SuggestionOutcome::Reverted
            }
            EditKey::Enter => self.accept(doc, id),
        }
    }

    /// Discard without writing and remember the denial.
    pub fn deny(&mut self, doc: &Document, id: u64) -> SuggestionOutcome {
        let Some((suggestion, field)) = self.close(id) else {
            return SuggestionOutcome::NotFound;
        };
        if let Some(value) = suggestion.value {
            self.denials.push(Denial {
                selector: field.selector.clone(),
                value,
                field_state: FieldState::of(doc, &field),
            });
        }
        SuggestionOutcome::Denied
    }

    /// Close an empty-state panel (or any panel) without recording a denial.
    pub fn dismiss(&mut self, id: u64) -> SuggestionOutcome {
        match self.close(id) {
            Some(_) => SuggestionOutcome::Dismissed,
            None => SuggestionOutcome::NotFound,
        }
    }
}
