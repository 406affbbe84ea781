use std::time::Duration;

use crate::detect::field_model::Field;
use crate::error::Result;
use crate::mapping::cache::{Fingerprint, SuggestionCache, context_hash, profile_hash};
use crate::mapping::heuristics::heuristic_mappings;
use crate::mapping::mapping_model::{
    BatchResolution, FieldSuggestion, Mapping, Profile, ResolutionSource,
};
use crate::mapping::service::{MappingService, SuggestFieldRequest, SuggestMappingsRequest};
use crate::store::local_store::LocalStore;

/// Nearby fields sent as context with an on-demand request.
pub const MAX_NEARBY_FIELDS: usize = 8;

/// Turns detected fields into value assignments for one page session.
///
/// Owns the suggestion cache. Construct one per page load and drop it (or
/// call `teardown`) on navigation.
pub struct MappingResolver {
    service: Box<dyn MappingService>,
    store: LocalStore,
    cache: SuggestionCache,
    last_seen: Option<(String, String)>,
}

impl MappingResolver {
    pub fn new(service: Box<dyn MappingService>, store: LocalStore, ttl: Duration) -> Self {
        Self {
            service,
            store,
            cache: SuggestionCache::new(ttl),
            last_seen: None,
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn cache(&self) -> &SuggestionCache {
        &self.cache
    }

    /// Explicit user save: persist and drop every cached suggestion.
    pub fn save_profile(&mut self, profile: &Profile) -> Result<()> {
        self.store.save_profile(profile)?;
        self.cache.clear();
        self.last_seen = None;
        Ok(())
    }

    pub fn save_context(&mut self, context: &str) -> Result<()> {
        self.store.save_context(context)?;
        self.cache.clear();
        self.last_seen = None;
        Ok(())
    }

    /// Navigation boundary.
    pub fn teardown(&mut self) {
        self.cache.clear();
        self.last_seen = None;
    }

    /// Read Profile and Context, dropping the cache if either changed since
    /// the previous resolution (a write this session did not make).
    fn load_inputs(&mut self) -> (Profile, String) {
        let profile = self.store.load_profile();
        let context = self.store.load_context();
        let hashes = (profile_hash(&profile), context_hash(&context));

        if let Some(previous) = &self.last_seen {
            if *previous != hashes {
                tracing::info!("profile or context changed; dropping suggestion cache");
                self.cache.clear();
            }
        }
        self.last_seen = Some(hashes);

        (profile, context)
    }

    /// Batch mode: cache, then remote, then local heuristics.
    pub fn resolve_batch(&mut self, fields: &[Field]) -> BatchResolution {
        let (profile, context) = self.load_inputs();
        let fingerprint = Fingerprint::compute(fields, &profile, &context);

        if let Some(mappings) = self.cache.get(&fingerprint) {
            tracing::debug!(mappings = mappings.len(), "serving cached mappings");
            return BatchResolution {
                mappings,
                source: ResolutionSource::Cache,
            };
        }

        let request = SuggestMappingsRequest {
            fields: fields.to_vec(),
            profile: profile.non_empty(),
            context: context.trim().to_string(),
        };

        let remote = match self.service.suggest_mappings(&request) {
            Ok(raw) => bind_to_fields(raw, fields),
            Err(e) => {
                tracing::warn!(error = %e, "mapping service failed; using local heuristics");
                vec![]
            }
        };

        let resolution = if remote.is_empty() {
            BatchResolution {
                mappings: heuristic_mappings(fields, &profile),
                source: ResolutionSource::Heuristic,
            }
        } else {
            BatchResolution {
                mappings: remote,
                source: ResolutionSource::Remote,
            }
        };

        self.cache.put(&fingerprint, resolution.mappings.clone());
        resolution
    }

    /// On-demand mode: one field, no cache, no heuristic fallback.
    pub fn suggest_for_field(&mut self, target: &Field, fields: &[Field]) -> FieldSuggestion {
        if target.has_value() {
            return FieldSuggestion::none("Field already has a value.");
        }

        let (profile, context) = self.load_inputs();
        let request = SuggestFieldRequest {
            field: target.clone(),
            nearby_fields: nearby_fields(target, fields),
            profile: profile.non_empty(),
            context: context.trim().to_string(),
        };

        match self.service.suggest_field(&request) {
            Ok(suggestion) => {
                let value = suggestion
                    .value
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                let reasoning = if suggestion.reasoning.is_empty() {
                    match value {
                        Some(_) => "Suggested from your profile and context.".to_string(),
                        None => "No suggestion available for this field.".to_string(),
                    }
                } else {
                    suggestion.reasoning
                };
                FieldSuggestion { value, reasoning }
            }
            Err(e) => {
                tracing::warn!(error = %e, field = target.index, "field suggestion failed");
                FieldSuggestion::none(format!("Suggestion service unavailable: {}", e))
            }
        }
    }
}

/// Up to `MAX_NEARBY_FIELDS` other fields, closest by index first.
pub fn nearby_fields(target: &Field, fields: &[Field]) -> Vec<Field> {
    let mut others: Vec<&Field> = fields
        .iter()
        .filter(|f| f.selector != target.selector)
        .collect();
    others.sort_by_key(|f| (f.index.abs_diff(target.index), f.index));
    others
        .into_iter()
        .take(MAX_NEARBY_FIELDS)
        .cloned()
        .collect()
}

/// Keep non-empty remote mappings that point at a requested field, filling
/// in the selector for index-only entries.
fn bind_to_fields(raw: Vec<Mapping>, fields: &[Field]) -> Vec<Mapping> {
    raw.into_iter()
        .filter(|m| !m.is_empty())
        .filter_map(|m| {
            let by_selector = m
                .selector
                .as_ref()
                .and_then(|s| fields.iter().find(|f| &f.selector == s));
            let by_index = m.index.and_then(|i| fields.iter().find(|f| f.index == i));

            match by_selector.or(by_index) {
                Some(field) => Some(Mapping {
                    index: Some(field.index),
                    selector: Some(field.selector.clone()),
                    value: m.value.trim().to_string(),
                }),
                None => {
                    tracing::debug!(?m, "dropping mapping for unknown field");
                    None
                }
            }
        })
        .collect()
}
