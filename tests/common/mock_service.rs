use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use form_pilot::mapping::mapping_model::{FieldSuggestion, Mapping};
use form_pilot::mapping::service::{
    MappingService, ServiceError, SuggestFieldRequest, SuggestMappingsRequest,
};

/// In-process stand-in for the remote mapping service with call counting.
///
/// `None` responses make the corresponding call fail with `Unavailable`.
#[derive(Clone, Default)]
pub struct MockMappingService {
    pub batch: Option<Vec<Mapping>>,
    pub field: Option<FieldSuggestion>,
    pub batch_calls: Arc<AtomicUsize>,
    pub field_calls: Arc<AtomicUsize>,
    pub last_field_request: Arc<Mutex<Option<SuggestFieldRequest>>>,
}

impl MockMappingService {
    pub fn failing() -> Self {
        Self::default()
    }

    pub fn returning(mappings: Vec<Mapping>) -> Self {
        Self {
            batch: Some(mappings),
            ..Self::default()
        }
    }

    pub fn suggesting(suggestion: FieldSuggestion) -> Self {
        Self {
            field: Some(suggestion),
            ..Self::default()
        }
    }

    pub fn batch_call_count(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn field_call_count(&self) -> usize {
        self.field_calls.load(Ordering::SeqCst)
    }
}

impl MappingService for MockMappingService {
    fn suggest_mappings(
        &self,
        _request: &SuggestMappingsRequest,
    ) -> Result<Vec<Mapping>, ServiceError> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.batch.clone().ok_or(ServiceError::Unavailable)
    }

    fn suggest_field(&self, request: &SuggestFieldRequest) -> Result<FieldSuggestion, ServiceError> {
        self.field_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_field_request.lock() {
            *last = Some(request.clone());
        }
        self.field.clone().ok_or(ServiceError::Unavailable)
    }
}
