//! Application state shared across request handlers.

use std::sync::Arc;

use bmset_admission::Validator;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    validator: Validator,
}

impl AppState {
    /// Create a new application state.
    pub fn new(validator: Validator) -> Self {
        Self {
            inner: Arc::new(AppStateInner { validator }),
        }
    }

    /// Get a reference to the admission validator.
    pub fn validator(&self) -> &Validator {
        &self.inner.validator
    }
}
