//! Shared application state for all routes.

use crate::store::ApartmentStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ApartmentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn ApartmentStore>) -> Self {
        AppState { store }
    }
}
