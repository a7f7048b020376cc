//! Shared application state.

use std::sync::Arc;

use tally_db::{Connector, TaskStore};

/// State handed to every handler. Cloning shares the same store.
pub struct AppState<C: Connector> {
    pub store: Arc<TaskStore<C>>,
}

impl<C: Connector> AppState<C> {
    #[must_use]
    pub fn new(store: TaskStore<C>) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}

impl<C: Connector> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}
