//! Application state for the API server.

use std::sync::Arc;

use crate::db::Database;
use crate::service::{ItemService, UserService};

/// Shared application state.
///
/// Generic over `D: Database` so tests can run the router against an
/// in-memory store. Both services share one database handle.
pub struct AppState<D: Database> {
    items: ItemService<D>,
    users: UserService<D>,
}

// Manual Clone impl - only the Arcs are cloned, D itself need not be Clone
impl<D: Database> Clone for AppState<D> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
            users: self.users.clone(),
        }
    }
}

impl<D: Database> AppState<D> {
    pub fn new(db: D) -> Self {
        let db = Arc::new(db);
        Self {
            items: ItemService::new(Arc::clone(&db)),
            users: UserService::new(db),
        }
    }

    pub fn items(&self) -> &ItemService<D> {
        &self.items
    }

    pub fn users(&self) -> &UserService<D> {
        &self.users
    }
}
