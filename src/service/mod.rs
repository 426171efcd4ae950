//! Service layer.
//!
//! Business rules for to-do items and accounts, independent of transport.
//! Handlers resolve the caller, call into a service and map the typed
//! result onto a response.
//!
//! # Architecture
//!
//! - `access`: who may view, update, delete or share an item
//! - `reconcile`: minimal insert/delete sets for tags and shares
//! - `items`: item CRUD, the version-checked update and sharing
//! - `users`: registration, sessions and user administration

mod access;
mod credentials;
mod error;
mod items;
pub mod messages;
mod reconcile;
mod users;

#[cfg(test)]
mod items_test;

pub use access::{Operation, authorize, can_access};
pub use error::{ServiceError, ServiceResult};
pub use items::{AvailableUser, CreateItem, ItemService, ListItems, UpdateItem};
pub use reconcile::{Reconciliation, reconcile, reconcile_shares, reconcile_tags};
pub use users::{RegisterUser, Session, UserService};
