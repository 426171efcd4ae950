//! SQLite implementation of the database traits.
//!
//! This module provides a SQLx-backed implementation of the repository
//! traits defined in the parent module.

mod connection;
mod helpers;
mod item;
mod session;
mod user;


pub use connection::SqliteDatabase;
pub use item::SqliteItemRepository;
pub use session::SqliteSessionRepository;
pub use user::SqliteUserRepository;
