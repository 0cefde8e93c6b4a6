//! Storage layer for imsg
//!
//! Read-only SQLite handles, the WHERE-clause builder, messaging-archive
//! queries, and location of contact databases on disk.

mod connection;
pub mod discovery;
pub mod filter;
pub mod queries;

pub use connection::{Storage, NORMALIZE_PHONE_FN};
pub use discovery::{contact_stores, discover_contact_databases, CONTACTS_DB_FILENAME};
