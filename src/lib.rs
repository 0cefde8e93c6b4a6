//! imsg - read-only access to a local messaging archive and contact cards
//!
//! Paginated message search with rich-text recovery, plus contact
//! resolution across several contact databases, served over MCP.

pub mod config;
pub mod contacts;
pub mod error;
pub mod mcp;
pub mod pagination;
pub mod richtext;
pub mod search;
pub mod storage;
#[doc(hidden)]
pub mod test_support;
pub mod time;
pub mod types;

pub use config::StoreConfig;
pub use contacts::{ContactResolver, ResolverConfig};
pub use error::{ImsgError, Result};
pub use pagination::{PageRequest, PaginatedResult, PaginationMetadata};
pub use search::SearchEngine;
pub use storage::Storage;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
