//! Store locations and resolver tuning shared by the binaries
//!
//! Values arrive already parsed (the binaries read flags and environment);
//! this module only expands paths and turns them into store handles.

use std::path::{Path, PathBuf};

use crate::contacts::ResolverConfig;
use crate::error::Result;
use crate::storage::{contact_stores, discover_contact_databases, Storage};

/// Default location of the messaging archive
pub const DEFAULT_MESSAGES_DB: &str = "~/Library/Messages/chat.db";

/// Default root searched for contact databases
pub const DEFAULT_CONTACTS_DIR: &str = "~/Library/Application Support/AddressBook";

/// Where the stores live and how contacts are resolved
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub messages_db: PathBuf,
    pub contacts_dir: PathBuf,
    /// Explicit contact databases; when non-empty, discovery is skipped
    pub contacts_dbs: Vec<PathBuf>,
    pub resolver: ResolverConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            messages_db: expand_path(DEFAULT_MESSAGES_DB),
            contacts_dir: expand_path(DEFAULT_CONTACTS_DIR),
            contacts_dbs: Vec::new(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Handle on the messaging archive (not yet opened)
    pub fn messages_store(&self) -> Storage {
        Storage::new("messages", self.messages_db.clone())
    }

    /// Contact database paths in scan order
    pub fn contact_paths(&self) -> Result<Vec<PathBuf>> {
        if !self.contacts_dbs.is_empty() {
            return Ok(self.contacts_dbs.clone());
        }
        discover_contact_databases(&self.contacts_dir)
    }

    /// One unopened handle per contact database, in scan order
    pub fn contact_stores(&self) -> Result<Vec<Storage>> {
        let paths = self.contact_paths()?;
        if paths.is_empty() {
            tracing::warn!(
                dir = %self.contacts_dir.display(),
                "No contact databases found; contact tools will return empty results"
            );
        }
        Ok(contact_stores(&paths))
    }
}

/// Expand a leading `~` (and `$VARS`) in a user-supplied path
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw).as_ref()),
    }
}

/// Close every handle, logging rather than returning failures
pub fn close_all<'a>(stores: impl IntoIterator<Item = &'a Storage>) {
    for store in stores {
        if let Err(e) = store.close() {
            tracing::warn!(store = store.label(), error = %e, "Failed to close store");
        }
    }
}

/// Hint printed when a store cannot be read at startup
pub fn permission_hint(path: &Path) -> String {
    format!(
        "cannot read {}; grant Full Disk Access to the host application or pass an explicit path",
        path.display()
    )
}
