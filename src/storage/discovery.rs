//! Locating contact databases on disk

use std::path::{Path, PathBuf};

use super::Storage;
use crate::error::Result;

/// File name of a contact-card database
pub const CONTACTS_DB_FILENAME: &str = "AddressBook-v22.abcddb";

/// Subdirectory holding one folder per synced account
const SOURCES_DIR: &str = "Sources";

/// Find every contact database under `root`.
///
/// The top-level database comes first, followed by each account under
/// `Sources/`, sorted by path. This order is the scan order, so it decides
/// which copy of a duplicated contact survives. A missing root yields an
/// empty list.
pub fn discover_contact_databases(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    let top_level = root.join(CONTACTS_DB_FILENAME);
    if top_level.is_file() {
        found.push(top_level);
    }

    let sources = root.join(SOURCES_DIR);
    if sources.is_dir() {
        let mut per_account = Vec::new();
        for entry in std::fs::read_dir(&sources)? {
            let candidate = entry?.path().join(CONTACTS_DB_FILENAME);
            if candidate.is_file() {
                per_account.push(candidate);
            }
        }
        per_account.sort();
        found.extend(per_account);
    }

    tracing::debug!(root = %root.display(), count = found.len(), "Discovered contact databases");
    Ok(found)
}

/// Build one unopened handle per contact database, labelled by position
pub fn contact_stores(paths: &[PathBuf]) -> Vec<Storage> {
    paths
        .iter()
        .enumerate()
        .map(|(i, path)| Storage::new(format!("contacts[{}]", i), path.clone()))
        .collect()
}
