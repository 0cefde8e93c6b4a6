//! Core types for imsg
//!
//! Everything here is a read-only projection built per call from store rows.
//! Output types serialize with camelCase keys; input types accept both the
//! snake_case tool-argument names and their camelCase spellings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pagination::PaginationMetadata;

/// Row identity inside a SQLite store
pub type RowId = i64;

/// Display name used when a contact has no name or organization
pub const UNKNOWN_CONTACT_NAME: &str = "Unknown";

/// A message from the messaging archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub guid: String,
    /// Plain text, or text recovered from the rich-text blob when the
    /// stored text is absent
    pub text: Option<String>,
    /// Numeric reference into the handle table (0 for messages sent by the owner
    /// in one-to-one chats and for system messages)
    pub handle_id: RowId,
    /// External id of the sender handle, when the join found one
    pub sender: Option<String>,
    pub service: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub date_read: Option<DateTime<Utc>>,
    pub date_delivered: Option<DateTime<Utc>>,
    pub is_from_me: i64,
    pub is_read: i64,
    pub is_sent: i64,
    pub is_delivered: i64,
    pub has_attachments: i64,
    pub reply_to_guid: Option<String>,
}

/// A messaging endpoint as known to the messaging archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handle {
    pub rowid: RowId,
    /// Normalized-at-rest phone number or email address
    pub id: String,
    pub country: Option<String>,
    pub service: String,
    pub uncanonicalized_id: Option<String>,
}

/// A conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    pub rowid: RowId,
    pub guid: String,
    pub style: i64,
    pub state: i64,
    pub account_id: Option<String>,
    pub chat_identifier: Option<String>,
    pub service_name: Option<String>,
    pub room_name: Option<String>,
    pub display_name: Option<String>,
    pub last_read_message_timestamp: Option<DateTime<Utc>>,
}

/// A contact card as read from one contact store, before flattening
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContactRecord {
    pub rowid: RowId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub display_name: String,
    /// Phone numbers in the store's display order, not yet normalized
    pub phones: Vec<String>,
    /// Email addresses in the store's display order
    pub emails: Vec<String>,
}

/// Key under which contact records from different stores are merged
pub type DedupKey = (Option<String>, Option<String>, Option<String>);

impl ContactRecord {
    /// Build a record; blank name fields are stored as `None`
    pub fn new(
        rowid: RowId,
        first_name: Option<String>,
        last_name: Option<String>,
        organization: Option<String>,
    ) -> Self {
        let first_name = non_blank(first_name);
        let last_name = non_blank(last_name);
        let organization = non_blank(organization);
        let display_name = display_name_for(
            first_name.as_deref(),
            last_name.as_deref(),
            organization.as_deref(),
        );
        Self {
            rowid,
            first_name,
            last_name,
            organization,
            display_name,
            phones: Vec::new(),
            emails: Vec::new(),
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        (
            self.first_name.clone(),
            self.last_name.clone(),
            self.organization.clone(),
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Derive a display name: first+last, first, last, organization, then "Unknown".
pub fn display_name_for(
    first_name: Option<&str>,
    last_name: Option<&str>,
    organization: Option<&str>,
) -> String {
    fn present(s: Option<&str>) -> Option<&str> {
        s.map(str::trim).filter(|s| !s.is_empty())
    }

    match (present(first_name), present(last_name), present(organization)) {
        (Some(first), Some(last), _) => format!("{} {}", first, last),
        (Some(first), None, _) => first.to_string(),
        (None, Some(last), _) => last.to_string(),
        (None, None, Some(org)) => org.to_string(),
        (None, None, None) => UNKNOWN_CONTACT_NAME.to_string(),
    }
}

/// Which kind of handle a contact candidate is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Phone,
    Email,
}

/// One candidate handle belonging to a contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub handle: String,
    pub handle_type: HandleKind,
}

/// Result of a reverse lookup from handle to contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactLookup {
    pub found: bool,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub handle: Option<String>,
    pub handle_type: Option<HandleKind>,
    pub pagination: PaginationMetadata,
}

impl ContactLookup {
    /// Sentinel returned when no contact store knows the handle
    pub fn not_found() -> Self {
        Self {
            found: false,
            name: None,
            first_name: None,
            last_name: None,
            organization: None,
            handle: None,
            handle_type: None,
            pagination: PaginationMetadata::new(0, 1, 0),
        }
    }

    pub fn found(info: ContactInfo) -> Self {
        Self {
            found: true,
            name: Some(info.name),
            first_name: info.first_name,
            last_name: info.last_name,
            organization: info.organization,
            handle: Some(info.handle),
            handle_type: Some(info.handle_type),
            pagination: PaginationMetadata::new(1, 1, 0),
        }
    }
}

/// Optional filters for message search; absent fields do not constrain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageFilters {
    /// Substring of the message text
    #[serde(default)]
    pub text: Option<String>,
    /// Exact external id of the sender handle
    #[serde(default)]
    pub handle: Option<String>,
    #[serde(default, alias = "startTime")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, alias = "endTime")]
    pub end_time: Option<DateTime<Utc>>,
}

/// Name query for contact search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactQuery {
    #[serde(default, alias = "firstName")]
    pub first_name: String,
    #[serde(default, alias = "lastName")]
    pub last_name: Option<String>,
}

impl ContactQuery {
    pub fn new(first_name: impl Into<String>, last_name: Option<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_order() {
        assert_eq!(
            display_name_for(Some("Ada"), Some("Lovelace"), Some("Analytical")),
            "Ada Lovelace"
        );
        assert_eq!(display_name_for(Some("Ada"), None, Some("Org")), "Ada");
        assert_eq!(display_name_for(None, Some("Lovelace"), Some("Org")), "Lovelace");
        assert_eq!(display_name_for(None, None, Some("Org")), "Org");
        assert_eq!(display_name_for(None, None, None), "Unknown");
        assert_eq!(display_name_for(Some("  "), Some(""), None), "Unknown");
    }

    #[test]
    fn test_contact_record_dedup_key() {
        let a = ContactRecord::new(1, Some("Ada".into()), None, Some("Org".into()));
        let b = ContactRecord::new(99, Some("Ada".into()), None, Some("Org".into()));
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_eq!(a.display_name, "Ada");
    }

    #[test]
    fn test_blank_fields_share_dedup_key() {
        let blank = ContactRecord::new(1, Some("Ada".into()), Some(String::new()), Some("  ".into()));
        let absent = ContactRecord::new(2, Some("Ada".into()), None, None);
        assert_eq!(blank.dedup_key(), absent.dedup_key());
        assert_eq!(blank.last_name, None);
        assert_eq!(blank.organization, None);
        assert_eq!(blank.display_name, "Ada");
    }

    #[test]
    fn test_not_found_sentinel_serializes_nulls() {
        let json = serde_json::to_value(ContactLookup::not_found()).unwrap();
        assert_eq!(json["found"], false);
        assert!(json["name"].is_null());
        assert!(json["handle"].is_null());
        assert_eq!(json["pagination"]["total"], 0);
        assert_eq!(json["pagination"]["totalPages"], 0);
    }

    #[test]
    fn test_filters_accept_camel_case() {
        let filters: MessageFilters = serde_json::from_value(serde_json::json!({
            "text": "hi",
            "startTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(filters.text.as_deref(), Some("hi"));
        assert!(filters.start_time.is_some());
        assert_eq!(filters.handle, None);
    }
}
