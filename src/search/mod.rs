//! Message search and listing over the messaging archive
//!
//! Every paginated call runs its count query and its page query inside one
//! read snapshot, so `total` always describes the same rows the page was
//! cut from.

use std::time::Instant;

use crate::error::Result;
use crate::pagination::{PageRequest, PaginatedResult};
use crate::storage::filter::{Condition, Predicate};
use crate::storage::queries::{self, MessageSource};
use crate::storage::Storage;
use crate::time::datetime_to_archive;
use crate::types::{Chat, Handle, Message, MessageFilters};

/// Build the predicate for a set of message filters.
///
/// Blank text and handle filters are treated as absent.
pub fn message_predicate(filters: &MessageFilters) -> Predicate {
    let present = |s: &Option<String>| s.as_deref().filter(|v| !v.trim().is_empty()).map(str::to_string);

    Predicate::new()
        .and_some(present(&filters.text).map(|t| Condition::contains("m.text", t)))
        .and_some(present(&filters.handle).map(|h| Condition::equals("h.id", h)))
        .and_some(
            filters
                .start_time
                .map(|t| Condition::at_least("m.date", datetime_to_archive(t))),
        )
        .and_some(
            filters
                .end_time
                .map(|t| Condition::at_most("m.date", datetime_to_archive(t))),
        )
}

/// Search engine bound to one messaging-archive handle
pub struct SearchEngine<'a> {
    store: &'a Storage,
}

impl<'a> SearchEngine<'a> {
    pub fn new(store: &'a Storage) -> Self {
        Self { store }
    }

    /// Search messages, newest first
    pub fn search(
        &self,
        filters: &MessageFilters,
        page: PageRequest,
    ) -> Result<PaginatedResult<Message>> {
        self.paginate_messages(MessageSource::Archive, &message_predicate(filters), page)
    }

    /// Most recent messages across all conversations
    pub fn recent(&self, page: PageRequest) -> Result<PaginatedResult<Message>> {
        self.search(&MessageFilters::default(), page)
    }

    /// Messages belonging to one conversation, newest first
    pub fn conversation_messages(
        &self,
        chat_guid: &str,
        page: PageRequest,
    ) -> Result<PaginatedResult<Message>> {
        let predicate = Predicate::new().and(Condition::equals("c.guid", chat_guid.to_string()));
        self.paginate_messages(MessageSource::Conversation, &predicate, page)
    }

    /// Conversations, most recently read first
    pub fn list_chats(&self, page: PageRequest) -> Result<PaginatedResult<Chat>> {
        self.store.with_snapshot(|conn| {
            let total = queries::count_chats(conn)?;
            let chats = queries::list_chats(conn, page)?;
            Ok(PaginatedResult::new(chats, total, page))
        })
    }

    /// Every known handle in row order
    pub fn list_handles(&self, page: PageRequest) -> Result<PaginatedResult<Handle>> {
        self.store.with_snapshot(|conn| {
            let total = queries::count_handles(conn)?;
            let handles = queries::list_handles(conn, page)?;
            Ok(PaginatedResult::new(handles, total, page))
        })
    }

    fn paginate_messages(
        &self,
        source: MessageSource,
        predicate: &Predicate,
        page: PageRequest,
    ) -> Result<PaginatedResult<Message>> {
        let start = Instant::now();
        let result = self.store.with_snapshot(|conn| {
            let total = queries::count_messages(conn, source, predicate)?;
            let messages = queries::query_messages(conn, source, predicate, page)?;
            Ok(PaginatedResult::new(messages, total, page))
        })?;

        tracing::debug!(
            ?source,
            conditions = predicate.condition_count(),
            total = result.pagination.total,
            returned = result.data.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Message query complete"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::time::ARCHIVE_EPOCH_OFFSET;
    use chrono::{TimeZone, Utc};

    /// Archive timestamp for a Unix second
    fn at(unix: i64) -> i64 {
        (unix - ARCHIVE_EPOCH_OFFSET) * 1_000_000_000
    }

    fn seeded_store() -> Storage {
        let storage = messages_store().unwrap();
        storage
            .with_connection(|conn| {
                let alice = insert_handle(conn, "+15551234567")?;
                let bob = insert_handle(conn, "bob@example.com")?;
                let chat = insert_chat(conn, "iMessage;-;+15551234567", at(1_700_000_500))?;
                insert_chat(conn, "iMessage;-;bob@example.com", at(1_700_000_900))?;

                let rows = [
                    ("m1", "lunch at noon?", alice, 1_700_000_000),
                    ("m2", "sure, LUNCH works", bob, 1_700_000_100),
                    ("m3", "running late", alice, 1_700_000_200),
                    ("m4", "100% done", 0, 1_700_000_300),
                ];
                for (guid, text, handle_id, unix) in rows {
                    let id = insert_message(
                        conn,
                        &TestMessage {
                            guid: guid.to_string(),
                            text: Some(text.to_string()),
                            handle_id,
                            date: at(unix),
                            ..Default::default()
                        },
                    )?;
                    if handle_id == alice {
                        link_message(conn, chat, id)?;
                    }
                }
                Ok(())
            })
            .unwrap();
        storage
    }

    fn guids(result: &PaginatedResult<Message>) -> Vec<&str> {
        result.data.iter().map(|m| m.guid.as_str()).collect()
    }

    #[test]
    fn test_predicate_composition() {
        let filters = MessageFilters {
            text: Some("hi".into()),
            handle: Some("  ".into()),
            start_time: Some(Utc.timestamp_opt(ARCHIVE_EPOCH_OFFSET + 1, 0).unwrap()),
            end_time: None,
        };
        let (sql, params) = message_predicate(&filters).to_sql();
        assert_eq!(sql, r"WHERE 1=1 AND m.text LIKE ? ESCAPE '\' AND m.date >= ?");
        assert_eq!(params[1], rusqlite::types::Value::Integer(1_000_000_000));
    }

    #[test]
    fn test_recent_orders_newest_first() {
        let storage = seeded_store();
        let result = SearchEngine::new(&storage)
            .recent(PageRequest::new(10, 0))
            .unwrap();
        assert_eq!(guids(&result), vec!["m4", "m3", "m2", "m1"]);
        assert_eq!(result.pagination.total, 4);
        assert!(!result.pagination.has_more);
    }

    #[test]
    fn test_text_filter_is_case_insensitive_substring() {
        let storage = seeded_store();
        let filters = MessageFilters {
            text: Some("lunch".into()),
            ..Default::default()
        };
        let result = SearchEngine::new(&storage)
            .search(&filters, PageRequest::default())
            .unwrap();
        assert_eq!(guids(&result), vec!["m2", "m1"]);
    }

    #[test]
    fn test_percent_in_text_filter_is_literal() {
        let storage = seeded_store();
        let filters = MessageFilters {
            text: Some("0%".into()),
            ..Default::default()
        };
        let result = SearchEngine::new(&storage)
            .search(&filters, PageRequest::default())
            .unwrap();
        assert_eq!(guids(&result), vec!["m4"]);
    }

    #[test]
    fn test_handle_and_date_filters() {
        let storage = seeded_store();
        let engine = SearchEngine::new(&storage);

        let by_handle = engine
            .search(
                &MessageFilters {
                    handle: Some("+15551234567".into()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(guids(&by_handle), vec!["m3", "m1"]);
        assert_eq!(by_handle.data[0].sender.as_deref(), Some("+15551234567"));

        let window = engine
            .search(
                &MessageFilters {
                    start_time: Some(Utc.timestamp_opt(1_700_000_100, 0).unwrap()),
                    end_time: Some(Utc.timestamp_opt(1_700_000_200, 0).unwrap()),
                    ..Default::default()
                },
                PageRequest::default(),
            )
            .unwrap();
        assert_eq!(guids(&window), vec!["m3", "m2"]);
        assert_eq!(
            window.data[0].date,
            Some(Utc.timestamp_opt(1_700_000_200, 0).unwrap())
        );
    }

    #[test]
    fn test_pagination_window() {
        let storage = seeded_store();
        let result = SearchEngine::new(&storage)
            .recent(PageRequest::new(3, 3))
            .unwrap();
        assert_eq!(guids(&result), vec!["m1"]);
        assert_eq!(result.pagination.page, 2);
        assert_eq!(result.pagination.total_pages, 2);
    }

    #[test]
    fn test_conversation_messages() {
        let storage = seeded_store();
        let engine = SearchEngine::new(&storage);
        let result = engine
            .conversation_messages("iMessage;-;+15551234567", PageRequest::default())
            .unwrap();
        assert_eq!(guids(&result), vec!["m3", "m1"]);
        assert_eq!(result.pagination.total, 2);

        let unknown = engine
            .conversation_messages("no-such-chat", PageRequest::default())
            .unwrap();
        assert!(unknown.data.is_empty());
        assert_eq!(unknown.pagination.total_pages, 0);
    }

    #[test]
    fn test_list_chats_and_handles() {
        let storage = seeded_store();
        let engine = SearchEngine::new(&storage);

        let chats = engine.list_chats(PageRequest::default()).unwrap();
        assert_eq!(chats.pagination.total, 2);
        assert_eq!(chats.data[0].guid, "iMessage;-;bob@example.com");

        let handles = engine.list_handles(PageRequest::new(1, 0)).unwrap();
        assert_eq!(handles.data.len(), 1);
        assert_eq!(handles.data[0].id, "+15551234567");
        assert!(handles.pagination.has_more);
    }

    #[test]
    fn test_missing_store_propagates() {
        let storage = Storage::new("messages", "/no/such/chat.db");
        let err = SearchEngine::new(&storage)
            .recent(PageRequest::default())
            .unwrap_err();
        assert!(err.is_unavailable());
    }
}
