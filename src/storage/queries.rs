//! Database queries against the messaging archive
//!
//! Each query has a fixed column list and a matching row struct, so column
//! names and types are checked once at the boundary.

use rusqlite::{params_from_iter, Connection, Row};

use super::filter::Predicate;
use crate::error::Result;
use crate::pagination::PageRequest;
use crate::richtext::extract_text;
use crate::time::archive_to_datetime;
use crate::types::*;

const MESSAGE_COLUMNS: &str = "m.ROWID AS rowid, m.guid, m.text, m.attributedBody AS attributed_body,
        m.handle_id, h.id AS sender, m.service, m.date, m.date_read, m.date_delivered,
        m.is_from_me, m.is_read, m.is_sent, m.is_delivered,
        m.cache_has_attachments, m.reply_to_guid";

/// Which message population a query runs over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSource {
    /// Every message, sender handle left-joined so handle-less rows stay in
    Archive,
    /// Messages reachable through conversation membership; the chat is
    /// available as `c` for filtering
    Conversation,
}

impl MessageSource {
    fn from_clause(self) -> &'static str {
        match self {
            MessageSource::Archive => {
                "FROM message m
                 LEFT JOIN handle h ON h.ROWID = m.handle_id"
            }
            MessageSource::Conversation => {
                "FROM message m
                 JOIN chat_message_join cmj ON cmj.message_id = m.ROWID
                 JOIN chat c ON c.ROWID = cmj.chat_id
                 LEFT JOIN handle h ON h.ROWID = m.handle_id"
            }
        }
    }
}

/// Raw message row as stored, before text recovery and time conversion
#[derive(Debug, Clone)]
pub struct MessageRow {
    pub rowid: RowId,
    pub guid: String,
    pub text: Option<String>,
    pub attributed_body: Option<Vec<u8>>,
    pub handle_id: RowId,
    pub sender: Option<String>,
    pub service: Option<String>,
    pub date: i64,
    pub date_read: i64,
    pub date_delivered: i64,
    pub is_from_me: i64,
    pub is_read: i64,
    pub is_sent: i64,
    pub is_delivered: i64,
    pub cache_has_attachments: i64,
    pub reply_to_guid: Option<String>,
}

impl MessageRow {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            rowid: row.get("rowid")?,
            guid: row.get("guid")?,
            text: row.get("text")?,
            attributed_body: row.get("attributed_body")?,
            handle_id: row.get::<_, Option<i64>>("handle_id")?.unwrap_or(0),
            sender: row.get("sender")?,
            service: row.get("service")?,
            date: row.get::<_, Option<i64>>("date")?.unwrap_or(0),
            date_read: row.get::<_, Option<i64>>("date_read")?.unwrap_or(0),
            date_delivered: row.get::<_, Option<i64>>("date_delivered")?.unwrap_or(0),
            is_from_me: row.get::<_, Option<i64>>("is_from_me")?.unwrap_or(0),
            is_read: row.get::<_, Option<i64>>("is_read")?.unwrap_or(0),
            is_sent: row.get::<_, Option<i64>>("is_sent")?.unwrap_or(0),
            is_delivered: row.get::<_, Option<i64>>("is_delivered")?.unwrap_or(0),
            cache_has_attachments: row
                .get::<_, Option<i64>>("cache_has_attachments")?
                .unwrap_or(0),
            reply_to_guid: row.get("reply_to_guid")?,
        })
    }

    /// Convert to the output shape, recovering text from the rich-text body
    /// when the plain text column is empty
    pub fn into_message(self) -> Message {
        let has_text = self.text.as_deref().is_some_and(|t| !t.is_empty());
        let text = match (has_text, self.attributed_body.as_deref()) {
            (true, _) => self.text,
            (false, Some(body)) => Some(extract_text(Some(body))),
            (false, None) => self.text,
        };

        Message {
            guid: self.guid,
            text,
            handle_id: self.handle_id,
            sender: self.sender,
            service: self.service,
            date: archive_to_datetime(self.date),
            date_read: archive_to_datetime(self.date_read),
            date_delivered: archive_to_datetime(self.date_delivered),
            is_from_me: self.is_from_me,
            is_read: self.is_read,
            is_sent: self.is_sent,
            is_delivered: self.is_delivered,
            has_attachments: self.cache_has_attachments,
            reply_to_guid: self.reply_to_guid,
        }
    }
}

/// Count messages matching a predicate
pub fn count_messages(
    conn: &Connection,
    source: MessageSource,
    predicate: &Predicate,
) -> Result<usize> {
    let (where_sql, params) = predicate.to_sql();
    let sql = format!("SELECT COUNT(*) {} {}", source.from_clause(), where_sql);
    let count: i64 = conn.query_row(&sql, params_from_iter(params), |row| row.get(0))?;
    Ok(count.max(0) as usize)
}

/// Fetch one page of messages matching a predicate, newest first
pub fn query_messages(
    conn: &Connection,
    source: MessageSource,
    predicate: &Predicate,
    page: PageRequest,
) -> Result<Vec<Message>> {
    let (where_sql, mut params) = predicate.to_sql();
    let sql = format!(
        "SELECT {} {} {} ORDER BY m.date DESC, m.ROWID DESC LIMIT ? OFFSET ?",
        MESSAGE_COLUMNS,
        source.from_clause(),
        where_sql
    );
    params.push(page.sql_limit().into());
    params.push(page.sql_offset().into());

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), MessageRow::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(rows.into_iter().map(MessageRow::into_message).collect())
}

/// Parse a handle from a database row
pub fn handle_from_row(row: &Row) -> rusqlite::Result<Handle> {
    Ok(Handle {
        rowid: row.get("rowid")?,
        id: row.get("id")?,
        country: row.get("country")?,
        service: row.get::<_, Option<String>>("service")?.unwrap_or_default(),
        uncanonicalized_id: row.get("uncanonicalized_id")?,
    })
}

pub fn count_handles(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM handle", [], |row| row.get(0))?;
    Ok(count.max(0) as usize)
}

/// List handles in row order
pub fn list_handles(conn: &Connection, page: PageRequest) -> Result<Vec<Handle>> {
    let mut stmt = conn.prepare(
        "SELECT ROWID AS rowid, id, country, service, uncanonicalized_id
         FROM handle
         ORDER BY ROWID
         LIMIT ? OFFSET ?",
    )?;
    let handles = stmt
        .query_map([page.sql_limit(), page.sql_offset()], handle_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(handles)
}

/// Parse a chat from a database row
pub fn chat_from_row(row: &Row) -> rusqlite::Result<Chat> {
    let last_read: Option<i64> = row.get("last_read_message_timestamp")?;
    Ok(Chat {
        rowid: row.get("rowid")?,
        guid: row.get("guid")?,
        style: row.get::<_, Option<i64>>("style")?.unwrap_or(0),
        state: row.get::<_, Option<i64>>("state")?.unwrap_or(0),
        account_id: row.get("account_id")?,
        chat_identifier: row.get("chat_identifier")?,
        service_name: row.get("service_name")?,
        room_name: row.get("room_name")?,
        display_name: row.get("display_name")?,
        last_read_message_timestamp: last_read.and_then(archive_to_datetime),
    })
}

pub fn count_chats(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM chat", [], |row| row.get(0))?;
    Ok(count.max(0) as usize)
}

/// List conversations, most recently read first
pub fn list_chats(conn: &Connection, page: PageRequest) -> Result<Vec<Chat>> {
    let mut stmt = conn.prepare(
        "SELECT ROWID AS rowid, guid, style, state, account_id, chat_identifier,
                service_name, room_name, display_name, last_read_message_timestamp
         FROM chat
         ORDER BY last_read_message_timestamp DESC, ROWID DESC
         LIMIT ? OFFSET ?",
    )?;
    let chats = stmt
        .query_map([page.sql_limit(), page.sql_offset()], chat_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(chats)
}
