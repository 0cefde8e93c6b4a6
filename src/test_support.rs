//! Stores with the messaging-archive and contact-card schemas, for tests
//!
//! Shared by the unit tests, the integration tests and the binaries' tests
//! so the schemas are written down once.

use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::Result;
use crate::storage::Storage;
use crate::types::RowId;

pub const MESSAGES_SCHEMA: &str = r#"
    CREATE TABLE handle (
        ROWID INTEGER PRIMARY KEY AUTOINCREMENT UNIQUE,
        id TEXT NOT NULL,
        country TEXT,
        service TEXT NOT NULL,
        uncanonicalized_id TEXT
    );
    CREATE TABLE message (
        ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
        guid TEXT UNIQUE NOT NULL,
        text TEXT,
        attributedBody BLOB,
        handle_id INTEGER DEFAULT 0,
        service TEXT,
        date INTEGER,
        date_read INTEGER,
        date_delivered INTEGER,
        is_from_me INTEGER DEFAULT 0,
        is_read INTEGER DEFAULT 0,
        is_sent INTEGER DEFAULT 0,
        is_delivered INTEGER DEFAULT 0,
        cache_has_attachments INTEGER DEFAULT 0,
        reply_to_guid TEXT
    );
    CREATE TABLE chat (
        ROWID INTEGER PRIMARY KEY AUTOINCREMENT,
        guid TEXT UNIQUE NOT NULL,
        style INTEGER,
        state INTEGER,
        account_id TEXT,
        chat_identifier TEXT,
        service_name TEXT,
        room_name TEXT,
        display_name TEXT,
        last_read_message_timestamp INTEGER DEFAULT 0
    );
    CREATE TABLE chat_message_join (
        chat_id INTEGER REFERENCES chat (ROWID) ON DELETE CASCADE,
        message_id INTEGER REFERENCES message (ROWID) ON DELETE CASCADE,
        message_date INTEGER DEFAULT 0,
        PRIMARY KEY (chat_id, message_id)
    );
"#;

pub const CONTACTS_SCHEMA: &str = r#"
    CREATE TABLE ZABCDRECORD (
        Z_PK INTEGER PRIMARY KEY,
        ZFIRSTNAME VARCHAR,
        ZLASTNAME VARCHAR,
        ZORGANIZATION VARCHAR,
        ZNICKNAME VARCHAR
    );
    CREATE TABLE ZABCDPHONENUMBER (
        Z_PK INTEGER PRIMARY KEY,
        ZOWNER INTEGER,
        ZORDERINGINDEX INTEGER,
        ZFULLNUMBER VARCHAR
    );
    CREATE TABLE ZABCDEMAILADDRESS (
        Z_PK INTEGER PRIMARY KEY,
        ZOWNER INTEGER,
        ZORDERINGINDEX INTEGER,
        ZADDRESS VARCHAR
    );
"#;

/// In-memory messaging store
pub fn messages_store() -> Result<Storage> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(MESSAGES_SCHEMA)?;
    Storage::from_connection("messages", conn)
}

/// In-memory contact store
pub fn contacts_store(label: &str) -> Result<Storage> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch(CONTACTS_SCHEMA)?;
    Storage::from_connection(label, conn)
}

/// Create a messaging store file and return a writable connection to it
pub fn create_messages_db(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.execute_batch(MESSAGES_SCHEMA)?;
    Ok(conn)
}

/// Create a contact store file holding `contacts`
pub fn create_contacts_db(path: &Path, contacts: &[TestContact]) -> Result<()> {
    let conn = Connection::open(path)?;
    conn.execute_batch(CONTACTS_SCHEMA)?;
    for contact in contacts {
        insert_contact(&conn, contact)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct TestMessage {
    pub guid: String,
    pub text: Option<String>,
    pub body: Option<Vec<u8>>,
    pub handle_id: RowId,
    pub date: i64,
}

pub fn insert_message(conn: &Connection, message: &TestMessage) -> Result<RowId> {
    conn.execute(
        "INSERT INTO message (guid, text, attributedBody, handle_id, service, date, date_read, date_delivered)
         VALUES (?, ?, ?, ?, 'iMessage', ?, 0, 0)",
        params![
            message.guid,
            message.text,
            message.body,
            message.handle_id,
            message.date
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_handle(conn: &Connection, id: &str) -> Result<RowId> {
    conn.execute(
        "INSERT INTO handle (id, country, service, uncanonicalized_id) VALUES (?, 'us', 'iMessage', NULL)",
        params![id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_chat(conn: &Connection, guid: &str, last_read: i64) -> Result<RowId> {
    conn.execute(
        "INSERT INTO chat (guid, style, state, chat_identifier, service_name, last_read_message_timestamp)
         VALUES (?, 45, 3, ?, 'iMessage', ?)",
        params![guid, guid, last_read],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn link_message(conn: &Connection, chat_id: RowId, message_id: RowId) -> Result<()> {
    conn.execute(
        "INSERT INTO chat_message_join (chat_id, message_id) VALUES (?, ?)",
        params![chat_id, message_id],
    )?;
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct TestContact<'a> {
    pub first: Option<&'a str>,
    pub last: Option<&'a str>,
    pub organization: Option<&'a str>,
    pub nickname: Option<&'a str>,
    pub phones: Vec<&'a str>,
    pub emails: Vec<&'a str>,
}

impl<'a> TestContact<'a> {
    pub fn named(first: &'a str, last: &'a str) -> Self {
        Self {
            first: Some(first),
            last: Some(last),
            ..Default::default()
        }
    }
}

pub fn insert_contact(conn: &Connection, contact: &TestContact) -> Result<RowId> {
    conn.execute(
        "INSERT INTO ZABCDRECORD (ZFIRSTNAME, ZLASTNAME, ZORGANIZATION, ZNICKNAME) VALUES (?, ?, ?, ?)",
        params![
            contact.first,
            contact.last,
            contact.organization,
            contact.nickname
        ],
    )?;
    let owner = conn.last_insert_rowid();
    for (i, phone) in contact.phones.iter().enumerate() {
        conn.execute(
            "INSERT INTO ZABCDPHONENUMBER (ZOWNER, ZORDERINGINDEX, ZFULLNUMBER) VALUES (?, ?, ?)",
            params![owner, i as i64, phone],
        )?;
    }
    for (i, email) in contact.emails.iter().enumerate() {
        conn.execute(
            "INSERT INTO ZABCDEMAILADDRESS (ZOWNER, ZORDERINGINDEX, ZADDRESS) VALUES (?, ?, ?)",
            params![owner, i as i64, email],
        )?;
    }
    Ok(owner)
}
