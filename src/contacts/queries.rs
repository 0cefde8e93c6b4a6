//! Database queries against a contact-card store

use rusqlite::{params_from_iter, Connection, OptionalExtension, Row};

use super::normalize_phone;
use crate::error::Result;
use crate::storage::filter::{Condition, Predicate};
use crate::storage::NORMALIZE_PHONE_FN;
use crate::types::{ContactQuery, ContactRecord, RowId};

/// Build the name-match predicate for a contact query.
///
/// - both parts blank: any card with a first name, last name or organization
/// - both given: first AND last must match
/// - only first: first, last, organization or nickname may match
/// - only last: last must match
pub fn name_predicate(query: &ContactQuery) -> Predicate {
    let first = query.first_name.trim();
    let last = query.last_name.as_deref().map(str::trim).unwrap_or("");

    let condition = match (first.is_empty(), last.is_empty()) {
        (true, true) => Condition::Any(vec![
            Condition::not_null("ZFIRSTNAME"),
            Condition::not_null("ZLASTNAME"),
            Condition::not_null("ZORGANIZATION"),
        ]),
        (false, false) => Condition::All(vec![
            Condition::contains("ZFIRSTNAME", first),
            Condition::contains("ZLASTNAME", last),
        ]),
        (false, true) => Condition::Any(vec![
            Condition::contains("ZFIRSTNAME", first),
            Condition::contains("ZLASTNAME", first),
            Condition::contains("ZORGANIZATION", first),
            Condition::contains("ZNICKNAME", first),
        ]),
        (true, false) => Condition::contains("ZLASTNAME", last),
    };

    Predicate::new().and(condition)
}

fn record_from_row(row: &Row) -> rusqlite::Result<ContactRecord> {
    Ok(ContactRecord::new(
        row.get("rowid")?,
        row.get("first_name")?,
        row.get("last_name")?,
        row.get("organization")?,
    ))
}

/// Find cards matching a name query, with their phones and emails loaded.
///
/// `cap` bounds how many cards are read; `None` reads them all.
pub fn search_records(
    conn: &Connection,
    query: &ContactQuery,
    cap: Option<usize>,
) -> Result<Vec<ContactRecord>> {
    let (where_sql, mut params) = name_predicate(query).to_sql();
    let sql = format!(
        "SELECT Z_PK AS rowid, ZFIRSTNAME AS first_name, ZLASTNAME AS last_name,
                ZORGANIZATION AS organization
         FROM ZABCDRECORD
         {}
         ORDER BY Z_PK
         LIMIT ?",
        where_sql
    );
    // SQLite treats a negative LIMIT as no limit
    let limit = cap.map_or(-1, |c| i64::try_from(c).unwrap_or(i64::MAX));
    params.push(limit.into());

    let mut stmt = conn.prepare(&sql)?;
    let mut records = stmt
        .query_map(params_from_iter(params), record_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for record in &mut records {
        load_handles(conn, record)?;
    }
    Ok(records)
}

/// Fill a record's phones and emails in display order
fn load_handles(conn: &Connection, record: &mut ContactRecord) -> Result<()> {
    record.phones = load_phones(conn, record.rowid)?;
    record.emails = load_emails(conn, record.rowid)?;
    Ok(())
}

pub fn load_phones(conn: &Connection, owner: RowId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT ZFULLNUMBER FROM ZABCDPHONENUMBER
         WHERE ZOWNER = ? AND ZFULLNUMBER IS NOT NULL
         ORDER BY ZORDERINGINDEX, Z_PK",
    )?;
    let phones = stmt
        .query_map([owner], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(phones)
}

pub fn load_emails(conn: &Connection, owner: RowId) -> Result<Vec<String>> {
    let mut stmt = conn.prepare_cached(
        "SELECT ZADDRESS FROM ZABCDEMAILADDRESS
         WHERE ZOWNER = ? AND ZADDRESS IS NOT NULL
         ORDER BY ZORDERINGINDEX, Z_PK",
    )?;
    let emails = stmt
        .query_map([owner], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(emails)
}

/// A card found by reverse lookup, with the stored value that matched
#[derive(Debug, Clone, PartialEq)]
pub struct HandleMatch {
    pub record: ContactRecord,
    pub matched: String,
}

fn lookup(conn: &Connection, sql: &str, value: &str) -> Result<Option<HandleMatch>> {
    let found = conn
        .query_row(sql, [value], |row| {
            Ok(HandleMatch {
                record: record_from_row(row)?,
                matched: row.get("matched")?,
            })
        })
        .optional()?;
    Ok(found)
}

/// Card owning a phone number stored exactly as given
pub fn find_by_phone(conn: &Connection, phone: &str) -> Result<Option<HandleMatch>> {
    lookup(
        conn,
        "SELECT r.Z_PK AS rowid, r.ZFIRSTNAME AS first_name, r.ZLASTNAME AS last_name,
                r.ZORGANIZATION AS organization, p.ZFULLNUMBER AS matched
         FROM ZABCDPHONENUMBER p
         JOIN ZABCDRECORD r ON r.Z_PK = p.ZOWNER
         WHERE p.ZFULLNUMBER = ?
         ORDER BY p.Z_PK
         LIMIT 1",
        phone,
    )
}

/// Card owning a phone number that normalizes to the same form as `phone`
pub fn find_by_normalized_phone(conn: &Connection, phone: &str) -> Result<Option<HandleMatch>> {
    let sql = format!(
        "SELECT r.Z_PK AS rowid, r.ZFIRSTNAME AS first_name, r.ZLASTNAME AS last_name,
                r.ZORGANIZATION AS organization, p.ZFULLNUMBER AS matched
         FROM ZABCDPHONENUMBER p
         JOIN ZABCDRECORD r ON r.Z_PK = p.ZOWNER
         WHERE {}(p.ZFULLNUMBER) = ?
         ORDER BY p.Z_PK
         LIMIT 1",
        NORMALIZE_PHONE_FN
    );
    lookup(conn, &sql, &normalize_phone(phone))
}

/// Card owning an email address stored exactly as given
pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<HandleMatch>> {
    lookup(
        conn,
        "SELECT r.Z_PK AS rowid, r.ZFIRSTNAME AS first_name, r.ZLASTNAME AS last_name,
                r.ZORGANIZATION AS organization, e.ZADDRESS AS matched
         FROM ZABCDEMAILADDRESS e
         JOIN ZABCDRECORD r ON r.Z_PK = e.ZOWNER
         WHERE e.ZADDRESS = ?
         ORDER BY e.Z_PK
         LIMIT 1",
        email,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{contacts_store, insert_contact, TestContact};

    #[test]
    fn test_name_predicate_shapes() {
        let (sql, params) = name_predicate(&ContactQuery::default()).to_sql();
        assert!(sql.contains("ZFIRSTNAME IS NOT NULL OR ZLASTNAME IS NOT NULL"));
        assert!(params.is_empty());

        let (sql, params) = name_predicate(&ContactQuery::new("Ada", Some("Love".into()))).to_sql();
        assert!(sql.contains(" AND ZLASTNAME LIKE"));
        assert_eq!(params.len(), 2);

        let (sql, params) = name_predicate(&ContactQuery::new("ada", None)).to_sql();
        assert!(sql.contains("ZNICKNAME LIKE"));
        assert_eq!(params.len(), 4);

        let (_, params) = name_predicate(&ContactQuery::new(" ", Some("Love".into()))).to_sql();
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_search_records_loads_handles_in_order() {
        let storage = contacts_store("contacts").unwrap();
        storage
            .with_connection(|conn| {
                insert_contact(
                    conn,
                    &TestContact {
                        first: Some("Ada"),
                        last: Some("Lovelace"),
                        phones: vec!["(555) 123-4567", "555 000 1111"],
                        emails: vec!["ada@example.com"],
                        ..Default::default()
                    },
                )?;
                insert_contact(
                    conn,
                    &TestContact {
                        first: Some("Grace"),
                        nickname: Some("Amazing Ada"),
                        ..Default::default()
                    },
                )?;
                insert_contact(conn, &TestContact::default())?;

                let records = search_records(conn, &ContactQuery::new("ada", None), None)?;
                assert_eq!(records.len(), 2);
                assert_eq!(records[0].display_name, "Ada Lovelace");
                assert_eq!(records[0].phones, vec!["(555) 123-4567", "555 000 1111"]);
                assert_eq!(records[0].emails, vec!["ada@example.com"]);
                assert_eq!(records[1].display_name, "Grace");

                // Blank query skips the card with no name or organization
                let all = search_records(conn, &ContactQuery::default(), None)?;
                assert_eq!(all.len(), 2);

                let capped = search_records(conn, &ContactQuery::default(), Some(1))?;
                assert_eq!(capped.len(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_reverse_lookups() {
        let storage = contacts_store("contacts").unwrap();
        storage
            .with_connection(|conn| {
                insert_contact(
                    conn,
                    &TestContact {
                        first: Some("Ada"),
                        phones: vec!["(555) 123-4567"],
                        emails: vec!["ada@example.com"],
                        ..Default::default()
                    },
                )?;

                assert!(find_by_phone(conn, "+15551234567")?.is_none());
                let hit = find_by_normalized_phone(conn, "+15551234567")?.unwrap();
                assert_eq!(hit.record.display_name, "Ada");
                assert_eq!(hit.matched, "(555) 123-4567");

                assert!(find_by_phone(conn, "(555) 123-4567")?.is_some());
                assert!(find_by_email(conn, "ada@example.com")?.is_some());
                assert!(find_by_email(conn, "nobody@example.com")?.is_none());
                Ok(())
            })
            .unwrap();
    }
}
