//! Contact resolution across every contact-card store
//!
//! Each store is queried on its own. A store that fails is logged and
//! skipped; the call only fails when every store failed. Cards that appear
//! in several stores are merged on their (first, last, organization) triple,
//! and the copy from the store scanned first wins.

mod phone;
pub mod queries;

pub use phone::normalize_phone;

use std::collections::HashSet;

use crate::error::{ImsgError, Result};
use crate::pagination::{PageRequest, PaginatedResult};
use crate::storage::Storage;
use crate::types::{ContactInfo, ContactLookup, ContactQuery, ContactRecord, HandleKind};

use queries::HandleMatch;

/// Default number of cards read from each store per search
pub const DEFAULT_PER_SOURCE_CAP: usize = 1000;

/// Tuning for contact resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Upper bound on cards read from each store before flattening. When a
    /// store hits the bound, later pages and `total` undercount the real
    /// match set. `None` reads every matching card.
    pub per_source_cap: Option<usize>,
    /// After the exact sweep finds nothing, sweep every store again
    /// comparing normalized phone numbers
    pub normalized_lookup: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            per_source_cap: Some(DEFAULT_PER_SOURCE_CAP),
            normalized_lookup: false,
        }
    }
}

impl ResolverConfig {
    /// Build from a raw cap where 0 means "no cap"
    pub fn with_cap(cap: usize) -> Self {
        Self {
            per_source_cap: (cap > 0).then_some(cap),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_normalized_lookup(mut self, enabled: bool) -> Self {
        self.normalized_lookup = enabled;
        self
    }
}

/// Resolver over an ordered list of contact stores
pub struct ContactResolver<'a> {
    sources: &'a [Storage],
    config: ResolverConfig,
}

impl<'a> ContactResolver<'a> {
    pub fn new(sources: &'a [Storage]) -> Self {
        Self::with_config(sources, ResolverConfig::default())
    }

    pub fn with_config(sources: &'a [Storage], config: ResolverConfig) -> Self {
        Self { sources, config }
    }

    /// Search cards by name and return one entry per phone or email
    pub fn search_by_name(
        &self,
        query: &ContactQuery,
        page: PageRequest,
    ) -> Result<PaginatedResult<ContactInfo>> {
        let cap = self.config.per_source_cap;
        let scans = self.fan_out(|conn| queries::search_records(conn, query, cap));

        let mut records = Vec::new();
        for (source, batch) in self.sources.iter().zip(collect_successes(scans)?) {
            let Some(batch) = batch else { continue };
            if cap.is_some_and(|c| batch.len() >= c) {
                tracing::warn!(
                    store = source.label(),
                    cap = cap.unwrap_or_default(),
                    "Contact search hit the per-store cap; totals may undercount"
                );
            }
            records.extend(batch);
        }

        let candidates = flatten_contacts(records);
        tracing::debug!(
            sources = self.sources.len(),
            candidates = candidates.len(),
            "Contact search complete"
        );
        Ok(PaginatedResult::from_full_list(candidates, page))
    }

    /// Find the first card, in store order, that owns `handle`.
    ///
    /// Every store is checked for an exact phone match, then an exact email
    /// match when the handle contains `@`. Only when no store matched
    /// exactly, and `normalized_lookup` is enabled, are the stores swept a
    /// second time comparing normalized phone numbers.
    pub fn lookup_by_handle(&self, handle: &str) -> Result<ContactLookup> {
        let handle = handle.trim();
        if handle.is_empty() {
            return Ok(ContactLookup::not_found());
        }

        if let Some(info) = self.first_hit(|conn| exact_match(conn, handle))? {
            return Ok(ContactLookup::found(info));
        }

        if self.config.normalized_lookup && !handle.contains('@') {
            let normalized = self.first_hit(|conn| {
                Ok(queries::find_by_normalized_phone(conn, handle)?
                    .map(|hit| match_to_info(hit, HandleKind::Phone)))
            })?;
            if let Some(info) = normalized {
                tracing::debug!(handle, "Reverse lookup matched on normalized phone");
                return Ok(ContactLookup::found(info));
            }
        }

        Ok(ContactLookup::not_found())
    }

    /// Run `f` against each store in order and return the first hit.
    ///
    /// Failing stores are skipped; the sweep fails only when every store
    /// failed.
    fn first_hit<F>(&self, f: F) -> Result<Option<ContactInfo>>
    where
        F: Fn(&rusqlite::Connection) -> Result<Option<ContactInfo>>,
    {
        let mut failures = Vec::new();
        for source in self.sources {
            match source.with_connection(&f) {
                Ok(Some(info)) => return Ok(Some(info)),
                Ok(None) => {}
                Err(e) => failures.push(skip_source(source, e)),
            }
        }

        if !self.sources.is_empty() && failures.len() == self.sources.len() {
            return Err(ImsgError::AllSourcesFailed { failures });
        }
        Ok(None)
    }

    /// Run one query against every store in order, keeping each outcome
    fn fan_out<T, F>(&self, f: F) -> Vec<(&'a Storage, Result<T>)>
    where
        F: Fn(&rusqlite::Connection) -> Result<T>,
    {
        self.sources
            .iter()
            .map(|source| (source, source.with_connection(&f)))
            .collect()
    }
}

/// Keep successful per-store results, logging failures.
///
/// Returns one slot per store (`None` where it failed), or an error when
/// there was at least one store and all of them failed.
fn collect_successes<T>(outcomes: Vec<(&Storage, Result<T>)>) -> Result<Vec<Option<T>>> {
    let total = outcomes.len();
    let mut failures = Vec::new();
    let mut slots = Vec::with_capacity(total);

    for (source, outcome) in outcomes {
        match outcome {
            Ok(value) => slots.push(Some(value)),
            Err(e) => {
                failures.push(skip_source(source, e));
                slots.push(None);
            }
        }
    }

    if total > 0 && failures.len() == total {
        return Err(ImsgError::AllSourcesFailed { failures });
    }
    Ok(slots)
}

/// Log a failed store and describe it for the all-failed error
fn skip_source(source: &Storage, error: ImsgError) -> String {
    tracing::warn!(store = source.label(), error = %error, "Skipping contact store");
    format!("{}: {}", source.label(), error)
}

/// Exact phone, then exact email for `@` handles
fn exact_match(conn: &rusqlite::Connection, handle: &str) -> Result<Option<ContactInfo>> {
    if let Some(hit) = queries::find_by_phone(conn, handle)? {
        return Ok(Some(match_to_info(hit, HandleKind::Phone)));
    }
    if handle.contains('@') {
        if let Some(hit) = queries::find_by_email(conn, handle)? {
            return Ok(Some(match_to_info(hit, HandleKind::Email)));
        }
    }
    Ok(None)
}

/// Merge duplicate cards and expand each survivor into one entry per handle.
///
/// Phones are normalized; emails are used verbatim.
pub fn flatten_contacts(records: Vec<ContactRecord>) -> Vec<ContactInfo> {
    let mut seen = HashSet::new();
    let mut flattened = Vec::new();

    for record in records {
        if !seen.insert(record.dedup_key()) {
            continue;
        }

        let phones = record
            .phones
            .iter()
            .map(|p| (normalize_phone(p), HandleKind::Phone));
        let emails = record.emails.iter().map(|e| (e.clone(), HandleKind::Email));

        for (handle, handle_type) in phones.chain(emails) {
            flattened.push(ContactInfo {
                name: record.display_name.clone(),
                first_name: record.first_name.clone(),
                last_name: record.last_name.clone(),
                organization: record.organization.clone(),
                handle,
                handle_type,
            });
        }
    }

    flattened
}

fn match_to_info(hit: HandleMatch, kind: HandleKind) -> ContactInfo {
    let handle = match kind {
        HandleKind::Phone => normalize_phone(&hit.matched),
        HandleKind::Email => hit.matched,
    };
    ContactInfo {
        name: hit.record.display_name,
        first_name: hit.record.first_name,
        last_name: hit.record.last_name,
        organization: hit.record.organization,
        handle,
        handle_type: kind,
    }
}
