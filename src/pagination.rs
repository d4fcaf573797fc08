//! Cursor-paginated bulk collection
//!
//! Walks a list endpoint page by page until enough matching items are
//! gathered or the server stops returning a `next` cursor. Pages are
//! fetched strictly in cursor order; each cursor is only known once the
//! previous page has been decoded.

use crate::error::{LoadError, LoadResult};
use crate::http::{HttpTransport, RequestOutcome, RequestParams, RequestSpec};
use crate::logging::{log_debug, log_info};
use crate::retry::{ResilientCaller, Sleeper};

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

/// Query keys understood by the instance list endpoint
pub mod keys {
    pub const ORG: &str = "org";
    pub const APP_ID: &str = "appId";
    pub const INSTANCE_OWNER_PARTY_ID: &str = "instanceOwner.partyId";
    pub const CREATED: &str = "created";
    pub const LAST_CHANGED: &str = "lastChanged";
    pub const PROCESS_IS_COMPLETE: &str = "process.isComplete";
    pub const PROCESS_ENDED: &str = "process.ended";
    pub const STATUS_IS_ARCHIVED: &str = "status.isArchived";
    pub const STATUS_IS_SOFT_DELETED: &str = "status.isSoftDeleted";
    pub const STATUS_IS_HARD_DELETED: &str = "status.isHardDeleted";
    pub const STATUS_IS_ARCHIVED_OR_SOFT_DELETED: &str = "status.isArchivedOrSoftDeleted";
    pub const STATUS_IS_ACTIVE_OR_SOFT_DELETED: &str = "status.isActiveOrSoftDeleted";
    pub const EXCLUDE_CONFIRMED_BY: &str = "excludeConfirmedBy";
    pub const SIZE: &str = "size";
}

// ============================================================================
// Filters
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Flag(bool),
    /// Strict lower bound on a date field
    After(DateTime<Utc>),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::After(date) => write!(
                f,
                "gt:{}",
                date.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::After(value)
    }
}

/// Query filters for one list request
///
/// Keys are unique. Setting a key again with the same value is accepted,
/// setting it with a different value is a configuration error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    entries: BTreeMap<String, FilterValue>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: impl Into<FilterValue>) -> LoadResult<()> {
        let value = value.into();
        match self.entries.get(key) {
            Some(existing) if *existing != value => Err(LoadError::configuration_error(format!(
                "filter '{key}' already set to '{existing}', refusing '{value}'"
            ))),
            Some(_) => Ok(()),
            None => {
                self.entries.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, key: &str, value: impl Into<FilterValue>) -> LoadResult<Self> {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn get(&self, key: &str) -> Option<&FilterValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Query pairs in key order
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }

    /// Append the filters to `base_url` as a query string
    pub fn apply_to(&self, base_url: &str) -> LoadResult<String> {
        let mut url = Url::parse(base_url)
            .map_err(|e| LoadError::invalid_target(base_url, e.to_string()))?;
        if !self.entries.is_empty() {
            let mut query = url.query_pairs_mut();
            for (key, value) in self.query_pairs() {
                query.append_pair(&key, &value);
            }
        }
        Ok(url.to_string())
    }
}

// ============================================================================
// Page shapes
// ============================================================================

/// Lifecycle timestamps of an item.
///
/// The `isArchived`/`isSoftDeleted`/`isHardDeleted` flags the list endpoint
/// also returns are ignored; a state holds only when its timestamp is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStatus {
    #[serde(default)]
    pub archived: Option<String>,
    #[serde(default)]
    pub soft_deleted: Option<String>,
    #[serde(default)]
    pub hard_deleted: Option<String>,
}

impl ItemStatus {
    pub fn archived(&self) -> bool {
        self.archived.is_some()
    }

    pub fn soft_deleted(&self) -> bool {
        self.soft_deleted.is_some()
    }

    pub fn hard_deleted(&self) -> bool {
        self.hard_deleted.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub status: Option<ItemStatus>,
    /// Kept raw: only presence matters to the predicates
    #[serde(default)]
    pub complete_confirmations: Option<serde_json::Value>,
}

impl Item {
    fn has_complete_confirmations(&self) -> bool {
        matches!(&self.complete_confirmations, Some(value) if !value.is_null())
    }
}

/// One decoded list response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectionPage {
    #[serde(alias = "instances")]
    pub items: Vec<Item>,
    #[serde(default)]
    pub next: Option<String>,
}

impl CollectionPage {
    /// Decode a page body. `page` is one-based and only used for errors.
    pub fn decode(body: &str, page: usize) -> LoadResult<Self> {
        let mut decoded: Self =
            serde_json::from_str(body).map_err(|e| LoadError::page_decode(page, e.to_string()))?;
        // Some deployments send "" instead of null on the last page
        if decoded.next.as_deref().is_some_and(|next| next.trim().is_empty()) {
            decoded.next = None;
        }
        Ok(decoded)
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// Decides which items of a page are collected
pub trait ItemFilter: Send + Sync {
    fn accept(&self, item: &Item) -> bool;
}

impl<F> ItemFilter for F
where
    F: Fn(&Item) -> bool + Send + Sync,
{
    fn accept(&self, item: &Item) -> bool {
        self(item)
    }
}

/// Built-in predicates used by setup phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemPredicate {
    /// Archived and not soft-deleted
    ArchivedNotSoftDeleted,
    /// Hard-deleted and without complete confirmations
    HardDeleteEligible,
}

impl ItemFilter for ItemPredicate {
    fn accept(&self, item: &Item) -> bool {
        let Some(status) = &item.status else {
            return false;
        };
        match self {
            Self::ArchivedNotSoftDeleted => status.archived() && !status.soft_deleted(),
            Self::HardDeleteEligible => status.hard_deleted() && !item.has_complete_confirmations(),
        }
    }
}

// ============================================================================
// Collector
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TargetReached,
    CursorExhausted,
}

/// Identifiers gathered by one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccumulatedResult {
    pub ids: Vec<String>,
    pub target_count: usize,
    pub pages_fetched: usize,
    pub stop_reason: StopReason,
}

impl AccumulatedResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn target_reached(&self) -> bool {
        self.stop_reason == StopReason::TargetReached
    }
}

/// Parameters of one collection
pub struct CollectionRequest<'a> {
    /// List endpoint without query string
    pub base_url: &'a str,
    pub token: &'a str,
    pub filters: &'a FilterSet,
    pub target_count: usize,
    pub predicate: &'a dyn ItemFilter,
}

/// Follows list cursors through a [`ResilientCaller`]
#[derive(Debug)]
pub struct PaginatedCollector<'c, T, S> {
    caller: &'c ResilientCaller<T, S>,
}

impl<'c, T, S> PaginatedCollector<'c, T, S>
where
    T: HttpTransport,
    S: Sleeper,
{
    pub fn new(caller: &'c ResilientCaller<T, S>) -> Self {
        Self { caller }
    }

    /// Collect at least `target_count` matching identifiers, or everything
    /// the cursor chain yields if there are fewer.
    ///
    /// Truncation is page-granular: the page that crosses the target is kept
    /// whole. Any non-2xx page or undecodable body aborts the collection and
    /// nothing gathered so far is returned.
    pub async fn collect(&self, request: CollectionRequest<'_>) -> LoadResult<AccumulatedResult> {
        let first_url = request.filters.apply_to(request.base_url)?;
        let first = RequestSpec::get(first_url).with_params(
            RequestParams::bearer(request.token).with_timeout(self.caller.policy().list_timeout),
        );

        let mut ids = Vec::new();
        let mut page_number = 1;
        let mut spec = first;

        loop {
            let outcome = self.caller.call(&spec).await?;
            let page = Self::decode_page(&spec.url, &outcome, page_number)?;
            let page_size = page.items.len();

            ids.extend(
                page.items
                    .into_iter()
                    .filter(|item| request.predicate.accept(item))
                    .map(|item| item.id),
            );

            log_debug!(
                page = page_number,
                page_size = page_size,
                collected = ids.len(),
                target_count = request.target_count,
                has_next = page.next.is_some(),
                "Collection page processed"
            );

            let target_reached = ids.len() >= request.target_count;
            let next = if target_reached { None } else { page.next };

            let Some(next) = next else {
                let stop_reason = if target_reached {
                    StopReason::TargetReached
                } else {
                    StopReason::CursorExhausted
                };
                log_info!(
                    collected = ids.len(),
                    target_count = request.target_count,
                    pages = page_number,
                    stop_reason = ?stop_reason,
                    "Collection finished"
                );
                return Ok(AccumulatedResult {
                    ids,
                    target_count: request.target_count,
                    pages_fetched: page_number,
                    stop_reason,
                });
            };

            spec = self.cursor_request(next, request.token);
            page_number += 1;
        }
    }

    /// The cursor URL is used verbatim, never rebuilt from filters
    fn cursor_request(&self, next: String, token: &str) -> RequestSpec {
        let params = RequestParams::bearer(token).with_timeout(self.caller.policy().list_timeout);
        RequestSpec::get(next).with_params(params)
    }

    fn decode_page(
        url: &str,
        outcome: &RequestOutcome,
        page_number: usize,
    ) -> LoadResult<CollectionPage> {
        if !outcome.is_success() {
            return Err(LoadError::collection_failed(url, outcome.status, page_number));
        }
        CollectionPage::decode(&outcome.body, page_number)
    }
}
