//! TableState - Server-Driven Paginated Table
//!
//! Holds one page of records plus the cursor that produced it and reconciles itself
//! against the gateway on demand.
//!
//! ## Concurrency
//!
//! Fetches may overlap (search changes, background polling, post-save refreshes).
//! Responses are applied in the order they settle, so the page on screen is always
//! the one from the last successful response to arrive. `loading` is derived from an
//! in-flight counter maintained by an RAII guard, which makes it fall back to `false`
//! once every overlapping fetch has settled, failed or been dropped.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::domain::{ListQuery, Pagination, Record};
use crate::error::Result;
use crate::eventing::Notifier;
use crate::services::{RecordGateway, TaskHandle, spawn_named};
use crate::state::confirm::Confirm;

/// Snapshot of a table as the front-end renders it
#[derive(Debug, Clone)]
pub struct TableView<R> {
    pub rows: Vec<R>,
    pub total: u64,
    pub pagination: Pagination,
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub loading: bool,
    /// Request number of the response currently shown
    pub shown_ticket: Option<u64>,
}

impl<R> TableView<R> {
    fn new(pagination: Pagination) -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
            pagination,
            search: String::new(),
            filters: BTreeMap::new(),
            loading: false,
            shown_ticket: None,
        }
    }

    pub fn total_pages(&self) -> u32 {
        self.pagination.total_pages(self.total)
    }

    fn query(&self) -> ListQuery {
        ListQuery {
            pagination: self.pagination.clone(),
            search: (!self.search.is_empty()).then(|| self.search.clone()),
            filters: self
                .filters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }
}

/// Result of a delete request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The user declined; no request was sent
    Declined,
}

struct TableInner<R: Record> {
    gateway: Arc<dyn RecordGateway<R>>,
    notifier: Notifier,
    view: RwLock<TableView<R>>,
    in_flight: RwLock<usize>,
    tickets: AtomicU64,
    closed: AtomicBool,
    changes: watch::Sender<u64>,
}

/// Decrements the in-flight counter however the fetch ends.
struct LoadingGuard<'a, R: Record> {
    inner: &'a TableInner<R>,
}

impl<'a, R: Record> LoadingGuard<'a, R> {
    fn enter(inner: &'a TableInner<R>) -> Self {
        let mut in_flight = inner.in_flight.write();
        *in_flight += 1;
        inner.view.write().loading = true;
        Self { inner }
    }
}

impl<R: Record> Drop for LoadingGuard<'_, R> {
    fn drop(&mut self) {
        let mut in_flight = self.inner.in_flight.write();
        *in_flight = in_flight.saturating_sub(1);
        self.inner.view.write().loading = *in_flight > 0;
    }
}

/// Paginated, sortable, searchable view of one remote collection
pub struct TableState<R: Record> {
    inner: Arc<TableInner<R>>,
}

impl<R: Record> Clone for TableState<R> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R: Record> TableState<R> {
    pub fn new(gateway: Arc<dyn RecordGateway<R>>, notifier: Notifier, rows_per_page: u32) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            inner: Arc::new(TableInner {
                gateway,
                notifier,
                view: RwLock::new(TableView::new(Pagination::new(R::DEFAULT_SORT, rows_per_page))),
                in_flight: RwLock::new(0),
                tickets: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                changes,
            }),
        }
    }

    // ==================== Reads ====================

    pub fn view(&self) -> TableView<R> {
        self.inner.view.read().clone()
    }

    pub fn rows(&self) -> Vec<R> {
        self.inner.view.read().rows.clone()
    }

    pub fn total(&self) -> u64 {
        self.inner.view.read().total
    }

    pub fn loading(&self) -> bool {
        self.inner.view.read().loading
    }

    pub fn pagination(&self) -> Pagination {
        self.inner.view.read().pagination.clone()
    }

    pub fn search(&self) -> String {
        self.inner.view.read().search.clone()
    }

    pub fn filter(&self, key: &str) -> Option<String> {
        self.inner.view.read().filters.get(key).cloned()
    }

    /// Row with the given id on the current page
    pub fn find(&self, id: &str) -> Option<R> {
        self.inner
            .view
            .read()
            .rows
            .iter()
            .find(|r| r.id() == Some(id))
            .cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn gateway(&self) -> &Arc<dyn RecordGateway<R>> {
        &self.inner.gateway
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    // ==================== Cursor changes ====================

    /// Change the search term. Returns `true` if it differed, in which case the page is
    /// reset to 1 and subscribers are told to refetch.
    pub fn set_search(&self, term: impl Into<String>) -> bool {
        let term = term.into();
        let changed = {
            let mut view = self.inner.view.write();
            if view.search == term {
                false
            } else {
                view.search = term;
                view.pagination.page = 1;
                true
            }
        };
        if changed {
            self.announce_change();
        }
        changed
    }

    /// Set (`Some`) or clear (`None`) an extra listing filter such as `owner_data_id`
    pub fn set_filter(&self, key: &str, value: Option<String>) -> bool {
        let value = value.filter(|v| !v.is_empty());
        let changed = {
            let mut view = self.inner.view.write();
            let current = view.filters.get(key).cloned();
            if current == value {
                false
            } else {
                match value {
                    Some(v) => view.filters.insert(key.to_string(), v),
                    None => view.filters.remove(key),
                };
                view.pagination.page = 1;
                true
            }
        };
        if changed {
            self.announce_change();
        }
        changed
    }

    pub fn set_page(&self, page: u32) -> bool {
        let page = page.max(1);
        self.update_cursor(|p| {
            if p.page == page {
                return false;
            }
            p.page = page;
            true
        })
    }

    pub fn set_rows_per_page(&self, rows_per_page: u32) -> bool {
        let rows_per_page = rows_per_page.max(1);
        self.update_cursor(|p| {
            if p.rows_per_page == rows_per_page {
                return false;
            }
            p.rows_per_page = rows_per_page;
            p.page = 1;
            true
        })
    }

    pub fn set_sort(&self, sort_by: impl Into<String>, descending: bool) -> bool {
        let sort_by = sort_by.into();
        self.update_cursor(|p| {
            if p.sort_by == sort_by && p.descending == descending {
                return false;
            }
            p.sort_by = sort_by;
            p.descending = descending;
            true
        })
    }

    fn update_cursor(&self, apply: impl FnOnce(&mut Pagination) -> bool) -> bool {
        let changed = apply(&mut self.inner.view.write().pagination);
        if changed {
            self.announce_change();
        }
        changed
    }

    fn announce_change(&self) {
        self.inner.changes.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    /// Fetch whenever the cursor changes, until the returned handle is dropped.
    ///
    /// With a zero `debounce` every change fetches right away. Otherwise a burst of
    /// changes collapses into one fetch issued `debounce` after the last of them.
    /// Changes that arrive while a fetch is running are coalesced into one follow-up.
    pub fn subscribe_changes(&self, debounce: Duration) -> TaskHandle {
        let mut rx = self.inner.changes.subscribe();
        let table = self.clone();
        spawn_named("table.changes", async move {
            while rx.changed().await.is_ok() {
                if !debounce.is_zero() {
                    loop {
                        tokio::select! {
                            _ = tokio::time::sleep(debounce) => break,
                            changed = rx.changed() => {
                                if changed.is_err() {
                                    return;
                                }
                            }
                        }
                    }
                }
                rx.borrow_and_update();
                if table.is_closed() {
                    return;
                }
                let _ = table.fetch().await;
            }
        })
    }

    // ==================== Remote operations ====================

    /// Load the page described by the current cursor.
    ///
    /// Failures are reported as a notification and leave the last good page in place.
    pub async fn fetch(&self) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        let _guard = LoadingGuard::enter(&self.inner);
        // Page to request instead of the cursor's, set once when the cursor overshoots
        let mut clamped_page: Option<u32> = None;

        loop {
            let ticket = self.inner.tickets.fetch_add(1, Ordering::SeqCst) + 1;
            let mut query = self.inner.view.read().query();
            if let Some(page) = clamped_page {
                query.pagination.page = page;
            }
            debug!(collection = %R::COLLECTION, ticket, page = query.pagination.page, "Fetching page");

            let result = self.inner.gateway.list(&query).await;
            if self.is_closed() {
                debug!(collection = %R::COLLECTION, ticket, "Discarding response for closed table");
                return Ok(());
            }

            let page = match result {
                Ok(page) => page,
                Err(e) => {
                    warn!(collection = %R::COLLECTION, ticket, error = %e, "Fetch failed");
                    self.inner.notifier.api_error(&e);
                    return Err(e);
                }
            };

            let last_page = query.pagination.total_pages(page.total);
            let overshot = page.data.is_empty() && query.pagination.page > last_page;
            if overshot && page.total > 0 && clamped_page.is_none() {
                // The requested page no longer exists (e.g. its last row was deleted)
                debug!(collection = %R::COLLECTION, ticket, last_page, "Page out of range, clamping");
                clamped_page = Some(last_page);
                continue;
            }

            let mut view = self.inner.view.write();
            if overshot {
                // Nothing left at all: the first page is the only one
                view.pagination.page = last_page;
            } else if let Some(page) = clamped_page {
                view.pagination.page = page;
            }
            view.rows = page.data;
            view.total = page.total;
            view.shown_ticket = Some(ticket);
            return Ok(());
        }
    }

    /// Confirm, delete, then refetch so pagination and `total` are re-derived.
    pub async fn delete(&self, id: &str, confirm: &dyn Confirm) -> Result<DeleteOutcome> {
        if !confirm.confirm(R::DELETE_PROMPT).await {
            debug!(collection = %R::COLLECTION, id, "Delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        match self.inner.gateway.delete(id).await {
            Ok(()) => {
                info!(collection = %R::COLLECTION, id, "Record deleted");
                let _ = self.fetch().await;
                if let Some(message) = R::deleted_message() {
                    self.inner.notifier.positive(message);
                }
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                warn!(collection = %R::COLLECTION, id, error = %e, "Delete failed");
                self.inner.notifier.api_error(&e);
                if e.is_not_found() {
                    // Someone else removed it; drop the stale row
                    let _ = self.fetch().await;
                }
                Err(e)
            }
        }
    }

    /// Stop applying responses. Fetches still in flight are discarded when they settle.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
    }
}

impl<R: Record> std::fmt::Debug for TableState<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let view = self.inner.view.read();
        f.debug_struct("TableState")
            .field("collection", &R::COLLECTION)
            .field("rows", &view.rows.len())
            .field("total", &view.total)
            .field("page", &view.pagination.page)
            .field("loading", &view.loading)
            .finish()
    }
}
