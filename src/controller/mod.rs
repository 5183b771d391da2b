//! # Paginated Collection Controller
//!
//! The stateful core: one controller per list screen or selector session.
//!
//! ## State Machine
//!
//! ```text
//! Idle ──► Loading ──► Loaded
//!             │  ▲        │
//!             ▼  └────────┤
//!          Errored ───────┘
//! ```
//!
//! Every operation moves the controller to `Loading` and dispatches exactly one
//! request through the [`PageTransport`].
//!
//! ## Staleness
//!
//! Each dispatch takes the next sequence number. When a response arrives it is
//! applied only if its number is still the latest issued; otherwise it is dropped
//! and the operation reports [`FetchOutcome::Superseded`]. A slow "previous page"
//! response can therefore never overwrite a faster "next page" one. [`close`]
//! abandons everything still in flight.
//!
//! ## Failures
//!
//! Contract violations (bad cursor, page out of range) return an error and leave
//! state untouched. Transport failures return an error *and* move the controller
//! to `Errored`, keeping the last good page on display and rolling back any
//! optimistic page change.
//!
//! [`close`]: CollectionController::close

pub mod config;
pub mod state;

pub use config::*;
pub use state::{CollectionView, FetchOutcome, LoadStatus};

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, instrument, warn};

use crate::cursor::CursorCodec;
use crate::error::{CollectionError, FetchFailure, Result};
use crate::filter::FilterSet;
use crate::transport::{PageResult, PageTransport};
use state::CollectionState;

/// Controller for one paginated, filterable remote collection.
///
/// Cloning yields another handle to the *same* controller, so a render loop and
/// an input handler can share it. Separate controllers never share state.
pub struct CollectionController<T> {
    inner: Arc<Inner<T>>,
}

struct Inner<T> {
    config: CollectionConfig,
    codec: CursorCodec,
    transport: Arc<dyn PageTransport<T>>,
    state: Mutex<CollectionState<T>>,
}

impl<T> Clone for CollectionController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// A response that passed validation and is ready to be shown.
struct LandedPage<T> {
    items: Vec<T>,
    total_count: u64,
    next: Option<String>,
    previous: Option<String>,
    page: u32,
}

impl<T> CollectionController<T> {
    pub fn config(&self) -> &CollectionConfig {
        &self.inner.config
    }

    pub fn codec(&self) -> &CursorCodec {
        &self.inner.codec
    }

    pub fn status(&self) -> LoadStatus {
        self.lock().status
    }

    pub fn is_loading(&self) -> bool {
        self.status() == LoadStatus::Loading
    }

    pub fn error(&self) -> Option<FetchFailure> {
        self.lock().error.clone()
    }

    pub fn current_page(&self) -> u32 {
        self.lock().current_page
    }

    pub fn total_count(&self) -> u64 {
        self.lock().total_count
    }

    pub fn total_pages(&self) -> u32 {
        self.inner.codec.total_pages(self.total_count())
    }

    /// Cursor of the most recently issued request.
    pub fn cursor(&self) -> String {
        self.lock().cursor.clone()
    }

    /// Filters the visible page was loaded with.
    pub fn filters(&self) -> FilterSet {
        self.lock().filters.clone()
    }

    /// Filters of the most recently issued request; differs from [`filters`](Self::filters)
    /// while a filter change is loading or after it failed.
    pub fn pending_filters(&self) -> FilterSet {
        self.lock().pending_filters.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Abandons every in-flight request; late responses are dropped and later
    /// operations fail with [`CollectionError::Closed`].
    pub fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            state.closed = true;
            state.latest_seq += 1;
            info!(base_url = %self.inner.config.base_url, "Collection closed");
        }
    }

    fn lock(&self) -> MutexGuard<'_, CollectionState<T>> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send + 'static> CollectionController<T> {
    /// Creates an idle controller. Nothing is fetched until the first operation.
    ///
    /// # Errors
    /// [`CollectionError::Config`] for an invalid page size and
    /// [`CollectionError::InvalidCursor`] for an unusable `base_url`.
    pub fn new(config: CollectionConfig, transport: Arc<dyn PageTransport<T>>) -> Result<Self> {
        let codec = config.codec()?;
        let cursor = codec.cursor_for_page(&config.base_url, &config.default_filters, None)?;
        let state = CollectionState::new(cursor, config.default_filters.clone());

        debug!(base_url = %config.base_url, style = ?config.cursor_style, page_size = config.page_size, "Collection created");
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                codec,
                transport,
                state: Mutex::new(state),
            }),
        })
    }

    /// Snapshot of everything a list view displays.
    pub fn view(&self) -> CollectionView<T> {
        let state = self.lock();
        CollectionView {
            items: state.items.clone(),
            total_count: state.total_count,
            current_page: state.current_page,
            total_pages: self.inner.codec.total_pages(state.total_count),
            is_loading: state.status == LoadStatus::Loading,
            error: state.error.clone(),
            has_next: state.next.is_some(),
            has_previous: state.previous.is_some(),
            status: state.status,
            filters: state.filters.clone(),
        }
    }

    pub fn items(&self) -> Vec<T> {
        self.lock().items.clone()
    }

    /// Fetches `cursor`, or re-fetches the active cursor when `None`.
    ///
    /// A caller-supplied cursor is normalized and decoded before anything is sent.
    #[instrument(skip(self), fields(base_url = %self.inner.config.base_url))]
    pub async fn fetch(&self, cursor: Option<&str>) -> Result<FetchOutcome> {
        match cursor {
            Some(raw) => {
                let cursor = self.inner.codec.normalizer().normalize(raw)?;
                let page = self.inner.codec.page_from_cursor(&cursor)?;
                self.dispatch(cursor, |state| {
                    state.pending_filters = state.filters.clone();
                    state.current_page = page;
                })
                .await
            }
            None => {
                let cursor = self.cursor();
                self.dispatch(cursor, |_| {}).await
            }
        }
    }

    /// Re-issues the active cursor, typically after a retryable failure.
    pub async fn retry(&self) -> Result<FetchOutcome> {
        self.fetch(None).await
    }

    /// Replaces the filter set and loads its first page.
    ///
    /// The new set becomes [`filters`](Self::filters) once its page lands; until
    /// then (or after a failure) it is only pending, and [`retry`](Self::retry)
    /// re-issues it.
    #[instrument(skip(self), fields(base_url = %self.inner.config.base_url))]
    pub async fn apply_filters(&self, filters: &FilterSet) -> Result<FetchOutcome> {
        let filters = filters.clone();
        let cursor = self
            .inner
            .codec
            .cursor_for_page(&self.inner.config.base_url, &filters, Some(1))?;
        self.dispatch(cursor, move |state| {
            state.pending_filters = filters;
            state.current_page = 1;
        })
        .await
    }

    /// Restores the configured default filters and loads page 1.
    pub async fn clear_filters(&self) -> Result<FetchOutcome> {
        let defaults = self.inner.config.default_filters.clone();
        self.apply_filters(&defaults).await
    }

    /// Follows the server's `next` link, if there is one.
    #[instrument(skip(self), fields(base_url = %self.inner.config.base_url))]
    pub async fn go_to_next_page(&self) -> Result<FetchOutcome> {
        let next = self.lock().next.clone();
        let Some(next) = next else {
            debug!("No next page");
            return Ok(FetchOutcome::Unavailable);
        };
        self.dispatch(next, |state| {
            state.pending_filters = state.filters.clone();
            state.current_page = state.current_page.saturating_add(1);
        })
        .await
    }

    /// Follows the server's `previous` link, if there is one.
    #[instrument(skip(self), fields(base_url = %self.inner.config.base_url))]
    pub async fn go_to_prev_page(&self) -> Result<FetchOutcome> {
        let previous = self.lock().previous.clone();
        let Some(previous) = previous else {
            debug!("No previous page");
            return Ok(FetchOutcome::Unavailable);
        };
        self.dispatch(previous, |state| {
            state.pending_filters = state.filters.clone();
            state.current_page = state.current_page.saturating_sub(1).max(1);
        })
        .await
    }

    /// Jumps to page `n` of the current filter set.
    ///
    /// # Errors
    /// [`CollectionError::PageOutOfRange`] unless `1 <= n <= total_pages`; state
    /// is left unchanged.
    #[instrument(skip(self), fields(base_url = %self.inner.config.base_url))]
    pub async fn go_to_page(&self, n: u32) -> Result<FetchOutcome> {
        let cursor = {
            let state = self.lock();
            if state.closed {
                return Err(CollectionError::Closed);
            }
            let total_pages = self.inner.codec.total_pages(state.total_count);
            if n == 0 || n > total_pages {
                warn!(requested = n, total_pages, "Page out of range");
                return Err(CollectionError::PageOutOfRange {
                    requested: n,
                    total_pages,
                });
            }
            self.inner
                .codec
                .cursor_for_page(&self.inner.config.base_url, &state.filters, Some(n))?
        };
        self.dispatch(cursor, move |state| {
            state.pending_filters = state.filters.clone();
            state.current_page = n;
        })
        .await
    }

    /// Issues one request and applies its response if it is still the latest.
    ///
    /// `prepare` runs under the state lock at issuance (optimistic updates).
    async fn dispatch<F>(&self, cursor: String, prepare: F) -> Result<FetchOutcome>
    where
        F: FnOnce(&mut CollectionState<T>),
    {
        let seq = {
            let mut state = self.lock();
            if state.closed {
                return Err(CollectionError::Closed);
            }
            state.latest_seq += 1;
            prepare(&mut state);
            state.cursor = cursor.clone();
            state.status = LoadStatus::Loading;
            state.error = None;
            state.latest_seq
        };

        debug!(seq, %cursor, "Fetching page");
        let response = self.inner.transport.get_page(&cursor).await;

        let mut state = self.lock();
        if state.closed || seq != state.latest_seq {
            debug!(seq, latest = state.latest_seq, closed = state.closed, "Discarding stale response");
            return Ok(FetchOutcome::Superseded);
        }

        match response.map_err(CollectionError::from).and_then(|page| self.land(&cursor, page)) {
            Ok(landed) => {
                state.items = landed.items;
                state.total_count = landed.total_count;
                state.next = landed.next;
                state.previous = landed.previous;
                state.current_page = landed.page;
                state.loaded_page = landed.page;
                state.filters = state.pending_filters.clone();
                state.status = LoadStatus::Loaded;
                info!(seq, page = landed.page, total = state.total_count, items = state.items.len(), "Page loaded");
                Ok(FetchOutcome::Applied)
            }
            Err(e) => {
                state.status = LoadStatus::Errored;
                state.error = Some(FetchFailure::from(&e));
                state.current_page = state.loaded_page;
                warn!(seq, %cursor, error = %e, retryable = e.is_retryable(), "Fetch failed");
                Err(e)
            }
        }
    }

    /// Validates a response: checks its counts, normalizes its links and derives
    /// its page number.
    fn land(&self, cursor: &str, page: PageResult<T>) -> Result<LandedPage<T>> {
        page.validate(cursor)?;
        let normalizer = self.inner.codec.normalizer();
        let next = page.next.as_deref().map(|n| normalizer.normalize(n)).transpose()?;
        let previous = page.previous.as_deref().map(|p| normalizer.normalize(p)).transpose()?;
        let number = self.inner.codec.page_from_cursor(cursor)?;

        Ok(LandedPage {
            items: page.items,
            total_count: page.total_count,
            next,
            previous,
            page: number,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::transport::mock::MockTransport;
    use crate::transport::TransportError;

    fn page(items: &[u32], total: u64) -> PageResult<u32> {
        PageResult::new(items.to_vec(), total)
    }

    #[tokio::test]
    async fn test_initial_fetch_loads_first_page() {
        let mock = MockTransport::new();
        mock.expect_get("/facet/area/")
            .return_ok(page(&[1, 2], 12).with_next("http://127.0.0.1:8000/facet/area/?page=2"));

        let controller = CollectionController::new(CollectionConfig::new("/facet/area/"), mock.transport()).unwrap();
        assert_eq!(controller.status(), LoadStatus::Idle);

        assert_eq!(controller.fetch(None).await.unwrap(), FetchOutcome::Applied);

        let view = controller.view();
        assert_eq!(view.items, vec![1, 2]);
        assert_eq!(view.total_count, 12);
        assert_eq!(view.total_pages, 2);
        assert_eq!(view.current_page, 1);
        assert!(view.has_next);
        assert!(!view.has_previous);
        assert!(!view.is_loading);
        mock.verify();
    }

    #[tokio::test]
    async fn test_next_link_is_normalized_before_following() {
        let mock = MockTransport::new();
        mock.expect_get("/facet/area/?limit=10")
            .return_ok(page(&[1], 30).with_next("https://docentes.example.org/api/facet/area/?limit=10&offset=10"));
        mock.expect_get("/facet/area/?limit=10&offset=10").return_ok(
            page(&[2], 30)
                .with_next("/api/facet/area/?limit=10&offset=20")
                .with_previous("/api/facet/area/?limit=10"),
        );

        let config = CollectionConfig::new("/facet/area/")
            .with_cursor_style(crate::cursor::CursorStyle::Offset)
            .with_api_prefix("/api");
        let controller = CollectionController::new(config, mock.transport()).unwrap();

        controller.fetch(None).await.unwrap();
        assert_eq!(controller.go_to_next_page().await.unwrap(), FetchOutcome::Applied);
        assert_eq!(controller.current_page(), 2);
        assert_eq!(controller.cursor(), "/facet/area/?limit=10&offset=10");
        mock.verify();
    }

    #[tokio::test]
    async fn test_missing_links_are_unavailable_not_errors() {
        let mock = MockTransport::new();
        mock.expect_get("/facet/area/").return_ok(page(&[1], 1));

        let controller = CollectionController::new(CollectionConfig::new("/facet/area/"), mock.transport()).unwrap();
        controller.fetch(None).await.unwrap();

        assert_eq!(controller.go_to_next_page().await.unwrap(), FetchOutcome::Unavailable);
        assert_eq!(controller.go_to_prev_page().await.unwrap(), FetchOutcome::Unavailable);
        assert_eq!(controller.status(), LoadStatus::Loaded);
        mock.verify();
    }

    #[tokio::test]
    async fn test_invalid_server_link_is_recorded() {
        let mock = MockTransport::new();
        mock.expect_get("/facet/area/").return_ok(page(&[1], 11).with_next("http://exa mple.com/facet/area/?page=2"));

        let controller = CollectionController::new(CollectionConfig::new("/facet/area/"), mock.transport()).unwrap();
        let err = controller.fetch(None).await.unwrap_err();

        assert!(matches!(err, CollectionError::InvalidCursor { .. }));
        assert_eq!(controller.status(), LoadStatus::Errored);
        assert_eq!(controller.error().unwrap().kind, ErrorKind::InvalidCursor);
        assert!(controller.items().is_empty());
    }

    #[tokio::test]
    async fn test_caller_cursor_is_validated_before_sending() {
        let mock = MockTransport::<u32>::new();
        let controller = CollectionController::new(CollectionConfig::new("/facet/area/"), mock.transport()).unwrap();

        assert!(matches!(
            controller.fetch(Some("ftp://x/facet/area/")).await,
            Err(CollectionError::InvalidCursor { .. })
        ));
        assert!(matches!(
            controller.fetch(Some("/facet/area/?page=zero")).await,
            Err(CollectionError::MalformedCursor { .. })
        ));
        assert_eq!(controller.status(), LoadStatus::Idle);
        mock.verify();
    }

    #[tokio::test]
    async fn test_retry_after_transport_failure() {
        let mock = MockTransport::new();
        mock.expect_get("/facet/area/")
            .return_err(TransportError::Status { path: "/facet/area/".into(), status: 502 });
        mock.expect_get("/facet/area/").return_ok(page(&[5], 1));

        let controller = CollectionController::new(CollectionConfig::new("/facet/area/"), mock.transport()).unwrap();

        let err = controller.fetch(None).await.unwrap_err();
        assert!(err.is_retryable());
        let failure = controller.error().unwrap();
        assert_eq!(failure.kind, ErrorKind::TransportFailure);
        assert!(failure.retryable);

        assert_eq!(controller.retry().await.unwrap(), FetchOutcome::Applied);
        assert_eq!(controller.items(), vec![5]);
        assert_eq!(controller.error(), None);
        mock.verify();
    }

    #[tokio::test]
    async fn test_closed_controller_rejects_operations() {
        let mock = MockTransport::<u32>::new();
        let controller = CollectionController::new(CollectionConfig::new("/facet/area/"), mock.transport()).unwrap();

        controller.close();
        assert!(controller.is_closed());
        assert_eq!(controller.fetch(None).await, Err(CollectionError::Closed));
        assert_eq!(controller.apply_filters(&FilterSet::new()).await, Err(CollectionError::Closed));
        mock.verify();
    }

    #[tokio::test]
    async fn test_invalid_base_url_is_rejected() {
        let mock = MockTransport::<u32>::new();
        let result = CollectionController::new(CollectionConfig::new("http://"), mock.transport());
        assert!(matches!(result, Err(CollectionError::InvalidCursor { .. })));
    }
}
