//! Collection state and the read-only view handed to rendering layers.

use serde::Serialize;

use crate::error::FetchFailure;
use crate::filter::FilterSet;

/// Where the controller is in its fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Errored,
}

/// What happened to a dispatched operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response landed and is now the visible page.
    Applied,
    /// A newer request was issued (or the controller closed) before this one
    /// completed; its response was dropped.
    Superseded,
    /// There is no page in the requested direction. Nothing was fetched.
    Unavailable,
}

/// State owned by one controller. Only controller operations touch it.
#[derive(Debug)]
pub(crate) struct CollectionState<T> {
    pub(crate) items: Vec<T>,
    pub(crate) total_count: u64,
    pub(crate) next: Option<String>,
    pub(crate) previous: Option<String>,
    /// Cursor of the latest issued request; what `fetch(None)` re-issues.
    pub(crate) cursor: String,
    /// Filters the visible items were loaded with.
    pub(crate) filters: FilterSet,
    /// Filters the latest issued cursor was built from; become `filters` when it lands.
    pub(crate) pending_filters: FilterSet,
    /// Displayed page number, updated optimistically on navigation.
    pub(crate) current_page: u32,
    /// Page number of the visible items; the rollback target.
    pub(crate) loaded_page: u32,
    pub(crate) status: LoadStatus,
    pub(crate) error: Option<FetchFailure>,
    pub(crate) latest_seq: u64,
    pub(crate) closed: bool,
}

impl<T> CollectionState<T> {
    pub(crate) fn new(cursor: String, filters: FilterSet) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            next: None,
            previous: None,
            cursor,
            pending_filters: filters.clone(),
            filters,
            current_page: 1,
            loaded_page: 1,
            status: LoadStatus::Idle,
            error: None,
            latest_seq: 0,
            closed: false,
        }
    }
}

/// Snapshot of a controller, for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionView<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub current_page: u32,
    pub total_pages: u32,
    pub is_loading: bool,
    pub error: Option<FetchFailure>,
    pub has_next: bool,
    pub has_previous: bool,
    pub status: LoadStatus,
    pub filters: FilterSet,
}
