//! # Generic Selector
//!
//! List-and-pick on top of a [`CollectionController`]: browse a remote
//! collection, filter it, and hand exactly one chosen record back to the caller.
//! Used wherever a form links to another record (an area, a lecturer, a
//! resolution, a person).
//!
//! Every [`Selector::open`] builds a brand-new controller, so filters and page
//! positions from an earlier session can never leak into the next one. Closing
//! a session (by [`select`](Selector::select), [`cancel`](Selector::cancel),
//! re-opening, or dropping the selector) closes its controller, which drops any
//! response still in flight.

use std::sync::Arc;

use tracing::{debug, info};

use crate::controller::{CollectionConfig, CollectionController, CollectionView, FetchOutcome};
use crate::error::{CollectionError, Result};
use crate::transport::PageTransport;

/// Callback receiving the committed item.
pub type OnSelect<T> = Box<dyn FnOnce(T) + Send>;

struct Session<T> {
    controller: CollectionController<T>,
    on_select: OnSelect<T>,
}

/// A reusable list-and-pick surface.
pub struct Selector<T> {
    transport: Arc<dyn PageTransport<T>>,
    session: Option<Session<T>>,
}

impl<T> Selector<T> {
    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// The open session's controller, for filtering and paging.
    pub fn controller(&self) -> Option<&CollectionController<T>> {
        self.session.as_ref().map(|s| &s.controller)
    }

    /// Closes the open session without committing anything.
    ///
    /// # Errors
    /// [`CollectionError::SelectorClosed`] if no session is open.
    pub fn cancel(&mut self) -> Result<()> {
        let session = self.session.take().ok_or(CollectionError::SelectorClosed)?;
        session.controller.close();
        info!(base_url = %session.controller.config().base_url, "Selection cancelled");
        Ok(())
    }
}

impl<T: Clone + Send + 'static> Selector<T> {
    pub fn new(transport: Arc<dyn PageTransport<T>>) -> Self {
        Self {
            transport,
            session: None,
        }
    }

    /// Starts a session on a fresh controller and loads its first page.
    ///
    /// A session that is already open is cancelled first. The session stays
    /// open even if the first load fails, so the caller can retry.
    pub async fn open<F>(&mut self, config: CollectionConfig, on_select: F) -> Result<FetchOutcome>
    where
        F: FnOnce(T) + Send + 'static,
    {
        if let Some(previous) = self.session.take() {
            debug!("Replacing open selection session");
            previous.controller.close();
        }

        let controller = CollectionController::new(config, self.transport.clone())?;
        info!(base_url = %controller.config().base_url, "Selection opened");
        self.session = Some(Session {
            controller: controller.clone(),
            on_select: Box::new(on_select),
        });
        controller.fetch(None).await
    }

    /// Read-only state of the open session.
    pub fn view(&self) -> Option<CollectionView<T>> {
        self.controller().map(CollectionController::view)
    }

    /// Commits `item` to the caller and closes the session.
    ///
    /// # Errors
    /// [`CollectionError::SelectorClosed`] if no session is open.
    pub fn select(&mut self, item: T) -> Result<()> {
        let Session { controller, on_select } = self.session.take().ok_or(CollectionError::SelectorClosed)?;
        controller.close();
        info!(base_url = %controller.config().base_url, "Item selected");
        on_select(item);
        Ok(())
    }
}

impl<T> Drop for Selector<T> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.controller.close();
        }
    }
}
