//! # Mock Transport
//!
//! Utilities for testing controllers and selectors without a server.
//!
//! Two styles are available:
//!
//! - [`create_mock_transport`] + [`expect_fetch`]: every request arrives on a
//!   channel you hold, together with its responder. You decide *when* each
//!   response lands, which is how out-of-order (stale) responses are simulated.
//! - [`MockTransport`]: a fluent, scripted transport that answers queued
//!   expectations in order and checks the requested paths.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use super::{PageResult, PageTransport, TransportError};

/// Response channel handed to whoever answers a [`FetchRequest`].
pub type Responder<T> = oneshot::Sender<Result<PageResult<T>, TransportError>>;

/// A page request captured by a [`ChannelTransport`].
#[derive(Debug)]
pub struct FetchRequest<T> {
    pub path: String,
    pub respond_to: Responder<T>,
}

/// Transport that forwards every request over an `mpsc` channel.
pub struct ChannelTransport<T> {
    sender: mpsc::Sender<FetchRequest<T>>,
}

impl<T> Clone for ChannelTransport<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<T> ChannelTransport<T> {
    pub fn new(sender: mpsc::Sender<FetchRequest<T>>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl<T: Send + 'static> PageTransport<T> for ChannelTransport<T> {
    async fn get_page(&self, path: &str) -> Result<PageResult<T>, TransportError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(FetchRequest {
                path: path.to_string(),
                respond_to,
            })
            .await
            .map_err(|_| TransportError::Closed)?;
        response.await.map_err(|_| TransportError::Dropped)?
    }
}

/// Creates a channel transport and the receiver its requests arrive on.
pub fn create_mock_transport<T>(buffer_size: usize) -> (ChannelTransport<T>, mpsc::Receiver<FetchRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ChannelTransport::new(sender), receiver)
}

/// Waits for the next request; returns its path and responder.
pub async fn expect_fetch<T>(receiver: &mut mpsc::Receiver<FetchRequest<T>>) -> Option<(String, Responder<T>)> {
    receiver
        .recv()
        .await
        .map(|FetchRequest { path, respond_to }| (path, respond_to))
}

struct Expectation<T> {
    path: String,
    response: Result<PageResult<T>, TransportError>,
}

/// A scripted transport with expectation tracking.
///
/// # Example
/// ```ignore
/// let mock = MockTransport::<Area>::new();
/// mock.expect_get("/facet/area/").return_ok(PageResult::new(areas, 2));
///
/// let controller = CollectionController::new(config, mock.transport())?;
/// controller.fetch(None).await?;
/// mock.verify();
/// ```
pub struct MockTransport<T> {
    transport: ChannelTransport<T>,
    expectations: Arc<Mutex<VecDeque<Expectation<T>>>>,
    mismatches: Arc<Mutex<Vec<String>>>,
    _handle: tokio::task::JoinHandle<()>,
}

impl<T: Send + 'static> MockTransport<T> {
    /// Creates a mock with no expectations. Must be called inside a Tokio runtime.
    pub fn new() -> Self {
        let (transport, mut receiver) = create_mock_transport::<T>(100);
        let expectations: Arc<Mutex<VecDeque<Expectation<T>>>> = Arc::new(Mutex::new(VecDeque::new()));
        let mismatches = Arc::new(Mutex::new(Vec::new()));

        let pending = expectations.clone();
        let failures = mismatches.clone();
        let handle = tokio::spawn(async move {
            while let Some(FetchRequest { path, respond_to }) = receiver.recv().await {
                let expectation = pending.lock().expect("mock expectations poisoned").pop_front();
                let response = match expectation {
                    Some(exp) if exp.path == path => exp.response,
                    Some(exp) => {
                        failures
                            .lock()
                            .expect("mock mismatches poisoned")
                            .push(format!("expected GET {}, got GET {}", exp.path, path));
                        Err(TransportError::Status { path, status: 404 })
                    }
                    None => {
                        failures
                            .lock()
                            .expect("mock mismatches poisoned")
                            .push(format!("unexpected GET {path}"));
                        Err(TransportError::Status { path, status: 404 })
                    }
                };
                let _ = respond_to.send(response);
            }
        });

        Self {
            transport,
            expectations,
            mismatches,
            _handle: handle,
        }
    }

    /// The transport to hand to the code under test.
    pub fn transport(&self) -> Arc<dyn PageTransport<T>> {
        Arc::new(self.transport.clone())
    }

    /// Expects a request for exactly `path`.
    pub fn expect_get(&self, path: impl Into<String>) -> FetchExpectationBuilder<T> {
        FetchExpectationBuilder {
            path: path.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Panics if any request mismatched or any expectation is left over.
    pub fn verify(&self) {
        let mismatches = self.mismatches.lock().expect("mock mismatches poisoned");
        if !mismatches.is_empty() {
            panic!("Unexpected requests: {mismatches:?}");
        }
        let remaining = self.expectations.lock().expect("mock expectations poisoned");
        if !remaining.is_empty() {
            let paths: Vec<_> = remaining.iter().map(|e| e.path.as_str()).collect();
            panic!("Not all expectations were met. Remaining: {paths:?}");
        }
    }
}

impl<T: Send + 'static> Default for MockTransport<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a single [`MockTransport`] expectation.
pub struct FetchExpectationBuilder<T> {
    path: String,
    expectations: Arc<Mutex<VecDeque<Expectation<T>>>>,
}

impl<T> FetchExpectationBuilder<T> {
    pub fn return_ok(self, page: PageResult<T>) {
        self.push(Ok(page));
    }

    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<PageResult<T>, TransportError>) {
        self.expectations
            .lock()
            .expect("mock expectations poisoned")
            .push_back(Expectation {
                path: self.path,
                response,
            });
    }
}
