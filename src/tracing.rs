//! # Observability & Tracing
//!
//! The crate logs through `tracing` with structured fields; it never installs a
//! subscriber on its own. Applications call [`setup_tracing`] once at startup (or
//! install their own subscriber).
//!
//! ## What Gets Traced
//!
//! - **Controller operations**: a span per `fetch`, `apply_filters`, `go_to_*`
//!   call carrying the collection's `base_url`.
//! - **Requests**: `Fetching page seq=… cursor=…` at debug level.
//! - **Results**: `Page loaded page=… total=… items=…` at info level.
//! - **Stale responses**: `Discarding stale response seq=… latest=…` at debug level.
//! - **Failures**: `Fetch failed error=… retryable=…` at warn level.
//!
//! ## Usage
//!
//! ```bash
//! # Page loads and selector lifecycle
//! RUST_LOG=info collection-probe http://127.0.0.1:8000 /facet/area/
//!
//! # Every request, including discarded ones
//! RUST_LOG=remote_collection=debug collection-probe http://127.0.0.1:8000 /facet/area/
//! ```

/// Initializes a compact, `RUST_LOG`-filtered subscriber.
///
/// # Panics
/// If a global subscriber is already installed.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
