#![doc(html_logo_url = "https://www.rust-lang.org/logos/rust-logo-128x128.png")]
#![doc(html_favicon_url = "https://www.rust-lang.org/favicon.ico")]
//! # Remote Collection
//!
//! > **One paginated, filterable client for every list screen.**
//!
//! This crate talks to REST list endpoints that answer with
//! `{count, next, previous, results}` and keeps the state a list view or a
//! pick-one dialog needs: the visible page, the total, the links to the
//! neighbouring pages, the active filters, and whether a request is running.
//!
//! ## 🏗️ Design
//!
//! ### One controller, many screens
//! Each screen instantiates a [`CollectionController`] from a [`CollectionConfig`]
//! (`base_url`, `page_size`, filter rules, cursor style) instead of carrying its
//! own fetch/paginate/filter code.
//!
//! ### Cursors come from the server
//! `next`/`previous` links may be absolute, may point at a different host than the
//! one the client was configured with, and may carry an `/api` prefix added by a
//! reverse proxy. [`UrlNormalizer`] turns them into relative paths; the
//! [`HttpTransport`] re-adds the deployment's origin and mount prefix.
//!
//! ### Stale responses lose
//! Every request is numbered. A response is applied only if no newer request has
//! been issued since; see [`controller`] for the details.
//!
//! ## 🗺️ Module Tour
//!
//! - [`cursor`]: URL normalization and the page ⇄ cursor codec (pure).
//! - [`filter`]: deterministic filter compilation with rewrite rules (pure).
//! - [`transport`]: the async [`PageTransport`] seam, an HTTP implementation, and mocks.
//! - [`controller`]: the stateful [`CollectionController`].
//! - [`selector`]: list-and-pick sessions on top of a fresh controller.
//! - [`tracing`](crate::tracing): subscriber setup.
//!
//! ## 🚀 Quick Start
//!
//! ```ignore
//! let transport = HttpTransport::new(HttpConfig::new("http://127.0.0.1:8000")?)?;
//! let config = CollectionConfig::new("/facet/docente/")
//!     .with_filter_rules(FilterRules::new().with_rewrite(RewriteRule::show_all_statuses()));
//! let docentes = CollectionController::<Docente>::new(config, Arc::new(transport))?;
//!
//! docentes.apply_filters(&FilterSet::new().with("nombre__icontains", "Juan")).await?;
//! docentes.go_to_next_page().await?;
//! let view = docentes.view();
//! ```
//!
//! ## 🧪 Testing
//!
//! See [`transport::mock`] for transports that let a test decide what each
//! request returns and when.

pub mod controller;
pub mod cursor;
pub mod error;
pub mod filter;
pub mod selector;
pub mod tracing;
pub mod transport;

pub use controller::{CollectionConfig, CollectionController, CollectionView, FetchOutcome, LoadStatus};
pub use cursor::{CursorCodec, CursorStyle, UrlNormalizer};
pub use error::{CollectionError, ErrorKind, FetchFailure, Result};
pub use filter::{FilterCompiler, FilterRules, FilterSet, RewriteRule};
pub use selector::Selector;
pub use transport::{HttpConfig, HttpTransport, PageResult, PageTransport, TransportError};
