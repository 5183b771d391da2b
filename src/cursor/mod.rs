//! Cursor handling: normalizing server links and mapping pages to cursors.
//!
//! A cursor is a relative request path with a query string, e.g.
//! `/facet/area/?offset=20&limit=10`. Both halves of this module are pure.

pub mod codec;
pub mod normalize;

pub use codec::*;
pub use normalize::UrlNormalizer;
