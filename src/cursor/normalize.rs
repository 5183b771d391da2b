//! Conversion of server-supplied pagination links into relative request paths.

use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

use crate::error::{CollectionError, Result};

/// Placeholder origin used to resolve relative paths. Never sent on the wire.
const RESOLVE_BASE: &str = "http://collection.invalid/";

/// Turns pagination links into canonical paths relative to the calling origin.
///
/// Absolute links lose their scheme, host, port and fragment. Relative links get
/// exactly one leading slash. When an API prefix is configured (for example
/// `/api` for deployments mounted behind a reverse proxy) it is stripped, so
/// the result can be handed to a transport that adds its own mount point.
///
/// `normalize` is idempotent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlNormalizer {
    api_prefix: Option<String>,
}

impl UrlNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer that also strips `prefix` (e.g. `"/api"` or `"api/"`).
    pub fn with_api_prefix(prefix: impl AsRef<str>) -> Self {
        let trimmed = prefix.as_ref().trim_matches('/');
        let api_prefix = (!trimmed.is_empty()).then(|| format!("/{trimmed}"));
        Self { api_prefix }
    }

    pub fn api_prefix(&self) -> Option<&str> {
        self.api_prefix.as_deref()
    }

    /// Normalizes `url` into `path[?query]`.
    ///
    /// # Errors
    /// [`CollectionError::InvalidCursor`] for empty input, non-HTTP schemes, or
    /// anything the URL parser rejects.
    pub fn normalize(&self, url: &str) -> Result<String> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(CollectionError::invalid_cursor(url, "empty cursor"));
        }

        let parsed = match Url::parse(trimmed) {
            Ok(absolute) => {
                if !matches!(absolute.scheme(), "http" | "https") {
                    return Err(CollectionError::invalid_cursor(
                        url,
                        format!("unsupported scheme '{}'", absolute.scheme()),
                    ));
                }
                absolute
            }
            Err(ParseError::RelativeUrlWithoutBase) => {
                let rooted = format!("/{}", trimmed.trim_start_matches('/'));
                resolve_relative(&rooted).map_err(|e| CollectionError::invalid_cursor(url, e.to_string()))?
            }
            Err(e) => return Err(CollectionError::invalid_cursor(url, e.to_string())),
        };

        let path = canonical_path(parsed.path(), self.api_prefix.as_deref());

        Ok(match parsed.query() {
            Some(query) if !query.is_empty() => format!("{path}?{query}"),
            _ => path,
        })
    }
}

/// Resolves a rooted relative path against the placeholder origin.
pub(crate) fn resolve_relative(path: &str) -> std::result::Result<Url, ParseError> {
    Url::parse(RESOLVE_BASE)?.join(path)
}

/// Reduces `path` to a single leading slash with every leading `prefix` segment
/// removed (`/api/api/x`, `/api//x` and `//x` all become `/x`).
///
/// A result starting with `//` would be read as a host by anything joining it.
fn canonical_path(path: &str, prefix: Option<&str>) -> String {
    let mut rest = path.trim_start_matches('/');
    if let Some(prefix) = prefix.map(|p| p.trim_matches('/')).filter(|p| !p.is_empty()) {
        loop {
            match rest.strip_prefix(prefix) {
                Some("") => rest = "",
                Some(tail) if tail.starts_with('/') => rest = tail.trim_start_matches('/'),
                _ => break,
            }
        }
    }
    format!("/{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_url_keeps_path_and_query() {
        let normalizer = UrlNormalizer::new();
        let out = normalizer
            .normalize("http://api.example.org/facet/area/?offset=20&limit=10")
            .unwrap();
        assert_eq!(out, "/facet/area/?offset=20&limit=10");
    }

    #[test]
    fn test_absolute_url_drops_port_and_fragment() {
        let normalizer = UrlNormalizer::new();
        let out = normalizer
            .normalize("https://127.0.0.1:8000/facet/docente/?page=2#top")
            .unwrap();
        assert_eq!(out, "/facet/docente/?page=2");
    }

    #[test]
    fn test_relative_url_collapses_leading_slashes() {
        let normalizer = UrlNormalizer::new();
        assert_eq!(normalizer.normalize("///facet/area/").unwrap(), "/facet/area/");
        assert_eq!(normalizer.normalize("facet/area/?page=3").unwrap(), "/facet/area/?page=3");
    }

    #[test]
    fn test_api_prefix_is_stripped() {
        let normalizer = UrlNormalizer::with_api_prefix("api/");
        assert_eq!(normalizer.api_prefix(), Some("/api"));
        assert_eq!(
            normalizer.normalize("https://docentes.example.org/api/facet/area/?page=2").unwrap(),
            "/facet/area/?page=2"
        );
        assert_eq!(normalizer.normalize("/api/api/facet/area/").unwrap(), "/facet/area/");
        assert_eq!(normalizer.normalize("/api").unwrap(), "/");
        assert_eq!(normalizer.normalize("/api//facet/area/").unwrap(), "/facet/area/");
        assert_eq!(normalizer.normalize("/api//api/facet/area/").unwrap(), "/facet/area/");
        // Only whole segments are stripped.
        assert_eq!(normalizer.normalize("/apiary/").unwrap(), "/apiary/");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "http://api.example.org/facet/area/?offset=20&limit=10",
            "https://host:9000/api/api/facet/persona/?nombre__icontains=Juan%20P",
            "//facet/resolucion/?page=4",
            "facet/jefe/",
            "/facet/area/?",
            "/facet/a b/../carrera/",
            "http://api.example.org//evil.example/facet/area/?page=2",
            "/api//facet/area/",
            "/api//api/facet/area/",
        ];
        for normalizer in [UrlNormalizer::new(), UrlNormalizer::with_api_prefix("/api")] {
            for sample in samples {
                let once = normalizer.normalize(sample).unwrap();
                let twice = normalizer.normalize(&once).unwrap();
                assert_eq!(once, twice, "not idempotent for {sample}");
            }
        }
    }

    #[test]
    fn test_doubled_slashes_never_yield_a_host() {
        let normalizer = UrlNormalizer::new();
        let out = normalizer
            .normalize("http://api.example.org//evil.example/facet/area/?page=2")
            .unwrap();
        assert_eq!(out, "/evil.example/facet/area/?page=2");

        let joined = Url::parse("https://docentes.example.org/").unwrap().join(&out).unwrap();
        assert_eq!(joined.host_str(), Some("docentes.example.org"));
    }

    #[test]
    fn test_invalid_urls_are_rejected() {
        let normalizer = UrlNormalizer::new();
        for bad in ["", "   ", "http://", "http://exa mple.com/x", "ftp://files.example.org/x", "mailto:someone"] {
            let err = normalizer.normalize(bad).unwrap_err();
            assert!(
                matches!(err, CollectionError::InvalidCursor { .. }),
                "expected InvalidCursor for {bad:?}, got {err:?}"
            );
        }
    }
}
