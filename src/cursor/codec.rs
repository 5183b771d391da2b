//! Page numbers to cursors and back.

use serde::{Deserialize, Serialize};
use url::Url;

use super::normalize::{resolve_relative, UrlNormalizer};
use crate::error::{CollectionError, Result};
use crate::filter::{FilterCompiler, FilterSet};

/// Page size used when a configuration does not set one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Largest page size the backend honours.
pub const MAX_PAGE_SIZE: u32 = 100;

/// How a target page is expressed on the wire.
///
/// The two styles are not interchangeable against one endpoint, so a controller
/// is configured with exactly one of them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorStyle {
    /// `?page=n` (Django REST `PageNumberPagination`).
    #[default]
    Page,
    /// `?limit=size&offset=(n-1)*size` (Django REST `LimitOffsetPagination`).
    Offset,
}

/// Encodes target pages into cursors and derives page numbers from cursors.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorCodec {
    style: CursorStyle,
    page_size: u32,
    page_size_param: Option<String>,
    normalizer: UrlNormalizer,
    compiler: FilterCompiler,
}

impl CursorCodec {
    /// # Errors
    /// [`CollectionError::Config`] when `page_size` is outside `1..=MAX_PAGE_SIZE`.
    pub fn new(
        style: CursorStyle,
        page_size: u32,
        normalizer: UrlNormalizer,
        compiler: FilterCompiler,
    ) -> Result<Self> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(CollectionError::Config(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        Ok(Self {
            style,
            page_size,
            page_size_param: None,
            normalizer,
            compiler,
        })
    }

    /// Sends the page size under `param` on page-style cursors (e.g. `page_size`).
    pub fn with_page_size_param(mut self, param: impl Into<String>) -> Self {
        self.page_size_param = Some(param.into());
        self
    }

    pub fn style(&self) -> CursorStyle {
        self.style
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn normalizer(&self) -> &UrlNormalizer {
        &self.normalizer
    }

    pub fn compiler(&self) -> &FilterCompiler {
        &self.compiler
    }

    /// `ceil(total_count / page_size)`; zero for an empty collection.
    pub fn total_pages(&self, total_count: u64) -> u32 {
        let pages = total_count.div_ceil(u64::from(self.page_size));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Derives the 1-based page a cursor points at.
    ///
    /// An explicit `page` parameter wins. Otherwise the page is
    /// `offset / limit + 1`, with `limit` defaulting to the configured page size
    /// and `offset` to zero, so a bare collection URL is page 1.
    ///
    /// # Errors
    /// [`CollectionError::InvalidCursor`] if the cursor does not parse,
    /// [`CollectionError::MalformedCursor`] if a pagination parameter is not a
    /// valid number (`page` and `limit` must be at least 1).
    pub fn page_from_cursor(&self, cursor: &str) -> Result<u32> {
        let url = parse_cursor(cursor)?;

        let mut page = None;
        let mut offset = None;
        let mut limit = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "page" => page = Some(value.into_owned()),
                "offset" => offset = Some(value.into_owned()),
                "limit" => limit = Some(value.into_owned()),
                _ => {}
            }
        }

        if let Some(page) = page {
            return match page.parse::<u32>() {
                Ok(n) if n >= 1 => Ok(n),
                _ => Err(CollectionError::malformed_cursor(cursor, format!("invalid page '{page}'"))),
            };
        }

        let limit = match limit {
            Some(raw) => match raw.parse::<u64>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(CollectionError::malformed_cursor(cursor, format!("invalid limit '{raw}'"))),
            },
            None => u64::from(self.page_size),
        };
        let offset = match offset {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| CollectionError::malformed_cursor(cursor, format!("invalid offset '{raw}'")))?,
            None => 0,
        };

        u32::try_from(offset / limit + 1)
            .map_err(|_| CollectionError::malformed_cursor(cursor, "page number overflows"))
    }

    /// Builds the cursor for `page` of `base` filtered by `filters`.
    ///
    /// Parameter order is fixed: query parameters already on `base`, compiled
    /// filters, then pagination. Pagination parameters already on `base`, and
    /// filters that compile to a pagination parameter, are dropped. With `page == None` only the page size is sent.
    ///
    /// # Errors
    /// [`CollectionError::InvalidCursor`] if `base` is not a valid URL,
    /// [`CollectionError::MalformedCursor`] for `page == Some(0)`.
    pub fn cursor_for_page(&self, base: &str, filters: &FilterSet, page: Option<u32>) -> Result<String> {
        if page == Some(0) {
            return Err(CollectionError::malformed_cursor(base, "page numbers start at 1"));
        }

        let base_path = self.normalizer.normalize(base)?;
        let mut url = resolve_relative(&base_path).map_err(|e| CollectionError::invalid_cursor(base, e.to_string()))?;

        let retained: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(key, _)| !self.is_pagination_key(key))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        url.set_query(None);

        {
            let mut query = url.query_pairs_mut();
            query.extend_pairs(retained);
            query.extend_pairs(
                self.compiler
                    .compile(filters)
                    .into_iter()
                    .filter(|(key, _)| !self.is_pagination_key(key)),
            );

            let size = self.page_size.to_string();
            match self.style {
                CursorStyle::Page => {
                    if let Some(n) = page {
                        query.append_pair("page", &n.to_string());
                    }
                    if let Some(param) = &self.page_size_param {
                        query.append_pair(param, &size);
                    }
                }
                CursorStyle::Offset => {
                    query.append_pair("limit", &size);
                    if let Some(n) = page {
                        let offset = u64::from(n - 1) * u64::from(self.page_size);
                        query.append_pair("offset", &offset.to_string());
                    }
                }
            }
        }

        Ok(relative_form(&url))
    }

    fn is_pagination_key(&self, key: &str) -> bool {
        matches!(key, "page" | "offset" | "limit") || self.page_size_param.as_deref() == Some(key)
    }
}

fn parse_cursor(cursor: &str) -> Result<Url> {
    match Url::parse(cursor) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            resolve_relative(cursor).map_err(|e| CollectionError::invalid_cursor(cursor, e.to_string()))
        }
        Err(e) => Err(CollectionError::invalid_cursor(cursor, e.to_string())),
    }
}

fn relative_form(url: &Url) -> String {
    match url.query() {
        Some(query) if !query.is_empty() => format!("{}?{}", url.path(), query),
        _ => url.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterRules, RewriteRule};

    fn codec(style: CursorStyle) -> CursorCodec {
        let rules = FilterRules::new().with_rewrite(RewriteRule::show_all_statuses());
        CursorCodec::new(style, 10, UrlNormalizer::new(), FilterCompiler::new(rules)).unwrap()
    }

    #[test]
    fn test_page_from_offset_cursor() {
        let codec = codec(CursorStyle::Offset);
        assert_eq!(codec.page_from_cursor("/facet/x/?offset=20&limit=10").unwrap(), 3);
        assert_eq!(codec.page_from_cursor("/facet/x/?offset=25&limit=10").unwrap(), 3);
        assert_eq!(codec.page_from_cursor("/facet/x/?offset=30").unwrap(), 4);
        assert_eq!(codec.page_from_cursor("/facet/x/").unwrap(), 1);
    }

    #[test]
    fn test_explicit_page_takes_precedence() {
        let codec = codec(CursorStyle::Offset);
        assert_eq!(codec.page_from_cursor("/facet/x/?page=7&offset=0&limit=10").unwrap(), 7);
        assert_eq!(
            codec.page_from_cursor("http://127.0.0.1:8000/facet/x/?page=2").unwrap(),
            2
        );
    }

    #[test]
    fn test_malformed_pagination_parameters() {
        let codec = codec(CursorStyle::Page);
        for bad in ["/x/?page=0", "/x/?page=abc", "/x/?limit=0", "/x/?offset=-10", "/x/?offset=1.5"] {
            let err = codec.page_from_cursor(bad).unwrap_err();
            assert!(matches!(err, CollectionError::MalformedCursor { .. }), "{bad}: {err:?}");
        }
    }

    #[test]
    fn test_cursor_for_page_page_style() {
        let codec = codec(CursorStyle::Page);
        let filters = FilterSet::new().with("nombre__icontains", "Juan").with("estado", "todos");

        assert_eq!(
            codec.cursor_for_page("/facet/docente/", &filters, Some(3)).unwrap(),
            "/facet/docente/?show_all=true&nombre__icontains=Juan&page=3"
        );
        assert_eq!(codec.cursor_for_page("/facet/docente/", &FilterSet::new(), None).unwrap(), "/facet/docente/");
    }

    #[test]
    fn test_cursor_for_page_offset_style() {
        let codec = codec(CursorStyle::Offset);
        assert_eq!(
            codec.cursor_for_page("/facet/area/", &FilterSet::new(), Some(4)).unwrap(),
            "/facet/area/?limit=10&offset=30"
        );
    }

    #[test]
    fn test_cursor_for_page_replaces_existing_pagination() {
        let codec = codec(CursorStyle::Page).with_page_size_param("page_size");
        let cursor = codec
            .cursor_for_page("http://host/facet/area/?page=9&page_size=50&activo=true", &FilterSet::new(), Some(2))
            .unwrap();
        assert_eq!(cursor, "/facet/area/?activo=true&page=2&page_size=10");
    }

    #[test]
    fn test_pagination_keys_in_filters_are_dropped() {
        let filters = FilterSet::new().with("page", "7").with("offset", "40").with("nombre", "Ana");

        let cursor = codec(CursorStyle::Page).cursor_for_page("/facet/area/", &filters, Some(2)).unwrap();
        assert_eq!(cursor, "/facet/area/?nombre=Ana&page=2");

        let cursor = codec(CursorStyle::Offset).cursor_for_page("/facet/area/", &filters, Some(2)).unwrap();
        assert_eq!(cursor, "/facet/area/?nombre=Ana&limit=10&offset=10");
    }

    #[test]
    fn test_cursor_round_trip() {
        let filters = FilterSet::new().with("nombre", "Ana María").with("estado", "todos").with("dni", "");
        for style in [CursorStyle::Page, CursorStyle::Offset] {
            let codec = codec(style);
            for page in [1, 2, 3, 17, 250] {
                let cursor = codec.cursor_for_page("/facet/persona/", &filters, Some(page)).unwrap();
                assert_eq!(codec.page_from_cursor(&cursor).unwrap(), page, "{style:?} {cursor}");
            }
        }
    }

    #[test]
    fn test_page_zero_and_bad_sizes_are_rejected() {
        let codec = codec(CursorStyle::Page);
        assert!(matches!(
            codec.cursor_for_page("/facet/area/", &FilterSet::new(), Some(0)),
            Err(CollectionError::MalformedCursor { .. })
        ));

        for size in [0, MAX_PAGE_SIZE + 1] {
            let result = CursorCodec::new(CursorStyle::Page, size, UrlNormalizer::new(), FilterCompiler::default());
            assert!(matches!(result, Err(CollectionError::Config(_))));
        }
    }

    #[test]
    fn test_total_pages() {
        let codec = codec(CursorStyle::Page);
        assert_eq!(codec.total_pages(0), 0);
        assert_eq!(codec.total_pages(1), 1);
        assert_eq!(codec.total_pages(10), 1);
        assert_eq!(codec.total_pages(11), 2);
    }
}
