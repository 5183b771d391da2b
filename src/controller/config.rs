//! Per-collection configuration.

use serde::{Deserialize, Serialize};

use crate::cursor::{CursorCodec, CursorStyle, UrlNormalizer, DEFAULT_PAGE_SIZE};
use crate::error::Result;
use crate::filter::{FilterCompiler, FilterRules, FilterSet};

/// Everything a screen needs to say about the collection it lists.
///
/// # Examples
///
/// ```ignore
/// let config = CollectionConfig::new("/facet/docente/")
///     .with_page_size(10)
///     .with_cursor_style(CursorStyle::Offset)
///     .with_filter_rules(FilterRules::new().with_rewrite(RewriteRule::show_all_statuses()));
/// ```
///
/// Deserializes from JSON; only `base_url` is required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Collection endpoint, absolute or relative (e.g. `/facet/area/`).
    pub base_url: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default)]
    pub cursor_style: CursorStyle,

    /// Query parameter carrying the page size on page-style endpoints.
    #[serde(default)]
    pub page_size_param: Option<String>,

    /// Path prefix stripped from every server link (e.g. `/api`).
    #[serde(default)]
    pub api_prefix: Option<String>,

    #[serde(default)]
    pub filter_rules: FilterRules,

    /// Filters in effect on first load and after `clear_filters`.
    #[serde(default)]
    pub default_filters: FilterSet,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl CollectionConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            cursor_style: CursorStyle::default(),
            page_size_param: None,
            api_prefix: None,
            filter_rules: FilterRules::default(),
            default_filters: FilterSet::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_cursor_style(mut self, style: CursorStyle) -> Self {
        self.cursor_style = style;
        self
    }

    pub fn with_page_size_param(mut self, param: impl Into<String>) -> Self {
        self.page_size_param = Some(param.into());
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = Some(prefix.into());
        self
    }

    pub fn with_filter_rules(mut self, rules: FilterRules) -> Self {
        self.filter_rules = rules;
        self
    }

    pub fn with_default_filters(mut self, filters: FilterSet) -> Self {
        self.default_filters = filters;
        self
    }

    pub fn normalizer(&self) -> UrlNormalizer {
        match &self.api_prefix {
            Some(prefix) => UrlNormalizer::with_api_prefix(prefix),
            None => UrlNormalizer::new(),
        }
    }

    /// Builds the codec this configuration describes.
    ///
    /// # Errors
    /// [`CollectionError::Config`](crate::CollectionError::Config) for an invalid page size.
    pub fn codec(&self) -> Result<CursorCodec> {
        let codec = CursorCodec::new(
            self.cursor_style,
            self.page_size,
            self.normalizer(),
            FilterCompiler::new(self.filter_rules.clone()),
        )?;
        Ok(match &self.page_size_param {
            Some(param) => codec.with_page_size_param(param),
            None => codec,
        })
    }
}
