//! Catalog URL handling
//!
//! The catalog is addressed through a URL template carrying a `{page}`
//! placeholder and an optional `{page_size}` placeholder. Only the harvester
//! builds page URLs; nothing else consumes the template.

use crate::state::PageNumber;
use crate::{CatalogError, CatalogResult};
use url::Url;

const PAGE_PLACEHOLDER: &str = "{page}";
const PAGE_SIZE_PLACEHOLDER: &str = "{page_size}";

/// A validated catalog URL template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogUrl {
    template: String,
    page_size: u32,
}

impl CatalogUrl {
    /// Creates a catalog URL template
    ///
    /// The template is checked by rendering page 1, which must parse as an
    /// absolute http(s) URL.
    ///
    /// # Examples
    ///
    /// ```
    /// use sku_harvester::catalog::CatalogUrl;
    ///
    /// let catalog = CatalogUrl::new("https://shop.example.com/list?p={page}&limit={page_size}", 36).unwrap();
    /// let url = catalog.page_url(3).unwrap();
    /// assert_eq!(url.as_str(), "https://shop.example.com/list?p=3&limit=36");
    /// ```
    pub fn new(template: &str, page_size: u32) -> CatalogResult<Self> {
        if !template.contains(PAGE_PLACEHOLDER) {
            return Err(CatalogError::MissingPagePlaceholder(template.to_string()));
        }

        let catalog = Self {
            template: template.to_string(),
            page_size,
        };

        let first = catalog.page_url(1)?;
        if !matches!(first.scheme(), "http" | "https") {
            return Err(CatalogError::InvalidScheme(first.scheme().to_string()));
        }

        Ok(catalog)
    }

    /// Builds the URL of one catalog page
    pub fn page_url(&self, page: PageNumber) -> CatalogResult<Url> {
        if page == 0 {
            return Err(CatalogError::InvalidPage(page));
        }

        let rendered = self
            .template
            .replace(PAGE_PLACEHOLDER, &page.to_string())
            .replace(PAGE_SIZE_PLACEHOLDER, &self.page_size.to_string());

        Url::parse(&rendered).map_err(|e| CatalogError::Parse(format!("{}: {}", rendered, e)))
    }

    /// Returns the raw template
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the page size substituted into the template
    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}
