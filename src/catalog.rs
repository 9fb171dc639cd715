//! Catalog client: fetches category names and per-category product lists from a REST catalog.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::CatalogConfig;
use crate::model::{Category, Product};

/// Characters left unescaped in a path segment (RFC 3986 unreserved set).
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Network or parse failure on either catalog call.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not read response body: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected response shape: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("catalog source panicked: {0}")]
    Panicked(String),
}

/// Run a catalog call on a worker, turning a panic in the source into [`FetchError::Panicked`]
/// so the caller always gets a result to post back.
pub fn guarded<T>(call: impl FnOnce() -> Result<T, FetchError>) -> Result<T, FetchError> {
    panic::catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(FetchError::Panicked(message))
    })
}

/// Source of categories and products. Implementations are called from worker threads.
pub trait CatalogSource: Send + Sync {
    fn categories(&self) -> Result<Vec<Category>, FetchError>;
    fn products(&self, category: &Category) -> Result<Vec<Product>, FetchError>;
}

/// Blocking HTTP catalog client.
pub struct HttpCatalog {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpCatalog {
    pub fn new(config: &CatalogConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();
        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn categories_url(&self) -> String {
        format!("{}/products/categories", self.base_url)
    }

    pub fn products_url(&self, category: &Category) -> String {
        format!(
            "{}/products/category/{}",
            self.base_url,
            utf8_percent_encode(category.path_segment(), PATH_SEGMENT)
        )
    }

    fn get(&self, url: &str) -> Result<String, FetchError> {
        debug!(url, "GET");
        match self.agent.get(url).call() {
            Ok(response) => Ok(response.into_string()?),
            Err(ureq::Error::Status(status, _)) => Err(FetchError::Status {
                url: url.to_string(),
                status,
            }),
            Err(ureq::Error::Transport(t)) => Err(FetchError::Transport {
                url: url.to_string(),
                message: t.to_string(),
            }),
        }
    }
}

impl CatalogSource for HttpCatalog {
    fn categories(&self) -> Result<Vec<Category>, FetchError> {
        let body = self.get(&self.categories_url())?;
        decode_categories(&body)
    }

    fn products(&self, category: &Category) -> Result<Vec<Product>, FetchError> {
        let body = self.get(&self.products_url(category))?;
        decode_products(&body)
    }
}

/// The category endpoint has served both bare names and `{slug, name, url}` records.
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryEntry {
    Name(String),
    Record { slug: String, name: String },
}

impl From<CategoryEntry> for Category {
    fn from(entry: CategoryEntry) -> Self {
        match entry {
            CategoryEntry::Name(name) => Category::new(name),
            CategoryEntry::Record { slug, name } => Category::new(name).with_slug(slug),
        }
    }
}

#[derive(Deserialize)]
struct ProductPage {
    products: Vec<Product>,
}

/// Decode the category list body. Order is preserved.
pub fn decode_categories(body: &str) -> Result<Vec<Category>, FetchError> {
    let entries: Vec<CategoryEntry> = serde_json::from_str(body)?;
    Ok(entries.into_iter().map(Category::from).collect())
}

/// Decode a product page body. A single malformed record fails the whole page.
pub fn decode_products(body: &str) -> Result<Vec<Product>, FetchError> {
    let page: ProductPage = serde_json::from_str(body)?;
    Ok(page.products)
}
