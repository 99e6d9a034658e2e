use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::messages::{ProductsResponse, SampleItem};

pub const DEFAULT_SAMPLE_URL: &str = "https://dummyjson.com/products";

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("sample fetch failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("sample endpoint returned status {0}")]
    Status(u16),
}

/// Where task screens get the item to read or describe
#[async_trait]
pub trait SampleSource: Send + Sync {
    /// Fetch one item; Ok(None) when the source has nothing to offer
    async fn fetch_sample_item(&self) -> Result<Option<SampleItem>, SampleError>;
}

/// Sample source backed by a products listing endpoint
pub struct HttpSampleSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSampleSource {
    pub fn new(url: impl Into<String>) -> Result<Self, SampleError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SampleSource for HttpSampleSource {
    async fn fetch_sample_item(&self) -> Result<Option<SampleItem>, SampleError> {
        info!("Fetching sample item from {}", self.url);

        let response = self.client.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(SampleError::Status(response.status().as_u16()));
        }

        let listing: ProductsResponse = response.json().await?;
        let item = listing.products.into_iter().next().map(SampleItem::from);

        if let Some(item) = &item {
            info!("Sample item loaded: {}", item.title);
        }

        Ok(item)
    }
}

/// Source that always serves the same item (offline use, tests)
pub struct StaticSampleSource {
    item: Option<SampleItem>,
}

impl StaticSampleSource {
    pub fn new(item: Option<SampleItem>) -> Self {
        Self { item }
    }
}

#[async_trait]
impl SampleSource for StaticSampleSource {
    async fn fetch_sample_item(&self) -> Result<Option<SampleItem>, SampleError> {
        Ok(self.item.clone())
    }
}

/// Fetch an item, substituting the fixed fallback on any failure
pub async fn sample_or_default(source: &dyn SampleSource) -> SampleItem {
    match source.fetch_sample_item().await {
        Ok(Some(item)) => item,
        Ok(None) => {
            warn!("Sample source returned no items, using default");
            SampleItem::fallback()
        }
        Err(e) => {
            warn!("{}, using default", e);
            SampleItem::fallback()
        }
    }
}
