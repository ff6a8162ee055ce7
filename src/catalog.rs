//! Remote font catalog
use crate::{
    config::Config,
    error::FontPickerError,
    transport::{HttpMethod, HttpRequest, Transport},
};
use serde::Deserialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, trace};
use url::Url;

/// One font family as listed by the catalog.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    /// Family name.
    pub family: String,

    /// Variant names, like `regular`, `italic`, `700` or `700italic`.
    #[serde(default)]
    pub variants: Vec<String>,

    /// Category, like `sans-serif` or `handwriting`.
    #[serde(default)]
    pub category: Option<String>,

    /// Variant name to file URL.
    #[serde(default)]
    pub files: HashMap<String, String>,

    #[serde(default)]
    pub subsets: Vec<String>,

    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub last_modified: Option<String>,
}

/// The catalog reply body.
#[derive(Debug, Deserialize)]
pub struct CatalogResult {
    #[serde(default)]
    pub items: Vec<CatalogEntry>,
}

/// Where the catalog is fetched from.
#[derive(Clone)]
pub struct CatalogSource {
    endpoint: Url,
    api_key: String,
}

impl std::fmt::Debug for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSource")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

impl CatalogSource {
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self, FontPickerError> {
        Ok(Self {
            endpoint: Url::parse(endpoint)?,
            api_key: api_key.into(),
        })
    }

    /// Builds a source from the configured endpoint and access key
    pub fn from_config(config: &Config) -> Result<Self, FontPickerError> {
        let api_key = config
            .catalog_api_key
            .clone()
            .ok_or(FontPickerError::MissingApiKey)?;
        Self::new(&config.catalog_endpoint, api_key)
    }

    fn request(&self) -> HttpRequest {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);
        HttpRequest {
            url: url.into(),
            method: HttpMethod::Get,
        }
    }

    /// Fetches the whole catalog in a single request
    pub async fn fetch(
        &self,
        transport: &dyn Transport,
    ) -> Result<Vec<Arc<CatalogEntry>>, FontPickerError> {
        debug!("fetching font catalog from {}", self.endpoint);
        let response = transport.send(self.request()).await?;
        let result: CatalogResult = response.to_object()?;
        trace!("catalog lists {} font families", result.items.len());
        Ok(result.items.into_iter().map(Arc::new).collect())
    }
}
