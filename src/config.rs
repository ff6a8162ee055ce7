//! Facilities for reading runtime configuration values
use crate::error::FontPickerError;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::trace;

/// Default remote font catalog.
pub const DEFAULT_CATALOG_ENDPOINT: &str = "https://www.googleapis.com/webfonts/v1/webfonts";

/// Font picker configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// The remote font catalog URL.
    #[serde(default = "Config::default_catalog_endpoint")]
    pub catalog_endpoint: String,

    /// The access key appended to catalog requests.
    ///
    /// There is no built-in key: it must come from the config file or from the environment.
    pub catalog_api_key: Option<String>,

    /// Number of fonts appended to the visible list by each page load.
    #[serde(default = "Config::default_page_size")]
    pub page_size: usize,

    /// The quiet period in milliseconds which must pass after the last search pattern change
    /// before the list is reloaded.
    #[serde(default = "Config::default_search_debounce_msec")]
    pub search_debounce_msec: u64,

    /// The path to the JSON style document.
    #[serde(default = "Config::default_styles_path")]
    pub styles_path: String,

    /// The directory where uploaded font assets are stored.
    #[serde(default = "Config::default_media_path")]
    pub media_path: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("catalog_endpoint", &self.catalog_endpoint)
            .field(
                "catalog_api_key",
                &self.catalog_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("page_size", &self.page_size)
            .field("search_debounce_msec", &self.search_debounce_msec)
            .field("styles_path", &self.styles_path)
            .field("media_path", &self.media_path)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_endpoint: Self::default_catalog_endpoint(),
            catalog_api_key: None,
            page_size: Self::default_page_size(),
            search_debounce_msec: Self::default_search_debounce_msec(),
            styles_path: Self::default_styles_path(),
            media_path: Self::default_media_path(),
        }
    }
}

impl Config {
    /// Constructs `Config` from a `toml` file and environment variables
    pub fn new() -> Result<Self, FontPickerError> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("fontpicker.toml"))
                .merge(Env::prefixed("FONTPICKER__").split("__")),
        )
    }

    /// Extracts and validates `Config` from the given provider stack
    pub fn from_figment(figment: Figment) -> Result<Self, FontPickerError> {
        let config: Self = figment.extract()?;

        macro_rules! check_lower_bound {
            ($parent:ident.$var:ident, $limit:expr) => {
                if $parent.$var < $limit {
                    Err(FontPickerError::ConfigParameterValue {
                        parameter: stringify!($var),
                        message: format!(
                            "parameter value should be equal or larger than {}",
                            $limit
                        ),
                    })?
                }
            };
        }
        check_lower_bound!(config.page_size, 1);
        check_lower_bound!(config.search_debounce_msec, 1);

        if config.catalog_api_key.as_deref() == Some("") {
            Err(FontPickerError::ConfigParameterValue {
                parameter: "catalog_api_key",
                message: "parameter value should not be empty".into(),
            })?
        }

        trace!("final config: {config:#?}");

        Ok(config)
    }

    /// Returns the search debounce interval
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_msec)
    }

    fn default_catalog_endpoint() -> String {
        DEFAULT_CATALOG_ENDPOINT.into()
    }

    fn default_page_size() -> usize {
        50
    }

    fn default_search_debounce_msec() -> u64 {
        500
    }

    fn default_styles_path() -> String {
        "styles.json".into()
    }

    fn default_media_path() -> String {
        "media".into()
    }
}
