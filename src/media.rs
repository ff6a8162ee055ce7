//! Media (uploaded asset) storage
use crate::{error::FontPickerError, utils};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// A stored media asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaContract {
    /// Storage key, used to reference the asset from the style document.
    pub key: String,

    /// Original file name.
    pub file_name: String,

    pub mime_type: String,
}

/// Stores uploaded assets.
#[async_trait::async_trait]
pub trait MediaService: Send + Sync {
    async fn create_media(
        &self,
        name: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<MediaContract, FontPickerError>;
}

/// A [`MediaService`] keeping each asset as a file in a directory.
///
/// The asset is saved as `<key>` next to a `<key>.json` holding its [`MediaContract`].
#[derive(Debug, Clone)]
pub struct DirectoryMediaStore {
    root: PathBuf,
}

impl DirectoryMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait::async_trait]
impl MediaService for DirectoryMediaStore {
    async fn create_media(
        &self,
        name: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<MediaContract, FontPickerError> {
        fs::create_dir_all(&self.root).await?;
        let contract = MediaContract {
            key: format!("uploads/{}", utils::new_identifier()),
            file_name: name.to_string(),
            mime_type: content_type.to_string(),
        };
        let file_stem = contract.key.trim_start_matches("uploads/");
        fs::write(self.root.join(file_stem), content).await?;
        fs::write(
            self.root.join(format!("{file_stem}.json")),
            serde_json::to_vec_pretty(&contract)?,
        )
        .await?;
        debug!(
            "stored {name:?} ({content_type}, {} bytes) as {}",
            content.len(),
            contract.key
        );
        Ok(contract)
    }
}
