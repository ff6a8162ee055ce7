//! Host UI collaborator: file dialogs and progress notifications
use std::{
    path::{Path, PathBuf},
    sync::Mutex,
};
use tokio::sync::watch;
#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

/// A file chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    /// File name, as shown to the user.
    pub name: String,

    /// Where to read the content from.
    pub path: PathBuf,
}

impl PickedFile {
    /// Creates a `PickedFile` named after the last component of `path`
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self { name, path }
    }
}

/// Progress of a long running operation, as reported to the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadProgress {
    InProgress,
    Completed,
    Failed(String),
}

impl UploadProgress {
    pub fn is_finished(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// The host UI.
#[async_trait::async_trait]
pub trait ViewManager: Send + Sync {
    /// Asks the user for files to upload; an empty list means the dialog was canceled
    async fn open_upload_dialog(&self) -> Vec<PickedFile>;

    /// Shows the progress of an operation, without waiting for it
    fn notify_progress(
        &self,
        progress: watch::Receiver<UploadProgress>,
        category: &str,
        message: &str,
    );
}

/// A [`ViewManager`] for non interactive use.
///
/// The "dialog" yields files queued in advance; progress goes to the log.
#[derive(Debug, Default)]
pub struct ConsoleViewManager {
    queued: Mutex<Vec<PickedFile>>,
}

impl ConsoleViewManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a file for the next upload dialog
    pub fn queue_file(&self, path: &Path) {
        let mut queued = match self.queued.lock() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        queued.push(PickedFile::from_path(path));
    }
}

#[async_trait::async_trait]
impl ViewManager for ConsoleViewManager {
    async fn open_upload_dialog(&self) -> Vec<PickedFile> {
        let mut queued = match self.queued.lock() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::take(&mut *queued)
    }

    fn notify_progress(
        &self,
        mut progress: watch::Receiver<UploadProgress>,
        category: &str,
        message: &str,
    ) {
        let category = category.to_string();
        info!("[{category}] {message}");
        tokio::spawn(async move {
            loop {
                let current = progress.borrow_and_update().clone();
                match &current {
                    UploadProgress::InProgress => {}
                    UploadProgress::Completed => info!("[{category}] done"),
                    UploadProgress::Failed(reason) => error!("[{category}] failed: {reason}"),
                }
                if current.is_finished() {
                    break;
                }
                if progress.changed().await.is_err() {
                    debug!("[{category}] progress sender dropped");
                    break;
                }
            }
        });
    }
}
