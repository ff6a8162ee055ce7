use thiserror::Error;

#[derive(Error, Debug)]
pub enum FontPickerError {
    /// Configuration parameter value is out of bounds.
    #[error("config parameter {parameter:?} value is out of bounds: {message}")]
    ConfigParameterValue {
        parameter: &'static str,
        message: String,
    },

    /// Wrapper for [`Figment::Error`](https://docs.rs/figment/latest/figment/struct.Error.html)
    #[error("config deserialization: {0:?}")]
    ConfigDeserialization(#[from] figment::Error),

    /// No catalog access key has been configured.
    #[error("no catalog access key has been configured (set `catalog_api_key`)")]
    MissingApiKey,

    /// Catalog endpoint is not a valid URL.
    #[error("invalid catalog endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// Wrapper for [`serde_json::Error`](https://docs.rs/serde_json/latest/serde_json/struct.Error.html)
    #[error("json serialization/deserialization: {0:?}")]
    SerdeJson(#[from] serde_json::Error),

    /// Wrapper for [`std::io::Error`](https://doc.rust-lang.org/std/io/struct.Error.html)
    #[error("IO: {0:?}")]
    IO(#[from] std::io::Error),

    /// Wrapper for
    /// [`tokio::task::JoinError`](https://docs.rs/tokio/latest/tokio/task/struct.JoinError.html)
    #[error("task failed to execute to completion: {0}")]
    JoinError(#[from] tokio::task::JoinError),

    /// Wrapper for
    /// [`tempfile::PersistError`](https://docs.rs/tempfile/latest/tempfile/struct.PersistError.html)
    #[error("failed to persist a temporary file: {0}")]
    Persist(#[from] tempfile::PersistError),

    /// The request could not be delivered or no response has been received.
    #[error("transport: {0}")]
    Transport(String),

    /// The remote end replied with a non-success status code.
    #[error("HTTP status {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// No catalog font matches the requested family.
    #[error("no catalog font named {0:?}")]
    FontNotFound(String),

    /// The uploaded file is not a font this crate can read.
    #[error("failed to parse font: {0}")]
    FontParse(String),

    /// The parsed font has no variant to attach an asset to.
    #[error("font {0:?} has no variants")]
    NoFontVariants(String),

    /// Media service failed to store an asset.
    #[error("media upload failed: {0}")]
    MediaUpload(String),

    /// Style service failed to read or write the style document.
    #[error("style persistence failed: {0}")]
    StylePersistence(String),

    /// The style document does not have the expected shape.
    #[error("invalid style document: {0}")]
    InvalidStyleDocument(String),
}
