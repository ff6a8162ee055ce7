//! HTTP transport
use crate::error::FontPickerError;
use serde::de::DeserializeOwned;
use std::io::Read;
use tracing::{debug, trace};

/// Request methods the picker issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
        }
    }
}

/// A body-less HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
}

/// A fully received HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Deserializes the JSON body
    pub fn to_object<T: DeserializeOwned>(&self) -> Result<T, FontPickerError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Sends HTTP requests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Sends a request and waits for the whole response
    ///
    /// Non-success replies are reported as [`FontPickerError::HttpStatus`].
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FontPickerError>;
}

/// A [`Transport`] built on the blocking `ureq` agent, run off the async executor.
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(concat!("fontpicker-rs/", env!("CARGO_PKG_VERSION")))
                .build(),
        }
    }
}

/// Strips the query part, which may hold credentials
fn redacted(url: &str) -> &str {
    match url.find('?') {
        Some(v) => &url[..v],
        None => url,
    }
}

#[async_trait::async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FontPickerError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || {
            let target = redacted(&request.url).to_string();
            debug!("{} {target}", request.method.as_str());
            let response = match agent.request(request.method.as_str(), &request.url).call() {
                Ok(v) => v,
                Err(ureq::Error::Status(status, _)) => {
                    return Err(FontPickerError::HttpStatus {
                        status,
                        url: target,
                    })
                }
                Err(e) => {
                    return Err(FontPickerError::Transport(format!("{target}: {e}")))
                }
            };
            let status = response.status();
            let mut body = Vec::new();
            response.into_reader().read_to_end(&mut body)?;
            trace!("{target} replied {status} with {} bytes", body.len());
            Ok(HttpResponse { status, body })
        })
        .await?
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn redaction() {
        assert_eq!(
            redacted("https://fonts.example/list?key=secret"),
            "https://fonts.example/list"
        );
        assert_eq!(redacted("https://fonts.example/"), "https://fonts.example/");
    }

    #[test]
    fn to_object() -> Result<(), FontPickerError> {
        let response = HttpResponse {
            status: 200,
            body: br#"{"items": []}"#.to_vec(),
        };
        let value: serde_json::Value = response.to_object()?;
        assert_eq!(value, serde_json::json!({ "items": [] }));

        let response = HttpResponse {
            status: 200,
            body: b"<html>".to_vec(),
        };
        assert!(matches!(
            response.to_object::<serde_json::Value>(),
            Err(FontPickerError::SerdeJson(_))
        ));
        Ok(())
    }
}
