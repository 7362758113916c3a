pub mod http;
#[cfg(test)]
pub mod mock;

use std::time::Duration;

use async_trait::async_trait;

/// Why a single GET to the focuser (or its power switch) failed.
///
/// The controller reacts to every variant the same way; the variants only
/// exist so the operator sees what actually went wrong.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("could not connect to {url}: {message}")]
    Connect { url: String, message: String },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl TransportError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::Connect { url, .. }
            | Self::Status { url, .. }
            | Self::Request { url, .. } => url,
        }
    }
}

/// One bounded-timeout HTTP GET. No retries happen at this layer.
#[async_trait]
pub trait DeviceTransport: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError>;
}

#[async_trait]
impl<T: DeviceTransport + ?Sized> DeviceTransport for std::sync::Arc<T> {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        (**self).get(url, timeout).await
    }
}
