use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{DeviceTransport, TransportError};

/// `reqwest`-backed transport used against the real firmware.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

fn classify(url: &str, timeout: Duration, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else if let Some(status) = err.status() {
        TransportError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else if err.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: err.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[async_trait]
impl DeviceTransport for HttpTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        debug!("GET {} (timeout {:?})", url, timeout);

        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| classify(url, timeout, e))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| classify(url, timeout, e))?;

        debug!("GET {} returned {} bytes", url, body.len());
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response and hand back the request line.
    async fn serve_once(response: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            request.lines().next().unwrap_or_default().to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn returns_body_on_200() {
        let body = r#"{"absolutePosition":1000}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (base, server) = serve_once(response).await;

        let transport = HttpTransport::new();
        let url = format!("{base}/focuser?absolutePosition=5");
        let bytes = transport.get(&url, Duration::from_secs(5)).await.unwrap();

        assert_eq!(bytes, body.as_bytes());
        let request_line = server.await.unwrap();
        assert_eq!(request_line, "GET /focuser?absolutePosition=5 HTTP/1.1");
    }

    #[tokio::test]
    async fn non_2xx_is_a_status_error() {
        let (base, server) = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
                .to_string(),
        )
        .await;

        let transport = HttpTransport::new();
        let url = format!("{base}/focuser");
        let err = transport.get(&url, Duration::from_secs(5)).await.unwrap_err();

        assert_eq!(err, TransportError::Status { url, status: 500 });
        server.await.unwrap();
    }

    #[tokio::test]
    async fn silent_device_times_out_within_bound() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            // Hold the connection open without ever answering.
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let transport = HttpTransport::new();
        let url = format!("http://{addr}/focuser");
        let timeout = Duration::from_millis(300);
        let start = std::time::Instant::now();
        let err = transport.get(&url, timeout).await.unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(err, TransportError::Timeout { url, timeout });
        assert!(elapsed >= timeout, "returned early after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(5), "took {elapsed:?}");
        server.abort();
    }

    #[tokio::test]
    async fn refused_connection_is_reported() {
        // Bind and drop to get a port nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new();
        let url = format!("http://{addr}/focuser");
        let err = transport.get(&url, Duration::from_secs(2)).await.unwrap_err();

        assert_eq!(err.url(), url);
        assert!(matches!(
            err,
            TransportError::Connect { .. } | TransportError::Request { .. }
        ));
    }
}
