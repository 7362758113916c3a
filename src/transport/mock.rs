use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{DeviceTransport, TransportError};

/// Scripted transport for tests. Responses are queued per URL prefix; any
/// request without a queued response succeeds with `default_body`.
pub struct MockTransport {
    scripts: Mutex<Vec<(String, VecDeque<Result<Vec<u8>, TransportError>>)>>,
    calls: Mutex<Vec<(String, Duration)>>,
    default_body: Vec<u8>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            default_body: b"OK".to_vec(),
        }
    }

    pub fn script(
        self,
        prefix: &str,
        responses: impl IntoIterator<Item = Result<Vec<u8>, TransportError>>,
    ) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .push((prefix.to_string(), responses.into_iter().collect()));
        self
    }

    pub fn calls(&self) -> Vec<(String, Duration)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|(url, _)| url).collect()
    }
}

pub fn unreachable(url: &str) -> TransportError {
    TransportError::Connect {
        url: url.to_string(),
        message: "connection refused".into(),
    }
}

#[async_trait]
impl DeviceTransport for MockTransport {
    async fn get(&self, url: &str, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        self.calls.lock().unwrap().push((url.to_string(), timeout));

        let mut scripts = self.scripts.lock().unwrap();
        let scripted = scripts
            .iter_mut()
            .filter(|(prefix, queue)| url.starts_with(prefix.as_str()) && !queue.is_empty())
            .max_by_key(|(prefix, _)| prefix.len())
            .and_then(|(_, queue)| queue.pop_front());

        scripted.unwrap_or_else(|| Ok(self.default_body.clone()))
    }
}
