use futures::StreamExt as _;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::{OpenError, TransportError};
use crate::request::StreamRequest;
use crate::transport::{ByteStream, StreamTransport};

/// Adapter that reads the response body of an ordinary request
/// incrementally.
///
/// Preferred transport: it can attach a bearer header and its reader stops
/// as soon as the consumer drops the stream, so the server is not left
/// pushing into a dead connection.
pub struct ReadableResponseTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl ReadableResponseTransport {
    /// Creates the adapter over a shared HTTP client.
    pub fn new(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait::async_trait]
impl StreamTransport for ReadableResponseTransport {
    fn name(&self) -> &'static str {
        "readable-response"
    }

    fn lenient_decode(&self) -> bool {
        true
    }

    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, OpenError> {
        let url = self.config.endpoint(&request.stream_path());
        debug!(url = %url, "opening readable-response stream");

        let mut http_req = if request.is_post() {
            self.client.post(&url).json(&request.stream_body())
        } else {
            self.client.get(&url).query(&request.stream_query())
        };
        http_req = http_req.header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some(token) = &request.token {
            http_req = http_req.bearer_auth(token);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| OpenError::transport(format!("stream request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OpenError::http(status.as_u16(), body));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::read(e.to_string())));
        Ok(Box::pin(stream))
    }
}
