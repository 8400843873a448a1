use futures::StreamExt as _;
use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::{OpenError, TransportError};
use crate::request::{StreamRequest, StreamTarget};
use crate::transport::{ByteStream, StreamTransport};

/// Adapter for the unidirectional server-push connection.
///
/// This transport issues a plain GET and cannot set arbitrary headers, so
/// the bearer token travels as a query parameter. The connection is one-shot:
/// a connection-level error is reported once and the stream is closed rather
/// than reconnected, because a reconnect would replay progress the consumer
/// has already processed.
pub struct PushConnectionTransport {
    client: reqwest::Client,
    config: ClientConfig,
}

impl PushConnectionTransport {
    /// Creates the adapter over a shared HTTP client.
    pub fn new(client: reqwest::Client, config: ClientConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait::async_trait]
impl StreamTransport for PushConnectionTransport {
    fn name(&self) -> &'static str {
        "push-connection"
    }

    fn lenient_decode(&self) -> bool {
        false
    }

    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, OpenError> {
        if matches!(request.target, StreamTarget::Conversation(_)) {
            return Err(OpenError::unsupported(
                "push-connection transport cannot carry chat streams (POST body required)",
            ));
        }

        let url = self.config.endpoint(&request.stream_path());
        debug!(url = %url, "opening push connection");

        let mut query = request.stream_query();
        if let Some(token) = &request.token {
            query.push(("token", token.clone()));
        }

        let response = self
            .client
            .get(&url)
            .query(&query)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| OpenError::transport(format!("push connection failed: {e}")))?;
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
            .map(|chunk| chunk.map_err(|e| TransportError::connection(e.to_string())));
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn chat_targets_are_rejected_at_open() {
        let transport = PushConnectionTransport::new(
            reqwest::Client::new(),
            ClientConfig::new("http://127.0.0.1:1"),
        );
        let request = StreamRequest::new(StreamTarget::Conversation(None)).content("hi");
        let result = transport.open(&request).await;
        assert!(matches!(result, Err(OpenError::Unsupported { .. })));
    }
}
