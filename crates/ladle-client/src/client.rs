//! Client entry points and the streaming-with-fallback policy.
//!
//! Every streaming operation first attempts the configured streaming
//! transport. Opening is an explicit `Result`: an open failure, which by
//! construction happens before any frame, falls back to the single
//! non-streaming request for the same operation. A failure after streaming
//! has begun terminates the attempt as-is; it is never retried as a fresh
//! non-streaming call, since that could duplicate progress the caller
//! already observed.

use std::sync::Arc;

use tracing::debug;

use crate::config::ClientConfig;
use crate::errors::{ClientError, StreamError};
use crate::handle::StreamHandle;
use crate::handlers::{ChatHandlers, ExtractionHandlers};
use crate::pipeline::{StreamSink, pump_stream};
use crate::request::{StreamRequest, StreamTarget};
use crate::transport::{PushConnectionTransport, ReadableResponseTransport, StreamTransport};
use crate::upload::{self, ImageFile};

/// Result of a non-streaming extraction call, and of the streaming path's
/// upload step for images.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExtractionReceipt {
    /// Identifier of the created draft.
    pub draft_id: String,
    /// Signed link to the draft, when the server issued one.
    #[serde(default)]
    pub signed_url: Option<String>,
    /// Expiry of the signed link.
    #[serde(default)]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Signed-link lifetime in seconds.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

/// Terminal result of a non-streaming chat send.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ChatReply {
    /// Conversation the reply belongs to.
    pub conversation_id: String,
    /// Id of the assistant message.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Reply text.
    #[serde(default)]
    pub content: Option<String>,
    /// Structured content blocks attached to the reply.
    #[serde(default)]
    pub blocks: serde_json::Value,
}

/// Client for the Ladle backend's streaming and request/response endpoints.
#[derive(Clone)]
pub struct LadleClient {
    pub(crate) http: reqwest::Client,
    pub(crate) config: ClientConfig,
    transport: Arc<dyn StreamTransport>,
}

/// Builder used to configure a [`LadleClient`].
#[derive(Default)]
pub struct LadleClientBuilder {
    config: Option<ClientConfig>,
    transport: Option<Arc<dyn StreamTransport>>,
    use_push: bool,
}

impl LadleClientBuilder {
    /// Sets the client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Streams over the push-connection transport instead of the default
    /// readable-response transport.
    pub fn push_transport(mut self) -> Self {
        self.use_push = true;
        self
    }

    /// Replaces the streaming transport entirely.
    pub fn transport(mut self, transport: Arc<dyn StreamTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<LadleClient, ClientError> {
        let config = self
            .config
            .ok_or_else(|| ClientError::Config("client config is required".into()))?;
        if config.base_url.trim().is_empty() {
            return Err(ClientError::Config("base_url must not be empty".into()));
        }
        // No client-level timeout: it would also cap multi-minute streams.
        // Non-streaming calls apply the configured timeout per request.
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;
        let transport = match self.transport {
            Some(transport) => transport,
            None if self.use_push => Arc::new(PushConnectionTransport::new(
                http.clone(),
                config.clone(),
            )) as Arc<dyn StreamTransport>,
            None => Arc::new(ReadableResponseTransport::new(http.clone(), config.clone()))
                as Arc<dyn StreamTransport>,
        };
        Ok(LadleClient {
            http,
            config,
            transport,
        })
    }
}

impl LadleClient {
    /// Starts a builder.
    pub fn builder() -> LadleClientBuilder {
        LadleClientBuilder::default()
    }

    /// Creates a client with the default streaming transport.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        Self::builder().config(config).build()
    }

    /// Creates a client from `LADLE_API_BASE_URL` / `LADLE_API_TOKEN`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ClientConfig::from_env()?)
    }

    fn stream_request(&self, target: StreamTarget) -> StreamRequest {
        StreamRequest::new(target).token(self.config.token.clone())
    }

    /// Streams AI recipe extraction from a page URL.
    ///
    /// Progress, completion, and failure are delivered through `handlers`;
    /// the returned handle cancels the attempt.
    pub async fn extract_recipe_from_url(
        &self,
        source_url: impl Into<String>,
        prompt_override: Option<String>,
        handlers: ExtractionHandlers,
    ) -> Result<StreamHandle, ClientError> {
        let mut request = self.stream_request(StreamTarget::SourceUrl(source_url.into()));
        if let Some(prompt) = prompt_override {
            request = request.content(prompt);
        }
        Ok(self.start_extraction(request, true, handlers).await)
    }

    /// Uploads images and streams AI recipe extraction from them.
    ///
    /// Size and MIME limits are enforced locally; a violation is returned
    /// as a validation error before any network call.
    pub async fn extract_recipe_from_images(
        &self,
        files: Vec<ImageFile>,
        handlers: ExtractionHandlers,
    ) -> Result<StreamHandle, ClientError> {
        if files.is_empty() {
            return Err(ClientError::validation("at least one image is required"));
        }
        upload::validate_files(&files).map_err(|e| ClientError::validation(e.to_string()))?;

        let mut handlers = handlers;
        let receipt = match self.extract_images_once_unchecked(files).await {
            Ok(receipt) => receipt,
            Err(e) => {
                handlers.emit_error(&client_error_to_stream(&e));
                return Ok(StreamHandle::finished());
            }
        };

        let request = self.stream_request(StreamTarget::Draft(receipt.draft_id.clone()));
        match self.transport.open(&request).await {
            Ok(bytes) => Ok(self.spawn_extraction(bytes, false, handlers)),
            Err(open) => {
                // The upload already produced the non-streaming result, so
                // the fallback needs no second call.
                debug!(transport = self.transport.name(), error = %open, "image stream open failed, using upload receipt");
                handlers.emit_complete(
                    receipt.signed_url.as_deref().unwrap_or_default(),
                    &receipt.draft_id,
                );
                Ok(StreamHandle::finished())
            }
        }
    }

    async fn start_extraction(
        &self,
        request: StreamRequest,
        require_location: bool,
        mut handlers: ExtractionHandlers,
    ) -> StreamHandle {
        match self.transport.open(&request).await {
            Ok(bytes) => self.spawn_extraction(bytes, require_location, handlers),
            Err(open) => {
                debug!(transport = self.transport.name(), error = %open, "stream open failed before first frame, falling back");
                let fallback = match &request.target {
                    StreamTarget::SourceUrl(url) => {
                        self.extract_url_once(url.clone(), request.content.clone())
                            .await
                    }
                    // Draft streams fall back in extract_recipe_from_images;
                    // reaching here means the draft receipt is unavailable.
                    _ => Err(ClientError::transport(open.to_string())),
                };
                match fallback {
                    Ok(receipt) => handlers.emit_complete(
                        receipt.signed_url.as_deref().unwrap_or_default(),
                        &receipt.draft_id,
                    ),
                    Err(e) => handlers.emit_error(&client_error_to_stream(&e)),
                }
                StreamHandle::finished()
            }
        }
    }

    fn spawn_extraction(
        &self,
        bytes: crate::transport::ByteStream,
        require_location: bool,
        handlers: ExtractionHandlers,
    ) -> StreamHandle {
        let (handle, abort_rx) = StreamHandle::new();
        debug!(stream_id = %handle.id(), transport = self.transport.name(), "extraction stream opened");
        let sink = StreamSink::Extraction {
            handlers,
            require_location,
        };
        tokio::spawn(pump_stream(
            bytes,
            self.transport.lenient_decode(),
            sink,
            handle.clone(),
            abort_rx,
        ));
        handle
    }

    /// Streams one chat turn.
    ///
    /// `conversation_id` continues an existing conversation; `None` starts a
    /// new one. Events are delivered through `handlers`.
    pub async fn send_message(
        &self,
        conversation_id: Option<String>,
        content: impl Into<String>,
        handlers: ChatHandlers,
    ) -> Result<StreamHandle, ClientError> {
        let content = content.into();
        let request = self
            .stream_request(StreamTarget::Conversation(conversation_id.clone()))
            .content(content.clone());
        let mut handlers = handlers;
        match self.transport.open(&request).await {
            Ok(bytes) => {
                let (handle, abort_rx) = StreamHandle::new();
                debug!(stream_id = %handle.id(), transport = self.transport.name(), "chat stream opened");
                tokio::spawn(pump_stream(
                    bytes,
                    self.transport.lenient_decode(),
                    StreamSink::Chat { handlers },
                    handle.clone(),
                    abort_rx,
                ));
                Ok(handle)
            }
            Err(open) => {
                debug!(transport = self.transport.name(), error = %open, "chat stream open failed before first frame, falling back");
                match self
                    .send_message_once(conversation_id.as_deref(), content)
                    .await
                {
                    Ok(reply) => {
                        let value = serde_json::to_value(&reply).unwrap_or_default();
                        handlers.emit_reply(
                            &value,
                            reply.message_id.as_deref(),
                            &reply.conversation_id,
                        );
                    }
                    Err(e) => handlers.emit_error(&client_error_to_stream(&e)),
                }
                Ok(StreamHandle::finished())
            }
        }
    }

    /// Non-streaming URL extraction: one request, one terminal receipt.
    pub async fn extract_url_once(
        &self,
        source_url: impl Into<String>,
        prompt_override: Option<String>,
    ) -> Result<ExtractionReceipt, ClientError> {
        let mut body = serde_json::json!({ "source_url": source_url.into() });
        if let Some(prompt) = prompt_override {
            body["prompt_override"] = serde_json::Value::String(prompt);
        }
        let req = self
            .authed(self.http.post(self.config.endpoint("/extract-recipe-from-url")))
            .json(&body);
        self.execute_json(req).await
    }

    /// Non-streaming image extraction: uploads the images and returns the
    /// terminal receipt.
    pub async fn extract_images_once(
        &self,
        files: Vec<ImageFile>,
    ) -> Result<ExtractionReceipt, ClientError> {
        upload::validate_files(&files).map_err(|e| ClientError::validation(e.to_string()))?;
        self.extract_images_once_unchecked(files).await
    }

    async fn extract_images_once_unchecked(
        &self,
        files: Vec<ImageFile>,
    ) -> Result<ExtractionReceipt, ClientError> {
        let form = upload::multipart_form(files)?;
        let req = self
            .authed(self.http.post(self.config.endpoint("/extract-recipe-from-image")))
            .multipart(form);
        self.execute_json(req).await
    }

    /// Non-streaming chat send: one request, one terminal reply.
    pub async fn send_message_once(
        &self,
        conversation_id: Option<&str>,
        content: impl Into<String>,
    ) -> Result<ChatReply, ClientError> {
        let path = match conversation_id {
            Some(id) => format!("/chat/conversations/{id}"),
            None => "/chat".to_string(),
        };
        let body = serde_json::json!({ "content": content.into() });
        let req = self
            .authed(self.http.post(self.config.endpoint(&path)))
            .json(&body);
        self.execute_json(req).await
    }

    /// Fetches a draft through its signed link token.
    pub async fn fetch_draft_signed(
        &self,
        draft_id: &str,
        token: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let req = self
            .http
            .get(self.config.endpoint(&format!("/drafts/{draft_id}")))
            .query(&[("token", token)])
            .timeout(self.config.timeout);
        self.execute_json(req).await
    }

    /// Fetches the caller's own draft with bearer credentials.
    pub async fn fetch_draft_owned(
        &self,
        draft_id: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let req = self.authed(
            self.http
                .get(self.config.endpoint(&format!("/drafts/{draft_id}/me"))),
        );
        self.execute_json(req).await
    }

    /// Materializes an identifier-only extraction result into the full
    /// draft.
    ///
    /// A failure here is reported as the distinct materialization condition:
    /// the extraction itself already succeeded.
    pub async fn materialize_draft(
        &self,
        draft_id: &str,
    ) -> Result<serde_json::Value, ClientError> {
        self.fetch_draft_owned(draft_id)
            .await
            .map_err(|e| ClientError::materialization(e.to_string()))
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let req = req.timeout(self.config.timeout);
        match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = req
            .send()
            .await
            .map_err(|e| ClientError::transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::http(status.as_u16(), body));
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }
}

fn client_error_to_stream(error: &ClientError) -> StreamError {
    match error {
        ClientError::Http { status, message } => StreamError::http(*status, message.clone()),
        ClientError::Decode(message) => StreamError::parse(message.clone()),
        other => StreamError::stream(other.to_string()),
    }
}
