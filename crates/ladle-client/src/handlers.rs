//! Callback registration and event dispatch for the two stream schemas.
//!
//! Callers register only the callbacks they care about; a decoded event whose
//! slot is empty is dropped without error. Dispatch recognizes terminal
//! events and tells the pump to stop.

use tracing::warn;

use crate::errors::StreamError;
use crate::events::{
    ChatEvent, ChatEventKind, ExtractionEvent, ExtractionStatus, MessageDelta, ProposedAction,
    ToolStarted,
};

/// Whether the pump keeps reading after an event was dispatched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SinkFlow {
    /// Keep processing frames.
    Continue,
    /// A terminal event fired; stop and release the transport.
    Terminal,
}

/// Callback slots for a recipe-extraction stream.
#[derive(Default)]
pub struct ExtractionHandlers {
    on_progress: Option<Box<dyn FnMut(&ExtractionEvent) + Send>>,
    on_complete: Option<Box<dyn FnMut(&str, &str) + Send>>,
    on_error: Option<Box<dyn FnMut(&StreamError) + Send>>,
}

impl ExtractionHandlers {
    /// Creates an empty handler set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called for every decoded event, including terminal ones, so interim
    /// detail can be shown.
    pub fn on_progress(mut self, f: impl FnMut(&ExtractionEvent) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    /// Called once on success with `(signed_url, draft_id)`. The location is
    /// empty when the server sent only the identifier.
    pub fn on_complete(mut self, f: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// Called at most once on terminal failure. Never called for
    /// caller-initiated cancellation.
    pub fn on_error(mut self, f: impl FnMut(&StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub(crate) fn emit_error(&mut self, error: &StreamError) {
        if let Some(f) = self.on_error.as_mut() {
            f(error);
        }
    }

    /// Delivers a terminal success produced outside the stream (fallback
    /// path).
    pub(crate) fn emit_complete(&mut self, signed_url: &str, draft_id: &str) {
        if let Some(f) = self.on_complete.as_mut() {
            f(signed_url, draft_id);
        }
    }

    /// Routes one decoded event.
    ///
    /// `require_location` is set on the URL-fetch path, where a `complete`
    /// without a signed location is semantically incomplete.
    pub(crate) fn dispatch(
        &mut self,
        event: &ExtractionEvent,
        require_location: bool,
    ) -> SinkFlow {
        if let Some(f) = self.on_progress.as_mut() {
            f(event);
        }
        match event.status {
            ExtractionStatus::Complete => {
                let draft_id = event.draft_id.as_deref().unwrap_or_default();
                let signed_url = event.signed_url.as_deref().unwrap_or_default();
                if draft_id.is_empty() || (require_location && signed_url.is_empty()) {
                    self.emit_error(&StreamError::invalid_response(
                        "complete event missing draft_id or signed_url",
                    ));
                } else if let Some(f) = self.on_complete.as_mut() {
                    f(signed_url, draft_id);
                }
                SinkFlow::Terminal
            }
            ExtractionStatus::Error => {
                let code = event.error_code.clone().unwrap_or_else(|| "error".into());
                let detail = event.detail.clone().unwrap_or_default();
                self.emit_error(&StreamError::server(code, detail));
                SinkFlow::Terminal
            }
            _ => SinkFlow::Continue,
        }
    }
}

/// Callback slots for a chat stream.
#[derive(Default)]
pub struct ChatHandlers {
    on_status: Option<Box<dyn FnMut(&serde_json::Value) + Send>>,
    on_delta: Option<Box<dyn FnMut(&str, &str) + Send>>,
    on_block: Option<Box<dyn FnMut(&serde_json::Value, Option<&str>) + Send>>,
    on_message_complete: Option<Box<dyn FnMut(&serde_json::Value, Option<&str>) + Send>>,
    on_tool_started: Option<Box<dyn FnMut(&ToolStarted) + Send>>,
    on_tool_proposed: Option<Box<dyn FnMut(&ProposedAction) + Send>>,
    on_error: Option<Box<dyn FnMut(&StreamError) + Send>>,
    on_done: Option<Box<dyn FnMut(&str) + Send>>,
}

impl ChatHandlers {
    /// Creates an empty handler set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assistant status updates.
    pub fn on_status(mut self, f: impl FnMut(&serde_json::Value) + Send + 'static) -> Self {
        self.on_status = Some(Box::new(f));
        self
    }

    /// Incremental text, called with `(delta, message_id)`.
    pub fn on_delta(mut self, f: impl FnMut(&str, &str) + Send + 'static) -> Self {
        self.on_delta = Some(Box::new(f));
        self
    }

    /// Structured content blocks (cards, links) appended to the reply.
    pub fn on_block(
        mut self,
        f: impl FnMut(&serde_json::Value, Option<&str>) + Send + 'static,
    ) -> Self {
        self.on_block = Some(Box::new(f));
        self
    }

    /// One assistant message finished.
    pub fn on_message_complete(
        mut self,
        f: impl FnMut(&serde_json::Value, Option<&str>) + Send + 'static,
    ) -> Self {
        self.on_message_complete = Some(Box::new(f));
        self
    }

    /// A tool invocation started server-side.
    pub fn on_tool_started(mut self, f: impl FnMut(&ToolStarted) + Send + 'static) -> Self {
        self.on_tool_started = Some(Box::new(f));
        self
    }

    /// The assistant proposed an action that needs explicit confirmation.
    pub fn on_tool_proposed(mut self, f: impl FnMut(&ProposedAction) + Send + 'static) -> Self {
        self.on_tool_proposed = Some(Box::new(f));
        self
    }

    /// Called at most once on terminal failure. Never called for
    /// caller-initiated cancellation.
    pub fn on_error(mut self, f: impl FnMut(&StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Called exactly once when the stream finishes, with the conversation
    /// id. The conversation itself stays open.
    pub fn on_done(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_done = Some(Box::new(f));
        self
    }

    pub(crate) fn emit_error(&mut self, error: &StreamError) {
        if let Some(f) = self.on_error.as_mut() {
            f(error);
        }
    }

    /// Delivers a terminal reply produced outside the stream (fallback
    /// path): one message-complete followed by done.
    pub(crate) fn emit_reply(
        &mut self,
        reply: &serde_json::Value,
        message_id: Option<&str>,
        conversation_id: &str,
    ) {
        if let Some(f) = self.on_message_complete.as_mut() {
            f(reply, message_id);
        }
        if let Some(f) = self.on_done.as_mut() {
            f(conversation_id);
        }
    }

    /// Routes one decoded event to at most one callback.
    pub(crate) fn dispatch(&mut self, event: &ChatEvent) -> SinkFlow {
        let message_id = event.message_id.as_deref();
        match event.event {
            ChatEventKind::Status => {
                if let Some(f) = self.on_status.as_mut() {
                    f(&event.data);
                }
                SinkFlow::Continue
            }
            ChatEventKind::MessageDelta => {
                match serde_json::from_value::<MessageDelta>(event.data.clone()) {
                    Ok(delta) => {
                        if let Some(f) = self.on_delta.as_mut() {
                            f(&delta.delta, message_id.unwrap_or_default());
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping message.delta with malformed payload");
                    }
                }
                SinkFlow::Continue
            }
            ChatEventKind::BlocksAppend => {
                if let Some(f) = self.on_block.as_mut() {
                    f(&event.data, message_id);
                }
                SinkFlow::Continue
            }
            ChatEventKind::MessageComplete => {
                if let Some(f) = self.on_message_complete.as_mut() {
                    f(&event.data, message_id);
                }
                SinkFlow::Continue
            }
            ChatEventKind::ToolStarted => {
                match serde_json::from_value::<ToolStarted>(event.data.clone()) {
                    Ok(started) => {
                        if let Some(f) = self.on_tool_started.as_mut() {
                            f(&started);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping tool.started with malformed payload");
                    }
                }
                SinkFlow::Continue
            }
            ChatEventKind::ToolProposed => {
                match serde_json::from_value::<ProposedAction>(event.data.clone()) {
                    Ok(action) => {
                        if let Some(f) = self.on_tool_proposed.as_mut() {
                            f(&action);
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "skipping tool.proposed with malformed payload");
                    }
                }
                SinkFlow::Continue
            }
            ChatEventKind::Error => {
                let code = event.data["error_code"]
                    .as_str()
                    .unwrap_or("error")
                    .to_string();
                let detail = event.data["detail"].as_str().unwrap_or_default().to_string();
                self.emit_error(&StreamError::server(code, detail));
                SinkFlow::Terminal
            }
            ChatEventKind::Done => {
                if let Some(f) = self.on_done.as_mut() {
                    f(&event.conversation_id);
                }
                SinkFlow::Terminal
            }
            ChatEventKind::Unknown => SinkFlow::Continue,
        }
    }
}
