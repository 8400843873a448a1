//! Streaming-update client for the Ladle recipe and meal-planning backend.
//!
//! Two long-running server operations push progress as server-sent-event
//! frames: AI recipe extraction (from a URL or uploaded images) and the
//! chat assistant. This crate turns the raw chunked byte stream into typed
//! events delivered to caller-registered callbacks, with cooperative
//! cancellation and a degrade-to-single-request fallback when the streaming
//! transport cannot be opened.
//!
//! # Usage
//!
//! ```no_run
//! use ladle_client::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ClientError> {
//! let client = LadleClient::new(ClientConfig::new("https://api.ladle.app"))?;
//!
//! let handlers = ExtractionHandlers::new()
//!     .on_progress(|event| println!("{:?}: {}", event.status, event.detail.as_deref().unwrap_or("")))
//!     .on_complete(|signed_url, draft_id| println!("draft {draft_id} at {signed_url}"))
//!     .on_error(|error| eprintln!("extraction failed: {error}"));
//!
//! let handle = client
//!     .extract_recipe_from_url("https://blog.example/best-stew", None, handlers)
//!     .await?;
//!
//! // ... later, if the user navigates away:
//! handle.cancel();
//! # Ok(())
//! # }
//! ```

/// Accept/cancel calls for proposed actions.
pub mod actions;
/// Client entry points and the streaming-with-fallback policy.
pub mod client;
/// Client configuration.
pub mod config;
/// Public error types.
pub mod errors;
/// Typed event schemas for the two stream kinds.
pub mod events;
/// Cancellable per-attempt stream handle.
pub mod handle;
/// Callback registration and event dispatch.
pub mod handlers;
/// Per-attempt pump from chunks to callbacks.
mod pipeline;
/// Common imports for typical usage.
pub mod prelude;
/// Stream attempt description and targets.
pub mod request;
#[cfg(test)]
pub(crate) mod testutil;
/// Frame reassembly for the wire format.
pub mod sse;
/// Streaming transport adapters.
pub mod transport;
/// Image validation and multipart upload assembly.
pub mod upload;

pub use actions::ActionOutcome;
pub use client::{ChatReply, ExtractionReceipt, LadleClient, LadleClientBuilder};
pub use config::ClientConfig;
pub use errors::{ActionError, ClientError, OpenError, StreamError, TransportError};
pub use events::{
    ChatEvent, ChatEventKind, ExtractionEvent, ExtractionStatus, MessageDelta, ProposedAction,
    ToolStarted,
};
pub use handle::StreamHandle;
pub use handlers::{ChatHandlers, ExtractionHandlers};
pub use request::{StreamRequest, StreamTarget};
pub use sse::SseDecoder;
pub use transport::{
    ByteStream, PushConnectionTransport, ReadableResponseTransport, StreamTransport,
};
pub use upload::{ImageFile, MAX_COMBINED_BYTES, MAX_FILE_BYTES, UploadError};
