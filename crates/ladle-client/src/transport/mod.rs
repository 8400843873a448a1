//! Streaming transport adapters.
//!
//! Both adapters turn one stream attempt into a raw byte stream; frame
//! reassembly and event decoding happen above this seam. The adapters differ
//! in capability: the readable-response adapter can attach bearer headers and
//! is preferred, the push-connection adapter cannot and carries credentials
//! in the URL.

mod body;
mod push;

use std::pin::Pin;

use bytes::Bytes;

use crate::errors::{OpenError, TransportError};
use crate::request::StreamRequest;

pub use body::ReadableResponseTransport;
pub use push::PushConnectionTransport;

/// Raw chunk stream produced by an opened transport.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<Bytes, TransportError>> + Send + 'static>>;

/// One streaming transport strategy.
#[async_trait::async_trait]
pub trait StreamTransport: Send + Sync {
    /// Transport name for logs.
    fn name(&self) -> &'static str;

    /// Whether a malformed frame may be skipped.
    ///
    /// The push-connection transport has a single handler per frame and no
    /// separate diagnostic path, so a decode failure there must terminate
    /// the stream instead.
    fn lenient_decode(&self) -> bool;

    /// Opens the stream for one attempt.
    ///
    /// An `Err` here means no frame was ever received, which is the only
    /// condition under which the orchestrator may fall back to the
    /// non-streaming call.
    async fn open(&self, request: &StreamRequest) -> Result<ByteStream, OpenError>;
}
