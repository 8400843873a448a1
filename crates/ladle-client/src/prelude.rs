//! Common imports for typical client usage.
//!
//! This module intentionally exports the most frequently used client and
//! callback types so examples and application code need fewer import lines.
pub use crate::{
    ActionError, ActionOutcome, ChatHandlers, ChatReply, ClientConfig, ClientError,
    ExtractionHandlers, ExtractionReceipt, ImageFile, LadleClient, LadleClientBuilder,
    StreamError, StreamHandle,
};
