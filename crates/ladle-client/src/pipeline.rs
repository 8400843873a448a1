//! The per-attempt pump: chunks in, callbacks out.
//!
//! One task owns the whole pipeline for a handle, so chunks are processed in
//! arrival order with no locking. The task multiplexes the abort signal
//! against the next chunk; dropping the byte stream on exit closes the
//! underlying reader, which stops the server from pushing further data.

use futures::StreamExt as _;
use tracing::{debug, warn};

use crate::errors::StreamError;
use crate::events::{ChatEvent, ExtractionEvent};
use crate::handle::StreamHandle;
use crate::handlers::{ChatHandlers, ExtractionHandlers, SinkFlow};
use crate::sse::SseDecoder;
use crate::transport::ByteStream;

/// Schema-specific half of the pipeline.
pub(crate) enum StreamSink {
    Extraction {
        handlers: ExtractionHandlers,
        require_location: bool,
    },
    Chat {
        handlers: ChatHandlers,
    },
}

impl StreamSink {
    /// Decodes one frame payload and dispatches it.
    ///
    /// `Err` carries a parse failure; the pump decides whether the transport
    /// may skip it.
    fn dispatch_payload(&mut self, payload: &str) -> Result<SinkFlow, StreamError> {
        match self {
            Self::Extraction {
                handlers,
                require_location,
            } => {
                let event: ExtractionEvent = serde_json::from_str(payload)
                    .map_err(|e| StreamError::parse(format!("malformed extraction frame: {e}")))?;
                Ok(handlers.dispatch(&event, *require_location))
            }
            Self::Chat { handlers } => {
                let event: ChatEvent = serde_json::from_str(payload)
                    .map_err(|e| StreamError::parse(format!("malformed chat frame: {e}")))?;
                Ok(handlers.dispatch(&event))
            }
        }
    }

    fn fail(&mut self, error: &StreamError) {
        match self {
            Self::Extraction { handlers, .. } => handlers.emit_error(error),
            Self::Chat { handlers } => handlers.emit_error(error),
        }
    }
}

/// Drives one stream attempt to its terminal state.
pub(crate) async fn pump_stream(
    mut bytes: ByteStream,
    lenient: bool,
    mut sink: StreamSink,
    handle: StreamHandle,
    mut abort_rx: tokio::sync::watch::Receiver<bool>,
) {
    let stream_id = handle.id();
    let mut decoder = SseDecoder::new();
    let mut saw_bytes = false;
    loop {
        tokio::select! {
            changed = abort_rx.changed() => {
                match changed {
                    Ok(_) if *abort_rx.borrow() => {
                        // Cancellation is not a failure: close without any
                        // callback.
                        handle.mark_closed();
                        debug!(stream_id = %stream_id, "stream canceled by caller");
                        return;
                    }
                    Ok(_) => {}
                    Err(_) => {}
                }
            }
            next = bytes.next() => {
                match next {
                    Some(Ok(chunk)) => {
                        if !chunk.is_empty() {
                            saw_bytes = true;
                        }
                        for payload in decoder.feed(&chunk) {
                            match sink.dispatch_payload(&payload) {
                                Ok(SinkFlow::Continue) => {}
                                Ok(SinkFlow::Terminal) => {
                                    handle.mark_closed();
                                    debug!(stream_id = %stream_id, "stream reached terminal event");
                                    return;
                                }
                                Err(parse_error) if lenient => {
                                    warn!(stream_id = %stream_id, error = %parse_error, "skipping malformed frame");
                                }
                                Err(parse_error) => {
                                    if handle.mark_closed() {
                                        sink.fail(&parse_error);
                                    }
                                    return;
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        if handle.mark_closed() {
                            sink.fail(&StreamError::from(e));
                        }
                        return;
                    }
                    None => {
                        // Any buffered, unterminated trailing frame is
                        // discarded with the decoder.
                        let error = if saw_bytes {
                            StreamError::stream("stream ended before a terminal event")
                        } else {
                            StreamError::NoBody
                        };
                        if handle.mark_closed() {
                            sink.fail(&error);
                        }
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransportError;
    use bytes::Bytes;
    use futures::stream;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn chunks(parts: Vec<&str>) -> ByteStream {
        let items: Vec<Result<Bytes, TransportError>> = parts
            .into_iter()
            .map(|p| Ok(Bytes::copy_from_slice(p.as_bytes())))
            .collect();
        Box::pin(stream::iter(items))
    }

    fn extraction_sink(
        progress: Arc<Mutex<Vec<String>>>,
        completions: Arc<Mutex<Vec<(String, String)>>>,
        errors: Arc<Mutex<Vec<StreamError>>>,
    ) -> StreamSink {
        let handlers = ExtractionHandlers::new()
            .on_progress(move |event| {
                progress
                    .lock()
                    .unwrap()
                    .push(format!("{:?}", event.status));
            })
            .on_complete(move |url, draft| {
                completions
                    .lock()
                    .unwrap()
                    .push((url.to_string(), draft.to_string()));
            })
            .on_error(move |error| {
                errors.lock().unwrap().push(error.clone());
            });
        StreamSink::Extraction {
            handlers,
            require_location: false,
        }
    }

    #[tokio::test]
    async fn frames_split_across_chunks_dispatch_in_order() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = extraction_sink(progress.clone(), completions.clone(), errors.clone());
        let (handle, abort_rx) = StreamHandle::new();

        let bytes = chunks(vec![
            "data: {\"status\":\"started\"}\n\ndata: {\"status\":\"com",
            "plete\",\"draft_id\":\"abc-123\"}\n\n",
        ]);
        pump_stream(bytes, true, sink, handle.clone(), abort_rx).await;

        assert_eq!(*progress.lock().unwrap(), vec!["Started", "Complete"]);
        assert_eq!(
            *completions.lock().unwrap(),
            vec![(String::new(), "abc-123".to_string())]
        );
        assert!(errors.lock().unwrap().is_empty());
        assert!(handle.is_closed());
    }

    #[tokio::test]
    async fn frames_after_terminal_are_not_processed() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = extraction_sink(progress.clone(), completions.clone(), errors.clone());
        let (handle, abort_rx) = StreamHandle::new();

        let bytes = chunks(vec![
            "data: {\"status\":\"complete\",\"draft_id\":\"d-1\"}\n\ndata: {\"status\":\"progress\"}\n\n",
        ]);
        pump_stream(bytes, true, sink, handle, abort_rx).await;

        assert_eq!(*progress.lock().unwrap(), vec!["Complete"]);
        assert_eq!(completions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_frame_is_skipped_on_lenient_transport() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = extraction_sink(progress.clone(), completions.clone(), errors.clone());
        let (handle, abort_rx) = StreamHandle::new();

        let bytes = chunks(vec![
            "data: {not json}\n\ndata: {\"status\":\"complete\",\"draft_id\":\"d-1\"}\n\n",
        ]);
        pump_stream(bytes, true, sink, handle, abort_rx).await;

        assert!(errors.lock().unwrap().is_empty());
        assert_eq!(completions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_frame_terminates_strict_transport_with_parse_error() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = extraction_sink(progress.clone(), completions.clone(), errors.clone());
        let (handle, abort_rx) = StreamHandle::new();

        let bytes = chunks(vec![
            "data: {not json}\n\ndata: {\"status\":\"complete\",\"draft_id\":\"d-1\"}\n\n",
        ]);
        pump_stream(bytes, false, sink, handle, abort_rx).await;

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StreamError::Parse { .. }));
        assert!(completions.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_body_reports_no_body() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = extraction_sink(progress, completions, errors.clone());
        let (handle, abort_rx) = StreamHandle::new();

        pump_stream(chunks(vec![]), true, sink, handle, abort_rx).await;

        assert_eq!(*errors.lock().unwrap(), vec![StreamError::NoBody]);
    }

    #[tokio::test]
    async fn empty_chunks_only_still_report_no_body() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = extraction_sink(progress, completions, errors.clone());
        let (handle, abort_rx) = StreamHandle::new();

        pump_stream(chunks(vec![""]), true, sink, handle, abort_rx).await;

        assert_eq!(*errors.lock().unwrap(), vec![StreamError::NoBody]);
    }

    #[tokio::test]
    async fn end_without_terminal_is_a_stream_error() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = extraction_sink(progress.clone(), completions, errors.clone());
        let (handle, abort_rx) = StreamHandle::new();

        let bytes = chunks(vec!["data: {\"status\":\"started\"}\n\n"]);
        pump_stream(bytes, true, sink, handle, abort_rx).await;

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StreamError::Stream { .. }));
    }

    #[tokio::test]
    async fn cancellation_suppresses_all_further_callbacks() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = extraction_sink(progress.clone(), completions.clone(), errors.clone());
        let (handle, abort_rx) = StreamHandle::new();

        // A stream that never yields: only cancellation can end the pump.
        let bytes: ByteStream = Box::pin(stream::pending());
        let pump = tokio::spawn(pump_stream(bytes, true, sink, handle.clone(), abort_rx));

        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), pump)
            .await
            .expect("pump ends after cancel")
            .expect("pump task");

        assert!(handle.is_closed());
        assert!(progress.lock().unwrap().is_empty());
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_deltas_then_done_fire_in_order() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let delta_order = order.clone();
        let done_order = order.clone();
        let handlers = ChatHandlers::new()
            .on_delta(move |delta, message_id| {
                delta_order
                    .lock()
                    .unwrap()
                    .push(format!("delta:{delta}:{message_id}"));
            })
            .on_done(move |conversation_id| {
                done_order
                    .lock()
                    .unwrap()
                    .push(format!("done:{conversation_id}"));
            });
        let (handle, abort_rx) = StreamHandle::new();

        let bytes = chunks(vec![
            "data: {\"event\":\"message.delta\",\"conversation_id\":\"c-1\",\"message_id\":\"msg-123\",\"data\":{\"delta\":\"Hello \"}}\n\n",
            "data: {\"event\":\"done\",\"conversation_id\":\"c-1\"}\n\n",
        ]);
        pump_stream(bytes, true, StreamSink::Chat { handlers }, handle, abort_rx).await;

        assert_eq!(
            *order.lock().unwrap(),
            vec!["delta:Hello :msg-123".to_string(), "done:c-1".to_string()]
        );
    }

    #[tokio::test]
    async fn connection_error_chunk_maps_to_connection_error() {
        let progress = Arc::new(Mutex::new(Vec::new()));
        let completions = Arc::new(Mutex::new(Vec::new()));
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = extraction_sink(progress, completions, errors.clone());
        let (handle, abort_rx) = StreamHandle::new();

        let bytes: ByteStream = Box::pin(stream::iter(vec![Err(TransportError::connection(
            "connection reset",
        ))]));
        pump_stream(bytes, false, sink, handle, abort_rx).await;

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], StreamError::Connection { .. }));
    }
}
