/// Progress phase reported during recipe extraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Extraction accepted by the server.
    Started,
    /// Fetching the source page or uploaded images.
    Fetching,
    /// Model call in flight.
    AiCall,
    /// Converting model output into a draft.
    Converting,
    /// Generic interim progress.
    Progress,
    /// Terminal success.
    Complete,
    /// Terminal failure.
    Error,
}

/// One decoded frame of the extraction stream.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct ExtractionEvent {
    /// Phase discriminator.
    pub status: ExtractionStatus,
    /// Human-readable progress detail.
    #[serde(default)]
    pub detail: Option<String>,
    /// Draft identifier, present on `complete`.
    #[serde(default)]
    pub draft_id: Option<String>,
    /// Signed result location, present on `complete` for the URL path.
    #[serde(default)]
    pub signed_url: Option<String>,
    /// Server success flag on terminal frames.
    #[serde(default)]
    pub success: Option<bool>,
    /// Server error code on `error` frames.
    #[serde(default)]
    pub error_code: Option<String>,
}

impl ExtractionEvent {
    /// Whether this event ends the stream attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ExtractionStatus::Complete | ExtractionStatus::Error
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_progress_frame_with_detail() {
        let event: ExtractionEvent =
            serde_json::from_str(r#"{"status":"ai_call","detail":"calling model"}"#)
                .expect("decode");
        assert_eq!(event.status, ExtractionStatus::AiCall);
        assert_eq!(event.detail.as_deref(), Some("calling model"));
        assert!(!event.is_terminal());
    }

    #[test]
    fn complete_and_error_are_terminal() {
        let complete: ExtractionEvent = serde_json::from_str(
            r#"{"status":"complete","draft_id":"abc-123","signed_url":"https://cdn/d/abc-123"}"#,
        )
        .expect("decode");
        assert!(complete.is_terminal());
        assert_eq!(complete.draft_id.as_deref(), Some("abc-123"));

        let error: ExtractionEvent =
            serde_json::from_str(r#"{"status":"error","error_code":"rate_limited"}"#)
                .expect("decode");
        assert!(error.is_terminal());
        assert_eq!(error.error_code.as_deref(), Some("rate_limited"));
    }
}
