/// Resource a stream attempt is bound to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamTarget {
    /// Extract a recipe from a public page URL.
    SourceUrl(String),
    /// Extract a recipe from previously uploaded images, by draft id.
    Draft(String),
    /// Chat turn; `None` starts a new conversation.
    Conversation(Option<String>),
}

/// Immutable description of one stream attempt.
///
/// Credentials are resolved by the caller before the request is built; the
/// transports never consult ambient state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamRequest {
    /// Target resource for this attempt.
    pub target: StreamTarget,
    /// Free-text payload: prompt override for URL extraction, message
    /// content for chat.
    pub content: Option<String>,
    /// Bearer token, when the caller has one.
    pub token: Option<String>,
}

impl StreamRequest {
    /// Creates a request for the given target.
    pub fn new(target: StreamTarget) -> Self {
        Self {
            target,
            content: None,
            token: None,
        }
    }

    /// Sets the free-text payload.
    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the bearer token.
    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Streaming endpoint path for this target (without the base URL).
    pub(crate) fn stream_path(&self) -> String {
        match &self.target {
            StreamTarget::SourceUrl(_) => "/extract-recipe-stream".to_string(),
            StreamTarget::Draft(_) => "/extract-recipe-image-stream".to_string(),
            StreamTarget::Conversation(Some(id)) => format!("/chat/conversations/{id}/stream"),
            StreamTarget::Conversation(None) => "/chat/stream".to_string(),
        }
    }

    /// Query parameters for the GET streaming endpoints.
    pub(crate) fn stream_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        match &self.target {
            StreamTarget::SourceUrl(url) => {
                query.push(("source_url", url.clone()));
                if let Some(prompt) = &self.content {
                    query.push(("prompt_override", prompt.clone()));
                }
            }
            StreamTarget::Draft(id) => query.push(("draft_id", id.clone())),
            StreamTarget::Conversation(_) => {}
        }
        query
    }

    /// Whether the streaming endpoint takes a POST body instead of query
    /// parameters.
    pub(crate) fn is_post(&self) -> bool {
        matches!(self.target, StreamTarget::Conversation(_))
    }

    /// Body for the POST streaming endpoints.
    pub(crate) fn stream_body(&self) -> serde_json::Value {
        serde_json::json!({ "content": self.content.clone().unwrap_or_default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_target_builds_query_with_optional_override() {
        let req = StreamRequest::new(StreamTarget::SourceUrl("https://x.test/r".into()));
        assert_eq!(req.stream_path(), "/extract-recipe-stream");
        assert_eq!(
            req.stream_query(),
            vec![("source_url", "https://x.test/r".to_string())]
        );

        let with_prompt = req.content("metric units");
        assert_eq!(
            with_prompt.stream_query(),
            vec![
                ("source_url", "https://x.test/r".to_string()),
                ("prompt_override", "metric units".to_string()),
            ]
        );
    }

    #[test]
    fn conversation_targets_select_post_paths() {
        let fresh = StreamRequest::new(StreamTarget::Conversation(None)).content("hi");
        assert!(fresh.is_post());
        assert_eq!(fresh.stream_path(), "/chat/stream");
        assert_eq!(fresh.stream_body(), serde_json::json!({"content": "hi"}));

        let existing = StreamRequest::new(StreamTarget::Conversation(Some("c-9".into())));
        assert_eq!(existing.stream_path(), "/chat/conversations/c-9/stream");
    }

    #[test]
    fn draft_target_is_query_keyed() {
        let req = StreamRequest::new(StreamTarget::Draft("d-1".into()));
        assert_eq!(req.stream_path(), "/extract-recipe-image-stream");
        assert_eq!(req.stream_query(), vec![("draft_id", "d-1".to_string())]);
        assert!(!req.is_post());
    }
}
