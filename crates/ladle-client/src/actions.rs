//! Accept/cancel calls for actions proposed during a chat stream.
//!
//! Proposals outlive the stream that surfaced them, so these are ordinary
//! request/response calls. The server decides whether a proposal is still
//! valid: resolving one twice, or after expiry, is rejected server-side and
//! surfaced as-is rather than retried.

use tracing::debug;

use crate::client::LadleClient;
use crate::errors::ActionError;

/// Server response to an accept or cancel call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ActionOutcome {
    /// Whether the resolution was applied.
    pub success: bool,
    /// Id of the action the server executed, on accept.
    #[serde(default)]
    pub action_id: Option<String>,
    /// Resulting proposal status (for example `completed` or `canceled`).
    pub status: String,
}

impl LadleClient {
    /// Accepts a proposed action with the default confirmation flag.
    pub async fn accept_action(&self, proposal_id: &str) -> Result<ActionOutcome, ActionError> {
        self.accept_action_with(proposal_id, true).await
    }

    /// Accepts a proposed action with an explicit confirmation flag.
    pub async fn accept_action_with(
        &self,
        proposal_id: &str,
        confirmed: bool,
    ) -> Result<ActionOutcome, ActionError> {
        self.resolve_action(
            proposal_id,
            "accept",
            Some(serde_json::json!({ "confirmed": confirmed })),
        )
        .await
    }

    /// Cancels a proposed action.
    pub async fn cancel_action(&self, proposal_id: &str) -> Result<ActionOutcome, ActionError> {
        self.resolve_action(proposal_id, "cancel", None).await
    }

    async fn resolve_action(
        &self,
        proposal_id: &str,
        verb: &str,
        body: Option<serde_json::Value>,
    ) -> Result<ActionOutcome, ActionError> {
        let url = self
            .config
            .endpoint(&format!("/chat/actions/{proposal_id}/{verb}"));
        debug!(proposal_id, verb, "resolving proposed action");

        let mut req = self.http.post(url).timeout(self.config.timeout);
        if let Some(token) = &self.config.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req
            .send()
            .await
            .map_err(|e| ActionError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            // Already-resolved or expired proposals land here; the detail is
            // user-visible and the call is never retried.
            let detail = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ActionError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }
        response
            .json::<ActionOutcome>()
            .await
            .map_err(|e| ActionError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use std::time::Duration;

    #[test]
    fn outcome_decodes_accept_and_cancel_shapes() {
        let accepted: ActionOutcome = serde_json::from_str(
            r#"{"success":true,"action_id":"a-1","status":"completed"}"#,
        )
        .expect("decode");
        assert!(accepted.success);
        assert_eq!(accepted.action_id.as_deref(), Some("a-1"));

        let canceled: ActionOutcome =
            serde_json::from_str(r#"{"success":true,"status":"canceled"}"#).expect("decode");
        assert_eq!(canceled.status, "canceled");
        assert_eq!(canceled.action_id, None);
    }

    #[tokio::test]
    async fn already_resolved_proposal_is_rejected_with_server_detail() {
        let base_url = crate::testutil::serve_once(
            "HTTP/1.1 409 Conflict",
            r#"{"detail":"proposal p-1 already resolved"}"#,
        )
        .await;
        let client =
            LadleClient::new(ClientConfig::new(base_url).timeout(Duration::from_secs(2)))
                .expect("client");

        let result = client.accept_action("p-1").await;
        match result {
            Err(ActionError::Rejected { status, detail }) => {
                assert_eq!(status, 409);
                assert!(detail.contains("already resolved"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error_not_a_rejection() {
        let client = LadleClient::new(
            ClientConfig::new("http://127.0.0.1:1").timeout(Duration::from_millis(200)),
        )
        .expect("client");
        let result = client.accept_action("p-1").await;
        assert!(matches!(result, Err(ActionError::Transport(_))));
    }
}
