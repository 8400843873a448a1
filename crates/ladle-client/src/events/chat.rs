/// Discriminator of a chat stream event.
///
/// Unknown kinds decode to `Unknown` so server-added events pass through the
/// dispatcher without breaking older clients.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatEventKind {
    /// Assistant status update.
    Status,
    /// Incremental text delta for one message.
    #[serde(rename = "message.delta")]
    MessageDelta,
    /// Structured content block appended to the reply.
    #[serde(rename = "blocks.append")]
    BlocksAppend,
    /// One assistant message finished.
    #[serde(rename = "message.complete")]
    MessageComplete,
    /// A tool invocation started server-side.
    #[serde(rename = "tool.started")]
    ToolStarted,
    /// The assistant proposed an action that needs confirmation.
    #[serde(rename = "tool.proposed")]
    ToolProposed,
    /// Terminal stream failure.
    Error,
    /// Terminal stream success. The conversation itself stays open.
    Done,
    /// Kind this client does not know; dropped without error.
    #[serde(other)]
    Unknown,
}

/// One decoded frame of a chat stream.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct ChatEvent {
    /// Event discriminator.
    pub event: ChatEventKind,
    /// Conversation this stream belongs to.
    pub conversation_id: String,
    /// Message the event applies to, when the event is message-scoped.
    #[serde(default)]
    pub message_id: Option<String>,
    /// Event-specific payload; decoded further at dispatch time.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl ChatEvent {
    /// Whether this event ends the stream attempt.
    pub fn is_terminal(&self) -> bool {
        matches!(self.event, ChatEventKind::Error | ChatEventKind::Done)
    }
}

/// Payload of a `message.delta` event.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct MessageDelta {
    /// Text fragment to append to the message.
    pub delta: String,
}

/// Payload of a `tool.started` event.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct ToolStarted {
    /// Kind of tool that started running.
    pub action_kind: String,
    /// Optional progress detail.
    #[serde(default)]
    pub detail: Option<String>,
}

/// Action proposed by the assistant mid-conversation.
///
/// Lives past the stream: the caller resolves it later through the
/// accept/cancel calls, and the server decides whether it is still valid at
/// that point.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct ProposedAction {
    /// Identifier used by the accept/cancel calls.
    pub proposal_id: String,
    /// What the action would do (for example `add_to_meal_plan`).
    pub action_kind: String,
    /// Action-specific parameters, passed through for display.
    #[serde(default)]
    pub parameters: serde_json::Value,
}
