//! Trip planning chat client.

use anyhow::Result;
use trip_core::conversation::{
    ChatMessage, ChatRequest, ChatResponse, ConversationState, UserInputs,
};
use trip_core::models::Coordinate;

/// Client for one planning conversation with the trip server.
pub struct TripClient {
    pub(crate) base_url: String,
    pub(crate) stage: ConversationState,
    pub(crate) inputs: UserInputs,
    pub(crate) messages: Vec<ChatMessage>,
    pub(crate) client: reqwest::Client,
}

impl TripClient {
    /// Create a new client at the start of a conversation.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            stage: ConversationState::Initial,
            inputs: UserInputs::default(),
            messages: Vec::new(),
            client: reqwest::Client::new(),
        }
    }

    /// Current conversation stage.
    pub fn stage(&self) -> ConversationState {
        self.stage
    }

    pub fn inputs(&self) -> &UserInputs {
        &self.inputs
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Forget everything and start over at `INITIAL`.
    pub fn reset(&mut self) {
        self.stage = ConversationState::Initial;
        self.inputs = UserInputs::default();
        self.messages.clear();
    }

    /// Open the conversation and receive the greeting.
    pub async fn start(&mut self) -> Result<ChatResponse> {
        self.send_turn(None).await
    }

    /// Report the start and end pins.
    pub async fn set_pins(&mut self, start: Coordinate, end: Coordinate) -> Result<ChatResponse> {
        self.inputs.start = Some(start);
        self.inputs.end = Some(end);
        self.send_turn(None).await
    }

    /// Describe the trip in free text ("5 days, museums and lakes").
    pub async fn describe_trip(&mut self, text: &str) -> Result<ChatResponse> {
        self.inputs.last_user_message = Some(text.to_string());
        self.send_turn(Some(text)).await
    }

    /// Post the stored state for the current stage, record the exchange and
    /// advance when the server names a next stage.
    pub async fn send_turn(&mut self, user_message: Option<&str>) -> Result<ChatResponse> {
        if let Some(text) = user_message {
            self.messages.push(ChatMessage::user(text));
        }

        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            stage: Some(self.stage.to_string()),
            user_inputs: self.inputs.clone(),
            messages: self.messages.clone(),
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();
        let reply: ChatResponse = response.json().await?;
        if !status.is_success() {
            anyhow::bail!(
                "Chat turn failed ({}): {}",
                status,
                reply.message.as_deref().unwrap_or("no message")
            );
        }

        self.record_reply(&reply);
        Ok(reply)
    }

    fn record_reply(&mut self, reply: &ChatResponse) {
        if let Some(text) = reply.message.as_ref().or(reply.explanation.as_ref()) {
            self.messages.push(ChatMessage::assistant(text.clone()));
        }
        if let Some(next) = reply.next_stage {
            tracing::debug!(from = %self.stage, to = %next, "Conversation advanced");
            self.stage = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_advances_stage_and_records_message() {
        let mut client = TripClient::new("http://localhost:3000/");
        assert_eq!(client.base_url, "http://localhost:3000");

        client.record_reply(&ChatResponse::reply(
            "Hello",
            Some(ConversationState::WaitingForPins),
        ));
        assert_eq!(client.stage(), ConversationState::WaitingForPins);
        assert_eq!(client.messages(), &[ChatMessage::assistant("Hello")]);

        client.record_reply(&ChatResponse::reply("Pins please", None));
        assert_eq!(client.stage(), ConversationState::WaitingForPins);
        assert_eq!(client.messages().len(), 2);

        client.reset();
        assert_eq!(client.stage(), ConversationState::Initial);
        assert!(client.messages().is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error() {
        let mut client = TripClient::new("http://127.0.0.1:9");
        assert!(client.start().await.is_err());
        assert_eq!(client.stage(), ConversationState::Initial);
    }
}
