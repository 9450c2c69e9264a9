//! Conversation types shared between the turn runner and frontends.

use serde::{Deserialize, Serialize};

/// Role in a conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered message history for one chat session.
///
/// Append-only, except that the most recent assistant message may be
/// rewritten in place while a reply is streaming into it. At most one
/// assistant message is open at a time, and while a stream is active the
/// open message is always the last element.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index.
    pub fn append(&mut self, message: ChatMessage) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }

    /// Rewrite the content of the message at `index`. Out-of-range indices
    /// are ignored; the single-writer turn runner never produces one.
    pub fn update_at(&mut self, index: usize, content: impl Into<String>) {
        if let Some(message) = self.messages.get_mut(index) {
            message.content = content.into();
        }
    }

    pub fn snapshot(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of user messages submitted so far.
    pub fn user_turns(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == Role::User)
            .count()
    }
}

/// The JSON body POSTed to the chat streaming endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub device_fingerprint: String,
    pub chat_session_id: String,
}

impl ChatRequest {
    pub fn new(
        message: impl Into<String>,
        device_fingerprint: impl Into<String>,
        chat_session_id: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            device_fingerprint: device_fingerprint.into(),
            chat_session_id: chat_session_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_helpers() {
        let user = ChatMessage::user("hello");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.content, "hello");

        let assistant = ChatMessage::assistant("hi there");
        assert_eq!(assistant.role, Role::Assistant);
        assert_eq!(assistant.content, "hi there");
    }

    #[test]
    fn append_returns_index() {
        let mut conversation = Conversation::new();
        assert_eq!(conversation.append(ChatMessage::user("one")), 0);
        assert_eq!(conversation.append(ChatMessage::assistant("two")), 1);
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn update_at_rewrites_content() {
        let mut conversation = Conversation::new();
        conversation.append(ChatMessage::user("question"));
        let slot = conversation.append(ChatMessage::assistant(""));

        conversation.update_at(slot, "partial");
        assert_eq!(conversation.snapshot()[slot].content, "partial");

        conversation.update_at(slot, "partial answer");
        assert_eq!(conversation.snapshot()[slot].content, "partial answer");
    }

    #[test]
    fn update_at_out_of_range_is_ignored() {
        let mut conversation = Conversation::new();
        conversation.append(ChatMessage::user("hi"));
        conversation.update_at(5, "nope");
        assert_eq!(conversation.snapshot()[0].content, "hi");
    }

    #[test]
    fn user_turns_counts_only_user_messages() {
        let mut conversation = Conversation::new();
        conversation.append(ChatMessage::user("a"));
        conversation.append(ChatMessage::assistant("b"));
        conversation.append(ChatMessage::user("c"));
        assert_eq!(conversation.user_turns(), 2);
    }

    #[test]
    fn role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn chat_request_wire_fields() {
        let request = ChatRequest::new("Hello", "d1234", "c5678");
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["message"], "Hello");
        assert_eq!(json["device_fingerprint"], "d1234");
        assert_eq!(json["chat_session_id"], "c5678");
    }

    #[test]
    fn conversation_roundtrip() {
        let mut conversation = Conversation::new();
        conversation.append(ChatMessage::user("hi"));
        conversation.append(ChatMessage::assistant("hello"));

        let json = serde_json::to_string(&conversation).unwrap();
        let restored: Conversation = serde_json::from_str(&json).unwrap();
        assert_eq!(conversation, restored);
    }
}
