use serde::{Deserialize, Serialize};

/// Sender tag the server uses for messages typed by the local user.
pub const USER_SENDER: &str = "user";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Conversation {
    #[serde(rename = "conversation_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
}

impl Conversation {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            title: title.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    #[serde(rename = "message_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub sender: String,
    pub content: String,
}

impl Message {
    pub fn is_from_user(&self) -> bool {
        self.sender == USER_SENDER
    }
}

/// Body of `POST /ai-conversations/{id}/messages`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub conversation_id: String,
    pub user_id: String,
    pub content: String,
    pub sender: String,
}

impl CreateMessageRequest {
    pub fn from_user(
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            content: content.into(),
            sender: USER_SENDER.to_string(),
        }
    }
}

/// Body of `POST /ai-conversations`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn conversation_reads_conversation_id_as_id() {
        let conv: Conversation =
            serde_json::from_value(json!({"conversation_id": "42", "title": "Mystery Cave"})).unwrap();
        assert_eq!(conv, Conversation::new("42", "Mystery Cave"));
    }

    #[test]
    fn conversation_without_id_decodes_as_none() {
        let conv: Conversation = serde_json::from_value(json!({"title": "Draft"})).unwrap();
        assert_eq!(conv.id, None);
    }

    #[test]
    fn message_maps_wire_fields() {
        let msg: Message = serde_json::from_value(json!({
            "message_id": "m1",
            "conversation_id": "c1",
            "sender": "assistant",
            "content": "The cave is dark."
        }))
        .unwrap();
        assert_eq!(msg.id.as_deref(), Some("m1"));
        assert_eq!(msg.conversation_id.as_deref(), Some("c1"));
        assert!(!msg.is_from_user());
    }

    #[test]
    fn message_without_content_is_rejected() {
        let res = serde_json::from_value::<Message>(json!({"message_id": "m1", "sender": "user"}));
        assert!(res.is_err());
    }

    #[test]
    fn create_message_request_uses_camel_case_keys() {
        let req = CreateMessageRequest::from_user("c1", "u1", "hello");
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({"conversationId": "c1", "userId": "u1", "content": "hello", "sender": "user"})
        );
    }

    #[test]
    fn create_conversation_request_omits_missing_user() {
        let req = CreateConversationRequest {
            user_id: None,
            title: "Battle of Fedi".into(),
        };
        assert_eq!(serde_json::to_value(&req).unwrap(), json!({"title": "Battle of Fedi"}));
    }
}
