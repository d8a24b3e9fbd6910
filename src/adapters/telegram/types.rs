//! Telegram Bot API Request/Response Types
//!
//! Only the fields the bot reads. Unknown fields are ignored by serde.

use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
  pub ok: bool,
  pub result: Option<T>,
  pub description: Option<String>,
  pub error_code: Option<i64>,
  pub parameters: Option<ResponseParameters>,
}

impl<T> ApiResponse<T> {
  /// Seconds to wait before retrying, when flood control kicked in.
  pub fn retry_after(&self) -> Option<u64> {
    self.parameters.as_ref().and_then(|p| p.retry_after)
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseParameters {
  pub retry_after: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
  pub update_id: i64,
  pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
  pub message_id: i64,
  pub chat: Chat,
  pub from: Option<User>,
  pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
  pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
  pub id: i64,
  pub username: Option<String>,
}

/// `getUpdates` payload.
#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
  pub offset: i64,
  /// Long-poll timeout in seconds.
  pub timeout: u64,
  pub allowed_updates: Vec<&'static str>,
}

/// `sendMessage` payload.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
  pub chat_id: i64,
  pub text: &'a str,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_updates() {
    let body = r#"{
      "ok": true,
      "result": [
        {"update_id": 10, "message": {"message_id": 1, "chat": {"id": 42, "type": "private"},
          "from": {"id": 42, "is_bot": false, "username": "ana"}, "text": "/start"}},
        {"update_id": 11, "edited_message": {}}
      ]
    }"#;
    let parsed: ApiResponse<Vec<Update>> = serde_json::from_str(body).unwrap();
    let updates = parsed.result.unwrap();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 42);
    assert!(updates[1].message.is_none());
  }

  #[test]
  fn test_flood_control_retry_after() {
    let body = r#"{"ok": false, "error_code": 429, "description": "Too Many Requests",
      "parameters": {"retry_after": 7}}"#;
    let parsed: ApiResponse<serde_json::Value> = serde_json::from_str(body).unwrap();
    assert!(!parsed.ok);
    assert_eq!(parsed.retry_after(), Some(7));
  }
}
