//! Push message shapes

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Screen a tapped task notification opens
pub const TASK_DETAIL_ROUTE: &str = "/(tabs)/taskDetail";

/// One Expo push message, addressed to a single token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub to: String,
    pub sound: String,
    pub title: String,
    pub body: String,
    pub data: Value,
}

/// Content broadcast to every recipient
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub data: Option<Value>,
}

impl PushPayload {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Message for one token; missing data is sent as `{}`
    pub fn message_to(&self, token: &str) -> PushMessage {
        PushMessage {
            to: token.to_string(),
            sound: "default".to_string(),
            title: self.title.clone(),
            body: self.body.clone(),
            data: self.data.clone().unwrap_or_else(|| json!({})),
        }
    }
}

/// A notification about one task
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskNotice {
    pub title: String,
    pub body: String,
    pub task_key: Option<String>,
}

impl TaskNotice {
    pub fn new(title: impl Into<String>, body: impl Into<String>, task_key: Option<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            task_key,
        }
    }

    /// Payload whose data routes a tap to the task detail screen
    pub fn into_payload(self) -> PushPayload {
        let data = json!({
            "taskKey": self.task_key,
            "route": TASK_DETAIL_ROUTE,
        });
        PushPayload::new(self.title, self.body).with_data(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shape() {
        let message = PushPayload::new("공정 상태 변경", "명함: [인쇄] 완료").message_to("ExponentPushToken[a]");
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({
                "to": "ExponentPushToken[a]",
                "sound": "default",
                "title": "공정 상태 변경",
                "body": "명함: [인쇄] 완료",
                "data": {}
            })
        );
    }

    #[test]
    fn test_task_notice_routes_to_detail() {
        let payload = TaskNotice::new("작업 삭제", "명함: 작업 삭제", Some("T1".into())).into_payload();
        assert_eq!(
            payload.data,
            Some(json!({"taskKey": "T1", "route": "/(tabs)/taskDetail"}))
        );
    }
}
