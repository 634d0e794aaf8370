//! CDP (Chrome DevTools Protocol) type definitions
//!
//! Wire structures of the JSON-RPC exchange and of the few command payloads
//! the driver sends.

use serde::{Deserialize, Serialize};

/// CDP JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Request ID
    pub id: u64,
    /// Method name (e.g., "Page.navigate")
    pub method: String,
    /// Method parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
    /// Session ID for multi-session targets
    #[serde(skip_serializing_if = "Option::is_none", rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP JSON-RPC notification (event)
#[derive(Debug, Clone, Deserialize)]
pub struct CdpNotification {
    /// Event method
    pub method: String,
    /// Event parameters
    #[serde(default)]
    pub params: serde_json::Value,
    /// Session ID for multi-session targets
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// CDP JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct CdpRpcResponse {
    /// Response ID (matches request ID)
    pub id: u64,
    /// Response result
    #[serde(default)]
    pub result: serde_json::Value,
    /// Error if any
    #[serde(default)]
    pub error: Option<CdpErrorDetail>,
}

/// CDP error detail
#[derive(Debug, Clone, Deserialize)]
pub struct CdpErrorDetail {
    /// Error code
    pub code: i32,
    /// Error message
    pub message: String,
    /// Additional error data
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Incoming frame, either a command response or an event
#[derive(Debug, Clone)]
pub enum CdpMessage {
    /// Response to one of our commands
    Response(CdpRpcResponse),
    /// Notification/Event (server -> client)
    Notification(CdpNotification),
}

impl CdpMessage {
    /// Classify a text frame. Responses carry an `id`, events do not.
    pub fn parse(text: &str) -> Option<Self> {
        if let Ok(response) = serde_json::from_str::<CdpRpcResponse>(text) {
            return Some(CdpMessage::Response(response));
        }
        serde_json::from_str::<CdpNotification>(text)
            .ok()
            .map(CdpMessage::Notification)
    }
}

/// Page navigation parameters
#[derive(Debug, Clone, Serialize)]
pub struct NavigateParams {
    /// URL to navigate to
    pub url: String,
}

/// JavaScript evaluation parameters
#[derive(Debug, Clone, Serialize)]
pub struct EvaluateParams {
    /// JavaScript expression to evaluate
    pub expression: String,
    /// Whether to await promise
    #[serde(skip_serializing_if = "Option::is_none", rename = "awaitPromise")]
    pub await_promise: Option<bool>,
    /// Whether to return as value
    #[serde(skip_serializing_if = "Option::is_none", rename = "returnByValue")]
    pub return_by_value: Option<bool>,
    /// Treat the evaluation as initiated by a user gesture
    #[serde(skip_serializing_if = "Option::is_none", rename = "userGesture")]
    pub user_gesture: Option<bool>,
}

/// Mouse event parameters for `Input.dispatchMouseEvent`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseEventParams {
    /// mouseMoved, mousePressed or mouseReleased
    #[serde(rename = "type")]
    pub event_type: String,
    /// X coordinate in CSS pixels
    pub x: f64,
    /// Y coordinate in CSS pixels
    pub y: f64,
    /// Mouse button
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    /// Click count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<u32>,
}

/// Key event parameters for `Input.dispatchKeyEvent`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyEventParams {
    /// keyDown, keyUp or char
    #[serde(rename = "type")]
    pub event_type: String,
    /// DOM key value
    pub key: String,
    /// DOM code value
    pub code: String,
    /// Windows virtual key code
    pub windows_virtual_key_code: u32,
    /// Text produced by the key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Remote object (result of JavaScript evaluation)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RemoteObject {
    /// Object type
    #[serde(default)]
    pub r#type: String,
    /// Object subtype
    #[serde(default)]
    pub subtype: Option<String>,
    /// Object value
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    /// Object description
    #[serde(default)]
    pub description: Option<String>,
}

/// Exception details
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
    /// Exception text
    #[serde(default)]
    pub text: Option<String>,
    /// Exception object
    #[serde(default)]
    pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
    /// Most specific description available
    pub fn message(&self) -> String {
        self.exception
            .as_ref()
            .and_then(|e| e.description.clone())
            .or_else(|| self.text.clone())
            .unwrap_or_else(|| "Unknown error".to_string())
    }
}

/// JavaScript evaluation response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateResponse {
    /// Evaluation result
    #[serde(default)]
    pub result: RemoteObject,
    /// Exception details if evaluation failed
    #[serde(default)]
    pub exception_details: Option<ExceptionDetails>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cdp_request_serialization() {
        let request = CdpRequest {
            id: 1,
            method: "Page.navigate".to_string(),
            params: Some(serde_json::json!({ "url": "https://app.slack.com/client" })),
            session_id: None,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"method\":\"Page.navigate\""));
        assert!(!json.contains("sessionId"));
    }

    #[test]
    fn test_message_classification() {
        let response = CdpMessage::parse(r#"{"id":7,"result":{}}"#);
        assert!(matches!(response, Some(CdpMessage::Response(r)) if r.id == 7));

        let event = CdpMessage::parse(
            r#"{"method":"Page.javascriptDialogOpening","params":{"type":"alert"}}"#,
        );
        assert!(matches!(event, Some(CdpMessage::Notification(n)) if n.params["type"] == "alert"));

        assert!(CdpMessage::parse("not json").is_none());
    }

    #[test]
    fn test_mouse_event_wire_names() {
        let params = MouseEventParams {
            event_type: "mousePressed".to_string(),
            x: 10.0,
            y: 20.0,
            button: Some("left".to_string()),
            click_count: Some(1),
        };
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["type"], "mousePressed");
        assert_eq!(json["clickCount"], 1);
    }

    #[test]
    fn test_exception_message_prefers_description() {
        let details: ExceptionDetails = serde_json::from_value(serde_json::json!({
            "text": "Uncaught",
            "exception": { "type": "object", "description": "TypeError: x is null" }
        }))
        .unwrap();
        assert_eq!(details.message(), "TypeError: x is null");
    }
}
