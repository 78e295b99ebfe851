//! Raw push-channel frames

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors decoding a push-channel frame
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Frame(#[from] serde_json::Error),

    #[error("Event '{kind}' is missing its data payload")]
    MissingData { kind: String },

    #[error("Event '{kind}' has an invalid payload: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A frame as sent by the backend: `{type, data?, message?, progress?}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl WireMessage {
    /// Parse a text frame
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Progress clamped to 0-100
    pub fn percent(&self) -> Option<u8> {
        self.progress.map(clamp_percent)
    }

    /// Decode the `data` payload into a typed artifact
    pub(crate) fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        let data = self.data.clone().ok_or_else(|| ProtocolError::MissingData {
            kind: self.kind.clone(),
        })?;
        serde_json::from_value(data).map_err(|source| ProtocolError::Payload {
            kind: self.kind.clone(),
            source,
        })
    }
}

/// Frame the client sends to ask the backend to stop the running task
#[derive(Debug, Clone, Serialize)]
pub struct CancelFrame {
    #[serde(rename = "type")]
    kind: &'static str,
}

impl CancelFrame {
    pub fn new() -> Self {
        Self { kind: "cancel" }
    }

    pub fn to_text(&self) -> String {
        // A struct with one static string field always serializes
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"cancel"}"#.to_string())
    }
}

impl Default for CancelFrame {
    fn default() -> Self {
        Self::new()
    }
}

fn clamp_percent(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.clamp(0.0, 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_frame() {
        let msg = WireMessage::parse(r#"{"type":"planning_started"}"#).unwrap();
        assert_eq!(msg.kind, "planning_started");
        assert!(msg.data.is_none());
        assert!(msg.message.is_none());
        assert!(msg.percent().is_none());
    }

    #[test]
    fn test_parse_rejects_missing_type() {
        assert!(matches!(
            WireMessage::parse(r#"{"message":"hi"}"#),
            Err(ProtocolError::Frame(_))
        ));
        assert!(WireMessage::parse("not json").is_err());
    }

    #[test]
    fn test_percent_is_clamped() {
        let mut msg = WireMessage::parse(r#"{"type":"download_progress","progress":150}"#).unwrap();
        assert_eq!(msg.percent(), Some(100));
        msg.progress = Some(-3.0);
        assert_eq!(msg.percent(), Some(0));
        msg.progress = Some(33.4);
        assert_eq!(msg.percent(), Some(33));
    }

    #[test]
    fn test_payload_missing_data() {
        let msg = WireMessage::parse(r#"{"type":"visual_plan"}"#).unwrap();
        let result: Result<serde_json::Value, _> = msg.payload();
        assert!(matches!(result, Err(ProtocolError::MissingData { .. })));
    }

    #[test]
    fn test_cancel_frame() {
        assert_eq!(CancelFrame::new().to_text(), r#"{"type":"cancel"}"#);
    }
}
