//! Request and response bodies of the agent backend

use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::domain::VisualPlan;

/// Reply of `POST /plan`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningSessionResponse {
    pub session_id: String,
    pub websocket_url: String,
    #[serde(default)]
    pub num_images: Option<usize>,
}

/// Reply of `POST /execute`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSessionResponse {
    #[serde(default)]
    pub session_id: Option<String>,
    pub websocket_url: String,
    #[serde(default)]
    pub num_images: Option<usize>,
}

/// Body of `POST /execute`
///
/// Without a planning session id the backend has nothing to link the run
/// to; the request still goes out and the backend decides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub visual_plan: VisualPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,
    pub audio_track_name: String,
}

/// Reply of `GET /device/status`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    pub connected: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Reply of `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

/// Reply of `GET /sessions`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionList {
    #[serde(default)]
    pub active_sessions: Vec<String>,
}

/// The backend reports rejections as `{"error": ".."}` with a success status
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ApiReply<T> {
    Rejected { error: String },
    Accepted(T),
}

impl<T> ApiReply<T> {
    pub(crate) fn into_result(self) -> Result<T, ApiError> {
        match self {
            Self::Rejected { error } => Err(ApiError::Rejected(error)),
            Self::Accepted(body) => Ok(body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_request_omits_missing_linkage() {
        let request = ExecutionRequest {
            visual_plan: VisualPlan::default(),
            planning_session_id: None,
            audio_path: None,
            audio_track_name: "audio_1".to_string(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("planning_session_id").is_none());
        assert!(json.get("audio_path").is_none());
        assert_eq!(json["audio_track_name"], "audio_1");
        assert!(json["visual_plan"]["plan"].is_array());
    }

    #[test]
    fn test_reply_error_shape() {
        let reply: ApiReply<PlanningSessionResponse> =
            serde_json::from_str(r#"{"error":"No prompt provided"}"#).unwrap();
        match reply.into_result() {
            Err(ApiError::Rejected(msg)) => assert_eq!(msg, "No prompt provided"),
            other => panic!("Expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_reply_success_shape() {
        let reply: ApiReply<PlanningSessionResponse> = serde_json::from_str(
            r#"{"session_id":"s-1","websocket_url":"ws://localhost:5000/ws/s-1","num_images":3}"#,
        )
        .unwrap();
        let body = reply.into_result().unwrap();
        assert_eq!(body.session_id, "s-1");
        assert_eq!(body.num_images, Some(3));
    }

    #[test]
    fn test_sessions_default_empty() {
        let list: SessionList = serde_json::from_str("{}").unwrap();
        assert!(list.active_sessions.is_empty());
    }
}
