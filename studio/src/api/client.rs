//! AgentApi trait definition

use std::path::PathBuf;

use async_trait::async_trait;

use super::{
    ApiError, DeviceStatus, ExecutionRequest, ExecutionSessionResponse, HealthStatus, PlanningSessionResponse,
    SessionList,
};

/// Request/response calls to the agent backend
///
/// Session starts return the URL of the push channel that streams the
/// session's progress; the channel itself is opened by a `PushConnector`.
#[async_trait]
pub trait AgentApi: Send + Sync {
    /// Upload images and prompt, creating a planning session
    async fn start_planning(&self, images: &[PathBuf], prompt: &str) -> Result<PlanningSessionResponse, ApiError>;

    /// Hand the finished plan to the device executor
    async fn start_execution(&self, request: &ExecutionRequest) -> Result<ExecutionSessionResponse, ApiError>;

    async fn device_status(&self) -> Result<DeviceStatus, ApiError>;

    async fn health(&self) -> Result<HealthStatus, ApiError>;

    async fn sessions(&self) -> Result<SessionList, ApiError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Mock backend for unit tests
    ///
    /// Planning and execution starts succeed with fixed channel URLs unless
    /// a rejection message is configured.
    #[derive(Default)]
    pub struct MockAgentApi {
        pub planning_rejection: Option<String>,
        pub execution_rejection: Option<String>,
        planning_calls: AtomicUsize,
        execution_requests: Mutex<Vec<ExecutionRequest>>,
    }

    pub const PLANNING_URL: &str = "ws://mock/ws/plan-1";
    pub const EXECUTION_URL: &str = "ws://mock/ws/execute/exec-1";

    impl MockAgentApi {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn rejecting_planning(message: &str) -> Self {
            Self {
                planning_rejection: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub fn planning_calls(&self) -> usize {
            self.planning_calls.load(Ordering::SeqCst)
        }

        pub fn execution_requests(&self) -> Vec<ExecutionRequest> {
            self.execution_requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentApi for MockAgentApi {
        async fn start_planning(
            &self,
            images: &[PathBuf],
            prompt: &str,
        ) -> Result<PlanningSessionResponse, ApiError> {
            debug!(images = images.len(), %prompt, "MockAgentApi::start_planning: called");
            self.planning_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(msg) = &self.planning_rejection {
                return Err(ApiError::Rejected(msg.clone()));
            }
            Ok(PlanningSessionResponse {
                session_id: "plan-1".to_string(),
                websocket_url: PLANNING_URL.to_string(),
                num_images: Some(images.len()),
            })
        }

        async fn start_execution(&self, request: &ExecutionRequest) -> Result<ExecutionSessionResponse, ApiError> {
            debug!("MockAgentApi::start_execution: called");
            self.execution_requests.lock().unwrap().push(request.clone());
            if let Some(msg) = &self.execution_rejection {
                return Err(ApiError::Rejected(msg.clone()));
            }
            Ok(ExecutionSessionResponse {
                session_id: Some("exec-1".to_string()),
                websocket_url: EXECUTION_URL.to_string(),
                num_images: None,
            })
        }

        async fn device_status(&self) -> Result<DeviceStatus, ApiError> {
            Ok(DeviceStatus {
                connected: true,
                message: Some("emulator-5554".to_string()),
            })
        }

        async fn health(&self) -> Result<HealthStatus, ApiError> {
            Ok(HealthStatus {
                status: "healthy".to_string(),
                service: Some("mock".to_string()),
            })
        }

        async fn sessions(&self) -> Result<SessionList, ApiError> {
            Ok(SessionList::default())
        }
    }
}
