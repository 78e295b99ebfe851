//! Execution channel alphabet
//!
//! Events streamed while the plan is executed on the connected device.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::wire::{ProtocolError, WireMessage};

/// Outcome reported with `execution_complete`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionReport {
    pub success: bool,
    pub num_images: usize,
    pub plan_steps: usize,
    pub audio_added: bool,
}

/// Device-side stage reported by a stage event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStage {
    ExecutionStarted,
    DeviceConnected,
    UploadingImages,
    UploadingAudio,
    SelectingImages,
    SelectingImagesComplete,
    ExecutingPlan,
}

impl ExecutionStage {
    fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "execution_started" => Some(Self::ExecutionStarted),
            "device_connected" => Some(Self::DeviceConnected),
            "uploading_images" => Some(Self::UploadingImages),
            "uploading_audio" => Some(Self::UploadingAudio),
            "selecting_images" => Some(Self::SelectingImages),
            "selecting_images_complete" => Some(Self::SelectingImagesComplete),
            "executing_plan" => Some(Self::ExecutingPlan),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecutionStarted => "execution_started",
            Self::DeviceConnected => "device_connected",
            Self::UploadingImages => "uploading_images",
            Self::UploadingAudio => "uploading_audio",
            Self::SelectingImages => "selecting_images",
            Self::SelectingImagesComplete => "selecting_images_complete",
            Self::ExecutingPlan => "executing_plan",
        }
    }
}

/// Every event the execution channel can deliver
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    Stage {
        stage: ExecutionStage,
        progress: Option<u8>,
        message: Option<String>,
    },
    ExecutionComplete { report: Option<ExecutionReport> },
    Error { message: Option<String> },
    Warning { message: Option<String> },
    Info { message: Option<String> },
    /// `agent_log` and `agent_step`
    AgentLog { message: Option<String> },
    /// A type this client does not know; ignored by the reducer
    Unrecognized { kind: String },
}

impl ExecutionEvent {
    /// Decode a wire frame into a typed execution event
    pub fn decode(msg: WireMessage) -> Result<Self, ProtocolError> {
        if let Some(stage) = ExecutionStage::from_wire(&msg.kind) {
            return Ok(Self::Stage {
                stage,
                progress: msg.percent(),
                message: msg.message,
            });
        }

        let event = match msg.kind.as_str() {
            "execution_complete" => Self::ExecutionComplete {
                report: report_from(&msg),
            },
            "error" => Self::Error { message: msg.message },
            "warning" => Self::Warning { message: msg.message },
            "info" => Self::Info { message: msg.message },
            "agent_log" | "agent_step" => Self::AgentLog { message: msg.message },
            _ => Self::Unrecognized { kind: msg.kind },
        };
        Ok(event)
    }

    /// Parse and decode a text frame
    pub fn from_text(text: &str) -> Result<Self, ProtocolError> {
        Self::decode(WireMessage::parse(text)?)
    }

    /// Wire name of this event
    pub fn event_type(&self) -> &str {
        match self {
            Self::Stage { stage, .. } => stage.as_str(),
            Self::ExecutionComplete { .. } => "execution_complete",
            Self::Error { .. } => "error",
            Self::Warning { .. } => "warning",
            Self::Info { .. } => "info",
            Self::AgentLog { .. } => "agent_log",
            Self::Unrecognized { kind } => kind,
        }
    }
}

fn report_from(msg: &WireMessage) -> Option<ExecutionReport> {
    let data = msg.data.clone()?;
    match serde_json::from_value(data) {
        Ok(report) => Some(report),
        Err(e) => {
            warn!(error = %e, "execution_complete: ignoring malformed report");
            None
        }
    }
}
