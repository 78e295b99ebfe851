//! Agent workflow
//!
//! `Workflow` is a synchronous reducer over the idle → planning → editing →
//! done state machine. Channel events, session-start results and timers come
//! in as `Input`s; everything the outside world must do comes back out as
//! `Effect`s for the runtime to execute.
//!
//! Every input carries the epoch of the attempt that produced it. Starting or
//! resetting bumps the epoch, so late input from an abandoned attempt is a
//! no-op.

mod execution;
mod identity;
mod planning;
mod reducer;
mod state;
mod view;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use identity::SessionIdentity;
pub use reducer::{ExecutionProgress, PlanningProgress, Workflow};
pub use state::{
    AgentState, DoneState, EditingState, ExecutedStep, ExecutionStep, Phase, PlanningState, PlanningStep, StepStatus,
    VideoSummary,
};
pub use view::ViewSelector;

use crate::api::ExecutionRequest;
use crate::channel::ChannelKind;
use crate::notify::Notification;
use crate::protocol::{ExecutionEvent, PlanningEvent};

/// Default pause between the final plan and the start of editing
pub const DEFAULT_EDITING_DELAY: Duration = Duration::from_millis(1500);

/// Default audio track label sent with the execution request
pub const DEFAULT_AUDIO_TRACK: &str = "audio_1";

/// Something that happened outside the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    PlanningSessionStarted {
        epoch: u64,
        session_id: String,
        websocket_url: String,
    },
    ExecutionSessionStarted {
        epoch: u64,
        websocket_url: String,
    },
    /// A session-start request failed before any channel was opened
    StartFailed {
        epoch: u64,
        kind: ChannelKind,
        reason: String,
    },
    Planning {
        epoch: u64,
        event: PlanningEvent,
    },
    Execution {
        epoch: u64,
        event: ExecutionEvent,
    },
    /// Connecting failed or the channel errored mid-stream
    ChannelFailed {
        epoch: u64,
        kind: ChannelKind,
        reason: String,
    },
    ChannelClosed {
        epoch: u64,
        kind: ChannelKind,
    },
    EditingDelayElapsed {
        epoch: u64,
    },
}

impl Input {
    pub fn epoch(&self) -> u64 {
        match self {
            Self::PlanningSessionStarted { epoch, .. }
            | Self::ExecutionSessionStarted { epoch, .. }
            | Self::StartFailed { epoch, .. }
            | Self::Planning { epoch, .. }
            | Self::Execution { epoch, .. }
            | Self::ChannelFailed { epoch, .. }
            | Self::ChannelClosed { epoch, .. }
            | Self::EditingDelayElapsed { epoch } => *epoch,
        }
    }

    /// Channel this input arrived on, if it came from a push channel
    pub fn channel(&self) -> Option<ChannelKind> {
        match self {
            Self::Planning { .. } => Some(ChannelKind::Planning),
            Self::Execution { .. } => Some(ChannelKind::Execution),
            Self::ChannelFailed { kind, .. } | Self::ChannelClosed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Work the runtime performs on behalf of the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Notify(Notification),
    StartPlanning {
        epoch: u64,
        images: Vec<PathBuf>,
        prompt: String,
    },
    OpenChannel {
        epoch: u64,
        kind: ChannelKind,
        url: String,
    },
    ScheduleEditing {
        epoch: u64,
        delay: Duration,
    },
    /// Retire the planning channel, then request the execution session
    StartExecution {
        epoch: u64,
        request: ExecutionRequest,
    },
    /// Cancel and close whatever channel is open
    CloseChannels,
}

/// Why the agent refused to start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("Please upload at least one image")]
    NoImages,

    #[error("Please describe how you want your edits")]
    EmptyPrompt,

    #[error("Agent is already {0}; reset before starting again")]
    NotIdle(Phase),
}

/// Tunables of the workflow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub editing_delay: Duration,
    pub audio_track_name: String,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            editing_delay: DEFAULT_EDITING_DELAY,
            audio_track_name: DEFAULT_AUDIO_TRACK.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_epoch_and_channel() {
        let input = Input::ChannelClosed {
            epoch: 7,
            kind: ChannelKind::Execution,
        };
        assert_eq!(input.epoch(), 7);
        assert_eq!(input.channel(), Some(ChannelKind::Execution));

        let input = Input::EditingDelayElapsed { epoch: 2 };
        assert_eq!(input.epoch(), 2);
        assert_eq!(input.channel(), None);
    }

    #[test]
    fn test_default_settings() {
        let settings = WorkflowSettings::default();
        assert_eq!(settings.editing_delay, Duration::from_millis(1500));
        assert_eq!(settings.audio_track_name, "audio_1");
    }
}
