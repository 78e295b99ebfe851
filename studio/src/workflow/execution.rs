//! Execution stream handling

use chrono::Utc;
use tracing::{debug, info, warn};

use super::reducer::Workflow;
use super::state::{DoneState, ExecutionStep, Phase, VideoSummary};
use super::Effect;
use crate::notify::Notification;
use crate::protocol::{ExecutionEvent, ExecutionReport, ExecutionStage};

impl Workflow {
    pub(super) fn on_execution_event(&mut self, event: ExecutionEvent) -> Vec<Effect> {
        debug!(event_type = event.event_type(), phase = %self.state.phase, "Workflow::on_execution_event: called");

        if let ExecutionEvent::Error { message } = event {
            warn!(?message, "execution error");
            self.processing = false;
            let description = message.unwrap_or_else(|| "Something went wrong".to_string());
            return vec![Effect::Notify(
                Notification::error("Execution error").with_description(description),
            )];
        }

        if self.state.phase != Phase::Editing {
            debug!(event_type = event.event_type(), phase = %self.state.phase, "execution event outside editing, ignoring");
            return Vec::new();
        }

        match event {
            ExecutionEvent::Stage {
                stage,
                progress,
                message,
            } => {
                let (step, default) = stage_step(stage);
                if step != self.execution_progress.step {
                    self.execution_progress.progress = None;
                }
                self.execution_progress.step = step;
                if stage == ExecutionStage::ExecutingPlan {
                    self.state.editing.mark_running(Utc::now());
                }
                if progress.is_some() {
                    self.execution_progress.progress = progress;
                }
                self.execution_progress.message = message.unwrap_or_else(|| default.to_string());
                Vec::new()
            }
            ExecutionEvent::ExecutionComplete { report } => self.on_execution_complete(report),
            ExecutionEvent::Warning { message } => {
                let mut notification = Notification::warning("Warning");
                notification.description = message;
                vec![Effect::Notify(notification)]
            }
            ExecutionEvent::Info { message } => match message {
                Some(message) => vec![Effect::Notify(Notification::info(message))],
                None => Vec::new(),
            },
            ExecutionEvent::AgentLog { message } => {
                match message.filter(|m| !m.is_empty()) {
                    Some(line) => self.execution_logs.push(line),
                    None => debug!("agent log without text, skipping"),
                }
                Vec::new()
            }
            ExecutionEvent::Unrecognized { kind } => {
                debug!(%kind, "ignoring unrecognized execution event");
                Vec::new()
            }
            ExecutionEvent::Error { .. } => Vec::new(),
        }
    }

    fn on_execution_complete(&mut self, report: Option<ExecutionReport>) -> Vec<Effect> {
        let summary = VideoSummary::from_planning(&self.state.planning);
        info!(
            effects = summary.effects_count,
            transitions = summary.transitions_count,
            track = %summary.track_used,
            "execution complete"
        );
        self.execution_progress.step = ExecutionStep::Complete;
        self.execution_progress.progress = Some(100);
        self.execution_progress.message = "Execution complete!".to_string();
        let success = report.as_ref().is_none_or(|r| r.success);
        self.state.editing.finish(success, Utc::now());
        self.state.phase = Phase::Done;
        self.state.done = DoneState {
            video_url: None,
            summary: Some(summary),
            report,
        };
        self.processing = false;
        vec![Effect::Notify(
            Notification::success("Execution complete").with_description("Your video has been edited on the device!"),
        )]
    }
}

/// Step marker and default message for a device stage
fn stage_step(stage: ExecutionStage) -> (ExecutionStep, &'static str) {
    match stage {
        ExecutionStage::ExecutionStarted | ExecutionStage::DeviceConnected => {
            (ExecutionStep::UploadingImages, "Starting execution...")
        }
        ExecutionStage::UploadingImages => (ExecutionStep::UploadingImages, "Uploading images..."),
        ExecutionStage::UploadingAudio => (ExecutionStep::UploadingAudio, "Uploading audio..."),
        ExecutionStage::SelectingImages | ExecutionStage::SelectingImagesComplete => {
            (ExecutionStep::SelectingImages, "Selecting images in the editor...")
        }
        ExecutionStage::ExecutingPlan => (ExecutionStep::ExecutingPlan, "Executing editing plan..."),
    }
}
