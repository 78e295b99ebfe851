//! Workflow reducer

use std::path::PathBuf;

use tracing::{debug, info, warn};

use super::identity::SessionIdentity;
use super::state::{AgentState, EditingState, ExecutionStep, Phase, PlanningStep};
use super::view::ViewSelector;
use super::{Effect, Input, StartError, WorkflowSettings};
use crate::api::ExecutionRequest;
use crate::channel::ChannelKind;
use crate::domain::{GalleryError, ImageGallery, TrackDurations, UploadedImage, UsageReport};
use crate::notify::Notification;

/// Planning sub-step and progress line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanningProgress {
    pub step: PlanningStep,
    pub download_progress: u8,
    pub message: String,
}

/// Execution step marker, stage progress and message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionProgress {
    pub step: ExecutionStep,
    pub progress: Option<u8>,
    pub message: String,
}

/// The agent workflow: state plus the rules that move it
#[derive(Debug, Default)]
pub struct Workflow {
    pub(super) settings: WorkflowSettings,
    pub(super) epoch: u64,
    pub(super) state: AgentState,
    pub(super) identity: SessionIdentity,
    pub(super) planning_progress: PlanningProgress,
    pub(super) usage: Option<UsageReport>,
    pub(super) track_durations: Option<TrackDurations>,
    pub(super) execution_progress: ExecutionProgress,
    pub(super) execution_logs: Vec<String>,
    pub(super) processing: bool,
    pub(super) editing_scheduled: bool,
    images: ImageGallery,
    prompt: String,
    view: ViewSelector,
}

impl Workflow {
    pub fn new(settings: WorkflowSettings) -> Self {
        debug!(?settings, "Workflow::new: called");
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Validate the inputs and enter the planning phase
    ///
    /// Validation failures leave all state untouched.
    pub fn begin_planning(&mut self) -> Result<Vec<Effect>, StartError> {
        debug!(phase = %self.state.phase, images = self.images.len(), "Workflow::begin_planning: called");
        if self.state.phase != Phase::Idle {
            return Err(StartError::NotIdle(self.state.phase));
        }
        if self.images.is_empty() {
            return Err(StartError::NoImages);
        }
        if self.prompt.trim().is_empty() {
            return Err(StartError::EmptyPrompt);
        }

        self.epoch += 1;
        self.state.phase = Phase::Planning;
        self.processing = true;
        self.planning_progress = PlanningProgress {
            message: "Connecting to the planning agent...".to_string(),
            ..PlanningProgress::default()
        };
        info!(epoch = self.epoch, images = self.images.len(), "planning started");

        Ok(vec![
            Effect::Notify(Notification::success("Agent started").with_description("Connecting to the planning agent...")),
            Effect::StartPlanning {
                epoch: self.epoch,
                images: self.images.paths(),
                prompt: self.prompt.clone(),
            },
        ])
    }

    /// Feed one input through the state machine
    pub fn apply(&mut self, input: Input) -> Vec<Effect> {
        if input.epoch() != self.epoch {
            debug!(stale = input.epoch(), current = self.epoch, "Workflow::apply: dropping stale input");
            return Vec::new();
        }

        match input {
            Input::PlanningSessionStarted {
                session_id,
                websocket_url,
                ..
            } => self.on_planning_session(session_id, websocket_url),
            Input::ExecutionSessionStarted { websocket_url, .. } => self.on_execution_session(websocket_url),
            Input::StartFailed { kind, reason, .. } => self.on_start_failed(kind, reason),
            Input::Planning { event, .. } => self.on_planning_event(event),
            Input::Execution { event, .. } => self.on_execution_event(event),
            Input::ChannelFailed { kind, reason, .. } => self.on_channel_failed(kind, reason),
            Input::ChannelClosed { kind, .. } => self.on_channel_closed(kind),
            Input::EditingDelayElapsed { .. } => self.on_editing_delay(),
        }
    }

    /// Return to idle from any phase, dropping everything accumulated
    pub fn reset(&mut self) -> Vec<Effect> {
        debug!(phase = %self.state.phase, epoch = self.epoch, "Workflow::reset: called");
        self.epoch += 1;
        self.state = AgentState::default();
        self.identity.clear();
        self.planning_progress = PlanningProgress::default();
        self.usage = None;
        self.track_durations = None;
        self.execution_progress = ExecutionProgress::default();
        self.execution_logs.clear();
        self.processing = false;
        self.editing_scheduled = false;
        self.images.clear();
        self.prompt.clear();
        self.view.clear();
        info!(epoch = self.epoch, "workflow reset");
        vec![Effect::CloseChannels]
    }

    fn on_planning_session(&mut self, session_id: String, websocket_url: String) -> Vec<Effect> {
        debug!(%session_id, %websocket_url, "Workflow::on_planning_session: called");
        if self.state.phase != Phase::Planning {
            warn!(phase = %self.state.phase, "planning session started outside planning, ignoring");
            return Vec::new();
        }
        self.identity.assign_planning_session(session_id);
        self.planning_progress.message = "Connected! Starting planning...".to_string();
        vec![Effect::OpenChannel {
            epoch: self.epoch,
            kind: ChannelKind::Planning,
            url: websocket_url,
        }]
    }

    fn on_execution_session(&mut self, websocket_url: String) -> Vec<Effect> {
        debug!(%websocket_url, "Workflow::on_execution_session: called");
        if self.state.phase != Phase::Editing {
            warn!(phase = %self.state.phase, "execution session started outside editing, ignoring");
            return Vec::new();
        }
        vec![Effect::OpenChannel {
            epoch: self.epoch,
            kind: ChannelKind::Execution,
            url: websocket_url,
        }]
    }

    fn on_start_failed(&mut self, kind: ChannelKind, reason: String) -> Vec<Effect> {
        warn!(%kind, %reason, "session start failed");
        self.processing = false;
        let notification = match kind {
            ChannelKind::Planning => {
                // Planning never began
                self.state.phase = Phase::Idle;
                Notification::error("Connection failed").with_description(reason)
            }
            ChannelKind::Execution => Notification::error("Execution failed").with_description(reason),
        };
        vec![Effect::Notify(notification)]
    }

    fn on_channel_failed(&mut self, kind: ChannelKind, reason: String) -> Vec<Effect> {
        warn!(%kind, %reason, "channel failed");
        self.processing = false;
        let title = match kind {
            ChannelKind::Planning => "Connection error",
            ChannelKind::Execution => "Execution connection error",
        };
        vec![Effect::Notify(Notification::error(title).with_description(reason))]
    }

    /// A remote close only matters if the stream had not finished yet
    fn on_channel_closed(&mut self, kind: ChannelKind) -> Vec<Effect> {
        debug!(%kind, processing = self.processing, "Workflow::on_channel_closed: called");
        let finished = match kind {
            ChannelKind::Planning => {
                self.state.phase != Phase::Planning || self.planning_progress.step == PlanningStep::Complete
            }
            ChannelKind::Execution => self.state.phase != Phase::Editing,
        };
        if finished || !self.processing {
            return Vec::new();
        }
        warn!(%kind, "channel closed before its stream finished");
        self.processing = false;
        vec![Effect::Notify(
            Notification::warning("Connection closed").with_description(format!("The {} stream ended early", kind)),
        )]
    }

    fn on_editing_delay(&mut self) -> Vec<Effect> {
        debug!(scheduled = self.editing_scheduled, phase = %self.state.phase, "Workflow::on_editing_delay: called");
        if !self.editing_scheduled || self.state.phase != Phase::Planning {
            return Vec::new();
        }
        self.editing_scheduled = false;

        let Some(plan) = self.state.planning.visual_plan.clone() else {
            warn!("final plan arrived without a visual plan, not starting editing");
            self.processing = false;
            return Vec::new();
        };

        self.state.phase = Phase::Editing;
        self.state.editing = EditingState::for_plan(&plan);
        self.execution_progress = ExecutionProgress {
            step: ExecutionStep::UploadingImages,
            progress: None,
            message: "Starting execution on device...".to_string(),
        };
        self.processing = true;
        info!(total_steps = plan.len(), "editing started");

        let request = ExecutionRequest {
            visual_plan: plan,
            planning_session_id: self.identity.planning_session_id().map(str::to_string),
            audio_path: self.identity.trimmed_audio_path().map(str::to_string),
            audio_track_name: self.settings.audio_track_name.clone(),
        };
        if request.planning_session_id.is_none() {
            warn!("no planning session id, execution will not be linked to planning");
        }
        vec![Effect::StartExecution {
            epoch: self.epoch,
            request,
        }]
    }

    pub fn add_image(&mut self, path: impl Into<PathBuf>) -> Result<&UploadedImage, GalleryError> {
        self.images.add(path)
    }

    pub fn remove_image(&mut self, id: &str) -> bool {
        self.images.remove(id)
    }

    pub fn pop_image(&mut self) -> Option<UploadedImage> {
        self.images.pop()
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Ask the dashboard to show `phase` instead of the live phase
    pub fn request_view(&mut self, phase: Phase) -> bool {
        self.view.request(self.state.phase, phase)
    }

    pub fn clear_view(&mut self) {
        self.view.clear();
    }

    pub fn display_phase(&self) -> Phase {
        self.view.display_phase(self.state.phase)
    }

    pub fn can_navigate(&self) -> bool {
        ViewSelector::can_navigate(self.state.phase)
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn identity(&self) -> &SessionIdentity {
        &self.identity
    }

    pub fn planning_progress(&self) -> &PlanningProgress {
        &self.planning_progress
    }

    pub fn execution_progress(&self) -> &ExecutionProgress {
        &self.execution_progress
    }

    pub fn usage(&self) -> Option<&UsageReport> {
        self.usage.as_ref()
    }

    pub fn track_durations(&self) -> Option<&TrackDurations> {
        self.track_durations.as_ref()
    }

    pub fn execution_logs(&self) -> &[String] {
        &self.execution_logs
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn editing_scheduled(&self) -> bool {
        self.editing_scheduled
    }

    pub fn images(&self) -> &[UploadedImage] {
        self.images.images()
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Nothing is in flight; only a user action can move the workflow
    pub fn is_settled(&self) -> bool {
        !self.processing
    }
}
