//! Planning stream handling

use tracing::{debug, info, warn};

use super::reducer::Workflow;
use super::state::{Phase, PlanningStep};
use super::Effect;
use crate::notify::Notification;
use crate::protocol::PlanningEvent;

impl Workflow {
    pub(super) fn on_planning_event(&mut self, event: PlanningEvent) -> Vec<Effect> {
        debug!(event_type = event.event_type(), phase = %self.state.phase, "Workflow::on_planning_event: called");

        // Errors surface whatever the phase
        if let PlanningEvent::Error { message } = event {
            warn!(?message, "planning error");
            self.processing = false;
            let description = message.unwrap_or_else(|| "Something went wrong".to_string());
            return vec![Effect::Notify(
                Notification::error("Planning error").with_description(description),
            )];
        }

        if self.state.phase != Phase::Planning {
            warn!(event_type = event.event_type(), phase = %self.state.phase, "planning event outside planning, ignoring");
            return Vec::new();
        }

        match event {
            PlanningEvent::PlanningStarted { message } => {
                self.planning_progress.step = PlanningStep::VisualPlan;
                self.set_planning_message(message, "Starting visual plan generation...");
                Vec::new()
            }
            PlanningEvent::VisualPlanStarted { message } => {
                self.set_planning_message(message, "Generating visual editing plan...");
                Vec::new()
            }
            PlanningEvent::VisualPlan(plan) => {
                if self.state.planning.visual_plan.is_some() {
                    debug!("duplicate visual_plan, keeping the first");
                    return Vec::new();
                }
                info!(actions = plan.len(), "visual plan received");
                self.state.planning.visual_plan = Some(plan);
                self.planning_progress.step = PlanningStep::MusicPlan;
                self.planning_progress.message = "Visual plan complete! Finding music...".to_string();
                vec![Effect::Notify(Notification::success("Visual plan generated"))]
            }
            PlanningEvent::MusicPlanStarted { message } => {
                self.set_planning_message(message, "Searching for music...");
                Vec::new()
            }
            PlanningEvent::MusicPlan(candidates) => {
                if self.state.planning.music_candidates.is_some() {
                    debug!("duplicate music_plan, keeping the first");
                    return Vec::new();
                }
                info!(tracks = candidates.tracks.len(), "music candidates received");
                self.state.planning.music_candidates = Some(candidates);
                self.planning_progress.step = PlanningStep::Downloading;
                self.planning_progress.message = "Starting music downloads...".to_string();
                vec![Effect::Notify(Notification::success("Music candidates found"))]
            }
            PlanningEvent::DownloadProgress { progress, message } => {
                if let Some(progress) = progress {
                    self.planning_progress.download_progress = progress;
                }
                if let Some(message) = message {
                    self.planning_progress.message = message;
                }
                Vec::new()
            }
            PlanningEvent::TrackDurations(durations) => {
                if self.track_durations.is_none() {
                    self.track_durations = Some(durations);
                }
                Vec::new()
            }
            PlanningEvent::FinalPlanStarted { message } => {
                self.planning_progress.step = PlanningStep::FinalPlan;
                self.set_planning_message(message, "Analyzing tracks and syncing...");
                Vec::new()
            }
            PlanningEvent::TrimmingAudio { message } => {
                self.set_planning_message(message, "Trimming audio...");
                Vec::new()
            }
            PlanningEvent::FullPlan(selection) => self.on_full_plan(selection),
            PlanningEvent::PlanningComplete { usage } => {
                if self.usage.is_none() {
                    self.usage = usage;
                }
                self.planning_progress.step = PlanningStep::Complete;
                Vec::new()
            }
            PlanningEvent::Unrecognized { kind } => {
                debug!(%kind, "ignoring unrecognized planning event");
                Vec::new()
            }
            PlanningEvent::Error { .. } => Vec::new(),
        }
    }

    fn on_full_plan(&mut self, selection: crate::domain::FinalMusicSelection) -> Vec<Effect> {
        if self.state.planning.selected_music.is_some() {
            debug!("duplicate full_plan, keeping the first");
            return Vec::new();
        }
        info!(
            track = %selection.selected_track_filename,
            start = selection.start_time_seconds,
            end = selection.end_time_seconds,
            "final music selection received"
        );
        if let Some(url) = &selection.trimmed_audio_url {
            self.identity.record_trimmed_audio(url.clone());
        }
        self.state.planning.selected_music = Some(selection);
        self.planning_progress.step = PlanningStep::Complete;
        self.planning_progress.message = "Planning complete!".to_string();

        let mut effects = vec![Effect::Notify(
            Notification::success("Planning complete").with_description("Moving to editing phase."),
        )];
        if !self.editing_scheduled {
            self.editing_scheduled = true;
            effects.push(Effect::ScheduleEditing {
                epoch: self.epoch,
                delay: self.settings.editing_delay,
            });
        }
        effects
    }

    fn set_planning_message(&mut self, message: Option<String>, default: &str) {
        self.planning_progress.message = message.unwrap_or_else(|| default.to_string());
    }
}
