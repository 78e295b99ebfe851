//! Workflow state
//!
//! Pure data: `AgentState` is the single source of truth for workflow
//! progress. Mutation happens only in the reducer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ActionTool, FinalMusicSelection, MusicCandidates, VisualPlan, VisualPlanAction};
use crate::protocol::ExecutionReport;

/// Workflow phase; moves forward only, except on reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Planning,
    Editing,
    Done,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Planning => write!(f, "planning"),
            Self::Editing => write!(f, "editing"),
            Self::Done => write!(f, "done"),
        }
    }
}

/// Sub-step marker inside the planning phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanningStep {
    #[default]
    Connecting,
    VisualPlan,
    MusicPlan,
    Downloading,
    FinalPlan,
    Complete,
}

impl PlanningStep {
    pub const ALL: [PlanningStep; 6] = [
        Self::Connecting,
        Self::VisualPlan,
        Self::MusicPlan,
        Self::Downloading,
        Self::FinalPlan,
        Self::Complete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Connecting => "Connecting",
            Self::VisualPlan => "Visual Plan",
            Self::MusicPlan => "Music Plan",
            Self::Downloading => "Downloading",
            Self::FinalPlan => "Final Plan",
            Self::Complete => "Complete",
        }
    }
}

/// Step marker inside the editing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionStep {
    #[default]
    Idle,
    UploadingImages,
    UploadingAudio,
    SelectingImages,
    ExecutingPlan,
    Complete,
}

impl ExecutionStep {
    /// Steps shown on the progress bar, in order
    pub const SHOWN: [ExecutionStep; 5] = [
        Self::UploadingImages,
        Self::UploadingAudio,
        Self::SelectingImages,
        Self::ExecutingPlan,
        Self::Complete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::UploadingImages => "Uploading Images",
            Self::UploadingAudio => "Uploading Audio",
            Self::SelectingImages => "Selecting Images",
            Self::ExecutingPlan => "Executing Plan",
            Self::Complete => "Complete",
        }
    }

    /// 1-based position on the progress bar (0 when idle)
    pub fn position(&self) -> usize {
        Self::SHOWN.iter().position(|s| s == self).map(|i| i + 1).unwrap_or(0)
    }
}

/// Planning artifacts; each is absent or complete, set at most once per session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningState {
    pub visual_plan: Option<VisualPlan>,
    pub music_candidates: Option<MusicCandidates>,
    pub selected_music: Option<FinalMusicSelection>,
}

impl PlanningState {
    pub fn is_empty(&self) -> bool {
        self.visual_plan.is_none() && self.music_candidates.is_none() && self.selected_music.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Done,
    Error,
}

/// A plan action as tracked during execution
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStep {
    pub id: String,
    pub action: VisualPlanAction,
    pub status: StepStatus,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditingState {
    pub current_step: usize,
    pub total_steps: usize,
    pub executed_steps: Vec<ExecutedStep>,
}

impl EditingState {
    /// Fresh counters for executing `plan`; every action starts pending
    pub fn for_plan(plan: &VisualPlan) -> Self {
        let executed_steps = plan
            .plan
            .iter()
            .enumerate()
            .map(|(i, action)| ExecutedStep {
                id: format!("step-{}", i),
                action: action.clone(),
                status: StepStatus::Pending,
                timestamp: None,
            })
            .collect();
        Self {
            current_step: 0,
            total_steps: plan.len(),
            executed_steps,
        }
    }

    /// The device began replaying the plan: the first pending step runs
    pub fn mark_running(&mut self, at: DateTime<Utc>) {
        if self.executed_steps.iter().any(|s| s.status == StepStatus::Running) {
            return;
        }
        if let Some(step) = self.executed_steps.iter_mut().find(|s| s.status == StepStatus::Pending) {
            step.status = StepStatus::Running;
            step.timestamp = Some(at);
        }
    }

    /// Settle every step that has not finished yet
    pub fn finish(&mut self, success: bool, at: DateTime<Utc>) {
        let status = if success { StepStatus::Done } else { StepStatus::Error };
        for step in &mut self.executed_steps {
            if matches!(step.status, StepStatus::Pending | StepStatus::Running) {
                step.status = status;
                step.timestamp = Some(at);
            }
        }
        self.current_step = self.total_steps;
    }

    /// Image targeted by the step currently running on the device
    pub fn active_image(&self) -> Option<usize> {
        self.executed_steps
            .iter()
            .find(|s| s.status == StepStatus::Running)
            .and_then(|s| s.action.target_image())
    }

    /// Aggregate status of the steps that edit `image`; `None` if no step does
    pub fn image_status(&self, image: usize) -> Option<StepStatus> {
        let statuses: Vec<StepStatus> = self
            .executed_steps
            .iter()
            .filter(|s| s.action.target_image() == Some(image))
            .map(|s| s.status)
            .collect();
        if statuses.is_empty() {
            None
        } else if statuses.contains(&StepStatus::Error) {
            Some(StepStatus::Error)
        } else if self.active_image() == Some(image) {
            Some(StepStatus::Running)
        } else if statuses.iter().all(|s| *s == StepStatus::Done) {
            Some(StepStatus::Done)
        } else {
            Some(StepStatus::Pending)
        }
    }
}

/// Summary of the finished edit, computed once from the planning artifacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub total_duration: f64,
    pub effects_count: usize,
    pub transitions_count: usize,
    pub track_used: String,
}

impl VideoSummary {
    pub fn from_planning(planning: &PlanningState) -> Self {
        let (effects_count, transitions_count) = planning
            .visual_plan
            .as_ref()
            .map(|p| (p.count_tool(&ActionTool::ApplyEffect), p.count_tool(&ActionTool::AddTransition)))
            .unwrap_or((0, 0));

        Self {
            total_duration: planning
                .selected_music
                .as_ref()
                .map(FinalMusicSelection::segment_seconds)
                .unwrap_or(0.0),
            effects_count,
            transitions_count,
            track_used: planning
                .selected_music
                .as_ref()
                .map(|m| m.selected_track_filename.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DoneState {
    pub video_url: Option<String>,
    pub summary: Option<VideoSummary>,
    pub report: Option<ExecutionReport>,
}

/// Workflow progress as rendered by the dashboard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AgentState {
    pub phase: Phase,
    pub planning: PlanningState,
    pub editing: EditingState,
    pub done: DoneState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(tools: &[&str]) -> VisualPlan {
        let actions: Vec<_> = tools
            .iter()
            .enumerate()
            .map(|(i, t)| serde_json::json!({"tool": t, "args": {"image_idx": i}}))
            .collect();
        serde_json::from_value(serde_json::json!({"plan": actions})).unwrap()
    }

    #[test]
    fn test_phase_ordering() {
        assert!(Phase::Idle < Phase::Planning);
        assert!(Phase::Planning < Phase::Editing);
        assert!(Phase::Editing < Phase::Done);
    }

    #[test]
    fn test_summary_counts_tools() {
        let planning = PlanningState {
            visual_plan: Some(plan(&["apply_effect", "apply_effect", "add_transition", "change_duration"])),
            music_candidates: None,
            selected_music: Some(
                serde_json::from_value(serde_json::json!({
                    "selected_track_filename": "beat.mp3",
                    "start_time_seconds": 10,
                    "end_time_seconds": 25
                }))
                .unwrap(),
            ),
        };
        let summary = VideoSummary::from_planning(&planning);
        assert_eq!(summary.effects_count, 2);
        assert_eq!(summary.transitions_count, 1);
        assert_eq!(summary.track_used, "beat.mp3");
        assert_eq!(summary.total_duration, 15.0);
    }

    #[test]
    fn test_summary_without_music() {
        let summary = VideoSummary::from_planning(&PlanningState::default());
        assert_eq!(summary.track_used, "Unknown");
        assert_eq!(summary.effects_count, 0);
    }

    #[test]
    fn test_execution_step_position() {
        assert_eq!(ExecutionStep::Idle.position(), 0);
        assert_eq!(ExecutionStep::UploadingImages.position(), 1);
        assert_eq!(ExecutionStep::Complete.position(), 5);
    }

    #[test]
    fn test_steps_track_plan_execution() {
        let p = plan(&["apply_effect", "apply_animation"]);
        let mut editing = EditingState::for_plan(&p);
        assert_eq!(editing.total_steps, 2);
        assert_eq!(editing.executed_steps.len(), 2);
        assert!(editing.executed_steps.iter().all(|s| s.status == StepStatus::Pending));
        assert_eq!(editing.active_image(), None);

        let started = Utc::now();
        editing.mark_running(started);
        assert_eq!(editing.executed_steps[0].status, StepStatus::Running);
        assert_eq!(editing.executed_steps[0].timestamp, Some(started));
        assert_eq!(editing.active_image(), Some(0));
        assert_eq!(editing.image_status(0), Some(StepStatus::Running));
        assert_eq!(editing.image_status(1), Some(StepStatus::Pending));
        assert_eq!(editing.image_status(7), None);

        // A repeated stage event does not start a second step
        editing.mark_running(Utc::now());
        assert_eq!(editing.executed_steps[1].status, StepStatus::Pending);

        editing.finish(true, Utc::now());
        assert_eq!(editing.current_step, 2);
        assert_eq!(editing.active_image(), None);
        assert_eq!(editing.image_status(0), Some(StepStatus::Done));
        assert!(editing.executed_steps.iter().all(|s| s.timestamp.is_some()));
    }

    #[test]
    fn test_failed_run_marks_unfinished_steps() {
        let p = plan(&["apply_effect", "apply_effect"]);
        let mut editing = EditingState::for_plan(&p);
        editing.mark_running(Utc::now());
        editing.finish(false, Utc::now());
        assert!(editing.executed_steps.iter().all(|s| s.status == StepStatus::Error));
        assert_eq!(editing.image_status(0), Some(StepStatus::Error));
    }
}
