//! Planning channel alphabet
//!
//! Events streamed while the planning agent builds the visual plan, picks
//! music candidates, downloads them and settles on a final selection.

use serde::Deserialize;
use tracing::warn;

use super::wire::{ProtocolError, WireMessage};
use crate::domain::{
    FinalMusicSelection, MusicCandidates, Pricing, TrackDurations, UsageBreakdown, UsageReport, VisualPlan,
};

/// Every event the planning channel can deliver
#[derive(Debug, Clone, PartialEq)]
pub enum PlanningEvent {
    PlanningStarted { message: Option<String> },
    VisualPlanStarted { message: Option<String> },
    VisualPlan(VisualPlan),
    MusicPlanStarted { message: Option<String> },
    MusicPlan(MusicCandidates),
    /// `downloading_music` and `download_progress`
    DownloadProgress { progress: Option<u8>, message: Option<String> },
    TrackDurations(TrackDurations),
    FinalPlanStarted { message: Option<String> },
    TrimmingAudio { message: Option<String> },
    FullPlan(FinalMusicSelection),
    PlanningComplete { usage: Option<UsageReport> },
    Error { message: Option<String> },
    /// A type this client does not know; ignored by the reducer
    Unrecognized { kind: String },
}

/// `planning_complete` payload; only the usage fields matter to the client
#[derive(Debug, Deserialize)]
struct CompletionPayload {
    #[serde(default)]
    usage_breakdown: Option<UsageBreakdown>,
    #[serde(default)]
    pricing: Option<Pricing>,
}

impl PlanningEvent {
    /// Decode a wire frame into a typed planning event
    pub fn decode(msg: WireMessage) -> Result<Self, ProtocolError> {
        let event = match msg.kind.as_str() {
            "planning_started" => Self::PlanningStarted { message: msg.message },
            "visual_plan_started" => Self::VisualPlanStarted { message: msg.message },
            "visual_plan" => Self::VisualPlan(msg.payload()?),
            "music_plan_started" => Self::MusicPlanStarted { message: msg.message },
            "music_plan" => Self::MusicPlan(msg.payload()?),
            "downloading_music" | "download_progress" => Self::DownloadProgress {
                progress: msg.percent(),
                message: msg.message,
            },
            "track_durations" => Self::TrackDurations(msg.payload()?),
            "final_plan_started" => Self::FinalPlanStarted { message: msg.message },
            "trimming_audio" => Self::TrimmingAudio { message: msg.message },
            "full_plan" => Self::FullPlan(msg.payload()?),
            "planning_complete" => Self::PlanningComplete {
                usage: usage_from(&msg),
            },
            "error" => Self::Error { message: msg.message },
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
            Self::PlanningStarted { .. } => "planning_started",
            Self::VisualPlanStarted { .. } => "visual_plan_started",
            Self::VisualPlan(_) => "visual_plan",
            Self::MusicPlanStarted { .. } => "music_plan_started",
            Self::MusicPlan(_) => "music_plan",
            Self::DownloadProgress { .. } => "download_progress",
            Self::TrackDurations(_) => "track_durations",
            Self::FinalPlanStarted { .. } => "final_plan_started",
            Self::TrimmingAudio { .. } => "trimming_audio",
            Self::FullPlan(_) => "full_plan",
            Self::PlanningComplete { .. } => "planning_complete",
            Self::Error { .. } => "error",
            Self::Unrecognized { kind } => kind,
        }
    }
}

/// Usage is stored only when both breakdown and pricing are present
fn usage_from(msg: &WireMessage) -> Option<UsageReport> {
    let data = msg.data.clone()?;
    match serde_json::from_value::<CompletionPayload>(data) {
        Ok(CompletionPayload {
            usage_breakdown: Some(usage_breakdown),
            pricing: Some(pricing),
        }) => Some(UsageReport {
            usage_breakdown,
            pricing,
        }),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "planning_complete: ignoring malformed usage data");
            None
        }
    }
}
