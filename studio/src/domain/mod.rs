//! Domain types for the studio client
//!
//! Typed payloads carried by the planning and execution channels, plus the
//! image gallery the user builds before starting an edit.

mod gallery;
mod music;
mod plan;
mod usage;

pub use gallery::{GalleryError, ImageGallery, UploadedImage};
pub use music::{FinalMusicSelection, MusicCandidates, MusicTrack, TrackDurations};
pub use plan::{ActionArgs, ActionTool, AnimationType, VisualPlan, VisualPlanAction};
pub use usage::{Pricing, StepUsage, UsageBreakdown, UsageReport, format_cost, format_tokens};
