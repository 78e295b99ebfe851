//! Studio - client for the video-editing agent
//!
//! The backend turns a handful of images and a prompt into a video edit in
//! two stages: a planning agent streams a visual plan and a music choice,
//! then a device-side executor replays the plan in the phone's editor. This
//! crate drives both stages and presents their progress.
//!
//! # Modules
//!
//! - [`workflow`] - Pure reducer over the idle → planning → editing → done machine
//! - [`runtime`] - Executes workflow effects: requests, channels, timers
//! - [`channel`] - Push-channel transport and single-connection ownership
//! - [`protocol`] - Planning and execution frame alphabets
//! - [`api`] - HTTP client for the agent backend
//! - [`domain`] - Plans, music, usage and the image gallery
//! - [`notify`] - User-visible notifications
//! - [`tui`] - Terminal dashboard
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod api;
pub mod channel;
pub mod cli;
pub mod config;
pub mod domain;
pub mod notify;
pub mod protocol;
pub mod runtime;
pub mod tui;
pub mod workflow;

// Re-export commonly used types
pub use api::{AgentApi, ApiError, HttpAgentApi};
pub use channel::{ChannelKind, PushConnector, WsConnector};
pub use config::Config;
pub use notify::{ConsoleSink, Notification, NotificationLevel, NotificationSink, RecordingSink};
pub use runtime::{Signal, Studio};
pub use workflow::{AgentState, Effect, Input, Phase, Workflow, WorkflowSettings};
