//! Push-channel protocol
//!
//! Both channels carry JSON text frames shaped `{type, data?, message?, progress?}`.
//! Frames are decoded into a closed enum per channel so the reducer can match
//! exhaustively; types this client does not know become `Unrecognized`.

mod execution;
mod planning;
mod wire;

pub use execution::{ExecutionEvent, ExecutionReport, ExecutionStage};
pub use planning::PlanningEvent;
pub use wire::{CancelFrame, ProtocolError, WireMessage};
