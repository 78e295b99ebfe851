//! Agent backend client
//!
//! Session-start and status endpoints of the planning/execution backend.
//! The push channels those sessions stream over live in `crate::channel`.

pub mod client;
mod error;
mod http;
mod types;

pub use client::AgentApi;
pub use error::ApiError;
pub use http::HttpAgentApi;
pub use types::{
    DeviceStatus, ExecutionRequest, ExecutionSessionResponse, HealthStatus, PlanningSessionResponse, SessionList,
};
