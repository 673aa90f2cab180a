//! Pipeline building and execution.
//!
//! This module provides:
//! - The orchestrator and its builder
//! - The run state machine

mod builder;
mod orchestrator;
mod state;


pub use builder::PipelineOrchestratorBuilder;
pub use orchestrator::PipelineOrchestrator;
pub use state::PipelineState;
