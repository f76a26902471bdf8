//! Flow planning for etlsmith.
//!
//! A [`FlowPlanner`] turns a natural-language description of a pipeline into
//! a [`FlowDefinition`] the realization engine can build.

#![forbid(unsafe_code)]

pub mod error;
mod llm;
pub mod prompt;

use async_trait::async_trait;
use etlsmith_core::FlowDefinition;

pub use error::{PlannerError, PlannerResult};
pub use llm::{LlmConfig, LlmPlanner};

/// Produces flow definitions from free-form descriptions
#[async_trait]
pub trait FlowPlanner: Send + Sync {
    async fn plan(&self, description: &str) -> PlannerResult<FlowDefinition>;
}
