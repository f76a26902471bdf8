//! Testing utilities for etlsmith.
//!
//! Provides mockall mocks of the flow engine client and the planner, an in-memory fake
//! engine that models revisions and scripted failures, and ready-made flow
//! definitions.

pub mod data_generators;
pub mod implementations;
pub mod mocks;
pub mod util;

/// Re-export commonly used types for convenience
pub use mockall;

pub use data_generators::*;
pub use implementations::{EngineCall, FakeConnection, FakeFlowEngine, FakeProcessor, FakeService, Failure};
pub use mocks::{create_mock_flow_engine, planner_returning, MockFlowEngineClient, MockFlowPlanner};
pub use util::init_test_tracing;
