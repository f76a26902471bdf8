//! Test implementations (fakes) of etlsmith interfaces.

pub mod fake_flow_engine;

pub use fake_flow_engine::*;
