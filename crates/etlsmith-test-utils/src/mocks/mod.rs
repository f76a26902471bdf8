//! Mock implementations of etlsmith interfaces.
//!
//! These allow isolated, call-count-level testing of code that depends on
//! the remote flow engine or the planner.

pub mod flow_engine;
pub mod planner;

pub use flow_engine::*;
pub use planner::*;
