//! Test data generators for etlsmith.
//!
//! Functions producing flow definitions for common test scenarios.

mod definitions;

// Re-export all data generators for easy access
pub use definitions::*;
