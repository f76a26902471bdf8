//! etlsmith command-line front end.
//!
//! Wires configuration, logging, the planner and the NiFi client around a
//! [`session::Session`].

#![forbid(unsafe_code)]

pub mod config;
pub mod plan_file;
pub mod render;
pub mod session;

pub use config::AppConfig;
pub use session::{Outcome, Session, SessionOptions};
