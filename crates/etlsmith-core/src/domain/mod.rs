//! Flow definitions and realization results

pub mod definition;
pub mod result;

pub use definition::{
    ConnectionSpec, FlowDefinition, ProcessorSpec, PropertyMap, ServiceReference, ServiceSpec,
};
pub use result::{FlowBuildResult, RunStateReport};
