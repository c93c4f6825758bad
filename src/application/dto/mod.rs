//! Data transfer objects for the application layer.

mod flow_dto;

pub use flow_dto::{FlowView, OperatorCommand};
