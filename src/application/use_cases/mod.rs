//! Use case implementations.

mod payment_flow_use_case;

pub use payment_flow_use_case::{CancelHandle, PaymentFlowConfig, PaymentFlowController};
