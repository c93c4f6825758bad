//! Application layer with the payment flow controller and its DTOs.

/// Data transfer objects.
pub mod dto;
/// Application services.
pub mod services;
/// Use case implementations.
pub mod use_cases;

pub use dto::{FlowView, OperatorCommand};
pub use services::PaymentHistory;
pub use use_cases::{CancelHandle, PaymentFlowConfig, PaymentFlowController};
