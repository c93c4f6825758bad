//! Domain layer with payment entities, errors, and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{FlowExit, FlowStep, FlowStepKind, Money, PaymentRequest};
pub use errors::{FlowError, PaymentError, ReaderError};
pub use ports::{CardReaderPort, PairingSessionPort};
