//! Domain error types.

mod flow_error;
mod payment_error;
mod reader_error;
mod session_error;

pub use flow_error::FlowError;
pub use payment_error::PaymentError;
pub use reader_error::{ReaderError, ReaderErrorCode};
pub use session_error::SessionError;
