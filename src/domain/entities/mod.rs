//! Domain entities.

mod flow_step;
mod money;
mod payment_intent;
mod payment_request;
mod payment_result;

pub use flow_step::{FlowExit, FlowStep, FlowStepKind};
pub use money::{Currency, Money};
pub use payment_intent::{PaymentIntentHandle, PaymentIntentId, PaymentIntentStatus};
pub use payment_request::{LineItem, PaymentRequest};
pub use payment_result::{PaymentOutcome, PaymentResult};
