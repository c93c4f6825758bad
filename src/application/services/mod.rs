//! Application services.

mod payment_history;

pub use payment_history::PaymentHistory;
