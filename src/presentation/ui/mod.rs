//! UI screens.

mod app;
mod payment_screen;

pub use app::App;
pub use payment_screen::PaymentScreen;
