//! Presentation layer with the payment screen and key handling.

/// Key handling.
pub mod events;
/// UI screens.
pub mod ui;
/// Reusable widgets.
pub mod widgets;

pub use ui::App;
