//! mizpos-terminal - card payment terminal for the mizpos point of sale.
//!
//! This crate drives a card reader through a single payment attempt
//! (create, collect, process) for a request pushed by a paired POS, and
//! ships a TUI that renders each step of the flow for the operator.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the payment flow controller and DTOs.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing reader, session and config adapters.
pub mod infrastructure;
/// Presentation layer containing UI components and event handling.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "mizpos-terminal";
