//! Card reader adapters.

mod simulated_reader;

pub use simulated_reader::{SimulatedCardReader, SimulatedOutcome};
