//! Infrastructure layer with the reader, session and config adapters.

/// Terminal configuration.
pub mod config;
/// Card reader adapters.
pub mod reader;
/// Pairing session adapters.
pub mod session;

pub use config::{AppConfig, CliArgs, ConfigError, LogLevel, StorageManager};
pub use reader::{SimulatedCardReader, SimulatedOutcome};
pub use session::{InMemoryPairingSession, SessionOutcome};
