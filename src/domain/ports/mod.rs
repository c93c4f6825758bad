//! Port definitions.

mod card_reader_port;
mod pairing_session_port;

pub use card_reader_port::CardReaderPort;
pub use pairing_session_port::PairingSessionPort;
