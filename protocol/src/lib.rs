//! Line protocol spoken with the proof-of-work server.
//!
//! The server drives the conversation with newline-terminated commands; the
//! client answers each one. A [`Session`] reads commands, replies to
//! greetings and profile field requests, and hands `POW` challenges to a
//! [`Solver`](saltpow_work::Solver).

pub mod codec;
pub mod command;
pub mod error;
pub mod profile;
pub mod session;

pub use codec::{LineReader, LineWriter, MAX_LINE_LEN};
pub use command::{Command, Field};
pub use error::ProtocolError;
pub use profile::{load_or_default, load_profile};
pub use session::{Session, SessionConfig, SessionOutcome};
