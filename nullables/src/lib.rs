//! Nullable infrastructure for deterministic testing.
//!
//! The client's external dependencies (the server on the other end of the
//! connection, and the CPU-heavy solver) get test-friendly stand-ins here
//! that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod server;
pub mod solver;

pub use server::{ClientReader, ClientWriter, ScriptedServer};
pub use solver::NullSolver;
