//! ctegraph CLI library
//!
//! Exposes the CLI building blocks so integration tests can drive them
//! without spawning the binary.

pub mod cli;
pub mod input;
pub mod output;
#[cfg(feature = "serve")]
pub mod server;
pub mod watch;
