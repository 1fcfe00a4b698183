//! `photon-station` library crate.
//!
//! Re-exports the entry screen, console and splash modules for
//! integration testing. The binary entrypoint lives in `main.rs`.

pub mod console;
pub mod entry;
pub mod splash;
