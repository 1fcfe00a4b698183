//! Domain building blocks for the Photon check-in station.
//!
//! No network or database access happens here; the [`store`] trait is
//! implemented for PostgreSQL by the database crate.

pub mod config;
pub mod error;
pub mod roster;
pub mod store;
pub mod team;
pub mod types;
pub mod validation;
