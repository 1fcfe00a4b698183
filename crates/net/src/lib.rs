//! UDP messaging for the check-in station.
//!
//! [`DatagramChannel`] sends equipment-assignment datagrams and runs a
//! background receive loop for inbound status messages.

pub mod channel;
pub mod error;
pub mod wire;

pub use channel::{ChannelState, DatagramChannel, InboundMessage};
pub use error::NetError;
