//! Datagram payload encoding.
//!
//! Outbound: the decimal text of one equipment id per datagram, no framing.
//! Inbound: free-form text, decoded lossily and trimmed.

use photon_core::types::EquipmentId;

/// Receive buffer size; longer datagrams are truncated by the OS.
pub const RECV_BUFFER_SIZE: usize = 2048;

pub fn encode_equipment_id(equipment_id: EquipmentId) -> Vec<u8> {
    equipment_id.to_string().into_bytes()
}

/// Invalid UTF-8 sequences are replaced rather than rejected.
pub fn decode_inbound(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
