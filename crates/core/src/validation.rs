//! Parsing of raw operator input into domain values.

use crate::error::CoreError;
use crate::types::{EquipmentId, PlayerId};

/// Parse a player id typed by the operator.
pub fn parse_player_id(raw: &str) -> Result<PlayerId, CoreError> {
    raw.trim()
        .parse::<PlayerId>()
        .map_err(|_| CoreError::InvalidInput("Player ID must be an integer".to_string()))
}

/// Parse an equipment id. Negative values are rejected because the wire
/// format only carries non-negative integers.
pub fn parse_equipment_id(raw: &str) -> Result<EquipmentId, CoreError> {
    raw.trim().parse::<EquipmentId>().map_err(|_| {
        CoreError::InvalidInput("Equipment ID must be a non-negative integer".to_string())
    })
}

/// Trim a codename and reject it if nothing is left.
pub fn normalize_codename(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("Codename is required".to_string()));
    }
    Ok(trimmed.to_string())
}
