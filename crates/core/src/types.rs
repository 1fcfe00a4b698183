/// Player ids are the `players` table primary key (PostgreSQL BIGINT).
pub type PlayerId = i64;

/// Equipment ids go out over UDP as non-negative decimal text.
pub type EquipmentId = u32;
