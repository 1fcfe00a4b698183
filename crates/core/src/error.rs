use crate::team::Team;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Operator input that cannot be used as-is (non-integer id, empty codename).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{team} already has {capacity} players")]
    TeamFull { team: Team, capacity: usize },

    /// The player store could not be reached or the query failed.
    #[error("Player store unavailable: {0}")]
    StoreUnavailable(String),

    /// A UDP socket operation failed.
    #[error("Transport fault: {0}")]
    TransportFault(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
