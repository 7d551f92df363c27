//! Settings shared by the ledger facade and the command line tools.

use crate::{pagination::PaginationConfig, timezone::CanonicalZone};

/// Configuration for a [Ledger](crate::Ledger).
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerConfig {
    /// The timezone all calendar periods are computed in.
    pub zone: CanonicalZone,
    pub pagination: PaginationConfig,
    /// How many transactions the recent activity view shows.
    pub recent_activity_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            zone: CanonicalZone::Utc,
            pagination: PaginationConfig::default(),
            recent_activity_limit: 5,
        }
    }
}

impl LedgerConfig {
    /// The default configuration with the canonical timezone `zone`.
    pub fn with_zone(zone: CanonicalZone) -> Self {
        Self {
            zone,
            ..Default::default()
        }
    }
}
