//! Load phase enumeration.

use serde::{Deserialize, Serialize};

/// Phases a single load call moves through.
///
/// `Provisioning → WatermarkRead → Filtering → Inserting → {Committed | RolledBack}`.
/// Nothing is retained between calls; a failed load restarts from
/// `Provisioning` on the next invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    /// Deriving the table spec and issuing `CREATE TABLE IF NOT EXISTS`.
    Provisioning,

    /// Reading `MAX(<watermark column>)` from the destination table.
    WatermarkRead,

    /// Dropping rows that are not strictly newer than the watermark.
    Filtering,

    /// Inserting the filtered rows inside one transaction.
    Inserting,

    /// All filtered rows committed (or there was nothing to insert).
    Committed,

    /// The insert transaction was rolled back; the table is unchanged.
    RolledBack,
}

impl LoadPhase {
    /// Get the string representation of this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadPhase::Provisioning => "provisioning",
            LoadPhase::WatermarkRead => "watermark_read",
            LoadPhase::Filtering => "filtering",
            LoadPhase::Inserting => "inserting",
            LoadPhase::Committed => "committed",
            LoadPhase::RolledBack => "rolled_back",
        }
    }
}

impl std::fmt::Display for LoadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
