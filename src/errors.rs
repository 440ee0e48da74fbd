use thiserror::Error;

/// Failures that can abort a simulation before any task is spawned.
///
/// Runtime channel-closed conditions are deliberately absent: they only
/// occur during the shutdown race window and are logged and absorbed
/// where they happen, never surfaced as run failures.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("conflict group partitioning produced no groups")]
    NoGroups,
}
