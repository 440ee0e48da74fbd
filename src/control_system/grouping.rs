use serde::{Deserialize, Serialize};

use crate::errors::SimulationError;

/// Unique identifier for a street, dense in `[0, streets)`.
pub type StreetId = usize;

/// An ordered set of streets that may be green at the same time without
/// crossing traffic paths. Members are ascending and disjoint across groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictGroup(Vec<StreetId>);

impl ConflictGroup {
    pub fn members(&self) -> &[StreetId] {
        &self.0
    }

    pub fn contains(&self, street: StreetId) -> bool {
        self.0.contains(&street)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Deterministically partitions streets `0..n` into conflict-free groups.
///
/// Greedy left-to-right packing: each group takes the next `group_size`
/// unassigned streets in ascending order, so the last group may be smaller.
/// Every street ends up in exactly one group.
pub fn generate_conflict_groups(
    n: usize,
    group_size: usize,
) -> Result<Vec<ConflictGroup>, SimulationError> {
    if n == 0 {
        return Err(SimulationError::InvalidConfiguration(
            "street count must be at least 1".into(),
        ));
    }
    if group_size == 0 {
        return Err(SimulationError::InvalidConfiguration(
            "group size must be at least 1".into(),
        ));
    }

    let mut groups = Vec::with_capacity(n.div_ceil(group_size));
    let mut next = 0;
    while next < n {
        let end = (next + group_size).min(n);
        groups.push(ConflictGroup((next..end).collect()));
        next = end;
    }

    if groups.is_empty() {
        return Err(SimulationError::NoGroups);
    }
    Ok(groups)
}
