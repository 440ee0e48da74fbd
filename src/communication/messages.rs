use serde::{Deserialize, Serialize};

use crate::control_system::grouping::{ConflictGroup, StreetId};

/// Admission command, controller -> street agent. `Exit` is terminal and
/// one-shot per agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Go,
    Wait,
    Exit,
}

/// One vehicle arriving at a street, generator -> agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalEvent;

/// Terminal snapshot of an agent's counters, emitted exactly once at exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub street_id: StreetId,
    pub total_arrived: u64,
    pub total_passed: u64,
    pub waiting: u64,
}

/// Observable state transitions emitted by the core on the observation
/// channel. Rendering these (console, GUI, ...) is the subscriber's concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrafficEvent {
    VehiclePassed { street_id: StreetId, waiting: u64 },
    VehicleArrived { street_id: StreetId, waiting: u64 },
    StreetEmpty { street_id: StreetId },
    GroupSwitched { index: usize, group: ConflictGroup },
}
