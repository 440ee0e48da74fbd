use std::ops::RangeInclusive;
use std::time::Duration;

use crate::control_system::admission_controller::DwellPolicy;
use crate::errors::SimulationError;
use crate::simulation_engine::arrivals::ArrivalPolicy;

/// Everything tunable about a simulation run. Defaults mirror the classic
/// six-street setup: pairs of streets green for five seconds at a time,
/// two cars released per tick, half a second per car.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of street agents to spawn.
    pub streets: usize,
    /// Maximum streets per conflict-free group.
    pub group_size: usize,
    /// Total wall-clock duration of the run.
    pub run_time: Duration,
    pub dwell: DwellPolicy,
    /// Upper bound on vehicles released per green tick.
    pub batch_size: u64,
    /// Per-vehicle release latency, applied for each released vehicle.
    pub release_latency: Duration,
    /// Cadence of the agents' internal tick.
    pub tick_interval: Duration,
    pub arrival_policy: ArrivalPolicy,
    /// Each agent starts with a random backlog drawn from this range.
    pub initial_backlog: RangeInclusive<u64>,
    /// Seed for all randomness; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            streets: 6,
            group_size: 2,
            run_time: Duration::from_secs(30),
            dwell: DwellPolicy::Fixed(Duration::from_secs(5)),
            batch_size: 2,
            release_latency: Duration::from_millis(500),
            tick_interval: Duration::from_secs(1),
            arrival_policy: ArrivalPolicy::BurstPerInterval {
                min: 1,
                max: 3,
                every: Duration::from_secs(5),
            },
            initial_backlog: 1..=5,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Rejects configurations that could not produce a meaningful run.
    /// Called before any task is spawned; a failed run never starts partially.
    pub fn validate(&self) -> Result<(), SimulationError> {
        let invalid = |reason: &str| Err(SimulationError::InvalidConfiguration(reason.into()));

        if self.streets == 0 {
            return invalid("streets must be at least 1");
        }
        if self.group_size == 0 {
            return invalid("group size must be at least 1");
        }
        if self.group_size > self.streets {
            return invalid("group size cannot exceed the street count");
        }
        if self.run_time.is_zero() {
            return invalid("run time must be positive");
        }
        if self.batch_size == 0 {
            return invalid("batch size must be at least 1");
        }
        if self.tick_interval.is_zero() {
            return invalid("tick interval must be positive");
        }
        match self.dwell {
            DwellPolicy::Fixed(dwell) if dwell.is_zero() => {
                return invalid("dwell time must be positive");
            }
            DwellPolicy::Random { min, max } if min.is_zero() || min > max => {
                return invalid("random dwell bounds must be positive and ordered");
            }
            _ => {}
        }
        match self.arrival_policy {
            ArrivalPolicy::BurstPerInterval { min, max, every } => {
                if max == 0 || min > max {
                    return invalid("arrival burst bounds must be positive and ordered");
                }
                if every.is_zero() {
                    return invalid("arrival interval must be positive");
                }
            }
            ArrivalPolicy::PerStreetProbability { p, every } => {
                if !(0.0..=1.0).contains(&p) {
                    return invalid("arrival probability must be within [0, 1]");
                }
                if every.is_zero() {
                    return invalid("arrival interval must be positive");
                }
            }
        }
        if self.initial_backlog.is_empty() {
            return invalid("initial backlog range must be non-empty");
        }
        Ok(())
    }
}
