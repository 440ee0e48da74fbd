use std::time::Duration;

use log::{debug, warn};
use rand::rngs::SmallRng;
use rand::Rng;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::communication::channels::{publish_event, CommandSender, EventSender};
use crate::communication::messages::{Command, TrafficEvent};
use crate::control_system::grouping::ConflictGroup;

/// How long a group stays green before the controller advances.
#[derive(Debug, Clone)]
pub enum DwellPolicy {
    Fixed(Duration),
    /// A fresh draw from `[min, max]` for every group.
    Random { min: Duration, max: Duration },
}

impl DwellPolicy {
    pub fn next_dwell(&self, rng: &mut SmallRng) -> Duration {
        match *self {
            DwellPolicy::Fixed(dwell) => dwell,
            DwellPolicy::Random { min, max } => {
                let millis = rng.random_range(min.as_millis() as u64..=max.as_millis() as u64);
                Duration::from_millis(millis)
            }
        }
    }
}

/// Owns the active group index and broadcasts admission state to agents.
///
/// Single-owner: only the controller's own loop ever touches this state,
/// so no locking is involved anywhere.
pub struct AdmissionController {
    groups: Vec<ConflictGroup>,
    active_index: usize,
    dwell: DwellPolicy,
    commands: Vec<CommandSender>,
    events: EventSender,
}

impl AdmissionController {
    /// `commands` is indexed by street id and must cover every street in
    /// `groups`. `groups` must be non-empty (guaranteed by the partitioner).
    pub fn new(
        groups: Vec<ConflictGroup>,
        dwell: DwellPolicy,
        commands: Vec<CommandSender>,
        events: EventSender,
    ) -> Self {
        Self {
            groups,
            active_index: 0,
            dwell,
            commands,
            events,
        }
    }

    pub fn current_group(&self) -> &ConflictGroup {
        &self.groups[self.active_index]
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    /// Moves to the next group, wrapping around. Called once per dwell.
    pub fn advance(&mut self) {
        self.active_index = (self.active_index + 1) % self.groups.len();
    }

    /// Delivers Go to every member of the current group and Wait to everyone
    /// else. A closed channel only happens during the shutdown race and is
    /// never fatal.
    pub fn broadcast(&self) {
        let group = self.current_group();
        for (street_id, tx) in self.commands.iter().enumerate() {
            let command = if group.contains(street_id) {
                Command::Go
            } else {
                Command::Wait
            };
            if tx.send(command).is_err() {
                warn!("street {street_id} command channel closed; skipping");
            }
        }
        publish_event(
            &self.events,
            TrafficEvent::GroupSwitched {
                index: self.active_index,
                group: group.clone(),
            },
        );
    }

    /// Controller loop: broadcast, dwell, advance, until shutdown flips.
    /// Broadcasting completes before the dwell timer starts, so agents
    /// observe the new admission state promptly.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>, mut rng: SmallRng) {
        loop {
            self.broadcast();
            let dwell = self.dwell.next_dwell(&mut rng);
            debug!(
                "group {} green for {:?}: {:?}",
                self.active_index,
                dwell,
                self.current_group().members()
            );
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = sleep(dwell) => {}
            }
            self.advance();
        }
        debug!("admission controller stopped");
    }
}
