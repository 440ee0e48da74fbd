use std::time::Duration;

use log::debug;
use rand::rngs::SmallRng;
use rand::Rng;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use crate::communication::channels::ArrivalSender;
use crate::communication::messages::ArrivalEvent;

/// Stochastic vehicle-arrival policy. The observed variants disagree on
/// this, so it is an injectable parameter rather than a constant.
#[derive(Debug, Clone)]
pub enum ArrivalPolicy {
    /// Every `every`, send `min..=max` arrivals to uniformly random streets.
    BurstPerInterval {
        min: usize,
        max: usize,
        every: Duration,
    },
    /// Every `every`, each street independently receives one arrival with
    /// probability `p`.
    PerStreetProbability { p: f64, every: Duration },
}

impl ArrivalPolicy {
    fn period(&self) -> Duration {
        match *self {
            ArrivalPolicy::BurstPerInterval { every, .. } => every,
            ArrivalPolicy::PerStreetProbability { every, .. } => every,
        }
    }
}

/// Feeds arrival events into the agents' inbound queues until shutdown.
pub struct ArrivalGenerator {
    policy: ArrivalPolicy,
    arrivals: Vec<ArrivalSender>,
    rng: SmallRng,
}

impl ArrivalGenerator {
    pub fn new(policy: ArrivalPolicy, arrivals: Vec<ArrivalSender>, rng: SmallRng) -> Self {
        Self {
            policy,
            arrivals,
            rng,
        }
    }

    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut timer = interval(self.policy.period());
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.changed() => break,
                _ = timer.tick() => self.inject(),
            }
        }
        debug!("arrival generator stopped");
    }

    fn inject(&mut self) {
        match &self.policy {
            ArrivalPolicy::BurstPerInterval { min, max, .. } => {
                let count = self.rng.random_range(*min..=*max);
                for _ in 0..count {
                    let street = self.rng.random_range(0..self.arrivals.len());
                    if self.arrivals[street].send(ArrivalEvent).is_err() {
                        debug!("street {street}: arrival channel closed, dropping arrival");
                    }
                }
            }
            ArrivalPolicy::PerStreetProbability { p, .. } => {
                let p = *p;
                for (street, tx) in self.arrivals.iter().enumerate() {
                    if self.rng.random_bool(p) && tx.send(ArrivalEvent).is_err() {
                        debug!("street {street}: arrival channel closed, dropping arrival");
                    }
                }
            }
        }
    }
}
