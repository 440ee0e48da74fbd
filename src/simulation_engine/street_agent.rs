use std::time::Duration;

use log::{debug, warn};
use tokio::time::{interval, sleep, MissedTickBehavior};

use crate::communication::channels::{publish_event, AgentInbox, EventSender, StatusSender};
use crate::communication::messages::{Command, StatusReport, TrafficEvent};
use crate::control_system::grouping::StreetId;

/// One street's worth of simulation state, owned exclusively by its task.
///
/// The agent processes exactly one input at a time: a command, an arrival,
/// or a tick, whichever its inbox yields next. Counter invariant at every
/// observation point: `total_arrived == waiting + total_passed`.
pub struct StreetAgent {
    street_id: StreetId,
    waiting: u64,
    total_arrived: u64,
    total_passed: u64,
    admitted: bool,
    announced_empty: bool,
    batch_size: u64,
    release_latency: Duration,
    tick_interval: Duration,
    inbox: AgentInbox,
    status: StatusSender,
    events: EventSender,
}

impl StreetAgent {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        street_id: StreetId,
        initial_backlog: u64,
        batch_size: u64,
        release_latency: Duration,
        tick_interval: Duration,
        inbox: AgentInbox,
        status: StatusSender,
        events: EventSender,
    ) -> Self {
        Self {
            street_id,
            waiting: initial_backlog,
            total_arrived: initial_backlog,
            total_passed: 0,
            admitted: false,
            announced_empty: false,
            batch_size,
            release_latency,
            tick_interval,
            inbox,
            status,
            events,
        }
    }

    /// Agent task loop. Ends on `Exit` (or a closed command channel, which
    /// only happens in the shutdown race) and emits exactly one StatusReport.
    pub async fn run(mut self) {
        let mut tick = interval(self.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut arrivals_open = true;

        loop {
            tokio::select! {
                // Commands first: a Wait issued during a backlog of arrivals
                // must not be delayed behind them.
                biased;

                command = self.inbox.commands.recv() => {
                    match command {
                        Some(Command::Go) => self.admitted = true,
                        Some(Command::Wait) => self.admitted = false,
                        Some(Command::Exit) => break,
                        None => {
                            warn!("street {}: command channel closed without EXIT", self.street_id);
                            break;
                        }
                    }
                }
                arrival = self.inbox.arrivals.recv(), if arrivals_open => {
                    match arrival {
                        Some(_) => self.on_arrival(),
                        // Generator gone; keep running on commands and ticks.
                        None => arrivals_open = false,
                    }
                }
                _ = tick.tick() => {
                    if self.admitted {
                        self.on_green_tick().await;
                    }
                }
            }
        }

        self.finish().await;
    }

    fn on_arrival(&mut self) {
        self.waiting += 1;
        self.total_arrived += 1;
        self.announced_empty = false;
        publish_event(
            &self.events,
            TrafficEvent::VehicleArrived {
                street_id: self.street_id,
                waiting: self.waiting,
            },
        );
    }

    /// Releases up to `batch_size` vehicles, or announces an empty street
    /// once. A started batch always completes; Exit is only observed
    /// between loop iterations.
    async fn on_green_tick(&mut self) {
        if self.waiting == 0 {
            if !self.announced_empty {
                publish_event(
                    &self.events,
                    TrafficEvent::StreetEmpty {
                        street_id: self.street_id,
                    },
                );
                self.announced_empty = true;
            }
            return;
        }

        let batch = self.batch_size.min(self.waiting);
        for _ in 0..batch {
            self.waiting -= 1;
            self.total_passed += 1;
            publish_event(
                &self.events,
                TrafficEvent::VehiclePassed {
                    street_id: self.street_id,
                    waiting: self.waiting,
                },
            );
            if !self.release_latency.is_zero() {
                sleep(self.release_latency).await;
            }
        }
        self.announced_empty = false;
    }

    async fn finish(self) {
        let report = StatusReport {
            street_id: self.street_id,
            total_arrived: self.total_arrived,
            total_passed: self.total_passed,
            waiting: self.waiting,
        };
        debug!("street {}: terminating with {report:?}", self.street_id);
        if self.status.send(report).await.is_err() {
            warn!("street {}: status channel closed, report dropped", self.street_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::communication::channels::{ArrivalSender, CommandSender, EventReceiver};
    use crate::communication::messages::ArrivalEvent;
    use tokio::sync::mpsc;
    use tokio::task::JoinHandle;

    struct Harness {
        commands: CommandSender,
        arrivals: ArrivalSender,
        events: EventReceiver,
        status: mpsc::Receiver<StatusReport>,
        handle: JoinHandle<()>,
    }

    fn spawn_agent(initial_backlog: u64) -> Harness {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (arrival_tx, arrival_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = mpsc::channel(1);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let agent = StreetAgent::new(
            0,
            initial_backlog,
            2,
            Duration::from_millis(500),
            Duration::from_secs(1),
            AgentInbox {
                commands: command_rx,
                arrivals: arrival_rx,
            },
            status_tx,
            events_tx,
        );
        Harness {
            commands: command_tx,
            arrivals: arrival_tx,
            events: events_rx,
            status: status_rx,
            handle: tokio::spawn(agent.run()),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn releases_batches_and_announces_empty_once() {
        let mut h = spawn_agent(3);
        h.commands.send(Command::Go).unwrap();

        // First green tick: batch of two.
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehiclePassed { street_id: 0, waiting: 2 }
        );
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehiclePassed { street_id: 0, waiting: 1 }
        );
        // Second green tick: only the last vehicle.
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehiclePassed { street_id: 0, waiting: 0 }
        );
        // Third green tick: the empty notice, exactly once.
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::StreetEmpty { street_id: 0 }
        );
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(h.events.try_recv().is_err(), "empty notice repeated");

        // An arrival resets the latch; draining it re-announces.
        h.arrivals.send(ArrivalEvent).unwrap();
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehicleArrived { street_id: 0, waiting: 1 }
        );
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehiclePassed { street_id: 0, waiting: 0 }
        );
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::StreetEmpty { street_id: 0 }
        );

        h.commands.send(Command::Exit).unwrap();
        let report = h.status.recv().await.unwrap();
        assert_eq!(report.total_arrived, 4);
        assert_eq!(report.total_passed, 4);
        assert_eq!(report.waiting, 0);
        assert_eq!(report.total_arrived, report.waiting + report.total_passed);
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn accumulates_arrivals_while_red() {
        let mut h = spawn_agent(0);

        h.arrivals.send(ArrivalEvent).unwrap();
        h.arrivals.send(ArrivalEvent).unwrap();
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehicleArrived { street_id: 0, waiting: 1 }
        );
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehicleArrived { street_id: 0, waiting: 2 }
        );

        // Several ticks while red: nothing passes.
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(h.events.try_recv().is_err());

        // Released only after the agent next observes Go.
        h.commands.send(Command::Go).unwrap();
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehiclePassed { street_id: 0, waiting: 1 }
        );
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehiclePassed { street_id: 0, waiting: 0 }
        );

        h.commands.send(Command::Exit).unwrap();
        let report = h.status.recv().await.unwrap();
        assert_eq!(report.total_arrived, 2);
        assert_eq!(report.total_passed, 2);
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn wait_pauses_release_between_batches() {
        let mut h = spawn_agent(4);
        h.commands.send(Command::Go).unwrap();

        // One full batch.
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehiclePassed { street_id: 0, waiting: 3 }
        );
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehiclePassed { street_id: 0, waiting: 2 }
        );

        h.commands.send(Command::Wait).unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(h.events.try_recv().is_err(), "released while red");

        h.commands.send(Command::Exit).unwrap();
        let report = h.status.recv().await.unwrap();
        assert_eq!(report.waiting, 2);
        assert_eq!(report.total_passed, 2);
        assert_eq!(report.total_arrived, 4);
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn exit_emits_one_report_and_stops_all_input() {
        let mut h = spawn_agent(1);
        h.commands.send(Command::Exit).unwrap();

        let report = h.status.recv().await.unwrap();
        assert_eq!(report.waiting, 1);
        assert_eq!(report.total_passed, 0);
        h.handle.await.unwrap();

        // Terminated: inbox is gone, senders observe the closure.
        assert!(h.commands.send(Command::Go).is_err());
        assert!(h.arrivals.send(ArrivalEvent).is_err());
        // And no second report ever shows up.
        assert!(h.status.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_command_channel_finalizes_like_exit() {
        let mut h = spawn_agent(2);
        drop(h.commands);

        let report = h.status.recv().await.unwrap();
        assert_eq!(report.waiting, 2);
        assert_eq!(report.total_arrived, 2);
        h.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn closed_arrival_channel_is_benign() {
        let mut h = spawn_agent(1);
        drop(h.arrivals);

        h.commands.send(Command::Go).unwrap();
        assert_eq!(
            h.events.recv().await.unwrap(),
            TrafficEvent::VehiclePassed { street_id: 0, waiting: 0 }
        );
        h.commands.send(Command::Exit).unwrap();
        let report = h.status.recv().await.unwrap();
        assert_eq!(report.total_passed, 1);
        h.handle.await.unwrap();
    }
}
