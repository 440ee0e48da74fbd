use log::debug;
use tokio::sync::mpsc;

use crate::communication::messages::{ArrivalEvent, Command, StatusReport, TrafficEvent};

pub type CommandSender = mpsc::UnboundedSender<Command>;
pub type ArrivalSender = mpsc::UnboundedSender<ArrivalEvent>;
pub type StatusSender = mpsc::Sender<StatusReport>;
pub type StatusReceiver = mpsc::Receiver<StatusReport>;
pub type EventSender = mpsc::UnboundedSender<TrafficEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TrafficEvent>;

/// Receiving ends owned by a single street agent. Each channel is FIFO;
/// nothing is ordered across agents.
pub struct AgentInbox {
    pub commands: mpsc::UnboundedReceiver<Command>,
    pub arrivals: mpsc::UnboundedReceiver<ArrivalEvent>,
}

/// All channel endpoints for one simulation run.
///
/// Command and arrival channels are unbounded so the controller and the
/// arrival generator never block on a slow agent. The status channel is
/// bounded at the agent count: each agent sends exactly one report.
pub struct SimulationChannels {
    pub commands: Vec<CommandSender>,
    pub arrivals: Vec<ArrivalSender>,
    pub agent_inboxes: Vec<AgentInbox>,
    pub status_tx: StatusSender,
    pub status_rx: StatusReceiver,
    pub events_tx: EventSender,
    pub events_rx: EventReceiver,
}

/// Builds the full channel fabric for `n` street agents.
pub fn build_channels(n: usize) -> SimulationChannels {
    let mut commands = Vec::with_capacity(n);
    let mut arrivals = Vec::with_capacity(n);
    let mut agent_inboxes = Vec::with_capacity(n);

    for _ in 0..n {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (arrival_tx, arrival_rx) = mpsc::unbounded_channel();
        commands.push(command_tx);
        arrivals.push(arrival_tx);
        agent_inboxes.push(AgentInbox {
            commands: command_rx,
            arrivals: arrival_rx,
        });
    }

    let (status_tx, status_rx) = mpsc::channel(n.max(1));
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    SimulationChannels {
        commands,
        arrivals,
        agent_inboxes,
        status_tx,
        status_rx,
        events_tx,
        events_rx,
    }
}

/// Sends an event to the observation channel. A missing subscriber is not
/// an error; the event is simply dropped.
pub fn publish_event(events: &EventSender, event: TrafficEvent) {
    if events.send(event).is_err() {
        debug!("no event subscriber; observation dropped");
    }
}
