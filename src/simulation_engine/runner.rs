use log::{info, warn};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::sync::watch;
use tokio::time::sleep;

use crate::communication::channels::{build_channels, EventReceiver, SimulationChannels};
use crate::communication::messages::{Command, TrafficEvent};
use crate::config::SimulationConfig;
use crate::control_system::admission_controller::AdmissionController;
use crate::control_system::grouping::generate_conflict_groups;
use crate::errors::SimulationError;
use crate::simulation_engine::arrivals::ArrivalGenerator;
use crate::simulation_engine::street_agent::StreetAgent;
use crate::simulation_engine::summary::SimulationSummary;

/// Runs one complete simulation: spawn agents, cycle groups for the
/// configured duration, shut everything down in order and aggregate the
/// terminal reports.
pub async fn run_simulation(
    config: SimulationConfig,
) -> Result<SimulationSummary, SimulationError> {
    config.validate()?;
    let groups = generate_conflict_groups(config.streets, config.group_size)?;
    info!(
        "starting simulation: {} streets in {} groups, running for {:?}",
        config.streets,
        groups.len(),
        config.run_time
    );

    let SimulationChannels {
        commands,
        arrivals,
        agent_inboxes,
        status_tx,
        mut status_rx,
        events_tx,
        events_rx,
    } = build_channels(config.streets);

    let mut rng = match config.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let mut agents = Vec::with_capacity(config.streets);
    for (street_id, inbox) in agent_inboxes.into_iter().enumerate() {
        let initial_backlog = rng.random_range(config.initial_backlog.clone());
        let agent = StreetAgent::new(
            street_id,
            initial_backlog,
            config.batch_size,
            config.release_latency,
            config.tick_interval,
            inbox,
            status_tx.clone(),
            events_tx.clone(),
        );
        agents.push(tokio::spawn(agent.run()));
    }
    drop(status_tx);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let controller = AdmissionController::new(
        groups,
        config.dwell.clone(),
        commands.clone(),
        events_tx.clone(),
    );
    let controller_handle =
        tokio::spawn(controller.run(shutdown_rx.clone(), SmallRng::from_rng(&mut rng)));

    let generator = ArrivalGenerator::new(
        config.arrival_policy.clone(),
        arrivals,
        SmallRng::from_rng(&mut rng),
    );
    let generator_handle = tokio::spawn(generator.run(shutdown_rx));

    let subscriber_handle = tokio::spawn(log_events(events_rx));
    drop(events_tx);

    sleep(config.run_time).await;

    // Stop the writers first so no Go arrives after an agent's Exit.
    let _ = shutdown_tx.send(true);
    let _ = controller_handle.await;
    let _ = generator_handle.await;

    for (street_id, tx) in commands.iter().enumerate() {
        if tx.send(Command::Exit).is_err() {
            warn!("street {street_id}: already gone before EXIT");
        }
    }
    drop(commands);

    for handle in agents {
        let _ = handle.await;
    }

    let mut reports = Vec::with_capacity(config.streets);
    while let Some(report) = status_rx.recv().await {
        reports.push(report);
    }
    let _ = subscriber_handle.await;

    let summary = SimulationSummary::collect(config.streets, reports);
    if !summary.is_complete() {
        warn!(
            "only {} of {} streets reported",
            summary.reports.len(),
            summary.spawned
        );
    }
    Ok(summary)
}

/// Observation-channel subscriber: renders core events as log lines.
/// Runs until every event sender is gone.
async fn log_events(mut events: EventReceiver) {
    while let Some(event) = events.recv().await {
        match event {
            TrafficEvent::VehiclePassed { street_id, waiting } => {
                info!("Street {street_id}: car passed! ({waiting} waiting)");
            }
            TrafficEvent::VehicleArrived { street_id, waiting } => {
                info!("Street {street_id}: car arrived. Waiting = {waiting}");
            }
            TrafficEvent::StreetEmpty { street_id } => {
                info!("Street {street_id} is empty.");
            }
            TrafficEvent::GroupSwitched { index, group } => {
                info!("== GREEN for group {index}: {:?} ==", group.members());
            }
        }
    }
}
