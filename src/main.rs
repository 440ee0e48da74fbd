use std::str::FromStr;
use std::time::Duration;

use log::warn;

use distributed_traffic::config::SimulationConfig;
use distributed_traffic::simulation_engine::runner::run_simulation;

/// Reads an override from the environment, warning on unparsable values.
fn env_override<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("ignoring unparsable {key}={raw}");
            None
        }
    }
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let mut config = SimulationConfig::default();
    if let Some(streets) = env_override("DT_STREETS") {
        config.streets = streets;
    }
    if let Some(group_size) = env_override("DT_GROUP_SIZE") {
        config.group_size = group_size;
    }
    if let Some(secs) = env_override::<u64>("DT_RUN_SECS") {
        config.run_time = Duration::from_secs(secs);
    }
    if let Some(seed) = env_override("DT_SEED") {
        config.seed = Some(seed);
    }

    match run_simulation(config).await {
        Ok(summary) => {
            println!("\nSimulation ended.\n{summary}");
            if std::env::var("DT_SUMMARY_JSON").is_ok() {
                match summary.to_json() {
                    Ok(json) => println!("{json}"),
                    Err(e) => warn!("could not serialize summary: {e}"),
                }
            }
            if let Ok(path) = std::env::var("DT_SUMMARY_CSV") {
                if let Err(e) = summary.write_csv(&path) {
                    warn!("could not write summary CSV to {path}: {e}");
                }
            }
        }
        Err(e) => {
            eprintln!("simulation failed: {e}");
            std::process::exit(1);
        }
    }
}
