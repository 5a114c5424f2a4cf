use std::env;
use std::process;
use std::sync::Arc;
use std::thread::{sleep, spawn};
use std::time::Duration;

use crossbeam_channel as cbc;
use rand::distributions::Uniform;
use rand::Rng;
use thiserror::Error;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use elevator::building::building::Building;
use elevator::util::config::{BuildingConfig, ConfigError};
use elevator::util::constants as setting;
use elevator::util::events::ElevatorEvent;

#[derive(Debug, Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(err) = run() {
        error!(%err, "elevator demo failed");
        process::exit(1);
    }
}

/// Fills the building with passengers travelling between random floors and waits for all of them.
fn run() -> Result<(), DemoError> {
    // Config: either a JSON file from the command line, or the built-in defaults
    let args: Vec<String> = env::args().collect();
    let config = if args.len() > 1 {
        BuildingConfig::from_json_file(&args[1])?
    } else {
        BuildingConfig::default()
    };

    // Every elevator event ends up as one JSON line on stdout
    let (event_tx, event_rx) = cbc::unbounded::<ElevatorEvent>();
    spawn(move || {
        for event in event_rx.iter() {
            match serde_json::to_string(&event) {
                Ok(line) => println!("{}", line),
                Err(err) => warn!(%err, "failed to encode elevator event"),
            }
        }
    });

    let building = Arc::new(Building::from_config(&config, Arc::new(event_tx))?);
    info!(building = building.id(), passengers = setting::DEMO_PASSENGERS, "starting demo");

    let (delivered_tx, delivered_rx) = cbc::unbounded::<u64>();
    for _ in 0..setting::DEMO_PASSENGERS {
        sleep(Duration::from_millis(setting::DEMO_REQUEST_INTERVAL_MS));
        let building = building.clone();
        let delivered_tx = delivered_tx.clone();
        spawn(move || {
            let (origin, destination) = random_trip(building.min_floor(), building.max_floor());
            match building.request(origin, destination) {
                Ok(request) => {
                    while !request.is_arrived() {
                        sleep(Duration::from_millis(setting::DEMO_ARRIVAL_POLL_MS));
                    }
                    let _ = delivered_tx.send(request.id());
                }
                Err(err) => warn!(origin, destination, %err, "passenger gave up"),
            }
        });
    }
    drop(delivered_tx);

    // The channel closes once every passenger thread has finished
    let delivered = delivered_rx.iter().count();
    info!(delivered, passengers = setting::DEMO_PASSENGERS, "DONE");
    Ok(())
}

fn random_trip(min_floor: i32, max_floor: i32) -> (i32, i32) {
    let mut rng = rand::thread_rng();
    let floors = Uniform::new_inclusive(min_floor, max_floor);
    let origin = rng.sample(floors);
    let mut destination = rng.sample(floors);
    while destination == origin {
        destination = rng.sample(floors);
    }
    (origin, destination)
}
