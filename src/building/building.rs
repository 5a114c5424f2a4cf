use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, info};

use crate::building::registry::{ElevatorInfo, ElevatorRegistry};
use crate::local_elevator::elevator::{Elevator, ElevatorHandle};
use crate::request::request::{Request, RequestHandle};
use crate::util::config::{BuildingConfig, ConfigError};
use crate::util::error::ElevatorError;
use crate::util::events::{EventObserver, TracingObserver};

/// A building full of elevators, each running on its own thread.
///
/// # Example
/// ```rust,no_run
/// use elevator::building::building::Building;
/// let building = Building::new("building1", &["E1", "E2", "E3"], 1, 10).unwrap();
/// let rider = building.request(3, 9).unwrap();
/// while !rider.is_arrived() {
///     std::thread::sleep(std::time::Duration::from_secs(1));
/// }
/// ```
pub struct Building {
    id: String,
    min_floor: i32,
    max_floor: i32,
    registry: Arc<ElevatorRegistry>,
    elevators: HashMap<String, ElevatorHandle>,
    workers: Mutex<HashMap<String, JoinHandle<Result<(), ElevatorError>>>>,
}

impl Building {
    /// Brings up a building with default timings, logging events through `tracing`.
    pub fn new(
        id: &str,
        elevator_ids: &[&str],
        min_floor: i32,
        max_floor: i32,
    ) -> Result<Building, ConfigError> {
        let config = BuildingConfig::new(id, elevator_ids, min_floor, max_floor);
        Building::from_config(&config, Arc::new(TracingObserver))
    }

    /// Spawns one elevator thread per configured id, all stationary at `min_floor`.
    pub fn from_config(
        config: &BuildingConfig,
        observer: Arc<dyn EventObserver>,
    ) -> Result<Building, ConfigError> {
        config.validate()?;
        let registry = Arc::new(ElevatorRegistry::new());
        let mut elevators = HashMap::new();
        let mut workers = HashMap::new();
        for id in config.elevator_ids.iter() {
            let (elevator, handle) = Elevator::new(
                id,
                config.min_floor,
                config.max_floor,
                config.timings(),
                registry.clone(),
                observer.clone(),
            );
            workers.insert(id.clone(), elevator.spawn());
            elevators.insert(id.clone(), handle);
        }
        info!(
            target: "elevator.building",
            building = %config.building_id,
            elevators = elevators.len(),
            min_floor = config.min_floor,
            max_floor = config.max_floor,
            "building started"
        );
        Ok(Building {
            id: config.building_id.clone(),
            min_floor: config.min_floor,
            max_floor: config.max_floor,
            registry,
            elevators,
            workers: Mutex::new(workers),
        })
    }

    /// Creates a hail clamped to this building's floors. Nothing is dispatched yet.
    pub fn make_request(&self, origin: i32, destination: i32) -> Result<RequestHandle, ElevatorError> {
        let request = Request::create(origin, destination, self.min_floor, self.max_floor)?;
        Ok(Arc::new(request))
    }

    /// Assigns `request` to the best elevator, blocking until one is eligible.
    ///
    /// Returns the id of the chosen elevator.
    pub fn dispatch(&self, request: &RequestHandle) -> Result<String, ElevatorError> {
        let id = self.registry.wait_for_elevator(request);
        let elevator = self
            .elevators
            .get(&id)
            .ok_or_else(|| ElevatorError::UnknownElevator { elevator: id.clone() })?;
        request.mark_assigned();
        elevator.accept(request.clone())?;
        Ok(id)
    }

    /// Creates and dispatches a hail in one go.
    pub fn request(&self, origin: i32, destination: i32) -> Result<RequestHandle, ElevatorError> {
        let request = self.make_request(origin, destination)?;
        self.dispatch(&request)?;
        Ok(request)
    }

    /// Joins elevator threads that have stopped and returns why each one stopped.
    ///
    /// Healthy elevators never stop, so this is empty unless something broke.
    /// Each failure is reported once.
    pub fn failures(&self) -> Vec<(String, ElevatorError)> {
        let mut workers = self.workers.lock();
        let stopped: Vec<String> = workers
            .iter()
            .filter(|(_, worker)| worker.is_finished())
            .map(|(id, _)| id.clone())
            .collect();
        let mut failures = Vec::new();
        for id in stopped {
            let worker = match workers.remove(&id) {
                Some(worker) => worker,
                None => continue,
            };
            match worker.join() {
                Ok(Err(err)) => failures.push((id, err)),
                Ok(Ok(())) => {}
                Err(_) => error!(target: "elevator.building", elevator = %id, "elevator thread panicked"),
            }
        }
        failures.sort_by(|a, b| a.0.cmp(&b.0));
        failures
    }

    pub fn elevator_info(&self, id: &str) -> Option<ElevatorInfo> {
        self.registry.info(id)
    }

    pub fn elevators(&self) -> Vec<ElevatorInfo> {
        self.registry.all()
    }

    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn min_floor(&self) -> i32 {
        self.min_floor
    }
    pub fn max_floor(&self) -> i32 {
        self.max_floor
    }
}
