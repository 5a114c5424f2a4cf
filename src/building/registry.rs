//! Shared view of where every elevator is and which way it is heading.
//!
//! This is the building's monitor: publishing an elevator's floor/status and
//! choosing an elevator for a hail are serialized by the same mutex, and callers
//! with no eligible elevator park on `available` until some elevator changes bucket.
use parking_lot::{Condvar, Mutex};
use serde;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

use crate::local_elevator::status::Status;
use crate::order_assigner::nearest_elevator::{self, StatusBuckets};
use crate::request::request::Request;
use crate::util::error::ElevatorError;

/// Snapshot of one elevator as last published.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ElevatorInfo {
    pub id: String,
    pub floor: i32,
    pub status: Status,
}

#[derive(Debug, Default)]
struct RegistryState {
    elevators: HashMap<String, ElevatorInfo>,
    buckets: StatusBuckets,
    retired: HashSet<String>,
}

impl RegistryState {
    fn info_mut(&mut self, id: &str) -> Result<&mut ElevatorInfo, ElevatorError> {
        self.elevators
            .get_mut(id)
            .ok_or_else(|| ElevatorError::UnknownElevator {
                elevator: id.to_string(),
            })
    }
}

/// Records the new floor/status and re-buckets the elevator unless it is retired.
///
/// Returns `(status changed, newly entered a bucket)`.
fn publish(
    state: &mut RegistryState,
    id: &str,
    floor: i32,
    status: Status,
) -> Result<(bool, bool), ElevatorError> {
    let retired = state.retired.contains(id);
    let info = state.info_mut(id)?;
    let previous = info.clone();
    info.floor = floor;
    info.status = status;
    let changed = previous.status != status;
    if retired {
        return Ok((changed, false));
    }
    state.buckets.remove_everywhere(previous.floor, id);
    let entered = state.buckets.insert(status.heading(), floor, id);
    Ok((changed, entered))
}

#[derive(Debug, Default)]
pub struct ElevatorRegistry {
    state: Mutex<RegistryState>,
    available: Condvar,
}

impl ElevatorRegistry {
    pub fn new() -> ElevatorRegistry {
        ElevatorRegistry::default()
    }

    /// Puts a fresh, stationary elevator into service at `floor`.
    pub fn register(&self, id: &str, floor: i32) {
        let mut state = self.state.lock();
        state.elevators.insert(
            id.to_string(),
            ElevatorInfo {
                id: id.to_string(),
                floor,
                status: Status::Stationary,
            },
        );
        state.buckets.insert(Status::Stationary.heading(), floor, id);
        drop(state);
        self.available.notify_all();
    }

    /// Publishes a new floor and status, moving the elevator into the matching bucket.
    ///
    /// Returns whether the status changed. Waiting dispatchers are woken whenever
    /// the elevator lands in a bucket it was not already in.
    pub fn update(&self, id: &str, floor: i32, status: Status) -> Result<bool, ElevatorError> {
        let mut state = self.state.lock();
        let (changed, entered) = publish(&mut state, id, floor, status)?;
        drop(state);
        if entered {
            self.available.notify_all();
        }
        Ok(changed)
    }

    /// Hides the elevator from dispatchers while its floor changes.
    pub fn remove_temporarily(&self, id: &str) -> Result<(), ElevatorError> {
        let mut state = self.state.lock();
        let floor = state.info_mut(id)?.floor;
        state.buckets.remove_everywhere(floor, id);
        Ok(())
    }

    /// Takes a broken elevator out of service for good.
    pub fn retire(&self, id: &str) -> Result<(), ElevatorError> {
        let mut state = self.state.lock();
        let floor = state.info_mut(id)?.floor;
        state.buckets.remove_everywhere(floor, id);
        state.retired.insert(id.to_string());
        Ok(())
    }

    /// Blocks until some elevator can take `request` and returns its id.
    pub fn wait_for_elevator(&self, request: &Request) -> String {
        let mut state = self.state.lock();
        loop {
            if let Some(id) =
                nearest_elevator::best_elevator(&state.buckets, request.origin(), request.direction())
            {
                info!(
                    target: "elevator.building",
                    request = request.id(),
                    origin = request.origin(),
                    destination = request.destination(),
                    elevator = %id,
                    "best elevator selected"
                );
                return id;
            }
            debug!(target: "elevator.building", request = request.id(), "no elevator available, waiting");
            self.available.wait(&mut state);
        }
    }

    pub fn info(&self, id: &str) -> Option<ElevatorInfo> {
        self.state.lock().elevators.get(id).cloned()
    }

    pub fn all(&self) -> Vec<ElevatorInfo> {
        let state = self.state.lock();
        let mut all: Vec<ElevatorInfo> = state.elevators.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    pub fn memberships(&self, id: &str) -> usize {
        self.state.lock().buckets.memberships(id)
    }

    pub fn is_retired(&self, id: &str) -> bool {
        self.state.lock().retired.contains(id)
    }
}
