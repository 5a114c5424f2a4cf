use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};

use crate::building::registry::ElevatorRegistry;
use crate::local_elevator::status::Status;
use crate::local_elevator::timing::Timings;
use crate::request::request::RequestHandle;
use crate::scheduler::request_queue::{Enqueued, RequestQueue};
use crate::util::error::ElevatorError;
use crate::util::events::{ElevatorEvent, EventKind, EventObserver};

/// One car and the loop that drives it.
///
/// * `floor`, `status` the car's own view, republished to the registry after every change
/// * `queue` hails assigned to this car, shared with the building through an `ElevatorHandle`
/// * `registry` where floor and status are published for dispatchers and pollers
pub struct Elevator {
    id: String,
    floor: i32,
    status: Status,
    min_floor: i32,
    max_floor: i32,
    timings: Timings,
    queue: Arc<RequestQueue>,
    registry: Arc<ElevatorRegistry>,
    observer: Arc<dyn EventObserver>,
}

/// The building's side of an elevator: lets callers hand it new hails.
#[derive(Clone)]
pub struct ElevatorHandle {
    id: String,
    queue: Arc<RequestQueue>,
    observer: Arc<dyn EventObserver>,
}

impl Elevator {
    /// Creates a stationary car at `min_floor` and registers it.
    pub fn new(
        id: &str,
        min_floor: i32,
        max_floor: i32,
        timings: Timings,
        registry: Arc<ElevatorRegistry>,
        observer: Arc<dyn EventObserver>,
    ) -> (Elevator, ElevatorHandle) {
        let queue = Arc::new(RequestQueue::new(id, min_floor, timings, observer.clone()));
        registry.register(id, min_floor);
        let handle = ElevatorHandle {
            id: id.to_string(),
            queue: queue.clone(),
            observer: observer.clone(),
        };
        let elevator = Elevator {
            id: id.to_string(),
            floor: min_floor,
            status: Status::Stationary,
            min_floor,
            max_floor,
            timings,
            queue,
            registry,
            observer,
        };
        (elevator, handle)
    }

    pub fn spawn(self) -> JoinHandle<Result<(), ElevatorError>> {
        thread::spawn(move || self.run())
    }

    /// Drives the car forever. Only returns when an invariant breaks, after
    /// taking the car out of service.
    pub fn run(mut self) -> Result<(), ElevatorError> {
        loop {
            if let Err(err) = self.step() {
                error!(target: "elevator.car", elevator = %self.id, floor = self.floor, %err, "elevator stopped");
                let _ = self.registry.retire(&self.id);
                self.observer.notify(ElevatorEvent::now(
                    &self.id,
                    EventKind::ElevatorRetired {
                        reason: err.to_string(),
                    },
                ));
                return Err(err);
            }
        }
    }

    /// One iteration of the motion loop.
    pub fn step(&mut self) -> Result<(), ElevatorError> {
        match self.status.floor_step() {
            None => {
                let status = self.queue.dispatch_from_stationary()?;
                self.adopt(status)
            }
            Some(delta) => {
                self.timings.travel();
                let new_floor = match self.floor.checked_add(delta) {
                    Some(floor) if floor >= self.min_floor && floor <= self.max_floor => floor,
                    _ => {
                        return Err(ElevatorError::OutOfBounds {
                            elevator: self.id.clone(),
                            floor: self.floor.saturating_add(delta),
                            min_floor: self.min_floor,
                            max_floor: self.max_floor,
                        })
                    }
                };
                self.registry.remove_temporarily(&self.id)?;
                let status = self.queue.advance_one_floor(new_floor)?;
                self.floor = new_floor;
                debug!(target: "elevator.car", elevator = %self.id, floor = new_floor, "reached floor");
                self.observer
                    .notify(ElevatorEvent::now(&self.id, EventKind::FloorChanged { floor: new_floor }));
                self.adopt(status)
            }
        }
    }

    fn adopt(&mut self, status: Status) -> Result<(), ElevatorError> {
        let changed = self.status != status;
        self.status = status;
        self.registry.update(&self.id, self.floor, status)?;
        if changed {
            info!(target: "elevator.car", elevator = %self.id, floor = self.floor, ?status, "status changed");
            self.observer
                .notify(ElevatorEvent::now(&self.id, EventKind::StatusChanged { status }));
        }
        Ok(())
    }

    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn floor(&self) -> i32 {
        self.floor
    }
    pub fn status(&self) -> Status {
        self.status
    }
}

impl ElevatorHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Hands an assigned hail to this car's queue.
    ///
    /// The status is left to the elevator thread, which republishes every
    /// status it adopts.
    pub fn accept(&self, request: RequestHandle) -> Result<(), ElevatorError> {
        let outcome = self.queue.enqueue(request.clone())?;
        self.announce(&request, outcome);
        Ok(())
    }

    fn announce(&self, request: &RequestHandle, outcome: Enqueued) {
        let (id, origin, destination) = (request.id(), request.origin(), request.destination());
        debug!(
            target: "elevator.car",
            elevator = %self.id,
            request = id,
            status = ?outcome.status,
            collapsed = outcome.collapsed,
            "hail queued"
        );
        let kind = if outcome.collapsed {
            EventKind::RequestCollapsed {
                request: id,
                origin,
                destination,
            }
        } else {
            EventKind::RequestAssigned {
                request: id,
                origin,
                destination,
            }
        };
        self.observer.notify(ElevatorEvent::now(&self.id, kind));
    }

    pub fn pending_len(&self) -> usize {
        self.queue.pending_len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.queue.in_flight_len()
    }
}
