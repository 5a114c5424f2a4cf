//! Structured events describing what the fleet does, for whoever wants to record them.
use chrono::{DateTime, Utc};
use crossbeam_channel as cbc;
use serde;
use tracing::info;

use crate::local_elevator::status::Status;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ElevatorEvent {
    pub at: DateTime<Utc>,
    pub elevator: String,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    StatusChanged { status: Status },
    FloorChanged { floor: i32 },
    DoorCycle { floor: i32 },
    RequestAssigned { request: u64, origin: i32, destination: i32 },
    RequestCollapsed { request: u64, origin: i32, destination: i32 },
    ElevatorRetired { reason: String },
}

impl ElevatorEvent {
    pub fn now(elevator: &str, kind: EventKind) -> ElevatorEvent {
        ElevatorEvent {
            at: Utc::now(),
            elevator: elevator.to_string(),
            kind,
        }
    }
}

/// Sink for elevator events. Never called while a building or queue lock is held.
pub trait EventObserver: Send + Sync {
    fn notify(&self, event: ElevatorEvent);
}

impl EventObserver for cbc::Sender<ElevatorEvent> {
    fn notify(&self, event: ElevatorEvent) {
        // A dropped receiver just means nobody is listening anymore
        let _ = self.send(event);
    }
}

/// Writes every event as a log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl EventObserver for TracingObserver {
    fn notify(&self, event: ElevatorEvent) {
        match event.kind {
            EventKind::StatusChanged { status } => {
                info!(target: "elevator.events", elevator = %event.elevator, ?status, "status changed")
            }
            EventKind::FloorChanged { floor } => {
                info!(target: "elevator.events", elevator = %event.elevator, floor, "floor changed")
            }
            EventKind::DoorCycle { floor } => {
                info!(target: "elevator.events", elevator = %event.elevator, floor, "opening/closing doors")
            }
            EventKind::RequestAssigned {
                request,
                origin,
                destination,
            } => info!(
                target: "elevator.events",
                elevator = %event.elevator,
                request,
                origin,
                destination,
                "request assigned"
            ),
            EventKind::RequestCollapsed {
                request,
                origin,
                destination,
            } => info!(
                target: "elevator.events",
                elevator = %event.elevator,
                request,
                origin,
                destination,
                "duplicate request collapsed"
            ),
            EventKind::ElevatorRetired { reason } => {
                info!(target: "elevator.events", elevator = %event.elevator, %reason, "elevator retired")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl EventObserver for NullObserver {
    fn notify(&self, _event: ElevatorEvent) {}
}
