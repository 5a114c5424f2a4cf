use thiserror::Error;

use crate::local_elevator::status::Status;

/// Failures raised by requests, queues and elevators.
///
/// `InvalidRequest` is the only variant a caller is expected to handle. The
/// others mean an internal invariant broke and end the elevator thread that
/// observed them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ElevatorError {
    #[error("invalid elevator request: {origin} to {destination}")]
    InvalidRequest { origin: i32, destination: i32 },
    #[error("request {request} completed before it was assigned")]
    NotAssigned { request: u64 },
    #[error("elevator {elevator} left the building at floor {floor} (bounds {min_floor}..={max_floor})")]
    OutOfBounds {
        elevator: String,
        floor: i32,
        min_floor: i32,
        max_floor: i32,
    },
    #[error("elevator {elevator} cannot advance while {status:?}")]
    InvalidTransition { elevator: String, status: Status },
    #[error("unknown elevator {elevator}")]
    UnknownElevator { elevator: String },
}
