//! A single hail travelling from one floor to another.
use parking_lot::Mutex;
use serde;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::util::error::ElevatorError;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Shared handle returned to whoever issued the request, pollable with `is_arrived`.
pub type RequestHandle = Arc<Request>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Up,
    Down,
}

/// Lifecycle of a request. Only ever moves forward.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum RequestState {
    Waiting,
    Assigned,
    Arrived,
}

#[derive(Debug)]
pub struct Request {
    id: u64,
    origin: i32,
    destination: i32,
    direction: Direction,
    state: Mutex<RequestState>,
}

impl Request {
    /// Creates a request with both floors clamped into `min_floor..=max_floor`.
    ///
    /// Fails with `InvalidRequest` when the clamped floors coincide.
    pub fn create(
        origin: i32,
        destination: i32,
        min_floor: i32,
        max_floor: i32,
    ) -> Result<Request, ElevatorError> {
        let from = origin.max(min_floor).min(max_floor);
        let to = destination.max(min_floor).min(max_floor);
        if from == to {
            return Err(ElevatorError::InvalidRequest {
                origin,
                destination,
            });
        }
        let direction = if to > from { Direction::Up } else { Direction::Down };
        Ok(Request {
            id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            origin: from,
            destination: to,
            direction,
            state: Mutex::new(RequestState::Waiting),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }
    pub fn origin(&self) -> i32 {
        self.origin
    }
    pub fn destination(&self) -> i32 {
        self.destination
    }
    pub fn direction(&self) -> Direction {
        self.direction
    }
    pub fn state(&self) -> RequestState {
        *self.state.lock()
    }

    /// Ordering key used by the pending sets of a request queue.
    pub fn key(&self) -> (i32, i32) {
        (self.origin, self.destination)
    }

    pub fn mark_assigned(&self) {
        let mut state = self.state.lock();
        if *state == RequestState::Waiting {
            *state = RequestState::Assigned;
        }
    }

    pub fn mark_arrived(&self) -> Result<(), ElevatorError> {
        let mut state = self.state.lock();
        match *state {
            RequestState::Waiting => Err(ElevatorError::NotAssigned { request: self.id }),
            RequestState::Assigned | RequestState::Arrived => {
                *state = RequestState::Arrived;
                Ok(())
            }
        }
    }

    pub fn is_assigned(&self) -> bool {
        self.state() >= RequestState::Assigned
    }

    pub fn is_arrived(&self) -> bool {
        self.state() == RequestState::Arrived
    }
}
