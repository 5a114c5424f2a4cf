use std::collections::HashMap;

use crate::request::request::RequestHandle;
use crate::util::error::ElevatorError;

/// Riders currently inside one elevator, bucketed by the floor they get off at.
///
/// Owned by a single request queue and only touched under that queue's lock.
#[derive(Debug, Default)]
pub struct DestinationIndex {
    by_floor: HashMap<i32, Vec<RequestHandle>>,
    count: usize,
}

impl DestinationIndex {
    pub fn new() -> DestinationIndex {
        DestinationIndex::default()
    }

    pub fn register(&mut self, request: RequestHandle) {
        self.by_floor
            .entry(request.destination())
            .or_insert_with(Vec::new)
            .push(request);
        self.count += 1;
    }

    /// Marks every rider bound for `floor` as arrived and forgets them.
    ///
    /// Returns whether anybody got off.
    pub fn drain_arrivals(&mut self, floor: i32) -> Result<bool, ElevatorError> {
        let arrivals = match self.by_floor.remove(&floor) {
            Some(arrivals) => arrivals,
            None => return Ok(false),
        };
        self.count -= arrivals.len();
        for request in arrivals.iter() {
            request.mark_arrived()?;
        }
        Ok(!arrivals.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn len(&self) -> usize {
        self.count
    }
}
