//! Per-elevator scan scheduler.
//!
//! Hails that have not been picked up wait in one of two ordered sets keyed by
//! `(origin, destination)`: `ascending` for UP hails and `descending` for DOWN
//! hails. Riders already on board live in the `DestinationIndex`. Everything
//! sits behind a single mutex; the elevator thread and callers enqueueing new
//! hails both go through it. Door cycles are simulated with the lock released.
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::local_elevator::status::Status;
use crate::local_elevator::timing::Timings;
use crate::request::destination_index::DestinationIndex;
use crate::request::request::{Direction, RequestHandle};
use crate::util::error::ElevatorError;
use crate::util::events::{ElevatorEvent, EventKind, EventObserver};

type PendingSet = BTreeMap<(i32, i32), RequestHandle>;

/// Outcome of handing a hail to the queue.
///
/// `status` is the elevator's status when the hail went in. `collapsed` is set
/// when the hail matched one already waiting and was marked arrived instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Enqueued {
    pub status: Status,
    pub collapsed: bool,
}

#[derive(Debug)]
struct QueueState {
    floor: i32,
    status: Status,
    ascending: PendingSet,
    descending: PendingSet,
    in_flight: DestinationIndex,
}

impl QueueState {
    fn pending(&self, direction: Direction) -> &PendingSet {
        match direction {
            Direction::Up => &self.ascending,
            Direction::Down => &self.descending,
        }
    }

    fn pending_mut(&mut self, direction: Direction) -> &mut PendingSet {
        match direction {
            Direction::Up => &mut self.ascending,
            Direction::Down => &mut self.descending,
        }
    }

    /// Origin of the hail an elevator serving `direction` reaches first:
    /// lowest origin going up, highest going down.
    fn leading_origin(&self, direction: Direction) -> Option<i32> {
        let pending = self.pending(direction);
        let edge = match direction {
            Direction::Up => pending.keys().next(),
            Direction::Down => pending.keys().next_back(),
        };
        edge.map(|&(origin, _)| origin)
    }

    /// Moves every `direction` hail waiting at `floor` on board. Returns how many boarded.
    fn board_at(&mut self, direction: Direction, floor: i32) -> usize {
        let keys: Vec<(i32, i32)> = self
            .pending(direction)
            .range((floor, i32::MIN)..=(floor, i32::MAX))
            .map(|(key, _)| *key)
            .collect();
        for key in keys.iter() {
            if let Some(request) = self.pending_mut(direction).remove(key) {
                self.in_flight.register(request);
            }
        }
        keys.len()
    }
}

pub struct RequestQueue {
    elevator: String,
    timings: Timings,
    observer: Arc<dyn EventObserver>,
    state: Mutex<QueueState>,
    work: Condvar,
}

impl RequestQueue {
    pub fn new(
        elevator: &str,
        start_floor: i32,
        timings: Timings,
        observer: Arc<dyn EventObserver>,
    ) -> RequestQueue {
        RequestQueue {
            elevator: elevator.to_string(),
            timings,
            observer,
            state: Mutex::new(QueueState {
                floor: start_floor,
                status: Status::Stationary,
                ascending: BTreeMap::new(),
                descending: BTreeMap::new(),
                in_flight: DestinationIndex::new(),
            }),
            work: Condvar::new(),
        }
    }

    /// Accepts a hail for this elevator. The elevator's status is left untouched.
    ///
    /// A hail identical to one already waiting is folded into it and reported
    /// as arrived straight away.
    pub fn enqueue(&self, request: RequestHandle) -> Result<Enqueued, ElevatorError> {
        request.mark_assigned();
        let mut state = self.state.lock();
        let status = state.status;
        let pending = state.pending_mut(request.direction());
        if pending.contains_key(&request.key()) {
            drop(state);
            warn!(
                target: "elevator.queue",
                elevator = %self.elevator,
                request = request.id(),
                origin = request.origin(),
                destination = request.destination(),
                "duplicate hail collapsed"
            );
            request.mark_arrived()?;
            return Ok(Enqueued {
                status,
                collapsed: true,
            });
        }
        pending.insert(request.key(), request);
        drop(state);
        self.work.notify_all();
        Ok(Enqueued {
            status,
            collapsed: false,
        })
    }

    /// Blocks until there is a hail to serve, then decides where to head.
    pub fn dispatch_from_stationary(&self) -> Result<Status, ElevatorError> {
        let mut state = self.state.lock();
        while state.ascending.is_empty() && state.descending.is_empty() {
            self.work.wait(&mut state);
        }
        let direction = if !state.ascending.is_empty() {
            Direction::Up
        } else {
            Direction::Down
        };
        self.serve(&mut state, direction)
    }

    fn serve(
        &self,
        state: &mut MutexGuard<'_, QueueState>,
        direction: Direction,
    ) -> Result<Status, ElevatorError> {
        let floor = state.floor;
        let leading = match state.leading_origin(direction) {
            Some(origin) => origin,
            None => return Ok(state.status),
        };

        let status = if leading == floor {
            state.board_at(direction, floor);
            state.status = Status::moving(direction);
            self.cycle_doors(state, floor);
            state.in_flight.drain_arrivals(floor)?;
            Status::moving(direction)
        } else {
            match direction {
                Direction::Up if leading > floor => Status::MovingUp,
                Direction::Up => Status::MovingDownBusy,
                Direction::Down if leading < floor => Status::MovingDown,
                Direction::Down => Status::MovingUpBusy,
            }
        };
        state.status = status;
        Ok(status)
    }

    /// Called once the car has physically reached `new_floor`. Lets riders off,
    /// boards waiting hails and returns the status to continue with.
    pub fn advance_one_floor(&self, new_floor: i32) -> Result<Status, ElevatorError> {
        let mut state = self.state.lock();
        let current = state.status;
        if current == Status::Stationary {
            return Err(ElevatorError::InvalidTransition {
                elevator: self.elevator.clone(),
                status: current,
            });
        }
        state.floor = new_floor;
        let mut stopped = state.in_flight.drain_arrivals(new_floor)?;

        let next = match current {
            Status::MovingUp | Status::MovingDown => {
                let direction = if current == Status::MovingUp {
                    Direction::Up
                } else {
                    Direction::Down
                };
                if state.board_at(direction, new_floor) > 0 {
                    stopped = true;
                }
                if state.in_flight.is_empty() {
                    Status::Stationary
                } else {
                    current
                }
            }
            Status::MovingUpBusy => self.turn_at_furthest(&mut state, Direction::Down, new_floor, &mut stopped),
            Status::MovingDownBusy => self.turn_at_furthest(&mut state, Direction::Up, new_floor, &mut stopped),
            Status::Stationary => current,
        };
        state.status = next;
        if stopped {
            self.cycle_doors(&mut state, new_floor);
        }
        Ok(next)
    }

    /// Busy travel: keep going until the furthest `opposite` hail is reached, then board it and turn.
    fn turn_at_furthest(
        &self,
        state: &mut QueueState,
        opposite: Direction,
        floor: i32,
        stopped: &mut bool,
    ) -> Status {
        match state.leading_origin(opposite) {
            Some(origin) if origin == floor => {
                state.board_at(opposite, floor);
                *stopped = true;
                Status::moving(opposite)
            }
            Some(_) => match opposite {
                Direction::Down => Status::MovingUpBusy,
                Direction::Up => Status::MovingDownBusy,
            },
            None => {
                if state.in_flight.is_empty() {
                    Status::Stationary
                } else {
                    state.status
                }
            }
        }
    }

    fn cycle_doors(&self, state: &mut MutexGuard<'_, QueueState>, floor: i32) {
        debug!(target: "elevator.queue", elevator = %self.elevator, floor, "opening/closing doors");
        MutexGuard::unlocked(state, || {
            self.observer
                .notify(ElevatorEvent::now(&self.elevator, EventKind::DoorCycle { floor }));
            self.timings.cycle_doors();
        });
    }

    pub fn status(&self) -> Status {
        self.state.lock().status
    }

    pub fn floor(&self) -> i32 {
        self.state.lock().floor
    }

    pub fn pending_len(&self) -> usize {
        let state = self.state.lock();
        state.ascending.len() + state.descending.len()
    }

    pub fn in_flight_len(&self) -> usize {
        self.state.lock().in_flight.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::request::request::Request;
    use crossbeam_channel as cbc;
    use std::thread;
    use std::time::Duration;

    fn queue_at(floor: i32) -> (RequestQueue, cbc::Receiver<ElevatorEvent>) {
        let (event_tx, event_rx) = cbc::unbounded::<ElevatorEvent>();
        let queue = RequestQueue::new("E1", floor, Timings::instant(), Arc::new(event_tx));
        (queue, event_rx)
    }

    fn hail(origin: i32, destination: i32) -> RequestHandle {
        Arc::new(Request::create(origin, destination, 1, 10).unwrap())
    }

    fn door_cycles_at(event_rx: &cbc::Receiver<ElevatorEvent>, floor: i32) -> usize {
        event_rx
            .try_iter()
            .filter(|event| event.kind == EventKind::DoorCycle { floor })
            .count()
    }

    #[test]
    fn it_routes_hails_by_direction() {
        let (queue, _events) = queue_at(1);
        let up = hail(2, 6);
        let down = hail(8, 3);
        assert_eq!(
            queue.enqueue(up.clone()),
            Ok(Enqueued {
                status: Status::Stationary,
                collapsed: false
            })
        );
        queue.enqueue(down.clone()).unwrap();
        assert_eq!(queue.pending_len(), 2);
        assert!(up.is_assigned() && down.is_assigned());
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingUp));
    }

    #[test]
    fn it_collapses_duplicate_hails() {
        let (queue, _events) = queue_at(1);
        let first = hail(3, 7);
        let second = hail(3, 7);
        assert!(!queue.enqueue(first.clone()).unwrap().collapsed);
        assert!(queue.enqueue(second.clone()).unwrap().collapsed);
        assert_eq!(queue.pending_len(), 1);
        assert!(second.is_arrived());
        assert!(!first.is_arrived());
    }

    #[test]
    fn it_prefers_ascending_hails_when_stationary() {
        let (queue, _events) = queue_at(5);
        queue.enqueue(hail(9, 2)).unwrap();
        queue.enqueue(hail(7, 8)).unwrap();
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingUp));
    }

    #[test]
    fn it_heads_down_busy_for_an_up_hail_below() {
        let (queue, _events) = queue_at(5);
        queue.enqueue(hail(2, 6)).unwrap();
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingDownBusy));
        assert_eq!(queue.advance_one_floor(4), Ok(Status::MovingDownBusy));
        assert_eq!(queue.advance_one_floor(3), Ok(Status::MovingDownBusy));
        assert_eq!(queue.advance_one_floor(2), Ok(Status::MovingUp));
        assert_eq!(queue.in_flight_len(), 1);
    }

    #[test]
    fn it_boards_hails_at_the_current_floor_in_one_stop() {
        let (queue, events) = queue_at(1);
        queue.enqueue(hail(1, 5)).unwrap();
        queue.enqueue(hail(1, 3)).unwrap();
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingUp));
        assert_eq!(queue.in_flight_len(), 2);
        assert_eq!(queue.pending_len(), 0);
        assert_eq!(door_cycles_at(&events, 1), 1);
    }

    #[test]
    fn it_flips_direction_exactly_at_the_furthest_hail() {
        let (queue, _events) = queue_at(1);
        let down = hail(10, 2);
        queue.enqueue(down.clone()).unwrap();
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingUpBusy));
        for floor in 2..10 {
            assert_eq!(queue.advance_one_floor(floor), Ok(Status::MovingUpBusy));
        }
        assert_eq!(queue.advance_one_floor(10), Ok(Status::MovingDown));
        assert_eq!(queue.pending_len(), 0);
        assert!(!down.is_arrived());
    }

    #[test]
    fn it_refuses_to_advance_while_stationary() {
        let (queue, _events) = queue_at(1);
        assert_eq!(
            queue.advance_one_floor(2),
            Err(ElevatorError::InvalidTransition {
                elevator: "E1".to_string(),
                status: Status::Stationary
            })
        );
    }

    #[test]
    fn it_lets_riders_off_at_their_destination() {
        let (queue, events) = queue_at(1);
        let rider = hail(1, 3);
        queue.enqueue(rider.clone()).unwrap();
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingUp));
        assert_eq!(queue.advance_one_floor(2), Ok(Status::MovingUp));
        assert_eq!(queue.advance_one_floor(3), Ok(Status::Stationary));
        assert!(rider.is_arrived());
        assert_eq!(door_cycles_at(&events, 3), 1);
    }

    #[test]
    fn it_batches_same_floor_pickups_while_passing() {
        let (queue, events) = queue_at(1);
        queue.enqueue(hail(1, 9)).unwrap();
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingUp));
        let first = hail(5, 8);
        let second = hail(5, 7);
        queue.enqueue(first.clone()).unwrap();
        queue.enqueue(second.clone()).unwrap();
        for floor in 2..5 {
            assert_eq!(queue.advance_one_floor(floor), Ok(Status::MovingUp));
        }
        assert_eq!(queue.advance_one_floor(5), Ok(Status::MovingUp));
        assert_eq!(queue.in_flight_len(), 3);
        assert_eq!(queue.pending_len(), 0);
        assert_eq!(door_cycles_at(&events, 5), 1);
    }

    #[test]
    fn it_skips_down_hails_while_moving_up() {
        let (queue, _events) = queue_at(1);
        queue.enqueue(hail(1, 6)).unwrap();
        queue.dispatch_from_stationary().unwrap();
        queue.enqueue(hail(3, 2)).unwrap();
        queue.advance_one_floor(2).unwrap();
        assert_eq!(queue.advance_one_floor(3), Ok(Status::MovingUp));
        assert_eq!(queue.pending_len(), 1);
    }

    #[test]
    fn it_blocks_until_work_arrives() {
        let (queue, _events) = queue_at(1);
        let queue = Arc::new(queue);
        let waiter = {
            let queue = queue.clone();
            thread::spawn(move || queue.dispatch_from_stationary())
        };
        thread::sleep(Duration::from_millis(20));
        queue.enqueue(hail(4, 2)).unwrap();
        assert_eq!(waiter.join().unwrap(), Ok(Status::MovingUpBusy));
    }

    #[test]
    fn it_heads_down_for_a_down_hail_below() {
        let (queue, events) = queue_at(9);
        let first = hail(6, 2);
        let second = hail(6, 1);
        queue.enqueue(first.clone()).unwrap();
        queue.enqueue(second.clone()).unwrap();
        // Nobody on board yet, so the car settles after each floor and heads down again
        for floor in (7..9).rev() {
            assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingDown));
            assert_eq!(queue.advance_one_floor(floor), Ok(Status::Stationary));
        }
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingDown));
        assert_eq!(queue.advance_one_floor(6), Ok(Status::MovingDown));
        assert_eq!(queue.in_flight_len(), 2);
        assert_eq!(door_cycles_at(&events, 6), 1);
        for floor in (3..6).rev() {
            assert_eq!(queue.advance_one_floor(floor), Ok(Status::MovingDown));
        }
        assert_eq!(queue.advance_one_floor(2), Ok(Status::MovingDown));
        assert!(first.is_arrived() && !second.is_arrived());
        assert_eq!(queue.advance_one_floor(1), Ok(Status::Stationary));
        assert!(second.is_arrived());
    }

    #[test]
    fn it_batches_down_hails_and_drops_riders_off_on_the_way_down() {
        let (queue, events) = queue_at(9);
        let first = hail(6, 2);
        let second = hail(6, 1);
        queue.enqueue(first.clone()).unwrap();
        queue.enqueue(second.clone()).unwrap();
        queue.enqueue(hail(9, 1)).unwrap();
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingDown));
        assert_eq!(queue.in_flight_len(), 1);
        for floor in (7..9).rev() {
            assert_eq!(queue.advance_one_floor(floor), Ok(Status::MovingDown));
        }
        assert_eq!(queue.advance_one_floor(6), Ok(Status::MovingDown));
        assert_eq!(queue.in_flight_len(), 3);
        assert_eq!(queue.pending_len(), 0);
        for floor in (3..6).rev() {
            assert_eq!(queue.advance_one_floor(floor), Ok(Status::MovingDown));
        }
        assert_eq!(queue.advance_one_floor(2), Ok(Status::MovingDown));
        assert!(first.is_arrived());
        assert!(!second.is_arrived());
        assert_eq!(queue.advance_one_floor(1), Ok(Status::Stationary));
        assert!(second.is_arrived());
        let door_cycles: Vec<i32> = events
            .try_iter()
            .filter_map(|event| match event.kind {
                EventKind::DoorCycle { floor } => Some(floor),
                _ => None,
            })
            .collect();
        assert_eq!(door_cycles, vec![9, 6, 2, 1]);
    }

    #[test]
    fn it_skips_up_hails_while_moving_down() {
        let (queue, events) = queue_at(8);
        let rider = hail(8, 2);
        queue.enqueue(rider.clone()).unwrap();
        assert_eq!(queue.dispatch_from_stationary(), Ok(Status::MovingDown));
        let up = hail(5, 9);
        queue.enqueue(up.clone()).unwrap();
        for floor in (3..8).rev() {
            assert_eq!(queue.advance_one_floor(floor), Ok(Status::MovingDown));
        }
        assert_eq!(queue.pending_len(), 1);
        assert_eq!(door_cycles_at(&events, 5), 0);
        assert_eq!(queue.advance_one_floor(2), Ok(Status::Stationary));
        assert!(rider.is_arrived());
        assert!(!up.is_arrived());
    }
}
