use serde;

use crate::request::request::Direction;

/// Motion state of a single elevator.
///
/// The `Busy` variants mean the car is travelling past its natural turnaround
/// to reach the furthest hail waiting in the opposite direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Status {
    Stationary,
    MovingUp,
    MovingUpBusy,
    MovingDown,
    MovingDownBusy,
}

/// Bucket key used by the building registry. Busy states fold into their base direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Heading {
    Up,
    Down,
    Stationary,
}

impl Status {
    pub fn moving(direction: Direction) -> Status {
        match direction {
            Direction::Up => Status::MovingUp,
            Direction::Down => Status::MovingDown,
        }
    }

    pub fn heading(self) -> Heading {
        match self {
            Status::Stationary => Heading::Stationary,
            Status::MovingUp | Status::MovingUpBusy => Heading::Up,
            Status::MovingDown | Status::MovingDownBusy => Heading::Down,
        }
    }

    /// Floor delta applied by one move, `None` while stationary.
    pub fn floor_step(self) -> Option<i32> {
        match self.heading() {
            Heading::Up => Some(1),
            Heading::Down => Some(-1),
            Heading::Stationary => None,
        }
    }
}

impl Heading {
    pub const ALL: [Heading; 3] = [Heading::Up, Heading::Down, Heading::Stationary];
}

impl From<Direction> for Heading {
    fn from(direction: Direction) -> Heading {
        match direction {
            Direction::Up => Heading::Up,
            Direction::Down => Heading::Down,
        }
    }
}
