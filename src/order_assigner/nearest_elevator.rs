//! Picks the elevator that should take a new hail.
//!
//! Elevators are kept in ordered `(floor, id)` sets, one per heading, so every
//! lookup is a range query around the hail's origin.
use std::collections::BTreeSet;

use crate::local_elevator::status::Heading;
use crate::request::request::Direction;

pub type Slot = (i32, String);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatusBuckets {
    up: BTreeSet<Slot>,
    down: BTreeSet<Slot>,
    stationary: BTreeSet<Slot>,
}

impl StatusBuckets {
    pub fn new() -> StatusBuckets {
        StatusBuckets::default()
    }

    pub fn bucket(&self, heading: Heading) -> &BTreeSet<Slot> {
        match heading {
            Heading::Up => &self.up,
            Heading::Down => &self.down,
            Heading::Stationary => &self.stationary,
        }
    }

    fn bucket_mut(&mut self, heading: Heading) -> &mut BTreeSet<Slot> {
        match heading {
            Heading::Up => &mut self.up,
            Heading::Down => &mut self.down,
            Heading::Stationary => &mut self.stationary,
        }
    }

    /// Returns false when the elevator already sat in that bucket.
    pub fn insert(&mut self, heading: Heading, floor: i32, id: &str) -> bool {
        self.bucket_mut(heading).insert((floor, id.to_string()))
    }

    pub fn remove_everywhere(&mut self, floor: i32, id: &str) {
        let slot = (floor, id.to_string());
        for heading in Heading::ALL.iter() {
            self.bucket_mut(*heading).remove(&slot);
        }
    }

    /// Number of buckets listing the elevator. Outside a floor change this is always 1.
    pub fn memberships(&self, id: &str) -> usize {
        Heading::ALL
            .iter()
            .map(|heading| self.bucket(*heading).iter().filter(|(_, slot_id)| slot_id == id).count())
            .sum()
    }
}

fn floor_start(floor: i32) -> Slot {
    (floor, String::new())
}

fn distance(slot: &Slot, origin: i32) -> i64 {
    (i64::from(slot.0) - i64::from(origin)).abs()
}

/// Lowest id among the elevators sharing `floor`.
fn lowest_id_at(bucket: &BTreeSet<Slot>, floor: i32) -> Option<&Slot> {
    bucket.range(floor_start(floor)..).next().filter(|slot| slot.0 == floor)
}

/// Closer one wins, equal distance goes to the lower id.
fn closer<'a>(a: Option<&'a Slot>, b: Option<&'a Slot>, origin: i32) -> Option<&'a Slot> {
    match (a, b) {
        (Some(a), Some(b)) => {
            if (distance(b, origin), &b.1) < (distance(a, origin), &a.1) {
                Some(b)
            } else {
                Some(a)
            }
        }
        (a, None) => a,
        (None, b) => b,
    }
}

pub fn nearest_stationary(buckets: &StatusBuckets, origin: i32) -> Option<&Slot> {
    let stationary = buckets.bucket(Heading::Stationary);
    let at_or_above = stationary.range(floor_start(origin)..).next();
    let below = stationary
        .range(..floor_start(origin))
        .next_back()
        .and_then(|slot| lowest_id_at(stationary, slot.0));
    closer(at_or_above, below, origin)
}

/// Nearest elevator already travelling in `direction` that has not yet passed `origin`.
pub fn nearest_approaching(buckets: &StatusBuckets, origin: i32, direction: Direction) -> Option<&Slot> {
    let moving = buckets.bucket(Heading::from(direction));
    let nearest = match direction {
        Direction::Up => moving.range(..floor_start(origin)).next_back(),
        Direction::Down => origin
            .checked_add(1)
            .and_then(|above| moving.range(floor_start(above)..).next()),
    };
    nearest.and_then(|slot| lowest_id_at(moving, slot.0))
}

/// A moving candidate only wins when strictly closer than the stationary one.
pub fn best_elevator(buckets: &StatusBuckets, origin: i32, direction: Direction) -> Option<String> {
    let stationary = nearest_stationary(buckets, origin);
    let moving = nearest_approaching(buckets, origin, direction);
    let best = match (stationary, moving) {
        (Some(s), Some(m)) => {
            if distance(m, origin) < distance(s, origin) {
                m
            } else {
                s
            }
        }
        (Some(s), None) => s,
        (None, Some(m)) => m,
        (None, None) => return None,
    };
    Some(best.1.clone())
}

#[cfg(test)]
mod test {
    use super::*;

    fn buckets(entries: &[(Heading, i32, &str)]) -> StatusBuckets {
        let mut buckets = StatusBuckets::new();
        for (heading, floor, id) in entries.iter() {
            buckets.insert(*heading, *floor, id);
        }
        buckets
    }

    #[test]
    fn it_breaks_equal_distance_ties_by_id() {
        let b = buckets(&[(Heading::Stationary, 8, "E1"), (Heading::Stationary, 2, "E2")]);
        assert_eq!(best_elevator(&b, 5, Direction::Up), Some("E1".to_string()));

        let b = buckets(&[(Heading::Stationary, 2, "E1"), (Heading::Stationary, 8, "E2")]);
        assert_eq!(best_elevator(&b, 5, Direction::Down), Some("E1".to_string()));
    }

    #[test]
    fn it_prefers_the_lowest_id_on_a_shared_floor() {
        let b = buckets(&[
            (Heading::Stationary, 1, "E3"),
            (Heading::Stationary, 1, "E1"),
            (Heading::Stationary, 1, "E2"),
        ]);
        assert_eq!(best_elevator(&b, 3, Direction::Up), Some("E1".to_string()));
        assert_eq!(best_elevator(&b, 1, Direction::Up), Some("E1".to_string()));
    }

    #[test]
    fn it_picks_the_nearest_stationary_elevator() {
        let b = buckets(&[(Heading::Stationary, 1, "E1"), (Heading::Stationary, 6, "E2")]);
        assert_eq!(best_elevator(&b, 4, Direction::Up), Some("E2".to_string()));
    }

    #[test]
    fn it_lets_a_strictly_closer_moving_elevator_win() {
        let b = buckets(&[(Heading::Stationary, 1, "E1"), (Heading::Up, 4, "E2")]);
        assert_eq!(best_elevator(&b, 5, Direction::Up), Some("E2".to_string()));
    }

    #[test]
    fn it_keeps_the_stationary_elevator_on_a_tie() {
        let b = buckets(&[(Heading::Stationary, 7, "E2"), (Heading::Up, 3, "E1")]);
        assert_eq!(best_elevator(&b, 5, Direction::Up), Some("E2".to_string()));
    }

    #[test]
    fn it_ignores_elevators_that_passed_the_origin() {
        let b = buckets(&[(Heading::Up, 5, "E1"), (Heading::Up, 7, "E2")]);
        assert_eq!(best_elevator(&b, 5, Direction::Up), None);
    }

    #[test]
    fn it_ignores_elevators_moving_the_other_way() {
        let b = buckets(&[(Heading::Down, 8, "E1")]);
        assert_eq!(best_elevator(&b, 5, Direction::Up), None);
        assert_eq!(best_elevator(&b, 5, Direction::Down), Some("E1".to_string()));
    }

    #[test]
    fn it_picks_the_nearest_descending_elevator_above() {
        let b = buckets(&[(Heading::Down, 9, "E1"), (Heading::Down, 6, "E2"), (Heading::Down, 3, "E3")]);
        assert_eq!(
            nearest_approaching(&b, 5, Direction::Down),
            Some(&(6, "E2".to_string()))
        );
    }

    #[test]
    fn it_counts_bucket_memberships() {
        let mut b = buckets(&[(Heading::Up, 3, "E1")]);
        assert_eq!(b.memberships("E1"), 1);
        b.remove_everywhere(3, "E1");
        assert_eq!(b.memberships("E1"), 0);
        assert!(b.insert(Heading::Down, 3, "E1"));
        assert!(!b.insert(Heading::Down, 3, "E1"));
    }

    #[test]
    fn it_handles_hails_at_the_largest_floor() {
        let b = buckets(&[(Heading::Down, i32::MAX, "E1"), (Heading::Stationary, i32::MAX - 2, "E2")]);
        assert_eq!(nearest_approaching(&b, i32::MAX, Direction::Down), None);
        assert_eq!(best_elevator(&b, i32::MAX, Direction::Down), Some("E2".to_string()));

        let b = buckets(&[(Heading::Stationary, i32::MIN, "E1"), (Heading::Stationary, i32::MAX, "E2")]);
        assert_eq!(best_elevator(&b, i32::MAX - 1, Direction::Down), Some("E2".to_string()));
    }
}
