//! Pure robot pose, manipulator layout and timed-boost transforms.

use std::collections::BTreeMap;

use gridwrap_core::{BoosterKind, Direction, Point};

/// A single robot: position, facing, manipulator arm offsets and the timed
/// boosts currently burning on it.
///
/// Every transform returns a new value; the world snapshot holding a robot is
/// never mutated in place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Robot {
    position: Point,
    facing: Direction,
    manipulators: Vec<Point>,
    active_boosts: BTreeMap<BoosterKind, u32>,
}

impl Robot {
    /// Creates a robot at the provided position with the default layout:
    /// facing right, three manipulator arms at (1,1), (1,0) and (1,-1).
    #[must_use]
    pub fn new(position: Point) -> Self {
        Self {
            position,
            facing: Direction::Right,
            manipulators: vec![Point::new(1, 1), Point::new(1, 0), Point::new(1, -1)],
            active_boosts: BTreeMap::new(),
        }
    }

    /// Cell the robot currently occupies.
    #[must_use]
    pub const fn position(&self) -> Point {
        self.position
    }

    /// Direction the robot is facing.
    #[must_use]
    pub const fn facing(&self) -> Direction {
        self.facing
    }

    /// Relative manipulator arm offsets, in attachment order.
    #[must_use]
    pub fn manipulators(&self) -> &[Point] {
        &self.manipulators
    }

    /// Returns the robot translated one step in the provided direction.
    #[must_use]
    pub fn moved(&self, direction: Direction) -> Self {
        self.moved_to(self.position.translated(direction.offset()))
    }

    /// Returns the robot relocated to the provided cell.
    #[must_use]
    pub fn moved_to(&self, position: Point) -> Self {
        let mut next = self.clone();
        next.position = position;
        next
    }

    /// Returns the robot rotated a quarter turn clockwise. Every manipulator
    /// offset undergoes `(dx, dy) -> (dy, -dx)`.
    #[must_use]
    pub fn rotated_cw(&self) -> Self {
        let mut next = self.clone();
        next.facing = self.facing.rotated_cw();
        next.manipulators = self
            .manipulators
            .iter()
            .map(|offset| Point::new(offset.y(), -offset.x()))
            .collect();
        next
    }

    /// Returns the robot rotated a quarter turn counter-clockwise. Every
    /// manipulator offset undergoes `(dx, dy) -> (-dy, dx)`.
    #[must_use]
    pub fn rotated_ccw(&self) -> Self {
        let mut next = self.clone();
        next.facing = self.facing.rotated_ccw();
        next.manipulators = self
            .manipulators
            .iter()
            .map(|offset| Point::new(-offset.y(), offset.x()))
            .collect();
        next
    }

    /// Returns the robot with an additional manipulator arm appended.
    ///
    /// Edge-connectivity of the new offset to the existing layout is the
    /// caller's obligation; this type records whatever it is handed.
    #[must_use]
    pub fn with_manipulator(&self, offset: Point) -> Self {
        let mut next = self.clone();
        next.manipulators.push(offset);
        next
    }

    /// Returns the robot with the provided boost set to the given number of
    /// remaining ticks, refreshing any previous counter for the same kind.
    #[must_use]
    pub fn with_boost(&self, kind: BoosterKind, remaining_ticks: u32) -> Self {
        let mut next = self.clone();
        let _ = next.active_boosts.insert(kind, remaining_ticks);
        next
    }

    /// Reports whether the provided boost is currently active.
    #[must_use]
    pub fn has_boost(&self, kind: BoosterKind) -> bool {
        self.active_boosts.contains_key(&kind)
    }

    /// Remaining ticks of the provided boost, zero when inactive.
    #[must_use]
    pub fn boost_remaining(&self, kind: BoosterKind) -> u32 {
        self.active_boosts.get(&kind).copied().unwrap_or(0)
    }

    /// Returns the robot with every active boost counter decremented by one
    /// tick, dropping counters that reach zero.
    #[must_use]
    pub fn ticked(&self) -> Self {
        let mut next = self.clone();
        next.active_boosts = self
            .active_boosts
            .iter()
            .filter_map(|(kind, remaining)| {
                let remaining = remaining.saturating_sub(1);
                (remaining > 0).then_some((*kind, remaining))
            })
            .collect();
        next
    }

    /// Absolute positions of every manipulator arm.
    pub fn manipulator_positions(&self) -> impl Iterator<Item = Point> + '_ {
        self.manipulators
            .iter()
            .map(move |offset| self.position.translated(*offset))
    }
}
