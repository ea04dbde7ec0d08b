#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-robot planning primitives.
//!
//! A robot works by draining an [`Assignment`] — a set of cells it owns — one
//! command burst at a time: spend a booster if one is worth spending, then
//! route through the simulation-aware search to wrap the nearest empty cell
//! of the assignment. Targets the search cannot reach are memoized and
//! skipped, so exhaustion surfaces as an empty burst instead of a busy loop.

use std::collections::BTreeSet;

use gridwrap_core::{BoosterKind, Command, Point, RobotId, Status};
use gridwrap_system_search::{grid_walk, sim_walk};
use gridwrap_world::{query, Robot, World};

/// Euclidean cutoff for opportunistic booster detours, in cells.
pub const BOOSTER_DETOUR_RANGE: f64 = 5.0;

/// Picks the booster command worth issuing right now, if any: clone while
/// standing on a mystery cell, otherwise grow the manipulator arm, otherwise
/// burn fast wheels, otherwise burn a drill.
#[must_use]
pub fn boost_policy(world: &World, robot: RobotId) -> Option<Command> {
    let actor = query::robot(world, robot)?;

    if query::inventory(world, BoosterKind::Cloning) > 0
        && query::grid(world).get(actor.position()).booster() == Some(BoosterKind::Mystery)
    {
        return Some(Command::Clone);
    }
    if query::inventory(world, BoosterKind::ManipulatorExtension) > 0 {
        return Some(Command::AttachManipulator {
            offset: extension_offset(actor),
        });
    }
    if query::inventory(world, BoosterKind::FastWheels) > 0
        && !actor.has_boost(BoosterKind::FastWheels)
    {
        return Some(Command::UseFastWheels);
    }
    if query::inventory(world, BoosterKind::Drill) > 0 && !actor.has_boost(BoosterKind::Drill) {
        return Some(Command::UseDrill);
    }
    None
}

/// Computes where to attach the next manipulator arm: extend the straight
/// arm column (or row) one cell past whichever end currently sticks out
/// less.
#[must_use]
pub fn extension_offset(robot: &Robot) -> Point {
    let mut xs: Vec<i32> = robot.manipulators().iter().map(Point::x).collect();
    let mut ys: Vec<i32> = robot.manipulators().iter().map(Point::y).collect();
    xs.sort_unstable();
    ys.sort_unstable();

    let x_low = xs.first().copied().unwrap_or(0);
    let x_high = xs.last().copied().unwrap_or(0);
    let y_low = ys.first().copied().unwrap_or(0);
    let y_high = ys.last().copied().unwrap_or(0);

    if x_low == x_high {
        // vertical arm column
        let y = if y_low.abs() < y_high.abs() {
            y_low - 1
        } else {
            y_high + 1
        };
        Point::new(x_low, y)
    } else {
        let x = if x_low.abs() < x_high.abs() {
            x_low - 1
        } else {
            x_high + 1
        };
        Point::new(x, y_low)
    }
}

/// Finds the nearest booster cell (by Euclidean distance from the robot)
/// accepted by the filter and closer than `range`.
#[must_use]
pub fn nearest_booster<F>(world: &World, robot: RobotId, range: f64, mut accept: F) -> Option<Point>
where
    F: FnMut(BoosterKind) -> bool,
{
    let actor = query::robot(world, robot)?;
    let position = actor.position();

    query::grid(world)
        .booster_cells()
        .filter(|(_, kind)| accept(*kind))
        .map(|(point, _)| point)
        .min_by(|a, b| {
            position
                .euclid_distance(*a)
                .total_cmp(&position.euclid_distance(*b))
        })
        .filter(|point| position.euclid_distance(*point) < range)
}

/// A robot's current work: the cells it owns plus the targets the search has
/// reported unreachable for this assignment.
#[derive(Clone, Debug, Default)]
pub struct Assignment {
    points: BTreeSet<Point>,
    unreachable: BTreeSet<Point>,
}

impl Assignment {
    /// Creates an assignment over the provided cells.
    #[must_use]
    pub fn new(points: impl IntoIterator<Item = Point>) -> Self {
        Self {
            points: points.into_iter().collect(),
            unreachable: BTreeSet::new(),
        }
    }

    /// Reports whether no workable empty cell remains: everything is either
    /// wrapped or memoized as unreachable.
    #[must_use]
    pub fn is_drained(&self, world: &World) -> bool {
        let grid = query::grid(world);
        self.points.iter().all(|point| {
            grid.get(*point).status() != Status::Empty || self.unreachable.contains(point)
        })
    }

    /// Nearest workable empty cell of the assignment, in breadth-first
    /// distance order from the robot.
    #[must_use]
    pub fn next_target(&self, world: &World, robot: RobotId) -> Option<Point> {
        let actor = query::robot(world, robot)?;
        query::grid(world)
            .closest_from(actor.position(), |point, cell| {
                cell.status() == Status::Empty
                    && self.points.contains(&point)
                    && !self.unreachable.contains(&point)
            })
            .next()
            .map(|(point, _)| point)
    }
}

/// Plans the next command burst for the robot: a booster spend when the
/// policy wants one, a short detour when an arm or wheels booster sits
/// nearby, otherwise a simulation-aware route wrapping the nearest empty
/// cell of the assignment. An empty burst means the assignment is drained.
#[must_use]
pub fn plan_burst(world: &World, robot: RobotId, assignment: &mut Assignment) -> Vec<Command> {
    if let Some(command) = boost_policy(world, robot) {
        // Bursts stop at the spend so the follow-up route is planned against
        // the post-spend world.
        return vec![command];
    }

    if let Some(route) = booster_detour(world, robot) {
        return route;
    }

    while let Some(target) = assignment.next_target(world, robot) {
        match sim_walk::wrap(world, robot, target) {
            Some(route) if !route.is_empty() => return route,
            Some(_) => {
                // Already wrapped between selection and planning; pick again.
                continue;
            }
            None => {
                let _ = assignment.unreachable.insert(target);
            }
        }
    }
    Vec::new()
}

/// Boost-free route to a nearby manipulator-extension or fast-wheels
/// booster. The walk stays on the pose grid: collecting a booster needs no
/// boost of its own, and the cheap search keeps the detour cheap too.
fn booster_detour(world: &World, robot: RobotId) -> Option<Vec<Command>> {
    let target = nearest_booster(world, robot, BOOSTER_DETOUR_RANGE, |kind| {
        matches!(
            kind,
            BoosterKind::ManipulatorExtension | BoosterKind::FastWheels
        )
    })?;
    let actor = query::robot(world, robot)?;
    let route = grid_walk::travel(query::grid(world), actor, target)?;
    (!route.is_empty()).then_some(route)
}
