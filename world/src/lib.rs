#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the gridwrap solver.
//!
//! A [`World`] is an immutable snapshot of every robot, the cell grid, the
//! shared clock and the booster economy. The only way to advance it is
//! [`apply`], which validates one command for one robot and returns a brand
//! new snapshot; illegal commands produce a typed [`StepError`] and leave the
//! input untouched. Planners exploit this by holding many divergent futures
//! of a common ancestor during search.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use gridwrap_core::{BoosterKind, Cell, Command, Point, RobotId, Status};

mod grid;
mod robot;

pub use grid::{ClosestFrom, Grid};
pub use robot::Robot;

/// Immutable snapshot of the whole simulation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct World {
    robots: Vec<Robot>,
    grid: Grid,
    clock: u64,
    inventory: BTreeMap<BoosterKind, u32>,
    pending: BTreeMap<BoosterKind, u32>,
    anchors: BTreeSet<Point>,
}

impl World {
    /// Creates a world with a single default robot at the provided start
    /// cell. The spawn immediately wraps the cells the robot covers.
    #[must_use]
    pub fn new(grid: Grid, start: Point) -> Self {
        let mut world = Self {
            robots: vec![Robot::new(start)],
            grid,
            clock: 0,
            inventory: BTreeMap::new(),
            pending: BTreeMap::new(),
            anchors: BTreeSet::new(),
        };
        world.paint(RobotId::new(0));
        world
    }

    /// Returns the world with the provided booster count seeded directly
    /// into the inventory.
    #[must_use]
    pub fn with_inventory(mut self, kind: BoosterKind, count: u32) -> Self {
        if count > 0 {
            let _ = self.inventory.insert(kind, count);
        }
        self
    }

    /// Wraps the acting robot's cell and every empty manipulator cell it has
    /// line of sight to. Wrapping a drilled wall cell is what makes the
    /// carved tunnel traversable afterwards.
    fn paint(&mut self, robot: RobotId) {
        let Some(actor) = self.robots.get(robot.index()) else {
            return;
        };
        let position = actor.position();
        let reach: Vec<Point> = actor.manipulator_positions().collect();

        let own = self.grid.get(position);
        if !matches!(own.status(), Status::Wrapped | Status::OuterWall) {
            self.grid
                .set_in_place(position, own.with_status(Status::Wrapped));
        }

        for target in reach {
            let cell = self.grid.get(target);
            if cell.status() != Status::Empty {
                continue;
            }
            if !self.grid.is_visible(position, target) {
                continue;
            }
            self.grid
                .set_in_place(target, cell.with_status(Status::Wrapped));
        }
    }
}

/// Reason a command was rejected by [`apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StepFault {
    /// The move targeted a cell outside the arena. Fatal even under an
    /// active drill.
    #[error("cannot move into the outer wall at {target}")]
    MoveIntoOuterWall {
        /// Cell the move targeted.
        target: Point,
    },
    /// The move targeted an interior wall without an active drill boost.
    #[error("cannot move through the wall at {target} without an active drill")]
    MoveIntoWall {
        /// Cell the move targeted.
        target: Point,
    },
    /// A booster command found no matching charge in the inventory.
    #[error("no {kind:?} charge available in the inventory")]
    BoostUnavailable {
        /// Booster kind the command tried to spend.
        kind: BoosterKind,
    },
    /// A teleport anchor reset landed on a mystery cell or an existing
    /// anchor.
    #[error("cannot reset a teleport anchor at {position}")]
    InvalidAnchorReset {
        /// Cell the robot attempted to mark.
        position: Point,
    },
    /// A shift targeted a point that was never recorded as an anchor.
    #[error("no teleport anchor recorded at {anchor}")]
    UnknownAnchor {
        /// Point the shift targeted.
        anchor: Point,
    },
    /// A clone command was issued outside a mystery cell.
    #[error("cannot clone outside a mystery cell at {position}")]
    CloneWithoutMystery {
        /// Cell the robot occupied.
        position: Point,
    },
    /// The robot index does not name a robot in this world.
    #[error("no robot at index {index}")]
    UnknownRobot {
        /// Index the command addressed.
        index: usize,
    },
}

/// Typed failure raised by [`apply`], carrying the offending robot and grid
/// snapshots for diagnosis. The world passed to the failing `apply` is never
/// mutated.
#[derive(Clone, Debug, Error)]
#[error("{fault}")]
pub struct StepError {
    fault: StepFault,
    robot: Option<Robot>,
    grid: Grid,
}

impl StepError {
    fn new(fault: StepFault, robot: Option<Robot>, grid: Grid) -> Self {
        Self { fault, robot, grid }
    }

    /// Reason the command was rejected.
    #[must_use]
    pub const fn fault(&self) -> StepFault {
        self.fault
    }

    /// Snapshot of the acting robot, absent only for unknown robot indices.
    #[must_use]
    pub fn robot(&self) -> Option<&Robot> {
        self.robot.as_ref()
    }

    /// Snapshot of the grid at the time of the failure.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }
}

/// Applies one command for one robot, returning the successor world.
///
/// After a successful non-nested move, an active fast-wheels boost re-applies
/// the same move once as a second half-step; that nested half degrades
/// silently at walls instead of failing. Every non-nested application that is
/// not itself a [`Command::Tick`] ends by ticking the acting robot's boost
/// counters.
pub fn apply(world: &World, robot: RobotId, command: Command) -> Result<World, StepError> {
    apply_step(world, robot, command, false)
}

fn apply_step(
    world: &World,
    robot: RobotId,
    command: Command,
    nested: bool,
) -> Result<World, StepError> {
    let Some(actor) = world.robots.get(robot.index()).cloned() else {
        return Err(StepError::new(
            StepFault::UnknownRobot {
                index: robot.index(),
            },
            None,
            world.grid.clone(),
        ));
    };

    let fail = |fault: StepFault| {
        Err(StepError::new(
            fault,
            Some(actor.clone()),
            world.grid.clone(),
        ))
    };

    let mut grid = world.grid.clone();
    let mut next_actor = actor.clone();
    let mut inventory = world.inventory.clone();
    let mut pending = world.pending.clone();
    let mut anchors = world.anchors.clone();
    let mut clock = world.clock;
    let mut spawn_clone = false;

    match command {
        Command::Move { direction } => {
            let target = actor.position().translated(direction.offset());
            match grid.get(target).status() {
                Status::Empty | Status::Wrapped => {}
                Status::Wall => {
                    if !actor.has_boost(BoosterKind::Drill) {
                        if nested {
                            return Ok(world.clone());
                        }
                        return fail(StepFault::MoveIntoWall { target });
                    }
                }
                Status::OuterWall => {
                    if nested {
                        return Ok(world.clone());
                    }
                    return fail(StepFault::MoveIntoOuterWall { target });
                }
            }

            next_actor = next_actor.moved_to(target);

            let landed = grid.get(target);
            if let Some(kind) = landed.booster() {
                if kind != BoosterKind::Mystery {
                    *pending.entry(kind).or_insert(0) += 1;
                    grid.set_in_place(target, Cell::WRAPPED);
                }
            }
        }
        Command::TurnCw => next_actor = next_actor.rotated_cw(),
        Command::TurnCcw => next_actor = next_actor.rotated_ccw(),
        Command::Noop => {}
        Command::AttachManipulator { offset } => {
            if !take_charge(&mut inventory, BoosterKind::ManipulatorExtension) {
                return fail(StepFault::BoostUnavailable {
                    kind: BoosterKind::ManipulatorExtension,
                });
            }
            next_actor = next_actor.with_manipulator(offset);
        }
        Command::UseFastWheels => {
            if !take_charge(&mut inventory, BoosterKind::FastWheels) {
                return fail(StepFault::BoostUnavailable {
                    kind: BoosterKind::FastWheels,
                });
            }
            // will tick down immediately at the end of this application
            next_actor =
                next_actor.with_boost(BoosterKind::FastWheels, BoosterKind::FastWheels.duration() + 1);
        }
        Command::UseDrill => {
            if !take_charge(&mut inventory, BoosterKind::Drill) {
                return fail(StepFault::BoostUnavailable {
                    kind: BoosterKind::Drill,
                });
            }
            next_actor = next_actor.with_boost(BoosterKind::Drill, BoosterKind::Drill.duration() + 1);
        }
        Command::ResetTeleportAnchor => {
            let position = actor.position();
            if !take_charge(&mut inventory, BoosterKind::Teleport) {
                return fail(StepFault::BoostUnavailable {
                    kind: BoosterKind::Teleport,
                });
            }
            if grid.get(position).booster() == Some(BoosterKind::Mystery)
                || anchors.contains(&position)
            {
                return fail(StepFault::InvalidAnchorReset { position });
            }
            let _ = anchors.insert(position);
        }
        Command::ShiftToAnchor { anchor } => {
            if !anchors.contains(&anchor) {
                return fail(StepFault::UnknownAnchor { anchor });
            }
            next_actor = next_actor.moved_to(anchor);
        }
        Command::Clone => {
            let position = actor.position();
            if !take_charge(&mut inventory, BoosterKind::Cloning) {
                return fail(StepFault::BoostUnavailable {
                    kind: BoosterKind::Cloning,
                });
            }
            if grid.get(position).booster() != Some(BoosterKind::Mystery) {
                return fail(StepFault::CloneWithoutMystery { position });
            }
            spawn_clone = true;
        }
        Command::Tick => {
            clock += 1;
            for (kind, count) in &pending {
                *inventory.entry(*kind).or_insert(0) += count;
            }
            pending.clear();
        }
    }

    let mut robots = world.robots.clone();
    let spawn_position = next_actor.position();
    robots[robot.index()] = next_actor;
    if spawn_clone {
        robots.push(Robot::new(spawn_position));
    }

    let mut next = World {
        robots,
        grid,
        clock,
        inventory,
        pending,
        anchors,
    };
    next.paint(robot);

    if !nested && matches!(command, Command::Move { .. }) {
        let wheels_active = next
            .robots
            .get(robot.index())
            .is_some_and(|r| r.has_boost(BoosterKind::FastWheels));
        if wheels_active {
            next = apply_step(&next, robot, command, true)?;
        }
    }

    if !nested && !matches!(command, Command::Tick) {
        if let Some(actor) = next.robots.get_mut(robot.index()) {
            *actor = actor.ticked();
        }
    }

    Ok(next)
}

fn take_charge(inventory: &mut BTreeMap<BoosterKind, u32>, kind: BoosterKind) -> bool {
    match inventory.get_mut(&kind) {
        Some(count) if *count > 0 => {
            *count -= 1;
            if *count == 0 {
                let _ = inventory.remove(&kind);
            }
            true
        }
        _ => false,
    }
}

/// Query functions that provide read-only access to world snapshots.
pub mod query {
    use super::{Grid, Robot, World};
    use gridwrap_core::{BoosterKind, Point, RobotId};

    /// Reports whether every traversable cell has been wrapped.
    #[must_use]
    pub fn has_solved(world: &World) -> bool {
        !world.grid.any_empty()
    }

    /// Provides read-only access to the cell grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Retrieves a robot snapshot by identifier.
    #[must_use]
    pub fn robot(world: &World, id: RobotId) -> Option<&Robot> {
        world.robots.get(id.index())
    }

    /// All robots in spawn order.
    #[must_use]
    pub fn robots(world: &World) -> &[Robot] {
        &world.robots
    }

    /// Number of robots currently in the world.
    #[must_use]
    pub fn robot_count(world: &World) -> usize {
        world.robots.len()
    }

    /// Value of the shared clock, advanced only by tick commands.
    #[must_use]
    pub fn clock(world: &World) -> u64 {
        world.clock
    }

    /// Number of spendable charges of the provided booster kind.
    #[must_use]
    pub fn inventory(world: &World, kind: BoosterKind) -> u32 {
        world.inventory.get(&kind).copied().unwrap_or(0)
    }

    /// Number of collected charges still waiting for the next tick.
    #[must_use]
    pub fn pending(world: &World, kind: BoosterKind) -> u32 {
        world.pending.get(&kind).copied().unwrap_or(0)
    }

    /// Reports whether the provided point is a recorded teleport anchor.
    #[must_use]
    pub fn is_anchor(world: &World, point: Point) -> bool {
        world.anchors.contains(&point)
    }
}

#[cfg(test)]
mod tests {
    use super::{apply, query, Grid, StepFault, World};
    use gridwrap_core::{BoosterKind, Cell, Command, Direction, Point, RobotId, Status};

    fn square(edge: i32) -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(edge, 0),
            Point::new(edge, edge),
            Point::new(0, edge),
        ]
    }

    fn open_world(edge: i32) -> World {
        World::new(Grid::from_outline(&square(edge), &[], &[]), Point::new(0, 0))
    }

    fn move_cmd(direction: Direction) -> Command {
        Command::Move { direction }
    }

    #[test]
    fn spawn_paints_robot_and_visible_manipulator_cells() {
        let world = open_world(5);
        let grid = query::grid(&world);
        assert_eq!(grid.get(Point::new(0, 0)).status(), Status::Wrapped);
        assert_eq!(grid.get(Point::new(1, 0)).status(), Status::Wrapped);
        assert_eq!(grid.get(Point::new(1, 1)).status(), Status::Wrapped);
        assert_eq!(grid.get(Point::new(2, 0)).status(), Status::Empty);
    }

    #[test]
    fn move_advances_and_paints() {
        let world = open_world(5);
        let next = apply(&world, RobotId::new(0), move_cmd(Direction::Up)).expect("legal move");

        let robot = query::robot(&next, RobotId::new(0)).expect("robot");
        assert_eq!(robot.position(), Point::new(0, 1));
        let grid = query::grid(&next);
        assert_eq!(grid.get(Point::new(0, 1)).status(), Status::Wrapped);
        assert_eq!(grid.get(Point::new(1, 2)).status(), Status::Wrapped);
    }

    #[test]
    fn move_into_outer_wall_is_fatal() {
        let world = open_world(5);
        let error = apply(&world, RobotId::new(0), move_cmd(Direction::Left))
            .expect_err("outer wall must reject");
        assert_eq!(
            error.fault(),
            StepFault::MoveIntoOuterWall {
                target: Point::new(-1, 0)
            }
        );
        assert!(error.robot().is_some());
    }

    #[test]
    fn move_into_wall_without_drill_is_fatal() {
        let grid = Grid::from_outline(&square(5), &[], &[]).set(Point::new(1, 0), Cell::WALL);
        let world = World::new(grid, Point::new(0, 0));
        let error = apply(&world, RobotId::new(0), move_cmd(Direction::Right))
            .expect_err("wall must reject");
        assert_eq!(
            error.fault(),
            StepFault::MoveIntoWall {
                target: Point::new(1, 0)
            }
        );
    }

    #[test]
    fn booster_pickup_waits_for_tick() {
        let boosters = [(Point::new(0, 1), BoosterKind::FastWheels)];
        let grid = Grid::from_outline(&square(5), &[], &boosters);
        let world = World::new(grid, Point::new(0, 0));

        let collected =
            apply(&world, RobotId::new(0), move_cmd(Direction::Up)).expect("legal move");
        assert_eq!(query::pending(&collected, BoosterKind::FastWheels), 1);
        assert_eq!(query::inventory(&collected, BoosterKind::FastWheels), 0);
        assert_eq!(
            query::grid(&collected).get(Point::new(0, 1)),
            Cell::WRAPPED
        );

        let premature = apply(&collected, RobotId::new(0), Command::UseFastWheels)
            .expect_err("charge not yet promoted");
        assert_eq!(
            premature.fault(),
            StepFault::BoostUnavailable {
                kind: BoosterKind::FastWheels
            }
        );

        let ticked = apply(&collected, RobotId::new(0), Command::Tick).expect("tick");
        assert_eq!(query::inventory(&ticked, BoosterKind::FastWheels), 1);
        assert_eq!(query::pending(&ticked, BoosterKind::FastWheels), 0);
        assert_eq!(query::clock(&ticked), query::clock(&collected) + 1);

        let boosted = apply(&ticked, RobotId::new(0), Command::UseFastWheels).expect("spend");
        let robot = query::robot(&boosted, RobotId::new(0)).expect("robot");
        assert!(robot.has_boost(BoosterKind::FastWheels));
    }

    #[test]
    fn mystery_boosters_are_never_collected() {
        let boosters = [(Point::new(0, 1), BoosterKind::Mystery)];
        let grid = Grid::from_outline(&square(5), &[], &boosters);
        let world = World::new(grid, Point::new(0, 0));

        let stepped = apply(&world, RobotId::new(0), move_cmd(Direction::Up)).expect("move");
        assert_eq!(query::pending(&stepped, BoosterKind::Mystery), 0);
        assert_eq!(
            query::grid(&stepped).get(Point::new(0, 1)).booster(),
            Some(BoosterKind::Mystery)
        );
        assert_eq!(
            query::grid(&stepped).get(Point::new(0, 1)).status(),
            Status::Wrapped
        );
    }

    #[test]
    fn fast_wheels_double_a_move() {
        let world = open_world(6).with_inventory(BoosterKind::FastWheels, 1);
        let armed = apply(&world, RobotId::new(0), Command::UseFastWheels).expect("spend");
        let robot = query::robot(&armed, RobotId::new(0)).expect("robot");
        assert_eq!(
            robot.boost_remaining(BoosterKind::FastWheels),
            BoosterKind::FastWheels.duration()
        );

        let moved = apply(&armed, RobotId::new(0), move_cmd(Direction::Right)).expect("move");
        let robot = query::robot(&moved, RobotId::new(0)).expect("robot");
        assert_eq!(robot.position(), Point::new(2, 0));
        let grid = query::grid(&moved);
        assert_eq!(grid.get(Point::new(1, 0)).status(), Status::Wrapped);
        assert_eq!(grid.get(Point::new(2, 0)).status(), Status::Wrapped);
    }

    #[test]
    fn fast_wheels_degrade_at_walls() {
        let grid = Grid::from_outline(&square(6), &[], &[]).set(Point::new(2, 0), Cell::WALL);
        let world = World::new(grid, Point::new(0, 0)).with_inventory(BoosterKind::FastWheels, 1);

        let armed = apply(&world, RobotId::new(0), Command::UseFastWheels).expect("spend");
        let moved = apply(&armed, RobotId::new(0), move_cmd(Direction::Right)).expect("move");
        let robot = query::robot(&moved, RobotId::new(0)).expect("robot");
        assert_eq!(robot.position(), Point::new(1, 0));
    }

    #[test]
    fn drill_carves_walls_into_wrapped_cells() {
        let grid = Grid::from_outline(&square(6), &[], &[]).set(Point::new(1, 0), Cell::WALL);
        let world = World::new(grid, Point::new(0, 0)).with_inventory(BoosterKind::Drill, 1);

        let armed = apply(&world, RobotId::new(0), Command::UseDrill).expect("spend");
        let moved = apply(&armed, RobotId::new(0), move_cmd(Direction::Right)).expect("drill move");
        let robot = query::robot(&moved, RobotId::new(0)).expect("robot");
        assert_eq!(robot.position(), Point::new(1, 0));
        assert_eq!(
            query::grid(&moved).get(Point::new(1, 0)).status(),
            Status::Wrapped
        );
    }

    #[test]
    fn clone_spawns_a_default_robot_on_mystery() {
        let boosters = [(Point::new(0, 0), BoosterKind::Mystery)];
        let grid = Grid::from_outline(&square(5), &[], &boosters);
        let world = World::new(grid, Point::new(0, 0)).with_inventory(BoosterKind::Cloning, 1);

        let cloned = apply(&world, RobotId::new(0), Command::Clone).expect("clone");
        assert_eq!(query::robot_count(&cloned), 2);
        let spawned = query::robot(&cloned, RobotId::new(1)).expect("clone robot");
        assert_eq!(spawned.position(), Point::new(0, 0));
        assert_eq!(spawned.facing(), Direction::Right);
        assert_eq!(query::inventory(&cloned, BoosterKind::Cloning), 0);
    }

    #[test]
    fn clone_outside_mystery_is_fatal() {
        let world = open_world(5).with_inventory(BoosterKind::Cloning, 1);
        let error =
            apply(&world, RobotId::new(0), Command::Clone).expect_err("no mystery underfoot");
        assert_eq!(
            error.fault(),
            StepFault::CloneWithoutMystery {
                position: Point::new(0, 0)
            }
        );
    }

    #[test]
    fn teleport_anchor_round_trip() {
        let world = open_world(6).with_inventory(BoosterKind::Teleport, 1);
        let anchored =
            apply(&world, RobotId::new(0), Command::ResetTeleportAnchor).expect("anchor");
        assert!(query::is_anchor(&anchored, Point::new(0, 0)));

        let away = apply(&anchored, RobotId::new(0), move_cmd(Direction::Up)).expect("move");
        let back = apply(
            &away,
            RobotId::new(0),
            Command::ShiftToAnchor {
                anchor: Point::new(0, 0),
            },
        )
        .expect("shift");
        let robot = query::robot(&back, RobotId::new(0)).expect("robot");
        assert_eq!(robot.position(), Point::new(0, 0));

        let bogus = apply(
            &back,
            RobotId::new(0),
            Command::ShiftToAnchor {
                anchor: Point::new(3, 3),
            },
        )
        .expect_err("unknown anchor");
        assert_eq!(
            bogus.fault(),
            StepFault::UnknownAnchor {
                anchor: Point::new(3, 3)
            }
        );
    }

    #[test]
    fn attach_manipulator_spends_inventory() {
        let world = open_world(5).with_inventory(BoosterKind::ManipulatorExtension, 1);
        let extended = apply(
            &world,
            RobotId::new(0),
            Command::AttachManipulator {
                offset: Point::new(2, 0),
            },
        )
        .expect("attach");
        let robot = query::robot(&extended, RobotId::new(0)).expect("robot");
        assert_eq!(robot.manipulators().len(), 4);

        let exhausted = apply(
            &extended,
            RobotId::new(0),
            Command::AttachManipulator {
                offset: Point::new(3, 0),
            },
        )
        .expect_err("inventory empty");
        assert_eq!(
            exhausted.fault(),
            StepFault::BoostUnavailable {
                kind: BoosterKind::ManipulatorExtension
            }
        );
    }

    #[test]
    fn wrapping_is_monotonic_across_a_command_script() {
        let mut world = open_world(5);
        let script = [
            move_cmd(Direction::Right),
            Command::TurnCw,
            move_cmd(Direction::Up),
            Command::TurnCcw,
            move_cmd(Direction::Right),
            Command::Noop,
            Command::Tick,
            move_cmd(Direction::Up),
        ];

        let mut wrapped = wrapped_cells(&world);
        for command in script {
            world = apply(&world, RobotId::new(0), command).expect("scripted command");
            let now = wrapped_cells(&world);
            assert!(wrapped.iter().all(|point| now.contains(point)));
            wrapped = now;
        }
    }

    fn wrapped_cells(world: &World) -> Vec<Point> {
        query::grid(world)
            .cells()
            .filter(|(_, cell)| cell.status() == Status::Wrapped)
            .map(|(point, _)| point)
            .collect()
    }

    #[test]
    fn nested_half_step_degrades_at_the_outer_wall() {
        let world = open_world(2).with_inventory(BoosterKind::FastWheels, 1);
        let armed = apply(&world, RobotId::new(0), Command::UseFastWheels).expect("spend");

        // The arena is two cells wide: the second half-step would leave it.
        let moved = apply(&armed, RobotId::new(0), move_cmd(Direction::Right)).expect("move");
        let robot = query::robot(&moved, RobotId::new(0)).expect("robot");
        assert_eq!(robot.position(), Point::new(1, 0));
    }

    #[test]
    fn boosters_are_collected_on_the_second_half_step() {
        let boosters = [(Point::new(2, 0), BoosterKind::Drill)];
        let grid = Grid::from_outline(&square(6), &[], &boosters);
        let world = World::new(grid, Point::new(0, 0)).with_inventory(BoosterKind::FastWheels, 1);

        let armed = apply(&world, RobotId::new(0), Command::UseFastWheels).expect("spend");
        let moved = apply(&armed, RobotId::new(0), move_cmd(Direction::Right)).expect("move");
        let robot = query::robot(&moved, RobotId::new(0)).expect("robot");
        assert_eq!(robot.position(), Point::new(2, 0));
        assert_eq!(query::pending(&moved, BoosterKind::Drill), 1);
        assert_eq!(query::grid(&moved).get(Point::new(2, 0)), Cell::WRAPPED);
    }

    #[test]
    fn anchor_reset_on_a_mystery_cell_is_fatal() {
        let boosters = [(Point::new(0, 0), BoosterKind::Mystery)];
        let grid = Grid::from_outline(&square(5), &[], &boosters);
        let world = World::new(grid, Point::new(0, 0)).with_inventory(BoosterKind::Teleport, 1);

        let error = apply(&world, RobotId::new(0), Command::ResetTeleportAnchor)
            .expect_err("mystery cells refuse anchors");
        assert_eq!(
            error.fault(),
            StepFault::InvalidAnchorReset {
                position: Point::new(0, 0)
            }
        );
    }

    #[test]
    fn anchor_reset_twice_on_the_same_cell_is_fatal() {
        let world = open_world(5).with_inventory(BoosterKind::Teleport, 2);
        let anchored =
            apply(&world, RobotId::new(0), Command::ResetTeleportAnchor).expect("first anchor");
        let error = apply(&anchored, RobotId::new(0), Command::ResetTeleportAnchor)
            .expect_err("existing anchors refuse resets");
        assert_eq!(
            error.fault(),
            StepFault::InvalidAnchorReset {
                position: Point::new(0, 0)
            }
        );
    }

    #[test]
    fn drill_expires_back_into_impassable_walls() {
        let grid = Grid::from_outline(&square(6), &[], &[]).set(Point::new(0, 2), Cell::WALL);
        let mut world = World::new(grid, Point::new(0, 0)).with_inventory(BoosterKind::Drill, 1);

        world = apply(&world, RobotId::new(0), Command::UseDrill).expect("spend");
        for _ in 0..BoosterKind::Drill.duration() {
            world = apply(&world, RobotId::new(0), Command::Noop).expect("idle");
        }
        let robot = query::robot(&world, RobotId::new(0)).expect("robot");
        assert!(!robot.has_boost(BoosterKind::Drill));

        world = apply(&world, RobotId::new(0), move_cmd(Direction::Up)).expect("open cell");
        let error = apply(&world, RobotId::new(0), move_cmd(Direction::Up))
            .expect_err("drill expired");
        assert_eq!(
            error.fault(),
            StepFault::MoveIntoWall {
                target: Point::new(0, 2)
            }
        );
    }

    #[test]
    fn unknown_robot_is_a_typed_error() {
        let world = open_world(5);
        let error =
            apply(&world, RobotId::new(7), Command::Noop).expect_err("index out of range");
        assert_eq!(error.fault(), StepFault::UnknownRobot { index: 7 });
        assert!(error.robot().is_none());
    }
}
