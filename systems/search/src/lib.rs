#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Best-first search over abstract nodes, with a grid-only specialization for
//! boost-free travel and a simulation-aware specialization that explores the
//! exact consequences of commands through the real world `apply`.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::hash::{Hash, Hasher};

use gridwrap_core::{Command, Direction, Point, RobotId};
use gridwrap_world::{apply, query, Grid, Robot, World};

/// Runs best-first search from `start`, expanding `neighbours` in order of
/// `path length + heuristic` until `is_goal` accepts a popped node.
///
/// Returns the node path from `start` to the accepted goal inclusive, or
/// `None` once the open set empties — the normal "no more reachable work"
/// outcome, not an error. Nodes enter the closed set when first generated;
/// equal priorities break by insertion order, which is acceptable for a
/// heuristic best-effort search.
pub fn best_first<T, H, G, N, I>(
    start: T,
    mut heuristic: H,
    mut is_goal: G,
    mut neighbours: N,
) -> Option<Vec<T>>
where
    T: Clone + Eq + Hash,
    H: FnMut(&T) -> f64,
    G: FnMut(&T) -> bool,
    N: FnMut(&T) -> I,
    I: IntoIterator<Item = T>,
{
    let mut open = BinaryHeap::new();
    let mut closed = HashSet::new();
    let mut parents: HashMap<T, T> = HashMap::new();
    let mut sequence = 0u64;

    open.push(OpenEntry {
        priority: heuristic(&start),
        sequence,
        length: 0,
        node: start.clone(),
    });
    let _ = closed.insert(start);

    while let Some(entry) = open.pop() {
        if is_goal(&entry.node) {
            return Some(reconstruct(entry.node, &parents));
        }

        for neighbour in neighbours(&entry.node) {
            if closed.contains(&neighbour) {
                continue;
            }
            let _ = closed.insert(neighbour.clone());
            let _ = parents.insert(neighbour.clone(), entry.node.clone());
            sequence += 1;
            let length = entry.length + 1;
            open.push(OpenEntry {
                priority: heuristic(&neighbour) + f64::from(length),
                sequence,
                length,
                node: neighbour,
            });
        }
    }

    None
}

fn reconstruct<T>(goal: T, parents: &HashMap<T, T>) -> Vec<T>
where
    T: Clone + Eq + Hash,
{
    let mut path = Vec::new();
    let mut current = goal;
    loop {
        match parents.get(&current) {
            Some(previous) => {
                let previous = previous.clone();
                path.push(current);
                current = previous;
            }
            None => {
                path.push(current);
                break;
            }
        }
    }
    path.reverse();
    path
}

struct OpenEntry<T> {
    priority: f64,
    sequence: u64,
    length: u32,
    node: T,
}

impl<T> PartialEq for OpenEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.priority.total_cmp(&other.priority) == Ordering::Equal
            && self.sequence == other.sequence
    }
}

impl<T> Eq for OpenEntry<T> {}

impl<T> PartialOrd for OpenEntry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for OpenEntry<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap: invert so the cheapest entry pops first,
        // earlier insertions winning ties.
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Minimum Manhattan distance from the robot cell or any manipulator cell to
/// the target, with a small bonus when the target is already visible.
fn pose_heuristic(grid: &Grid, robot: &Robot, target: Point) -> f64 {
    let mut best = f64::from(robot.position().manhattan_distance(target));
    for arm in robot.manipulator_positions() {
        best = best.min(f64::from(arm.manhattan_distance(target)));
    }
    if grid.is_visible(robot.position(), target) {
        best -= 0.1;
    }
    best
}

const TURNS: [Command; 2] = [Command::TurnCw, Command::TurnCcw];

/// Boost-free point-to-point search over robot poses only.
///
/// Nodes are (pose, producing command); neighbour generation applies the six
/// atomic actions as pure robot transforms, filtering moves whose destination
/// cell is a wall. No boosts are consumed and no wrap painting is modelled.
pub mod grid_walk {
    use super::{
        best_first, pose_heuristic, Command, Direction, Grid, Hash, Hasher, Point, Robot, TURNS,
    };

    /// Node of the grid-only walk: a robot pose plus the command that
    /// produced it. Identity covers position and facing only.
    #[derive(Clone, Debug)]
    pub struct PoseStep {
        robot: Robot,
        command: Command,
    }

    impl PoseStep {
        fn start(robot: Robot) -> Self {
            Self {
                robot,
                command: Command::Noop,
            }
        }

        /// Command that produced this pose.
        #[must_use]
        pub const fn command(&self) -> Command {
            self.command
        }

        /// Robot pose reached by this step.
        #[must_use]
        pub const fn robot(&self) -> &Robot {
            &self.robot
        }
    }

    impl PartialEq for PoseStep {
        fn eq(&self, other: &Self) -> bool {
            self.robot.position() == other.robot.position()
                && self.robot.facing() == other.robot.facing()
        }
    }

    impl Eq for PoseStep {}

    impl Hash for PoseStep {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.robot.position().hash(state);
            self.robot.facing().hash(state);
        }
    }

    fn neighbours(grid: &Grid, step: &PoseStep) -> Vec<PoseStep> {
        let mut result = Vec::with_capacity(6);
        for command in TURNS {
            let robot = match command {
                Command::TurnCw => step.robot.rotated_cw(),
                _ => step.robot.rotated_ccw(),
            };
            result.push(PoseStep { robot, command });
        }
        for direction in Direction::ALL {
            let moved = step.robot.moved(direction);
            if grid.get(moved.position()).status().is_wall() {
                continue;
            }
            result.push(PoseStep {
                robot: moved,
                command: Command::Move { direction },
            });
        }
        result
    }

    fn commands_of(path: Vec<PoseStep>) -> Vec<Command> {
        path.into_iter().skip(1).map(|step| step.command).collect()
    }

    /// Plans a route ending with the robot standing on `target`. Returns
    /// `None` when the target is a wall or unreachable.
    #[must_use]
    pub fn travel(grid: &Grid, robot: &Robot, target: Point) -> Option<Vec<Command>> {
        if grid.get(target).status().is_wall() {
            return None;
        }
        best_first(
            PoseStep::start(robot.clone()),
            |step| pose_heuristic(grid, &step.robot, target),
            |step| step.robot.position() == target,
            |step| neighbours(grid, step),
        )
        .map(commands_of)
    }

    /// Plans a route ending once `target` is the robot cell or a manipulator
    /// cell with line of sight from the robot.
    #[must_use]
    pub fn reach(grid: &Grid, robot: &Robot, target: Point) -> Option<Vec<Command>> {
        if grid.get(target).status().is_wall() {
            return None;
        }
        best_first(
            PoseStep::start(robot.clone()),
            |step| pose_heuristic(grid, &step.robot, target),
            |step| {
                step.robot.position() == target
                    || step
                        .robot
                        .manipulator_positions()
                        .any(|arm| arm == target)
                        && grid.is_visible(step.robot.position(), target)
            },
            |step| neighbours(grid, step),
        )
        .map(commands_of)
    }
}

/// Simulation-aware search whose nodes wrap entire world snapshots.
///
/// Neighbours run each atomic action through the real `apply`, discarding
/// legality failures, so the search sees boosts, drills and wrap painting
/// exactly as the simulator will replay them. Node identity is position,
/// facing and robot index only; active boost timers are deliberately
/// excluded for tractability even though two pruned states may differ in
/// remaining ticks.
pub mod sim_walk {
    use super::{
        apply, best_first, pose_heuristic, query, Command, Direction, Hash, Hasher, Point,
        RobotId, World, TURNS,
    };
    use gridwrap_core::Status;

    /// Node of the simulation-aware walk: a world snapshot plus the command
    /// that produced it.
    #[derive(Clone, Debug)]
    pub struct SimStep {
        world: World,
        command: Command,
        robot: RobotId,
        position: Point,
        facing: Direction,
    }

    impl SimStep {
        fn new(world: World, command: Command, robot: RobotId) -> Option<Self> {
            let actor = query::robot(&world, robot)?;
            let position = actor.position();
            let facing = actor.facing();
            Some(Self {
                world,
                command,
                robot,
                position,
                facing,
            })
        }

        /// Command that produced this snapshot.
        #[must_use]
        pub const fn command(&self) -> Command {
            self.command
        }

        /// World snapshot reached by this step.
        #[must_use]
        pub const fn world(&self) -> &World {
            &self.world
        }
    }

    impl PartialEq for SimStep {
        fn eq(&self, other: &Self) -> bool {
            self.position == other.position
                && self.facing == other.facing
                && self.robot == other.robot
        }
    }

    impl Eq for SimStep {}

    impl Hash for SimStep {
        fn hash<H: Hasher>(&self, state: &mut H) {
            self.position.hash(state);
            self.facing.hash(state);
            self.robot.hash(state);
        }
    }

    fn neighbours(step: &SimStep) -> Vec<SimStep> {
        let mut commands = Vec::with_capacity(6);
        commands.extend(TURNS);
        for direction in Direction::ALL {
            commands.push(Command::Move { direction });
        }

        commands
            .into_iter()
            .filter_map(|command| {
                apply(&step.world, step.robot, command)
                    .ok()
                    .and_then(|world| SimStep::new(world, command, step.robot))
            })
            .collect()
    }

    fn commands_of(path: Vec<SimStep>) -> Vec<Command> {
        path.into_iter().skip(1).map(|step| step.command).collect()
    }

    fn heuristic(step: &SimStep, target: Point) -> f64 {
        match query::robot(&step.world, step.robot) {
            Some(actor) => pose_heuristic(query::grid(&step.world), actor, target),
            None => f64::MAX,
        }
    }

    /// Plans the command burst that leaves `target` wrapped, exploring
    /// simulated futures. Returns `None` when no reachable future wraps it.
    #[must_use]
    pub fn wrap(world: &World, robot: RobotId, target: Point) -> Option<Vec<Command>> {
        let start = SimStep::new(world.clone(), Command::Noop, robot)?;
        best_first(
            start,
            |step| heuristic(step, target),
            |step| query::grid(&step.world).get(target).status() == Status::Wrapped,
            neighbours,
        )
        .map(commands_of)
    }

    /// Plans the command burst that ends with the robot standing on
    /// `target`, exploring simulated futures.
    #[must_use]
    pub fn travel(world: &World, robot: RobotId, target: Point) -> Option<Vec<Command>> {
        let start = SimStep::new(world.clone(), Command::Noop, robot)?;
        best_first(
            start,
            |step| heuristic(step, target),
            |step| step.position == target,
            neighbours,
        )
        .map(commands_of)
    }

    /// Plans the command burst that ends once `target` is covered by a
    /// manipulator with line of sight from the robot.
    #[must_use]
    pub fn reach(world: &World, robot: RobotId, target: Point) -> Option<Vec<Command>> {
        let start = SimStep::new(world.clone(), Command::Noop, robot)?;
        best_first(
            start,
            |step| heuristic(step, target),
            |step| {
                query::robot(&step.world, step.robot).is_some_and(|actor| {
                    actor.position() == target
                        || actor.manipulator_positions().any(|arm| arm == target)
                            && query::grid(&step.world)
                                .is_visible(actor.position(), target)
                })
            },
            neighbours,
        )
        .map(commands_of)
    }
}

#[cfg(test)]
mod tests {
    use super::{best_first, grid_walk, sim_walk};
    use gridwrap_core::{Cell, Command, Point, RobotId, Status};
    use gridwrap_world::{apply, query, Grid, Robot, World};

    fn square(edge: i32) -> Vec<Point> {
        vec![
            Point::new(0, 0),
            Point::new(edge, 0),
            Point::new(edge, edge),
            Point::new(0, edge),
        ]
    }

    #[test]
    fn best_first_reaches_goal_over_abstract_nodes() {
        let path = best_first(
            0i32,
            |value| f64::from((7 - value).abs()),
            |value| *value == 7,
            |value| vec![value + 1, value + 2],
        )
        .expect("goal reachable");

        assert_eq!(path.first(), Some(&0));
        assert_eq!(path.last(), Some(&7));
        for pair in path.windows(2) {
            assert!(pair[1] - pair[0] <= 2);
        }
    }

    #[test]
    fn best_first_reports_exhaustion_as_none() {
        let result = best_first(
            0i32,
            |_| 0.0,
            |value| *value == 100,
            |value| if *value < 3 { vec![value + 1] } else { Vec::new() },
        );
        assert_eq!(result, None);
    }

    #[test]
    fn grid_travel_crosses_an_open_arena() {
        let grid = Grid::from_outline(&square(5), &[], &[]);
        let robot = Robot::new(Point::new(0, 0));
        let route = grid_walk::travel(&grid, &robot, Point::new(4, 0)).expect("open route");

        let mut current = robot;
        for command in &route {
            if let Command::Move { direction } = command {
                current = current.moved(*direction);
            }
        }
        assert_eq!(current.position(), Point::new(4, 0));
        assert_eq!(route.len(), 4);
    }

    #[test]
    fn grid_travel_detours_around_walls() {
        let grid = Grid::from_outline(&square(5), &[], &[])
            .set(Point::new(1, 0), Cell::WALL)
            .set(Point::new(1, 1), Cell::WALL);
        let robot = Robot::new(Point::new(0, 0));
        let route = grid_walk::travel(&grid, &robot, Point::new(2, 0)).expect("detour exists");

        let moves = route
            .iter()
            .filter(|command| matches!(command, Command::Move { .. }))
            .count();
        assert!(moves >= 6, "route must go around the wall, got {moves} moves");
    }

    #[test]
    fn grid_travel_rejects_wall_targets() {
        let grid = Grid::from_outline(&square(5), &[], &[]).set(Point::new(2, 2), Cell::WALL);
        let robot = Robot::new(Point::new(0, 0));
        assert_eq!(grid_walk::travel(&grid, &robot, Point::new(2, 2)), None);
    }

    #[test]
    fn grid_reach_stops_at_manipulator_range() {
        let grid = Grid::from_outline(&square(5), &[], &[]);
        let robot = Robot::new(Point::new(0, 0));
        let route = grid_walk::reach(&grid, &robot, Point::new(2, 0)).expect("reachable");

        let mut current = robot;
        for command in &route {
            if let Command::Move { direction } = command {
                current = current.moved(*direction);
            }
        }
        assert!(
            current.manipulator_positions().any(|arm| arm == Point::new(2, 0)),
            "target must end in manipulator range"
        );
    }

    #[test]
    fn sim_wrap_burst_replays_to_a_wrapped_target() {
        let world = World::new(Grid::from_outline(&square(5), &[], &[]), Point::new(0, 0));
        let target = Point::new(3, 2);
        let burst = sim_walk::wrap(&world, RobotId::new(0), target).expect("wrappable");

        let mut replay = world;
        for command in burst {
            replay = apply(&replay, RobotId::new(0), command).expect("legal burst");
        }
        assert_eq!(query::grid(&replay).get(target).status(), Status::Wrapped);
    }

    #[test]
    fn sim_wrap_reports_no_path_through_a_sealing_wall() {
        let grid = Grid::from_outline(&square(3), &[], &[])
            .set(Point::new(1, 0), Cell::WALL)
            .set(Point::new(1, 1), Cell::WALL)
            .set(Point::new(1, 2), Cell::WALL);
        let world = World::new(grid, Point::new(0, 0));

        assert_eq!(sim_walk::wrap(&world, RobotId::new(0), Point::new(2, 1)), None);
    }

    #[test]
    fn sim_walk_routes_through_walls_under_an_active_drill() {
        let grid = Grid::from_outline(&square(3), &[], &[])
            .set(Point::new(1, 0), Cell::WALL)
            .set(Point::new(1, 1), Cell::WALL)
            .set(Point::new(1, 2), Cell::WALL);
        let world = World::new(grid, Point::new(0, 0))
            .with_inventory(gridwrap_core::BoosterKind::Drill, 1);
        let armed = apply(&world, RobotId::new(0), Command::UseDrill).expect("spend");

        // The same sealed pocket that defeats the boost-free walk opens up
        // once the search simulates moves with the drill burning.
        let target = Point::new(2, 1);
        let burst = sim_walk::travel(&armed, RobotId::new(0), target).expect("drillable");

        let mut replay = armed;
        for command in burst {
            replay = apply(&replay, RobotId::new(0), command).expect("legal burst");
        }
        let robot = query::robot(&replay, RobotId::new(0)).expect("robot");
        assert_eq!(robot.position(), target);
    }

    #[test]
    fn sim_reach_stops_at_line_of_sight_range() {
        let world = World::new(Grid::from_outline(&square(5), &[], &[]), Point::new(0, 0));
        let target = Point::new(4, 4);
        let burst = sim_walk::reach(&world, RobotId::new(0), target).expect("reachable");

        let mut replay = world;
        for command in burst {
            replay = apply(&replay, RobotId::new(0), command).expect("legal burst");
        }
        let robot = query::robot(&replay, RobotId::new(0)).expect("robot");
        let covered = robot.position() == target
            || robot.manipulator_positions().any(|arm| arm == target);
        assert!(covered, "target must end in wrap range");
        assert_eq!(query::grid(&replay).get(target).status(), Status::Wrapped);
    }

    #[test]
    fn sim_travel_ends_on_the_target_cell() {
        let world = World::new(Grid::from_outline(&square(4), &[], &[]), Point::new(0, 0));
        let target = Point::new(2, 3);
        let burst = sim_walk::travel(&world, RobotId::new(0), target).expect("reachable");

        let mut replay = world;
        for command in burst {
            replay = apply(&replay, RobotId::new(0), command).expect("legal burst");
        }
        let robot = query::robot(&replay, RobotId::new(0)).expect("robot");
        assert_eq!(robot.position(), target);
    }
}
