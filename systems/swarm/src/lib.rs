#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! The multi-robot driving loop.
//!
//! The coordinator owns a lazy command queue per robot. Each round it refills
//! every idle robot — chase a cloning opportunity, continue the claimed tour
//! chunk, or grab the least-loaded unfinished region — then applies exactly
//! one command per robot followed by a single tick. The loop ends when the
//! world is fully wrapped, or when a whole round passes with every robot idle
//! and nothing left to reach.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, info};

use gridwrap_core::{BoosterKind, Command, RobotId, Status};
use gridwrap_system_partition::{segment, RegionGraph, DEFAULT_TILE_EDGE};
use gridwrap_system_planner::{nearest_booster, plan_burst, Assignment};
use gridwrap_system_search::sim_walk;
use gridwrap_system_tour::{all_pairs_distances, christofides, rotate_to_start, spanning_tour};
use gridwrap_world::{apply, query, World};

/// Whether robots chase cloning opportunities before settling into coverage
/// work.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    /// Spend cloning boosters to grow the swarm, then share the tour.
    Swarm,
    /// Ignore cloning opportunities and follow the tour alone.
    Solo,
}

/// Which region ordering feeds the chunk assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TourStyle {
    /// Christofides-style 3/2-approximate tour.
    Christofides,
    /// Depth-first walk of the minimum spanning tree.
    SpanningTree,
}

/// Knobs for a planning run.
#[derive(Clone, Copy, Debug)]
pub struct SolveOptions {
    /// Edge length of the segmentation windows, in cells.
    pub tile_edge: i32,
    /// Cloning behaviour.
    pub strategy: Strategy,
    /// Region ordering fed to the chunk assignment.
    pub tour: TourStyle,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            tile_edge: DEFAULT_TILE_EDGE,
            strategy: Strategy::Swarm,
            tour: TourStyle::Christofides,
        }
    }
}

/// Outcome of a planning run: the final world plus one command stream per
/// robot in spawn order. Tick boundaries are implicit in the turn-by-turn
/// interleaving and are not recorded in the streams.
#[derive(Clone, Debug)]
pub struct Solution {
    streams: Vec<Vec<Command>>,
    world: World,
    rounds: u64,
}

impl Solution {
    /// Command streams per robot, in spawn order.
    #[must_use]
    pub fn streams(&self) -> &[Vec<Command>] {
        &self.streams
    }

    /// Final world snapshot after replaying every emitted command.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Number of full rounds (ticks) the run took.
    #[must_use]
    pub const fn rounds(&self) -> u64 {
        self.rounds
    }

    /// Reports whether every traversable cell ended up wrapped.
    #[must_use]
    pub fn is_solved(&self) -> bool {
        query::has_solved(&self.world)
    }

    /// Total number of commands across all streams.
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.streams.iter().map(Vec::len).sum()
    }
}

#[derive(Default)]
struct RobotState {
    queue: VecDeque<Command>,
    assignment: Option<Assignment>,
    chunk: VecDeque<usize>,
}

struct Coordinator {
    graph: RegionGraph,
    distances: Vec<Vec<f64>>,
    unclaimed: Vec<Vec<usize>>,
    claims: BTreeMap<usize, Vec<usize>>,
    states: Vec<RobotState>,
    strategy: Strategy,
}

impl Coordinator {
    /// Produces the next command burst for an idle robot, in priority order:
    /// cloning chase, current assignment, chunk continuation, chunk claim,
    /// load-balanced region claim. An empty burst means no reachable work.
    fn refill(&mut self, world: &World, robot: usize) -> Vec<Command> {
        if self.strategy == Strategy::Swarm {
            if let Some(commands) = self.clone_chase(world, robot) {
                if !commands.is_empty() {
                    return commands;
                }
            }
        }

        let mut attempted: BTreeSet<usize> = BTreeSet::new();
        loop {
            let burst = match self.states[robot].assignment.as_mut() {
                Some(assignment) => plan_burst(world, RobotId::new(robot), assignment),
                None => Vec::new(),
            };
            if !burst.is_empty() {
                return burst;
            }
            self.states[robot].assignment = None;

            if !self.claim_next(world, robot, &mut attempted) {
                return Vec::new();
            }
        }
    }

    /// Routes the robot toward the nearest cloning opportunity: a cloning
    /// booster on the map, or a mystery cell while a cloning charge is
    /// spendable. Standing on a mystery cell with a charge clones at once.
    fn clone_chase(&self, world: &World, robot: usize) -> Option<Vec<Command>> {
        let id = RobotId::new(robot);
        let actor = query::robot(world, id)?;
        let charge_ready = query::inventory(world, BoosterKind::Cloning) > 0;

        if charge_ready
            && query::grid(world).get(actor.position()).booster() == Some(BoosterKind::Mystery)
        {
            return Some(vec![Command::Clone]);
        }

        let target = nearest_booster(world, id, f64::MAX, |kind| {
            kind == BoosterKind::Cloning || (kind == BoosterKind::Mystery && charge_ready)
        })?;
        debug!(robot, %target, "chasing cloning opportunity");
        sim_walk::travel(world, id, target)
    }

    fn claim_next(&mut self, world: &World, robot: usize, attempted: &mut BTreeSet<usize>) -> bool {
        // continue the chunk already in hand
        if let Some(region) = self.states[robot].chunk.pop_front() {
            self.assign_region(robot, region);
            return true;
        }

        // claim the unclaimed tour chunk with the nearest endpoint
        if !self.unclaimed.is_empty() {
            let here = self.robot_region(world, robot);
            let chosen = self
                .unclaimed
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    self.chunk_distance(here, a)
                        .total_cmp(&self.chunk_distance(here, b))
                })
                .map(|(index, _)| index);
            if let Some(index) = chosen {
                let chunk = self.unclaimed.remove(index);
                debug!(robot, ?chunk, "claimed tour chunk");
                self.states[robot].chunk = chunk.into_iter().collect();
                if let Some(region) = self.states[robot].chunk.pop_front() {
                    self.assign_region(robot, region);
                    return true;
                }
            }
        }

        // the static tour is exhausted: claim the unfinished region with the
        // fewest assigned robots, nearest first
        let grid = query::grid(world);
        let here = self.robot_region(world, robot);
        let chosen = (0..self.graph.len())
            .filter(|index| {
                !attempted.contains(index)
                    && self.graph.regions()[*index]
                        .points()
                        .any(|point| grid.get(point).status() == Status::Empty)
            })
            .min_by(|&a, &b| {
                let load_a = self.claims.get(&a).map_or(0, Vec::len);
                let load_b = self.claims.get(&b).map_or(0, Vec::len);
                load_a
                    .cmp(&load_b)
                    .then_with(|| {
                        self.region_distance(here, a)
                            .total_cmp(&self.region_distance(here, b))
                    })
                    .then_with(|| a.cmp(&b))
            });

        match chosen {
            Some(region) => {
                let _ = attempted.insert(region);
                self.assign_region(robot, region);
                true
            }
            None => false,
        }
    }

    fn assign_region(&mut self, robot: usize, region: usize) {
        debug!(robot, region, "assigned region");
        self.claims.entry(region).or_default().push(robot);
        self.states[robot].assignment =
            Some(Assignment::new(self.graph.regions()[region].points()));
    }

    fn robot_region(&self, world: &World, robot: usize) -> usize {
        query::robot(world, RobotId::new(robot))
            .and_then(|actor| self.graph.locate(actor.position()))
            .unwrap_or(0)
    }

    fn chunk_distance(&self, here: usize, chunk: &[usize]) -> f64 {
        let mut best = f64::INFINITY;
        for endpoint in [chunk.first(), chunk.last()].into_iter().flatten() {
            let candidate = self.region_distance(here, *endpoint);
            if candidate < best {
                best = candidate;
            }
        }
        best
    }

    fn region_distance(&self, from: usize, to: usize) -> f64 {
        self.distances
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(f64::INFINITY)
    }
}

/// Drives the world until every traversable cell is wrapped, emitting one
/// command per active robot per round plus a single tick, and returns the
/// per-robot command streams.
#[must_use]
pub fn solve(world: World, options: SolveOptions) -> Solution {
    let graph = segment(query::grid(&world), options.tile_edge);
    let distances = all_pairs_distances(&graph);

    let ordering = match options.tour {
        TourStyle::Christofides => christofides(&graph),
        TourStyle::SpanningTree => spanning_tour(&graph),
    };
    let start_region = query::robot(&world, RobotId::new(0))
        .and_then(|robot| graph.locate(robot.position()))
        .unwrap_or(0);
    let tour = rotate_to_start(&ordering, start_region);

    let expected_robots = query::grid(&world)
        .booster_cells()
        .filter(|(_, kind)| *kind == BoosterKind::Cloning)
        .count()
        + 1;
    let chunk_len = tour.len().div_ceil(expected_robots).max(1);
    let unclaimed: Vec<Vec<usize>> = tour.chunks(chunk_len).map(<[usize]>::to_vec).collect();

    info!(
        regions = graph.len(),
        chunks = unclaimed.len(),
        expected_robots,
        "planning run started"
    );

    let mut coordinator = Coordinator {
        graph,
        distances,
        unclaimed,
        claims: BTreeMap::new(),
        states: Vec::new(),
        strategy: options.strategy,
    };

    let mut world = world;
    let mut streams: Vec<Vec<Command>> = vec![Vec::new(); query::robot_count(&world)];
    let mut rounds: u64 = 0;

    loop {
        if query::has_solved(&world) {
            break;
        }

        let robot_count = query::robot_count(&world);
        if coordinator.states.len() < robot_count {
            coordinator.states.resize_with(robot_count, RobotState::default);
        }
        if streams.len() < robot_count {
            streams.resize_with(robot_count, Vec::new);
        }

        let mut all_idle = true;
        for robot in 0..robot_count {
            if coordinator.states[robot].queue.is_empty() {
                let commands = coordinator.refill(&world, robot);
                coordinator.states[robot].queue.extend(commands);
            }

            let command = coordinator.states[robot]
                .queue
                .pop_front()
                .unwrap_or(Command::Noop);

            match apply(&world, RobotId::new(robot), command) {
                Ok(next) => {
                    world = next;
                    streams[robot].push(command);
                    if command != Command::Noop {
                        all_idle = false;
                    }
                }
                Err(error) => {
                    debug!(robot, %error, "burst went stale, replanning");
                    coordinator.states[robot].queue.clear();
                    coordinator.states[robot].assignment = None;
                    if let Ok(next) = apply(&world, RobotId::new(robot), Command::Noop) {
                        world = next;
                    }
                    streams[robot].push(Command::Noop);
                }
            }
        }

        if query::has_solved(&world) {
            break;
        }
        if all_idle
            && coordinator
                .states
                .iter()
                .all(|state| state.queue.is_empty())
        {
            debug!("no robot found reachable work; stopping");
            break;
        }

        if let Ok(next) = apply(&world, RobotId::new(0), Command::Tick) {
            world = next;
        }
        rounds += 1;
    }

    info!(
        rounds,
        robots = streams.len(),
        solved = query::has_solved(&world),
        "planning run finished"
    );

    Solution {
        streams,
        world,
        rounds,
    }
}
