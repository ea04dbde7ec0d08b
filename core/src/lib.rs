#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the gridwrap solver.
//!
//! This crate defines the value types that connect the authoritative world,
//! the pure planning systems, and the adapters: grid points and cells, the
//! booster economy, and the [`Command`] vocabulary whose textual rendering is
//! the solution format an external judge replays.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Location of a single grid cell. Coordinates may be negative; the world
/// resolves out-of-domain points to outer wall.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// Creates a new point from its coordinates.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate of the point.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical coordinate of the point.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the point shifted by the provided offset.
    #[must_use]
    pub const fn translated(self, offset: Point) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
        }
    }

    /// Computes the Manhattan distance between two points.
    #[must_use]
    pub fn manhattan_distance(self, other: Point) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Computes the Euclidean distance between two points.
    #[must_use]
    pub fn euclid_distance(self, other: Point) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        (dx * dx + dy * dy).sqrt()
    }

    /// The four edge-adjacent neighbours of the point, in up/down/left/right
    /// order.
    #[must_use]
    pub const fn neighbours(self) -> [Point; 4] {
        [
            Point::new(self.x, self.y + 1),
            Point::new(self.x, self.y - 1),
            Point::new(self.x - 1, self.y),
            Point::new(self.x + 1, self.y),
        ]
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Cardinal directions used both for robot movement and robot facing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward increasing `y`.
    Up,
    /// Movement toward decreasing `y`.
    Down,
    /// Movement toward decreasing `x`.
    Left,
    /// Movement toward increasing `x`.
    Right,
}

impl Direction {
    /// All directions in the order move commands are explored.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Left,
        Direction::Down,
    ];

    /// Unit offset produced by one step in this direction.
    #[must_use]
    pub const fn offset(self) -> Point {
        match self {
            Direction::Up => Point::new(0, 1),
            Direction::Down => Point::new(0, -1),
            Direction::Left => Point::new(-1, 0),
            Direction::Right => Point::new(1, 0),
        }
    }

    /// Successor after a quarter turn clockwise.
    #[must_use]
    pub const fn rotated_cw(self) -> Self {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    /// Successor after a quarter turn counter-clockwise.
    #[must_use]
    pub const fn rotated_ccw(self) -> Self {
        match self {
            Direction::Up => Direction::Left,
            Direction::Left => Direction::Down,
            Direction::Down => Direction::Right,
            Direction::Right => Direction::Up,
        }
    }
}

/// Identifier of a robot within a world snapshot. Robots are index-addressed
/// and append-only, so the identifier doubles as the position in the robot
/// list.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct RobotId(usize);

impl RobotId {
    /// Creates an identifier from a robot list index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the robot in the world's robot list.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Coverage state of a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// Traversable and not yet wrapped.
    Empty,
    /// Traversable and wrapped. Wrapping is monotonic: a wrapped cell never
    /// reverts to empty.
    Wrapped,
    /// Interior obstacle. Passable only under an active drill boost.
    Wall,
    /// Cell outside the arena polygon. Never passable.
    OuterWall,
}

impl Status {
    /// Reports whether the status blocks movement and line of sight.
    #[must_use]
    pub const fn is_wall(self) -> bool {
        matches!(self, Status::Wall | Status::OuterWall)
    }
}

/// Collectible booster kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BoosterKind {
    /// One-shot manipulator arm extension.
    ManipulatorExtension,
    /// Timed double-movement boost.
    FastWheels,
    /// Timed wall-drilling boost.
    Drill,
    /// Spawn point marker for cloning. Never collected into inventory.
    Mystery,
    /// One-shot teleport anchor charge.
    Teleport,
    /// One-shot clone charge, spendable on a mystery cell.
    Cloning,
}

impl BoosterKind {
    /// Number of ticks a timed boost stays active once used. One-shot
    /// boosters report zero.
    #[must_use]
    pub const fn duration(self) -> u32 {
        match self {
            BoosterKind::FastWheels => 50,
            BoosterKind::Drill => 30,
            BoosterKind::ManipulatorExtension
            | BoosterKind::Mystery
            | BoosterKind::Teleport
            | BoosterKind::Cloning => 0,
        }
    }

    /// One-letter code used by task descriptions.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            BoosterKind::ManipulatorExtension => 'B',
            BoosterKind::FastWheels => 'F',
            BoosterKind::Drill => 'L',
            BoosterKind::Mystery => 'X',
            BoosterKind::Teleport => 'R',
            BoosterKind::Cloning => 'C',
        }
    }

    /// Parses a one-letter booster code.
    #[must_use]
    pub const fn from_code(code: char) -> Option<Self> {
        match code {
            'B' => Some(BoosterKind::ManipulatorExtension),
            'F' => Some(BoosterKind::FastWheels),
            'L' => Some(BoosterKind::Drill),
            'X' => Some(BoosterKind::Mystery),
            'R' => Some(BoosterKind::Teleport),
            'C' => Some(BoosterKind::Cloning),
            _ => None,
        }
    }
}

/// State of a single grid cell: coverage status plus an optional booster
/// lying on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    status: Status,
    booster: Option<BoosterKind>,
}

impl Cell {
    /// Plain empty cell.
    pub const EMPTY: Cell = Cell::new(Status::Empty, None);
    /// Plain wrapped cell.
    pub const WRAPPED: Cell = Cell::new(Status::Wrapped, None);
    /// Interior wall cell.
    pub const WALL: Cell = Cell::new(Status::Wall, None);
    /// Cell outside the arena.
    pub const OUTER_WALL: Cell = Cell::new(Status::OuterWall, None);

    /// Creates a cell from a status and an optional booster.
    #[must_use]
    pub const fn new(status: Status, booster: Option<BoosterKind>) -> Self {
        Self { status, booster }
    }

    /// Coverage status of the cell.
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Booster lying on the cell, if any.
    #[must_use]
    pub const fn booster(&self) -> Option<BoosterKind> {
        self.booster
    }

    /// Returns the cell with its status replaced and the booster tag kept.
    #[must_use]
    pub const fn with_status(self, status: Status) -> Self {
        Self {
            status,
            booster: self.booster,
        }
    }
}

/// Commands that express all permissible robot actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Steps the robot one cell in the given direction.
    Move {
        /// Direction of travel for the step.
        direction: Direction,
    },
    /// Rotates the robot and its manipulators a quarter turn clockwise.
    TurnCw,
    /// Rotates the robot and its manipulators a quarter turn
    /// counter-clockwise.
    TurnCcw,
    /// Does nothing for one turn.
    Noop,
    /// Spends a manipulator extension to attach a new arm offset.
    AttachManipulator {
        /// Relative offset of the new manipulator arm.
        offset: Point,
    },
    /// Spends a fast-wheels booster, doubling movement for its duration.
    UseFastWheels,
    /// Spends a drill booster, making interior walls passable for its
    /// duration.
    UseDrill,
    /// Spends a teleport booster, recording the current cell as an anchor.
    ResetTeleportAnchor,
    /// Teleports the robot to a previously recorded anchor.
    ShiftToAnchor {
        /// Anchor cell to jump to.
        anchor: Point,
    },
    /// Spends a cloning charge on a mystery cell, spawning a new robot.
    Clone,
    /// Advances the shared clock and promotes pending booster pickups into
    /// the inventory.
    Tick,
}

impl fmt::Display for Command {
    /// Renders the judge encoding. `Tick` renders as the empty string: it is
    /// implicit in the turn-by-turn interleaving of solution streams.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Move { direction } => {
                let code = match direction {
                    Direction::Up => 'W',
                    Direction::Down => 'S',
                    Direction::Left => 'A',
                    Direction::Right => 'D',
                };
                write!(f, "{code}")
            }
            Command::TurnCw => write!(f, "E"),
            Command::TurnCcw => write!(f, "Q"),
            Command::Noop => write!(f, "Z"),
            Command::AttachManipulator { offset } => {
                write!(f, "B({},{})", offset.x(), offset.y())
            }
            Command::UseFastWheels => write!(f, "F"),
            Command::UseDrill => write!(f, "L"),
            Command::ResetTeleportAnchor => write!(f, "R"),
            Command::ShiftToAnchor { anchor } => {
                write!(f, "T({},{})", anchor.x(), anchor.y())
            }
            Command::Clone => write!(f, "C"),
            Command::Tick => Ok(()),
        }
    }
}
