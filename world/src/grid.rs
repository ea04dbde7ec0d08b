//! Copy-on-write cell grid with visibility and breadth-first queries.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use gridwrap_core::{BoosterKind, Cell, Point, Status};

/// Immutable cell grid covering an inclusive bounding rectangle.
///
/// Every point outside the recorded domain resolves to [`Cell::OUTER_WALL`],
/// making [`Grid::get`] a total function. Mutation goes through [`Grid::set`],
/// which returns a new grid; storage sits behind an `Arc` so that snapshots
/// share their cell buffer until one of them is written to. This is what lets
/// the simulation-aware search hold many divergent grids cheaply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    min: Point,
    max: Point,
    width: usize,
    cells: Arc<Vec<Cell>>,
    boosters: Arc<BTreeMap<Point, BoosterKind>>,
}

impl Grid {
    /// Rasterizes an arena from its outline polygon, obstacle polygons and
    /// booster placements.
    ///
    /// A cell belongs to the arena when its center lies inside the outline
    /// and outside every obstacle; the bounding-box fringe whose centers fall
    /// outside the outline becomes outer wall.
    #[must_use]
    pub fn from_outline(
        outline: &[Point],
        obstacles: &[Vec<Point>],
        boosters: &[(Point, BoosterKind)],
    ) -> Self {
        if outline.len() < 3 {
            return Self::empty();
        }

        let min_x = outline.iter().map(Point::x).min().unwrap_or(0);
        let max_x = outline.iter().map(Point::x).max().unwrap_or(-1);
        let min_y = outline.iter().map(Point::y).min().unwrap_or(0);
        let max_y = outline.iter().map(Point::y).max().unwrap_or(-1);

        let min = Point::new(min_x, min_y);
        let max = Point::new(max_x, max_y);
        let width = usize::try_from(max_x - min_x + 1).unwrap_or(0);
        let height = usize::try_from(max_y - min_y + 1).unwrap_or(0);

        let mut cells = vec![Cell::OUTER_WALL; width * height];
        let mut booster_index = BTreeMap::new();

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let point = Point::new(x, y);
                if !polygon_contains(outline, point) {
                    continue;
                }
                let offset = cell_offset(min, width, point);
                if obstacles.iter().any(|corners| polygon_contains(corners, point)) {
                    cells[offset] = Cell::WALL;
                } else {
                    cells[offset] = Cell::EMPTY;
                }
            }
        }

        for (point, kind) in boosters {
            let offset = cell_offset(min, width, *point);
            if cells.get(offset).map(Cell::status) == Some(Status::Empty) {
                cells[offset] = Cell::new(Status::Empty, Some(*kind));
                let _ = booster_index.insert(*point, *kind);
            }
        }

        Self {
            min,
            max,
            width,
            cells: Arc::new(cells),
            boosters: Arc::new(booster_index),
        }
    }

    fn empty() -> Self {
        Self {
            min: Point::new(0, 0),
            max: Point::new(-1, -1),
            width: 0,
            cells: Arc::new(Vec::new()),
            boosters: Arc::new(BTreeMap::new()),
        }
    }

    /// Smallest point of the recorded domain.
    #[must_use]
    pub const fn min(&self) -> Point {
        self.min
    }

    /// Largest point of the recorded domain.
    #[must_use]
    pub const fn max(&self) -> Point {
        self.max
    }

    /// Cell at the provided point. Points outside the recorded domain
    /// resolve to outer wall.
    #[must_use]
    pub fn get(&self, point: Point) -> Cell {
        self.index(point)
            .and_then(|offset| self.cells.get(offset).copied())
            .unwrap_or(Cell::OUTER_WALL)
    }

    /// Returns a new grid with the cell at the provided point replaced.
    ///
    /// The booster index follows the cell's booster tag: a changed tag drops
    /// the old entry and records the new one. Writes outside the recorded
    /// domain leave the grid unchanged.
    #[must_use]
    pub fn set(&self, point: Point, cell: Cell) -> Self {
        let mut next = self.clone();
        next.set_in_place(point, cell);
        next
    }

    /// In-place variant of [`Grid::set`] for callers that already own a
    /// fresh snapshot and batch several writes.
    pub(crate) fn set_in_place(&mut self, point: Point, cell: Cell) {
        let Some(offset) = self.index(point) else {
            return;
        };

        let previous = self.cells[offset];
        if previous == cell {
            return;
        }

        let cells = Arc::make_mut(&mut self.cells);
        cells[offset] = cell;

        if previous.booster() != cell.booster() {
            let boosters = Arc::make_mut(&mut self.boosters);
            let _ = boosters.remove(&point);
            if let Some(kind) = cell.booster() {
                let _ = boosters.insert(point, kind);
            }
        }
    }

    /// Reports whether any cell of the domain is still empty.
    #[must_use]
    pub fn any_empty(&self) -> bool {
        self.cells.iter().any(|cell| cell.status() == Status::Empty)
    }

    /// Iterates over every booster-bearing cell in deterministic point
    /// order.
    pub fn booster_cells(&self) -> impl Iterator<Item = (Point, BoosterKind)> + '_ {
        self.boosters.iter().map(|(point, kind)| (*point, *kind))
    }

    /// Iterates over every point of the recorded domain together with its
    /// cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = (Point, Cell)> + '_ {
        let min = self.min;
        let width = self.width;
        self.cells.iter().enumerate().map(move |(offset, cell)| {
            let x = min.x() + i32::try_from(offset % width.max(1)).unwrap_or(0);
            let y = min.y() + i32::try_from(offset / width.max(1)).unwrap_or(0);
            (Point::new(x, y), *cell)
        })
    }

    /// Tests whether the straight segment between two cell centers is free
    /// of walls.
    ///
    /// The test walks the supercover discretization of the segment — every
    /// cell the ideal line touches, stepping along whichever axis has the
    /// larger deficit and along both on exact ties — and fails on the first
    /// wall. The walk is direction-independent, so visibility is symmetric.
    #[must_use]
    pub fn is_visible(&self, from: Point, to: Point) -> bool {
        supercover_line(from, to)
            .into_iter()
            .all(|point| !self.get(point).status().is_wall())
    }

    /// Breadth-first expansion from `start` over 4-neighbours, yielding
    /// every visited cell satisfying the predicate in non-decreasing
    /// distance order.
    ///
    /// Outer-wall cells are tested but never expanded through, which bounds
    /// the walk to the arena plus its one-cell fringe. The sequence is
    /// re-run from scratch on every query; it is not resumable.
    pub fn closest_from<P>(&self, start: Point, predicate: P) -> ClosestFrom<'_, P>
    where
        P: FnMut(Point, Cell) -> bool,
    {
        let mut seen = HashSet::new();
        let _ = seen.insert(start);
        let mut queue = VecDeque::new();
        queue.push_back(start);
        ClosestFrom {
            grid: self,
            queue,
            seen,
            predicate,
        }
    }

    fn index(&self, point: Point) -> Option<usize> {
        if point.x() < self.min.x()
            || point.x() > self.max.x()
            || point.y() < self.min.y()
            || point.y() > self.max.y()
        {
            return None;
        }
        let column = usize::try_from(point.x() - self.min.x()).ok()?;
        let row = usize::try_from(point.y() - self.min.y()).ok()?;
        row.checked_mul(self.width)?.checked_add(column)
    }
}

fn cell_offset(min: Point, width: usize, point: Point) -> usize {
    let column = usize::try_from(point.x() - min.x()).unwrap_or(usize::MAX);
    let row = usize::try_from(point.y() - min.y()).unwrap_or(usize::MAX);
    row.saturating_mul(width).saturating_add(column)
}

/// Lazy breadth-first iterator produced by [`Grid::closest_from`].
pub struct ClosestFrom<'a, P> {
    grid: &'a Grid,
    queue: VecDeque<Point>,
    seen: HashSet<Point>,
    predicate: P,
}

impl<P> Iterator for ClosestFrom<'_, P>
where
    P: FnMut(Point, Cell) -> bool,
{
    type Item = (Point, Cell);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(point) = self.queue.pop_front() {
            let cell = self.grid.get(point);
            if cell.status() != Status::OuterWall {
                for neighbour in point.neighbours() {
                    if self.seen.insert(neighbour) {
                        self.queue.push_back(neighbour);
                    }
                }
            }
            if (self.predicate)(point, cell) {
                return Some((point, cell));
            }
        }
        None
    }
}

/// Even-odd containment test of a cell center against a polygon given by its
/// corner list.
fn polygon_contains(corners: &[Point], cell: Point) -> bool {
    if corners.len() < 3 {
        return false;
    }

    let x = f64::from(cell.x()) + 0.5;
    let y = f64::from(cell.y()) + 0.5;

    let mut inside = false;
    let mut j = corners.len() - 1;
    for i in 0..corners.len() {
        let xi = f64::from(corners[i].x());
        let yi = f64::from(corners[i].y());
        let xj = f64::from(corners[j].x());
        let yj = f64::from(corners[j].y());

        if (yi > y) != (yj > y) {
            let crossing = xj + (y - yj) / (yi - yj) * (xi - xj);
            if x < crossing {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Enumerates every cell the ideal segment between two cell centers touches.
///
/// Steps along the axis with the larger remaining deficit; exact ties step
/// both axes at once, which is what picks up diagonal-adjacent cells.
fn supercover_line(from: Point, to: Point) -> Vec<Point> {
    let dx = to.x() - from.x();
    let dy = to.y() - from.y();

    let nx = f64::from(dx.abs());
    let ny = f64::from(dy.abs());
    let sign_x = dx.signum();
    let sign_y = dy.signum();

    let mut point = from;
    let mut points = vec![point];

    let mut ix = 0.0;
    let mut iy = 0.0;
    while ix < nx || iy < ny {
        let horizontal = (0.5 + ix) / nx;
        let vertical = (0.5 + iy) / ny;
        if vertical < horizontal {
            point = Point::new(point.x(), point.y() + sign_y);
            iy += 1.0;
        } else if horizontal < vertical {
            point = Point::new(point.x() + sign_x, point.y());
            ix += 1.0;
        } else {
            point = Point::new(point.x() + sign_x, point.y() + sign_y);
            ix += 1.0;
            iy += 1.0;
        }
        points.push(point);
    }

    points
}
