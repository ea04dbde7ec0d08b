#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tiled flood-fill segmentation of the traversable grid into regions.
//!
//! The grid is cut into fixed-size square windows; flood filling inside each
//! window yields regions of at most `tile_edge x tile_edge` cells, which keeps
//! them small enough to act as the unit of coverage-order planning. A merge
//! pass folds undersized regions into their neighbours, and the result is
//! lifted into an adjacency graph for the tour builder.

use std::collections::{BTreeSet, VecDeque};

use gridwrap_core::Point;
use gridwrap_world::Grid;

/// Default edge length of the segmentation windows, in cells.
pub const DEFAULT_TILE_EDGE: i32 = 20;

/// Fraction of a full window below which a region is merged away.
const MERGE_FRACTION: f64 = 0.2;

/// A maximal flood-filled connected component of non-wall cells within one
/// segmentation window, tagged with the seed point the fill started from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Region {
    seed: Point,
    points: BTreeSet<Point>,
}

impl Region {
    /// Representative point the flood fill started from.
    #[must_use]
    pub const fn seed(&self) -> Point {
        self.seed
    }

    /// Number of cells in the region.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Reports whether the region holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reports whether the region contains the provided cell.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.points.contains(&point)
    }

    /// Iterates the region's cells in deterministic point order.
    pub fn points(&self) -> impl Iterator<Item = Point> + '_ {
        self.points.iter().copied()
    }

    /// Component-wise average of the region's cells, used as the metric
    /// center for tour building.
    #[must_use]
    pub fn center(&self) -> Point {
        let count = i64::try_from(self.points.len().max(1)).unwrap_or(1);
        let mut sum_x = 0i64;
        let mut sum_y = 0i64;
        for point in &self.points {
            sum_x += i64::from(point.x());
            sum_y += i64::from(point.y());
        }
        Point::new(
            i32::try_from(sum_x / count).unwrap_or(0),
            i32::try_from(sum_y / count).unwrap_or(0),
        )
    }

    /// Reports whether any cell of this region is 4-adjacent to a cell of
    /// the other region.
    #[must_use]
    pub fn is_adjacent(&self, other: &Region) -> bool {
        self.points
            .iter()
            .flat_map(|point| point.neighbours())
            .any(|neighbour| other.points.contains(&neighbour))
    }
}

/// Cuts the grid into `tile_edge`-sized windows and flood-fills every
/// unassigned non-wall cell inside each window.
#[must_use]
pub fn partition(grid: &Grid, tile_edge: i32) -> Vec<Region> {
    let mut regions = Vec::new();
    if tile_edge <= 0 {
        return regions;
    }

    let mut y = grid.min().y();
    while y <= grid.max().y() {
        let mut x = grid.min().x();
        while x <= grid.max().x() {
            regions.extend(window_regions(grid, Point::new(x, y), tile_edge));
            x += tile_edge;
        }
        y += tile_edge;
    }
    regions
}

fn window_regions(grid: &Grid, corner: Point, tile_edge: i32) -> Vec<Region> {
    let mut assigned: BTreeSet<Point> = BTreeSet::new();
    let mut regions = Vec::new();

    for dy in 0..tile_edge {
        for dx in 0..tile_edge {
            let point = Point::new(corner.x() + dx, corner.y() + dy);
            if grid.get(point).status().is_wall() || assigned.contains(&point) {
                continue;
            }
            let region = flood_fill(grid, point, corner, tile_edge);
            assigned.extend(region.points.iter().copied());
            regions.push(region);
        }
    }
    regions
}

fn window_contains(corner: Point, tile_edge: i32, point: Point) -> bool {
    point.x() >= corner.x()
        && point.y() >= corner.y()
        && point.x() < corner.x() + tile_edge
        && point.y() < corner.y() + tile_edge
}

fn flood_fill(grid: &Grid, seed: Point, corner: Point, tile_edge: i32) -> Region {
    let mut points = BTreeSet::new();
    let mut queue = VecDeque::new();
    queue.push_back(seed);

    while let Some(current) = queue.pop_front() {
        if points.contains(&current)
            || !window_contains(corner, tile_edge, current)
            || grid.get(current).status().is_wall()
        {
            continue;
        }
        let _ = points.insert(current);
        for neighbour in current.neighbours() {
            queue.push_back(neighbour);
        }
    }

    Region { seed, points }
}

/// Repeatedly merges any region smaller than 20% of a full window into an
/// adjacent region, until no undersized region has a mergeable neighbour.
/// The merged region keeps the absorbing neighbour's seed.
#[must_use]
pub fn merge_undersized(mut regions: Vec<Region>, tile_edge: i32) -> Vec<Region> {
    let cap = f64::from(tile_edge.saturating_mul(tile_edge)) * MERGE_FRACTION;

    loop {
        let mergeable = regions.iter().enumerate().find_map(|(index, region)| {
            if (region.len() as f64) >= cap {
                return None;
            }
            let partner = regions
                .iter()
                .enumerate()
                .find(|(other_index, other)| *other_index != index && other.is_adjacent(region))
                .map(|(other_index, _)| other_index)?;
            Some((index, partner))
        });

        let Some((candidate_index, partner_index)) = mergeable else {
            break;
        };

        let (low, high) = if candidate_index < partner_index {
            (candidate_index, partner_index)
        } else {
            (partner_index, candidate_index)
        };
        let high_region = regions.remove(high);
        let low_region = regions.remove(low);
        let (candidate, partner) = if candidate_index < partner_index {
            (low_region, high_region)
        } else {
            (high_region, low_region)
        };

        let mut points = partner.points;
        points.extend(candidate.points);
        regions.push(Region {
            seed: partner.seed,
            points,
        });
    }

    regions
}

/// Region adjacency graph: one node per region, an edge wherever two regions
/// share a 4-adjacent boundary.
#[derive(Clone, Debug)]
pub struct RegionGraph {
    regions: Vec<Region>,
    adjacency: Vec<Vec<usize>>,
}

impl RegionGraph {
    /// Builds the graph with an O(R^2) pairwise boundary scan; region counts
    /// stay small relative to the map, so the scan is cheap.
    #[must_use]
    pub fn build(regions: Vec<Region>) -> Self {
        let mut adjacency = vec![Vec::new(); regions.len()];
        for i in 0..regions.len() {
            for j in (i + 1)..regions.len() {
                if regions[i].is_adjacent(&regions[j]) {
                    adjacency[i].push(j);
                    adjacency[j].push(i);
                }
            }
        }
        Self { regions, adjacency }
    }

    /// Number of regions in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Reports whether the graph holds no regions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// All regions in index order.
    #[must_use]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Indices of the regions adjacent to the provided region.
    #[must_use]
    pub fn neighbours(&self, index: usize) -> &[usize] {
        self.adjacency.get(index).map_or(&[], Vec::as_slice)
    }

    /// Index of the region containing the provided cell, if any.
    #[must_use]
    pub fn locate(&self, point: Point) -> Option<usize> {
        self.regions
            .iter()
            .position(|region| region.contains(point))
    }
}

/// Segments the grid end to end: partition, merge undersized regions, build
/// the adjacency graph.
#[must_use]
pub fn segment(grid: &Grid, tile_edge: i32) -> RegionGraph {
    RegionGraph::build(merge_undersized(partition(grid, tile_edge), tile_edge))
}
