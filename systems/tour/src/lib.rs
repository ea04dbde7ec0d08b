#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Region visiting order.
//!
//! All-pairs shortest-path distances over the region graph turn sparse
//! adjacency into a complete metric, which feeds a Christofides-style 3/2
//! approximation: minimum spanning tree, greedy matching over the odd-degree
//! vertices, Euler circuit, shortcut pass. A plain MST depth-first walk is
//! available as a fallback ordering.

use gridwrap_core::Point;
use gridwrap_system_partition::{Region, RegionGraph};

/// Weight assigned to region pairs with no connecting path, so that
/// disconnected pockets still receive a tour slot instead of poisoning the
/// arithmetic.
const DISCONNECTED_WEIGHT: f64 = 1.0e9;

/// Computes shortest-path distances between every pair of regions, running
/// Dijkstra from each source over edges weighted by the Euclidean distance
/// between region centers. Unreachable pairs stay at infinity.
#[must_use]
pub fn all_pairs_distances(graph: &RegionGraph) -> Vec<Vec<f64>> {
    let count = graph.len();
    let centers: Vec<Point> = graph.regions().iter().map(Region::center).collect();

    (0..count)
        .map(|source| {
            let mut distance = vec![f64::INFINITY; count];
            let mut settled = vec![false; count];
            distance[source] = 0.0;

            for _ in 0..count {
                let mut nearest = None;
                for node in 0..count {
                    if settled[node] || !distance[node].is_finite() {
                        continue;
                    }
                    if nearest.map_or(true, |best: usize| distance[node] < distance[best]) {
                        nearest = Some(node);
                    }
                }
                let Some(node) = nearest else {
                    break;
                };
                settled[node] = true;

                for &next in graph.neighbours(node) {
                    let weight = centers[node].euclid_distance(centers[next]);
                    if distance[node] + weight < distance[next] {
                        distance[next] = distance[node] + weight;
                    }
                }
            }
            distance
        })
        .collect()
}

/// Builds a Christofides-style tour over every region: each region index
/// appears exactly once, in an order approximating the cheapest closed walk
/// over the all-pairs metric.
#[must_use]
pub fn christofides(graph: &RegionGraph) -> Vec<usize> {
    let count = graph.len();
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![0];
    }

    let distances = all_pairs_distances(graph);
    let weight = |a: usize, b: usize| {
        let direct = distances[a][b];
        if direct.is_finite() {
            direct
        } else {
            DISCONNECTED_WEIGHT
        }
    };

    let mut multigraph = spanning_tree(count, &weight);

    let odd: Vec<usize> = (0..count)
        .filter(|&node| multigraph[node].len() % 2 == 1)
        .collect();

    // Greedy min-weight matching over the odd-degree vertices stands in for
    // a full blossom matching; the tour stays a heuristic either way.
    let mut pairs = Vec::new();
    for (position, &a) in odd.iter().enumerate() {
        for &b in odd.iter().skip(position + 1) {
            pairs.push((weight(a, b), a, b));
        }
    }
    pairs.sort_by(|lhs, rhs| {
        lhs.0
            .total_cmp(&rhs.0)
            .then_with(|| lhs.1.cmp(&rhs.1))
            .then_with(|| lhs.2.cmp(&rhs.2))
    });
    let mut matched = vec![false; count];
    for (_, a, b) in pairs {
        if !matched[a] && !matched[b] {
            matched[a] = true;
            matched[b] = true;
            multigraph[a].push(b);
            multigraph[b].push(a);
        }
    }

    let circuit = euler_circuit(multigraph);

    let mut seen = vec![false; count];
    let mut tour = Vec::with_capacity(count);
    for node in circuit {
        if !seen[node] {
            seen[node] = true;
            tour.push(node);
        }
    }
    for node in 0..count {
        if !seen[node] {
            tour.push(node);
        }
    }
    tour
}

/// Orders regions by a depth-first walk of the minimum spanning tree — the
/// simpler fallback when a full tour approximation is not wanted.
#[must_use]
pub fn spanning_tour(graph: &RegionGraph) -> Vec<usize> {
    let count = graph.len();
    if count == 0 {
        return Vec::new();
    }

    let distances = all_pairs_distances(graph);
    let weight = |a: usize, b: usize| {
        let direct = distances[a][b];
        if direct.is_finite() {
            direct
        } else {
            DISCONNECTED_WEIGHT
        }
    };

    let mut tree = spanning_tree(count, &weight);
    for branches in &mut tree {
        branches.sort_unstable();
    }

    let mut order = Vec::with_capacity(count);
    let mut visited = vec![false; count];
    let mut stack = vec![0usize];
    while let Some(node) = stack.pop() {
        if visited[node] {
            continue;
        }
        visited[node] = true;
        order.push(node);
        for &branch in tree[node].iter().rev() {
            if !visited[branch] {
                stack.push(branch);
            }
        }
    }
    for node in 0..count {
        if !visited[node] {
            order.push(node);
        }
    }
    order
}

/// Rotates a tour so that it starts at the provided region, preserving every
/// stop. Tours that do not contain the region are returned unchanged.
#[must_use]
pub fn rotate_to_start(tour: &[usize], start: usize) -> Vec<usize> {
    match tour.iter().position(|&region| region == start) {
        Some(position) => tour[position..]
            .iter()
            .chain(tour[..position].iter())
            .copied()
            .collect(),
        None => tour.to_vec(),
    }
}

/// Prim minimum spanning tree over the complete weighted graph, returned as
/// multigraph adjacency lists.
fn spanning_tree<W>(count: usize, weight: &W) -> Vec<Vec<usize>>
where
    W: Fn(usize, usize) -> f64,
{
    let mut in_tree = vec![false; count];
    let mut parent = vec![usize::MAX; count];
    let mut key = vec![f64::INFINITY; count];
    key[0] = 0.0;

    for _ in 0..count {
        let mut nearest = None;
        for node in 0..count {
            if in_tree[node] || !key[node].is_finite() {
                continue;
            }
            if nearest.map_or(true, |best: usize| key[node] < key[best]) {
                nearest = Some(node);
            }
        }
        let Some(node) = nearest else {
            break;
        };
        in_tree[node] = true;

        for other in 0..count {
            if in_tree[other] || other == node {
                continue;
            }
            let candidate = weight(node, other);
            if candidate < key[other] {
                key[other] = candidate;
                parent[other] = node;
            }
        }
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); count];
    for node in 1..count {
        let ancestor = parent[node];
        if ancestor != usize::MAX {
            adjacency[node].push(ancestor);
            adjacency[ancestor].push(node);
        }
    }
    adjacency
}

/// Hierholzer walk over a connected even-degree multigraph, starting at
/// vertex zero.
fn euler_circuit(mut adjacency: Vec<Vec<usize>>) -> Vec<usize> {
    let mut stack = vec![0usize];
    let mut circuit = Vec::new();

    while let Some(&vertex) = stack.last() {
        match adjacency[vertex].pop() {
            Some(next) => {
                if let Some(position) = adjacency[next].iter().position(|&back| back == vertex) {
                    let _ = adjacency[next].swap_remove(position);
                }
                stack.push(next);
            }
            None => {
                circuit.push(vertex);
                let _ = stack.pop();
            }
        }
    }

    circuit.reverse();
    circuit
}
