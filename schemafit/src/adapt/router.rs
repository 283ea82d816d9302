//! Wire routing between pins.
//!
//! Short connections get a grid-based shortest-path search over the
//! diagram's coordinate space, treating chip bodies and existing wires
//! as blocked cells; the search departs along the source pin's facing
//! and prefers the fewest direction changes among equal-length paths.
//! Connections longer than the search threshold, and searches that
//! fail, fall back to a lead-out plus straight/elbow route without
//! obstacle avoidance: long connections read better as straight runs
//! than as exhaustive detours.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::geom::{Facing, ModelError, PinRef, Point, Rect, Schematic};

/// Routing policy knobs. The defaults preserve the observed behavior
/// of the reference design; they are policy constants, not derived
/// values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Maximum source-to-target Manhattan distance for which the grid
    /// search is attempted, in diagram units.
    pub max_search_distance: i32,
    /// How far a wire leads out from a pin before turning, in the
    /// fallback route.
    pub lead_out: i32,
    /// Extra margin around the endpoints' bounding box that the grid
    /// search may explore.
    pub search_margin: i32,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_search_distance: 10,
            lead_out: 1,
            search_margin: 2,
        }
    }
}

/// How a route was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteKind {
    /// Grid search around obstacles.
    Grid,
    /// Straight/elbow heuristic without obstacle avoidance.
    Fallback,
}

/// A routed polyline between two pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub points: Vec<Point>,
    pub kind: RouteKind,
}

impl Route {
    /// Number of direction changes along the polyline.
    pub fn turn_count(&self) -> usize {
        self.points.len().saturating_sub(2)
    }
}

/// Route a wire between two pins. Returns `None` for degenerate
/// (coincident) endpoints, which the applier records as an issue
/// rather than a failure.
pub fn route(
    model: &Schematic,
    from: &PinRef,
    to: &PinRef,
    config: &RouterConfig,
) -> Result<Option<Route>, ModelError> {
    let from_pos = model.pin_position(from)?;
    let to_pos = model.pin_position(to)?;
    let from_facing = model.pin_facing(from)?;
    let to_facing = model.pin_facing(to)?;

    if from_pos == to_pos {
        return Ok(None);
    }

    let distance = from_pos.manhattan_distance(&to_pos);
    if distance <= config.max_search_distance {
        if let Some(points) = grid_search(model, from_pos, from_facing, to_pos, to_facing, config) {
            return Ok(Some(Route {
                points,
                kind: RouteKind::Grid,
            }));
        }
        tracing::debug!(%from, %to, "grid search failed, using fallback route");
    } else {
        tracing::debug!(
            %from,
            %to,
            distance,
            threshold = config.max_search_distance,
            "connection exceeds search bound, using fallback route"
        );
    }

    Ok(Some(Route {
        points: fallback_route(from_pos, from_facing, to_pos, to_facing, config),
        kind: RouteKind::Fallback,
    }))
}

/// Search state: a cell plus the direction the wire entered it with.
#[derive(Clone, Copy, PartialEq, Eq)]
struct SearchNode {
    /// (path length, turns), compared lexicographically.
    cost: (u32, u32),
    /// Insertion sequence; equal-cost states pop in insertion order.
    seq: u64,
    pos: Point,
    dir: Facing,
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const DIRECTIONS: [Facing; 4] = [Facing::Left, Facing::Right, Facing::Up, Facing::Down];

/// Grid Dijkstra over (cell, direction) states. Cost is (length,
/// turns) so among equal-length paths the one with fewer bends wins;
/// the source state is seeded along the pin's facing, which realizes
/// the "extend in the source facing first" tie-break.
fn grid_search(
    model: &Schematic,
    from_pos: Point,
    from_facing: Facing,
    to_pos: Point,
    to_facing: Facing,
    config: &RouterConfig,
) -> Option<Vec<Point>> {
    let blocked: HashSet<Point> = model.blocked_cells();

    let endpoints = Rect {
        min: Point::new(from_pos.x.min(to_pos.x), from_pos.y.min(to_pos.y)),
        max: Point::new(from_pos.x.max(to_pos.x), from_pos.y.max(to_pos.y)),
    };
    let region = endpoints.expanded(config.max_search_distance + config.search_margin);

    let mut heap = BinaryHeap::new();
    let mut best: HashMap<(Point, Facing), (u32, u32)> = HashMap::new();
    let mut came_from: HashMap<(Point, Facing), (Point, Facing)> = HashMap::new();
    let mut seq = 0u64;

    heap.push(SearchNode {
        cost: (0, 0),
        seq,
        pos: from_pos,
        dir: from_facing,
    });
    best.insert((from_pos, from_facing), (0, 0));

    while let Some(node) = heap.pop() {
        if node.pos == to_pos {
            return Some(reconstruct(&came_from, from_pos, (node.pos, node.dir)));
        }
        if best
            .get(&(node.pos, node.dir))
            .map(|&c| c < node.cost)
            .unwrap_or(false)
        {
            continue;
        }

        for next_dir in DIRECTIONS {
            // The departure direction at the source pin is fixed, and
            // the wire never doubles back on itself.
            if node.pos == from_pos && next_dir != from_facing {
                continue;
            }
            if next_dir == node.dir.opposite() {
                continue;
            }

            let (dx, dy) = next_dir.delta();
            let next = node.pos.offset(dx, dy);
            if !region.contains(next) {
                continue;
            }
            if next == to_pos {
                // Arrive head-on against the target pin's facing.
                if next_dir != to_facing.opposite() {
                    continue;
                }
            } else if blocked.contains(&next) {
                continue;
            }

            let turns = node.cost.1 + u32::from(next_dir != node.dir);
            let cost = (node.cost.0 + 1, turns);
            let key = (next, next_dir);
            if best.get(&key).map(|&c| cost < c).unwrap_or(true) {
                best.insert(key, cost);
                came_from.insert(key, (node.pos, node.dir));
                seq += 1;
                heap.push(SearchNode {
                    cost,
                    seq,
                    pos: next,
                    dir: next_dir,
                });
            }
        }
    }

    None
}

fn reconstruct(
    came_from: &HashMap<(Point, Facing), (Point, Facing)>,
    from_pos: Point,
    goal: (Point, Facing),
) -> Vec<Point> {
    let mut points = vec![goal.0];
    let mut current = goal;
    while current.0 != from_pos {
        current = came_from[&current];
        points.push(current.0);
    }
    points.reverse();
    compress(points)
}

/// Lead out from each pin along its facing, then close the remaining
/// gap with a straight or elbow segment. No obstacle avoidance.
fn fallback_route(
    from_pos: Point,
    from_facing: Facing,
    to_pos: Point,
    to_facing: Facing,
    config: &RouterConfig,
) -> Vec<Point> {
    let (fdx, fdy) = from_facing.delta();
    let (tdx, tdy) = to_facing.delta();
    let a = from_pos.offset(fdx * config.lead_out, fdy * config.lead_out);
    let b = to_pos.offset(tdx * config.lead_out, tdy * config.lead_out);

    let mut points = vec![from_pos, a];
    if a.x != b.x && a.y != b.y {
        // Elbow: continue in the source facing's axis first.
        let corner = match from_facing {
            Facing::Left | Facing::Right => Point::new(b.x, a.y),
            Facing::Up | Facing::Down => Point::new(a.x, b.y),
        };
        points.push(corner);
    }
    points.push(b);
    points.push(to_pos);
    compress(points)
}

/// Drop duplicate and collinear intermediate points.
fn compress(points: Vec<Point>) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() == Some(&p) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let collinear = (a.x == b.x && b.x == p.x) || (a.y == b.y && b.y == p.y);
            if collinear {
                *out.last_mut().expect("non-empty") = p;
                continue;
            }
        }
        out.push(p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlist::SidePins;

    fn facing_pair(gap: i32) -> (Schematic, PinRef, PinRef) {
        // Two one-pin-per-side chips facing each other across `gap`
        // units of empty space.
        let mut model = Schematic::new();
        model
            .add_chip("U1", SidePins::new(0, 1, 0, 0), Point::new(0, 0))
            .unwrap();
        let right_edge = model.chip("U1").unwrap().bounds().max.x;
        model
            .add_chip(
                "U2",
                SidePins::new(1, 0, 0, 0),
                Point::new(right_edge + gap, 0),
            )
            .unwrap();
        (model, PinRef::new("U1", 1), PinRef::new("U2", 1))
    }

    #[test]
    fn short_connection_uses_grid_search() {
        let (model, from, to) = facing_pair(6);
        let route = route(&model, &from, &to, &RouterConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(route.kind, RouteKind::Grid);
        // Straight shot: two points, no turns.
        assert_eq!(route.points.len(), 2);
        assert_eq!(route.turn_count(), 0);
    }

    #[test]
    fn long_connection_falls_back() {
        let (model, from, to) = facing_pair(16);
        let route = route(&model, &from, &to, &RouterConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(route.kind, RouteKind::Fallback);
        // Aligned pins compress to a single straight run.
        assert_eq!(route.points.len(), 2);
    }

    #[test]
    fn grid_search_detours_around_obstacles() {
        let (mut model, from, to) = facing_pair(8);
        // Drop a blocking chip squarely between the two pins.
        let from_pos = model.pin_position(&from).unwrap();
        model
            .add_chip(
                "X1",
                SidePins::new(0, 0, 0, 0),
                Point::new(from_pos.x + 2, from_pos.y - 2),
            )
            .unwrap();

        let cfg = RouterConfig {
            max_search_distance: 20,
            ..RouterConfig::default()
        };
        let routed = route(&model, &from, &to, &cfg).unwrap().unwrap();
        assert_eq!(routed.kind, RouteKind::Grid);
        assert!(routed.turn_count() >= 2, "path must bend around the obstacle");

        let blocked = model.blocked_cells();
        for pair in routed.points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let dx = (b.x - a.x).signum();
            let dy = (b.y - a.y).signum();
            let mut p = a;
            while p != b {
                p = p.offset(dx, dy);
                let interior = p != a && p != b;
                if interior {
                    assert!(!blocked.contains(&p), "route crosses blocked cell {p:?}");
                }
            }
        }
    }

    #[test]
    fn coincident_pins_yield_no_route() {
        let mut model = Schematic::new();
        model
            .add_chip("U1", SidePins::new(1, 1, 0, 0), Point::new(0, 0))
            .unwrap();
        let from = PinRef::new("U1", 1);
        assert!(route(&model, &from, &from, &RouterConfig::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn unknown_pin_is_a_hard_error() {
        let (model, from, _) = facing_pair(6);
        let missing = PinRef::new("U9", 1);
        assert!(route(&model, &from, &missing, &RouterConfig::default()).is_err());
    }
}
