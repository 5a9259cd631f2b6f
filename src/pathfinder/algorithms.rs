//! Connector routing algorithms.
//!
//! Every algorithm takes two points in plot-pixel space and returns the
//! polyline between them plus the segments it consists of, which later
//! connectors may treat as obstacles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::obstacles::{find_last_obstacle_before, find_obstacle_from_point, ObstacleMetrics};
use crate::data_types::{Bounds, Direction, Obstacle, Point, Segment};
use crate::error::LayoutError;

/// Soft bounds reach this far past the widest/tallest obstacle.
const SOFT_BOUNDS_PADDING: f64 = 10.0;
/// Boundaries closer than this count as equally far when dodging.
const DODGE_TIE_DISTANCE: f64 = 10.0;
/// Clearance kept between a bend and the obstacle it avoids.
const CLEARANCE: f64 = 1.0;
/// Budget of path-clearing steps per route.
const MAX_STEPS: usize = 400;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    Straight,
    SimpleConnect,
    FastAvoid,
}

impl Algorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Straight => "straight",
            Self::SimpleConnect => "simpleConnect",
            Self::FastAvoid => "fastAvoid",
        }
    }

    pub fn requires_obstacles(self) -> bool {
        !matches!(self, Self::Straight)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "straight" => Ok(Self::Straight),
            "simpleConnect" => Ok(Self::SimpleConnect),
            "fastAvoid" => Ok(Self::FastAvoid),
            _ => Err(LayoutError::UnknownAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

/// Chart state an algorithm routes against.
#[derive(Clone, Copy, Debug)]
pub struct RouteContext<'a> {
    /// Obstacles sorted by `x_min`.
    pub obstacles: &'a [Obstacle],
    pub metrics: ObstacleMetrics,
    /// Margin the obstacles were inflated by.
    pub margin: f64,
    /// Plot area. Routed points never leave it.
    pub hard_bounds: Bounds,
    /// Force the first travel axis. `None` picks the axis with the larger delta.
    pub start_direction_x: Option<bool>,
}

impl RouteContext<'_> {
    fn initial_direction_is_x(&self, start: Point, end: Point) -> bool {
        self.start_direction_x
            .unwrap_or_else(|| (end.x - start.x).abs() > (end.y - start.y).abs())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RouteResult {
    pub path: Vec<Point>,
    /// Segments of the path, for later connectors to avoid.
    pub obstacles: Vec<Segment>,
}

impl RouteResult {
    /// Result of a failed routing request.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    fn from_segments(segments: Vec<Segment>, start: Point, end: Point) -> Self {
        let path = path_from_segments(&segments, start, end);
        let obstacles = segments.into_iter().filter(|s| !s.is_degenerate()).collect();
        Self { path, obstacles }
    }
}

/// Polyline through the segments. Zero-length segments add no point.
pub fn path_from_segments(segments: &[Segment], start: Point, end: Point) -> Vec<Point> {
    let Some(first) = segments.first() else {
        return vec![start, end];
    };
    let mut path = vec![first.start];
    for segment in segments {
        if path.last() != Some(&segment.end) {
            path.push(segment.end);
        }
    }
    if path.len() == 1 {
        path.push(first.start);
    }
    path
}

pub fn route(
    algorithm: Algorithm,
    start: Point,
    end: Point,
    ctx: &RouteContext<'_>,
) -> RouteResult {
    match algorithm {
        Algorithm::Straight => straight(start, end),
        Algorithm::SimpleConnect => simple_connect(start, end, ctx),
        Algorithm::FastAvoid => fast_avoid(start, end, ctx),
    }
}

pub fn straight(start: Point, end: Point) -> RouteResult {
    RouteResult {
        path: vec![start, end],
        obstacles: vec![Segment::new(start, end)],
    }
}

fn edge(obstacle: &Obstacle, dir: Direction, use_max: bool) -> f64 {
    if use_max {
        obstacle.max(dir) + CLEARANCE
    } else {
        obstacle.min(dir) - CLEARANCE
    }
}

/// Moves `point` just outside `obstacle` along `dir`, towards the nearer edge.
fn get_me_out(obstacle: &Obstacle, point: Point, dir: Direction) -> Point {
    let v = dir.of(point);
    let use_max = (v - obstacle.min(dir)).abs() > (v - obstacle.max(dir)).abs();
    dir.with(point, edge(obstacle, dir, use_max))
}

/// Escapes the start and end obstacles, then connects with at most two bends.
/// Intermediate obstacles are ignored.
pub fn simple_connect(start: Point, end: Point, ctx: &RouteContext<'_>) -> RouteResult {
    let obstacles = ctx.obstacles;
    let mut dir = Direction::from_is_x(ctx.initial_direction_is_x(start, end));
    let mut segments = Vec::new();

    let (end_point, end_segment) = match find_obstacle_from_point(obstacles, end) {
        Some(ix) => {
            let waypoint = get_me_out(&obstacles[ix], end, dir);
            (waypoint, Some(Segment::new(waypoint, end)))
        }
        None => (end, None),
    };

    if let Some(ix) = find_obstacle_from_point(obstacles, start) {
        let start_obstacle = &obstacles[ix];
        let waypoint = get_me_out(start_obstacle, start, dir);
        segments.push(Segment::new(start, waypoint));

        // Heading back past the start: go around the start obstacle first.
        if (dir.of(waypoint) >= dir.of(start)) == (dir.of(waypoint) >= dir.of(end_point)) {
            dir = dir.flip();
            let use_max = dir.of(start) < dir.of(end);
            let around = dir.with(waypoint, edge(start_obstacle, dir, use_max));
            segments.push(Segment::new(waypoint, around));
            dir = dir.flip();
        }
    }

    let previous = segments.last().map_or(start, |s| s.end);
    let waypoint = dir.with(previous, dir.of(end_point));
    segments.push(Segment::new(previous, waypoint));

    dir = dir.flip();
    let waypoint2 = dir.with(waypoint, dir.of(end_point));
    segments.push(Segment::new(waypoint, waypoint2));

    segments.extend(end_segment);
    RouteResult::from_segments(segments, start, end)
}

/// Where a straight run stops, and the obstacle that stopped it.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Pivot {
    point: Point,
    obstacle: Option<Obstacle>,
}

/// State carried across the recursive path clearing.
#[derive(Clone, Copy, Debug, Default)]
struct RoutingState {
    /// Set when the last escape between two obstacles went nowhere.
    force_obstacle_break: bool,
    steps: usize,
}

struct FastAvoidRouter<'a> {
    obstacles: &'a [Obstacle],
    soft: Bounds,
    hard: Bounds,
    margin: f64,
}

impl FastAvoidRouter<'_> {
    /// How far `from` can travel towards `to` along one axis before hitting an obstacle.
    fn pivot_point(&self, from: Point, to: Point, dir_is_x: bool) -> Pivot {
        let clear = Pivot {
            point: to,
            obstacle: None,
        };
        if from == to {
            return clear;
        }

        let (first, last) = if from.x < to.x { (from, to) } else { (to, from) };
        let (lowest, highest) = if from.y < to.y { (from, to) } else { (to, from) };
        let dir = Direction::from_is_x(dir_is_x);
        let forward = dir.of(from) < dir.of(to);

        // No obstacle past this index starts before the run ends.
        let upper = self.obstacles.partition_point(|o| o.x_min <= last.x);
        let blocking = self.obstacles[..upper]
            .iter()
            .filter(|o| o.x_max >= first.x && o.y_min <= highest.y && o.y_max >= lowest.y);

        // The nearest obstacle along the travel direction stops the run.
        let nearest = if forward {
            blocking.min_by(|a, b| a.min(dir).total_cmp(&b.min(dir)))
        } else {
            blocking.max_by(|a, b| a.max(dir).total_cmp(&b.max(dir)))
        };

        match nearest {
            Some(obstacle) => {
                let stop = if forward {
                    obstacle.min(dir) - CLEARANCE
                } else {
                    obstacle.max(dir) + CLEARANCE
                };
                Pivot {
                    point: self.hard.clamp_point(dir.with(from, stop)),
                    obstacle: Some(*obstacle),
                }
            }
            None => clear,
        }
    }

    /// Whether to pass `obstacle` on its max side along `dir_is_x`.
    ///
    /// Prefers the nearer side, or the side towards `to` when both are about
    /// as near. A side blocked by another obstacle, or lying outside the soft
    /// and then the hard bounds, is avoided when the other one is not.
    fn dodge_direction(
        &self,
        obstacle: &Obstacle,
        from: Point,
        to: Point,
        dir_is_x: bool,
        soft: &Bounds,
        hard: &Bounds,
    ) -> bool {
        let dir = Direction::from_is_x(dir_is_x);
        let (o_min, o_max) = (obstacle.min(dir), obstacle.max(dir));

        let min_distance = (o_min - dir.of(from)).abs();
        let max_distance = (o_max - dir.of(from)).abs();
        let mut use_max = if (min_distance - max_distance).abs() < DODGE_TIE_DISTANCE {
            dir.of(from) < dir.of(to)
        } else {
            max_distance < min_distance
        };

        let to_min = dir.with(from, o_min);
        let to_max = dir.with(from, o_max);
        let min_blocked = dir.of(self.pivot_point(from, to_min, dir_is_x).point) != o_min;
        let max_blocked = dir.of(self.pivot_point(from, to_max, dir_is_x).point) != o_max;
        use_max = prefer_side(min_blocked, max_blocked, use_max);

        use_max = prefer_side(o_min <= soft.min(dir), o_max >= soft.max(dir), use_max);
        prefer_side(o_min <= hard.min(dir), o_max >= hard.max(dir), use_max)
    }

    /// Point just outside `obstacle` on the side nearest to `point`.
    fn extract_from_obstacle(&self, obstacle: &Obstacle, point: Point, goal: Point) -> Point {
        let dir_is_x = (obstacle.x_max - point.x).min(point.x - obstacle.x_min)
            < (obstacle.y_max - point.y).min(point.y - obstacle.y_min);
        let use_max =
            self.dodge_direction(obstacle, point, goal, dir_is_x, &self.hard, &self.hard);
        let dir = Direction::from_is_x(dir_is_x);
        self.hard.clamp_point(dir.with(point, edge(obstacle, dir, use_max)))
    }

    /// Segments from `from` to `to`, starting along `dir_is_x` and turning
    /// around every obstacle met on the way.
    fn clear_path_to(
        &self,
        from: Point,
        to: Point,
        dir_is_x: bool,
        state: &mut RoutingState,
    ) -> Vec<Segment> {
        if from == to {
            return Vec::new();
        }
        let dir = Direction::from_is_x(dir_is_x);
        state.steps += 1;
        if state.steps > MAX_STEPS {
            if state.steps == MAX_STEPS + 1 {
                warn!(?from, ?to, "fastAvoid step limit reached, closing path");
            }
            let corner = dir.with(from, dir.of(to));
            return vec![Segment::new(from, corner), Segment::new(corner, to)];
        }

        let mut dir_is_x = dir_is_x;
        let mut segments;

        if let Some(ix) = find_obstacle_from_point(self.obstacles, from) {
            // Inside an obstacle: leave it by the preferred edge first.
            let enveloping = self.obstacles[ix];
            let use_max =
                self.dodge_direction(&enveloping, from, to, dir_is_x, &self.soft, &self.hard);
            let enveloping = enveloping.clipped_to(&self.hard);
            let mut waypoint = dir.with(from, edge(&enveloping, dir, use_max));

            if let Some(jx) = find_obstacle_from_point(self.obstacles, waypoint) {
                // Landed in a neighbour: stop halfway between the two.
                let second = self.obstacles[jx].clipped_to(&self.hard);
                let between = if use_max {
                    (enveloping.max(dir) - self.margin + CLEARANCE)
                        .max((second.min(dir) + enveloping.max(dir)) / 2.0)
                } else {
                    (enveloping.min(dir) + self.margin - CLEARANCE)
                        .min((second.max(dir) + enveloping.min(dir)) / 2.0)
                };
                waypoint = dir.with(waypoint, between);

                if waypoint == from {
                    if state.force_obstacle_break {
                        let through = if use_max {
                            enveloping.max(dir).max(second.max(dir)) + CLEARANCE
                        } else {
                            enveloping.min(dir).min(second.min(dir)) - CLEARANCE
                        };
                        waypoint = dir.with(waypoint, through);
                    }
                    state.force_obstacle_break = !state.force_obstacle_break;
                } else {
                    state.force_obstacle_break = false;
                }
            }

            segments = vec![Segment::new(from, self.hard.clamp_point(waypoint))];
        } else {
            let target = dir.with(from, dir.of(to));
            let pivot = self.pivot_point(from, target, dir_is_x);
            segments = vec![Segment::new(from, pivot.point)];

            if let Some(obstacle) = pivot.obstacle.filter(|_| dir.of(pivot.point) != dir.of(to)) {
                // Blocked: dodge along the other axis.
                let use_max = self.dodge_direction(
                    &obstacle,
                    pivot.point,
                    to,
                    !dir_is_x,
                    &self.soft,
                    &self.hard,
                );
                let obstacle = obstacle.clipped_to(&self.hard);
                let across = dir.flip();
                let waypoint = self
                    .hard
                    .clamp_point(across.with(pivot.point, edge(&obstacle, across, use_max)));
                dir_is_x = !dir_is_x;
                segments.extend(self.clear_path_to(pivot.point, waypoint, dir_is_x, state));
            }
        }

        let last = segments.last().map_or(from, |s| s.end);
        segments.extend(self.clear_path_to(last, to, !dir_is_x, state));
        segments
    }
}

/// Chooses `max` when only the min side is bad and `min` when only the max side is.
fn prefer_side(min_bad: bool, max_bad: bool, use_max: bool) -> bool {
    match (min_bad, max_bad) {
        (true, false) => true,
        (false, true) => false,
        _ => use_max,
    }
}

/// Orthogonal routing around every obstacle near the two points.
///
/// Greedy: the path bends at the first obstacle met and dodges on the side
/// that looks best locally. Only obstacles within the soft bounds are
/// considered.
pub fn fast_avoid(start: Point, end: Point, ctx: &RouteContext<'_>) -> RouteResult {
    let dir_is_x = ctx.initial_direction_is_x(start, end);
    let dir = Direction::from_is_x(dir_is_x);
    let metrics = ctx.metrics;

    let soft = Bounds::new(
        start.x.min(end.x) - metrics.max_width - SOFT_BOUNDS_PADDING,
        start.x.max(end.x) + metrics.max_width + SOFT_BOUNDS_PADDING,
        start.y.min(end.y) - metrics.max_height - SOFT_BOUNDS_PADDING,
        start.y.max(end.y) + metrics.max_height + SOFT_BOUNDS_PADDING,
    );

    let window: &[Obstacle] = if ctx.obstacles.is_empty() {
        &[]
    } else {
        let first = find_last_obstacle_before(ctx.obstacles, soft.x_min, 0);
        let last = find_last_obstacle_before(ctx.obstacles, soft.x_max, 0);
        &ctx.obstacles[first..=last]
    };

    let router = FastAvoidRouter {
        obstacles: window,
        soft,
        hard: ctx.hard_bounds,
        margin: ctx.margin,
    };

    let mut goal = end;
    let mut end_segments = Vec::new();
    if let Some(ix) = find_obstacle_from_point(window, goal) {
        let extracted = router.extract_from_obstacle(&window[ix], goal, start);
        end_segments.push(Segment::new(extracted, goal));
        goal = extracted;
    }

    // Still inside an obstacle: push towards the start until free.
    let mut pushes = 0;
    while let Some(ix) = find_obstacle_from_point(window, goal) {
        if pushes > window.len() {
            break;
        }
        let use_max = dir.of(goal) - dir.of(start) < 0.0;
        let extracted = ctx
            .hard_bounds
            .clamp_point(dir.with(goal, edge(&window[ix], dir, use_max)));
        if extracted == goal {
            break;
        }
        end_segments.push(Segment::new(extracted, goal));
        goal = extracted;
        pushes += 1;
    }

    let mut state = RoutingState::default();
    let mut segments = router.clear_path_to(start, goal, dir_is_x, &mut state);
    segments.extend(end_segments.into_iter().rev());

    RouteResult::from_segments(segments, start, end)
}
