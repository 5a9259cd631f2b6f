use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data_types::{Bounds, Obstacle, Point};

/// Subtracted from binary-search queries so obstacles starting exactly at `x` are included.
pub const EPSILON: f64 = 1e-7;

/// Pairs further apart than this do not take part in the margin estimate.
const MAX_MARGIN_DISTANCE: f64 = 80.0;
const TRIAL_MARGIN: f64 = 10.0;

/// A visible element of the chart that connectors must route around.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartElement {
    pub id: String,
    pub bounds: Bounds,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

fn default_visible() -> bool {
    true
}

impl ChartElement {
    pub fn new(id: impl Into<String>, bounds: Bounds) -> Self {
        Self {
            id: id.into(),
            bounds,
            visible: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

/// Largest obstacle extents, used to size the soft routing window.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ObstacleMetrics {
    pub max_width: f64,
    pub max_height: f64,
}

impl ObstacleMetrics {
    pub fn of(obstacles: &[Obstacle]) -> Self {
        obstacles.iter().fold(Self::default(), |acc, o| Self {
            max_width: acc.max_width.max(o.width()),
            max_height: acc.max_height.max(o.height()),
        })
    }
}

/// Obstacles sorted by `x_min`, with the margin they were inflated by.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObstacleIndex {
    pub obstacles: Vec<Obstacle>,
    pub margin: f64,
    pub metrics: ObstacleMetrics,
}

/// Index of the last obstacle whose `x_min` lies before `x`, searching from `start_ix`.
///
/// Clamped to `0`, so the result is only a starting point for a scan.
pub fn find_last_obstacle_before(obstacles: &[Obstacle], x: f64, start_ix: usize) -> usize {
    let min = x - EPSILON;
    let start_ix = start_ix.min(obstacles.len());
    let after = obstacles[start_ix..].partition_point(|o| o.x_min < min);
    (start_ix + after).saturating_sub(1)
}

pub fn point_within_obstacle(obstacle: &Obstacle, point: Point) -> bool {
    obstacle.contains(point)
}

/// Index of an obstacle containing `point`, if any.
pub fn find_obstacle_from_point(obstacles: &[Obstacle], point: Point) -> Option<usize> {
    if obstacles.is_empty() {
        return None;
    }
    // Nothing past this index starts before the point.
    let upper = (find_last_obstacle_before(obstacles, point.x + 1.0, 0) + 1).min(obstacles.len());
    obstacles[..upper]
        .iter()
        .rposition(|o| o.x_max >= point.x && point_within_obstacle(o, point))
}

/// Gap between two rectangles along the axis on which they do not overlap.
///
/// Rectangles overlapping within `margin` are retried with half the margin;
/// rectangles overlapping outright are infinitely far apart for this purpose.
fn min_distance(a: &Obstacle, b: &Obstacle, margin: f64) -> f64 {
    let y_overlap = a.y_max + margin > b.y_min - margin && a.y_min - margin < b.y_max + margin;
    let x_overlap = a.x_max + margin > b.x_min - margin && a.x_min - margin < b.x_max + margin;

    if x_overlap && y_overlap {
        return if margin > 0.0 {
            min_distance(a, b, (margin / 2.0).floor())
        } else {
            f64::INFINITY
        };
    }

    let x_distance = if y_overlap {
        if a.x_min > b.x_max {
            a.x_min - b.x_max
        } else {
            b.x_min - a.x_max
        }
    } else {
        f64::INFINITY
    };
    let y_distance = if x_overlap {
        if a.y_min > b.y_max {
            a.y_min - b.y_max
        } else {
            b.y_min - a.y_max
        }
    } else {
        f64::INFINITY
    };
    x_distance.min(y_distance)
}

/// Margin estimated from the distances between neighbouring obstacles.
///
/// The closest tenth of the pairs are discarded; the margin is half the next
/// distance minus one pixel, never less than one.
pub fn auto_margin(obstacles: &[Obstacle]) -> f64 {
    let len = obstacles.len();
    let mut distances: Vec<f64> = (0..len)
        .into_par_iter()
        .flat_map_iter(|i| {
            ((i + 1)..len).map(move |j| min_distance(&obstacles[i], &obstacles[j], TRIAL_MARGIN))
        })
        .filter(|d| *d < MAX_MARGIN_DISTANCE)
        .collect();
    distances.push(MAX_MARGIN_DISTANCE);
    distances.sort_by(f64::total_cmp);

    let selected = distances[distances.len() / 10];
    (selected / 2.0 - 1.0).floor().max(1.0)
}

/// Turns the visible elements into obstacles sorted by `x_min`.
///
/// Without an explicit `margin`, one is computed with [`auto_margin`].
pub fn build_obstacles(elements: &[ChartElement], margin: Option<f64>) -> ObstacleIndex {
    let mut obstacles: Vec<Obstacle> = elements
        .iter()
        .filter(|e| e.visible)
        .map(|e| e.bounds)
        .collect();
    obstacles.sort_by(|a, b| a.x_min.total_cmp(&b.x_min));

    let margin = margin.unwrap_or_else(|| auto_margin(&obstacles));
    for obstacle in obstacles.iter_mut() {
        *obstacle = obstacle.inflate(margin);
    }
    let metrics = ObstacleMetrics::of(&obstacles);

    debug!(
        elements = elements.len(),
        obstacles = obstacles.len(),
        margin,
        "built chart obstacles"
    );

    ObstacleIndex {
        obstacles,
        margin,
        metrics,
    }
}
