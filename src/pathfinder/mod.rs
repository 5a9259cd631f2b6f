//! Routes dependency connectors between chart elements.

pub mod algorithms;
pub mod obstacles;

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{trace, warn};

use crate::data_types::{Bounds, PathfinderOptions, Point, Segment};
use crate::error::{LayoutError, Result};

pub use algorithms::{route, Algorithm, RouteContext, RouteResult};
pub use obstacles::{
    auto_margin, build_obstacles, find_last_obstacle_before, find_obstacle_from_point,
    point_within_obstacle, ChartElement, ObstacleIndex, ObstacleMetrics,
};

/// Connector router for one chart.
///
/// Obstacles are derived from the elements on first use and kept until the
/// elements, the options or the plot area change, or [`Pathfinder::invalidate`]
/// starts a new redraw cycle.
#[derive(Debug)]
pub struct Pathfinder {
    elements: Vec<ChartElement>,
    hard_bounds: Bounds,
    options: PathfinderOptions,
    generation: u64,
    memo: RwLock<Option<(u64, Arc<ObstacleIndex>)>>,
    line_obstacles: Vec<Segment>,
}

impl Clone for Pathfinder {
    fn clone(&self) -> Self {
        Self {
            elements: self.elements.clone(),
            hard_bounds: self.hard_bounds,
            options: self.options.clone(),
            generation: self.generation,
            memo: RwLock::new(self.memo.read().clone()),
            line_obstacles: self.line_obstacles.clone(),
        }
    }
}

impl Pathfinder {
    pub fn new(hard_bounds: Bounds, options: PathfinderOptions) -> Self {
        Self {
            elements: Vec::new(),
            hard_bounds,
            options,
            generation: 0,
            memo: RwLock::new(None),
            line_obstacles: Vec::new(),
        }
    }

    pub fn elements(&self) -> &[ChartElement] {
        &self.elements
    }

    pub fn set_elements(&mut self, elements: Vec<ChartElement>) {
        self.elements = elements;
        self.invalidate();
    }

    pub fn hard_bounds(&self) -> Bounds {
        self.hard_bounds
    }

    pub fn set_hard_bounds(&mut self, hard_bounds: Bounds) {
        self.hard_bounds = hard_bounds;
        self.invalidate();
    }

    pub fn options(&self) -> &PathfinderOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: PathfinderOptions) {
        self.options = options;
        self.invalidate();
    }

    /// Drops the cached obstacles and the segments of previously routed connectors.
    pub fn invalidate(&mut self) {
        self.generation += 1;
        self.line_obstacles.clear();
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Obstacles of the visible elements, rebuilt lazily.
    pub fn obstacles(&self) -> Arc<ObstacleIndex> {
        if let Some((generation, index)) = self.memo.read().as_ref() {
            if *generation == self.generation {
                return index.clone();
            }
        }
        let index = Arc::new(build_obstacles(&self.elements, self.options.algorithm_margin));
        *self.memo.write() = Some((self.generation, index.clone()));
        index
    }

    /// Segments of every connector routed since the last invalidation.
    pub fn line_obstacles(&self) -> &[Segment] {
        &self.line_obstacles
    }

    /// Routes with the algorithm named `algorithm`.
    pub fn route(&mut self, algorithm: &str, start: Point, end: Point) -> Result<RouteResult> {
        let algorithm = algorithm.parse::<Algorithm>().inspect_err(|err| {
            warn!(%err, "cannot route connector");
        })?;

        let index = if algorithm.requires_obstacles() {
            self.obstacles()
        } else {
            Arc::new(ObstacleIndex::default())
        };
        let ctx = RouteContext {
            obstacles: &index.obstacles,
            metrics: index.metrics,
            margin: index.margin,
            hard_bounds: self.hard_bounds,
            start_direction_x: self.options.start_direction_x,
        };

        let result = algorithms::route(algorithm, start, end, &ctx);
        trace!(
            %algorithm,
            ?start,
            ?end,
            segments = result.obstacles.len(),
            "routed connector"
        );
        self.line_obstacles.extend(result.obstacles.iter().copied());
        Ok(result)
    }

    /// Routes with the configured algorithm, degrading to an empty path on error.
    pub fn route_or_empty(&mut self, start: Point, end: Point) -> RouteResult {
        let algorithm = self.options.algorithm.clone();
        self.route(&algorithm, start, end)
            .unwrap_or_else(|_| RouteResult::empty())
    }

    /// Routes from the start anchor of element `from_id` to the end anchor of `to_id`.
    pub fn connect(&mut self, from_id: &str, to_id: &str) -> Result<RouteResult> {
        let start = self.anchor(from_id, true)?;
        let end = self.anchor(to_id, false)?;
        let algorithm = self.options.algorithm.clone();
        self.route(&algorithm, start, end)
    }

    fn anchor(&self, id: &str, is_start: bool) -> Result<Point> {
        let element = self
            .elements
            .iter()
            .find(|e| e.id == id)
            .ok_or_else(|| LayoutError::UnknownElement { id: id.to_string() })?;
        let marker = if is_start {
            &self.options.start_marker
        } else {
            &self.options.end_marker
        };
        Ok(marker.anchor_point(&element.bounds))
    }
}
