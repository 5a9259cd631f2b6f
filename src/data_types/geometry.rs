use serde::{Deserialize, Serialize};

/// A point in plot-pixel space.
pub type Point = glam::DVec2;

/// Travel axis of a path segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    X,
    Y,
}

impl Direction {
    pub fn from_is_x(is_x: bool) -> Self {
        if is_x {
            Self::X
        } else {
            Self::Y
        }
    }

    pub fn is_x(self) -> bool {
        self == Self::X
    }

    pub fn flip(self) -> Self {
        match self {
            Self::X => Self::Y,
            Self::Y => Self::X,
        }
    }

    /// Coordinate of `point` along this axis.
    pub fn of(self, point: Point) -> f64 {
        match self {
            Self::X => point.x,
            Self::Y => point.y,
        }
    }

    /// Copy of `point` with the coordinate along this axis replaced.
    pub fn with(self, point: Point, value: f64) -> Point {
        match self {
            Self::X => Point::new(value, point.y),
            Self::Y => Point::new(point.x, value),
        }
    }
}

/// Axis-aligned rectangle in plot-pixel space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Obstacles are plain rectangles that routed connectors avoid.
pub type Obstacle = Bounds;

impl Bounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// Builds bounds from an origin and a size, the way a renderer reports a bounding box.
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, x + width, y, y + height)
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    pub fn min(&self, dir: Direction) -> f64 {
        match dir {
            Direction::X => self.x_min,
            Direction::Y => self.y_min,
        }
    }

    pub fn max(&self, dir: Direction) -> f64 {
        match dir {
            Direction::X => self.x_max,
            Direction::Y => self.y_max,
        }
    }

    /// Inclusive containment test, edges count as inside.
    pub fn contains(&self, point: Point) -> bool {
        point.x <= self.x_max
            && point.x >= self.x_min
            && point.y <= self.y_max
            && point.y >= self.y_min
    }

    pub fn inflate(&self, margin: f64) -> Self {
        Self::new(
            self.x_min - margin,
            self.x_max + margin,
            self.y_min - margin,
            self.y_max + margin,
        )
    }

    /// Intersection with `limits`, each edge cut independently.
    pub fn clipped_to(&self, limits: &Bounds) -> Self {
        Self::new(
            self.x_min.max(limits.x_min),
            self.x_max.min(limits.x_max),
            self.y_min.max(limits.y_min),
            self.y_max.min(limits.y_max),
        )
    }

    pub fn clamp_point(&self, point: Point) -> Point {
        Point::new(
            point.x.max(self.x_min).min(self.x_max),
            point.y.max(self.y_min).min(self.y_max),
        )
    }
}

/// One straight piece of a routed connector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    /// True when the segment runs parallel to one of the axes.
    pub fn is_axis_aligned(&self) -> bool {
        self.start.x == self.end.x || self.start.y == self.end.y
    }
}
