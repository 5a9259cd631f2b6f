use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

use super::geometry::{Bounds, Point};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeGridOptions {
    /// Merge sibling rows that carry the same name into one row.
    pub unique_names: bool,
    /// Fixed axis maximum. When it exceeds the data, placeholder rows pad the category list.
    pub max: Option<f64>,
    /// Number of series sharing the axis; each row reserves one slot per series.
    pub series_count: usize,
}

impl Default for TreeGridOptions {
    fn default() -> Self {
        Self {
            unique_names: false,
            max: None,
            series_count: 1,
        }
    }
}

impl TreeGridOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("failed to parse tree grid options")
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HorizontalAlign {
    Left,
    #[default]
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VerticalAlign {
    Top,
    #[default]
    Middle,
    Bottom,
}

/// Where on an element's bounding box a connector attaches.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerAnchor {
    pub align: HorizontalAlign,
    pub vertical_align: VerticalAlign,
}

impl MarkerAnchor {
    pub fn new(align: HorizontalAlign, vertical_align: VerticalAlign) -> Self {
        Self {
            align,
            vertical_align,
        }
    }

    pub fn anchor_point(&self, bounds: &Bounds) -> Point {
        let x = match self.align {
            HorizontalAlign::Left => bounds.x_min,
            HorizontalAlign::Center => (bounds.x_min + bounds.x_max) / 2.0,
            HorizontalAlign::Right => bounds.x_max,
        };
        let y = match self.vertical_align {
            VerticalAlign::Top => bounds.y_min,
            VerticalAlign::Middle => (bounds.y_min + bounds.y_max) / 2.0,
            VerticalAlign::Bottom => bounds.y_max,
        };
        Point::new(x, y)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PathfinderOptions {
    /// Name of the routing algorithm. Resolved when a route is requested so an
    /// unknown name surfaces as a routing error, not a parse error.
    #[serde(rename = "type")]
    pub algorithm: String,
    /// Explicit obstacle margin. `None` lets the pathfinder compute one.
    pub algorithm_margin: Option<f64>,
    /// Force the initial routing axis. `None` picks the axis with the larger delta.
    pub start_direction_x: Option<bool>,
    pub start_marker: MarkerAnchor,
    pub end_marker: MarkerAnchor,
}

impl Default for PathfinderOptions {
    fn default() -> Self {
        Self {
            algorithm: "straight".to_string(),
            algorithm_margin: None,
            start_direction_x: None,
            // Dependencies run from the end of the predecessor to the start of the successor.
            start_marker: MarkerAnchor::new(HorizontalAlign::Right, VerticalAlign::Middle),
            end_marker: MarkerAnchor::new(HorizontalAlign::Left, VerticalAlign::Middle),
        }
    }
}

impl PathfinderOptions {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).wrap_err("failed to parse pathfinder options")
    }

    pub fn with_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    pub fn with_margin(mut self, margin: f64) -> Self {
        self.algorithm_margin = Some(margin);
        self
    }

    pub fn with_start_direction_x(mut self, start_direction_x: bool) -> Self {
        self.start_direction_x = Some(start_direction_x);
        self
    }
}
