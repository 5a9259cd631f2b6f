//! gantt_layout: tree-grid category axes, broken axes and connector routing for Gantt charts

pub mod breaks;
pub mod broken_axis;
pub mod data_types;
pub mod error;
pub mod pathfinder;
pub mod scales;
pub mod tree;
pub mod tree_grid;
pub mod tree_grid_axis;

pub use breaks::{Break, BreakTranslation};
pub use broken_axis::{AxisKind, BrokenAxis};
pub use data_types::{Bounds, PathfinderOptions, Point, Record, Segment, TreeGridOptions};
pub use error::{LayoutError, Result};
pub use pathfinder::{Algorithm, ChartElement, Pathfinder, RouteResult};
pub use scales::AxisScale;
pub use tree::{build_tree, build_tree_with, TreeNode, TreeVisitor};
pub use tree_grid::{GridNode, GridNodeId, TreeGrid};
pub use tree_grid_axis::{CollapseAction, CollapseEvent, CollapseListener, TreeGridAxis};
