use tracing::{debug, warn};

use crate::breaks::Break;
use crate::broken_axis::{AxisKind, BrokenAxis};
use crate::data_types::{Record, TreeGridOptions};
use crate::error::{LayoutError, Result};
use crate::tree_grid::{self, GridNode, GridNodeId, TreeGrid};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollapseAction {
    Collapse,
    Expand,
}

/// Emitted once the break list of the axis has been replaced.
#[derive(Clone, Debug, PartialEq)]
pub struct CollapseEvent {
    pub node: GridNodeId,
    pub action: CollapseAction,
    pub brk: Break,
}

/// Notified after every collapse or expand.
///
/// The axis is handed back mutably so that listeners can read the new
/// layout, but collapsing or expanding from inside the callback fails with
/// [`LayoutError::ReentrantMutation`].
pub trait CollapseListener {
    fn breaks_changed(&mut self, axis: &mut TreeGridAxis, event: &CollapseEvent);
}

impl<F> CollapseListener for F
where
    F: FnMut(&mut TreeGridAxis, &CollapseEvent),
{
    fn breaks_changed(&mut self, axis: &mut TreeGridAxis, event: &CollapseEvent) {
        self(axis, event)
    }
}

/// A category axis whose rows come from a record tree and whose collapsed
/// sub-trees are hidden with breaks.
pub struct TreeGridAxis {
    grid: TreeGrid,
    axis: BrokenAxis,
    options: TreeGridOptions,
    listener: Option<Box<dyn CollapseListener>>,
    in_mutation: bool,
}

impl std::fmt::Debug for TreeGridAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeGridAxis")
            .field("grid", &self.grid)
            .field("axis", &self.axis)
            .field("options", &self.options)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

impl TreeGridAxis {
    pub fn new(records: &[Record], options: TreeGridOptions) -> Self {
        let mut axis = Self {
            grid: TreeGrid::map_to_grid(&[], false, 1),
            axis: BrokenAxis::new(AxisKind::Category, 0.0, 0.0),
            options,
            listener: None,
            in_mutation: false,
        };
        axis.set_data(records);
        axis
    }

    /// Rebuilds the grid from `records`. Breaks are reset to the rows the
    /// records mark as collapsed.
    pub fn set_data(&mut self, records: &[Record]) {
        self.grid = TreeGrid::build(records, &self.options);

        let max = match self.options.max {
            Some(max) if max.is_finite() => max,
            _ => self.grid.last_slot(),
        }
        .max(0.0);
        self.axis.set_extremes(0.0, max);

        let breaks = self
            .grid
            .collapsed_nodes()
            .iter()
            .filter_map(|id| self.grid.node(*id))
            .fold(Vec::new(), |breaks, node| tree_grid::collapse(&breaks, node));
        debug!(
            rows = self.grid.categories().len(),
            collapsed = breaks.len(),
            max,
            "tree grid axis data set"
        );
        self.axis.set_breaks(breaks);
    }

    pub fn grid(&self) -> &TreeGrid {
        &self.grid
    }

    pub fn axis(&self) -> &BrokenAxis {
        &self.axis
    }

    pub fn options(&self) -> &TreeGridOptions {
        &self.options
    }

    pub fn categories(&self) -> &[String] {
        self.grid.categories()
    }

    pub fn set_listener(&mut self, listener: impl CollapseListener + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn clear_listener(&mut self) {
        self.listener = None;
    }

    pub fn is_collapsed(&self, id: GridNodeId) -> bool {
        self.grid
            .node(id)
            .is_some_and(|node| tree_grid::is_collapsed(self.axis.breaks(), node))
    }

    pub fn collapse(&mut self, id: GridNodeId) -> Result<Break> {
        self.mutate(id, CollapseAction::Collapse)
    }

    pub fn expand(&mut self, id: GridNodeId) -> Result<Break> {
        self.mutate(id, CollapseAction::Expand)
    }

    /// Collapses or expands `id`. Returns whether the row ends up collapsed.
    pub fn toggle_collapse(&mut self, id: GridNodeId) -> Result<bool> {
        let action = if self.is_collapsed(id) {
            CollapseAction::Expand
        } else {
            CollapseAction::Collapse
        };
        self.mutate(id, action)?;
        Ok(action == CollapseAction::Collapse)
    }

    /// Positions of the visible rows within the extremes, ascending.
    pub fn tick_positions(&self) -> Vec<f64> {
        let (min, max) = self.axis.extremes();
        let mut ticks: Vec<f64> = self
            .grid
            .nodes()
            .iter()
            .filter(|node| !node.is_root())
            .map(|node| node.pos)
            .filter(|&pos| pos >= min && pos <= max)
            .filter(|&pos| !self.axis.is_in_any_break(pos, false))
            .collect();
        ticks.sort_by(f64::total_cmp);
        ticks
    }

    /// Whether the row at `pos` is visible: not hidden by a collapsed ancestor.
    pub fn is_row_visible(&self, pos: f64) -> bool {
        !self.axis.is_in_any_break(pos, true)
    }

    fn mutate(&mut self, id: GridNodeId, action: CollapseAction) -> Result<Break> {
        if self.in_mutation {
            warn!(node = id.0, ?action, "rejected collapse state change from a listener");
            return Err(LayoutError::ReentrantMutation);
        }

        let (brk, breaks) = {
            let node: &GridNode = self
                .grid
                .node(id)
                .ok_or(LayoutError::UnknownGridNode { id: id.0 })?;
            let breaks = match action {
                CollapseAction::Collapse => tree_grid::collapse(self.axis.breaks(), node),
                CollapseAction::Expand => tree_grid::expand(self.axis.breaks(), node),
            };
            (tree_grid::break_from_node(node), breaks)
        };

        debug!(
            node = id.0,
            ?action,
            from = brk.from,
            to = brk.to,
            "tree grid collapse state changed"
        );

        self.in_mutation = true;
        self.axis.set_breaks(breaks);
        if let Some(mut listener) = self.listener.take() {
            let event = CollapseEvent {
                node: id,
                action,
                brk: brk.clone(),
            };
            listener.breaks_changed(self, &event);
            if self.listener.is_none() {
                self.listener = Some(listener);
            }
        }
        self.in_mutation = false;

        Ok(brk)
    }
}
