//! Flattens the record tree into the rows of a hierarchical category axis.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::breaks::Break;
use crate::data_types::{Record, TreeGridOptions};
use crate::tree::{build_tree_with, TreeNode, TreeVisitor};

/// Name of every placeholder row. It does not print.
pub const PLACEHOLDER_MARK: &str = "\u{200B}";

/// Upper bound on placeholder rows added for a fixed `max`.
pub const MAX_PLACEHOLDER_ROWS: usize = 10_000;

const PADDING: f64 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridNodeId(pub usize);

impl GridNodeId {
    pub const ROOT: GridNodeId = GridNodeId(0);
}

/// One row of the axis, aggregating every record that shares it.
#[derive(Clone, Debug, PartialEq)]
pub struct GridNode {
    pub id: GridNodeId,
    /// Axis position of the row. `-1` for the root.
    pub pos: f64,
    pub depth: usize,
    pub name: String,
    /// Indices of the records shown in this row.
    pub nodes: Vec<usize>,
    pub children: Vec<GridNodeId>,
    pub parent: Option<GridNodeId>,
    pub collapsed: bool,
    /// Start of the interval hidden when this row collapses.
    pub collapse_start: f64,
    /// End of the interval hidden when this row collapses.
    pub collapse_end: f64,
    pub tickmark_offset: f64,
    pub descendants: usize,
    pub height: usize,
    /// First and last integer slot reserved for the row, one per series.
    pub slots: (i64, i64),
    /// Padding row added to reach a fixed axis maximum. Never merged by name.
    pub placeholder: bool,
}

impl GridNode {
    fn new(id: GridNodeId, depth: usize, name: String, parent: Option<GridNodeId>) -> Self {
        Self {
            id,
            pos: -1.0,
            depth,
            name,
            nodes: Vec::new(),
            children: Vec::new(),
            parent,
            collapsed: false,
            collapse_start: 0.0,
            collapse_end: 0.0,
            tickmark_offset: 0.0,
            descendants: 0,
            height: 0,
            slots: (-1, -1),
            placeholder: false,
        }
    }

    pub fn is_root(&self) -> bool {
        self.id == GridNodeId::ROOT
    }

    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

/// Collects `id -> record index` while the tree is built.
#[derive(Default)]
struct IdIndexer {
    ids: HashMap<String, usize>,
}

impl TreeVisitor for IdIndexer {
    fn before(&mut self, node: &mut TreeNode) {
        if let (Some(id), Some(index)) = (node.id.as_ref(), node.index) {
            self.ids.entry(id.clone()).or_insert(index);
        }
    }
}

/// The rows of a tree-grid axis.
#[derive(Clone, Debug)]
pub struct TreeGrid {
    nodes: Vec<GridNode>,
    slots: BTreeMap<i64, GridNodeId>,
    categories: Vec<String>,
    collapsed_nodes: Vec<GridNodeId>,
    ids: HashMap<String, usize>,
    record_nodes: Vec<Option<GridNodeId>>,
    record_rows: Vec<Option<f64>>,
    series_indices: Vec<usize>,
    /// Records at or past this index are placeholders.
    placeholders_from: usize,
    tree: TreeNode,
}

impl TreeGrid {
    /// Maps `records` with the options of the axis, padding with placeholder
    /// rows when a fixed `max` exceeds the data.
    pub fn build(records: &[Record], options: &TreeGridOptions) -> Self {
        let grid = Self::map_to_grid(records, options.unique_names, options.series_count);
        let Some(max) = options.max else {
            return grid;
        };

        let series = options.series_count.max(1) as f64;
        let last_slot = grid.last_slot();
        if max.is_nan() || max <= last_slot {
            return grid;
        }
        let wanted = ((max - last_slot) / series).ceil();
        if wanted > MAX_PLACEHOLDER_ROWS as f64 {
            warn!(max, wanted, "fixed max needs too many placeholder rows, capping");
        }
        let missing = wanted.min(MAX_PLACEHOLDER_ROWS as f64) as usize;

        let mut padded = records.to_vec();
        padded.extend((0..missing).map(|_| Record::anonymous().with_name(PLACEHOLDER_MARK)));
        debug!(missing, max, "padding tree grid with placeholder rows");
        Self::map_records(&padded, records.len(), options.unique_names, options.series_count)
    }

    pub fn map_to_grid(records: &[Record], unique_names: bool, series_count: usize) -> Self {
        Self::map_records(records, records.len(), unique_names, series_count)
    }

    fn map_records(
        records: &[Record],
        placeholders_from: usize,
        unique_names: bool,
        series_count: usize,
    ) -> Self {
        let mut indexer = IdIndexer::default();
        let mut tree = build_tree_with(records, &mut indexer);

        let mut grid = Self {
            nodes: vec![GridNode::new(GridNodeId::ROOT, 0, String::new(), None)],
            slots: BTreeMap::new(),
            categories: Vec::new(),
            collapsed_nodes: Vec::new(),
            ids: indexer.ids,
            record_nodes: vec![None; records.len()],
            record_rows: vec![None; records.len()],
            series_indices: records.iter().map(|r| r.series_index).collect(),
            placeholders_from,
            tree: TreeNode {
                id: None,
                parent: None,
                depth: 0,
                children: Vec::new(),
                descendants: 0,
                height: 0,
                data: None,
                index: None,
                pos: -1.0,
                y: None,
            },
        };

        grid.fold(&tree, GridNodeId::ROOT, unique_names);
        grid.aggregate(GridNodeId::ROOT);
        grid.assign_positions(GridNodeId::ROOT, -1, series_count.max(1) as i64);
        grid.annotate_tree(&mut tree);
        grid.tree = tree;

        debug!(
            records = records.len(),
            categories = grid.categories.len(),
            collapsed = grid.collapsed_nodes.len(),
            "built tree grid"
        );
        grid
    }

    /// Groups the children of `tree_node` into rows under `parent`.
    fn fold(&mut self, tree_node: &TreeNode, parent: GridNodeId, unique_names: bool) {
        for child in &tree_node.children {
            let Some(index) = child.index else {
                continue;
            };
            let name = child.data.as_ref().map(|d| d.label()).unwrap_or("");
            let placeholder = index >= self.placeholders_from;

            let existing = if unique_names && !placeholder {
                self.nodes[parent.0]
                    .children
                    .iter()
                    .copied()
                    .find(|c| !self.nodes[c.0].placeholder && self.nodes[c.0].name == name)
            } else {
                None
            };

            let target = match existing {
                Some(id) => id,
                None => {
                    let id = GridNodeId(self.nodes.len());
                    let depth = self.nodes[parent.0].depth + 1;
                    let mut node = GridNode::new(id, depth, name.to_string(), Some(parent));
                    node.placeholder = placeholder;
                    self.nodes.push(node);
                    self.nodes[parent.0].children.push(id);
                    id
                }
            };

            let collapsed = child.data.as_ref().is_some_and(|d| d.collapsed);
            let node = &mut self.nodes[target.0];
            node.nodes.push(index);
            node.collapsed |= collapsed;
            self.record_nodes[index] = Some(target);

            self.fold(child, target, unique_names);
        }
    }

    /// Computes descendants and height bottom-up, collecting collapsed rows.
    fn aggregate(&mut self, id: GridNodeId) {
        let children = self.nodes[id.0].children.clone();
        let mut descendants = 0;
        let mut height = 0;
        for child in children {
            self.aggregate(child);
            let c = &self.nodes[child.0];
            descendants += c.descendants + 1;
            height = height.max(c.height + 1);
        }
        let node = &mut self.nodes[id.0];
        node.descendants = descendants;
        node.height = height;
        if node.collapsed && !node.is_root() {
            self.collapsed_nodes.push(id);
        }
    }

    /// Assigns positions depth-first. `start` is the first slot of the row.
    fn assign_positions(&mut self, id: GridNodeId, start: i64, series_count: i64) {
        let mut end = start + if start == -1 { 0 } else { series_count - 1 };
        let diff = (end - start) as f64 / 2.0;
        let pos = start as f64 + diff;

        for &index in &self.nodes[id.0].nodes {
            // Records are offset within the row by their series.
            self.record_rows[index] = Some((start + self.series_indices[index] as i64) as f64);
        }

        for slot in start..=end {
            self.slots.insert(slot, id);
        }

        {
            let node = &mut self.nodes[id.0];
            node.pos = pos;
            node.slots = (start, end);
            node.tickmark_offset = diff + PADDING;
            node.collapse_start = end as f64 + PADDING;
            if !node.is_root() {
                self.categories.push(node.name.clone());
            }
        }

        let children = self.nodes[id.0].children.clone();
        for child in children {
            self.assign_positions(child, end + 1, series_count);
            end = (self.nodes[child.0].collapse_end - PADDING) as i64;
        }
        self.nodes[id.0].collapse_end = end as f64 + PADDING;
    }

    fn annotate_tree(&self, node: &mut TreeNode) {
        match node.index {
            Some(index) => {
                node.pos = self.record_nodes[index]
                    .map_or(-1.0, |g| self.nodes[g.0].pos);
                node.y = self.record_rows[index];
            }
            None => node.pos = -1.0,
        }
        for child in node.children.iter_mut() {
            self.annotate_tree(child);
        }
    }

    pub fn root(&self) -> &GridNode {
        &self.nodes[GridNodeId::ROOT.0]
    }

    pub fn node(&self, id: GridNodeId) -> Option<&GridNode> {
        self.nodes.get(id.0)
    }

    /// All rows, root first, in creation order.
    pub fn nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    /// Row occupying an integer slot. Slot `-1` is the root.
    pub fn node_at_slot(&self, slot: i64) -> Option<&GridNode> {
        self.slots.get(&slot).and_then(|id| self.node(*id))
    }

    /// Row at an axis position, such as the `y` of a record.
    pub fn node_at(&self, pos: f64) -> Option<&GridNode> {
        self.node_at_slot(pos.floor() as i64)
    }

    /// Slot -> row map.
    pub fn slots(&self) -> &BTreeMap<i64, GridNodeId> {
        &self.slots
    }

    /// Row names in axis order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Rows that start collapsed because one of their records asked for it.
    pub fn collapsed_nodes(&self) -> &[GridNodeId] {
        &self.collapsed_nodes
    }

    pub fn tree(&self) -> &TreeNode {
        &self.tree
    }

    /// Row holding the record with `id`.
    pub fn node_for_id(&self, id: &str) -> Option<&GridNode> {
        let index = *self.ids.get(id)?;
        self.node_for_record(index)
    }

    pub fn node_for_record(&self, index: usize) -> Option<&GridNode> {
        self.record_nodes
            .get(index)
            .copied()
            .flatten()
            .and_then(|g| self.node(g))
    }

    /// Axis value assigned to the record at `index`.
    pub fn record_row(&self, index: usize) -> Option<f64> {
        self.record_rows.get(index).copied().flatten()
    }

    /// Last slot used by any row, `-1` when the grid is empty.
    pub fn last_slot(&self) -> f64 {
        self.root().collapse_end - PADDING
    }
}

/// Break hiding the descendants of `node`, never its own row.
pub fn break_from_node(node: &GridNode) -> Break {
    Break::new(node.collapse_start, node.collapse_end).with_show_points(false)
}

pub fn is_collapsed(breaks: &[Break], node: &GridNode) -> bool {
    let brk = break_from_node(node);
    breaks.iter().any(|b| b.from == brk.from && b.to == brk.to)
}

/// Break list with `node` collapsed. Collapsing twice adds nothing.
pub fn collapse(breaks: &[Break], node: &GridNode) -> Vec<Break> {
    let mut result = breaks.to_vec();
    if !is_collapsed(breaks, node) {
        result.push(break_from_node(node));
    }
    result
}

/// Break list with the break of `node` removed.
pub fn expand(breaks: &[Break], node: &GridNode) -> Vec<Break> {
    let brk = break_from_node(node);
    breaks
        .iter()
        .filter(|b| b.from != brk.from || b.to != brk.to)
        .cloned()
        .collect()
}

pub fn toggle_collapse(breaks: &[Break], node: &GridNode) -> Vec<Break> {
    if is_collapsed(breaks, node) {
        expand(breaks, node)
    } else {
        collapse(breaks, node)
    }
}
