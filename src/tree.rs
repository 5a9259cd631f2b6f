//! Parent/child tree built from flat Gantt records.

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::data_types::Record;

/// A node of the record tree. The root carries no record and no id.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    pub id: Option<String>,
    pub parent: Option<String>,
    /// Root is 0, its children 1.
    pub depth: usize,
    pub children: Vec<TreeNode>,
    /// Number of nodes strictly below this one. The root is synthetic, so
    /// `root.descendants` equals the record count rather than one less.
    pub descendants: usize,
    /// Length of the longest downward path.
    pub height: usize,
    /// Copy of the record, with `start`/`end` filled in from the children when absent.
    pub data: Option<Record>,
    /// Index of the record in the input slice.
    pub index: Option<usize>,
    /// Axis position assigned by the grid mapper. `-1` for the root.
    pub pos: f64,
    /// Row value of the record itself (row start plus series offset).
    pub y: Option<f64>,
}

impl TreeNode {
    pub fn is_root(&self) -> bool {
        self.index.is_none()
    }

    pub fn start(&self) -> Option<f64> {
        self.data.as_ref().and_then(|d| d.start)
    }

    pub fn end(&self) -> Option<f64> {
        self.data.as_ref().and_then(|d| d.end)
    }

    /// Depth-first, pre-order iteration over this node and everything below it.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter { stack: vec![self] }
    }

    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        self.iter().find(|n| n.id.as_deref() == Some(id))
    }
}

pub struct TreeIter<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Hooks run around the construction of every node.
///
/// `before` sees the node before its children exist; `after` sees it once
/// children, range, descendants and height are final.
pub trait TreeVisitor {
    fn before(&mut self, _node: &mut TreeNode) {}
    fn after(&mut self, _node: &mut TreeNode) {}
}

pub struct NoopVisitor;

impl TreeVisitor for NoopVisitor {}

pub fn build_tree(records: &[Record]) -> TreeNode {
    build_tree_with(records, &mut NoopVisitor)
}

pub fn build_tree_with<V: TreeVisitor + ?Sized>(records: &[Record], visitor: &mut V) -> TreeNode {
    let groups = ChildGroups::new(records);
    build_node(None, records, &groups, 0, visitor)
}

/// Record indices grouped by the key of their effective parent (`None` is the root).
struct ChildGroups<'a> {
    groups: HashMap<Option<&'a str>, Vec<usize>>,
    /// First record carrying each id. Only that record owns the id's children.
    owners: HashMap<&'a str, usize>,
    /// Effective parent of every record after hoisting.
    parent_keys: Vec<Option<&'a str>>,
}

impl<'a> ChildGroups<'a> {
    fn new(records: &'a [Record]) -> Self {
        let mut owners: HashMap<&str, usize> = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            if let Some(id) = record.id.as_deref() {
                if owners.contains_key(id) {
                    warn!(id, "duplicate record id, later record gets no children");
                } else {
                    owners.insert(id, i);
                }
            }
        }

        let mut parent_keys: Vec<Option<&str>> = records
            .iter()
            .enumerate()
            .map(|(i, record)| match record.parent.as_deref() {
                None | Some("") => None,
                Some(parent) => match owners.get(parent) {
                    Some(&owner) if owner != i => Some(parent),
                    Some(_) => {
                        warn!(parent, "record is its own parent, hoisting to root");
                        None
                    }
                    None => {
                        warn!(parent, "parent id not found, hoisting to root");
                        None
                    }
                },
            })
            .collect();

        Self::break_cycles(records, &owners, &mut parent_keys);

        // Direct root children keep input order; hoisted records already point at the root.
        let mut groups: HashMap<Option<&str>, Vec<usize>> = HashMap::new();
        for (i, key) in parent_keys.iter().enumerate() {
            groups.entry(*key).or_default().push(i);
        }

        Self {
            groups,
            owners,
            parent_keys,
        }
    }

    /// Hoists one member of every parent cycle to the root so that every record is reachable.
    fn break_cycles(
        records: &'a [Record],
        owners: &HashMap<&'a str, usize>,
        parent_keys: &mut [Option<&'a str>],
    ) {
        let parent_of = |keys: &[Option<&str>], i: usize| -> Option<usize> {
            keys[i].and_then(|p| owners.get(p).copied())
        };

        loop {
            let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
            let mut visited = vec![false; records.len()];
            let mut stack = Vec::new();
            for i in 0..records.len() {
                match parent_of(parent_keys, i) {
                    Some(p) => children.entry(p).or_default().push(i),
                    None => stack.push(i),
                }
            }
            while let Some(i) = stack.pop() {
                if visited[i] {
                    continue;
                }
                visited[i] = true;
                if let Some(kids) = children.get(&i) {
                    stack.extend(kids.iter().copied());
                }
            }

            let Some(first) = visited.iter().position(|v| !v) else {
                return;
            };

            // Walk up until a node repeats: that node sits on the cycle.
            let mut seen = HashSet::new();
            let mut current = first;
            while seen.insert(current) {
                match parent_of(parent_keys, current) {
                    Some(p) => current = p,
                    None => break,
                }
            }
            warn!(
                id = records[current].id.as_deref().unwrap_or(""),
                "parent cycle detected, hoisting record to root"
            );
            parent_keys[current] = None;
        }
    }

    fn children_of(&self, id: Option<&'a str>, index: Option<usize>) -> &[usize] {
        let key = match (index, id) {
            (None, _) => None,
            (Some(i), Some(id)) if self.owners.get(id) == Some(&i) => Some(id),
            _ => return &[],
        };
        self.groups.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn build_node<'a, V: TreeVisitor + ?Sized>(
    index: Option<usize>,
    records: &'a [Record],
    groups: &ChildGroups<'a>,
    depth: usize,
    visitor: &mut V,
) -> TreeNode {
    let data = index.map(|i| records[i].clone());
    let id = data.as_ref().and_then(|d| d.id.clone());
    let parent = index.and_then(|i| groups.parent_keys[i].map(str::to_string));

    let mut node = TreeNode {
        id,
        parent,
        depth,
        children: Vec::new(),
        descendants: 0,
        height: 0,
        data,
        index,
        pos: -1.0,
        y: None,
    };

    visitor.before(&mut node);

    let mut start: Option<f64> = None;
    let mut end: Option<f64> = None;
    let mut descendants = 0;
    let mut height = 0;
    let key = index.and_then(|i| records[i].id.as_deref());
    let child_indices = groups.children_of(key, index);
    let mut children = Vec::with_capacity(child_indices.len());

    for &child_index in child_indices {
        let child = build_node(Some(child_index), records, groups, depth + 1, visitor);
        if let Some(record) = &child.data {
            if let Some(s) = record.start {
                start = Some(start.map_or(s, |cur| cur.min(s)));
            }
            if let Some(e) = record.effective_end() {
                end = Some(end.map_or(e, |cur| cur.max(e)));
            }
        }
        descendants += 1 + child.descendants;
        height = height.max(child.height + 1);
        children.push(child);
    }

    if let Some(record) = node.data.as_mut() {
        record.start = record.start.or(start);
        record.end = record.end.or(end);
    }

    node.children = children;
    node.descendants = descendants;
    node.height = height;

    visitor.after(&mut node);
    node
}
