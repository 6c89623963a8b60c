//! Layered tree layout.
//!
//! Nodes are bucketed into levels by depth in a spanning forest and spread
//! symmetrically around x = 0 within each level:
//!
//! 1. Each node keeps one parent for positioning: the source of the last
//!    edge that targets it. All edges stay in the graph; only the layout
//!    ignores the others.
//! 2. Nodes without a retained parent are roots at level 0. Children are
//!    visited breadth-first from their retained parent at `level + 1`.
//! 3. Whatever is left sits on or below a cycle. The earliest-discovered
//!    node of that cycle becomes a local root and the walk continues from it.
//! 4. Within a level of `k` nodes, slot `j` is placed at
//!    `x = (j - (k - 1) / 2) * node_spacing`, `y = level * level_height`.

use crate::edge::GraphEdge;
use crate::node::Position;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tracing::debug;

/// Spacing constants for the layered layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Horizontal distance between neighbouring nodes of one level.
    pub node_spacing: f64,
    /// Vertical distance between levels.
    pub level_height: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_spacing: 250.0,
            level_height: 200.0,
        }
    }
}

/// Where one node ended up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutSlot {
    pub level: usize,
    /// Index within the level, in first-assignment order.
    pub offset: usize,
    pub position: Position,
}

/// The computed layout for one node set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    slots: HashMap<String, LayoutSlot>,
    levels: Vec<Vec<String>>,
}

impl Layout {
    pub fn get(&self, id: &str) -> Option<&LayoutSlot> {
        self.slots.get(id)
    }

    pub fn level_of(&self, id: &str) -> Option<usize> {
        self.slots.get(id).map(|slot| slot.level)
    }

    pub fn position_of(&self, id: &str) -> Option<Position> {
        self.slots.get(id).map(|slot| slot.position)
    }

    /// Node ids per level, top level first.
    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// The layout engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayeredLayout {
    config: LayoutConfig,
}

impl LayeredLayout {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Lays out `ids` (in discovery order) using `edges`.
    ///
    /// Edges that mention unknown ids are ignored.
    pub fn compute<'a, I>(&self, ids: I, edges: &[GraphEdge]) -> Layout
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids: Vec<&str> = ids.into_iter().collect();
        let forest = Forest::new(&ids, edges);
        let (levels, order) = forest.assign_levels();

        let mut buckets: Vec<Vec<usize>> = Vec::new();
        for node in order {
            let level = levels[node];
            if buckets.len() <= level {
                buckets.resize_with(level + 1, Vec::new);
            }
            buckets[level].push(node);
        }

        let mut layout = Layout::default();
        for (level, bucket) in buckets.iter().enumerate() {
            let center = (bucket.len() as f64 - 1.0) / 2.0;
            for (offset, &node) in bucket.iter().enumerate() {
                let position = Position::new(
                    (offset as f64 - center) * self.config.node_spacing,
                    level as f64 * self.config.level_height,
                );
                layout.slots.insert(
                    ids[node].to_string(),
                    LayoutSlot {
                        level,
                        offset,
                        position,
                    },
                );
            }
            layout
                .levels
                .push(bucket.iter().map(|&node| ids[node].to_string()).collect());
        }

        layout
    }
}

/// Adjacency over node positions with one retained parent per node.
struct Forest {
    children: Vec<Vec<usize>>,
    parent_of: Vec<Option<usize>>,
}

impl Forest {
    fn new(ids: &[&str], edges: &[GraphEdge]) -> Self {
        let index: HashMap<&str, usize> = ids.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let mut children = vec![Vec::new(); ids.len()];
        let mut parent_of = vec![None; ids.len()];

        for edge in edges {
            let (Some(&source), Some(&target)) = (
                index.get(edge.source.as_str()),
                index.get(edge.target.as_str()),
            ) else {
                continue;
            };
            children[source].push(target);
            // last write wins
            parent_of[target] = Some(source);
        }

        Self { children, parent_of }
    }

    /// Returns each node's level and the order in which levels were assigned.
    fn assign_levels(&self) -> (Vec<usize>, Vec<usize>) {
        let count = self.parent_of.len();
        let mut levels: Vec<Option<usize>> = vec![None; count];
        let mut order = Vec::with_capacity(count);

        for root in (0..count).filter(|&node| self.parent_of[node].is_none()) {
            self.walk(root, &mut levels, &mut order);
        }

        for node in 0..count {
            if levels[node].is_none() {
                let root = self.cycle_root(node);
                debug!("Node {} sits on a cycle, laying out from local root {}", node, root);
                self.walk(root, &mut levels, &mut order);
            }
        }

        (levels.into_iter().map(|level| level.unwrap_or(0)).collect(), order)
    }

    /// Breadth-first walk down retained parent links.
    fn walk(&self, root: usize, levels: &mut [Option<usize>], order: &mut Vec<usize>) {
        if levels[root].is_some() {
            return;
        }
        levels[root] = Some(0);
        order.push(root);

        let mut queue = VecDeque::from([(root, 0)]);
        while let Some((current, level)) = queue.pop_front() {
            for &child in &self.children[current] {
                if levels[child].is_some() || self.parent_of[child] != Some(current) {
                    continue;
                }
                levels[child] = Some(level + 1);
                order.push(child);
                queue.push_back((child, level + 1));
            }
        }
    }

    /// Follows retained parents up from an unplaced node until a node
    /// repeats, then returns the earliest-discovered node of that cycle.
    fn cycle_root(&self, start: usize) -> usize {
        let mut path = vec![start];
        let mut seen = HashSet::from([start]);
        let mut current = start;

        while let Some(parent) = self.parent_of[current] {
            if !seen.insert(parent) {
                let cycle_start = path.iter().position(|&node| node == parent).unwrap_or(0);
                return path[cycle_start..].iter().copied().min().unwrap_or(start);
            }
            path.push(parent);
            current = parent;
        }

        // Unreachable for unplaced nodes: every chain without a cycle ends at a root.
        current
    }
}
