//! Fork tree assembly from flat metadata records
//!
//! The tree is a derived view: it is rebuilt from `parent_id` references on
//! every query and never written to disk. Assembly is two passes over the
//! records:
//!
//! 1. index every `fork_id` to its position (first occurrence wins)
//! 2. attach each record under its resolved parent, or under the synthetic
//!    root when it has no parent or the parent is not in the set
//!
//! Records caught in a parent cycle are unreachable from the root after
//! pass 2. The first such record (in input order) is attached to the root
//! and the rest of its cycle hangs below it, so every fork appears once.

use crate::checkpoint::ForkMetadata;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// One fork in the tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkNode {
    pub fork_id: String,
    pub children: Vec<ForkNode>,
    pub metadata: ForkMetadata,
}

/// Synthetic top of the tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RootNode {
    pub children: Vec<ForkNode>,
    /// Always empty; present to keep the node shape uniform
    pub metadata: Map<String, Value>,
}

/// Hierarchy of forks rooted at a synthetic `root` node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForkTree {
    pub root: RootNode,
}

impl ForkTree {
    /// Build the tree from flat metadata records
    ///
    /// Sibling order follows input order.
    pub fn from_metadata(forks: Vec<ForkMetadata>) -> Self {
        let n = forks.len();

        // Pass 1: fork_id -> position
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(n);
        for (i, fork) in forks.iter().enumerate() {
            index.entry(fork.fork_id.as_str()).or_insert(i);
        }
        let kept: Vec<bool> = forks
            .iter()
            .enumerate()
            .map(|(i, fork)| index.get(fork.fork_id.as_str()) == Some(&i))
            .collect();

        // Pass 2: link under resolved parent or root
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut top = Vec::new();
        for (i, fork) in forks.iter().enumerate() {
            if !kept[i] {
                continue;
            }
            let parent = fork
                .parent_id
                .as_deref()
                .and_then(|p| index.get(p))
                .copied();
            match parent {
                Some(p) if p != i => children[p].push(i),
                _ => top.push(i),
            }
        }
        drop(index);

        // A taken slot marks a placed node
        let mut slots: Vec<Option<ForkMetadata>> = forks
            .into_iter()
            .zip(kept)
            .map(|(fork, keep)| keep.then_some(fork))
            .collect();

        let mut root = RootNode::default();
        for i in top {
            if let Some(node) = assemble(i, &mut slots, &children) {
                root.children.push(node);
            }
        }

        // Whatever is left sits on a parent cycle
        for i in 0..n {
            if let Some(node) = assemble(i, &mut slots, &children) {
                tracing::debug!(fork_id = %node.fork_id, "parent cycle attached to root");
                root.children.push(node);
            }
        }

        Self { root }
    }

    /// Total number of forks in the tree (excluding the synthetic root)
    pub fn len(&self) -> usize {
        self.walk().len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }

    /// Depth-first pre-order traversal yielding `(depth, node)`
    ///
    /// Direct children of the root have depth 0.
    pub fn walk(&self) -> Vec<(usize, &ForkNode)> {
        let mut out = Vec::new();
        let mut stack: Vec<(usize, &ForkNode)> =
            self.root.children.iter().rev().map(|c| (0, c)).collect();

        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        }
        out
    }

    /// Find a fork anywhere in the tree
    pub fn find(&self, fork_id: &str) -> Option<&ForkNode> {
        self.walk()
            .into_iter()
            .map(|(_, node)| node)
            .find(|node| node.fork_id == fork_id)
    }

    /// Ids from the top-level ancestor down to `fork_id` (empty if absent)
    pub fn lineage(&self, fork_id: &str) -> Vec<String> {
        let mut path: Vec<&str> = Vec::new();
        for (depth, node) in self.walk() {
            path.truncate(depth);
            path.push(&node.fork_id);
            if node.fork_id == fork_id {
                return path.into_iter().map(str::to_string).collect();
            }
        }
        Vec::new()
    }
}

/// Move record `start` and everything below it into a node, skipping placed
/// records
///
/// Uses an explicit stack so chain depth is bounded by heap, not call stack.
fn assemble(
    start: usize,
    slots: &mut [Option<ForkMetadata>],
    children: &[Vec<usize>],
) -> Option<ForkNode> {
    // (node under construction, record index, next child to visit)
    let mut stack = vec![(ForkNode::leaf(slots[start].take()?), start, 0)];

    loop {
        let (_, i, next) = stack.last_mut()?;
        let i = *i;
        if let Some(&c) = children[i].get(*next) {
            *next += 1;
            if let Some(metadata) = slots[c].take() {
                stack.push((ForkNode::leaf(metadata), c, 0));
            }
            continue;
        }

        let (done, _, _) = stack.pop()?;
        match stack.last_mut() {
            Some((parent, _, _)) => parent.children.push(done),
            None => return Some(done),
        }
    }
}

impl ForkNode {
    fn leaf(metadata: ForkMetadata) -> Self {
        Self {
            fork_id: metadata.fork_id.clone(),
            children: Vec::new(),
            metadata,
        }
    }
}

// Flatten the subtree first so dropping a long chain does not recurse
impl Drop for ForkNode {
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut node) = pending.pop() {
            pending.append(&mut node.children);
        }
    }
}
