//! Show the fork tree

use crate::util;
use anyhow::Result;
use fy_store::{CheckpointStore, ForkNode, ForkTree};
use owo_colors::OwoColorize;

pub fn run(store: &CheckpointStore, json: bool) -> Result<()> {
    let tree = store.get_fork_tree()?;

    if json {
        return util::print_json(&tree);
    }

    if tree.is_empty() {
        println!("{}", "No forks".dimmed());
        return Ok(());
    }

    for (prefix, node) in layout(&tree) {
        let meta = &node.metadata;
        let mut line = format!("{}{}  {}", prefix, node.fork_id.yellow(), meta.created_at.dimmed());
        if meta.status != fy_store::STATUS_ACTIVE {
            line.push_str(&format!("  {}", meta.status.red()));
        }
        println!("{}", line);
    }

    println!("\n{} forks", tree.len());
    Ok(())
}

/// Pair every node with its box-drawing prefix, in display order
fn layout(tree: &ForkTree) -> Vec<(String, &ForkNode)> {
    let mut lines = Vec::new();
    // (prefix for this node, indent for its children, node)
    let mut stack: Vec<(String, String, &ForkNode)> = tree
        .root
        .children
        .iter()
        .rev()
        .map(|node| (String::new(), String::new(), node))
        .collect();

    while let Some((prefix, indent, node)) = stack.pop() {
        let count = node.children.len();
        for (i, child) in node.children.iter().enumerate().rev() {
            let last = i + 1 == count;
            let branch = if last { "└── " } else { "├── " };
            let next = if last { "    " } else { "│   " };
            stack.push((format!("{}{}", indent, branch), format!("{}{}", indent, next), child));
        }
        lines.push((prefix, node));
    }
    lines
}
