//! Flattens the calculation forest into display rows.
//!
//! Rendering is a pure function of the nodes and whether the viewer is
//! signed in; shells only lay the rows out.

use chrono::Local;
use shared::domain::{format_number, NodeId, NodeKind, OperationNode, OperationType};
use tracing::warn;

pub const EMPTY_TREE_PLACEHOLDER: &str =
    "No conversations yet. Be the first to start a number thread!";

const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parent coordinates an operation form needs to reply to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReplyTarget {
    pub parent_id: NodeId,
    pub parent_type: NodeKind,
}

impl ReplyTarget {
    pub fn for_node(node: &OperationNode) -> Self {
        Self {
            parent_id: node.id,
            parent_type: node.kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub depth: usize,
    pub value: String,
    pub label: String,
    pub author: String,
    pub created_at: String,
    pub badge: Option<&'static str>,
    pub reply: Option<ReplyTarget>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TreeView {
    Empty { placeholder: &'static str },
    Nodes(Vec<RenderedNode>),
}

impl TreeView {
    pub fn rows(&self) -> &[RenderedNode] {
        match self {
            Self::Empty { .. } => &[],
            Self::Nodes(rows) => rows,
        }
    }
}

pub fn operation_label(operation: OperationType, right_operand: f64) -> String {
    format!("{} {}", operation.symbol(), format_number(right_operand))
}

pub fn node_label(node: &OperationNode) -> String {
    match node.kind {
        NodeKind::Starting => format!("Started the thread with {}", format_number(node.value)),
        NodeKind::Operation => match node.operation() {
            Some((operation, operand)) => operation_label(operation, operand),
            None => {
                let operand = node
                    .right_operand
                    .map(format_number)
                    .unwrap_or_else(|| "?".to_string());
                format!("? {operand}")
            }
        },
    }
}

pub fn format_created_at(node: &OperationNode) -> String {
    node.created_at_utc()
        .map(|at| at.with_timezone(&Local).format(LOCAL_TIMESTAMP_FORMAT).to_string())
        .unwrap_or_else(|| node.created_at.clone())
}

pub fn render_node(node: &OperationNode, depth: usize, is_authenticated: bool) -> RenderedNode {
    if let Err(err) = node.check_shape() {
        warn!(node_id = node.id.0, "rendering malformed node: {err}");
    }
    RenderedNode {
        id: node.id,
        kind: node.kind,
        depth,
        value: format_number(node.value),
        label: node_label(node),
        author: node.display_author(),
        created_at: format_created_at(node),
        badge: match node.kind {
            NodeKind::Operation => node.operation_type.map(OperationType::as_str),
            NodeKind::Starting => None,
        },
        reply: is_authenticated.then(|| ReplyTarget::for_node(node)),
    }
}

/// Pre-order walk: every node is followed by its replies in reply order, one
/// level deeper. Uses an explicit stack so depth is only bounded by the data.
pub fn render_tree(nodes: &[OperationNode], is_authenticated: bool) -> TreeView {
    if nodes.is_empty() {
        return TreeView::Empty {
            placeholder: EMPTY_TREE_PLACEHOLDER,
        };
    }

    let mut rows = Vec::new();
    let mut stack: Vec<(&OperationNode, usize)> =
        nodes.iter().rev().map(|node| (node, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        rows.push(render_node(node, depth, is_authenticated));
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
    TreeView::Nodes(rows)
}

/// Plain-text rendering used by the CLI: two spaces of indent per level.
pub fn render_text(view: &TreeView) -> String {
    match view {
        TreeView::Empty { placeholder } => format!("{placeholder}\n"),
        TreeView::Nodes(rows) => {
            let mut out = String::new();
            for row in rows {
                let indent = "  ".repeat(row.depth);
                out.push_str(&format!(
                    "{indent}[{}] {} = {}  @{}  {}",
                    row.id, row.label, row.value, row.author, row.created_at
                ));
                if row.reply.is_some() {
                    out.push_str("  [reply]");
                }
                out.push('\n');
            }
            out
        }
    }
}

pub fn thread_summary(nodes: &[OperationNode]) -> String {
    match nodes.len() {
        0 => "No threads yet".to_string(),
        1 => "1 active thread".to_string(),
        n => format!("{n} active threads"),
    }
}

#[cfg(test)]
#[path = "tests/tree_tests.rs"]
mod tests;
