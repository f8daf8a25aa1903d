use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NodeShapeError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Starting,
    Operation,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Operation => "operation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    #[default]
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl OperationType {
    pub const ALL: [OperationType; 4] = [
        OperationType::Add,
        OperationType::Subtract,
        OperationType::Multiply,
        OperationType::Divide,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "×",
            Self::Divide => "÷",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Multiply => "multiply",
            Self::Divide => "divide",
        }
    }

    /// Accepts the wire name (`add`) or the display symbol (`+`, `*`, `/` too).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "add" | "+" => Some(Self::Add),
            "subtract" | "-" => Some(Self::Subtract),
            "multiply" | "*" | "x" | "×" => Some(Self::Multiply),
            "divide" | "/" | "÷" => Some(Self::Divide),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
}

/// One entry of the calculation tree as served by `GET /calculations`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationNode {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_type: Option<OperationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_operand: Option<f64>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub children: Vec<OperationNode>,
}

impl OperationNode {
    /// The operator and operand applied by an `operation` node.
    pub fn operation(&self) -> Option<(OperationType, f64)> {
        match (self.kind, self.operation_type, self.right_operand) {
            (NodeKind::Operation, Some(op), Some(operand)) => Some((op, operand)),
            _ => None,
        }
    }

    pub fn check_shape(&self) -> Result<(), NodeShapeError> {
        let has_op = self.operation_type.is_some();
        let has_operand = self.right_operand.is_some();
        match self.kind {
            NodeKind::Starting if has_op || has_operand => {
                Err(NodeShapeError::UnexpectedOperation { node_id: self.id })
            }
            NodeKind::Operation if !(has_op && has_operand) => {
                Err(NodeShapeError::MissingOperation { node_id: self.id })
            }
            _ => Ok(()),
        }
    }

    pub fn display_author(&self) -> String {
        match self.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("user-{}", self.user_id),
        }
    }

    /// Parses `created_at`; servers emit RFC 3339 or a bare `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    /// Depth-first search over this node and its descendants.
    pub fn find(&self, id: NodeId) -> Option<&OperationNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }
}

/// Looks a node up anywhere in a forest of starting nodes.
pub fn find_node(roots: &[OperationNode], id: NodeId) -> Option<&OperationNode> {
    roots.iter().find_map(|root| root.find(id))
}

/// Formats a numeric value the way the web client printed it: integral
/// values without a fractional part, exponent form (`1e+21`, `1e-7`)
/// outside `[1e-6, 1e21)`.
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if value == 0.0 {
        "0".to_string()
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        let formatted = format!("{value:e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => formatted,
        }
    } else {
        format!("{value}")
    }
}
