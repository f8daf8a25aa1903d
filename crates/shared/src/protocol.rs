use serde::{Deserialize, Serialize};

use crate::domain::{NodeId, NodeKind, OperationType, User};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateStartingNumberRequest {
    pub number: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateOperationRequest {
    pub parent_id: NodeId,
    pub parent_type: NodeKind,
    pub operation_type: OperationType,
    pub right_operand: f64,
}

/// Body returned by the create endpoints. Only the identity and the new
/// running value are read; everything else is reloaded with the tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatedNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}
