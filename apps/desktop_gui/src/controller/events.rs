//! UI/backend events and error modeling for desktop GUI controller.

use client_core::ClientError;
use shared::{
    domain::{NodeId, OperationNode},
    protocol::{AuthResponse, CreatedNode},
};

#[derive(Debug)]
pub enum UiEvent {
    Info(String),
    Error(UiError),
    TreeLoaded(Result<Vec<OperationNode>, ClientError>),
    AuthFinished(Result<AuthResponse, ClientError>),
    StartingNumberFinished(Result<CreatedNode, ClientError>),
    OperationFinished {
        parent_id: NodeId,
        result: Result<CreatedNode, ClientError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Auth,
    Transport,
    Validation,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    CreateNode,
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_client(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::Auth(_) => UiErrorCategory::Auth,
            ClientError::Validation(_) => UiErrorCategory::Validation,
            ClientError::Network(_) => UiErrorCategory::Transport,
            ClientError::Server { .. } => UiErrorCategory::Unknown,
        };
        Self {
            category,
            context,
            message: err.user_message().to_string(),
        }
    }

    /// Failure raised while bringing the backend worker up.
    pub fn startup(message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context: UiErrorContext::BackendStartup,
            message: message.into(),
        }
    }

    pub fn requires_reauth(&self) -> bool {
        self.category == UiErrorCategory::Auth
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
