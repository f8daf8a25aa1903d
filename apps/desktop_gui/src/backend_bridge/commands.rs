//! Backend commands queued from UI to backend worker.

use client_core::Session;
use shared::protocol::{CreateOperationRequest, CreateStartingNumberRequest, Credentials};

#[derive(Debug, Clone)]
pub enum BackendCommand {
    LoadTree {
        session: Option<Session>,
    },
    Login {
        credentials: Credentials,
    },
    Register {
        credentials: Credentials,
    },
    CreateStartingNumber {
        session: Session,
        request: CreateStartingNumberRequest,
    },
    CreateOperation {
        session: Session,
        request: CreateOperationRequest,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadTree { .. } => "load_tree",
            Self::Login { .. } => "login",
            Self::Register { .. } => "register",
            Self::CreateStartingNumber { .. } => "create_starting_number",
            Self::CreateOperation { .. } => "create_operation",
        }
    }
}
