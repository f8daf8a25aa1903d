use async_trait::async_trait;
use shared::{
    domain::OperationNode,
    protocol::{
        AuthResponse, CreateOperationRequest, CreateStartingNumberRequest, CreatedNode,
        Credentials,
    },
};
use tracing::{debug, info};

pub mod config;
pub mod error;
pub mod forms;
pub mod root_view;
pub mod session;
pub mod transport;
pub mod tree;
pub mod validation;

pub use error::ClientError;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use transport::Transport;

const REGISTER_PATH: &str = "/auth/register";
const LOGIN_PATH: &str = "/auth/login";
const CALCULATIONS_PATH: &str = "/calculations";
const STARTING_NUMBER_PATH: &str = "/calculations/starting";
const OPERATION_PATH: &str = "/calculations/operation";

/// Remote operations of the number social service. Calls that act on behalf
/// of a user take the session explicitly; `None` sends the request anonymously.
#[async_trait]
pub trait NumberSocialApi: Send + Sync {
    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError>;
    async fn calculation_tree(
        &self,
        session: Option<&Session>,
    ) -> Result<Vec<OperationNode>, ClientError>;
    async fn create_starting_number(
        &self,
        session: Option<&Session>,
        request: &CreateStartingNumberRequest,
    ) -> Result<CreatedNode, ClientError>;
    async fn create_operation(
        &self,
        session: Option<&Session>,
        request: &CreateOperationRequest,
    ) -> Result<CreatedNode, ClientError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    transport: Transport,
}

impl ApiClient {
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            transport: Transport::new(api_base_url),
        }
    }
}

#[async_trait]
impl NumberSocialApi for ApiClient {
    async fn register(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self
            .transport
            .post_json(REGISTER_PATH, credentials, None)
            .await?;
        info!(user_id = response.user.id.0, "registered account");
        Ok(response)
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self
            .transport
            .post_json(LOGIN_PATH, credentials, None)
            .await?;
        info!(user_id = response.user.id.0, "logged in");
        Ok(response)
    }

    async fn calculation_tree(
        &self,
        session: Option<&Session>,
    ) -> Result<Vec<OperationNode>, ClientError> {
        let nodes: Vec<OperationNode> = self
            .transport
            .get_json(CALCULATIONS_PATH, session.map(Session::bearer))
            .await?;
        debug!(threads = nodes.len(), "fetched calculation tree");
        Ok(nodes)
    }

    async fn create_starting_number(
        &self,
        session: Option<&Session>,
        request: &CreateStartingNumberRequest,
    ) -> Result<CreatedNode, ClientError> {
        let created: CreatedNode = self
            .transport
            .post_json(STARTING_NUMBER_PATH, request, session.map(Session::bearer))
            .await?;
        debug!(node_id = ?created.id, "created starting number");
        Ok(created)
    }

    async fn create_operation(
        &self,
        session: Option<&Session>,
        request: &CreateOperationRequest,
    ) -> Result<CreatedNode, ClientError> {
        let created: CreatedNode = self
            .transport
            .post_json(OPERATION_PATH, request, session.map(Session::bearer))
            .await?;
        debug!(
            node_id = ?created.id,
            parent_id = request.parent_id.0,
            operation = request.operation_type.as_str(),
            "created operation"
        );
        Ok(created)
    }
}

#[cfg(test)]
#[path = "tests/fake_api.rs"]
pub(crate) mod fake_api;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
