//! Top-level view state: who is signed in and which tree snapshot is shown.

use shared::{
    domain::{OperationNode, User},
    protocol::AuthResponse,
};
use tracing::{error, info, warn};

use crate::{
    error::ClientError,
    session::{Session, SessionStore},
    tree::{render_tree, thread_summary, TreeView},
    NumberSocialApi,
};

#[derive(Debug, Clone, PartialEq)]
enum TreeState {
    Loading,
    Loaded(Vec<OperationNode>),
}

#[derive(Debug, Clone)]
pub struct RootView {
    session: Option<Session>,
    tree: TreeState,
}

impl RootView {
    /// Restores a persisted session if there is one. The tree starts out
    /// loading whether or not anyone is signed in; callers kick off the load.
    pub fn mount(store: &dyn SessionStore) -> Self {
        let session = match store.load() {
            Ok(session) => session,
            Err(err) => {
                warn!("ignoring unreadable persisted session: {err:#}");
                None
            }
        };
        if let Some(session) = &session {
            info!(user_id = session.user.id.0, "restored persisted session");
        }
        Self {
            session,
            tree: TreeState::Loading,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref().map(|session| &session.user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_tree_loading(&self) -> bool {
        matches!(self.tree, TreeState::Loading)
    }

    pub fn nodes(&self) -> &[OperationNode] {
        match &self.tree {
            TreeState::Loading => &[],
            TreeState::Loaded(nodes) => nodes,
        }
    }

    /// Persists and adopts the session from a successful login or
    /// registration. The caller reloads the tree afterwards.
    pub fn sign_in(&mut self, response: AuthResponse, store: &dyn SessionStore) {
        let session = Session::from(response);
        if let Err(err) = store.save(&session) {
            warn!("session will not survive a restart: {err:#}");
        }
        info!(user_id = session.user.id.0, "session established");
        self.session = Some(session);
    }

    /// Drops the session. The loaded tree stays on screen.
    pub fn logout(&mut self, store: &dyn SessionStore) {
        if let Err(err) = store.clear() {
            warn!("failed to clear persisted session: {err:#}");
        }
        if let Some(session) = self.session.take() {
            info!(user_id = session.user.id.0, "signed out");
        }
    }

    /// Failures are logged only: a first load degrades to an empty tree and
    /// a later reload keeps the snapshot already on screen.
    pub fn finish_tree_load(&mut self, result: Result<Vec<OperationNode>, ClientError>) {
        match result {
            Ok(nodes) => self.tree = TreeState::Loaded(nodes),
            Err(err) => {
                error!("error loading calculations: {err}");
                if self.is_tree_loading() {
                    self.tree = TreeState::Loaded(Vec::new());
                }
            }
        }
    }

    pub async fn reload_tree(&mut self, api: &dyn NumberSocialApi) {
        let result = api.calculation_tree(self.session.as_ref()).await;
        self.finish_tree_load(result);
    }

    /// `None` while the first load is still running.
    pub fn render(&self) -> Option<TreeView> {
        match &self.tree {
            TreeState::Loading => None,
            TreeState::Loaded(nodes) => Some(render_tree(nodes, self.is_authenticated())),
        }
    }

    pub fn thread_summary(&self) -> Option<String> {
        match &self.tree {
            TreeState::Loading => None,
            TreeState::Loaded(nodes) => Some(thread_summary(nodes)),
        }
    }
}

#[cfg(test)]
#[path = "tests/root_view_tests.rs"]
mod tests;
