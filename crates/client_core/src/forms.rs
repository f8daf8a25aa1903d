//! Form state for the auth dialog, the starting number panel and per-node
//! reply forms.
//!
//! Every form follows the same cycle: `begin_submit` validates the local
//! input and marks the form busy (nothing is sent when it fails), the caller
//! performs the request, and `finish` applies the outcome. `submit` runs the
//! whole cycle against a `NumberSocialApi` for callers that can await inline.

use shared::{
    domain::OperationType,
    protocol::{
        AuthResponse, CreateOperationRequest, CreateStartingNumberRequest, CreatedNode,
        Credentials,
    },
};
use tracing::warn;

use crate::{
    error::ClientError,
    session::Session,
    tree::ReplyTarget,
    validation::{parse_number, validate_credentials, validate_operand, InputError},
    NumberSocialApi,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Local validation failed or a request was already running; nothing was sent.
    Rejected,
    Created,
    Failed,
}

fn failure_message(form: &'static str, err: &ClientError) -> String {
    warn!(form, "submission failed: {err}");
    err.user_message().to_string()
}

#[derive(Debug, Clone, Default)]
pub struct StartingNumberForm {
    pub input: String,
    error: Option<String>,
    in_flight: bool,
}

impl StartingNumberForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    pub fn submit_label(&self) -> &'static str {
        if self.in_flight {
            "Creating…"
        } else {
            "Create starting number"
        }
    }

    pub fn begin_submit(&mut self) -> Result<CreateStartingNumberRequest, InputError> {
        if self.in_flight {
            return Err(InputError::Busy);
        }
        self.error = None;
        match parse_number(&self.input) {
            Ok(number) => {
                self.in_flight = true;
                Ok(CreateStartingNumberRequest { number })
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn finish(
        &mut self,
        result: Result<CreatedNode, ClientError>,
        on_created: impl FnOnce(),
    ) -> SubmitOutcome {
        self.in_flight = false;
        match result {
            Ok(_) => {
                self.input.clear();
                on_created();
                SubmitOutcome::Created
            }
            Err(err) => {
                self.error = Some(failure_message("starting_number", &err));
                SubmitOutcome::Failed
            }
        }
    }

    pub async fn submit(
        &mut self,
        api: &dyn NumberSocialApi,
        session: Option<&Session>,
        on_created: impl FnOnce(),
    ) -> SubmitOutcome {
        let Ok(request) = self.begin_submit() else {
            return SubmitOutcome::Rejected;
        };
        let result = api.create_starting_number(session, &request).await;
        self.finish(result, on_created)
    }
}

/// Reply form scoped to one node. Closed until the reply affordance opens it.
#[derive(Debug, Clone)]
pub struct OperationForm {
    target: ReplyTarget,
    pub operation_type: OperationType,
    pub operand_input: String,
    error: Option<String>,
    in_flight: bool,
    open: bool,
}

impl OperationForm {
    pub fn new(target: ReplyTarget) -> Self {
        Self {
            target,
            operation_type: OperationType::default(),
            operand_input: String::new(),
            error: None,
            in_flight: false,
            open: false,
        }
    }

    pub fn target(&self) -> ReplyTarget {
        self.target
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn submit_label(&self) -> &'static str {
        if self.in_flight {
            "..."
        } else {
            "Submit"
        }
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn cancel(&mut self) {
        self.open = false;
        self.error = None;
        self.operand_input.clear();
    }

    pub fn begin_submit(&mut self) -> Result<CreateOperationRequest, InputError> {
        if self.in_flight {
            return Err(InputError::Busy);
        }
        self.error = None;
        match validate_operand(self.operation_type, &self.operand_input) {
            Ok(right_operand) => {
                self.in_flight = true;
                Ok(CreateOperationRequest {
                    parent_id: self.target.parent_id,
                    parent_type: self.target.parent_type,
                    operation_type: self.operation_type,
                    right_operand,
                })
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn finish(
        &mut self,
        result: Result<CreatedNode, ClientError>,
        on_created: impl FnOnce(),
    ) -> SubmitOutcome {
        self.in_flight = false;
        match result {
            Ok(_) => {
                self.operand_input.clear();
                self.open = false;
                on_created();
                SubmitOutcome::Created
            }
            Err(err) => {
                self.error = Some(failure_message("operation", &err));
                SubmitOutcome::Failed
            }
        }
    }

    pub async fn submit(
        &mut self,
        api: &dyn NumberSocialApi,
        session: Option<&Session>,
        on_created: impl FnOnce(),
    ) -> SubmitOutcome {
        let Ok(request) = self.begin_submit() else {
            return SubmitOutcome::Rejected;
        };
        let result = api.create_operation(session, &request).await;
        self.finish(result, on_created)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    #[default]
    Login,
    Register,
}

impl AuthMode {
    pub fn title(self) -> &'static str {
        match self {
            Self::Login => "Welcome back",
            Self::Register => "Create your account",
        }
    }

    pub fn subtitle(self) -> &'static str {
        match self {
            Self::Login => "Sign in to continue your calculation threads.",
            Self::Register => "Pick a unique username and start your first number conversation.",
        }
    }

    pub fn action_label(self) -> &'static str {
        match self {
            Self::Login => "Sign in",
            Self::Register => "Create account",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuthForm {
    mode: AuthMode,
    pub username: String,
    pub password: String,
    error: Option<String>,
    in_flight: bool,
}

impl AuthForm {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    /// Switching modes keeps the typed username but drops a stale error.
    pub fn set_mode(&mut self, mode: AuthMode) {
        if self.mode != mode {
            self.mode = mode;
            self.error = None;
        }
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight
    }

    pub fn submit_label(&self) -> &'static str {
        if self.in_flight {
            "Please wait…"
        } else {
            self.mode.action_label()
        }
    }

    pub fn begin_submit(&mut self) -> Result<Credentials, InputError> {
        if self.in_flight {
            return Err(InputError::Busy);
        }
        self.error = None;
        if let Err(err) = validate_credentials(&self.username, &self.password) {
            self.error = Some(err.to_string());
            return Err(err);
        }
        self.in_flight = true;
        Ok(Credentials {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
        })
    }

    /// Returns the auth response on success; the form is cleared for reuse.
    pub fn finish(&mut self, result: Result<AuthResponse, ClientError>) -> Option<AuthResponse> {
        self.in_flight = false;
        match result {
            Ok(response) => {
                self.username.clear();
                self.password.clear();
                Some(response)
            }
            Err(err) => {
                self.error = Some(failure_message("auth", &err));
                None
            }
        }
    }

    pub async fn submit(&mut self, api: &dyn NumberSocialApi) -> Option<AuthResponse> {
        let credentials = self.begin_submit().ok()?;
        let result = match self.mode {
            AuthMode::Login => api.login(&credentials).await,
            AuthMode::Register => api.register(&credentials).await,
        };
        self.finish(result)
    }
}

#[cfg(test)]
#[path = "tests/forms_tests.rs"]
mod tests;
