use std::{io::BufRead, path::PathBuf};

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_settings, SettingsOverrides},
    error::FALLBACK_ERROR_MESSAGE,
    forms::{AuthForm, AuthMode, OperationForm, StartingNumberForm, SubmitOutcome},
    root_view::RootView,
    tree::{render_text, ReplyTarget},
    ApiClient, FileSessionStore, NumberSocialApi, Session, SessionStore,
};
use shared::domain::{find_node, NodeId, OperationType};
use tracing::info;
use tracing_subscriber::EnvFilter;

const PASSWORD_ENV: &str = "NUMBER_SOCIAL_PASSWORD";

#[derive(Parser, Debug)]
#[command(name = "number-social", about = "Browse and extend number threads")]
struct Args {
    /// API base URL; overrides the config file and NUMBER_SOCIAL_API_URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Directory holding the persisted session.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the conversation tree.
    Tree,
    Register {
        #[arg(long)]
        username: String,
        /// Read from NUMBER_SOCIAL_PASSWORD, then stdin, when omitted.
        #[arg(long, env = "NUMBER_SOCIAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Login {
        #[arg(long)]
        username: String,
        /// Read from NUMBER_SOCIAL_PASSWORD, then stdin, when omitted.
        #[arg(long, env = "NUMBER_SOCIAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    Logout,
    Whoami,
    /// Start a new thread with a number.
    Start {
        #[arg(allow_hyphen_values = true)]
        number: String,
    },
    /// Reply to a node with an operation.
    Reply {
        parent_id: i64,
        #[arg(value_parser = parse_operation)]
        operation: OperationType,
        #[arg(allow_hyphen_values = true)]
        operand: String,
    },
}

fn parse_operation(raw: &str) -> Result<OperationType, String> {
    OperationType::parse(raw)
        .ok_or_else(|| format!("unknown operation '{raw}' (expected add, subtract, multiply or divide)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings(SettingsOverrides {
        api_base_url: args.api_url,
        data_dir: args.data_dir,
        config_file: args.config,
    })?;
    info!(api = %settings.api_base_url, data_dir = %settings.data_dir.display(), "settings resolved");

    let api = ApiClient::new(settings.api_base_url);
    let store = FileSessionStore::in_data_dir(&settings.data_dir);
    let output = run(args.command, &api, &store).await?;
    print!("{output}");
    Ok(())
}

async fn run(
    command: Command,
    api: &dyn NumberSocialApi,
    store: &dyn SessionStore,
) -> Result<String> {
    let mut root = RootView::mount(store);
    match command {
        Command::Tree => {
            root.reload_tree(api).await;
            Ok(tree_report(&root))
        }
        Command::Register { username, password } => {
            let password = read_password(password, &mut std::io::stdin().lock())?;
            authenticate(AuthMode::Register, username, password, api, store, &mut root).await
        }
        Command::Login { username, password } => {
            let password = read_password(password, &mut std::io::stdin().lock())?;
            authenticate(AuthMode::Login, username, password, api, store, &mut root).await
        }
        Command::Logout => {
            root.logout(store);
            Ok("Signed out\n".to_string())
        }
        Command::Whoami => Ok(match root.current_user() {
            Some(user) => format!("Signed in as @{} (user {})\n", user.username, user.id),
            None => "Not signed in\n".to_string(),
        }),
        Command::Start { number } => {
            let session = require_session(&root)?;
            let mut form = StartingNumberForm::new();
            form.input = number;
            let outcome = form.submit(api, Some(&session), || {}).await;
            creation_result(outcome, form.error())?;
            root.reload_tree(api).await;
            Ok(tree_report(&root))
        }
        Command::Reply {
            parent_id,
            operation,
            operand,
        } => {
            let session = require_session(&root)?;
            let nodes = api
                .calculation_tree(Some(&session))
                .await
                .map_err(|err| anyhow!("failed to load the conversation tree: {err}"))?;
            root.finish_tree_load(Ok(nodes));
            let target = find_node(root.nodes(), NodeId(parent_id))
                .map(ReplyTarget::for_node)
                .ok_or_else(|| anyhow!("no node {parent_id} in the conversation tree"))?;

            let mut form = OperationForm::new(target);
            form.open();
            form.operation_type = operation;
            form.operand_input = operand;
            let outcome = form.submit(api, Some(&session), || {}).await;
            creation_result(outcome, form.error())?;
            root.reload_tree(api).await;
            Ok(tree_report(&root))
        }
    }
}

async fn authenticate(
    mode: AuthMode,
    username: String,
    password: String,
    api: &dyn NumberSocialApi,
    store: &dyn SessionStore,
    root: &mut RootView,
) -> Result<String> {
    let mut form = AuthForm::new(mode);
    form.username = username;
    form.password = password;
    match form.submit(api).await {
        Some(response) => {
            let message = format!("Signed in as @{}\n", response.user.username);
            root.sign_in(response, store);
            Ok(message)
        }
        None => bail!("{}", form.error().unwrap_or(FALLBACK_ERROR_MESSAGE)),
    }
}

/// Uses the flag (or env) value, otherwise reads the first line of `input`.
fn read_password(password: Option<String>, input: &mut impl BufRead) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("no password on stdin; use --password or {PASSWORD_ENV}");
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn require_session(root: &RootView) -> Result<Session> {
    root.session()
        .cloned()
        .ok_or_else(|| anyhow!("not signed in; run `number-social login` first"))
}

fn creation_result(outcome: SubmitOutcome, error: Option<&str>) -> Result<()> {
    match outcome {
        SubmitOutcome::Created => Ok(()),
        SubmitOutcome::Rejected | SubmitOutcome::Failed => {
            bail!("{}", error.unwrap_or(FALLBACK_ERROR_MESSAGE))
        }
    }
}

fn tree_report(root: &RootView) -> String {
    let Some(view) = root.render() else {
        return "Loading conversation…\n".to_string();
    };
    let mut out = String::new();
    if let Some(summary) = root.thread_summary() {
        out.push_str(&summary);
        out.push('\n');
    }
    out.push_str(&render_text(&view));
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use clap::Parser;
    use client_core::{ClientError, MemorySessionStore, Session, SessionStore};
    use shared::{
        domain::{NodeId, OperationNode, OperationType, User, UserId},
        protocol::{
            AuthResponse, CreateOperationRequest, CreateStartingNumberRequest, CreatedNode,
            Credentials,
        },
    };

    use super::{read_password, run, Args, Command, NumberSocialApi};

    struct StubApi {
        tree: Result<Vec<OperationNode>, ClientError>,
        auth_result: Result<AuthResponse, ClientError>,
        created: Mutex<Vec<CreateOperationRequest>>,
        started: Mutex<Vec<f64>>,
    }

    impl StubApi {
        fn with_tree(tree: Vec<OperationNode>) -> Self {
            Self {
                tree: Ok(tree),
                auth_result: Ok(AuthResponse {
                    token: "token-carol".to_string(),
                    user: User {
                        id: UserId(11),
                        username: "carol".to_string(),
                    },
                }),
                created: Mutex::new(Vec::new()),
                started: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl NumberSocialApi for StubApi {
        async fn register(&self, _credentials: &Credentials) -> Result<AuthResponse, ClientError> {
            self.auth_result.clone()
        }

        async fn login(&self, _credentials: &Credentials) -> Result<AuthResponse, ClientError> {
            self.auth_result.clone()
        }

        async fn calculation_tree(
            &self,
            _session: Option<&Session>,
        ) -> Result<Vec<OperationNode>, ClientError> {
            self.tree.clone()
        }

        async fn create_starting_number(
            &self,
            _session: Option<&Session>,
            request: &CreateStartingNumberRequest,
        ) -> Result<CreatedNode, ClientError> {
            self.started.lock().expect("lock").push(request.number);
            Ok(CreatedNode::default())
        }

        async fn create_operation(
            &self,
            _session: Option<&Session>,
            request: &CreateOperationRequest,
        ) -> Result<CreatedNode, ClientError> {
            self.created.lock().expect("lock").push(request.clone());
            Ok(CreatedNode::default())
        }
    }

    fn thread() -> Vec<OperationNode> {
        serde_json::from_str(
            r#"[{"id":1,"type":"starting","user_id":3,"value":10,"created_at":"2024-01-01T00:00:00Z",
                "children":[{"id":2,"type":"operation","user_id":4,"username":"bob",
                "operation_type":"add","right_operand":5,"value":15,
                "created_at":"2024-01-01T00:01:00Z","children":[]}]}]"#,
        )
        .expect("tree")
    }

    fn signed_in_store() -> MemorySessionStore {
        MemorySessionStore::with_session(Session {
            token: "token-carol".to_string(),
            user: User {
                id: UserId(11),
                username: "carol".to_string(),
            },
        })
    }

    #[test]
    fn parses_reply_with_symbol_and_negative_operand() {
        let args = Args::try_parse_from(["number-social", "reply", "2", "÷", "-4"]).expect("args");
        match args.command {
            Command::Reply {
                parent_id,
                operation,
                operand,
            } => {
                assert_eq!(parent_id, 2);
                assert_eq!(operation, OperationType::Divide);
                assert_eq!(operand, "-4");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_operation_names() {
        assert!(Args::try_parse_from(["number-social", "reply", "2", "modulo", "4"]).is_err());
    }

    #[tokio::test]
    async fn tree_prints_summary_and_indented_rows() {
        let api = StubApi::with_tree(thread());
        let out = run(Command::Tree, &api, &MemorySessionStore::default())
            .await
            .expect("tree");

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "1 active thread");
        assert!(lines[1].starts_with("[1] Started the thread with 10 = 10  @user-3"));
        assert!(lines[2].starts_with("  [2] + 5 = 15  @bob"));
        assert!(!out.contains("[reply]"));
    }

    #[tokio::test]
    async fn empty_tree_prints_placeholder() {
        let api = StubApi::with_tree(Vec::new());
        let out = run(Command::Tree, &api, &MemorySessionStore::default())
            .await
            .expect("tree");
        assert_eq!(
            out,
            "No threads yet\nNo conversations yet. Be the first to start a number thread!\n"
        );
    }

    #[tokio::test]
    async fn login_persists_session_for_later_commands() {
        let api = StubApi::with_tree(Vec::new());
        let store = MemorySessionStore::default();

        let out = run(
            Command::Login {
                username: "carol".to_string(),
                password: Some("secret1".to_string()),
            },
            &api,
            &store,
        )
        .await
        .expect("login");
        assert_eq!(out, "Signed in as @carol\n");
        assert_eq!(
            store.load().expect("load").map(|s| s.token),
            Some("token-carol".to_string())
        );

        let whoami = run(Command::Whoami, &api, &store).await.expect("whoami");
        assert_eq!(whoami, "Signed in as @carol (user 11)\n");

        run(Command::Logout, &api, &store).await.expect("logout");
        let whoami = run(Command::Whoami, &api, &store).await.expect("whoami");
        assert_eq!(whoami, "Not signed in\n");
    }

    #[tokio::test]
    async fn rejected_login_reports_server_message() {
        let mut api = StubApi::with_tree(Vec::new());
        api.auth_result = Err(ClientError::Auth("Invalid credentials".to_string()));
        let store = MemorySessionStore::default();

        let err = run(
            Command::Login {
                username: "carol".to_string(),
                password: Some("wrongpassword".to_string()),
            },
            &api,
            &store,
        )
        .await
        .expect_err("rejected");

        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(store.load().expect("load"), None);
    }

    #[tokio::test]
    async fn reply_resolves_parent_type_from_tree() {
        let api = StubApi::with_tree(thread());
        run(
            Command::Reply {
                parent_id: 2,
                operation: OperationType::Multiply,
                operand: "3".to_string(),
            },
            &api,
            &signed_in_store(),
        )
        .await
        .expect("reply");

        let created = api.created.lock().expect("lock").clone();
        assert_eq!(
            created,
            vec![CreateOperationRequest {
                parent_id: NodeId(2),
                parent_type: shared::domain::NodeKind::Operation,
                operation_type: OperationType::Multiply,
                right_operand: 3.0,
            }]
        );
    }

    #[tokio::test]
    async fn divide_by_zero_reply_never_reaches_the_api() {
        let api = StubApi::with_tree(thread());
        let err = run(
            Command::Reply {
                parent_id: 1,
                operation: OperationType::Divide,
                operand: "0".to_string(),
            },
            &api,
            &signed_in_store(),
        )
        .await
        .expect_err("division by zero");

        assert_eq!(err.to_string(), "Division by zero is not allowed");
        assert!(api.created.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn reply_to_unknown_node_fails() {
        let api = StubApi::with_tree(thread());
        let err = run(
            Command::Reply {
                parent_id: 99,
                operation: OperationType::Add,
                operand: "1".to_string(),
            },
            &api,
            &signed_in_store(),
        )
        .await
        .expect_err("unknown parent");
        assert!(err.to_string().contains("no node 99"));
    }

    #[tokio::test]
    async fn reply_reports_tree_load_failure() {
        let mut api = StubApi::with_tree(thread());
        api.tree = Err(ClientError::Network("connection refused".to_string()));
        let err = run(
            Command::Reply {
                parent_id: 1,
                operation: OperationType::Add,
                operand: "2".to_string(),
            },
            &api,
            &signed_in_store(),
        )
        .await
        .expect_err("tree unavailable");

        let message = err.to_string();
        assert!(message.contains("connection refused"), "{message}");
        assert!(!message.contains("no node"), "{message}");
        assert!(api.created.lock().expect("lock").is_empty());
    }

    #[test]
    fn login_parses_without_password_flag() {
        let args = Args::try_parse_from(["number-social", "login", "--username", "carol"])
            .expect("args");
        assert!(matches!(args.command, Command::Login { ref username, .. } if username == "carol"));
    }

    #[test]
    fn password_flag_wins_over_stdin() {
        let mut input = std::io::Cursor::new("from-stdin\n");
        let password = read_password(Some("secret1".to_string()), &mut input).expect("password");
        assert_eq!(password, "secret1");
    }

    #[test]
    fn password_is_read_from_first_stdin_line() {
        let mut input = std::io::Cursor::new("secret1\r\nignored\n");
        assert_eq!(read_password(None, &mut input).expect("password"), "secret1");

        let mut empty = std::io::Cursor::new("");
        assert!(read_password(None, &mut empty).is_err());
    }

    #[tokio::test]
    async fn start_requires_a_session() {
        let api = StubApi::with_tree(Vec::new());
        let err = run(
            Command::Start {
                number: "42".to_string(),
            },
            &api,
            &MemorySessionStore::default(),
        )
        .await
        .expect_err("anonymous start");
        assert!(err.to_string().contains("not signed in"));
        assert!(api.started.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn start_sends_parsed_number() {
        let api = StubApi::with_tree(Vec::new());
        run(
            Command::Start {
                number: " 42.5 ".to_string(),
            },
            &api,
            &signed_in_store(),
        )
        .await
        .expect("start");
        assert_eq!(*api.started.lock().expect("lock"), vec![42.5]);
    }
}
