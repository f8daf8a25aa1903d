use std::{collections::HashMap, path::PathBuf, time::Duration};

use clap::Parser;
use client_core::{
    config::{Settings, SettingsOverrides},
    forms::{AuthForm, AuthMode, OperationForm, StartingNumberForm},
    root_view::RootView,
    session::SESSION_FILE_NAME,
    tree::{RenderedNode, ReplyTarget, TreeView},
    ClientError, SessionStore,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{find_node, NodeId, OperationType};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const TAGLINE: &str = "Start a number, respond with operations, and watch the conversation evolve.";
const INDENT_PER_LEVEL: f32 = 24.0;
const ACCENT: egui::Color32 = egui::Color32::from_rgb(91, 75, 255);
const ERROR_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 38, 38);
const WARNING_COLOR: egui::Color32 = egui::Color32::from_rgb(217, 119, 6);

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "number-social-gui", about = "Desktop client for number threads")]
pub struct StartupConfig {
    /// API base URL; overrides the config file and NUMBER_SOCIAL_API_URL.
    #[arg(long)]
    pub api_url: Option<String>,
    /// Directory holding the persisted session.
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl StartupConfig {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            api_base_url: self.api_url.clone(),
            data_dir: self.data_dir.clone(),
            config_file: self.config.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub data_root: PathBuf,
    pub session_path: PathBuf,
}

impl AppPaths {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            session_path: settings.data_dir.join(SESSION_FILE_NAME),
            data_root: settings.data_dir.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusBannerSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct StatusBanner {
    severity: StatusBannerSeverity,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowAction {
    Respond(ReplyTarget),
    Submit(NodeId),
    Cancel(NodeId),
}

pub struct NumberSocialApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    session_store: Box<dyn SessionStore>,
    root: RootView,
    auth_form: AuthForm,
    auth_window_open: bool,
    starting_form: StartingNumberForm,
    reply_forms: HashMap<NodeId, OperationForm>,
    status: String,
    status_banner: Option<StatusBanner>,
}

impl NumberSocialApp {
    /// Restores the persisted session and queues the first tree load.
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        session_store: Box<dyn SessionStore>,
    ) -> Self {
        let root = RootView::mount(session_store.as_ref());
        let status = match root.current_user() {
            Some(user) => format!("Signed in as @{}", user.username),
            None => "Not signed in".to_string(),
        };
        let mut app = Self {
            cmd_tx,
            ui_rx,
            session_store,
            root,
            auth_form: AuthForm::default(),
            auth_window_open: false,
            starting_form: StartingNumberForm::new(),
            reply_forms: HashMap::new(),
            status,
            status_banner: None,
        };
        app.request_tree_load();
        app
    }

    fn request_tree_load(&mut self) {
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::LoadTree {
                session: self.root.session().cloned(),
            },
            &mut self.status,
        );
    }

    fn open_auth(&mut self, mode: AuthMode) {
        self.auth_form.set_mode(mode);
        self.auth_window_open = true;
    }

    fn submit_auth(&mut self) {
        let credentials = match self.auth_form.begin_submit() {
            Ok(credentials) => credentials,
            Err(err) => {
                tracing::debug!("auth form not sent: {err}");
                return;
            }
        };
        let cmd = match self.auth_form.mode() {
            AuthMode::Login => BackendCommand::Login { credentials },
            AuthMode::Register => BackendCommand::Register { credentials },
        };
        if !dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.auth_form
                .finish(Err(ClientError::Network(self.status.clone())));
        }
    }

    fn submit_starting_number(&mut self) {
        let Some(session) = self.root.session().cloned() else {
            self.open_auth(AuthMode::Login);
            return;
        };
        let request = match self.starting_form.begin_submit() {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!("starting number not sent: {err}");
                return;
            }
        };
        let cmd = BackendCommand::CreateStartingNumber { session, request };
        if !dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.starting_form
                .finish(Err(ClientError::Network(self.status.clone())), || {});
        }
    }

    fn submit_reply(&mut self, parent_id: NodeId) {
        let Some(session) = self.root.session().cloned() else {
            self.open_auth(AuthMode::Login);
            return;
        };
        let Some(form) = self.reply_forms.get_mut(&parent_id) else {
            return;
        };
        let request = match form.begin_submit() {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(node_id = parent_id.0, "reply not sent: {err}");
                return;
            }
        };
        let cmd = BackendCommand::CreateOperation { session, request };
        if !dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            form.finish(Err(ClientError::Network(self.status.clone())), || {});
        }
    }

    fn logout(&mut self) {
        self.root.logout(self.session_store.as_ref());
        self.reply_forms.clear();
        self.starting_form = StartingNumberForm::new();
        self.status = "Signed out".to_string();
        self.status_banner = None;
    }

    fn apply_row_action(&mut self, action: RowAction) {
        match action {
            RowAction::Respond(target) => self
                .reply_forms
                .entry(target.parent_id)
                .or_insert_with(|| OperationForm::new(target))
                .open(),
            RowAction::Submit(node_id) => self.submit_reply(node_id),
            RowAction::Cancel(node_id) => {
                if let Some(form) = self.reply_forms.get_mut(&node_id) {
                    form.cancel();
                }
            }
        }
    }

    /// Rejected creations keep their form error; an auth rejection also
    /// raises a banner since the stored session is probably stale.
    fn note_creation_failure(&mut self, err: &ClientError) {
        let err = UiError::from_client(UiErrorContext::CreateNode, err);
        if err.requires_reauth() {
            self.status_banner = Some(StatusBanner {
                severity: StatusBannerSeverity::Warning,
                message: format!("{}. Log out and sign in again.", err.message()),
            });
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    tracing::error!(context = ?err.context(), "{}", err.message());
                    self.status_banner = Some(StatusBanner {
                        severity: StatusBannerSeverity::Error,
                        message: err.message().to_string(),
                    });
                }
                UiEvent::TreeLoaded(result) => {
                    self.root.finish_tree_load(result);
                    let nodes = self.root.nodes();
                    self.reply_forms
                        .retain(|node_id, _| find_node(nodes, *node_id).is_some());
                }
                UiEvent::AuthFinished(result) => {
                    if let Some(response) = self.auth_form.finish(result) {
                        self.status = format!("Signed in as @{}", response.user.username);
                        self.root.sign_in(response, self.session_store.as_ref());
                        self.auth_window_open = false;
                        self.status_banner = None;
                        self.request_tree_load();
                    }
                }
                UiEvent::StartingNumberFinished(result) => {
                    if let Err(err) = &result {
                        self.note_creation_failure(err);
                    }
                    let mut created = false;
                    self.starting_form.finish(result, || created = true);
                    if created {
                        self.request_tree_load();
                    }
                }
                UiEvent::OperationFinished { parent_id, result } => {
                    if let Err(err) = &result {
                        self.note_creation_failure(err);
                    }
                    let mut created = false;
                    match self.reply_forms.get_mut(&parent_id) {
                        Some(form) => {
                            form.finish(result, || created = true);
                        }
                        None => {
                            tracing::debug!(node_id = parent_id.0, "reply form gone before result");
                            created = result.is_ok();
                        }
                    }
                    if created {
                        self.request_tree_load();
                    }
                }
            }
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        let mut open_mode = None;
        let mut logout = false;
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.vertical(|ui| {
                    ui.heading("Number Social");
                    ui.weak(TAGLINE);
                });
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match self.root.current_user() {
                        Some(user) => {
                            logout = ui.button("Logout").clicked();
                            ui.label(
                                egui::RichText::new(format!("@{}", user.username)).color(ACCENT),
                            );
                            ui.label("Signed in as");
                        }
                        None => {
                            if ui.button("Register").clicked() {
                                open_mode = Some(AuthMode::Register);
                            }
                            if ui.button("Login").clicked() {
                                open_mode = Some(AuthMode::Login);
                            }
                        }
                    }
                });
            });
            ui.add_space(8.0);
        });

        if logout {
            self.logout();
        }
        if let Some(mode) = open_mode {
            self.open_auth(mode);
        }
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.weak(self.status.as_str());
        });
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = &self.status_banner else {
            return;
        };
        let color = match banner.severity {
            StatusBannerSeverity::Warning => WARNING_COLOR,
            StatusBannerSeverity::Error => ERROR_COLOR,
        };
        let mut dismiss = false;
        ui.horizontal(|ui| {
            ui.colored_label(color, banner.message.as_str());
            dismiss = ui.small_button("Dismiss").clicked();
        });
        if dismiss {
            self.status_banner = None;
        }
        ui.add_space(6.0);
    }

    fn show_auth_window(&mut self, ctx: &egui::Context) {
        if !self.auth_window_open {
            return;
        }
        let mode = self.auth_form.mode();
        let mut open = true;
        let mut submit = false;
        egui::Window::new(mode.title())
            .id(egui::Id::new("auth_window"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .open(&mut open)
            .show(ctx, |ui| {
                let form = &mut self.auth_form;
                ui.weak(mode.subtitle());
                ui.add_space(6.0);
                ui.label("Username");
                ui.add(egui::TextEdit::singleline(&mut form.username).hint_text("e.g. math_wizard"));
                ui.label("Password");
                let password = ui.add(
                    egui::TextEdit::singleline(&mut form.password)
                        .password(true)
                        .hint_text("At least 6 characters"),
                );
                submit |= password.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                if let Some(err) = form.error() {
                    ui.colored_label(ERROR_COLOR, err);
                }
                ui.add_space(4.0);
                submit |= ui
                    .add_enabled(!form.is_submitting(), egui::Button::new(form.submit_label()))
                    .clicked();
            });

        if submit {
            self.submit_auth();
        }
        if !open {
            self.auth_window_open = false;
        }
    }

    fn show_starting_panel(&mut self, ui: &mut egui::Ui) {
        let mut submit = false;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            let form = &mut self.starting_form;
            ui.label(egui::RichText::new("Start a new thread").strong());
            ui.weak(
                "Pick a starting number. Others will reply by adding, subtracting, multiplying, or dividing.",
            );
            ui.horizontal(|ui| {
                ui.label("Starting number");
                let input = ui.add(
                    egui::TextEdit::singleline(&mut form.input)
                        .hint_text("e.g. 42")
                        .desired_width(160.0),
                );
                submit |= input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                submit |= ui
                    .add_enabled(!form.is_submitting(), egui::Button::new(form.submit_label()))
                    .clicked();
            });
            if let Some(err) = form.error() {
                ui.colored_label(ERROR_COLOR, err);
            }
        });
        if submit {
            self.submit_starting_number();
        }
    }

    fn show_tree_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Conversation Tree");
            if let Some(summary) = self.root.thread_summary() {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.weak(summary);
                });
            }
        });
        ui.separator();

        match self.root.render() {
            None => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.weak("Loading conversation…");
                });
            }
            Some(TreeView::Empty { placeholder }) => {
                ui.add_space(12.0);
                ui.vertical_centered(|ui| {
                    ui.weak(placeholder);
                });
            }
            Some(TreeView::Nodes(rows)) => {
                for action in show_tree_rows(ui, &rows, &mut self.reply_forms) {
                    self.apply_row_action(action);
                }
            }
        }
    }
}

fn show_tree_rows(
    ui: &mut egui::Ui,
    rows: &[RenderedNode],
    reply_forms: &mut HashMap<NodeId, OperationForm>,
) -> Vec<RowAction> {
    let mut actions = Vec::new();
    for row in rows {
        ui.horizontal(|ui| {
            ui.add_space(row.depth as f32 * INDENT_PER_LEVEL);
            egui::Frame::group(ui.style()).show(ui, |ui| {
                ui.vertical(|ui| {
                    ui.horizontal(|ui| {
                        ui.label(egui::RichText::new(format!("@{}", row.author)).strong());
                        ui.weak(row.created_at.as_str());
                        if let Some(badge) = row.badge {
                            ui.label(
                                egui::RichText::new(badge.to_uppercase())
                                    .small()
                                    .color(ACCENT),
                            );
                        }
                    });
                    ui.horizontal(|ui| {
                        ui.label(row.label.as_str());
                        ui.weak(format!("= {}", row.value));
                    });
                    let Some(target) = row.reply else {
                        return;
                    };
                    match reply_forms.get_mut(&row.id).filter(|form| form.is_open()) {
                        Some(form) => show_reply_form(ui, row.id, form, &mut actions),
                        None => {
                            if ui.small_button("Respond").clicked() {
                                actions.push(RowAction::Respond(target));
                            }
                        }
                    }
                });
            });
        });
    }
    actions
}

fn show_reply_form(
    ui: &mut egui::Ui,
    node_id: NodeId,
    form: &mut OperationForm,
    actions: &mut Vec<RowAction>,
) {
    let busy = form.is_submitting();
    ui.horizontal(|ui| {
        egui::ComboBox::from_id_salt(("operation", node_id.0))
            .selected_text(operation_choice(form.operation_type))
            .show_ui(ui, |ui| {
                for operation in OperationType::ALL {
                    ui.selectable_value(
                        &mut form.operation_type,
                        operation,
                        operation_choice(operation),
                    );
                }
            });
        let input = ui.add(
            egui::TextEdit::singleline(&mut form.operand_input)
                .hint_text("Number")
                .desired_width(120.0),
        );
        let enter = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let clicked = ui
            .add_enabled(!busy, egui::Button::new(form.submit_label()))
            .clicked();
        if clicked || enter {
            actions.push(RowAction::Submit(node_id));
        }
        if ui.add_enabled(!busy, egui::Button::new("Cancel")).clicked() {
            actions.push(RowAction::Cancel(node_id));
        }
    });
    if let Some(err) = form.error() {
        ui.colored_label(ERROR_COLOR, err);
    }
}

fn operation_choice(operation: OperationType) -> String {
    format!("{} {}", operation.symbol(), operation.as_str())
}

impl eframe::App for NumberSocialApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        self.show_header(ctx);
        self.show_status_bar(ctx);
        self.show_auth_window(ctx);
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_status_banner(ui);
                    if self.root.is_authenticated() {
                        self.show_starting_panel(ui);
                        ui.add_space(12.0);
                    }
                    self.show_tree_panel(ui);
                });
        });

        // Backend results arrive over a channel; poll for them.
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
