//! Main application state and UI coordination

use std::ops::Range;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::core::auth::PasswordGate;
use crate::core::config::AppConfig;
use crate::core::library;
use crate::core::notebook::{slugify, Notebook};
use crate::core::storage::{DraftStore, FileStore, MemoryStore};
use crate::editor::{ops, Debouncer, ToolbarAction};
use crate::markdown::{self, ParsedBlock};
use crate::sync::github::{GitHubConfig, RemoteEntry};
use crate::sync::{SyncError, SyncEvent, SyncTask, SyncWorker};
use crate::ui::editor::{EditorPanel, EDITOR_ID};
use crate::ui::library::LibraryPanel;
use crate::ui::login::LoginPanel;
use crate::ui::preview::PreviewPanel;
use crate::ui::settings::{SettingsForm, SettingsPanel};
use crate::ui::whiteboard::{PenState, WhiteboardPanel};
use crate::whiteboard::Whiteboard;

/// Whiteboard used while no notebook is open
const SCRATCH_BOARD: &str = "scratch";

/// Top-level screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    Locked,
    #[default]
    Library,
    Editor,
    Whiteboard,
    Settings,
}

/// View mode for the editor area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    Editor,
    Preview,
    #[default]
    Split,
}

/// Message shown in the status bar
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Main application state
pub struct InkpadApp {
    /// Application configuration
    pub config: AppConfig,
    /// Survives restarts: drafts, whiteboards, password hash
    pub store: FileStore,
    /// Lives as long as the process: unlock flag, failed attempts
    pub session: MemoryStore,
    pub view: View,
    pub view_mode: ViewMode,
    /// Notebook open in the editor
    pub notebook: Option<Notebook>,
    /// Edited since the last draft save
    pub modified: bool,
    /// Last known editor selection in bytes
    pub selection: Range<usize>,
    pub autosave: Debouncer,
    /// Local drafts, most recent first
    pub drafts: Vec<Notebook>,
    /// Files in the remote notes directory
    pub remote: Vec<RemoteEntry>,
    pub sync: Option<SyncWorker>,
    /// Slug whose fetch should open in the editor when it arrives
    pending_open: Option<String>,
    pub status: Option<StatusMessage>,
    pub whiteboard: Whiteboard,
    /// Key the current whiteboard is saved under
    pub board_slug: String,
    pub pen: PenState,
    /// Parsed preview blocks for the content they were built from
    pub preview_cache: Option<(String, Vec<ParsedBlock>)>,
    pub login_password: String,
    pub login_error: Option<String>,
    pub settings_form: SettingsForm,
    pub tag_input: String,
    pub new_title: String,
    pub filter: String,
    pub confirm_delete: Option<String>,
    egui_ctx: egui::Context,
}

impl InkpadApp {
    /// Create a new application instance
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = AppConfig::load().unwrap_or_else(|e| {
            tracing::warn!("Using default config: {:#}", e);
            AppConfig::default()
        });
        Self::configure_style(&cc.egui_ctx, &config);
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let store = FileStore::open(AppConfig::data_dir().join("store.json"));
        tracing::info!("Opened store at {}", store.path().display());

        let sync = match SyncWorker::new() {
            Ok(worker) => Some(worker),
            Err(e) => {
                tracing::error!("Sync disabled: {:#}", e);
                None
            }
        };

        let whiteboard = Whiteboard::load(&store, SCRATCH_BOARD, config.whiteboard.history_capacity);
        let pen = PenState::from_config(&config.whiteboard);
        let autosave = Debouncer::new(Duration::from_millis(config.editor.autosave_delay_ms));

        let mut app = Self {
            config,
            store,
            session: MemoryStore::new(),
            view: View::Library,
            view_mode: ViewMode::default(),
            notebook: None,
            modified: false,
            selection: 0..0,
            autosave,
            drafts: Vec::new(),
            remote: Vec::new(),
            sync,
            pending_open: None,
            status: None,
            whiteboard,
            board_slug: SCRATCH_BOARD.to_string(),
            pen,
            preview_cache: None,
            login_password: String::new(),
            login_error: None,
            settings_form: SettingsForm::default(),
            tag_input: String::new(),
            new_title: String::new(),
            filter: String::new(),
            confirm_delete: None,
            egui_ctx: cc.egui_ctx.clone(),
        };

        app.refresh_drafts();
        if let Some(slug) = app.config.last_notebook.clone() {
            if let Some(notebook) = DraftStore::new(&mut app.store).load(&slug) {
                app.open_notebook(notebook);
            }
        }

        if app.gate().is_unlocked() {
            app.refresh_remote();
        } else {
            app.view = View::Locked;
        }
        app
    }

    /// Apply theme and editor font size
    pub fn configure_style(ctx: &egui::Context, config: &AppConfig) {
        ctx.set_visuals(config.ui.theme.visuals());
        let font_size = config.editor.font_size;
        ctx.style_mut(|style| {
            style.text_styles.insert(
                egui::TextStyle::Monospace,
                egui::FontId::monospace(font_size),
            );
        });
    }

    pub fn gate(&mut self) -> PasswordGate<'_, FileStore, MemoryStore> {
        PasswordGate::new(&mut self.store, &mut self.session)
    }

    /// Try the password typed on the lock screen
    pub fn unlock(&mut self) {
        let password = std::mem::take(&mut self.login_password);
        match self.gate().unlock(&password) {
            Ok(()) => {
                tracing::info!("Unlocked");
                self.login_error = None;
                self.view = if self.notebook.is_some() {
                    View::Editor
                } else {
                    View::Library
                };
                self.refresh_remote();
            }
            Err(e) => {
                tracing::warn!("Unlock failed: {}", e);
                self.login_error = Some(e.to_string());
            }
        }
    }

    pub fn lock(&mut self) {
        self.save_draft();
        self.save_whiteboard();
        if let Err(e) = self.gate().lock() {
            self.set_error(format!("Failed to lock: {}", e));
            return;
        }
        if self.gate().has_password() {
            self.view = View::Locked;
        } else {
            self.set_info("Set a password in Settings to enable locking");
        }
    }

    pub fn set_info(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        let text = text.into();
        tracing::error!("{}", text);
        self.status = Some(StatusMessage {
            text,
            is_error: true,
        });
    }

    pub fn save_config(&mut self) {
        if let Err(e) = self.config.save() {
            self.set_error(format!("Failed to save settings: {:#}", e));
        }
    }

    pub fn refresh_drafts(&mut self) {
        self.drafts = DraftStore::new(&mut self.store).list();
    }

    pub fn has_draft(&self, slug: &str) -> bool {
        self.drafts.iter().any(|d| d.slug == slug)
    }

    pub fn remote_entry(&self, slug: &str) -> Option<&RemoteEntry> {
        self.remote.iter().find(|e| e.slug() == slug)
    }

    /// Hand a task to the sync worker. Returns `false` if it could not be sent.
    pub fn submit(&mut self, task: SyncTask) -> bool {
        if !self.config.github.is_configured() {
            self.set_error("Configure GitHub sync in Settings first");
            return false;
        }
        let Some(worker) = self.sync.as_mut() else {
            self.set_error("Sync is unavailable");
            return false;
        };
        let ctx = self.egui_ctx.clone();
        worker.submit(&self.config.github, task, move || ctx.request_repaint());
        true
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.as_ref().is_some_and(|w| w.is_busy())
    }

    /// Re-list the remote notes directory if sync is configured
    pub fn refresh_remote(&mut self) {
        if self.config.github.is_configured() {
            self.submit(SyncTask::ListNotes);
        }
    }

    /// A slug derived from `base` that no draft or remote file uses
    fn unique_slug(&self, base: &str) -> String {
        library::unique_slug(base, |slug| {
            self.has_draft(slug) || self.remote_entry(slug).is_some()
        })
    }

    /// Create a notebook and open it as a draft
    pub fn create_notebook(&mut self, title: &str) {
        let mut notebook = Notebook::new(title);
        notebook.slug = self.unique_slug(&notebook.slug);
        tracing::info!("Created notebook {}", notebook.slug);
        self.open_notebook(notebook);
        self.modified = true;
        self.save_draft();
    }

    /// Make `notebook` the one being edited
    pub fn open_notebook(&mut self, notebook: Notebook) {
        self.save_draft();
        let slug = notebook.slug.clone();
        self.tag_input = notebook.tags.join(", ");
        self.notebook = Some(notebook);
        self.modified = false;
        self.selection = 0..0;
        self.preview_cache = None;
        self.switch_whiteboard(&slug);

        if self.config.last_notebook.as_deref() != Some(slug.as_str()) {
            self.config.last_notebook = Some(slug);
            self.save_config();
        }
        if self.view != View::Locked {
            self.view = View::Editor;
        }
    }

    pub fn close_notebook(&mut self) {
        self.save_draft();
        self.notebook = None;
        self.preview_cache = None;
        self.switch_whiteboard(SCRATCH_BOARD);
        self.config.last_notebook = None;
        self.save_config();
        self.view = View::Library;
    }

    /// Open by slug: the local draft if there is one, else fetch the remote copy
    pub fn open_slug(&mut self, slug: &str) {
        if self.notebook.as_ref().is_some_and(|n| n.slug == slug) {
            self.view = View::Editor;
            return;
        }
        if let Some(notebook) = DraftStore::new(&mut self.store).load(slug) {
            self.open_notebook(notebook);
            return;
        }
        if self.remote_entry(slug).is_some() {
            self.fetch_into_editor(slug);
            return;
        }
        self.set_error(format!("No notebook named {}", slug));
    }

    /// Follow a wiki link, creating the target if it does not exist
    pub fn navigate_to_note(&mut self, target: &str) {
        let slug = slugify(target);
        let known = DraftStore::new(&mut self.store).exists(&slug) || self.remote_entry(&slug).is_some();
        if known {
            self.open_slug(&slug);
        } else {
            self.create_notebook(target);
        }
    }

    fn fetch_into_editor(&mut self, slug: &str) {
        if self.submit(SyncTask::Fetch(slug.to_string())) {
            self.pending_open = Some(slug.to_string());
            self.set_info(format!("Fetching {}...", slug));
        }
    }

    /// Replace the open notebook with its remote copy, discarding the draft
    pub fn pull_remote(&mut self) {
        let Some(slug) = self.notebook.as_ref().map(|n| n.slug.clone()) else {
            return;
        };
        self.autosave.flush();
        self.modified = false;
        self.fetch_into_editor(&slug);
    }

    /// Record an edit made in the editor
    pub fn mark_modified(&mut self) {
        self.modified = true;
        self.autosave.touch(Instant::now());
    }

    /// Persist the open notebook as a draft if it has unsaved edits
    pub fn save_draft(&mut self) {
        self.autosave.flush();
        if !self.modified {
            return;
        }
        let Some(notebook) = self.notebook.as_ref() else {
            return;
        };
        match DraftStore::new(&mut self.store).save(notebook) {
            Ok(()) => {
                self.modified = false;
                self.refresh_drafts();
            }
            Err(e) => self.set_error(format!("Failed to save draft: {:#}", e)),
        }
    }

    /// Save the draft and push the notebook to the repository
    pub fn publish(&mut self) {
        self.save_draft();
        let Some(notebook) = self.notebook.clone() else {
            return;
        };
        if self.submit(SyncTask::Publish(notebook)) {
            self.set_info("Publishing...");
        }
    }

    /// Delete a notebook locally and, if published, remotely
    pub fn delete_notebook(&mut self, slug: &str) {
        if let Err(e) = library::forget_notebook(&mut self.store, slug) {
            self.set_error(format!("Failed to delete {}: {:#}", slug, e));
            return;
        }

        if self.notebook.as_ref().is_some_and(|n| n.slug == slug) {
            self.modified = false;
            self.autosave.flush();
            self.close_notebook();
        }

        if let Some(sha) = self.remote_entry(slug).map(|e| e.sha.clone()) {
            self.submit(SyncTask::Delete {
                slug: slug.to_string(),
                sha,
            });
        } else {
            self.set_info(format!("Deleted {}", slug));
        }
        self.refresh_drafts();
    }

    /// Load the whiteboard belonging to `slug`, saving the current one first
    fn switch_whiteboard(&mut self, slug: &str) {
        if self.board_slug == slug {
            return;
        }
        self.save_whiteboard();
        self.whiteboard = Whiteboard::load(&self.store, slug, self.config.whiteboard.history_capacity);
        self.board_slug = slug.to_string();
    }

    pub fn save_whiteboard(&mut self) {
        if !self.whiteboard.is_dirty() {
            return;
        }
        if let Err(e) = self.whiteboard.save(&mut self.store, &self.board_slug) {
            self.set_error(format!("Failed to save whiteboard: {:#}", e));
        }
    }

    /// Apply a toolbar action to the editor's current selection
    pub fn apply_action(&mut self, ctx: &egui::Context, action: ToolbarAction) {
        let Some(notebook) = self.notebook.as_mut() else {
            return;
        };
        let id = egui::Id::new(EDITOR_ID);
        let mut state = egui::text_edit::TextEditState::load(ctx, id).unwrap_or_default();

        let selection = state
            .cursor
            .char_range()
            .map(|range| {
                let (a, b) = (range.primary.index, range.secondary.index);
                ops::byte_offset(&notebook.content, a.min(b))
                    ..ops::byte_offset(&notebook.content, a.max(b))
            })
            .unwrap_or_else(|| self.selection.clone());

        let edit = action.apply(&notebook.content, selection);
        let start = ops::char_index(&edit.text, edit.selection.start);
        let end = ops::char_index(&edit.text, edit.selection.end);
        self.selection = edit.selection.clone();
        let changed = notebook.set_content(edit.text);

        state
            .cursor
            .set_char_range(Some(egui::text::CCursorRange::two(
                egui::text::CCursor::new(start),
                egui::text::CCursor::new(end),
            )));
        state.store(ctx, id);
        ctx.memory_mut(|mem| mem.request_focus(id));

        if changed {
            self.mark_modified();
        }
    }

    /// Move the editor cursor to a byte offset in the open notebook
    pub fn jump_to(&mut self, ctx: &egui::Context, offset: usize) {
        let Some(notebook) = self.notebook.as_ref() else {
            return;
        };
        let offset = offset.min(notebook.content.len());
        let index = ops::char_index(&notebook.content, offset);
        let id = egui::Id::new(EDITOR_ID);
        let mut state = egui::text_edit::TextEditState::load(ctx, id).unwrap_or_default();
        state
            .cursor
            .set_char_range(Some(egui::text::CCursorRange::one(egui::text::CCursor::new(index))));
        state.store(ctx, id);
        ctx.memory_mut(|mem| mem.request_focus(id));

        self.selection = offset..offset;
        self.view = View::Editor;
        if self.view_mode == ViewMode::Preview {
            self.view_mode = ViewMode::Split;
        }
    }

    /// Write the open notebook as a standalone HTML page
    pub fn export_html(&mut self) {
        let Some(notebook) = self.notebook.as_ref() else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.html", notebook.slug))
            .add_filter("HTML", &["html"])
            .save_file()
        else {
            return;
        };
        let html = markdown::render_document(&notebook.title, &notebook.content);
        match std::fs::write(&path, html) {
            Ok(()) => self.set_info(format!("Exported {}", path.display())),
            Err(e) => self.set_error(format!("Failed to export {}: {}", path.display(), e)),
        }
    }

    /// Write the current whiteboard as SVG
    pub fn export_svg(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .set_file_name(format!("{}.svg", self.board_slug))
            .add_filter("SVG", &["svg"])
            .save_file()
        else {
            return;
        };
        match std::fs::write(&path, self.whiteboard.canvas().to_svg()) {
            Ok(()) => self.set_info(format!("Exported {}", path.display())),
            Err(e) => self.set_error(format!("Failed to export {}: {}", path.display(), e)),
        }
    }

    /// Open the published file on github.com
    pub fn open_on_github(&mut self) {
        let Some(slug) = self.notebook.as_ref().map(|n| n.slug.clone()) else {
            return;
        };
        let url = self
            .remote_entry(&slug)
            .and_then(|e| e.html_url.clone())
            .or_else(|| {
                GitHubConfig::from_settings(&self.config.github)
                    .ok()
                    .map(|c| c.html_url(&slug))
            });
        let Some(url) = url else {
            self.set_error("GitHub sync is not configured");
            return;
        };
        self.open_url(&url);
    }

    pub fn open_url(&mut self, url: &str) {
        if let Err(e) = open::that(url) {
            self.set_error(format!("Failed to open {}: {}", url, e));
        }
    }

    /// Apply finished sync work
    fn handle_sync_events(&mut self) {
        let events = match self.sync.as_mut() {
            Some(worker) => worker.drain(),
            None => return,
        };

        for event in events {
            match event {
                SyncEvent::Access(access) => {
                    if access.can_push {
                        self.set_info(format!("Connected to {}", access.full_name));
                    } else {
                        self.set_error(format!("Token cannot push to {}", access.full_name));
                    }
                }
                SyncEvent::Listed(entries) => {
                    tracing::debug!("Remote has {} notes", entries.len());
                    self.remote = entries;
                }
                SyncEvent::Fetched(notebook) => {
                    if self.pending_open.as_deref() != Some(notebook.slug.as_str()) {
                        continue;
                    }
                    self.pending_open = None;
                    if let Err(e) = library::adopt_remote(&mut self.store, &notebook) {
                        tracing::warn!("Failed to drop draft {}: {:#}", notebook.slug, e);
                    }
                    // The draft was replaced, so nothing is pending for the open copy
                    if self.notebook.as_ref().is_some_and(|n| n.slug == notebook.slug) {
                        self.modified = false;
                        self.notebook = None;
                    }
                    self.set_info(format!("Opened {} from GitHub", notebook.slug));
                    self.open_notebook(notebook);
                    self.refresh_drafts();
                }
                SyncEvent::Published { notebook: published, sha } => {
                    let slug = published.slug.clone();
                    let open = self.notebook.as_mut().filter(|n| n.slug == slug);
                    let is_open = open.is_some();
                    match library::settle_published(&mut self.store, open, &published, &sha) {
                        Ok(outcome) => {
                            tracing::debug!("Published {}: {:?}", slug, outcome);
                            // Whatever the open copy holds is now stored
                            if is_open {
                                self.modified = false;
                                self.autosave.flush();
                            }
                            self.set_info(format!("Published {}", slug));
                        }
                        Err(e) => self.set_error(format!(
                            "Published {} but failed to update the draft: {:#}",
                            slug, e
                        )),
                    }
                    self.refresh_drafts();
                    self.refresh_remote();
                }
                SyncEvent::Deleted(slug) => {
                    self.remote.retain(|e| e.slug() != slug);
                    self.set_info(format!("Deleted {} from GitHub", slug));
                }
                SyncEvent::Failed { task, error } => {
                    if self.pending_open.is_some() && task.starts_with("fetch") {
                        self.pending_open = None;
                    }
                    match error {
                        SyncError::Conflict => self.set_error(format!(
                            "Could not {}: the GitHub copy changed. Pull it before publishing again.",
                            task
                        )),
                        error => self.set_error(format!("Could not {}: {}", task, error)),
                    }
                }
            }
        }
    }

    /// Handle keyboard shortcuts
    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        use egui::{Key, Modifiers};

        let in_editor = self.view == View::Editor && self.notebook.is_some();
        let on_board = self.view == View::Whiteboard;

        let (publish, save, bold, italic, link) = ctx.input_mut(|i| {
            (
                i.consume_key(Modifiers::COMMAND | Modifiers::SHIFT, Key::P),
                i.consume_key(Modifiers::COMMAND, Key::S),
                in_editor && i.consume_key(Modifiers::COMMAND, Key::B),
                in_editor && i.consume_key(Modifiers::COMMAND, Key::I),
                in_editor && i.consume_key(Modifiers::COMMAND, Key::K),
            )
        });
        let (redo, undo) = if on_board {
            ctx.input_mut(|i| {
                let redo = i.consume_key(Modifiers::COMMAND | Modifiers::SHIFT, Key::Z)
                    || i.consume_key(Modifiers::COMMAND, Key::Y);
                (redo, i.consume_key(Modifiers::COMMAND, Key::Z))
            })
        } else {
            (false, false)
        };

        if publish {
            self.publish();
        }
        if save {
            self.save_draft();
            self.save_whiteboard();
            self.set_info("Saved");
        }
        if bold {
            self.apply_action(ctx, ToolbarAction::Bold);
        }
        if italic {
            self.apply_action(ctx, ToolbarAction::Italic);
        }
        if link {
            self.apply_action(ctx, ToolbarAction::Link);
        }
        if redo {
            self.whiteboard.redo();
        }
        if undo {
            self.whiteboard.undo();
        }
    }

    /// Render the top menu bar
    fn render_menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("Notebook", |ui| {
                    if ui.button("Library").clicked() {
                        self.save_draft();
                        self.view = View::Library;
                        ui.close();
                    }
                    let has_notebook = self.notebook.is_some();
                    if ui
                        .add_enabled(has_notebook, egui::Button::new("Save Draft"))
                        .clicked()
                    {
                        self.save_draft();
                        ui.close();
                    }
                    if ui
                        .add_enabled(has_notebook, egui::Button::new("Publish"))
                        .clicked()
                    {
                        self.publish();
                        ui.close();
                    }
                    let published = self
                        .notebook
                        .as_ref()
                        .is_some_and(|n| self.remote_entry(&n.slug).is_some());
                    if ui
                        .add_enabled(published, egui::Button::new("Pull From GitHub"))
                        .clicked()
                    {
                        self.pull_remote();
                        ui.close();
                    }
                    if ui
                        .add_enabled(published, egui::Button::new("Open on GitHub"))
                        .clicked()
                    {
                        self.open_on_github();
                        ui.close();
                    }
                    if ui
                        .add_enabled(has_notebook, egui::Button::new("Export HTML..."))
                        .clicked()
                    {
                        self.export_html();
                        ui.close();
                    }
                    if ui
                        .add_enabled(has_notebook, egui::Button::new("Close"))
                        .clicked()
                    {
                        self.close_notebook();
                        ui.close();
                    }
                    ui.separator();
                    if ui.button("Lock").clicked() {
                        self.lock();
                        ui.close();
                    }
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });

                ui.menu_button("View", |ui| {
                    if ui
                        .add_enabled(self.notebook.is_some(), egui::Button::new("Editor"))
                        .clicked()
                    {
                        self.view = View::Editor;
                        ui.close();
                    }
                    if ui.button("Whiteboard").clicked() {
                        self.save_draft();
                        self.view = View::Whiteboard;
                        ui.close();
                    }
                    if ui.button("Settings").clicked() {
                        self.settings_form = SettingsForm::default();
                        self.view = View::Settings;
                        ui.close();
                    }
                    ui.separator();
                    for (mode, label) in [
                        (ViewMode::Editor, "Editor Only"),
                        (ViewMode::Preview, "Preview Only"),
                        (ViewMode::Split, "Split View"),
                    ] {
                        if ui.selectable_label(self.view_mode == mode, label).clicked() {
                            self.view_mode = mode;
                            ui.close();
                        }
                    }
                    ui.separator();
                    if ui.checkbox(&mut self.config.ui.show_outline, "Outline").changed() {
                        self.save_config();
                    }
                    if ui.button("Toggle Theme").clicked() {
                        self.config.ui.theme = self.config.ui.theme.toggled();
                        ctx.set_visuals(self.config.ui.theme.visuals());
                        self.save_config();
                        ui.close();
                    }
                });
            });
        });
    }

    fn render_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if let Some(notebook) = &self.notebook {
                    let state = if self.modified || self.autosave.is_pending() {
                        "unsaved"
                    } else if notebook.is_draft_only() {
                        "draft"
                    } else if self.has_draft(&notebook.slug) {
                        "draft, published before"
                    } else {
                        "published"
                    };
                    ui.label(format!("{} ({})", notebook.title, state));
                    ui.separator();
                    ui.label(format!("{} words", markdown::word_count(&notebook.content)));
                    ui.separator();
                }
                if self.is_syncing() {
                    ui.spinner();
                }
                if let Some(status) = &self.status {
                    let color = if status.is_error {
                        ui.visuals().error_fg_color
                    } else {
                        ui.visuals().weak_text_color()
                    };
                    ui.colored_label(color, &status.text);
                }
            });
        });
    }

    fn render_editor(&mut self, ctx: &egui::Context) {
        if self.config.ui.show_outline {
            let (entries, links) = self
                .notebook
                .as_ref()
                .map(|n| {
                    (
                        markdown::outline(&n.content),
                        markdown::transforms::wiki_links(&n.content),
                    )
                })
                .unwrap_or_default();
            let mut jump = None;
            let mut follow = None;
            egui::SidePanel::right("outline")
                .resizable(true)
                .default_width(200.0)
                .show(ctx, |ui| {
                    ui.heading("Outline");
                    ui.separator();
                    egui::ScrollArea::vertical()
                        .id_salt("outline_scroll")
                        .show(ui, |ui| {
                            for entry in &entries {
                                ui.horizontal(|ui| {
                                    ui.add_space(f32::from(entry.level.saturating_sub(1)) * 12.0);
                                    if ui.link(&entry.text).clicked() {
                                        jump = Some(entry.offset);
                                    }
                                });
                            }

                            if !links.is_empty() {
                                ui.add_space(12.0);
                                ui.strong("Linked notebooks");
                                for target in &links {
                                    if ui.link(target).clicked() {
                                        follow = Some(target.clone());
                                    }
                                }
                            }
                        });
                });
            if let Some(offset) = jump {
                self.jump_to(ctx, offset);
            }
            if let Some(target) = follow {
                self.navigate_to_note(&target);
            }
        }

        egui::CentralPanel::default().show(ctx, |ui| match self.view_mode {
            ViewMode::Editor => {
                EditorPanel::show(ui, self);
            }
            ViewMode::Preview => {
                PreviewPanel::show(ui, self);
            }
            ViewMode::Split => {
                let available_width = ui.available_width();
                let ratio = self.config.ui.split_ratio.clamp(0.2, 0.8);
                ui.horizontal(|ui| {
                    ui.set_min_width(available_width);

                    ui.vertical(|ui| {
                        ui.set_width(available_width * ratio - 4.0);
                        EditorPanel::show(ui, self);
                    });

                    ui.separator();

                    ui.vertical(|ui| {
                        ui.set_width(available_width * (1.0 - ratio) - 4.0);
                        PreviewPanel::show(ui, self);
                    });
                });
            }
        });
    }

    fn render_delete_dialog(&mut self, ctx: &egui::Context) {
        let Some(slug) = self.confirm_delete.clone() else {
            return;
        };
        let published = self.remote_entry(&slug).is_some();
        let mut open = true;
        let mut decided = None;

        egui::Window::new("Delete notebook")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(format!("Delete {}?", slug));
                if published {
                    ui.label("The published copy on GitHub will be deleted too.");
                }
                ui.horizontal(|ui| {
                    if ui.button("Delete").clicked() {
                        decided = Some(true);
                    }
                    if ui.button("Cancel").clicked() {
                        decided = Some(false);
                    }
                });
            });

        if decided == Some(true) {
            self.delete_notebook(&slug);
        }
        if decided.is_some() || !open {
            self.confirm_delete = None;
        }
    }
}

impl eframe::App for InkpadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_sync_events();

        let now = Instant::now();
        if self.autosave.fire(now) {
            self.save_draft();
        }
        if let Some(remaining) = self.autosave.remaining(now) {
            ctx.request_repaint_after(remaining);
        }

        if ctx.input(|i| i.viewport().close_requested()) {
            self.save_draft();
            self.save_whiteboard();
        }

        if self.view == View::Locked {
            egui::CentralPanel::default().show(ctx, |ui| {
                LoginPanel::show(ui, self);
            });
            return;
        }

        self.handle_shortcuts(ctx);
        self.render_menu_bar(ctx);
        self.render_status_bar(ctx);

        match self.view {
            View::Locked => {}
            View::Library => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    LibraryPanel::show(ui, self);
                });
            }
            View::Editor if self.notebook.is_some() => self.render_editor(ctx),
            View::Editor => self.view = View::Library,
            View::Whiteboard => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    WhiteboardPanel::show(ui, self);
                });
            }
            View::Settings => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    SettingsPanel::show(ui, self);
                });
            }
        }

        self.render_delete_dialog(ctx);

        if self.whiteboard.is_dirty() && self.whiteboard.active_stroke().is_none() {
            self.save_whiteboard();
        }
    }
}
