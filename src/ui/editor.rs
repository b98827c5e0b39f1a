//! Markdown editor panel

use eframe::egui;

use crate::app::{InkpadApp, View, ViewMode};
use crate::editor::{ops, ToolbarAction};

/// Widget id of the notebook text editor
pub const EDITOR_ID: &str = "notebook_editor";

/// Markdown editor panel
pub struct EditorPanel;

impl EditorPanel {
    /// Show the editor panel
    pub fn show(ui: &mut egui::Ui, app: &mut InkpadApp) {
        ui.vertical(|ui| {
            Self::show_header(ui, app);
            ui.separator();
            Self::show_toolbar(ui, app);
            ui.separator();

            let mut changed = false;
            egui::ScrollArea::vertical()
                .id_salt("editor_scroll")
                .show(ui, |ui| {
                    let Some(notebook) = app.notebook.as_mut() else {
                        return;
                    };
                    let output = egui::TextEdit::multiline(&mut notebook.content)
                        .id(egui::Id::new(EDITOR_ID))
                        .font(egui::TextStyle::Monospace)
                        .code_editor()
                        .desired_width(f32::INFINITY)
                        .desired_rows(30)
                        .show(ui);

                    if output.response.changed() {
                        notebook.touch();
                        changed = true;
                    }
                    if let Some(range) = output.state.cursor.char_range() {
                        let (a, b) = (range.primary.index, range.secondary.index);
                        app.selection = ops::byte_offset(&notebook.content, a.min(b))
                            ..ops::byte_offset(&notebook.content, a.max(b));
                    }
                });

            if changed {
                app.mark_modified();
            }
        });
    }

    /// Title, tags and notebook actions
    fn show_header(ui: &mut egui::Ui, app: &mut InkpadApp) {
        let Some(title) = app.notebook.as_ref().map(|n| n.title.clone()) else {
            return;
        };

        ui.horizontal(|ui| {
            ui.heading(title);
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.button("Publish").on_hover_text("Ctrl+Shift+P").clicked() {
                    app.publish();
                }
                if ui.button("Save").on_hover_text("Ctrl+S").clicked() {
                    app.save_draft();
                }
                if ui.button("Whiteboard").clicked() {
                    app.save_draft();
                    app.view = View::Whiteboard;
                }
                ui.separator();
                for (mode, label) in [
                    (ViewMode::Preview, "Preview"),
                    (ViewMode::Split, "Split"),
                    (ViewMode::Editor, "Edit"),
                ] {
                    if ui.selectable_label(app.view_mode == mode, label).clicked() {
                        app.view_mode = mode;
                    }
                }
            });
        });

        ui.horizontal(|ui| {
            ui.label("Tags:");
            let response = ui.add(
                egui::TextEdit::singleline(&mut app.tag_input)
                    .hint_text("comma, separated")
                    .desired_width(240.0),
            );
            if response.lost_focus() {
                let before = app.notebook.as_ref().map(|n| n.tags.clone());
                if let Some(notebook) = app.notebook.as_mut() {
                    notebook.set_tags(&app.tag_input);
                    app.tag_input = notebook.tags.join(", ");
                    if before.as_ref() != Some(&notebook.tags) {
                        app.mark_modified();
                    }
                }
            }
        });
    }

    /// Formatting buttons
    fn show_toolbar(ui: &mut egui::Ui, app: &mut InkpadApp) {
        let mut clicked = None;
        ui.horizontal_wrapped(|ui| {
            for action in ToolbarAction::ALL {
                if ui
                    .small_button(action.label())
                    .on_hover_text(action.tooltip())
                    .clicked()
                {
                    clicked = Some(action);
                }
            }
        });

        if let Some(action) = clicked {
            let ctx = ui.ctx().clone();
            app.apply_action(&ctx, action);
        }
    }
}
