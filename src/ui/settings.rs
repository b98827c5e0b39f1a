//! Settings view: appearance, editor, whiteboard, password and GitHub sync

use std::time::Duration;

use eframe::egui;

use crate::app::InkpadApp;
use crate::core::config::{Theme, TOKEN_ENV_VAR};
use crate::sync::SyncTask;

/// Password fields, cleared whenever the view is opened
#[derive(Debug, Default)]
pub struct SettingsForm {
    pub new_password: String,
    pub confirm_password: String,
    pub password_message: Option<(String, bool)>,
}

/// Settings panel
pub struct SettingsPanel;

impl SettingsPanel {
    pub fn show(ui: &mut egui::Ui, app: &mut InkpadApp) {
        ui.heading("Settings");
        ui.separator();

        egui::ScrollArea::vertical()
            .id_salt("settings_scroll")
            .show(ui, |ui| {
                let mut changed = false;

                ui.collapsing("Appearance", |ui| {
                    ui.horizontal(|ui| {
                        ui.label("Theme:");
                        for (theme, label) in [(Theme::Dark, "Dark"), (Theme::Light, "Light")] {
                            if ui
                                .selectable_label(app.config.ui.theme == theme, label)
                                .clicked()
                            {
                                app.config.ui.theme = theme;
                                changed = true;
                            }
                        }
                    });
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut app.config.ui.split_ratio, 0.2..=0.8)
                                .text("editor share in split view"),
                        )
                        .changed();
                    changed |= ui
                        .checkbox(&mut app.config.ui.show_outline, "Show outline")
                        .changed();
                });

                ui.collapsing("Editor", |ui| {
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut app.config.editor.font_size, 10.0..=24.0)
                                .text("font size"),
                        )
                        .changed();
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut app.config.editor.autosave_delay_ms, 250..=10_000)
                                .text("autosave delay (ms)"),
                        )
                        .changed();
                });

                ui.collapsing("Whiteboard", |ui| {
                    changed |= ui
                        .add(
                            egui::Slider::new(&mut app.config.whiteboard.history_capacity, 1..=200)
                                .text("undo steps"),
                        )
                        .changed();
                });

                if changed {
                    InkpadApp::configure_style(ui.ctx(), &app.config);
                    app.autosave
                        .set_delay(Duration::from_millis(app.config.editor.autosave_delay_ms));
                    app.whiteboard
                        .set_history_capacity(app.config.whiteboard.history_capacity);
                    app.save_config();
                }

                ui.collapsing("Password", |ui| Self::show_password(ui, app));
                ui.collapsing("GitHub sync", |ui| Self::show_github(ui, app));
            });
    }

    fn show_password(ui: &mut egui::Ui, app: &mut InkpadApp) {
        let has_password = app.gate().has_password();
        ui.label(if has_password {
            "A password is required to open Inkpad."
        } else {
            "No password set. Inkpad opens without asking."
        });

        egui::Grid::new("password_grid").num_columns(2).show(ui, |ui| {
            ui.label("New password");
            ui.add(egui::TextEdit::singleline(&mut app.settings_form.new_password).password(true));
            ui.end_row();
            ui.label("Confirm");
            ui.add(
                egui::TextEdit::singleline(&mut app.settings_form.confirm_password).password(true),
            );
            ui.end_row();
        });

        ui.horizontal(|ui| {
            if ui.button("Set password").clicked() {
                let form = &mut app.settings_form;
                let result = if form.new_password != form.confirm_password {
                    Err("Passwords do not match".to_string())
                } else {
                    let password = std::mem::take(&mut form.new_password);
                    form.confirm_password.clear();
                    app.gate().set_password(&password).map_err(|e| e.to_string())
                };
                app.settings_form.password_message = Some(match result {
                    Ok(()) => ("Password set".to_string(), false),
                    Err(e) => (e, true),
                });
            }
            if ui
                .add_enabled(has_password, egui::Button::new("Remove password"))
                .clicked()
            {
                app.settings_form.password_message = Some(match app.gate().clear_password() {
                    Ok(()) => ("Password removed".to_string(), false),
                    Err(e) => (e.to_string(), true),
                });
            }
        });

        if let Some((message, is_error)) = &app.settings_form.password_message {
            let color = if *is_error {
                ui.visuals().error_fg_color
            } else {
                ui.visuals().weak_text_color()
            };
            ui.colored_label(color, message);
        }
    }

    fn show_github(ui: &mut egui::Ui, app: &mut InkpadApp) {
        let mut changed = false;
        egui::Grid::new("github_grid").num_columns(2).show(ui, |ui| {
            let gh = &mut app.config.github;
            for (label, value) in [
                ("Owner", &mut gh.owner),
                ("Repository", &mut gh.repo),
                ("Branch", &mut gh.branch),
                ("Notes folder", &mut gh.notes_dir),
                ("API base", &mut gh.api_base),
            ] {
                ui.label(label);
                changed |= ui.text_edit_singleline(value).lost_focus();
                ui.end_row();
            }
            ui.label("Token");
            changed |= ui
                .add(egui::TextEdit::singleline(&mut gh.token).password(true))
                .lost_focus();
            ui.end_row();
        });

        if std::env::var(TOKEN_ENV_VAR).is_ok_and(|t| !t.trim().is_empty()) {
            ui.label(
                egui::RichText::new(format!("Using the token from {}", TOKEN_ENV_VAR)).weak(),
            );
        }

        if changed {
            app.save_config();
        }

        ui.horizontal(|ui| {
            if ui.button("Test connection").clicked() {
                app.save_config();
                app.submit(SyncTask::CheckAccess);
            }
            if ui.button("Refresh notebooks").clicked() {
                app.refresh_remote();
            }
        });
    }
}
