//! Library panel: local drafts and published notebooks

use eframe::egui;

use crate::app::InkpadApp;
use crate::core::library::matches_filter;

/// What a click in the library asked for
enum LibraryAction {
    Open(String),
    Delete(String),
    Create(String),
    Refresh,
}

/// Library panel
pub struct LibraryPanel;

impl LibraryPanel {
    /// Show the library panel
    pub fn show(ui: &mut egui::Ui, app: &mut InkpadApp) {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.heading("Library");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let can_sync = app.config.github.is_configured();
                if ui
                    .add_enabled(can_sync, egui::Button::new("Refresh"))
                    .on_hover_text("Reload the list of published notebooks")
                    .clicked()
                {
                    action = Some(LibraryAction::Refresh);
                }
                if app.is_syncing() {
                    ui.spinner();
                }
            });
        });
        ui.separator();

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut app.new_title)
                    .hint_text("New notebook title")
                    .desired_width(240.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
            if ui.button("Create").clicked() || submitted {
                action = Some(LibraryAction::Create(std::mem::take(&mut app.new_title)));
            }
            ui.separator();
            ui.label("Filter:");
            ui.add(egui::TextEdit::singleline(&mut app.filter).desired_width(160.0));
        });
        ui.add_space(8.0);

        let filter = app.filter.clone();
        let matches =
            |title: &str, slug: &str, tags: &[String]| matches_filter(&filter, title, slug, tags);

        egui::ScrollArea::vertical()
            .id_salt("library_scroll")
            .show(ui, |ui| {
                ui.strong("Drafts");
                let drafts: Vec<_> = app
                    .drafts
                    .iter()
                    .filter(|d| matches(&d.title, &d.slug, &d.tags))
                    .collect();
                if drafts.is_empty() {
                    ui.label("No local drafts");
                }
                for draft in drafts {
                    let is_active = app.notebook.as_ref().is_some_and(|n| n.slug == draft.slug);
                    ui.horizontal(|ui| {
                        let label = if draft.is_draft_only() {
                            draft.title.clone()
                        } else {
                            format!("{} (edited)", draft.title)
                        };
                        if ui.selectable_label(is_active, label).clicked() {
                            action = Some(LibraryAction::Open(draft.slug.clone()));
                        }
                        ui.label(
                            egui::RichText::new(draft.updated.format("%Y-%m-%d %H:%M").to_string())
                                .weak(),
                        );
                        if !draft.tags.is_empty() {
                            ui.label(egui::RichText::new(draft.tags.join(", ")).weak().italics());
                        }
                        if ui.small_button("Delete").clicked() {
                            action = Some(LibraryAction::Delete(draft.slug.clone()));
                        }
                    });
                }

                ui.add_space(12.0);
                ui.strong("Published");
                if !app.config.github.is_configured() {
                    ui.label("GitHub sync is not configured. Set it up in View > Settings.");
                    return;
                }
                let mut listed = 0;
                for entry in &app.remote {
                    let slug = entry.slug();
                    if !matches(slug, slug, &[]) {
                        continue;
                    }
                    listed += 1;
                    let is_active = app.notebook.as_ref().is_some_and(|n| n.slug == slug);
                    let has_draft = app.drafts.iter().any(|d| d.slug == slug);
                    ui.horizontal(|ui| {
                        if ui.selectable_label(is_active, slug).clicked() {
                            action = Some(LibraryAction::Open(slug.to_string()));
                        }
                        if has_draft {
                            ui.label(egui::RichText::new("local changes").weak().italics());
                        }
                        ui.label(egui::RichText::new(format!("{} bytes", entry.size)).weak());
                        if ui.small_button("Delete").clicked() {
                            action = Some(LibraryAction::Delete(slug.to_string()));
                        }
                    });
                }
                if listed == 0 {
                    ui.label("Nothing published yet");
                }
            });

        match action {
            Some(LibraryAction::Open(slug)) => app.open_slug(&slug),
            Some(LibraryAction::Delete(slug)) => app.confirm_delete = Some(slug),
            Some(LibraryAction::Create(title)) => app.create_notebook(&title),
            Some(LibraryAction::Refresh) => app.refresh_remote(),
            None => {}
        }
    }
}
