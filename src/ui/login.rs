//! Lock screen

use eframe::egui;

use crate::app::InkpadApp;

/// Password prompt shown while the app is locked
pub struct LoginPanel;

impl LoginPanel {
    pub fn show(ui: &mut egui::Ui, app: &mut InkpadApp) {
        ui.vertical_centered(|ui| {
            ui.add_space(120.0);
            ui.heading("Inkpad is locked");
            ui.add_space(20.0);

            let response = ui.add(
                egui::TextEdit::singleline(&mut app.login_password)
                    .password(true)
                    .hint_text("Password")
                    .desired_width(240.0),
            );
            if !response.has_focus() && app.login_password.is_empty() {
                response.request_focus();
            }
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            ui.add_space(10.0);
            if ui.button("Unlock").clicked() || submitted {
                app.unlock();
            }

            if let Some(error) = &app.login_error {
                ui.add_space(10.0);
                ui.colored_label(ui.visuals().error_fg_color, error);
            }
        });
    }
}
