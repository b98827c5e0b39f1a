//! Rendered markdown preview panel

use eframe::egui;

use super::block_renderer::{render_block, BlockAction};
use crate::app::InkpadApp;
use crate::markdown::blocks::find_block_at_position;
use crate::markdown::parse_blocks;

/// Markdown preview panel
pub struct PreviewPanel;

impl PreviewPanel {
    /// Show the preview panel
    pub fn show(ui: &mut egui::Ui, app: &mut InkpadApp) {
        let Some(content) = app.notebook.as_ref().map(|n| n.content.as_str()) else {
            Self::show_empty(ui);
            return;
        };

        // Re-parse only when the text changed since the last frame
        let stale = app
            .preview_cache
            .as_ref()
            .is_none_or(|(source, _)| source != content);
        if stale {
            app.preview_cache = Some((content.to_string(), parse_blocks(content)));
        }

        let mut action = None;
        egui::ScrollArea::vertical()
            .id_salt("preview_scroll")
            .show(ui, |ui| {
                let Some((_, blocks)) = &app.preview_cache else {
                    return;
                };
                let current = find_block_at_position(blocks, app.selection.start);
                for (idx, block) in blocks.iter().enumerate() {
                    let top = ui.cursor().min.y;
                    if let Some(a) = render_block(ui, block) {
                        action = Some(a);
                    }
                    if current == Some(idx) {
                        // Mark the block holding the editor cursor
                        let left = ui.min_rect().min.x - 6.0;
                        let bottom = ui.cursor().min.y;
                        ui.painter().line_segment(
                            [egui::pos2(left, top), egui::pos2(left, bottom)],
                            egui::Stroke::new(2.0, ui.visuals().selection.bg_fill),
                        );
                    }
                }
            });

        match action {
            Some(BlockAction::NavigateToNote(target)) => app.navigate_to_note(&target),
            Some(BlockAction::OpenUrl(url)) => app.open_url(&url),
            Some(BlockAction::JumpTo(offset)) => {
                let ctx = ui.ctx().clone();
                app.jump_to(&ctx, offset);
            }
            None => {}
        }
    }

    /// Show empty state
    fn show_empty(ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(50.0);
            ui.label("No notebook open");
            ui.label("Pick one from the library to see the preview");
        });
    }
}
