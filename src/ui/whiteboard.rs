//! Whiteboard drawing surface

use eframe::egui::{self, Color32, Pos2, Sense};

use crate::app::{InkpadApp, View};
use crate::core::config::WhiteboardConfig;
use crate::whiteboard::{Point, Rgba, Stroke, Tool};

/// Current drawing tool settings
#[derive(Debug, Clone, Copy)]
pub struct PenState {
    pub tool: Tool,
    pub color: Rgba,
    pub width: f32,
}

impl PenState {
    pub fn from_config(config: &WhiteboardConfig) -> Self {
        Self {
            tool: Tool::Pen,
            color: Rgba::from_hex(&config.pen_color).unwrap_or(Rgba::WHITE),
            width: config.pen_width,
        }
    }
}

fn to_color32(color: Rgba) -> Color32 {
    let [r, g, b, a] = color.0;
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

/// Whiteboard panel
pub struct WhiteboardPanel;

impl WhiteboardPanel {
    /// Show the whiteboard panel
    pub fn show(ui: &mut egui::Ui, app: &mut InkpadApp) {
        Self::show_toolbar(ui, app);
        ui.separator();

        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let origin = response.rect.min;
        let to_canvas = |pos: Pos2| Point::new(pos.x - origin.x, pos.y - origin.y);
        let pen = app.pen;

        if response.drag_started() {
            let start = ui
                .input(|i| i.pointer.press_origin())
                .or(response.interact_pointer_pos());
            if let Some(pos) = start {
                app.whiteboard
                    .begin_stroke(pen.tool, pen.color, pen.width, to_canvas(pos));
            }
        }
        if response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                app.whiteboard.extend_stroke(to_canvas(pos));
            }
        }
        if response.drag_stopped() {
            app.whiteboard.end_stroke();
        }
        if app.whiteboard.active_stroke().is_some()
            && ui.input(|i| i.key_pressed(egui::Key::Escape))
        {
            app.whiteboard.cancel_stroke();
        }
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                app.whiteboard
                    .begin_stroke(pen.tool, pen.color, pen.width, to_canvas(pos));
                app.whiteboard.end_stroke();
            }
        }

        let canvas = app.whiteboard.canvas();
        painter.rect_filled(response.rect, 0.0, to_color32(canvas.background));
        for stroke in canvas.strokes.iter().chain(app.whiteboard.active_stroke()) {
            paint_stroke(&painter, stroke, canvas.background, origin);
        }
    }

    fn show_toolbar(ui: &mut egui::Ui, app: &mut InkpadApp) {
        ui.horizontal(|ui| {
            if app.notebook.is_some() && ui.button("Back to notebook").clicked() {
                app.view = View::Editor;
            }
            ui.label(egui::RichText::new(&app.board_slug).strong());
            ui.separator();

            for tool in Tool::ALL {
                if ui.selectable_label(app.pen.tool == tool, tool.label()).clicked() {
                    app.pen.tool = tool;
                }
            }
            ui.separator();

            let mut color = to_color32(app.pen.color);
            if ui.color_edit_button_srgba(&mut color).changed() {
                app.pen.color = Rgba(color.to_srgba_unmultiplied());
                app.config.whiteboard.pen_color = app.pen.color.to_hex();
                app.save_config();
            }
            let slider = egui::Slider::new(&mut app.pen.width, 1.0..=24.0).text("width");
            if ui.add(slider).drag_stopped() {
                app.config.whiteboard.pen_width = app.pen.width;
                app.save_config();
            }
            ui.separator();

            if ui
                .add_enabled(app.whiteboard.can_undo(), egui::Button::new("Undo"))
                .on_hover_text("Ctrl+Z")
                .clicked()
            {
                app.whiteboard.undo();
            }
            if ui
                .add_enabled(app.whiteboard.can_redo(), egui::Button::new("Redo"))
                .on_hover_text("Ctrl+Y")
                .clicked()
            {
                app.whiteboard.redo();
            }
            if ui.button("Clear").clicked() {
                app.whiteboard.clear();
            }

            let background = app.whiteboard.canvas().background;
            let (next, label) = if background == Rgba::WHITE {
                (Rgba::DARK, "Dark paper")
            } else {
                (Rgba::WHITE, "Light paper")
            };
            if ui.button(label).clicked() {
                app.whiteboard.set_background(next);
            }
            ui.separator();
            if ui.button("Export SVG...").clicked() {
                app.export_svg();
            }
        });
    }
}

/// Paint one stroke, offset so canvas (0, 0) lands on `origin`
fn paint_stroke(painter: &egui::Painter, stroke: &Stroke, background: Rgba, origin: Pos2) {
    let color = to_color32(stroke.paint_color(background));
    let points: Vec<Pos2> = stroke
        .points
        .iter()
        .map(|p| Pos2::new(origin.x + p.x, origin.y + p.y))
        .collect();

    match points.as_slice() {
        [] => {}
        [p] => {
            painter.circle_filled(*p, stroke.width / 2.0, color);
        }
        _ => {
            painter.add(egui::Shape::line(points, egui::Stroke::new(stroke.width, color)));
        }
    }
}
