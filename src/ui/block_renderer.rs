//! Block rendering for the preview
//!
//! Each parsed block is drawn with egui widgets. Interactions bubble up as
//! [`BlockAction`]s so the caller decides what a click means.

use eframe::egui::{self, Color32, FontId, RichText, Ui};

use crate::markdown::blocks::{ListItem, TableAlignment, TableCell};
use crate::markdown::{parse_inline, InlineSpan, ParsedBlock};
use crate::markdown::transforms::NOTE_HREF_PREFIX;

/// Action that can be triggered by block interaction
#[derive(Debug, Clone, PartialEq)]
pub enum BlockAction {
    /// Navigate to a wiki link target
    NavigateToNote(String),
    /// Open external URL
    OpenUrl(String),
    /// Move the editor cursor to a source offset
    JumpTo(usize),
}

/// Render a parsed block to the UI
pub fn render_block(ui: &mut Ui, block: &ParsedBlock) -> Option<BlockAction> {
    let inner = ui.scope(|ui| match block {
        ParsedBlock::Heading { level, text, .. } => render_heading(ui, *level, text),
        ParsedBlock::Paragraph { text, .. } => render_paragraph(ui, text),
        ParsedBlock::CodeBlock { lang, code, .. } => render_code_block(ui, lang.as_deref(), code),
        ParsedBlock::Math { tex, .. } => render_math_block(ui, tex),
        ParsedBlock::List {
            items,
            ordered,
            start,
            ..
        } => render_list(ui, items, *ordered, *start),
        ParsedBlock::BlockQuote { text, .. } => render_blockquote(ui, text),
        ParsedBlock::HorizontalRule { .. } => {
            render_horizontal_rule(ui);
            None
        }
        ParsedBlock::Table { headers, rows, .. } => render_table(ui, headers, rows),
        ParsedBlock::Image {
            alt, url, title, ..
        } => render_image(ui, alt, url, title.as_deref()),
    });
    let action = inner.inner;

    // Double click anywhere on a block jumps to its source
    if action.is_none()
        && inner.response.contains_pointer()
        && ui.input(|i| i.pointer.button_double_clicked(egui::PointerButton::Primary))
    {
        return Some(BlockAction::JumpTo(block.range().start));
    }
    action
}

fn weak_color(ui: &Ui) -> Color32 {
    ui.visuals().weak_text_color()
}

fn code_background(ui: &Ui) -> Color32 {
    ui.visuals().code_bg_color
}

/// Render a heading
pub fn render_heading(ui: &mut Ui, level: u8, text: &str) -> Option<BlockAction> {
    let font_size = match level {
        1 => 28.0,
        2 => 24.0,
        3 => 20.0,
        4 => 18.0,
        5 => 16.0,
        _ => 14.0,
    };

    let action = ui
        .horizontal_wrapped(|ui| {
            render_spans(ui, &parse_inline(text), Some(FontId::proportional(font_size)))
        })
        .inner;

    ui.add_space(match level {
        1 => 12.0,
        2 => 10.0,
        _ => 6.0,
    });

    action
}

/// Render a paragraph with inline formatting
pub fn render_paragraph(ui: &mut Ui, text: &str) -> Option<BlockAction> {
    let spans = parse_inline(text);
    let action = ui
        .horizontal_wrapped(|ui| render_spans(ui, &spans, None))
        .inner;

    ui.add_space(8.0);
    action
}

/// Render inline spans into the current (wrapped) layout
fn render_spans(ui: &mut Ui, spans: &[InlineSpan], font: Option<FontId>) -> Option<BlockAction> {
    let mut action = None;
    let styled = |text: &str| {
        let rich = RichText::new(text);
        match &font {
            Some(font) => rich.font(font.clone()).strong(),
            None => rich,
        }
    };

    ui.spacing_mut().item_spacing.x = 0.0;
    for span in spans {
        match span {
            InlineSpan::Text(t) => {
                ui.label(styled(t));
            }
            InlineSpan::WikiLink { target, display } => {
                let link_text = display.as_deref().unwrap_or(target);
                let response = ui.link(styled(link_text));
                if response.clicked() {
                    action = Some(BlockAction::NavigateToNote(target.clone()));
                }
                response.on_hover_text(format!("Open: {}", target));
            }
            InlineSpan::Code(code) => {
                let text = RichText::new(code)
                    .font(FontId::monospace(14.0))
                    .background_color(code_background(ui));
                ui.label(text);
            }
            InlineSpan::Math(tex) => {
                ui.label(
                    RichText::new(tex)
                        .font(FontId::monospace(14.0))
                        .italics()
                        .color(Color32::from_rgb(139, 180, 233)),
                )
                .on_hover_text("TeX math");
            }
            InlineSpan::Bold(t) => {
                ui.label(styled(t).strong());
            }
            InlineSpan::Italic(t) => {
                ui.label(styled(t).italics());
            }
            InlineSpan::Strike(t) => {
                ui.label(styled(t).strikethrough());
            }
            InlineSpan::Highlight(t) => {
                ui.label(
                    styled(t)
                        .background_color(Color32::from_rgba_unmultiplied(230, 200, 60, 90)),
                );
            }
            InlineSpan::Link { text, url } => {
                let response = ui.link(styled(text));
                if response.clicked() {
                    action = Some(match url.strip_prefix(NOTE_HREF_PREFIX) {
                        Some(slug) => BlockAction::NavigateToNote(slug.to_string()),
                        None => BlockAction::OpenUrl(url.clone()),
                    });
                }
                response.on_hover_text(url);
            }
        }
    }
    action
}

/// Render a code block
pub fn render_code_block(ui: &mut Ui, lang: Option<&str>, code: &str) -> Option<BlockAction> {
    egui::Frame::new()
        .fill(code_background(ui))
        .stroke(ui.visuals().widgets.noninteractive.bg_stroke)
        .inner_margin(egui::Margin::same(8))
        .outer_margin(egui::Margin::symmetric(0, 4))
        .corner_radius(4)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            if let Some(lang) = lang {
                ui.label(
                    RichText::new(lang)
                        .font(FontId::monospace(12.0))
                        .color(weak_color(ui)),
                );
                ui.add_space(4.0);
            }
            ui.label(RichText::new(code).font(FontId::monospace(14.0)));
        });

    ui.add_space(8.0);
    None
}

/// Render display math as its TeX source, centered
pub fn render_math_block(ui: &mut Ui, tex: &str) -> Option<BlockAction> {
    egui::Frame::new()
        .inner_margin(egui::Margin::symmetric(8, 6))
        .show(ui, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new(tex.trim())
                        .font(FontId::monospace(15.0))
                        .italics()
                        .color(Color32::from_rgb(139, 180, 233)),
                )
                .on_hover_text("TeX math, typeset in HTML export");
            });
        });

    ui.add_space(8.0);
    None
}

/// Render a list (ordered or unordered)
pub fn render_list(
    ui: &mut Ui,
    items: &[ListItem],
    ordered: bool,
    start: Option<u64>,
) -> Option<BlockAction> {
    let mut action = None;
    let start_num = start.unwrap_or(1);

    for (idx, item) in items.iter().enumerate() {
        ui.horizontal_wrapped(|ui| {
            ui.add_space(16.0);

            let marker = match item.checkbox {
                Some(true) => "[x]".to_string(),
                Some(false) => "[ ]".to_string(),
                None if ordered => format!("{}.", start_num + idx as u64),
                None => "-".to_string(),
            };
            ui.label(
                RichText::new(marker)
                    .font(FontId::monospace(14.0))
                    .color(weak_color(ui)),
            );
            ui.add_space(4.0);

            if let Some(a) = render_spans(ui, &parse_inline(&item.text), None) {
                action = Some(a);
            }
        });

        if !item.children.is_empty() {
            ui.horizontal(|ui| {
                ui.add_space(16.0);
                ui.vertical(|ui| {
                    if let Some(child_action) = render_list(ui, &item.children, ordered, None) {
                        action = Some(child_action);
                    }
                });
            });
        }
    }

    ui.add_space(8.0);
    action
}

/// Render a blockquote
pub fn render_blockquote(ui: &mut Ui, text: &str) -> Option<BlockAction> {
    let mut action = None;

    egui::Frame::new()
        .fill(ui.visuals().faint_bg_color)
        .inner_margin(egui::Margin {
            left: 12,
            right: 8,
            top: 8,
            bottom: 8,
        })
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            let rect = ui.max_rect();
            ui.painter().rect_filled(
                egui::Rect::from_min_size(
                    rect.min - egui::vec2(12.0, 8.0),
                    egui::vec2(4.0, rect.height() + 16.0),
                ),
                0.0,
                weak_color(ui),
            );

            for line in text.split("\n\n") {
                let spans = parse_inline(line);
                if let Some(a) = ui
                    .horizontal_wrapped(|ui| render_spans(ui, &spans, None))
                    .inner
                {
                    action = Some(a);
                }
            }
        });

    ui.add_space(8.0);
    action
}

/// Render a horizontal rule
pub fn render_horizontal_rule(ui: &mut Ui) {
    ui.add_space(8.0);
    ui.separator();
    ui.add_space(8.0);
}

/// Render a table
pub fn render_table(
    ui: &mut Ui,
    headers: &[TableCell],
    rows: &[Vec<TableCell>],
) -> Option<BlockAction> {
    use egui_extras::{Column, TableBuilder};

    let mut action = None;
    let num_cols = headers.len().max(1);
    let id = ui.next_auto_id();

    ui.push_id(id, |ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .columns(Column::auto().at_least(60.0), num_cols)
            .header(20.0, |mut header| {
                for cell in headers {
                    header.col(|ui| {
                        cell_layout(ui, cell.alignment, |ui| {
                            ui.strong(&cell.content);
                        });
                    });
                }
            })
            .body(|mut body| {
                for row in rows {
                    body.row(18.0, |mut row_ui| {
                        for (col, cell) in row.iter().enumerate() {
                            let alignment = headers
                                .get(col)
                                .map(|h| h.alignment)
                                .unwrap_or(cell.alignment);
                            row_ui.col(|ui| {
                                cell_layout(ui, alignment, |ui| {
                                    let spans = parse_inline(&cell.content);
                                    if let Some(a) = render_spans(ui, &spans, None) {
                                        action = Some(a);
                                    }
                                });
                            });
                        }
                    });
                }
            });
    });

    ui.add_space(8.0);
    action
}

fn cell_layout(ui: &mut Ui, alignment: TableAlignment, add: impl FnOnce(&mut Ui)) {
    let align = match alignment {
        TableAlignment::Right => egui::Align::Max,
        TableAlignment::Center => egui::Align::Center,
        TableAlignment::Left => egui::Align::Min,
    };
    ui.with_layout(egui::Layout::top_down(align), add);
}

/// Render an image, loaded by the installed image loaders
pub fn render_image(
    ui: &mut Ui,
    alt: &str,
    url: &str,
    title: Option<&str>,
) -> Option<BlockAction> {
    let mut action = None;
    let max_width = ui.available_width().min(640.0);

    ui.vertical(|ui| {
        let response = ui.add(
            egui::Image::new(url)
                .max_width(max_width)
                .corner_radius(4)
                .sense(egui::Sense::click()),
        );
        if response.clicked() {
            action = Some(BlockAction::OpenUrl(url.to_string()));
        }
        response.on_hover_text(title.unwrap_or(url));
        if !alt.is_empty() {
            ui.label(RichText::new(alt).italics().color(weak_color(ui)));
        }
    });

    ui.add_space(8.0);
    action
}
