//! Editor toolbar actions and autosave timing

pub mod debounce;
pub mod ops;

use std::ops::Range;

pub use debounce::Debouncer;
use ops::{Edit, LinePrefix};

/// Formatting commands offered by the toolbar and keyboard shortcuts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolbarAction {
    Bold,
    Italic,
    Strikethrough,
    Highlight,
    InlineCode,
    InlineMath,
    Heading(u8),
    BulletList,
    NumberedList,
    TaskList,
    Quote,
    Link,
    CodeBlock,
    MathBlock,
    HorizontalRule,
    Table,
}

const TABLE_TEMPLATE: &str = "| Column | Column |\n| ------ | ------ |\n| cell   | cell   |\n";

impl ToolbarAction {
    /// Toolbar order
    pub const ALL: [ToolbarAction; 18] = [
        ToolbarAction::Heading(1),
        ToolbarAction::Heading(2),
        ToolbarAction::Heading(3),
        ToolbarAction::Bold,
        ToolbarAction::Italic,
        ToolbarAction::Strikethrough,
        ToolbarAction::Highlight,
        ToolbarAction::InlineCode,
        ToolbarAction::Link,
        ToolbarAction::BulletList,
        ToolbarAction::NumberedList,
        ToolbarAction::TaskList,
        ToolbarAction::Quote,
        ToolbarAction::CodeBlock,
        ToolbarAction::InlineMath,
        ToolbarAction::MathBlock,
        ToolbarAction::Table,
        ToolbarAction::HorizontalRule,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ToolbarAction::Bold => "B",
            ToolbarAction::Italic => "I",
            ToolbarAction::Strikethrough => "S",
            ToolbarAction::Highlight => "==",
            ToolbarAction::InlineCode => "</>",
            ToolbarAction::InlineMath => "$x$",
            ToolbarAction::Heading(1) => "H1",
            ToolbarAction::Heading(2) => "H2",
            ToolbarAction::Heading(_) => "H3",
            ToolbarAction::BulletList => "-",
            ToolbarAction::NumberedList => "1.",
            ToolbarAction::TaskList => "[ ]",
            ToolbarAction::Quote => ">",
            ToolbarAction::Link => "Link",
            ToolbarAction::CodeBlock => "{ }",
            ToolbarAction::MathBlock => "$$",
            ToolbarAction::HorizontalRule => "---",
            ToolbarAction::Table => "Table",
        }
    }

    pub fn tooltip(&self) -> &'static str {
        match self {
            ToolbarAction::Bold => "Bold (Ctrl+B)",
            ToolbarAction::Italic => "Italic (Ctrl+I)",
            ToolbarAction::Strikethrough => "Strikethrough",
            ToolbarAction::Highlight => "Highlight",
            ToolbarAction::InlineCode => "Inline code",
            ToolbarAction::InlineMath => "Inline math",
            ToolbarAction::Heading(_) => "Heading",
            ToolbarAction::BulletList => "Bullet list",
            ToolbarAction::NumberedList => "Numbered list",
            ToolbarAction::TaskList => "Task list",
            ToolbarAction::Quote => "Quote",
            ToolbarAction::Link => "Link (Ctrl+K)",
            ToolbarAction::CodeBlock => "Code block",
            ToolbarAction::MathBlock => "Math block",
            ToolbarAction::HorizontalRule => "Horizontal rule",
            ToolbarAction::Table => "Table",
        }
    }

    /// Apply the action to `text` with the given byte selection
    pub fn apply(self, text: &str, selection: Range<usize>) -> Edit {
        match self {
            ToolbarAction::Bold => ops::wrap_selection(text, selection, "**", "**"),
            ToolbarAction::Italic => ops::wrap_selection(text, selection, "*", "*"),
            ToolbarAction::Strikethrough => ops::wrap_selection(text, selection, "~~", "~~"),
            ToolbarAction::Highlight => ops::wrap_selection(text, selection, "==", "=="),
            ToolbarAction::InlineCode => ops::wrap_selection(text, selection, "`", "`"),
            ToolbarAction::InlineMath => ops::wrap_selection(text, selection, "$", "$"),
            ToolbarAction::Heading(level) => {
                ops::prefix_lines(text, selection, LinePrefix::Heading(level.clamp(1, 6)))
            }
            ToolbarAction::BulletList => ops::prefix_lines(text, selection, LinePrefix::Bullet),
            ToolbarAction::NumberedList => ops::prefix_lines(text, selection, LinePrefix::Numbered),
            ToolbarAction::TaskList => ops::prefix_lines(text, selection, LinePrefix::Task),
            ToolbarAction::Quote => ops::prefix_lines(text, selection, LinePrefix::Quote),
            ToolbarAction::Link => ops::insert_link(text, selection),
            ToolbarAction::CodeBlock => ops::insert_block(text, selection, "```", "```"),
            ToolbarAction::MathBlock => ops::insert_block(text, selection, "$$", "$$"),
            ToolbarAction::HorizontalRule => ops::insert_snippet(text, selection, "\n---\n\n"),
            ToolbarAction::Table => ops::insert_snippet(text, selection, TABLE_TEMPLATE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_italic_toggle_via_action() {
        let edit = ToolbarAction::Italic.apply("word", 0..4);
        assert_eq!(edit.text, "*word*");
        let edit = ToolbarAction::Italic.apply(&edit.text, edit.selection);
        assert_eq!(edit.text, "word");
    }

    #[test]
    fn test_table_inserted_on_new_line() {
        let edit = ToolbarAction::Table.apply("text", 4..4);
        assert!(edit.text.starts_with("text\n| Column"));
        assert_eq!(edit.selection.start, edit.text.len());
    }

    #[test]
    fn test_every_action_keeps_selection_in_bounds() {
        let text = "alpha beta\ngamma";
        for action in ToolbarAction::ALL {
            let edit = action.apply(text, 2..8);
            assert!(edit.selection.end <= edit.text.len(), "{:?}", action);
            assert!(edit.selection.start <= edit.selection.end, "{:?}", action);
        }
    }
}
