//! Markdown block parsing for the preview
//!
//! This module parses markdown content into discrete blocks with byte ranges
//! in the markdown source, so a click on a rendered block can move the editor
//! cursor to the matching markdown.

use std::ops::Range;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::math::{protect_math, Protected};

/// A list item with potential checkbox state
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    /// Inline markdown of the item
    pub text: String,
    /// Checkbox state: Some(true) = checked, Some(false) = unchecked, None = no checkbox
    pub checkbox: Option<bool>,
    /// Nested items (for sublists)
    pub children: Vec<ListItem>,
}

/// A table cell
#[derive(Debug, Clone, PartialEq)]
pub struct TableCell {
    pub content: String,
    pub alignment: TableAlignment,
}

/// Table column alignment
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum TableAlignment {
    #[default]
    Left,
    Center,
    Right,
}

impl From<Alignment> for TableAlignment {
    fn from(alignment: Alignment) -> Self {
        match alignment {
            Alignment::Center => TableAlignment::Center,
            Alignment::Right => TableAlignment::Right,
            Alignment::Left | Alignment::None => TableAlignment::Left,
        }
    }
}

/// A parsed markdown block with its byte range in the source
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBlock {
    /// Heading with level (1-6) and inline text
    Heading {
        level: u8,
        text: String,
        range: Range<usize>,
    },

    /// Regular paragraph
    Paragraph {
        text: String,
        range: Range<usize>,
    },

    /// Fenced or indented code block
    CodeBlock {
        lang: Option<String>,
        code: String,
        range: Range<usize>,
    },

    /// Display math standing alone in its paragraph
    Math {
        tex: String,
        range: Range<usize>,
    },

    /// Unordered or ordered list
    List {
        items: Vec<ListItem>,
        ordered: bool,
        start: Option<u64>,
        range: Range<usize>,
    },

    /// Block quote
    BlockQuote {
        text: String,
        range: Range<usize>,
    },

    /// Horizontal rule
    HorizontalRule {
        range: Range<usize>,
    },

    /// Table
    Table {
        headers: Vec<TableCell>,
        rows: Vec<Vec<TableCell>>,
        range: Range<usize>,
    },

    /// Image standing alone in its paragraph
    Image {
        alt: String,
        url: String,
        title: Option<String>,
        range: Range<usize>,
    },
}

impl ParsedBlock {
    /// Get the byte range of this block in the source
    pub fn range(&self) -> Range<usize> {
        match self {
            ParsedBlock::Heading { range, .. }
            | ParsedBlock::Paragraph { range, .. }
            | ParsedBlock::CodeBlock { range, .. }
            | ParsedBlock::Math { range, .. }
            | ParsedBlock::List { range, .. }
            | ParsedBlock::BlockQuote { range, .. }
            | ParsedBlock::HorizontalRule { range }
            | ParsedBlock::Table { range, .. }
            | ParsedBlock::Image { range, .. } => range.clone(),
        }
    }

    /// Check if the given byte position is within this block
    pub fn contains(&self, byte_pos: usize) -> bool {
        self.range().contains(&byte_pos)
    }
}

pub(crate) fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

struct ListFrame {
    items: Vec<ListItem>,
    ordered: bool,
    start: Option<u64>,
}

struct PendingImage {
    url: String,
    title: Option<String>,
    alt_start: usize,
}

/// Parse markdown content into blocks
pub fn parse_blocks(content: &str) -> Vec<ParsedBlock> {
    let protected = protect_math(content);
    let mut blocks = Vec::new();

    let mut block_start = 0;
    let mut text = String::new();
    let mut code_lang: Option<String> = None;
    let mut in_code = false;
    let mut lists: Vec<ListFrame> = Vec::new();
    let mut items: Vec<ListItem> = Vec::new();
    let mut quote_depth = 0usize;
    let mut table_alignments: Vec<TableAlignment> = Vec::new();
    let mut table_headers: Vec<TableCell> = Vec::new();
    let mut table_rows: Vec<Vec<TableCell>> = Vec::new();
    let mut current_row: Vec<TableCell> = Vec::new();
    let mut in_table_head = false;
    let mut image: Option<PendingImage> = None;
    let mut lone_image: Option<(String, String, Option<String>)> = None;
    let mut link_stack: Vec<String> = Vec::new();

    let nested = |lists: &Vec<ListFrame>, quote_depth: usize| !lists.is_empty() || quote_depth > 0;
    let src_range = |r: Range<usize>| protected.source_offset(r.start)..protected.source_offset(r.end);

    let parser = Parser::new_ext(&protected.text, parser_options());
    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { .. } | Tag::Paragraph if !nested(&lists, quote_depth) => {
                    block_start = range.start;
                    text.clear();
                    lone_image = None;
                }
                Tag::CodeBlock(kind) => {
                    if !nested(&lists, quote_depth) {
                        block_start = range.start;
                        text.clear();
                    }
                    in_code = true;
                    code_lang = match kind {
                        CodeBlockKind::Fenced(lang) => {
                            let lang = lang.split_whitespace().next().unwrap_or("").to_string();
                            (!lang.is_empty()).then_some(lang)
                        }
                        CodeBlockKind::Indented => None,
                    };
                }
                Tag::List(start) => {
                    if lists.is_empty() && quote_depth == 0 {
                        block_start = range.start;
                    }
                    if let Some(parent) = items.last_mut() {
                        append_trimmed(&mut parent.text, &text);
                    }
                    text.clear();
                    lists.push(ListFrame {
                        items: Vec::new(),
                        ordered: start.is_some(),
                        start,
                    });
                }
                Tag::Item => {
                    text.clear();
                    items.push(ListItem {
                        text: String::new(),
                        checkbox: None,
                        children: Vec::new(),
                    });
                }
                Tag::BlockQuote(_) => {
                    if quote_depth == 0 && lists.is_empty() {
                        block_start = range.start;
                        text.clear();
                    }
                    quote_depth += 1;
                }
                Tag::Table(alignments) => {
                    block_start = range.start;
                    table_alignments = alignments.into_iter().map(Into::into).collect();
                    table_headers.clear();
                    table_rows.clear();
                }
                Tag::TableHead => {
                    in_table_head = true;
                    current_row.clear();
                }
                Tag::TableRow => current_row.clear(),
                Tag::TableCell => text.clear(),
                Tag::Emphasis => text.push('*'),
                Tag::Strong => text.push_str("**"),
                Tag::Strikethrough => text.push_str("~~"),
                Tag::Link { dest_url, .. } => {
                    text.push('[');
                    link_stack.push(dest_url.to_string());
                }
                Tag::Image {
                    dest_url, title, ..
                } => {
                    image = Some(PendingImage {
                        url: dest_url.to_string(),
                        title: (!title.is_empty()).then(|| title.to_string()),
                        alt_start: text.len(),
                    });
                }
                _ => {}
            },

            Event::End(tag_end) => match tag_end {
                TagEnd::Heading(level) if !nested(&lists, quote_depth) => {
                    blocks.push(ParsedBlock::Heading {
                        level: level as u8,
                        text: protected.expand(text.trim()),
                        range: src_range(block_start..range.end),
                    });
                    text.clear();
                }
                TagEnd::Paragraph => {
                    if !lists.is_empty() {
                        text.push('\n');
                    } else if quote_depth > 0 {
                        text.push_str("\n\n");
                    } else {
                        let range = src_range(block_start..range.end);
                        blocks.push(paragraph_block(&protected, &text, lone_image.take(), range));
                        text.clear();
                    }
                }
                TagEnd::CodeBlock => {
                    in_code = false;
                    if nested(&lists, quote_depth) {
                        text.push_str("\n");
                    } else {
                        blocks.push(ParsedBlock::CodeBlock {
                            lang: code_lang.take(),
                            code: text.clone(),
                            range: src_range(block_start..range.end),
                        });
                        text.clear();
                    }
                }
                TagEnd::Item => {
                    if let Some(mut item) = items.pop() {
                        append_trimmed(&mut item.text, &text);
                        item.text = protected.expand(&item.text);
                        text.clear();
                        if let Some(frame) = lists.last_mut() {
                            frame.items.push(item);
                        }
                    }
                }
                TagEnd::List(_) => {
                    if let Some(frame) = lists.pop() {
                        if let Some(parent) = items.last_mut() {
                            parent.children.extend(frame.items);
                        } else if quote_depth > 0 {
                            for item in frame.items {
                                text.push_str("- ");
                                text.push_str(&item.text);
                                text.push('\n');
                            }
                        } else {
                            blocks.push(ParsedBlock::List {
                                items: frame.items,
                                ordered: frame.ordered,
                                start: frame.start,
                                range: src_range(block_start..range.end),
                            });
                        }
                    }
                }
                TagEnd::BlockQuote(_) => {
                    quote_depth = quote_depth.saturating_sub(1);
                    if quote_depth == 0 && lists.is_empty() {
                        blocks.push(ParsedBlock::BlockQuote {
                            text: protected.expand(text.trim()),
                            range: src_range(block_start..range.end),
                        });
                        text.clear();
                    }
                }
                TagEnd::Table => {
                    blocks.push(ParsedBlock::Table {
                        headers: std::mem::take(&mut table_headers),
                        rows: std::mem::take(&mut table_rows),
                        range: src_range(block_start..range.end),
                    });
                }
                TagEnd::TableHead => {
                    table_headers = std::mem::take(&mut current_row);
                    in_table_head = false;
                }
                TagEnd::TableRow => {
                    if !in_table_head {
                        table_rows.push(std::mem::take(&mut current_row));
                    }
                }
                TagEnd::TableCell => {
                    let alignment = table_alignments
                        .get(current_row.len())
                        .copied()
                        .unwrap_or_default();
                    current_row.push(TableCell {
                        content: protected.expand(text.trim()),
                        alignment,
                    });
                    text.clear();
                }
                TagEnd::Emphasis => text.push('*'),
                TagEnd::Strong => text.push_str("**"),
                TagEnd::Strikethrough => text.push_str("~~"),
                TagEnd::Link => {
                    let url = link_stack.pop().unwrap_or_default();
                    text.push_str(&format!("]({})", url));
                }
                TagEnd::Image => {
                    if let Some(img) = image.take() {
                        let alt = text[img.alt_start..].to_string();
                        if img.alt_start == 0 || text[..img.alt_start].trim().is_empty() {
                            lone_image = Some((alt, img.url, img.title));
                        } else {
                            lone_image = None;
                        }
                    }
                }
                _ => {}
            },

            Event::Text(t) => {
                if !in_code && lone_image.is_some() && !t.trim().is_empty() {
                    lone_image = None;
                }
                text.push_str(&t);
            }

            Event::Code(code) => {
                lone_image = None;
                text.push('`');
                text.push_str(&code);
                text.push('`');
            }

            Event::Html(html) | Event::InlineHtml(html) => {
                if !html.trim_start().starts_with("<!--") {
                    text.push_str(&html);
                }
            }

            Event::FootnoteReference(label) => {
                text.push_str(&format!("[^{}]", label));
            }

            Event::SoftBreak => text.push(' '),
            Event::HardBreak => text.push('\n'),

            Event::Rule => {
                if !nested(&lists, quote_depth) {
                    blocks.push(ParsedBlock::HorizontalRule {
                        range: src_range(range),
                    });
                }
            }

            Event::TaskListMarker(checked) => {
                if let Some(item) = items.last_mut() {
                    item.checkbox = Some(checked);
                }
            }

            _ => {}
        }
    }

    blocks
}

fn append_trimmed(dest: &mut String, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !dest.is_empty() {
        dest.push(' ');
    }
    dest.push_str(text);
}

fn paragraph_block(
    protected: &Protected,
    text: &str,
    lone_image: Option<(String, String, Option<String>)>,
    range: Range<usize>,
) -> ParsedBlock {
    if let Some(span) = protected.sole_display(text) {
        return ParsedBlock::Math {
            tex: span.tex.clone(),
            range,
        };
    }
    if let Some((alt, url, title)) = lone_image {
        if text.trim() == alt.trim() {
            return ParsedBlock::Image {
                alt,
                url,
                title,
                range,
            };
        }
    }
    ParsedBlock::Paragraph {
        text: protected.expand(text.trim()),
        range,
    }
}

/// Find the block containing a given byte position
pub fn find_block_at_position(blocks: &[ParsedBlock], byte_pos: usize) -> Option<usize> {
    blocks.iter().position(|block| block.contains(byte_pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_headings_and_paragraphs_keep_inline_markup() {
        let src = "# Title\n\nSome **bold** and *it* with [a link](http://x.y).\n";
        let blocks = parse_blocks(src);
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], ParsedBlock::Heading { level: 1, text, .. } if text == "Title"));
        match &blocks[1] {
            ParsedBlock::Paragraph { text, range } => {
                assert_eq!(text, "Some **bold** and *it* with [a link](http://x.y).");
                assert_eq!(
                    src[range.clone()].trim_end(),
                    "Some **bold** and *it* with [a link](http://x.y)."
                );
            }
            other => panic!("unexpected block: {:?}", other),
        }
    }

    #[test]
    fn test_display_math_block_and_source_ranges() {
        let src = "Before $x_1$ here\n\n$$\n\\frac{a}{b}\n$$\n\nafter\n";
        let blocks = parse_blocks(src);
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[0], ParsedBlock::Paragraph { text, .. } if text == "Before $x_1$ here"));
        match &blocks[1] {
            ParsedBlock::Math { tex, range } => {
                assert_eq!(tex, "\\frac{a}{b}");
                assert_eq!(src[range.clone()].trim_end(), "$$\n\\frac{a}{b}\n$$");
            }
            other => panic!("unexpected block: {:?}", other),
        }
        let after = blocks[2].range();
        assert_eq!(src[after].trim_end(), "after");
    }

    #[test]
    fn test_task_list_with_children() {
        let src = "- [x] done\n- [ ] todo\n  - sub item\n";
        let blocks = parse_blocks(src);
        assert_eq!(blocks.len(), 1);
        let ParsedBlock::List { items, ordered, .. } = &blocks[0] else {
            panic!("expected list");
        };
        assert!(!ordered);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].checkbox, Some(true));
        assert_eq!(items[0].text, "done");
        assert_eq!(items[1].checkbox, Some(false));
        assert_eq!(items[1].text, "todo");
        assert_eq!(items[1].children[0].text, "sub item");
    }

    #[test]
    fn test_table_alignment() {
        let src = "| a | b |\n|:-:|--:|\n| 1 | 2 |\n";
        let blocks = parse_blocks(src);
        let ParsedBlock::Table { headers, rows, .. } = &blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(headers[0].alignment, TableAlignment::Center);
        assert_eq!(headers[1].alignment, TableAlignment::Right);
        assert_eq!(rows[0][1].content, "2");
    }

    #[test]
    fn test_lone_image_and_code() {
        let src = "![diagram](img.png \"Fig\")\n\n```rust\nfn main() {}\n```\n";
        let blocks = parse_blocks(src);
        assert!(matches!(
            &blocks[0],
            ParsedBlock::Image { alt, url, title: Some(t), .. } if alt == "diagram" && url == "img.png" && t == "Fig"
        ));
        assert!(matches!(
            &blocks[1],
            ParsedBlock::CodeBlock { lang: Some(l), code, .. } if l == "rust" && code == "fn main() {}\n"
        ));
        assert_eq!(find_block_at_position(&blocks, src.len() - 2), Some(1));
    }

    #[test]
    fn test_quote_collects_text() {
        let blocks = parse_blocks("> first\n>\n> second\n");
        assert!(matches!(
            &blocks[0],
            ParsedBlock::BlockQuote { text, .. } if text == "first\n\nsecond"
        ));
    }
}
