//! Markdown rendering pipeline
//!
//! Source text flows through [`math::protect_math`], then
//! [`transforms::apply_inline_transforms`], then `pulldown-cmark`, and
//! finally [`math::restore_math`]. The preview panel uses the block model in
//! [`blocks`] instead of HTML.

pub mod blocks;
pub mod inline;
pub mod math;
pub mod transforms;

use pulldown_cmark::{html, Event, HeadingLevel, Parser, Tag, TagEnd};

pub use blocks::{parse_blocks, ParsedBlock};
pub use inline::{parse_inline, InlineSpan};

/// A heading in a note's table of contents
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub level: u8,
    pub text: String,
    /// Byte offset of the heading in the source
    pub offset: usize,
}

/// Render markdown to an HTML fragment
pub fn render_html(source: &str) -> String {
    let protected = math::protect_math(source);
    let transformed = transforms::apply_inline_transforms(&protected.text);
    let parser = Parser::new_ext(&transformed, blocks::parser_options());

    let mut out = String::with_capacity(transformed.len() * 3 / 2);
    html::push_html(&mut out, parser);
    math::restore_math(&out, &protected)
}

/// Wrap a rendered fragment in a standalone page
pub fn render_document(title: &str, source: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n\
         <script src=\"https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-chtml.js\" async></script>\n\
         </head>\n<body>\n<article>\n{}</article>\n</body>\n</html>\n",
        math::escape_html(title),
        render_html(source)
    )
}

/// Headings of a note in document order
pub fn outline(source: &str) -> Vec<OutlineEntry> {
    let protected = math::protect_math(source);
    let mut entries = Vec::new();
    let mut current: Option<(HeadingLevel, usize, String)> = None;

    for (event, range) in Parser::new_ext(&protected.text, blocks::parser_options()).into_offset_iter() {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((level, protected.source_offset(range.start), String::new()));
            }
            Event::Text(t) | Event::Code(t) => {
                if let Some((_, _, text)) = current.as_mut() {
                    text.push_str(&t);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, offset, text)) = current.take() {
                    entries.push(OutlineEntry {
                        level: level as u8,
                        text: protected.expand(text.trim()),
                        offset,
                    });
                }
            }
            _ => {}
        }
    }
    entries
}

/// Words in the note, ignoring markdown punctuation
pub fn word_count(source: &str) -> usize {
    source
        .split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_html_pipeline() {
        let html = render_html("# Notes\n\nEuler: $e^{i\\pi} + 1 = 0$ is ==neat==, see [[Math Tricks]].\n\n$$\na_1 < b_1\n$$\n");
        assert_eq!(
            html,
            "<h1>Notes</h1>\n\
             <p>Euler: <span class=\"math inline\">\\(e^{i\\pi} + 1 = 0\\)</span> is <mark>neat</mark>, \
             see <a href=\"#/note/math-tricks\">Math Tricks</a>.</p>\n\
             <div class=\"math display\">\\[a_1 &lt; b_1\\]</div>\n"
        );
    }

    #[test]
    fn test_underscores_in_math_are_not_emphasis() {
        let html = render_html("$a_b$ and $c_d$");
        assert!(!html.contains("<em>"));
        assert!(html.contains("\\(a_b\\)"));
    }

    #[test]
    fn test_tables_and_tasks() {
        let html = render_html("- [x] done\n\n| a |\n|---|\n| 1 |\n");
        assert!(html.contains("type=\"checkbox\""));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_outline_offsets() {
        let src = "# One\n\ntext $x$\n\n## Two `code`\n";
        let entries = outline(src);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].level, 2);
        assert_eq!(entries[1].text, "Two code");
        assert_eq!(entries[1].offset, src.find("## Two").unwrap());
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("# Title\n\n- one two\n- ---\n"), 3);
    }

    #[test]
    fn test_document_escapes_title() {
        let doc = render_document("A <b> & C", "hi");
        assert!(doc.contains("<title>A &lt;b&gt; &amp; C</title>"));
        assert!(doc.contains("<p>hi</p>"));
    }
}
