//! Pure text edits driven by the toolbar
//!
//! Selections are byte ranges into the buffer. Every operation returns the
//! new text together with the selection the editor should show afterwards.

use std::ops::Range;

/// Result of an edit
#[derive(Debug, Clone, PartialEq)]
pub struct Edit {
    pub text: String,
    pub selection: Range<usize>,
}

/// Line prefixes the toolbar can toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinePrefix {
    Heading(u8),
    Bullet,
    Numbered,
    Task,
    Quote,
}

fn clamp(text: &str, sel: &Range<usize>) -> Range<usize> {
    let mut start = sel.start.min(text.len());
    let mut end = sel.end.min(text.len()).max(start);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    while !text.is_char_boundary(end) {
        end += 1;
    }
    start..end
}

/// Surround the selection with `prefix`/`suffix`, or remove them if present
pub fn wrap_selection(text: &str, sel: Range<usize>, prefix: &str, suffix: &str) -> Edit {
    let sel = clamp(text, &sel);
    let (p, s) = (prefix.len(), suffix.len());

    // Markers just outside the selection
    let outside = sel.start >= p
        && text.get(sel.start - p..sel.start) == Some(prefix)
        && text.get(sel.end..sel.end + s) == Some(suffix);
    if outside {
        let text = format!(
            "{}{}{}",
            &text[..sel.start - p],
            &text[sel.clone()],
            &text[sel.end + s..]
        );
        return Edit {
            text,
            selection: sel.start - p..sel.end - p,
        };
    }

    // Markers inside the selection
    let selected = &text[sel.clone()];
    if selected.len() >= p + s && selected.starts_with(prefix) && selected.ends_with(suffix) {
        let inner = &selected[p..selected.len() - s];
        let text = format!("{}{}{}", &text[..sel.start], inner, &text[sel.end..]);
        return Edit {
            text,
            selection: sel.start..sel.start + inner.len(),
        };
    }

    let text = format!(
        "{}{}{}{}{}",
        &text[..sel.start],
        prefix,
        selected,
        suffix,
        &text[sel.end..]
    );
    Edit {
        text,
        selection: sel.start + p..sel.end + p,
    }
}

fn line_bounds(text: &str, sel: &Range<usize>) -> Range<usize> {
    let start = text[..sel.start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end_from = if sel.end > sel.start && text[..sel.end].ends_with('\n') {
        sel.end - 1
    } else {
        sel.end
    };
    let end = text[end_from..]
        .find('\n')
        .map(|i| end_from + i)
        .unwrap_or(text.len());
    start..end.max(start)
}

fn strip_prefix(line: &str, prefix: LinePrefix) -> Option<&str> {
    match prefix {
        LinePrefix::Heading(_) => {
            let hashes = line.chars().take_while(|c| *c == '#').count();
            if (1..=6).contains(&hashes) {
                line[hashes..].strip_prefix(' ')
            } else {
                None
            }
        }
        LinePrefix::Bullet => line.strip_prefix("- ").filter(|rest| !rest.starts_with("[ ] ") && !rest.starts_with("[x] ")),
        LinePrefix::Task => line
            .strip_prefix("- [ ] ")
            .or_else(|| line.strip_prefix("- [x] ")),
        LinePrefix::Quote => line.strip_prefix("> ").or_else(|| line.strip_prefix('>')),
        LinePrefix::Numbered => {
            let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits == 0 {
                return None;
            }
            line[digits..].strip_prefix(". ")
        }
    }
}

fn heading_level(line: &str) -> Option<u8> {
    strip_prefix(line, LinePrefix::Heading(1))?;
    Some(line.chars().take_while(|c| *c == '#').count() as u8)
}

/// Toggle a line prefix on every line touched by the selection
pub fn prefix_lines(text: &str, sel: Range<usize>, prefix: LinePrefix) -> Edit {
    let sel = clamp(text, &sel);
    let bounds = line_bounds(text, &sel);
    let block = &text[bounds.clone()];
    let lines: Vec<&str> = block.split('\n').collect();

    let remove = match prefix {
        LinePrefix::Heading(level) => lines
            .iter()
            .all(|l| heading_level(l) == Some(level)),
        _ => lines
            .iter()
            .filter(|l| !l.trim().is_empty())
            .all(|l| strip_prefix(l, prefix).is_some())
            && lines.iter().any(|l| !l.trim().is_empty()),
    };

    let mut number = 0;
    let rewritten: Vec<String> = lines
        .iter()
        .map(|line| {
            if remove {
                return strip_prefix(line, prefix).unwrap_or(line).to_string();
            }
            if line.trim().is_empty() && lines.len() > 1 {
                return line.to_string();
            }
            match prefix {
                LinePrefix::Heading(level) => {
                    let body = strip_prefix(line, prefix).unwrap_or(line);
                    format!("{} {}", "#".repeat(level as usize), body)
                }
                LinePrefix::Numbered => {
                    number += 1;
                    let body = strip_prefix(line, prefix).unwrap_or(line);
                    format!("{}. {}", number, body)
                }
                LinePrefix::Bullet => format!("- {}", strip_prefix(line, LinePrefix::Task).unwrap_or(line)),
                LinePrefix::Task => format!("- [ ] {}", strip_prefix(line, LinePrefix::Bullet).unwrap_or(line)),
                LinePrefix::Quote => format!("> {}", line),
            }
        })
        .collect();

    let replacement = rewritten.join("\n");
    let new_end = bounds.start + replacement.len();
    let text = format!("{}{}{}", &text[..bounds.start], replacement, &text[bounds.end..]);
    let selection = if sel.is_empty() {
        new_end..new_end
    } else {
        bounds.start..new_end
    };
    Edit { text, selection }
}

/// Turn the selection into a link label and select the URL placeholder
pub fn insert_link(text: &str, sel: Range<usize>) -> Edit {
    let sel = clamp(text, &sel);
    let selected = &text[sel.clone()];
    let (label, url) = if selected.starts_with("http://") || selected.starts_with("https://") {
        ("link", selected)
    } else if selected.is_empty() {
        ("link", "https://")
    } else {
        (selected, "https://")
    };
    let inserted = format!("[{}]({})", label, url);
    let url_start = sel.start + label.len() + 3;
    let text = format!("{}{}{}", &text[..sel.start], inserted, &text[sel.end..]);
    Edit {
        text,
        selection: url_start..url_start + url.len(),
    }
}

/// Put the selection inside a block delimited by `open`/`close` lines
pub fn insert_block(text: &str, sel: Range<usize>, open: &str, close: &str) -> Edit {
    let sel = clamp(text, &sel);
    let selected = text[sel.clone()].trim_end_matches('\n');
    let before = &text[..sel.start];
    let after = &text[sel.end..];

    let lead = if before.is_empty() || before.ends_with('\n') { "" } else { "\n" };
    let trail = if after.starts_with('\n') { "" } else { "\n" };
    let head = format!("{}{}{}\n", before, lead, open);
    let content_start = head.len();
    let text = format!("{}{}\n{}{}{}", head, selected, close, trail, after);
    Edit {
        text,
        selection: content_start..content_start + selected.len(),
    }
}

/// Insert `snippet` at the cursor on its own line, replacing the selection
pub fn insert_snippet(text: &str, sel: Range<usize>, snippet: &str) -> Edit {
    let sel = clamp(text, &sel);
    let before = &text[..sel.start];
    let lead = if before.is_empty() || before.ends_with('\n') { "" } else { "\n" };
    let head = format!("{}{}{}", before, lead, snippet);
    let cursor = head.len();
    Edit {
        text: format!("{}{}", head, &text[sel.end..]),
        selection: cursor..cursor,
    }
}

/// Byte offset of the `char_index`-th character
pub fn byte_offset(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Character index of a byte offset
pub fn char_index(text: &str, byte_offset: usize) -> usize {
    let mut offset = byte_offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    text[..offset].chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_wrap_and_unwrap_selection() {
        let edit = wrap_selection("make this bold", 5..9, "**", "**");
        assert_eq!(edit.text, "make **this** bold");
        assert_eq!(&edit.text[edit.selection.clone()], "this");

        let undone = wrap_selection(&edit.text, edit.selection, "**", "**");
        assert_eq!(undone.text, "make this bold");
        assert_eq!(undone.selection, 5..9);

        let inner = wrap_selection("a **b** c", 2..7, "**", "**");
        assert_eq!(inner.text, "a b c");
    }

    #[test]
    fn test_wrap_empty_selection_places_cursor_inside() {
        let edit = wrap_selection("ab", 1..1, "`", "`");
        assert_eq!(edit.text, "a``b");
        assert_eq!(edit.selection, 2..2);
    }

    #[test]
    fn test_heading_replaces_and_toggles() {
        let edit = prefix_lines("intro\n## Title\nbody", 8..8, LinePrefix::Heading(1));
        assert_eq!(edit.text, "intro\n# Title\nbody");
        let edit = prefix_lines(&edit.text, 8..8, LinePrefix::Heading(1));
        assert_eq!(edit.text, "intro\nTitle\nbody");
    }

    #[test]
    fn test_numbered_list_over_selection() {
        let text = "one\ntwo\n\nthree";
        let edit = prefix_lines(text, 0..text.len(), LinePrefix::Numbered);
        assert_eq!(edit.text, "1. one\n2. two\n\n3. three");
        let back = prefix_lines(&edit.text, edit.selection, LinePrefix::Numbered);
        assert_eq!(back.text, text);
    }

    #[test]
    fn test_bullet_converts_to_task() {
        let edit = prefix_lines("- milk", 0..0, LinePrefix::Task);
        assert_eq!(edit.text, "- [ ] milk");
        let edit = prefix_lines(&edit.text, 0..0, LinePrefix::Bullet);
        assert_eq!(edit.text, "- milk");
    }

    #[test]
    fn test_insert_link_selects_url() {
        let edit = insert_link("see docs", 4..8);
        assert_eq!(edit.text, "see [docs](https://)");
        assert_eq!(&edit.text[edit.selection], "https://");
    }

    #[test]
    fn test_insert_math_block_on_own_lines() {
        let edit = insert_block("sum: x+y rest", 5..8, "$$", "$$");
        assert_eq!(edit.text, "sum: \n$$\nx+y\n$$\n rest");
        assert_eq!(&edit.text[edit.selection], "x+y");
    }

    #[test]
    fn test_char_byte_conversion() {
        let text = "héllo";
        assert_eq!(byte_offset(text, 2), 3);
        assert_eq!(char_index(text, 3), 2);
        assert_eq!(byte_offset(text, 99), text.len());
    }
}
