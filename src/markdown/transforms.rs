//! Pattern-based inline transforms applied before markdown parsing

use std::sync::OnceLock;

use regex_lite::{Captures, Regex};

use crate::core::notebook::slugify;

fn highlight_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"==([^=\n]+?)==").expect("valid highlight pattern"))
}

fn wiki_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[\[([^\]|\n]+)(?:\|([^\]\n]+))?\]\]").expect("valid wiki link pattern")
    })
}

/// Prefix of internal notebook links
pub const NOTE_HREF_PREFIX: &str = "#/note/";

/// Internal link target for a notebook
pub fn note_href(target: &str) -> String {
    format!("{}{}", NOTE_HREF_PREFIX, slugify(target))
}

/// `==text==` to `<mark>`, `[[target|label]]` to a markdown link.
/// Code spans and fenced blocks are not touched.
pub fn apply_inline_transforms(text: &str) -> String {
    map_prose(text, |prose| {
        let prose = wiki_link_re().replace_all(prose, |cap: &Captures| {
            let target = cap[1].trim();
            let label = cap.get(2).map(|m| m.as_str().trim()).unwrap_or(target);
            format!("[{}]({})", label, note_href(target))
        });
        highlight_re()
            .replace_all(&prose, "<mark>$1</mark>")
            .into_owned()
    })
}

/// Wiki link targets referenced by a note, in order of appearance
pub fn wiki_links(text: &str) -> Vec<String> {
    let mut links = Vec::new();
    map_prose(text, |prose| {
        for cap in wiki_link_re().captures_iter(prose) {
            let target = cap[1].trim().to_string();
            if !links.contains(&target) {
                links.push(target);
            }
        }
        prose.to_string()
    });
    links
}

/// Apply `f` to every run of text outside fenced blocks and code spans
fn map_prose(text: &str, mut f: impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prose = String::new();
    let mut fence: Option<(char, usize)> = None;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        let marker = trimmed
            .chars()
            .next()
            .filter(|c| *c == '`' || *c == '~')
            .map(|c| (c, trimmed.chars().take_while(|x| *x == c).count()))
            .filter(|(_, n)| *n >= 3);

        match (fence, marker) {
            (None, Some(m)) => {
                out.push_str(&map_code_spans(&prose, &mut f));
                prose.clear();
                fence = Some(m);
                out.push_str(line);
            }
            (Some((c, n)), Some((mc, mn))) if c == mc && mn >= n => {
                fence = None;
                out.push_str(line);
            }
            (Some(_), _) => out.push_str(line),
            (None, None) => prose.push_str(line),
        }
    }
    out.push_str(&map_code_spans(&prose, &mut f));
    out
}

fn map_code_spans(text: &str, f: &mut impl FnMut(&str) -> String) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('`') {
        let run = rest[start..].chars().take_while(|c| *c == '`').count();
        let fence = &rest[start..start + run];
        let after = &rest[start + run..];
        let close = find_run(after, run);
        match close {
            Some(end) => {
                out.push_str(&f(&rest[..start]));
                out.push_str(fence);
                out.push_str(&after[..end + run]);
                rest = &after[end + run..];
            }
            None => {
                out.push_str(&f(&rest[..start + run]));
                rest = after;
            }
        }
    }
    out.push_str(&f(rest));
    out
}

fn find_run(text: &str, run: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut j = 0;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let len = bytes[j..].iter().take_while(|&&b| b == b'`').count();
            if len == run {
                return Some(j);
            }
            j += len;
        } else {
            j += 1;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_highlight_and_wiki_links() {
        assert_eq!(
            apply_inline_transforms("see [[Project Plan|the plan]] and ==this=="),
            "see [the plan](#/note/project-plan) and <mark>this</mark>"
        );
        assert_eq!(
            apply_inline_transforms("[[Daily Log]]"),
            "[Daily Log](#/note/daily-log)"
        );
    }

    #[test]
    fn test_code_is_not_transformed() {
        let src = "`a == b == c` ==hi==\n```\n[[x]]\n```\n";
        assert_eq!(
            apply_inline_transforms(src),
            "`a == b == c` <mark>hi</mark>\n```\n[[x]]\n```\n"
        );
    }

    #[test]
    fn test_wiki_links_deduplicated() {
        assert_eq!(
            wiki_links("[[A]] then [[B|bee]] then [[A]]"),
            vec!["A".to_string(), "B".to_string()]
        );
    }
}
