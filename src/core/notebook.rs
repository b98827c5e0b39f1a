//! Notebook documents: markdown content plus frontmatter metadata

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};

/// A markdown notebook, either a local draft or a copy of a remote file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    /// Markdown body without frontmatter
    pub content: String,
    /// Blob SHA of the last known remote copy; `None` until published
    #[serde(default)]
    pub remote_sha: Option<String>,
}

/// Frontmatter metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotebookMeta {
    pub title: Option<String>,
    pub tags: Vec<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

impl Notebook {
    /// Create an empty notebook titled `title`
    pub fn new(title: &str) -> Self {
        let now = Utc::now();
        let title = if title.trim().is_empty() {
            "Untitled".to_string()
        } else {
            title.trim().to_string()
        };
        Self {
            slug: slugify(&title),
            content: format!("# {}\n\n", title),
            title,
            tags: Vec::new(),
            created: now,
            updated: now,
            remote_sha: None,
        }
    }

    /// Parse a repository file into a notebook
    pub fn parse(slug: &str, file_text: &str) -> Self {
        let (meta, body) = split_frontmatter(file_text);
        let meta = meta.unwrap_or_default();
        let now = Utc::now();
        let title = meta
            .title
            .clone()
            .or_else(|| extract_title(body))
            .unwrap_or_else(|| slug.to_string());
        Self {
            slug: slug.to_string(),
            title,
            tags: meta.tags,
            created: meta.created.unwrap_or(now),
            updated: meta.updated.or(meta.created).unwrap_or(now),
            content: body.to_string(),
            remote_sha: None,
        }
    }

    /// Serialize to the on-repo representation: frontmatter followed by the body
    pub fn to_file_text(&self) -> String {
        let mut out = String::from("---\n");
        out.push_str(&format!("title: {}\n", quote(&self.title)));
        if !self.tags.is_empty() {
            out.push_str(&format!("tags: [{}]\n", self.tags.join(", ")));
        }
        out.push_str(&format!("created: {}\n", self.created.to_rfc3339()));
        out.push_str(&format!("updated: {}\n", self.updated.to_rfc3339()));
        out.push_str("---\n\n");
        out.push_str(self.content.trim_start_matches('\n'));
        out
    }

    /// Replace the body. Returns `true` if anything changed.
    pub fn set_content(&mut self, content: String) -> bool {
        if self.content == content {
            return false;
        }
        if let Some(title) = extract_title(&content) {
            self.title = title;
        }
        self.content = content;
        self.updated = Utc::now();
        true
    }

    /// Record an in-place edit of `content`
    pub fn touch(&mut self) {
        if let Some(title) = extract_title(&self.content) {
            self.title = title;
        }
        self.updated = Utc::now();
    }

    /// Parse a comma separated tag list
    pub fn set_tags(&mut self, raw: &str) {
        let tags: Vec<String> = raw
            .split(',')
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if tags != self.tags {
            self.tags = tags;
            self.updated = Utc::now();
        }
    }

    /// Whether this notebook has never been published
    pub fn is_draft_only(&self) -> bool {
        self.remote_sha.is_none()
    }

    /// Whether both copies would write the same repository file
    pub fn same_revision(&self, other: &Notebook) -> bool {
        self.slug == other.slug && self.to_file_text() == other.to_file_text()
    }
}

fn title_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[ \t]+(.+?)[ \t#]*$").expect("valid title pattern"))
}

/// Turn arbitrary text into a file-safe identifier
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

/// Title from frontmatter, or the first level-one heading
pub fn extract_title(content: &str) -> Option<String> {
    let (meta, body) = split_frontmatter(content);
    if let Some(title) = meta.and_then(|m| m.title) {
        return Some(title);
    }

    let re = title_pattern();
    let mut in_fence = false;
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(cap) = re.captures(line) {
            let title = cap[1].trim().to_string();
            if !title.is_empty() {
                return Some(title);
            }
        }
    }
    None
}

/// Split leading frontmatter from the body
pub fn split_frontmatter(content: &str) -> (Option<NotebookMeta>, &str) {
    let Some(rest) = content.strip_prefix("---") else {
        return (None, content);
    };
    let Some(rest) = rest.strip_prefix('\n').or_else(|| rest.strip_prefix("\r\n")) else {
        return (None, content);
    };
    let (frontmatter, after) = match rest.strip_prefix("---") {
        Some(after) => ("", after),
        None => {
            let Some(end) = rest.find("\n---") else {
                return (None, content);
            };
            (&rest[..end], &rest[end + 4..])
        }
    };
    let body = after
        .strip_prefix("\r\n")
        .or_else(|| after.strip_prefix('\n'))
        .unwrap_or(after)
        .trim_start_matches(['\r', '\n']);

    (Some(parse_meta(frontmatter)), body)
}

fn parse_meta(frontmatter: &str) -> NotebookMeta {
    let mut meta = NotebookMeta::default();
    for line in frontmatter.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "title" => {
                let title = unquote(value);
                if !title.is_empty() {
                    meta.title = Some(title);
                }
            }
            "tags" => {
                meta.tags = value
                    .trim_start_matches('[')
                    .trim_end_matches(']')
                    .split(',')
                    .map(|s| unquote(s.trim()))
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "created" => meta.created = parse_timestamp(value),
            "updated" => meta.updated = parse_timestamp(value),
            _ => {}
        }
    }
    meta
}

/// Double-quote a frontmatter value, escaping `"` and `\\`
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Strip one pair of matching outer quotes. Double-quoted values are unescaped.
fn unquote(value: &str) -> String {
    if let Some(inner) = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
    {
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            match (c, chars.clone().next()) {
                ('\\', Some(next @ ('"' | '\\'))) => {
                    out.push(next);
                    chars.next();
                }
                _ => out.push(c),
            }
        }
        return out;
    }
    value
        .strip_prefix('\'')
        .and_then(|v| v.strip_suffix('\''))
        .unwrap_or(value)
        .to_string()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  --Rust  2024-- "), "rust-2024");
        assert_eq!(slugify("日本語"), "untitled");
        assert_eq!(slugify(""), "untitled");
    }

    #[test]
    fn test_extract_title_prefers_frontmatter() {
        let content = "---\ntitle: \"From Meta\"\n---\n\n# From Heading\n";
        assert_eq!(extract_title(content), Some("From Meta".to_string()));
        assert_eq!(
            extract_title("intro\n\n# Real Title ##\nbody"),
            Some("Real Title".to_string())
        );
        assert_eq!(extract_title("## Only h2\n"), None);
        assert_eq!(extract_title("```\n# not a title\n```\n"), None);
    }

    #[test]
    fn test_parse_frontmatter() {
        let content = r#"---
title: "Test Document"
tags: [rust, markdown]
created: 2024-03-01T10:00:00+00:00
---

# Content here
"#;
        let nb = Notebook::parse("test-document", content);
        assert_eq!(nb.title, "Test Document");
        assert_eq!(nb.tags, vec!["rust", "markdown"]);
        assert_eq!(nb.created.to_rfc3339(), "2024-03-01T10:00:00+00:00");
        assert_eq!(nb.updated, nb.created);
        assert_eq!(nb.content, "# Content here\n");
    }

    #[test]
    fn test_file_text_survives_parse() {
        let mut nb = Notebook::new("Groceries");
        nb.set_tags("home, #errands");
        nb.set_content("# Groceries\n\n- milk\n".to_string());

        let parsed = Notebook::parse(&nb.slug, &nb.to_file_text());
        assert_eq!(parsed.title, "Groceries");
        assert_eq!(parsed.tags, vec!["home", "errands"]);
        assert_eq!(parsed.content, nb.content);
        assert_eq!(parsed.updated.timestamp(), nb.updated.timestamp());
    }

    #[test]
    fn test_set_content_refreshes_title() {
        let mut nb = Notebook::new("Old");
        assert!(nb.set_content("# New Name\n".to_string()));
        assert_eq!(nb.title, "New Name");
        assert_eq!(nb.slug, "old");
        assert!(!nb.set_content("# New Name\n".to_string()));
    }

    #[test]
    fn test_quoted_titles_survive_file_text() {
        for title in ["'Quoted'", "Say \"hi\"", "back\\slash", "It's fine"] {
            let mut nb = Notebook::new("x");
            nb.title = title.to_string();
            let parsed = Notebook::parse(&nb.slug, &nb.to_file_text());
            assert_eq!(parsed.title, title);
        }
    }

    #[test]
    fn test_unquote_strips_one_pair() {
        assert_eq!(unquote("\"\"inner\"\""), "\"inner\"");
        assert_eq!(unquote("'single'"), "single");
        assert_eq!(unquote("'mixed\""), "'mixed\"");
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("plain"), "plain");
    }

    #[test]
    fn test_title_pattern_is_compiled_once() {
        assert!(std::ptr::eq(title_pattern(), title_pattern()));
        assert_eq!(extract_title("# One\n"), Some("One".to_string()));
        assert_eq!(extract_title("# Two #\n"), Some("Two".to_string()));
    }

    #[test]
    fn test_empty_frontmatter_block() {
        let (meta, body) = split_frontmatter("---\n---\nbody\n");
        assert_eq!(meta, Some(NotebookMeta::default()));
        assert_eq!(body, "body\n");
    }

    #[test]
    fn test_same_revision_tracks_file_text() {
        let nb = Notebook::new("Plan");
        let mut edited = nb.clone();
        assert!(nb.same_revision(&edited));
        edited.remote_sha = Some("abc".to_string());
        assert!(nb.same_revision(&edited));
        edited.set_content("# Plan\n\nmore\n".to_string());
        assert!(!nb.same_revision(&edited));
    }

    #[test]
    fn test_body_without_frontmatter_is_untouched() {
        let (meta, body) = split_frontmatter("--- not frontmatter");
        assert!(meta.is_none());
        assert_eq!(body, "--- not frontmatter");
    }
}
