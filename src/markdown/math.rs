//! TeX math protection
//!
//! Math is cut out of the source before markdown parsing so that `_`, `*`
//! and `\` inside formulas are not read as emphasis or escapes. Each formula
//! is replaced by an opaque placeholder made of private-use characters, which
//! the markdown parser passes through untouched.

const OPEN: char = '\u{E000}';
const CLOSE: char = '\u{E001}';

/// A formula cut out of the source
#[derive(Debug, Clone, PartialEq)]
pub struct MathSpan {
    pub tex: String,
    /// `$$...$$` rather than `$...$`
    pub display: bool,
    /// Byte offset of the placeholder in the protected text
    protected_start: usize,
    protected_len: usize,
    /// Byte length of the original `$...$` source
    source_len: usize,
}

/// Source text with math replaced by placeholders
#[derive(Debug, Clone, Default)]
pub struct Protected {
    pub text: String,
    pub spans: Vec<MathSpan>,
}

pub fn placeholder(index: usize) -> String {
    format!("{}{}{}", OPEN, index, CLOSE)
}

impl Protected {
    /// Map a byte offset in the protected text back to the original source
    pub fn source_offset(&self, pos: usize) -> usize {
        let mut shift: isize = 0;
        for span in &self.spans {
            let end = span.protected_start + span.protected_len;
            if pos < span.protected_start {
                break;
            }
            if pos < end {
                return (span.protected_start as isize + shift) as usize;
            }
            shift += span.source_len as isize - span.protected_len as isize;
        }
        (pos as isize + shift) as usize
    }

    /// Replace placeholders in `text` with `$tex$` / `$$tex$$`
    pub fn expand(&self, text: &str) -> String {
        self.replace_with(text, |span| {
            if span.display {
                format!("$${}$$", span.tex)
            } else {
                format!("${}$", span.tex)
            }
        })
    }

    /// The display formula when `text` consists of nothing else
    pub fn sole_display(&self, text: &str) -> Option<&MathSpan> {
        let inner = text.trim().strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
        let span = self.spans.get(inner.parse::<usize>().ok()?)?;
        span.display.then_some(span)
    }

    fn replace_with(&self, text: &str, render: impl Fn(&MathSpan) -> String) -> String {
        if !text.contains(OPEN) {
            return text.to_string();
        }
        let mut out = String::with_capacity(text.len());
        let mut rest = text;
        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after = &rest[start + OPEN.len_utf8()..];
            let span = after.find(CLOSE).and_then(|end| {
                let idx = after[..end].parse::<usize>().ok()?;
                Some((self.spans.get(idx)?, end))
            });
            match span {
                Some((span, end)) => {
                    out.push_str(&render(span));
                    rest = &after[end + CLOSE.len_utf8()..];
                }
                None => {
                    out.push(OPEN);
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

/// Cut `$...$` and `$$...$$` formulas out of markdown source.
///
/// Fenced code blocks and inline code spans are left alone, as is `\$`.
/// Inline math must be non-empty, stay on one line, must not start or end
/// with whitespace, and the closing `$` must not be followed by a digit
/// (so "$5 and $10" stays text).
pub fn protect_math(source: &str) -> Protected {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut spans: Vec<MathSpan> = Vec::new();
    let mut fence: Option<String> = None;
    let mut line_start = true;
    let mut i = 0;

    while i < bytes.len() {
        if line_start {
            let line_end = source[i..].find('\n').map(|n| i + n + 1).unwrap_or(source.len());
            let line = &source[i..line_end];
            let trimmed = line.trim_start();
            if let Some(marker) = fence_marker(trimmed) {
                match &fence {
                    None => fence = Some(marker),
                    Some(open) if trimmed.trim_end().starts_with(open.as_str()) && marker.len() >= open.len() => {
                        fence = None
                    }
                    Some(_) => {}
                }
                out.push_str(line);
                i = line_end;
                continue;
            }
            if fence.is_some() {
                out.push_str(line);
                i = line_end;
                continue;
            }
            line_start = false;
        }

        match bytes[i] {
            b'\n' => {
                out.push('\n');
                i += 1;
                line_start = true;
            }
            b'\\' if bytes.get(i + 1) == Some(&b'$') => {
                out.push_str("\\$");
                i += 2;
            }
            b'`' => {
                let run = bytes[i..].iter().take_while(|&&b| b == b'`').count();
                let end = find_closing_backticks(source, i + run, run).unwrap_or(i + run);
                out.push_str(&source[i..end]);
                i = end;
            }
            b'$' if bytes.get(i + 1) == Some(&b'$') => {
                match find_display_close(source, i + 2) {
                    Some(close) => {
                        let tex = source[i + 2..close].trim();
                        push_math(&mut out, &mut spans, tex, true, close + 2 - i);
                        i = close + 2;
                    }
                    _ => {
                        out.push_str("$$");
                        i += 2;
                    }
                }
            }
            b'$' => match find_inline_close(source, i + 1) {
                Some(close) => {
                    push_math(&mut out, &mut spans, &source[i + 1..close], false, close + 1 - i);
                    i = close + 1;
                }
                None => {
                    out.push('$');
                    i += 1;
                }
            },
            _ => {
                let c = source[i..].chars().next().unwrap_or(' ');
                out.push(c);
                i += c.len_utf8();
            }
        }
    }

    Protected { text: out, spans }
}

fn push_math(out: &mut String, spans: &mut Vec<MathSpan>, tex: &str, display: bool, source_len: usize) {
    let marker = placeholder(spans.len());
    spans.push(MathSpan {
        tex: tex.to_string(),
        display,
        protected_start: out.len(),
        protected_len: marker.len(),
        source_len,
    });
    out.push_str(&marker);
}

/// Put formulas back as HTML for a math renderer to typeset
pub fn restore_math(html: &str, protected: &Protected) -> String {
    let mut html = html.to_string();
    for (idx, span) in protected.spans.iter().enumerate().filter(|(_, s)| s.display) {
        let marker = placeholder(idx);
        html = html.replace(
            &format!("<p>{}</p>", marker),
            &display_html(&span.tex),
        );
    }
    protected.replace_with(&html, |span| {
        if span.display {
            display_html(&span.tex)
        } else {
            format!(
                "<span class=\"math inline\">\\({}\\)</span>",
                escape_html(&span.tex)
            )
        }
    })
}

fn display_html(tex: &str) -> String {
    format!("<div class=\"math display\">\\[{}\\]</div>", escape_html(tex))
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn fence_marker(line: &str) -> Option<String> {
    let c = line.chars().next()?;
    if c != '`' && c != '~' {
        return None;
    }
    let run = line.chars().take_while(|&x| x == c).count();
    (run >= 3).then(|| std::iter::repeat(c).take(run).collect())
}

fn find_closing_backticks(source: &str, from: usize, run: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] == b'`' {
            let len = bytes[j..].iter().take_while(|&&b| b == b'`').count();
            if len == run {
                return Some(j + len);
            }
            j += len;
        } else {
            j += 1;
        }
    }
    None
}

/// Byte offset of the `$$` closing display math opened just before `from`
pub(crate) fn find_display_close(source: &str, from: usize) -> Option<usize> {
    source[from..]
        .find("$$")
        .map(|n| from + n)
        .filter(|&close| !source[from..close].trim().is_empty())
}

/// Byte offset of the `$` closing inline math opened just before `from`.
/// The TeX must be non-empty on one line, without outer whitespace, and the
/// closing `$` must not be followed by a digit.
pub(crate) fn find_inline_close(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut j = from;
    while j < bytes.len() {
        match bytes[j] {
            b'\n' => return None,
            b'\\' => j += 2,
            b'$' => {
                let tex = &source[from..j];
                let valid = !tex.is_empty()
                    && !tex.starts_with(char::is_whitespace)
                    && !tex.ends_with(char::is_whitespace)
                    && !bytes.get(j + 1).is_some_and(|b| b.is_ascii_digit());
                return valid.then_some(j);
            }
            _ => j += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inline_and_display_math_are_cut_out() {
        let p = protect_math("Area $a_1 * b_2$ and\n\n$$\n\\sum_i x_i\n$$\n");
        assert_eq!(p.spans.len(), 2);
        assert_eq!(p.spans[0].tex, "a_1 * b_2");
        assert!(!p.spans[0].display);
        assert_eq!(p.spans[1].tex, "\\sum_i x_i");
        assert!(p.spans[1].display);
        assert!(!p.text.contains('$'));
        assert_eq!(p.expand(&p.text), "Area $a_1 * b_2$ and\n\n$$\\sum_i x_i$$\n");
    }

    #[test]
    fn test_prices_and_escapes_are_not_math() {
        let src = "costs $5 and $10, or \\$x\\$, or $ spaced $";
        let p = protect_math(src);
        assert!(p.spans.is_empty());
        assert_eq!(p.text, src);
    }

    #[test]
    fn test_code_is_left_alone() {
        let src = "`$x$` then\n```\n$$y$$\n```\n$z$";
        let p = protect_math(src);
        assert_eq!(p.spans.len(), 1);
        assert_eq!(p.spans[0].tex, "z");
        assert!(p.text.starts_with("`$x$` then\n```\n$$y$$\n```\n"));
    }

    #[test]
    fn test_source_offsets_skip_placeholders() {
        let src = "a $xy$ b";
        let p = protect_math(src);
        let b_pos = p.text.find('b').unwrap();
        assert_eq!(p.source_offset(b_pos), src.find('b').unwrap());
        assert_eq!(p.source_offset(0), 0);
        assert_eq!(p.source_offset(3), 2);
    }

    #[test]
    fn test_restore_unwraps_display_paragraphs() {
        let p = protect_math("$$x<y$$");
        let html = format!("<p>{}</p>\n", placeholder(0));
        assert_eq!(
            restore_math(&html, &p),
            "<div class=\"math display\">\\[x&lt;y\\]</div>\n"
        );
    }
}
