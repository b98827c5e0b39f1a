//! Inline span parsing for preview rendering

use super::math::{find_display_close, find_inline_close};

/// Inline elements of a block's text
#[derive(Debug, Clone, PartialEq)]
pub enum InlineSpan {
    Text(String),
    WikiLink { target: String, display: Option<String> },
    Code(String),
    Math(String),
    Bold(String),
    Italic(String),
    Strike(String),
    Highlight(String),
    Link { text: String, url: String },
}

/// Parse inline elements from text
pub fn parse_inline(text: &str) -> Vec<InlineSpan> {
    let mut spans = Vec::new();
    let mut current_text = String::new();
    let chars: Vec<char> = text.chars().collect();
    // Byte offset of every char, plus the end of the text
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_at = |byte: usize| offsets.partition_point(|&b| b < byte);
    let mut i = 0;

    let flush = |spans: &mut Vec<InlineSpan>, current: &mut String| {
        if !current.is_empty() {
            spans.push(InlineSpan::Text(std::mem::take(current)));
        }
    };

    while i < chars.len() {
        // Wiki link [[target|display]]
        if starts_with(&chars, i, "[[") {
            if let Some(end) = find(&chars, i + 2, "]]") {
                flush(&mut spans, &mut current_text);
                let inner: String = chars[i + 2..end].iter().collect();
                let (target, display) = match inner.split_once('|') {
                    Some((t, d)) => (t.trim().to_string(), Some(d.trim().to_string())),
                    None => (inner.trim().to_string(), None),
                };
                spans.push(InlineSpan::WikiLink { target, display });
                i = end + 2;
                continue;
            }
        }

        // Inline code `...`
        if chars[i] == '`' {
            if let Some(end) = find(&chars, i + 1, "`") {
                flush(&mut spans, &mut current_text);
                spans.push(InlineSpan::Code(chars[i + 1..end].iter().collect()));
                i = end + 1;
                continue;
            }
        }

        // Escaped dollar
        if chars[i] == '\\' && chars.get(i + 1) == Some(&'$') {
            current_text.push('$');
            i += 2;
            continue;
        }

        // Math $$...$$ or $...$, delimited the same way as the HTML export
        if chars[i] == '$' {
            let from = offsets[i];
            if starts_with(&chars, i, "$$") {
                match find_display_close(text, from + 2) {
                    Some(close) => {
                        flush(&mut spans, &mut current_text);
                        spans.push(InlineSpan::Math(text[from + 2..close].trim().to_string()));
                        i = char_at(close + 2);
                    }
                    None => {
                        current_text.push_str("$$");
                        i += 2;
                    }
                }
                continue;
            }
            if let Some(close) = find_inline_close(text, from + 1) {
                flush(&mut spans, &mut current_text);
                spans.push(InlineSpan::Math(text[from + 1..close].to_string()));
                i = char_at(close + 1);
                continue;
            }
        }

        // Markdown link [text](url)
        if chars[i] == '[' {
            if let Some(mid) = find(&chars, i + 1, "](") {
                if let Some(end) = find(&chars, mid + 2, ")") {
                    flush(&mut spans, &mut current_text);
                    spans.push(InlineSpan::Link {
                        text: chars[i + 1..mid].iter().collect(),
                        url: chars[mid + 2..end].iter().collect(),
                    });
                    i = end + 1;
                    continue;
                }
            }
        }

        let delimited: [(&str, fn(String) -> InlineSpan); 4] = [
            ("**", InlineSpan::Bold),
            ("~~", InlineSpan::Strike),
            ("==", InlineSpan::Highlight),
            ("*", InlineSpan::Italic),
        ];
        let mut matched = false;
        for (marker, make) in delimited {
            if !starts_with(&chars, i, marker) {
                continue;
            }
            let start = i + marker.chars().count();
            if let Some(end) = find(&chars, start, marker).filter(|&end| end > start) {
                flush(&mut spans, &mut current_text);
                spans.push(make(chars[start..end].iter().collect()));
                i = end + marker.chars().count();
                matched = true;
            }
            break;
        }
        if matched {
            continue;
        }

        current_text.push(chars[i]);
        i += 1;
    }

    flush(&mut spans, &mut current_text);
    spans
}

fn starts_with(chars: &[char], at: usize, pat: &str) -> bool {
    let mut idx = at;
    for p in pat.chars() {
        if chars.get(idx) != Some(&p) {
            return false;
        }
        idx += 1;
    }
    true
}

fn find(chars: &[char], from: usize, pat: &str) -> Option<usize> {
    (from..chars.len()).find(|&j| starts_with(chars, j, pat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_mixed_spans() {
        let spans = parse_inline("a **b** *c* `d` $e^2$ ==f== ~~g~~ [h](i) [[J|k]]");
        assert_eq!(
            spans,
            vec![
                InlineSpan::Text("a ".into()),
                InlineSpan::Bold("b".into()),
                InlineSpan::Text(" ".into()),
                InlineSpan::Italic("c".into()),
                InlineSpan::Text(" ".into()),
                InlineSpan::Code("d".into()),
                InlineSpan::Text(" ".into()),
                InlineSpan::Math("e^2".into()),
                InlineSpan::Text(" ".into()),
                InlineSpan::Highlight("f".into()),
                InlineSpan::Text(" ".into()),
                InlineSpan::Strike("g".into()),
                InlineSpan::Text(" ".into()),
                InlineSpan::Link {
                    text: "h".into(),
                    url: "i".into()
                },
                InlineSpan::Text(" ".into()),
                InlineSpan::WikiLink {
                    target: "J".into(),
                    display: Some("k".into())
                },
            ]
        );
    }

    #[test]
    fn test_unclosed_markers_stay_text() {
        assert_eq!(
            parse_inline("5 * 3 and `open"),
            vec![InlineSpan::Text("5 * 3 and `open".into())]
        );
    }

    #[test]
    fn test_prices_and_escapes_are_not_math() {
        assert_eq!(
            parse_inline("costs $5 and $10, or \\$x\\$"),
            vec![InlineSpan::Text("costs $5 and $10, or $x$".into())]
        );
        assert_eq!(
            parse_inline("$ spaced $ and $x$"),
            vec![
                InlineSpan::Text("$ spaced $ and ".into()),
                InlineSpan::Math("x".into()),
            ]
        );
    }

    #[test]
    fn test_display_math_inside_text() {
        assert_eq!(
            parse_inline("é $$ \\sum_i x_i $$ done"),
            vec![
                InlineSpan::Text("é ".into()),
                InlineSpan::Math("\\sum_i x_i".into()),
                InlineSpan::Text(" done".into()),
            ]
        );
    }

    #[test]
    fn test_math_keeps_underscores() {
        assert_eq!(
            parse_inline("$a_1 * b_2$"),
            vec![InlineSpan::Math("a_1 * b_2".into())]
        );
    }
}
