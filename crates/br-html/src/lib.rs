//! Tolerant HTML tokenization and fragment parsing into the DOM arena.

use br_dom::Dom;
use br_dom::NodeId;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parses `input` and appends the resulting nodes as children of `parent`.
///
/// The tokenizer is forgiving: comments, doctypes, and processing
/// instructions are skipped, unknown end tags are dropped, and mis-nested end
/// tags pop to the nearest matching open element. Fragment markup is opaque
/// to callers, so parsing never fails; malformed input degrades to text.
pub fn parse_fragment(dom: &mut Dom, parent: NodeId, input: &str) {
    let mut open: Vec<NodeId> = vec![parent];

    for token in tokenize(input) {
        match token {
            Token::Text(text) => {
                if text.trim().is_empty() {
                    continue;
                }
                let node = dom.create_text(&decode_entities(&text));
                append_ignoring_errors(dom, &open, node);
            }
            Token::Start {
                name,
                attrs,
                self_closing,
            } => {
                let node = dom.create_element(&name);
                for (attr_name, attr_value) in attrs {
                    let _ = dom.set_attr(node, &attr_name, &decode_entities(&attr_value));
                }
                append_ignoring_errors(dom, &open, node);

                if !self_closing && !is_void_element(&name) {
                    open.push(node);
                }
            }
            Token::End { name } => {
                let Some(depth) = open
                    .iter()
                    .rposition(|candidate| dom.tag(*candidate) == Some(name.as_str()))
                else {
                    continue;
                };
                // Never pop the fragment root itself.
                if depth == 0 {
                    continue;
                }
                open.truncate(depth);
            }
        }
    }
}

/// Parses a full document under the arena root.
pub fn parse_document(dom: &mut Dom, input: &str) {
    let root = dom.root();
    parse_fragment(dom, root, input);
}

fn append_ignoring_errors(dom: &mut Dom, open: &[NodeId], node: NodeId) {
    if let Some(parent) = open.last() {
        let _ = dom.append_child(*parent, node);
    }
}

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text(String),
}

fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut idx = 0_usize;

    while idx < bytes.len() {
        if bytes[idx] != b'<' {
            let next = find_byte(bytes, idx, b'<').unwrap_or(bytes.len());
            tokens.push(Token::Text(input[idx..next].to_owned()));
            idx = next;
            continue;
        }

        if starts_with(bytes, idx, b"<!--") {
            idx = skip_comment(bytes, idx);
            continue;
        }

        if starts_with(bytes, idx, b"<!") {
            idx = skip_to_gt(bytes, idx.saturating_add(2));
            continue;
        }

        if starts_with(bytes, idx, b"<?") {
            idx = skip_to_gt(bytes, idx.saturating_add(2));
            continue;
        }

        let Some((token, next_idx)) = lex_tag(input, idx) else {
            // A stray `<` that opens no tag becomes text.
            tokens.push(Token::Text("<".to_owned()));
            idx = idx.saturating_add(1);
            continue;
        };

        // script/style bodies are raw text up to the matching end tag.
        if let Token::Start {
            name,
            self_closing: false,
            ..
        } = &token
        {
            if name == "script" || name == "style" {
                let close = format!("</{name}");
                let body_end =
                    find_ignore_ascii_case(input, next_idx, &close).unwrap_or(input.len());
                let end_name = name.clone();
                tokens.push(token);
                if body_end > next_idx {
                    tokens.push(Token::Text(input[next_idx..body_end].to_owned()));
                }
                tokens.push(Token::End { name: end_name });
                idx = skip_to_gt(bytes, body_end);
                continue;
            }
        }

        tokens.push(token);
        idx = next_idx;
    }

    tokens
}

fn lex_tag(input: &str, start: usize) -> Option<(Token, usize)> {
    let bytes = input.as_bytes();
    let mut idx = start.saturating_add(1);

    let is_end = bytes.get(idx).copied() == Some(b'/');
    if is_end {
        idx = idx.saturating_add(1);
    }

    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == name_start {
        return None;
    }
    let name = input[name_start..idx].to_ascii_lowercase();

    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => {
                idx = idx.saturating_add(1);
                break;
            }
            Some(b'/') => {
                self_closing = true;
                idx = idx.saturating_add(1);
            }
            Some(_) => {
                let (attr, after) = lex_attribute(input, idx)?;
                if !attr.0.is_empty() {
                    attrs.push(attr);
                }
                idx = after;
            }
        }
    }

    let token = if is_end {
        Token::End { name }
    } else {
        Token::Start {
            name,
            attrs,
            self_closing,
        }
    };
    Some((token, idx))
}

fn lex_attribute(input: &str, start: usize) -> Option<((String, String), usize)> {
    let bytes = input.as_bytes();
    let mut idx = start;

    let name_start = idx;
    while idx < bytes.len() && is_attr_name_char(bytes[idx]) {
        idx = idx.saturating_add(1);
    }
    if idx == name_start {
        // Unexpected byte; consume it so the tag lexer makes progress.
        return Some(((String::new(), String::new()), idx.saturating_add(1)));
    }
    let name = input[name_start..idx].to_ascii_lowercase();

    idx = skip_spaces(bytes, idx);
    if bytes.get(idx).copied() != Some(b'=') {
        // Boolean attribute.
        return Some(((name, String::new()), idx));
    }
    idx = skip_spaces(bytes, idx.saturating_add(1));

    match bytes.get(idx).copied() {
        Some(quote @ (b'"' | b'\'')) => {
            let value_start = idx.saturating_add(1);
            let value_end = find_byte(bytes, value_start, quote)?;
            let value = input[value_start..value_end].to_owned();
            Some(((name, value), value_end.saturating_add(1)))
        }
        Some(_) => {
            let value_start = idx;
            while idx < bytes.len() && !bytes[idx].is_ascii_whitespace() && bytes[idx] != b'>' {
                idx = idx.saturating_add(1);
            }
            Some(((name, input[value_start..idx].to_owned()), idx))
        }
        None => None,
    }
}

fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_owned();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        let replaced = [
            ("&amp;", "&"),
            ("&lt;", "<"),
            ("&gt;", ">"),
            ("&quot;", "\""),
            ("&#39;", "'"),
        ]
        .iter()
        .find(|(entity, _)| rest.starts_with(entity));

        match replaced {
            Some((entity, literal)) => {
                out.push_str(literal);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':')
}

fn is_attr_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b':' | b'.')
}

fn skip_comment(bytes: &[u8], start: usize) -> usize {
    find_subslice(bytes, start.saturating_add(4), b"-->")
        .map(|end| end.saturating_add(3))
        .unwrap_or(bytes.len())
}

fn skip_to_gt(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() {
        if bytes[idx] == b'>' {
            return idx.saturating_add(1);
        }
        idx = idx.saturating_add(1);
    }
    bytes.len()
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx = idx.saturating_add(1);
    }
    idx
}

fn starts_with(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    let end = idx.saturating_add(pattern.len());
    end <= bytes.len() && bytes[idx..end] == *pattern
}

fn find_byte(bytes: &[u8], from: usize, byte: u8) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .iter()
        .position(|candidate| *candidate == byte)
        .map(|offset| from + offset)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

fn find_ignore_ascii_case(input: &str, from: usize, needle: &str) -> Option<usize> {
    let haystack = input.as_bytes();
    let needle = needle.as_bytes();
    if from >= haystack.len() || needle.is_empty() {
        return None;
    }

    haystack[from..]
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|offset| from + offset)
}
