//! Lenient HTML fragment parser.
//!
//! Never fails: stray end tags are ignored, unclosed elements are closed at
//! the end of input, comments and doctypes are dropped and a `<` that does
//! not open a tag is kept as text.

use super::cursor::Cursor;
use super::{Dom, NodeId, is_void};

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// Elements a new `<p>` implicitly closes when open directly above it.
const CLOSED_BY_P: &[&str] = &["p"];

/// Parses `html` and appends the resulting nodes to `parent`.
pub fn parse_into(dom: &mut Dom, parent: NodeId, html: &str) {
    let mut cur = Cursor::new(html);
    let mut stack: Vec<NodeId> = vec![parent];

    while !cur.eof() {
        if cur.starts_with(b"<!--") {
            cur.bump_n(4);
            cur.take_until("-->");
            cur.bump_n(3);
        } else if cur.starts_with(b"<!") || cur.starts_with(b"<?") {
            cur.take_until(">");
            cur.bump_n(1);
        } else if cur.starts_with(b"</") && cur.peek_at(2).is_some_and(|b| b.is_ascii_alphabetic())
        {
            cur.bump_n(2);
            let name = cur.take_while(is_name_byte).to_ascii_lowercase();
            cur.take_until(">");
            cur.bump_n(1);
            close_element(dom, &mut stack, &name);
        } else if cur.peek() == Some(b'<') && cur.peek_at(1).is_some_and(|b| b.is_ascii_alphabetic())
        {
            open_element(dom, &mut stack, &mut cur);
        } else {
            let start = cur.i;
            cur.bump_char();
            cur.take_until("<");
            append_text(dom, current(&stack, parent), &cur.s[start..cur.i]);
        }
    }
}

fn current(stack: &[NodeId], fallback: NodeId) -> NodeId {
    stack.last().copied().unwrap_or(fallback)
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b':' || b == b'_'
}

fn is_attr_name_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && b != b'=' && b != b'>' && b != b'/' && b != b'"' && b != b'\''
}

fn append_text(dom: &mut Dom, parent: NodeId, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let decoded = html_escape::decode_html_entities(raw);
    // Adjacent text from separate chunks joins into one node.
    if let Some(last) = dom.last_child(parent)
        && let Some(t) = dom.text_mut(last)
    {
        t.push_str(&decoded);
        return;
    }
    let text = dom.create_text(&decoded);
    dom.append_child(parent, text);
}

fn open_element(dom: &mut Dom, stack: &mut Vec<NodeId>, cur: &mut Cursor<'_>) {
    cur.bump();
    let name = cur.take_while(is_name_byte).to_ascii_lowercase();
    let attrs = parse_attributes(cur);
    let self_closing = cur.starts_with(b"/>");
    cur.take_until(">");
    cur.bump_n(1);

    if name == "p"
        && stack.len() > 1
        && let Some(&top) = stack.last()
        && dom.tag(top).is_some_and(|t| CLOSED_BY_P.contains(&t))
    {
        stack.pop();
    }

    let el = dom.create_element(&name);
    for (k, v) in attrs {
        if !dom.has_attr(el, &k) {
            dom.set_attr(el, &k, &v);
        }
    }
    let parent = stack.last().copied().unwrap_or_else(|| dom.root());
    dom.append_child(parent, el);

    if is_void(&name) || self_closing {
        return;
    }

    if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
        let body = cur.take_until_ignore_case(&format!("</{name}"));
        if !body.is_empty() {
            let text = if name == "textarea" || name == "title" {
                html_escape::decode_html_entities(body).into_owned()
            } else {
                body.to_string()
            };
            let t = dom.create_text(&text);
            dom.append_child(el, t);
        }
        cur.take_until(">");
        cur.bump_n(1);
        return;
    }

    stack.push(el);
}

fn parse_attributes(cur: &mut Cursor<'_>) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    loop {
        cur.skip_whitespace();
        match cur.peek() {
            None | Some(b'>') => break,
            Some(b'/') if cur.starts_with(b"/>") => break,
            Some(b'/') | Some(b'"') | Some(b'\'') | Some(b'=') => {
                cur.bump();
                continue;
            }
            _ => {}
        }

        let name = cur.take_while(is_attr_name_byte).to_ascii_lowercase();
        cur.skip_whitespace();
        let value = if cur.peek() == Some(b'=') {
            cur.bump();
            cur.skip_whitespace();
            match cur.peek() {
                Some(q @ (b'"' | b'\'')) => {
                    cur.bump();
                    let quote = if q == b'"' { "\"" } else { "'" };
                    let raw = cur.take_until(quote);
                    cur.bump();
                    raw
                }
                _ => cur.take_while(|b| !b.is_ascii_whitespace() && b != b'>'),
            }
        } else {
            ""
        };

        if !name.is_empty() {
            attrs.push((name, html_escape::decode_html_entities(value).into_owned()));
        }
    }
    attrs
}

fn close_element(dom: &Dom, stack: &mut Vec<NodeId>, name: &str) {
    // The bottom of the stack is the fragment parent and is never closed.
    let found = stack
        .iter()
        .enumerate()
        .skip(1)
        .rev()
        .find(|&(_, &n)| dom.tag(n) == Some(name))
        .map(|(i, _)| i);
    if let Some(i) = found {
        stack.truncate(i);
    }
}
