//! Output normalization.
//!
//! [`correct_markup`] repeats a set of structural passes until the markup
//! stops changing, which makes it idempotent by construction:
//!
//! 1. unwrap attribute-less `<div>` wrappers
//! 2. strip `<br>` markers at the very end of the content, also inside
//!    trailing closing tags
//! 3. drop empty elements; whitespace-only elements become one space
//! 4. merge adjacent identical elements (`</i><i>`)
//! 5. normalize text: `&nbsp;` and whitespace runs become one space
//! 6. trim leading and trailing whitespace of the content

use crate::dom::{Dom, NodeId, is_void};

const MAX_ROUNDS: usize = 32;

pub fn correct_markup(dom: &mut Dom, root: NodeId) {
    let mut before = dom.inner_html(root);
    for _ in 0..MAX_ROUNDS {
        unwrap_plain_divs(dom, root);
        strip_trailing_breaks(dom, root);
        drop_empty_elements(dom, root);
        merge_adjacent_twins(dom, root);
        normalize_text(dom, root);
        trim_edges(dom, root);

        let after = dom.inner_html(root);
        if after == before {
            return;
        }
        before = after;
    }
    log::warn!("correct_markup did not settle after {MAX_ROUNDS} rounds");
}

fn is_blank_text(dom: &Dom, node: NodeId) -> bool {
    dom.text(node).is_some_and(|t| t.trim().is_empty())
}

fn unwrap_plain_divs(dom: &mut Dom, root: NodeId) {
    for el in dom.elements_by_tag(root, "div") {
        if dom.element(el).is_some_and(|e| e.attrs.is_empty()) {
            dom.unwrap(el);
        }
    }
}

/// The last non-blank node of the content, descending into trailing elements.
fn last_meaningful(dom: &Dom, root: NodeId) -> Option<NodeId> {
    let mut node = root;
    loop {
        let child = dom
            .children(node)
            .iter()
            .rev()
            .copied()
            .find(|&c| !is_blank_text(dom, c))?;
        let descend = dom
            .tag(child)
            .is_some_and(|t| !is_void(t))
            && dom.children(child).iter().any(|&c| !is_blank_text(dom, c));
        if !descend {
            return Some(child);
        }
        node = child;
    }
}

fn strip_trailing_breaks(dom: &mut Dom, root: NodeId) {
    while let Some(last) = last_meaningful(dom, root)
        && dom.is_tag(last, "br")
    {
        dom.detach(last);
    }
}

fn drop_empty_elements(dom: &mut Dom, node: NodeId) {
    for child in dom.children(node).to_vec() {
        if dom.is_text(child) {
            continue;
        }
        drop_empty_elements(dom, child);

        let Some(name) = dom.tag(child) else { continue };
        if is_void(name) {
            continue;
        }
        let children = dom.children(child);
        if children.is_empty() {
            dom.detach(child);
        } else if children.iter().all(|&c| is_blank_text(dom, c)) {
            let space = dom.create_text(" ");
            dom.replace_with(child, space);
        }
    }
}

fn is_twin(dom: &Dom, a: NodeId, b: NodeId) -> bool {
    match (dom.element(a), dom.element(b)) {
        (Some(x), Some(y)) => x.name == y.name && !is_void(&x.name) && x.same_attrs(y),
        _ => false,
    }
}

fn merge_adjacent_twins(dom: &mut Dom, node: NodeId) {
    let mut i = 0;
    while let (Some(a), Some(b)) = (dom.child(node, i), dom.child(node, i + 1)) {
        if is_twin(dom, a, b) {
            dom.move_children(b, a);
            dom.detach(b);
        } else {
            i += 1;
        }
    }
    for child in dom.children(node).to_vec() {
        if !dom.is_text(child) {
            merge_adjacent_twins(dom, child);
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        // U+00A0 counts as whitespace here.
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn normalize_text(dom: &mut Dom, node: NodeId) {
    let mut i = 0;
    while let (Some(a), Some(b)) = (dom.child(node, i), dom.child(node, i + 1)) {
        if dom.is_text(a) && dom.is_text(b) {
            let tail = dom.text(b).unwrap_or_default().to_string();
            if let Some(t) = dom.text_mut(a) {
                t.push_str(&tail);
            }
            dom.detach(b);
        } else {
            i += 1;
        }
    }

    for child in dom.children(node).to_vec() {
        match dom.text(child).map(collapse_whitespace) {
            Some(collapsed) if collapsed.is_empty() => dom.detach(child),
            Some(collapsed) => {
                if let Some(t) = dom.text_mut(child) {
                    *t = collapsed;
                }
            }
            None => normalize_text(dom, child),
        }
    }
}

fn trim_edges(dom: &mut Dom, root: NodeId) {
    if let Some(first) = dom.first_child(root)
        && let Some(t) = dom.text_mut(first)
    {
        *t = t.trim_start().to_string();
        if t.is_empty() {
            dom.detach(first);
        }
    }
    if let Some(last) = dom.last_child(root)
        && let Some(t) = dom.text_mut(last)
    {
        *t = t.trim_end().to_string();
        if t.is_empty() {
            dom.detach(last);
        }
    }
}
