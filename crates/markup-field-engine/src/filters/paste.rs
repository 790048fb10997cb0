//! Cleanup of pasted foreign markup.

use crate::annotation::{
    CLASS_PREFIX, EXTERNAL_ATTR, EXTERNAL_ID_ATTR, TAG_ATTR, URL_ATTR,
};
use crate::dom::{Dom, NON_RENDERING_ELEMENTS, NodeId};

/// Inline elements a paste may keep.
pub const PASTE_ALLOWED: &[&str] = &[
    "a", "abbr", "acronym", "b", "br", "del", "em", "i", "strike", "strong", "sub", "sup", "u",
];

/// Structural wrappers replaced by their children outright.
const WRAPPERS: &[&str] = &["div", "html", "body", "section", "article", "main"];

const KEPT_ATTRS: &[&str] = &[
    "href",
    "title",
    URL_ATTR,
    TAG_ATTR,
    EXTERNAL_ATTR,
    EXTERNAL_ID_ATTR,
];

/// Walks the pasted markup depth-first:
///
/// - non-rendering elements (`script`, `style`, ...) vanish with their content
/// - wrappers such as `div` are replaced by their children
/// - `p` becomes two `<br>` followed by its children
/// - any other element outside [`PASTE_ALLOWED`] becomes its text content
/// - allowed elements keep only link and annotation attributes
pub fn block_level_paste(dom: &mut Dom, root: NodeId) {
    for child in dom.children(root).to_vec() {
        let Some(name) = dom.tag(child).map(str::to_string) else {
            continue;
        };
        if NON_RENDERING_ELEMENTS.contains(&name.as_str()) {
            dom.detach(child);
            continue;
        }

        block_level_paste(dom, child);

        if PASTE_ALLOWED.contains(&name.as_str()) {
            strip_attributes(dom, child);
        } else if WRAPPERS.contains(&name.as_str()) {
            dom.unwrap(child);
        } else if name == "p" {
            let mut nodes = vec![dom.create_element("br"), dom.create_element("br")];
            nodes.extend_from_slice(dom.children(child));
            dom.replace_with_nodes(child, &nodes);
        } else {
            let text = dom.text_content(child);
            if text.is_empty() {
                dom.detach(child);
            } else {
                let t = dom.create_text(&text);
                dom.replace_with(child, t);
            }
        }
    }
}

fn strip_attributes(dom: &mut Dom, el: NodeId) {
    let classes: Vec<String> = dom
        .classes(el)
        .into_iter()
        .filter(|c| c.starts_with(CLASS_PREFIX))
        .map(str::to_string)
        .collect();
    if let Some(e) = dom.element_mut(el) {
        e.attrs.retain(|(k, _)| KEPT_ATTRS.contains(&k.as_str()));
    }
    if !classes.is_empty() {
        dom.set_attr(el, "class", &classes.join(" "));
    }
}

/// `<del>` is edited as `<strike>`.
pub fn inline_level_paste(dom: &mut Dom, root: NodeId) {
    for el in dom.elements_by_tag(root, "del") {
        dom.rename(el, "strike");
    }
}
