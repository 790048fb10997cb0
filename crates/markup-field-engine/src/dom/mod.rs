//! An owned HTML document model.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Detached nodes
//! stay in the arena until the document is dropped, so a `NodeId` never
//! dangles; it may only stop being reachable from the root.
//!
//! ## Modules
//!
//! - [`cursor`]: byte cursor used by the fragment parser
//! - [`parse`]: lenient HTML fragment parser
//! - [`serialize`]: markup output
//! - [`range`]: positions, ranges and range-based mutation
//! - [`style`]: inline `style` attribute access

pub mod cursor;
pub mod parse;
pub mod range;
pub mod serialize;
pub mod style;

pub use range::{Position, Range};

/// Elements that never have children or end tags.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is never rendered as text.
pub const NON_RENDERING_ELEMENTS: &[&str] =
    &["head", "script", "style", "title", "meta", "link", "template", "noscript"];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_ascii_lowercase(),
            attrs: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Compares attributes ignoring their order.
    pub fn same_attrs(&self, other: &Element) -> bool {
        self.attrs.len() == other.attrs.len()
            && self
                .attrs
                .iter()
                .all(|(k, v)| other.attr(k) == Some(v.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// An HTML document or fragment with at most one selection.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    /// The document selection. A page has exactly one, shared by every
    /// editable region it contains.
    pub selection: Option<Range>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                data: NodeData::Element(Element::new("#document")),
            }],
            root: NodeId(0),
            selection: None,
        }
    }

    /// Parses `html` into the children of a fresh document root.
    pub fn parse(html: &str) -> Self {
        let mut dom = Self::new();
        let root = dom.root();
        parse::parse_into(&mut dom, root, html);
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(NodeData::Element(Element::new(name)))
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.push(NodeData::Text(text.to_string()))
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        self.nodes.push(Node {
            parent: None,
            children: Vec::new(),
            data,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0].data
    }

    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match &self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[id.0].data {
            NodeData::Element(el) => Some(el),
            NodeData::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match &mut self.nodes[id.0].data {
            NodeData::Text(t) => Some(t),
            NodeData::Element(_) => None,
        }
    }

    pub fn is_text(&self, id: NodeId) -> bool {
        matches!(self.nodes[id.0].data, NodeData::Text(_))
    }

    /// Element name, or `None` for text nodes.
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.name.as_str())
    }

    pub fn is_tag(&self, id: NodeId, name: &str) -> bool {
        self.tag(id) == Some(name)
    }

    pub fn rename(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.name = name.to_ascii_lowercase();
        }
    }

    // Tree navigation

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[id.0].children.get(index).copied()
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).first().copied()
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.children(id).last().copied()
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        index.checked_sub(1).and_then(|i| self.child(parent, i))
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.child(parent, index + 1)
    }

    /// Ancestors from the parent upwards.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            out.push(p);
            cur = self.parent(p);
        }
        out
    }

    /// True when `node` is `ancestor` or lies below it.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).contains(&ancestor)
    }

    /// True when the node is reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.contains(self.root, id)
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    pub fn elements_by_tag(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&n| self.is_tag(n, name))
            .collect()
    }

    /// Finds the attached element whose `id` attribute equals `id_attr`.
    pub fn element_by_id(&self, id_attr: &str) -> Option<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .find(|&n| self.attr(n, "id") == Some(id_attr))
    }

    /// Nearest inclusive ancestor of `node`, not above `limit`, matching `pred`.
    pub fn closest(
        &self,
        node: NodeId,
        limit: NodeId,
        pred: impl Fn(&Dom, NodeId) -> bool,
    ) -> Option<NodeId> {
        let mut cur = Some(node);
        while let Some(n) = cur {
            if pred(self, n) {
                return Some(n);
            }
            if n == limit {
                return None;
            }
            cur = self.parent(n);
        }
        None
    }

    // Mutation

    /// Removes `id` from its parent. The node and its subtree stay usable.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
        }
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let index = index.min(self.nodes[parent.0].children.len());
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
    }

    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        {
            self.insert_child(parent, index, node);
        }
    }

    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if let (Some(parent), Some(index)) = (self.parent(reference), self.index_in_parent(reference))
        {
            self.insert_child(parent, index + 1, node);
        }
    }

    /// Puts `nodes` where `old` was and detaches `old`.
    pub fn replace_with_nodes(&mut self, old: NodeId, nodes: &[NodeId]) {
        let (Some(parent), Some(index)) = (self.parent(old), self.index_in_parent(old)) else {
            return;
        };
        self.detach(old);
        for (offset, &n) in nodes.iter().enumerate() {
            self.insert_child(parent, index + offset, n);
        }
    }

    pub fn replace_with(&mut self, old: NodeId, new: NodeId) {
        self.replace_with_nodes(old, &[new]);
    }

    /// Replaces an element by its own children.
    pub fn unwrap(&mut self, id: NodeId) {
        let children = self.children(id).to_vec();
        self.replace_with_nodes(id, &children);
    }

    /// Moves every child of `from` to the end of `to`.
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        for child in self.children(from).to_vec() {
            self.append_child(to, child);
        }
    }

    pub fn remove_children(&mut self, id: NodeId) {
        for child in self.children(id).to_vec() {
            self.detach(child);
        }
    }

    // Attributes

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        if let Some(el) = self.element_mut(id) {
            match el.attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => el.attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        if let Some(el) = self.element_mut(id) {
            el.attrs.retain(|(k, _)| k != name);
        }
    }

    pub fn classes(&self, id: NodeId) -> Vec<&str> {
        self.attr(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).contains(&class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) {
            return;
        }
        let mut classes: Vec<String> = self.classes(id).iter().map(|c| c.to_string()).collect();
        classes.push(class.to_string());
        self.set_attr(id, "class", &classes.join(" "));
    }

    /// Removes classes matching `pred`; drops the attribute when none remain.
    pub fn remove_classes(&mut self, id: NodeId, pred: impl Fn(&str) -> bool) {
        if !self.has_attr(id, "class") {
            return;
        }
        let kept: Vec<String> = self
            .classes(id)
            .into_iter()
            .filter(|c| !pred(c))
            .map(str::to_string)
            .collect();
        if kept.is_empty() {
            self.remove_attr(id, "class");
        } else {
            self.set_attr(id, "class", &kept.join(" "));
        }
    }

    // Content

    pub fn text_content(&self, id: NodeId) -> String {
        if let Some(t) = self.text(id) {
            return t.to_string();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|n| self.text(n))
            .collect()
    }

    /// Characters in a text node, or the child count of an element.
    pub fn node_len(&self, id: NodeId) -> usize {
        match &self.nodes[id.0].data {
            NodeData::Text(t) => t.chars().count(),
            NodeData::Element(_) => self.nodes[id.0].children.len(),
        }
    }

    /// Replaces the children of `id` with the parsed fragment.
    pub fn set_inner_html(&mut self, id: NodeId, html: &str) {
        self.remove_children(id);
        parse::parse_into(self, id, html);
    }

    /// Copies the subtree at `src` of `other` into this document, detached.
    pub fn import(&mut self, other: &Dom, src: NodeId) -> NodeId {
        let copy = self.push(other.data(src).clone());
        for &child in other.children(src) {
            let c = self.import(other, child);
            self.append_child(copy, c);
        }
        copy
    }

    /// Copies the subtree at `id` within this document, detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let data = self.data(id).clone();
        let copy = self.push(data);
        for child in self.children(id).to_vec() {
            let c = self.clone_subtree(child);
            self.append_child(copy, c);
        }
        copy
    }

    /// Creates a detached shallow copy of an element: same name and attributes.
    pub fn clone_shallow(&mut self, id: NodeId) -> NodeId {
        let data = self.data(id).clone();
        self.push(data)
    }
}

/// Byte index of the `char_offset`-th character of `s`, clamped to its end.
pub(crate) fn byte_index(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}
