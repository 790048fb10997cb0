//! Positions, ranges and the mutations that act on them.
//!
//! A [`Position`] inside a text node counts characters; inside an element
//! it counts children, the same convention browsers use for selections.
//! Range mutation works by splitting the tree at both boundaries up to a
//! common container, so that the range covers a contiguous run of that
//! container's children.

use std::cmp::Ordering;

use super::{Dom, NodeId, byte_index};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub node: NodeId,
    pub offset: usize,
}

impl Position {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn collapsed(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

impl Dom {
    /// Child indices from the document root down to `pos`, then its offset.
    fn position_key(&self, pos: Position) -> Vec<usize> {
        let mut key: Vec<usize> = std::iter::once(pos.node)
            .chain(self.ancestors(pos.node))
            .filter_map(|n| self.index_in_parent(n))
            .collect();
        key.reverse();
        key.push(pos.offset);
        key
    }

    /// Document-order comparison of two positions.
    pub fn compare_positions(&self, a: Position, b: Position) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        self.position_key(a).cmp(&self.position_key(b))
    }

    /// Returns the range with its boundaries in document order.
    pub fn ordered(&self, range: Range) -> Range {
        if self.compare_positions(range.start, range.end) == Ordering::Greater {
            Range::new(range.end, range.start)
        } else {
            range
        }
    }

    pub fn clamp_position(&self, pos: Position) -> Position {
        Position::new(pos.node, pos.offset.min(self.node_len(pos.node)))
    }

    pub fn is_within(&self, pos: Position, root: NodeId) -> bool {
        self.contains(root, pos.node)
    }

    pub fn select_contents(&self, node: NodeId) -> Range {
        Range::new(
            Position::new(node, 0),
            Position::new(node, self.node_len(node)),
        )
    }

    /// Deepest node containing both `a` and `b`.
    pub fn common_ancestor(&self, a: NodeId, b: NodeId) -> NodeId {
        let a_chain: Vec<NodeId> = std::iter::once(a).chain(self.ancestors(a)).collect();
        std::iter::once(b)
            .chain(self.ancestors(b))
            .find(|n| a_chain.contains(n))
            .unwrap_or(self.root())
    }

    fn container_of(&self, node: NodeId) -> NodeId {
        if self.is_text(node) {
            self.parent(node).unwrap_or(node)
        } else {
            node
        }
    }

    /// Deepest element containing both boundaries of `range`.
    pub fn range_container(&self, range: Range) -> NodeId {
        self.common_ancestor(
            self.container_of(range.start.node),
            self.container_of(range.end.node),
        )
    }

    /// Splits a text node at a character offset and returns the new right half.
    pub fn split_text(&mut self, text: NodeId, offset: usize) -> NodeId {
        let tail = match self.text_mut(text) {
            Some(t) => {
                let at = byte_index(t, offset);
                t.split_off(at)
            }
            None => return text,
        };
        let right = self.create_text(&tail);
        self.insert_after(text, right);
        right
    }

    /// Turns a position into an element boundary `(parent, child index)`,
    /// splitting a text node when the position falls inside one.
    fn boundary(&mut self, pos: Position) -> Option<(NodeId, usize)> {
        if !self.is_text(pos.node) {
            return Some((pos.node, pos.offset.min(self.node_len(pos.node))));
        }
        let parent = self.parent(pos.node)?;
        let index = self.index_in_parent(pos.node)?;
        let len = self.node_len(pos.node);
        if pos.offset == 0 {
            Some((parent, index))
        } else if pos.offset >= len {
            Some((parent, index + 1))
        } else {
            self.split_text(pos.node, pos.offset);
            Some((parent, index + 1))
        }
    }

    /// Splits ancestors of a boundary until the boundary sits in `stop`.
    /// Splitting at either edge of an element just steps out of it, so no
    /// empty halves are created.
    fn split_up_to(&mut self, mut at: (NodeId, usize), stop: NodeId) -> (NodeId, usize) {
        while at.0 != stop {
            let (node, k) = at;
            let (Some(parent), Some(index)) = (self.parent(node), self.index_in_parent(node)) else {
                break;
            };
            if k == 0 {
                at = (parent, index);
            } else if k >= self.node_len(node) {
                at = (parent, index + 1);
            } else {
                let right = self.clone_shallow(node);
                for child in self.children(node)[k..].to_vec() {
                    self.append_child(right, child);
                }
                self.insert_child(parent, index + 1, right);
                at = (parent, index + 1);
            }
        }
        at
    }

    /// Splits the tree so that `range` covers children `start..end` of
    /// `stop`, which must contain both boundaries.
    fn isolate(&mut self, range: Range, stop: NodeId) -> Option<(usize, usize)> {
        let range = self.ordered(range);

        let end = self.boundary(range.end)?;
        let (_, end_index) = self.split_up_to(end, stop);
        let after_end = self.child(stop, end_index);

        let start = self.boundary(range.start)?;
        let (_, start_index) = self.split_up_to(start, stop);

        let end_index = match after_end {
            Some(n) => self.index_in_parent(n)?,
            None => self.node_len(stop),
        };
        Some((start_index, end_index.max(start_index)))
    }

    /// Wraps the content of a non-collapsed range in a new `name` element
    /// and returns it. Nested elements of the same name are dissolved.
    pub fn wrap_range(&mut self, range: Range, name: &str) -> Option<NodeId> {
        if range.is_collapsed() {
            return None;
        }
        let stop = self.range_container(range);
        let (start, end) = self.isolate(range, stop)?;
        if start >= end {
            return None;
        }
        let moved = self.children(stop)[start..end].to_vec();
        let wrapper = self.create_element(name);
        self.insert_child(stop, start, wrapper);
        for child in moved {
            self.append_child(wrapper, child);
        }
        for nested in self.elements_by_tag(wrapper, name) {
            self.unwrap(nested);
        }
        Some(wrapper)
    }

    /// Removes every `name` element from the range, splitting elements that
    /// extend past it. Returns the range covering the same content afterwards.
    pub fn unwrap_tag_in_range(&mut self, range: Range, name: &str, limit: NodeId) -> Range {
        let inner = self.range_container(range);
        let outermost = std::iter::once(inner)
            .chain(self.ancestors(inner))
            .take_while(|&n| n != limit && self.contains(limit, n))
            .filter(|&n| self.is_tag(n, name))
            .last();
        let stop = match outermost.and_then(|n| self.parent(n)) {
            Some(p) => p,
            None => inner,
        };

        let Some((start, end)) = self.isolate(range, stop) else {
            return range;
        };
        let before = start.checked_sub(1).and_then(|i| self.child(stop, i));
        let after = self.child(stop, end);

        for child in self.children(stop)[start..end].to_vec() {
            for nested in self.elements_by_tag(child, name) {
                self.unwrap(nested);
            }
            if self.is_tag(child, name) {
                self.unwrap(child);
            }
        }

        let start = before
            .and_then(|n| self.index_in_parent(n))
            .map_or(0, |i| i + 1);
        let end = after
            .and_then(|n| self.index_in_parent(n))
            .unwrap_or(self.node_len(stop));
        Range::new(Position::new(stop, start), Position::new(stop, end))
    }

    /// Text nodes sharing at least one character with the range.
    pub fn text_nodes_in_range(&self, range: Range, limit: NodeId) -> Vec<NodeId> {
        let range = self.ordered(range);
        self.descendants(limit)
            .into_iter()
            .filter(|&n| self.is_text(n) && self.node_len(n) > 0)
            .filter(|&n| {
                let first = Position::new(n, 0);
                let last = Position::new(n, self.node_len(n));
                self.compare_positions(first, range.end) == Ordering::Less
                    && self.compare_positions(last, range.start) == Ordering::Greater
            })
            .collect()
    }

    /// True when every visible character of the range sits inside a `name`
    /// element below `limit`.
    pub fn range_has_tag(&self, range: Range, name: &str, limit: NodeId) -> bool {
        let texts: Vec<NodeId> = self
            .text_nodes_in_range(range, limit)
            .into_iter()
            .filter(|&t| self.text(t).is_some_and(|s| !s.trim().is_empty()))
            .collect();
        !texts.is_empty()
            && texts
                .iter()
                .all(|&t| self.closest(t, limit, |d, n| n != limit && d.is_tag(n, name)).is_some())
    }

    /// Deletes the content of the range and returns the collapsed position
    /// where it was.
    pub fn delete_contents(&mut self, range: Range) -> Position {
        let range = self.ordered(range);
        if range.is_collapsed() {
            return range.start;
        }
        let stop = self.range_container(range);
        match self.isolate(range, stop) {
            Some((start, end)) => {
                for child in self.children(stop)[start..end].to_vec() {
                    self.detach(child);
                }
                Position::new(stop, start)
            }
            None => range.start,
        }
    }

    /// Inserts `nodes` at `pos` and returns the position just after them.
    pub fn insert_nodes(&mut self, pos: Position, nodes: &[NodeId]) -> Position {
        let Some((parent, index)) = self.boundary(pos) else {
            return pos;
        };
        for (i, &n) in nodes.iter().enumerate() {
            self.insert_child(parent, index + i, n);
        }
        Position::new(parent, index + nodes.len())
    }

    /// Inserts text at `pos`, extending an adjacent text node when there is
    /// one. Returns the position just after the inserted text.
    pub fn insert_text_at(&mut self, pos: Position, text: &str) -> Position {
        let added = text.chars().count();
        if let Some(t) = self.text_mut(pos.node) {
            let at = byte_index(t, pos.offset);
            t.insert_str(at, text);
            return Position::new(pos.node, pos.offset + added);
        }
        let offset = pos.offset.min(self.node_len(pos.node));
        if let Some(prev) = offset.checked_sub(1).and_then(|i| self.child(pos.node, i))
            && let Some(t) = self.text_mut(prev)
        {
            t.push_str(text);
            let len = self.node_len(prev);
            return Position::new(prev, len);
        }
        let node = self.create_text(text);
        self.insert_child(pos.node, offset, node);
        Position::new(node, added)
    }

    /// Serializes the content of the range without touching this document.
    pub fn range_html(&self, range: Range) -> String {
        let mut scratch = self.clone();
        let stop = scratch.range_container(range);
        match scratch.isolate(range, stop) {
            Some((start, end)) => scratch.children(stop)[start..end]
                .iter()
                .map(|&n| scratch.outer_html(n))
                .collect(),
            None => String::new(),
        }
    }

    /// Text of the range without touching this document.
    pub fn range_text(&self, range: Range) -> String {
        let mut scratch = self.clone();
        let stop = scratch.range_container(range);
        match scratch.isolate(range, stop) {
            Some((start, end)) => scratch.children(stop)[start..end]
                .iter()
                .map(|&n| scratch.text_content(n))
                .collect(),
            None => String::new(),
        }
    }
}
