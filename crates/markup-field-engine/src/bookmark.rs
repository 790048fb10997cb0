//! Selection bookmarks.
//!
//! A [`Bookmark`] records a selection as child-index paths from a field's
//! edit root, so it survives operations that rebuild nodes or move focus
//! away from the field.
//!
//! Resolving against a changed tree is approximate. At each level an index
//! past the end of the child list resolves to the last child, and an element
//! without children ends the walk early; the offset is then clamped to the
//! length of the node reached. If clamping leaves the end before the start,
//! the range collapses to its start.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::dom::{Dom, NodeId, Position, Range};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub start_path: Vec<usize>,
    pub start_offset: usize,
    pub end_path: Vec<usize>,
    pub end_offset: usize,
}

impl Bookmark {
    /// Bookmarks the document selection, or `None` if there is no selection
    /// inside `root`.
    pub fn capture(dom: &Dom, root: NodeId) -> Option<Self> {
        Self::from_range(dom, root, dom.selection?)
    }

    pub fn from_range(dom: &Dom, root: NodeId, range: Range) -> Option<Self> {
        Some(Self {
            start_path: path_to(dom, root, range.start.node)?,
            start_offset: range.start.offset,
            end_path: path_to(dom, root, range.end.node)?,
            end_offset: range.end.offset,
        })
    }

    /// A collapsed bookmark at the end of the content.
    pub fn at_end(dom: &Dom, root: NodeId) -> Self {
        let len = dom.node_len(root);
        Self {
            start_path: Vec::new(),
            start_offset: len,
            end_path: Vec::new(),
            end_offset: len,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start_path == self.end_path && self.start_offset == self.end_offset
    }

    pub fn resolve(&self, dom: &Dom, root: NodeId) -> Range {
        let start = resolve_position(dom, root, &self.start_path, self.start_offset);
        let end = resolve_position(dom, root, &self.end_path, self.end_offset);
        if dom.compare_positions(start, end) == Ordering::Greater {
            Range::collapsed(start)
        } else {
            Range::new(start, end)
        }
    }

    /// Resolves the bookmark and makes it the document selection.
    pub fn restore(&self, dom: &mut Dom, root: NodeId) -> Range {
        let range = self.resolve(dom, root);
        dom.selection = Some(range);
        range
    }
}

/// Child indices leading from `root` down to `node`.
pub fn path_to(dom: &Dom, root: NodeId, node: NodeId) -> Option<Vec<usize>> {
    let mut path = Vec::new();
    let mut cur = node;
    while cur != root {
        path.push(dom.index_in_parent(cur)?);
        cur = dom.parent(cur)?;
    }
    path.reverse();
    Some(path)
}

/// Walks `path` down from `root`, clamping indices that no longer exist.
pub fn node_at_path(dom: &Dom, root: NodeId, path: &[usize]) -> NodeId {
    let mut node = root;
    for &index in path {
        let len = dom.children(node).len();
        if len == 0 {
            break;
        }
        node = dom.child(node, index.min(len - 1)).unwrap_or(node);
    }
    node
}

fn resolve_position(dom: &Dom, root: NodeId, path: &[usize], offset: usize) -> Position {
    let node = node_at_path(dom, root, path);
    dom.clamp_position(Position::new(node, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field() -> (Dom, NodeId) {
        let mut dom = Dom::parse(r#"<p>before</p><div id="edit">ab<b>cd<i>ef</i></b>gh</div>"#);
        let root = dom.element_by_id("edit").unwrap();
        dom.selection = None;
        (dom, root)
    }

    fn node(dom: &Dom, root: NodeId, path: &[usize]) -> NodeId {
        path.iter().fold(root, |n, &i| dom.child(n, i).unwrap())
    }

    #[test]
    fn capture_without_selection_is_none() {
        let (dom, root) = field();
        assert_eq!(Bookmark::capture(&dom, root), None);
    }

    #[test]
    fn capture_outside_root_is_none() {
        let (mut dom, root) = field();
        let outside = node(&dom, dom.root(), &[0, 0]);
        dom.selection = Some(Range::collapsed(Position::new(outside, 2)));

        assert_eq!(Bookmark::capture(&dom, root), None);
    }

    #[test]
    fn round_trip_on_unchanged_tree() {
        // Given a selection from inside "cd" to inside "ef"
        let (mut dom, root) = field();
        let cd = node(&dom, root, &[1, 0]);
        let ef = node(&dom, root, &[1, 1, 0]);
        let selection = Range::new(Position::new(cd, 1), Position::new(ef, 2));
        dom.selection = Some(selection);

        // When captured, cleared and restored
        let bookmark = Bookmark::capture(&dom, root).unwrap();
        dom.selection = None;
        let restored = bookmark.restore(&mut dom, root);

        // Then the same containers and offsets come back
        assert_eq!(bookmark.start_path, vec![1, 0]);
        assert_eq!(bookmark.end_path, vec![1, 1, 0]);
        assert_eq!(restored, selection);
        assert_eq!(dom.selection, Some(selection));
    }

    #[test]
    fn round_trip_after_rebuilding_identical_markup() {
        let (mut dom, root) = field();
        let gh = node(&dom, root, &[2]);
        dom.selection = Some(Range::collapsed(Position::new(gh, 1)));
        let bookmark = Bookmark::capture(&dom, root).unwrap();

        // The surface is torn down and rebuilt from its own markup.
        let html = dom.inner_html(root);
        dom.set_inner_html(root, &html);

        let restored = bookmark.restore(&mut dom, root);
        assert_eq!(restored.start, Position::new(node(&dom, root, &[2]), 1));
        assert_ne!(restored.start.node, gh);
    }

    #[test]
    fn index_past_end_clamps_to_last_child() {
        let (dom, root) = field();
        let bookmark = Bookmark {
            start_path: vec![7],
            start_offset: 1,
            end_path: vec![7],
            end_offset: 1,
        };

        let range = bookmark.resolve(&dom, root);

        assert_eq!(range.start, Position::new(node(&dom, root, &[2]), 1));
    }

    #[test]
    fn offset_clamped_to_node_length() {
        let (dom, root) = field();
        let bookmark = Bookmark {
            start_path: vec![0],
            start_offset: 99,
            end_path: vec![0],
            end_offset: 99,
        };

        assert_eq!(
            bookmark.resolve(&dom, root).start,
            Position::new(node(&dom, root, &[0]), 2)
        );
    }

    #[test]
    fn walk_stops_at_childless_node() {
        // Given a bookmark deep in a subtree that shrank to one text node
        let (mut dom, root) = field();
        dom.set_inner_html(root, "x");
        let bookmark = Bookmark {
            start_path: vec![1, 1, 0],
            start_offset: 1,
            end_path: vec![1, 1, 0],
            end_offset: 2,
        };

        // Then it resolves into the text node that is left
        let range = bookmark.resolve(&dom, root);
        let x = node(&dom, root, &[0]);
        assert_eq!(range, Range::new(Position::new(x, 1), Position::new(x, 1)));
    }

    #[test]
    fn empty_root_resolves_to_root() {
        let (mut dom, root) = field();
        dom.set_inner_html(root, "");
        let bookmark = Bookmark {
            start_path: vec![0, 3],
            start_offset: 5,
            end_path: vec![2],
            end_offset: 0,
        };

        assert_eq!(bookmark.resolve(&dom, root), Range::collapsed(Position::new(root, 0)));
    }

    #[test]
    fn serde_round_trip() {
        let bookmark = Bookmark {
            start_path: vec![0, 1],
            start_offset: 2,
            end_path: vec![3],
            end_offset: 4,
        };
        let text = toml::to_string(&bookmark).unwrap();

        assert_eq!(toml::from_str::<Bookmark>(&text).unwrap(), bookmark);
    }
}
