//! Editing operations shared by every engine.
//!
//! These work on an edit root inside a [`Dom`] and its document selection.
//! Caret movement and deletion count characters of text nodes plus one per
//! `<br>`, which is how the editing surfaces behave for the inline content
//! a field allows.

use std::cmp::Ordering;

use crate::annotation::{self, Annotation};
use crate::dom::{Dom, NodeId, Position, Range};
use crate::filters::Pipeline;
use crate::keymap::{KeyEvent, codes};

use super::EngineError;

/// The document selection, ordered, when both ends lie inside `root`.
pub fn selection_in(dom: &Dom, root: NodeId) -> Option<Range> {
    let sel = dom.selection?;
    (dom.is_within(sel.start, root) && dom.is_within(sel.end, root)).then(|| dom.ordered(sel))
}

/// The selection inside `root`, or a caret at the end of the content.
fn selection_or_end(dom: &Dom, root: NodeId) -> Range {
    selection_in(dom, root).unwrap_or_else(|| Range::collapsed(end_position(dom, root)))
}

pub fn end_position(dom: &Dom, root: NodeId) -> Position {
    Position::new(root, dom.node_len(root))
}

pub fn caret_at_end(dom: &mut Dom, root: NodeId) {
    dom.selection = Some(Range::collapsed(end_position(dom, root)));
}

pub fn collapse_to_end(dom: &mut Dom, root: NodeId) {
    if let Some(range) = selection_in(dom, root) {
        dom.selection = Some(Range::collapsed(range.end));
    }
}

pub fn select_all(dom: &mut Dom, root: NodeId) {
    dom.selection = Some(dom.select_contents(root));
}

/// Toggles an inline element over the selection: removed when the whole
/// selection already has it, added otherwise. A collapsed selection is
/// left alone. Returns the range covering the formatted content.
pub fn toggle_inline(dom: &mut Dom, root: NodeId, tag: &str) -> Option<Range> {
    let range = selection_in(dom, root).filter(|r| !r.is_collapsed())?;
    let formatted = if dom.range_has_tag(range, tag, root) {
        dom.unwrap_tag_in_range(range, tag, root)
    } else {
        let wrapper = dom.wrap_range(range, tag)?;
        dom.select_contents(wrapper)
    };
    dom.selection = Some(formatted);
    Some(formatted)
}

/// Whether inline markup `tag` applies at the selection.
pub fn has_inline(dom: &Dom, root: NodeId, tag: &str) -> bool {
    let Some(range) = selection_in(dom, root) else {
        return false;
    };
    if range.is_collapsed() {
        dom.closest(range.start.node, root, |d, n| n != root && d.is_tag(n, tag))
            .is_some()
    } else {
        dom.range_has_tag(range, tag, root)
    }
}

/// Replaces the selection with `nodes`; the caret ends up after them.
pub fn insert_nodes(dom: &mut Dom, root: NodeId, nodes: &[NodeId]) {
    let range = selection_or_end(dom, root);
    let at = dom.delete_contents(range);
    let after = dom.insert_nodes(at, nodes);
    dom.selection = Some(Range::collapsed(after));
}

pub fn insert_text(dom: &mut Dom, root: NodeId, text: &str) {
    let range = selection_or_end(dom, root);
    let at = dom.delete_contents(range);
    let after = dom.insert_text_at(at, text);
    dom.selection = Some(Range::collapsed(after));
}

/// Parses `html` and inserts it in place of the selection.
pub fn insert_html(dom: &mut Dom, root: NodeId, html: &str) {
    let fragment = Dom::parse(html);
    let nodes = import_children(dom, &fragment, fragment.root());
    insert_nodes(dom, root, &nodes);
}

pub fn insert_line_break(dom: &mut Dom, root: NodeId) {
    let br = dom.create_element("br");
    insert_nodes(dom, root, &[br]);
}

/// Cleans foreign markup with the paste pipeline and inserts it.
pub fn paste_html(dom: &mut Dom, root: NodeId, paste: &Pipeline, html: &str) {
    let mut fragment = Dom::parse(html);
    let fragment_root = fragment.root();
    paste.run(&mut fragment, fragment_root);
    let nodes = import_children(dom, &fragment, fragment_root);
    insert_nodes(dom, root, &nodes);
}

/// Text of a markup fragment, without any markup.
pub fn plain_text(html: &str) -> String {
    let fragment = Dom::parse(html);
    fragment.text_content(fragment.root())
}

fn import_children(dom: &mut Dom, other: &Dom, parent: NodeId) -> Vec<NodeId> {
    other
        .children(parent)
        .iter()
        .map(|&child| dom.import(other, child))
        .collect()
}

/// Copies the children of `root` into a fresh document.
pub fn detached_copy(dom: &Dom, root: NodeId) -> Dom {
    let mut copy = Dom::new();
    let copy_root = copy.root();
    for child in import_children(&mut copy, dom, root) {
        copy.append_child(copy_root, child);
    }
    copy
}

// Annotations

/// The element right after a position, for positions between children.
fn node_after(dom: &Dom, pos: Position) -> NodeId {
    if dom.is_text(pos.node) {
        pos.node
    } else {
        dom.child(pos.node, pos.offset).unwrap_or(pos.node)
    }
}

/// The annotation the selection starts or ends in.
pub fn find_annotation(dom: &Dom, root: NodeId) -> Option<NodeId> {
    let range = selection_in(dom, root)?;
    [range.start, range.end]
        .into_iter()
        .find_map(|pos| annotation::annotation_at(dom, root, node_after(dom, pos)))
}

pub fn insert_annotation(
    dom: &mut Dom,
    root: NodeId,
    annotation: &Annotation,
) -> Result<NodeId, EngineError> {
    let range = selection_in(dom, root)
        .filter(|r| !r.is_collapsed())
        .ok_or(EngineError::NothingSelected)?;
    let el = dom
        .wrap_range(range, "a")
        .ok_or(EngineError::NothingSelected)?;
    annotation.write(dom, el);
    dom.selection = Some(dom.select_contents(el));
    Ok(el)
}

/// Unwraps the annotation at the selection, keeping its content selected.
pub fn delete_annotation(dom: &mut Dom, root: NodeId) -> Result<(), EngineError> {
    let el = find_annotation(dom, root).ok_or(EngineError::NoAnnotation)?;
    unwrap_selected(dom, el);
    Ok(())
}

pub fn unwrap_selected(dom: &mut Dom, el: NodeId) {
    let count = dom.children(el).len();
    let (Some(parent), Some(index)) = (dom.parent(el), dom.index_in_parent(el)) else {
        return;
    };
    dom.unwrap(el);
    dom.selection = Some(Range::new(
        Position::new(parent, index),
        Position::new(parent, index + count),
    ));
}

// Characters and the caret

/// Text nodes and line breaks below `root`, in document order.
fn leaves(dom: &Dom, root: NodeId) -> Vec<NodeId> {
    dom.descendants(root)
        .into_iter()
        .filter(|&n| dom.is_text(n) || dom.is_tag(n, "br"))
        .collect()
}

fn leaf_len(dom: &Dom, leaf: NodeId) -> usize {
    if dom.is_text(leaf) { dom.node_len(leaf) } else { 1 }
}

fn leaf_start(dom: &Dom, leaf: NodeId) -> Position {
    if dom.is_text(leaf) {
        return Position::new(leaf, 0);
    }
    match (dom.parent(leaf), dom.index_in_parent(leaf)) {
        (Some(p), Some(i)) => Position::new(p, i),
        _ => Position::new(leaf, 0),
    }
}

fn leaf_end(dom: &Dom, leaf: NodeId) -> Position {
    if dom.is_text(leaf) {
        return Position::new(leaf, dom.node_len(leaf));
    }
    match (dom.parent(leaf), dom.index_in_parent(leaf)) {
        (Some(p), Some(i)) => Position::new(p, i + 1),
        _ => Position::new(leaf, 0),
    }
}

/// Number of characters before `pos`.
pub fn char_index(dom: &Dom, root: NodeId, pos: Position) -> usize {
    let mut count = 0;
    for leaf in leaves(dom, root) {
        if leaf == pos.node {
            return count + pos.offset.min(leaf_len(dom, leaf));
        }
        if dom.compare_positions(leaf_end(dom, leaf), pos) != Ordering::Greater {
            count += leaf_len(dom, leaf);
        } else {
            break;
        }
    }
    count
}

/// Number of characters in the content.
pub fn char_count(dom: &Dom, root: NodeId) -> usize {
    leaves(dom, root).iter().map(|&l| leaf_len(dom, l)).sum()
}

/// The position after the `index`-th character, preferring the end of a
/// text node over the start of the next one.
pub fn position_at(dom: &Dom, root: NodeId, index: usize) -> Position {
    let mut count = 0;
    for leaf in leaves(dom, root) {
        if dom.is_text(leaf) {
            let len = dom.node_len(leaf);
            if index <= count + len {
                return Position::new(leaf, index - count);
            }
            count += len;
        } else {
            if index == count {
                return leaf_start(dom, leaf);
            }
            count += 1;
        }
    }
    end_position(dom, root)
}

/// The range between two character indices.
pub fn range_between(dom: &Dom, root: NodeId, start: usize, end: usize) -> Range {
    let (start, end) = if start <= end { (start, end) } else { (end, start) };
    Range::new(position_at(dom, root, start), position_at(dom, root, end))
}

fn set_caret_index(dom: &mut Dom, root: NodeId, index: usize) {
    let pos = position_at(dom, root, index);
    dom.selection = Some(Range::collapsed(pos));
}

/// Removes the character before the caret, or the selected content.
pub fn delete_backward(dom: &mut Dom, root: NodeId) {
    delete_char(dom, root, false);
}

/// Removes the character after the caret, or the selected content.
pub fn delete_forward(dom: &mut Dom, root: NodeId) {
    delete_char(dom, root, true);
}

fn delete_char(dom: &mut Dom, root: NodeId, forward: bool) {
    let range = selection_or_end(dom, root);
    if !range.is_collapsed() {
        let at = dom.delete_contents(range);
        dom.selection = Some(Range::collapsed(at));
        return;
    }
    let caret = char_index(dom, root, range.start);
    let target = if forward {
        caret
    } else {
        match caret.checked_sub(1) {
            Some(i) => i,
            None => return,
        }
    };
    if target >= char_count(dom, root) {
        return;
    }
    let removal = range_between(dom, root, target, target + 1);
    let removal = Range::new(
        first_unit_start(dom, root, target).unwrap_or(removal.start),
        removal.end,
    );
    dom.delete_contents(removal);
    set_caret_index(dom, root, target);
}

/// Start of the `index`-th character itself, rather than the end of the
/// leaf before it.
fn first_unit_start(dom: &Dom, root: NodeId, index: usize) -> Option<Position> {
    let mut count = 0;
    for leaf in leaves(dom, root) {
        let len = leaf_len(dom, leaf);
        if index < count + len {
            return Some(if dom.is_text(leaf) {
                Position::new(leaf, index - count)
            } else {
                leaf_start(dom, leaf)
            });
        }
        count += len;
    }
    None
}

/// Moves the caret one character, to the start or to the end. With
/// `extend`, the selection's anchor stays put.
pub fn move_caret(dom: &mut Dom, root: NodeId, key: u32, extend: bool) {
    let range = selection_or_end(dom, root);
    let anchor = dom.selection.map_or(range.start, |s| s.start);
    let focus = dom.selection.map_or(range.end, |s| s.end);
    let from = char_index(dom, root, focus);
    let total = char_count(dom, root);

    let to = match key {
        codes::LEFT if !extend && !range.is_collapsed() => char_index(dom, root, range.start),
        codes::RIGHT if !extend && !range.is_collapsed() => char_index(dom, root, range.end),
        codes::LEFT => from.saturating_sub(1),
        codes::RIGHT => (from + 1).min(total),
        codes::HOME | codes::UP => 0,
        codes::END | codes::DOWN => total,
        _ => return,
    };
    let target = position_at(dom, root, to);
    dom.selection = Some(if extend {
        Range::new(anchor, target)
    } else {
        Range::collapsed(target)
    });
}

/// What the editing surface does with a key nobody handled.
pub fn native_key(dom: &mut Dom, root: NodeId, event: &KeyEvent) {
    if event.ctrl || event.alt {
        return;
    }
    match event.code {
        codes::BACKSPACE => delete_backward(dom, root),
        codes::DELETE => delete_forward(dom, root),
        codes::ENTER => insert_line_break(dom, root),
        codes::LEFT | codes::RIGHT | codes::HOME | codes::END | codes::UP | codes::DOWN => {
            move_caret(dom, root, event.code, event.shift)
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Pipelines;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn field(html: &str) -> (Dom, NodeId) {
        let mut dom = Dom::parse(r#"<div id="edit"></div>"#);
        let root = dom.element_by_id("edit").unwrap();
        dom.set_inner_html(root, html);
        (dom, root)
    }

    fn select(dom: &mut Dom, root: NodeId, start: usize, end: usize) {
        dom.selection = Some(range_between(dom, root, start, end));
    }

    #[test]
    fn bold_toggles_on_and_off() {
        // Given "one two" with "two" selected
        let (mut dom, root) = field("one two");
        select(&mut dom, root, 4, 7);

        // When bold is toggled twice
        toggle_inline(&mut dom, root, "b");
        let once = dom.inner_html(root);
        toggle_inline(&mut dom, root, "b");

        // Then it is added, then removed again
        assert_eq!(once, "one <b>two</b>");
        assert_eq!(dom.inner_html(root), "one two");
    }

    #[test]
    fn collapsed_selection_formats_nothing() {
        let (mut dom, root) = field("one");
        select(&mut dom, root, 1, 1);

        assert_eq!(toggle_inline(&mut dom, root, "i"), None);
        assert_eq!(dom.inner_html(root), "one");
    }

    #[test]
    fn inline_state_at_caret() {
        let (mut dom, root) = field("a<b>bc</b>d");
        select(&mut dom, root, 2, 2);
        assert!(has_inline(&dom, root, "b"));

        select(&mut dom, root, 0, 4);
        assert!(!has_inline(&dom, root, "b"));
    }

    #[test]
    fn typing_replaces_selection() {
        let (mut dom, root) = field("hello <b>big</b> world");
        select(&mut dom, root, 6, 9);

        insert_text(&mut dom, root, "small");
        insert_text(&mut dom, root, "!");

        assert_snapshot!(dom.inner_html(root), @"hello small! world");
    }

    #[test]
    fn typing_without_selection_appends() {
        let (mut dom, root) = field("ab");
        dom.selection = None;

        insert_text(&mut dom, root, "c");

        assert_eq!(dom.inner_html(root), "abc");
    }

    #[rstest]
    #[case("ab<br>cd", 3, "abcd", 2)]
    #[case("ab<br>cd", 2, "a<br>cd", 1)]
    #[case("<i>ab</i>cd", 3, "<i>ab</i>d", 2)]
    #[case("ab", 0, "ab", 0)]
    fn backspace(
        #[case] html: &str,
        #[case] caret: usize,
        #[case] expected: &str,
        #[case] expected_caret: usize,
    ) {
        let (mut dom, root) = field(html);
        select(&mut dom, root, caret, caret);

        delete_backward(&mut dom, root);

        assert_eq!(dom.inner_html(root), expected);
        let sel = dom.selection.unwrap();
        assert_eq!(char_index(&dom, root, sel.start), expected_caret);
    }

    #[rstest]
    #[case("ab<br>cd", 2, "abcd")]
    #[case("ab", 2, "ab")]
    #[case("<b>a</b>b", 0, "<b></b>b")]
    fn delete_key(#[case] html: &str, #[case] caret: usize, #[case] expected: &str) {
        let (mut dom, root) = field(html);
        select(&mut dom, root, caret, caret);

        delete_forward(&mut dom, root);

        assert_eq!(dom.inner_html(root), expected);
    }

    #[test]
    fn caret_movement_and_extension() {
        let (mut dom, root) = field("ab<b>cd</b>");
        select(&mut dom, root, 1, 1);

        move_caret(&mut dom, root, codes::RIGHT, false);
        move_caret(&mut dom, root, codes::RIGHT, true);
        move_caret(&mut dom, root, codes::RIGHT, true);

        let sel = dom.selection.unwrap();
        assert_eq!(dom.range_text(sel), "cd");

        move_caret(&mut dom, root, codes::HOME, false);
        assert_eq!(char_index(&dom, root, dom.selection.unwrap().start), 0);
    }

    #[test]
    fn annotation_insert_find_delete() {
        let (mut dom, root) = field("see docs here");
        select(&mut dom, root, 4, 8);

        let el = insert_annotation(&mut dom, root, &Annotation::link("http://x.org/")).unwrap();
        assert_eq!(find_annotation(&dom, root), Some(el));
        assert_snapshot!(dom.inner_html(root), @r#"see <a data-mf-tag="a" class="mf-a" href="http://x.org/" data-mf-url="http://x.org/">docs</a> here"#);

        delete_annotation(&mut dom, root).unwrap();
        assert_eq!(dom.inner_html(root), "see docs here");
        assert_eq!(dom.range_text(dom.selection.unwrap()), "docs");
        assert_eq!(delete_annotation(&mut dom, root), Err(EngineError::NoAnnotation));
    }

    #[test]
    fn annotation_needs_selected_text() {
        let (mut dom, root) = field("text");
        select(&mut dom, root, 2, 2);

        assert_eq!(
            insert_annotation(&mut dom, root, &Annotation::link("u")),
            Err(EngineError::NothingSelected)
        );
    }

    #[test]
    fn paste_runs_the_paste_pipeline() {
        let (mut dom, root) = field("x");
        select(&mut dom, root, 1, 1);
        let pipelines = Pipelines::new(false);

        paste_html(
            &mut dom,
            root,
            &pipelines.paste,
            "<div><script>x</script><p>Hello <b>world</b></p></div>",
        );

        assert_eq!(dom.inner_html(root), "x<br><br>Hello <b>world</b>");
    }
}
