//! Inline annotations: links, abbreviations and acronyms.
//!
//! While a field is being edited every annotation is an `<a>` element. The
//! kind is kept in [`TAG_ATTR`] and as an `mf-<token>` class, and a link's
//! destination is kept in [`URL_ATTR`] because editing surfaces rewrite
//! `href` freely. [`protect`] establishes this form, [`unprotect`] turns it
//! back into plain markup.

use crate::dom::{Dom, NodeId};

/// Side attribute holding the real link destination while editing.
pub const URL_ATTR: &str = "data-mf-url";
/// Short tag token of an edit-mode annotation.
pub const TAG_ATTR: &str = "data-mf-tag";
/// Marks an annotation that points to a structured host object.
pub const EXTERNAL_ATTR: &str = "data-external";
/// Identifier of the structured host object.
pub const EXTERNAL_ID_ATTR: &str = "data-external-id";
pub const CLASS_PREFIX: &str = "mf-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    Link,
    Abbreviation,
    Acronym,
}

impl AnnotationKind {
    pub const ALL: [AnnotationKind; 3] = [
        AnnotationKind::Link,
        AnnotationKind::Abbreviation,
        AnnotationKind::Acronym,
    ];

    pub fn token(self) -> &'static str {
        match self {
            AnnotationKind::Link => "a",
            AnnotationKind::Abbreviation => "abbr",
            AnnotationKind::Acronym => "acronym",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.token() == token)
    }

    pub fn class(self) -> String {
        format!("{CLASS_PREFIX}{}", self.token())
    }

    pub fn is_link(self) -> bool {
        self == AnnotationKind::Link
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub title: Option<String>,
    /// Link destination; always `None` for phrase kinds.
    pub protected_url: Option<String>,
    pub external_tag: Option<String>,
    pub external_id: Option<String>,
}

impl Annotation {
    pub fn link(url: &str) -> Self {
        Self {
            kind: AnnotationKind::Link,
            title: None,
            protected_url: Some(url.to_string()),
            external_tag: None,
            external_id: None,
        }
    }

    pub fn phrase(kind: AnnotationKind, title: &str) -> Self {
        Self {
            kind,
            title: Some(title.to_string()),
            protected_url: None,
            external_tag: None,
            external_id: None,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = (!title.is_empty()).then(|| title.to_string());
        self
    }

    /// Reads an edit-mode annotation element.
    pub fn read(dom: &Dom, el: NodeId) -> Option<Self> {
        if !dom.is_tag(el, "a") {
            return None;
        }
        let kind = match dom.attr(el, TAG_ATTR) {
            Some(token) => AnnotationKind::from_token(token)?,
            None if dom.has_attr(el, "href") || dom.has_attr(el, URL_ATTR) => AnnotationKind::Link,
            None => return None,
        };
        let protected_url = kind.is_link().then(|| {
            dom.attr(el, URL_ATTR)
                .or_else(|| dom.attr(el, "href"))
                .unwrap_or_default()
                .to_string()
        });
        Some(Self {
            kind,
            title: dom
                .attr(el, "title")
                .filter(|t| !t.is_empty())
                .map(str::to_string),
            protected_url,
            external_tag: dom.attr(el, EXTERNAL_ATTR).map(str::to_string),
            external_id: dom.attr(el, EXTERNAL_ID_ATTR).map(str::to_string),
        })
    }

    /// Writes this annotation onto an `<a>` element in edit-mode form.
    pub fn write(&self, dom: &mut Dom, el: NodeId) {
        dom.rename(el, "a");
        dom.set_attr(el, TAG_ATTR, self.kind.token());
        dom.remove_classes(el, |c| c.starts_with(CLASS_PREFIX));
        dom.add_class(el, &self.kind.class());
        match (&self.protected_url, self.kind.is_link()) {
            (Some(url), true) => {
                dom.set_attr(el, "href", url);
                dom.set_attr(el, URL_ATTR, url);
            }
            _ => {
                dom.set_attr(el, "href", "");
                dom.remove_attr(el, URL_ATTR);
            }
        }
        set_or_remove(dom, el, "title", self.title.as_deref());
        set_or_remove(dom, el, EXTERNAL_ATTR, self.external_tag.as_deref());
        set_or_remove(dom, el, EXTERNAL_ID_ATTR, self.external_id.as_deref());
    }
}

fn set_or_remove(dom: &mut Dom, el: NodeId, name: &str, value: Option<&str>) {
    match value {
        Some(v) if !v.is_empty() => dom.set_attr(el, name, v),
        _ => dom.remove_attr(el, name),
    }
}

pub fn is_annotation(dom: &Dom, node: NodeId) -> bool {
    dom.is_tag(node, "a")
        && (dom.has_attr(node, TAG_ATTR)
            || dom.has_attr(node, "href")
            || dom.has_attr(node, URL_ATTR))
}

/// Innermost annotation containing `node`, not looking above `root`.
pub fn annotation_at(dom: &Dom, root: NodeId, node: NodeId) -> Option<NodeId> {
    dom.closest(node, root, |d, n| n != root && is_annotation(d, n))
}

/// Puts every annotation below `root` into edit-mode form.
///
/// Links keep an existing side attribute, so protecting twice never
/// replaces the destination with a rewritten `href`.
pub fn protect(dom: &mut Dom, root: NodeId) {
    for el in dom.descendants(root) {
        match dom.tag(el) {
            Some("a") => protect_link(dom, el),
            Some(tag @ ("abbr" | "acronym")) => {
                let kind = if tag == "abbr" {
                    AnnotationKind::Abbreviation
                } else {
                    AnnotationKind::Acronym
                };
                let title = dom.attr(el, "title").unwrap_or_default().to_string();
                let link = dom.create_element("a");
                Annotation::phrase(kind, &title).with_title(&title).write(dom, link);
                dom.move_children(el, link);
                dom.replace_with(el, link);
            }
            _ => {}
        }
    }
}

fn protect_link(dom: &mut Dom, el: NodeId) {
    match dom.attr(el, TAG_ATTR) {
        Some(token) if token != AnnotationKind::Link.token() => return,
        _ => {}
    }
    if !dom.has_attr(el, "href") && !dom.has_attr(el, URL_ATTR) {
        return;
    }
    if !dom.has_attr(el, URL_ATTR) {
        let href = dom.attr(el, "href").unwrap_or_default().to_string();
        dom.set_attr(el, URL_ATTR, &href);
    }
    dom.set_attr(el, TAG_ATTR, AnnotationKind::Link.token());
    dom.add_class(el, &AnnotationKind::Link.class());
}

/// Turns edit-mode annotations below `root` back into plain markup: links
/// get their protected destination as `href`, phrase annotations become
/// `<abbr>`/`<acronym>` again.
pub fn unprotect(dom: &mut Dom, root: NodeId) {
    for el in dom.descendants(root) {
        if !dom.is_tag(el, "a") || !(dom.has_attr(el, TAG_ATTR) || dom.has_attr(el, URL_ATTR)) {
            continue;
        }
        let kind = dom
            .attr(el, TAG_ATTR)
            .and_then(AnnotationKind::from_token)
            .unwrap_or(AnnotationKind::Link);

        if kind.is_link() {
            if let Some(url) = dom.attr(el, URL_ATTR).map(str::to_string) {
                dom.set_attr(el, "href", &url);
            }
            dom.remove_attr(el, URL_ATTR);
            dom.remove_attr(el, TAG_ATTR);
            dom.remove_classes(el, |c| c.starts_with(CLASS_PREFIX));
        } else {
            let phrase = dom.create_element(kind.token());
            if let Some(title) = dom.attr(el, "title").filter(|t| !t.is_empty()) {
                let title = title.to_string();
                dom.set_attr(phrase, "title", &title);
            }
            dom.move_children(el, phrase);
            dom.replace_with(el, phrase);
        }
    }
}

/// Re-adds the kind class to annotations that lost it.
pub fn restore_classes(dom: &mut Dom, root: NodeId) {
    for el in dom.descendants(root) {
        if let Some(kind) = dom
            .attr(el, TAG_ATTR)
            .and_then(AnnotationKind::from_token)
            .filter(|_| dom.is_tag(el, "a"))
        {
            dom.add_class(el, &kind.class());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;

    fn protected(html: &str) -> String {
        let mut dom = Dom::parse(html);
        let root = dom.root();
        protect(&mut dom, root);
        dom.inner_html(root)
    }

    fn unprotected(html: &str) -> String {
        let mut dom = Dom::parse(html);
        let root = dom.root();
        unprotect(&mut dom, root);
        dom.inner_html(root)
    }

    #[test]
    fn protect_link() {
        assert_snapshot!(
            protected(r#"<a href="http://x.org/?a=1&amp;b=2">x</a>"#),
            @r#"<a href="http://x.org/?a=1&amp;b=2" data-mf-url="http://x.org/?a=1&amp;b=2" data-mf-tag="a" class="mf-a">x</a>"#
        );
    }

    #[test]
    fn protect_phrase_markup() {
        assert_snapshot!(
            protected(r#"<abbr title="et cetera">etc.</abbr> <acronym>NATO</acronym>"#),
            @r#"<a data-mf-tag="abbr" class="mf-abbr" href="" title="et cetera">etc.</a> <a data-mf-tag="acronym" class="mf-acronym" href="">NATO</a>"#
        );
    }

    #[test]
    fn protect_keeps_existing_side_attribute() {
        // Given an annotation whose href was rewritten by the editing surface
        let html = r#"<a href="../rewritten" data-mf-url="http://real.org" data-mf-tag="a" class="mf-a">x</a>"#;

        // When protected again
        let out = protected(html);

        // Then the real destination survives
        assert_eq!(out, html);
    }

    #[test]
    fn anchors_without_href_are_not_annotations() {
        assert_eq!(protected(r#"<a name="top">x</a>"#), r#"<a name="top">x</a>"#);
    }

    #[test]
    fn unprotect_link_uses_side_attribute() {
        assert_eq!(
            unprotected(
                r#"<a href="../rewritten" data-mf-url="http://real.org" data-mf-tag="a" class="x mf-a">x</a>"#
            ),
            r#"<a href="http://real.org" class="x">x</a>"#
        );
    }

    #[test]
    fn unprotect_phrase_annotations() {
        assert_eq!(
            unprotected(
                r#"<a href="" data-mf-tag="acronym" class="mf-acronym" title="North Atlantic">NATO</a>"#
            ),
            r#"<acronym title="North Atlantic">NATO</acronym>"#
        );
    }

    #[test]
    fn external_attributes_survive_unprotect() {
        assert_eq!(
            unprotected(
                r#"<a href="" data-mf-url="http://cms/story/7" data-mf-tag="a" class="mf-a" data-external="story" data-external-id="7">s</a>"#
            ),
            r#"<a href="http://cms/story/7" data-external="story" data-external-id="7">s</a>"#
        );
    }

    #[test]
    fn read_and_write_round_trip() {
        let mut dom = Dom::parse("<a>t</a>");
        let a = dom.child(dom.root(), 0).unwrap();
        let ann = Annotation::link("http://x.org").with_title("X");

        ann.write(&mut dom, a);

        assert_eq!(Annotation::read(&dom, a), Some(ann));
    }

    #[test]
    fn write_switches_kind_and_drops_url() {
        let mut dom = Dom::parse(r#"<a href="u" data-mf-url="u" data-mf-tag="a" class="mf-a">t</a>"#);
        let a = dom.child(dom.root(), 0).unwrap();

        Annotation::phrase(AnnotationKind::Abbreviation, "tee").write(&mut dom, a);

        assert_eq!(
            dom.outer_html(a),
            r#"<a href="" data-mf-tag="abbr" class="mf-abbr" title="tee">t</a>"#
        );
    }

    #[test]
    fn restore_classes_after_they_were_stripped() {
        let mut dom = Dom::parse(r#"<a href="" data-mf-tag="abbr">t</a>"#);
        let root = dom.root();

        restore_classes(&mut dom, root);

        assert!(dom.has_class(dom.child(root, 0).unwrap(), "mf-abbr"));
    }

    #[test]
    fn annotation_at_finds_enclosing_link() {
        let dom = Dom::parse(r#"x<a href="u">in <b>bold</b></a>"#);
        let root = dom.root();
        let a = dom.child(root, 1).unwrap();
        let bold_text = dom.child(dom.child(a, 1).unwrap(), 0).unwrap();

        assert_eq!(annotation_at(&dom, root, bold_text), Some(a));
        assert_eq!(annotation_at(&dom, root, dom.child(root, 0).unwrap()), None);
    }
}
