use super::{Dom, NodeData, NodeId, is_void};

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

impl Dom {
    /// Serializes the children of `id`.
    pub fn inner_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        for &child in self.children(id) {
            self.write_node(child, &mut out);
        }
        out
    }

    /// Serializes `id` itself, including its own tags.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_node(id, &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        match self.data(id) {
            NodeData::Text(t) => {
                let raw_parent = self
                    .parent(id)
                    .and_then(|p| self.tag(p))
                    .is_some_and(|t| RAW_TEXT_ELEMENTS.contains(&t));
                if raw_parent {
                    out.push_str(t);
                } else {
                    write_text(t, out);
                }
            }
            NodeData::Element(el) => {
                out.push('<');
                out.push_str(&el.name);
                for (k, v) in &el.attrs {
                    out.push(' ');
                    out.push_str(k);
                    out.push_str("=\"");
                    out.push_str(&html_escape::encode_double_quoted_attribute(v));
                    out.push('"');
                }
                out.push('>');
                if is_void(&el.name) {
                    return;
                }
                for &child in self.children(id) {
                    self.write_node(child, out);
                }
                out.push_str("</");
                out.push_str(&el.name);
                out.push('>');
            }
        }
    }
}

/// Escapes text content; non-breaking spaces are written as `&nbsp;` so
/// they stay visible to the whitespace rules of the output filters.
fn write_text(text: &str, out: &mut String) {
    let escaped = html_escape::encode_text(text);
    if escaped.contains('\u{a0}') {
        out.push_str(&escaped.replace('\u{a0}', "&nbsp;"));
    } else {
        out.push_str(&escaped);
    }
}

#[cfg(test)]
mod tests {
    use super::super::Dom;
    use pretty_assertions::assert_eq;

    #[test]
    fn outer_html_includes_own_tags() {
        let dom = Dom::parse(r#"<a href="u">x &amp; y</a>"#);
        let a = dom.child(dom.root(), 0).unwrap();

        assert_eq!(dom.outer_html(a), r#"<a href="u">x &amp; y</a>"#);
        assert_eq!(dom.inner_html(a), "x &amp; y");
    }

    #[test]
    fn nbsp_written_as_entity() {
        let mut dom = Dom::new();
        let root = dom.root();
        let t = dom.create_text("a\u{a0}b");
        dom.append_child(root, t);

        assert_eq!(dom.inner_html(root), "a&nbsp;b");
    }

    #[test]
    fn attribute_quotes_escaped() {
        let mut dom = Dom::new();
        let root = dom.root();
        let a = dom.create_element("abbr");
        dom.set_attr(a, "title", "say \"hi\"");
        dom.append_child(root, a);

        assert_eq!(dom.inner_html(root), r#"<abbr title="say &quot;hi&quot;"></abbr>"#);
    }
}
