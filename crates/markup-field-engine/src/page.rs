//! The host page a field lives in.

use crate::dom::{Dom, NodeId};
use crate::engine::HostCapabilities;

/// A host document with its forms, plus what the host environment can do.
#[derive(Debug, Clone)]
pub struct Page {
    pub dom: Dom,
    pub capabilities: HostCapabilities,
    /// Number of readiness polls after which a nested frame document is
    /// loaded. `None` models a frame that never loads.
    pub frame_load_polls: Option<u32>,
}

impl Page {
    pub fn new(html: &str) -> Self {
        Self::with_capabilities(html, HostCapabilities::design_mode())
    }

    pub fn with_capabilities(html: &str, capabilities: HostCapabilities) -> Self {
        Self {
            dom: Dom::parse(html),
            capabilities,
            frame_load_polls: Some(2),
        }
    }

    pub fn element(&self, id: &str) -> Option<NodeId> {
        self.dom.element_by_id(id)
    }

    /// The form a container belongs to: the form with id `explicit` when
    /// given, otherwise the nearest `form` ancestor.
    pub fn find_form(&self, container: NodeId, explicit: Option<&str>) -> Option<NodeId> {
        match explicit {
            Some(id) => self.element(id).filter(|&f| self.dom.is_tag(f, "form")),
            None => self
                .dom
                .ancestors(container)
                .into_iter()
                .find(|&n| self.dom.is_tag(n, "form")),
        }
    }

    /// Named `input` elements of a form.
    pub fn form_inputs(&self, form: NodeId) -> Vec<NodeId> {
        self.dom
            .elements_by_tag(form, "input")
            .into_iter()
            .filter(|&n| self.dom.has_attr(n, "name"))
            .collect()
    }

    pub fn input_by_name(&self, form: NodeId, name: &str) -> Option<NodeId> {
        self.form_inputs(form)
            .into_iter()
            .find(|&n| self.dom.attr(n, "name") == Some(name))
    }

    /// Returns the form's input named `name`, appending a hidden one seeded
    /// with `value` when the form has none.
    pub fn ensure_hidden_input(
        &mut self,
        form: NodeId,
        name: &str,
        id: Option<&str>,
        value: &str,
    ) -> NodeId {
        if let Some(existing) = self.input_by_name(form, name) {
            return existing;
        }
        let input = self.dom.create_element("input");
        self.dom.set_attr(input, "type", "hidden");
        self.dom.set_attr(input, "name", name);
        if let Some(id) = id {
            self.dom.set_attr(input, "id", id);
        }
        self.dom.set_attr(input, "value", value);
        self.dom.append_child(form, input);
        input
    }

    pub fn input_value(&self, input: NodeId) -> &str {
        self.dom.attr(input, "value").unwrap_or_default()
    }

    pub fn set_input_value(&mut self, input: NodeId, value: &str) {
        self.dom.set_attr(input, "value", value);
    }

    /// `(name, value)` pairs of a form's named inputs, in document order.
    pub fn form_values(&self, form: NodeId) -> Vec<(String, String)> {
        self.form_inputs(form)
            .into_iter()
            .map(|n| {
                (
                    self.dom.attr(n, "name").unwrap_or_default().to_string(),
                    self.input_value(n).to_string(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<form id="main" action="/save" method="post"><div id="body">x</div></form><div id="loose"></div><form id="other"></form>"#;

    #[test]
    fn form_from_ancestor_or_explicit_id() {
        let page = Page::new(PAGE);
        let body = page.element("body").unwrap();
        let loose = page.element("loose").unwrap();

        assert_eq!(page.find_form(body, None), page.element("main"));
        assert_eq!(page.find_form(loose, None), None);
        assert_eq!(page.find_form(loose, Some("other")), page.element("other"));
        assert_eq!(page.find_form(loose, Some("body")), None);
    }

    #[test]
    fn hidden_inputs_created_once() {
        let mut page = Page::new(PAGE);
        let form = page.element("main").unwrap();

        let first = page.ensure_hidden_input(form, "body", Some("body_return"), "x");
        let second = page.ensure_hidden_input(form, "body", None, "ignored");
        page.ensure_hidden_input(form, "body_indent", None, "0");

        assert_eq!(first, second);
        assert_eq!(
            page.form_values(form),
            vec![
                ("body".to_string(), "x".to_string()),
                ("body_indent".to_string(), "0".to_string()),
            ]
        );
        assert_eq!(page.element("body_return"), Some(first));
    }
}
