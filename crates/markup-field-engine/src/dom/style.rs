use super::{Dom, NodeId};

/// Parses a `style` attribute into `(property, value)` pairs.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (prop, value) = decl.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim();
            (!prop.is_empty() && !value.is_empty()).then(|| (prop, value.to_string()))
        })
        .collect()
}

fn format_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(p, v)| format!("{p}: {v};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reads a pixel length such as `20px` or `20`. Other units read as `None`.
pub fn px(value: &str) -> Option<i32> {
    let v = value.trim();
    let number = v.strip_suffix("px").unwrap_or(v).trim();
    number
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .map(|n| n.round() as i32)
}

impl Dom {
    pub fn style_declarations(&self, id: NodeId) -> Vec<(String, String)> {
        self.attr(id, "style")
            .map(parse_declarations)
            .unwrap_or_default()
    }

    pub fn style_property(&self, id: NodeId, prop: &str) -> Option<String> {
        self.style_declarations(id)
            .into_iter()
            .find(|(p, _)| p == prop)
            .map(|(_, v)| v)
    }

    /// Sets one property of the inline style; an empty value removes it.
    pub fn set_style_property(&mut self, id: NodeId, prop: &str, value: &str) {
        let mut decls = self.style_declarations(id);
        decls.retain(|(p, _)| p != prop);
        if !value.is_empty() {
            decls.push((prop.to_string(), value.to_string()));
        }
        if decls.is_empty() {
            self.remove_attr(id, "style");
        } else {
            self.set_attr(id, "style", &format_declarations(&decls));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn set_and_read_properties() {
        let mut dom = Dom::parse(r#"<div style="width: 300px;COLOR:red">x</div>"#);
        let div = dom.child(dom.root(), 0).unwrap();

        assert_eq!(dom.style_property(div, "color").as_deref(), Some("red"));

        dom.set_style_property(div, "padding-left", "20px");
        dom.set_style_property(div, "color", "");

        assert_eq!(dom.attr(div, "style"), Some("width: 300px; padding-left: 20px;"));
    }

    #[test]
    fn removing_last_property_drops_attribute() {
        let mut dom = Dom::parse(r#"<div style="color: red">x</div>"#);
        let div = dom.child(dom.root(), 0).unwrap();

        dom.set_style_property(div, "color", "");

        assert!(!dom.has_attr(div, "style"));
    }

    #[rstest]
    #[case("20px", Some(20))]
    #[case(" 7 ", Some(7))]
    #[case("12.6px", Some(13))]
    #[case("-5px", Some(-5))]
    #[case("2em", None)]
    #[case("", None)]
    fn pixel_lengths(#[case] input: &str, #[case] expected: Option<i32>) {
        assert_eq!(px(input), expected);
    }
}
