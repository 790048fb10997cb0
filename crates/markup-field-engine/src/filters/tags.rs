use crate::dom::{Dom, NodeId};

fn rename_all(dom: &mut Dom, root: NodeId, pairs: &[(&str, &str)]) {
    for el in dom.descendants(root) {
        if let Some(&(_, to)) = pairs.iter().find(|(from, _)| dom.is_tag(el, from)) {
            dom.rename(el, to);
        }
    }
}

/// Editing surfaces produce `<b>`/`<i>`; stored markup may use `<strong>`/`<em>`.
pub fn markup_tags_in(dom: &mut Dom, root: NodeId) {
    rename_all(dom, root, &[("strong", "b"), ("em", "i")]);
}

pub fn markup_tags_out(dom: &mut Dom, root: NodeId) {
    rename_all(dom, root, &[("b", "strong"), ("i", "em")]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_both_ways() {
        let mut dom = Dom::parse("<strong>s</strong><em>e<b>b</b></em>");
        let root = dom.root();

        markup_tags_in(&mut dom, root);
        assert_eq!(dom.inner_html(root), "<b>s</b><i>e<b>b</b></i>");

        markup_tags_out(&mut dom, root);
        assert_eq!(dom.inner_html(root), "<strong>s</strong><em>e<strong>b</strong></em>");
    }
}
