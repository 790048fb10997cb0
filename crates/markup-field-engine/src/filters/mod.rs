//! Markup filter pipelines.
//!
//! A [`Filter`] is a named function over a subtree; a [`Pipeline`] is an
//! ordered, immutable list of filters. [`Pipelines`] assembles the three
//! pipelines a field needs once, from its configuration:
//!
//! - **input**: server markup to edit-mode markup
//! - **output**: edit-mode markup to the value that is submitted
//! - **paste**: foreign markup to cleaned edit-mode markup
//!
//! Every filter is idempotent on its own output and never fails on
//! malformed markup.
//!
//! ## Modules
//!
//! - [`normalize`]: `correct_markup`, the output normalizer
//! - [`paste`]: block- and inline-level paste cleanup
//! - [`tags`]: tag renaming filters

pub mod normalize;
pub mod paste;
pub mod tags;

use std::fmt;

use markup_field_config::FieldConfig;

use crate::annotation;
use crate::dom::{Dom, NodeId};

pub type FilterFn = fn(&mut Dom, NodeId);

/// A named markup transform.
#[derive(Clone, Copy)]
pub struct Filter {
    pub name: &'static str,
    apply: FilterFn,
}

impl Filter {
    pub const fn new(name: &'static str, apply: FilterFn) -> Self {
        Self { name, apply }
    }

    pub fn apply(&self, dom: &mut Dom, root: NodeId) {
        (self.apply)(dom, root);
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

pub const MARKUP_TAGS_IN: Filter = Filter::new("markup_tags_in", tags::markup_tags_in);
pub const MARKUP_TAGS_OUT: Filter = Filter::new("markup_tags_out", tags::markup_tags_out);
pub const PROTECT_ANNOTATIONS: Filter = Filter::new("protect_annotations", annotation::protect);
pub const UNPROTECT_ANNOTATIONS: Filter =
    Filter::new("unprotect_annotations", annotation::unprotect);
pub const CORRECT_MARKUP: Filter = Filter::new("correct_markup", normalize::correct_markup);
pub const BLOCK_LEVEL_PASTE: Filter = Filter::new("block_level_paste", paste::block_level_paste);
pub const INLINE_LEVEL_PASTE: Filter =
    Filter::new("inline_level_paste", paste::inline_level_paste);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Input,
    Output,
    Paste,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    kind: PipelineKind,
    stages: Vec<Filter>,
}

impl Pipeline {
    pub fn new(kind: PipelineKind, stages: Vec<Filter>) -> Self {
        Self { kind, stages }
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|f| f.name).collect()
    }

    /// Runs every stage over the children of `root`, in order.
    pub fn run(&self, dom: &mut Dom, root: NodeId) {
        for stage in &self.stages {
            log::trace!("{:?} filter {}", self.kind, stage.name);
            stage.apply(dom, root);
        }
    }

    /// Parses `html`, runs the pipeline and serializes the result.
    pub fn run_html(&self, html: &str) -> String {
        let mut dom = Dom::parse(html);
        let root = dom.root();
        self.run(&mut dom, root);
        dom.inner_html(root)
    }
}

/// The input, output and paste pipelines of one field.
#[derive(Debug, Clone)]
pub struct Pipelines {
    pub input: Pipeline,
    pub output: Pipeline,
    pub paste: Pipeline,
}

impl Pipelines {
    /// Builds the pipelines. With `use_markup_filters`, `<strong>`/`<em>`
    /// are edited as `<b>`/`<i>` and written back as `<strong>`/`<em>`.
    pub fn new(use_markup_filters: bool) -> Self {
        let mut input = Vec::new();
        let mut output = vec![CORRECT_MARKUP, UNPROTECT_ANNOTATIONS];
        let mut paste = vec![BLOCK_LEVEL_PASTE];

        if use_markup_filters {
            input.push(MARKUP_TAGS_IN);
            output.push(MARKUP_TAGS_OUT);
            paste.push(MARKUP_TAGS_IN);
        }
        input.push(PROTECT_ANNOTATIONS);
        // Renaming and unprotecting can leave new twins or whitespace runs.
        output.push(CORRECT_MARKUP);
        paste.push(INLINE_LEVEL_PASTE);
        paste.push(PROTECT_ANNOTATIONS);

        Self {
            input: Pipeline::new(PipelineKind::Input, input),
            output: Pipeline::new(PipelineKind::Output, output),
            paste: Pipeline::new(PipelineKind::Paste, paste),
        }
    }

    pub fn from_config(config: &FieldConfig) -> Self {
        Self::new(config.use_markup_filters)
    }

    pub fn get(&self, kind: PipelineKind) -> &Pipeline {
        match kind {
            PipelineKind::Input => &self.input,
            PipelineKind::Output => &self.output,
            PipelineKind::Paste => &self.paste,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn stage_order_without_markup_filters() {
        let p = Pipelines::new(false);

        assert_eq!(p.input.stage_names(), vec!["protect_annotations"]);
        assert_eq!(
            p.output.stage_names(),
            vec!["correct_markup", "unprotect_annotations", "correct_markup"]
        );
        assert_eq!(
            p.paste.stage_names(),
            vec!["block_level_paste", "inline_level_paste", "protect_annotations"]
        );
    }

    #[test]
    fn stage_order_with_markup_filters() {
        let p = Pipelines::new(true);

        assert_eq!(
            p.input.stage_names(),
            vec!["markup_tags_in", "protect_annotations"]
        );
        assert_eq!(
            p.output.stage_names(),
            vec![
                "correct_markup",
                "unprotect_annotations",
                "markup_tags_out",
                "correct_markup"
            ]
        );
        assert_eq!(
            p.paste.stage_names(),
            vec![
                "block_level_paste",
                "markup_tags_in",
                "inline_level_paste",
                "protect_annotations"
            ]
        );
    }

    #[test]
    fn normalization_example() {
        let p = Pipelines::new(false);
        assert_snapshot!(p.output.run_html("<i>s</i><i>ix</i>  <b></b>"), @"<i>six</i>");
    }

    #[test]
    fn paste_sanitization_example() {
        let p = Pipelines::new(false);
        assert_snapshot!(
            p.paste.run_html("<div><script>x</script><p>Hello <b>world</b></p></div>"),
            @"<br><br>Hello <b>world</b>"
        );
    }

    #[test]
    fn input_then_output_restores_markup() {
        let p = Pipelines::new(true);
        let server = r#"<strong>A</strong> <abbr title="B">b</abbr> <a href="http://c.org">c</a>"#;

        let editable = p.input.run_html(server);
        assert_snapshot!(
            editable,
            @r#"<b>A</b> <a data-mf-tag="abbr" class="mf-abbr" href="" title="B">b</a> <a href="http://c.org" data-mf-url="http://c.org" data-mf-tag="a" class="mf-a">c</a>"#
        );
        assert_eq!(p.output.run_html(&editable), server);
    }

    #[rstest]
    #[case::twins_and_blanks("<i>s</i><i>ix</i>  <b></b>")]
    #[case::misnested("<b>a<i>b</b>c</i>")]
    #[case::stray_less_than("1 < 2 <b>x</b>")]
    #[case::nbsp_runs("a&nbsp;&nbsp; <u>&nbsp;</u> b<br><br>")]
    #[case::edit_mode_link(r#"<a data-mf-tag="a" class="mf-a" href="/x" data-mf-url="/y">y</a> <a data-mf-tag="a" class="mf-a" href="/x" data-mf-url="/y">z</a>"#)]
    #[case::phrase_annotation(r#"<a data-mf-tag="acronym" class="mf-acronym" href="" title="T">t</a>"#)]
    #[case::strong_and_em("<strong>s</strong><b>b</b> <em>e</em>")]
    #[case::paragraphs("<p>one</p><p>two</p>")]
    #[case::nbsp_only_element("<b>\u{a0}</b>x")]
    #[case::smart_quotes("“x” – <i>café</i>")]
    fn output_is_idempotent(#[case] input: &str, #[values(false, true)] use_markup_filters: bool) {
        let p = Pipelines::new(use_markup_filters);

        let once = p.output.run_html(input);

        assert_eq!(p.output.run_html(&once), once);
    }

    #[test]
    fn protected_url_survives_output_then_input() {
        // Given an edit-mode link whose href was rewritten by the surface
        let p = Pipelines::new(false);
        let edited = r#"see <a data-mf-tag="a" class="mf-a" href="../../rewritten" data-mf-url="http://u.org/">u</a>"#;

        // When it is posted and loaded again
        let posted = p.output.run_html(edited);
        let reloaded = p.input.run_html(&posted);

        // Then the link points at the protected destination
        assert_eq!(posted, r#"see <a href="http://u.org/">u</a>"#);
        let dom = Dom::parse(&reloaded);
        let link = dom.elements_by_tag(dom.root(), "a")[0];
        assert_eq!(dom.attr(link, "href"), Some("http://u.org/"));
        assert_eq!(dom.attr(link, annotation::URL_ATTR), Some("http://u.org/"));
    }
}
