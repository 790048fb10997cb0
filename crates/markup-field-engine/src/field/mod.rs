//! Field controller.
//!
//! A [`Field`] is one editable container: its resolved options, engine,
//! pipelines, keymap and the hidden inputs it posts through. Fields are
//! created and driven by the [`FieldRegistry`], which owns every field of a
//! page and enforces that at most one is focused.
//!
//! ## Modules
//!
//! - [`hooks`]: focus, blur and submit callbacks
//! - [`registry`]: the registry and its event entry points

pub mod hooks;
pub mod registry;

pub use hooks::{DefaultHooks, FieldHooks, HookContext};
pub use registry::{ExternalLinkTarget, FieldRegistry};

use std::rc::Rc;

use markup_field_config::FieldConfig;
use thiserror::Error;

use crate::bookmark::Bookmark;
use crate::dom::NodeId;
use crate::dom::style::px;
use crate::engine::{EngineAdapter, EngineContext, EngineError, common};
use crate::filters::Pipelines;
use crate::host::RequestError;
use crate::keymap::Keymap;
use crate::l10n::Lexicon;
use crate::page::Page;
use crate::postback::{Alignment, Postback};
use crate::scheduler::{TaskKind, TaskQueue};

use registry::Shared;

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("container of field {0} is not inside a form")]
    OutsideForm(String),
    #[error("container element not found in the page")]
    ContainerNotFound,
    #[error("a field with id {0} already exists")]
    DuplicateId(String),
    #[error("no field with id {0}")]
    UnknownField(String),
    #[error("no form with id {0}")]
    UnknownForm(String),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// The hidden inputs a field posts its value, indent and alignment through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HiddenInputs {
    pub value: NodeId,
    pub indent: NodeId,
    pub align: NodeId,
}

/// Select-all toggle: while held, the selection from before is kept to put
/// back on the second toggle or a click.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SelectAll {
    #[default]
    Released,
    Held(Option<Bookmark>),
}

#[derive(Debug)]
pub struct Field {
    id: String,
    config: FieldConfig,
    form: NodeId,
    container: NodeId,
    inputs: HiddenInputs,
    engine: Box<dyn EngineAdapter>,
    pipelines: Pipelines,
    keymap: Keymap,
    hooks: Rc<dyn FieldHooks>,
    lexicon: Lexicon,
    /// Selection when the field last lost focus.
    bookmark: Option<Bookmark>,
    select_all: SelectAll,
}

impl Field {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    pub fn form(&self) -> NodeId {
        self.form
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn inputs(&self) -> HiddenInputs {
        self.inputs
    }

    pub fn engine(&self) -> &dyn EngineAdapter {
        self.engine.as_ref()
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn select_all(&self) -> &SelectAll {
        &self.select_all
    }

    /// Runs `f` with the engine and an editing context for this field.
    fn run<R>(
        &mut self,
        shared: &mut Shared,
        f: impl FnOnce(&mut dyn EngineAdapter, &mut EngineContext<'_>) -> R,
    ) -> R {
        let mut ctx = EngineContext {
            field: &self.id,
            tasks: &mut shared.tasks,
            pipelines: &self.pipelines,
            clipboard: &mut shared.clipboard,
        };
        f(self.engine.as_mut(), &mut ctx)
    }

    /// The content as it would be posted: the output pipeline over a copy of
    /// the edit root, or of the container before the surface exists.
    pub fn value(&self, page: &Page) -> String {
        let (dom, root) = self
            .engine
            .surface(page)
            .unwrap_or((&page.dom, self.container));
        let mut copy = common::detached_copy(dom, root);
        let copy_root = copy.root();
        self.pipelines.output.run(&mut copy, copy_root);
        copy.inner_html(copy_root)
    }

    /// Replaces the content, running the input pipeline over it.
    fn set_value(&mut self, page: &mut Page, html: &str) {
        self.engine.record_history(page);
        match self.engine.surface_mut(page) {
            Some((dom, root)) => {
                dom.set_inner_html(root, html);
                self.pipelines.input.run(dom, root);
                common::caret_at_end(dom, root);
            }
            None => page.dom.set_inner_html(self.container, html),
        }
    }

    /// Left and right padding in pixels.
    pub fn indent(&self, page: &Page) -> i32 {
        self.engine
            .style(page, "padding-left")
            .as_deref()
            .and_then(px)
            .unwrap_or(0)
    }

    pub fn alignment(&self, page: &Page) -> Alignment {
        self.engine
            .style(page, "text-align")
            .map(|v| Alignment::parse(&v))
            .unwrap_or_default()
    }

    pub fn postback(&self, page: &Page) -> Postback {
        Postback {
            html: self.value(page),
            indent: self.indent(page),
            align: self.alignment(page),
        }
    }

    /// Writes the postback values into the hidden inputs.
    fn store_postback(&self, page: &mut Page) {
        let postback = self.postback(page);
        page.set_input_value(self.inputs.value, &postback.html);
        page.set_input_value(self.inputs.indent, &postback.indent.to_string());
        page.set_input_value(self.inputs.align, postback.align.as_str());
    }

    /// Moves the padding on both sides by `steps` indent steps (negative
    /// outdents). A pixel width shrinks by twice the amount added.
    fn indent_by(&mut self, page: &mut Page, steps: i32) {
        let step = i32::try_from(self.config.indent_size).unwrap_or(i32::MAX);
        let old = self.indent(page);
        let new = old.saturating_add(steps.saturating_mul(step)).max(0);
        let applied = new - old;
        let padding = format!("{new}px");
        self.engine.set_style(page, "padding-left", &padding);
        self.engine.set_style(page, "padding-right", &padding);
        if let Some(width) = self.engine.style(page, "width").as_deref().and_then(px) {
            let width = format!("{}px", width - 2 * applied);
            self.engine.set_style(page, "width", &width);
        }
        self.engine.after_block_style(page);
    }

    fn align(&mut self, page: &mut Page, alignment: Alignment) {
        self.engine.set_style(page, "text-align", alignment.as_str());
        self.engine.after_block_style(page);
    }

    fn toggle_select_all(&mut self, page: &mut Page) {
        match std::mem::take(&mut self.select_all) {
            SelectAll::Held(saved) => {
                if let Some(bookmark) = saved {
                    self.engine.restore_bookmark(page, &bookmark);
                }
            }
            SelectAll::Released => {
                let saved = self.engine.capture_bookmark(page);
                self.engine.select_all(page);
                self.select_all = SelectAll::Held(saved);
            }
        }
    }

    /// Puts back the selection from before select-all, after a click.
    fn restore_select_all(&mut self, page: &mut Page) {
        if let SelectAll::Held(Some(bookmark)) = std::mem::take(&mut self.select_all) {
            self.engine.restore_bookmark(page, &bookmark);
        }
    }

    /// Typing while select-all is held releases it shortly after, keeping
    /// the caret where typing left it.
    fn schedule_select_all_release(&self, tasks: &mut TaskQueue) {
        if matches!(self.select_all, SelectAll::Held(_))
            && !tasks.has_pending(&self.id, &TaskKind::ReleaseSelectAll)
        {
            tasks.schedule(&self.id, TaskKind::ReleaseSelectAll);
        }
    }
}
