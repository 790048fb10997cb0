//! Editing substrates behind one interface.
//!
//! A host offers one of three ways to edit markup in place. Each is an
//! [`EngineAdapter`], picked once per field by probing the host's
//! [`HostCapabilities`]:
//!
//! - [`isolated::IsolatedDocument`]: a nested frame document in design mode,
//!   loaded asynchronously and polled until ready
//! - [`content_editable::ContentEditable`]: the container itself, edited in
//!   place with standard selections
//! - [`legacy::LegacySelection`]: the container edited through the legacy
//!   text-range selection model
//!
//! All three share the annotation protocol, the filter pipelines and the
//! bookmark scheme, so the values a field posts do not depend on the engine.
//!
//! ## Modules
//!
//! - [`common`]: editing operations over an edit root
//! - [`history`]: the bounded native undo stack

pub mod common;
pub mod content_editable;
pub mod history;
pub mod isolated;
pub mod legacy;

use std::fmt;

use markup_field_config::FieldConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::Annotation;
use crate::bookmark::Bookmark;
use crate::commands::{Binding, Command};
use crate::dom::{Dom, NodeId, Range};
use crate::filters::Pipelines;
use crate::keymap::{KeyEvent, codes};
use crate::page::Page;
use crate::scheduler::{TaskKind, TaskQueue};

pub use content_editable::ContentEditable;
pub use history::History;
pub use isolated::IsolatedDocument;
pub use legacy::LegacySelection;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("the host offers no supported way to edit markup")]
    Unsupported,
    #[error("editing surface of field {field} not ready after {attempts} attempts")]
    BootstrapTimedOut { field: String, attempts: u32 },
    #[error("editing surface is not ready")]
    NotReady,
    #[error("nothing is selected")]
    NothingSelected,
    #[error("no annotation at the selection")]
    NoAnnotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    IsolatedDocument,
    ContentEditable,
    LegacySelection,
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EngineKind::IsolatedDocument => "isolated-document",
            EngineKind::ContentEditable => "content-editable",
            EngineKind::LegacySelection => "legacy-selection",
        })
    }
}

/// Lifecycle of an editing surface. Direct engines go straight from
/// `Uninitialized` to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Loading { attempts: u32 },
    StructureBuilt,
    EventsWired,
    Active,
    Failed,
}

/// What the host environment supports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    pub design_mode: bool,
    pub content_editable: bool,
    pub w3c_selection: bool,
    pub legacy_text_range: bool,
}

impl HostCapabilities {
    pub fn design_mode() -> Self {
        Self {
            design_mode: true,
            content_editable: true,
            w3c_selection: true,
            legacy_text_range: false,
        }
    }

    pub fn content_editable() -> Self {
        Self {
            design_mode: false,
            content_editable: true,
            w3c_selection: true,
            legacy_text_range: false,
        }
    }

    pub fn legacy() -> Self {
        Self {
            design_mode: false,
            content_editable: true,
            w3c_selection: false,
            legacy_text_range: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    /// Picks the engine, preferring an isolated document.
    pub fn probe(&self) -> Result<EngineKind, EngineError> {
        if self.design_mode {
            Ok(EngineKind::IsolatedDocument)
        } else if self.content_editable && self.w3c_selection {
            Ok(EngineKind::ContentEditable)
        } else if self.legacy_text_range {
            Ok(EngineKind::LegacySelection)
        } else {
            Err(EngineError::Unsupported)
        }
    }
}

/// Bound on the readiness polls of an isolated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 200 }
    }
}

/// Content of the last internal cut or copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    pub html: String,
    pub text: String,
}

/// Field-level resources an engine may use while handling an event.
pub struct EngineContext<'a> {
    /// Id of the field being edited.
    pub field: &'a str,
    pub tasks: &'a mut TaskQueue,
    pub pipelines: &'a Pipelines,
    pub clipboard: &'a mut Clipboard,
}

/// One editing substrate.
///
/// Implementations provide the surface (a document and its edit root) and
/// their lifecycle; editing operations default to the shared ones in
/// [`common`] and are overridden where a substrate behaves differently.
pub trait EngineAdapter: fmt::Debug {
    fn kind(&self) -> EngineKind;

    fn state(&self) -> EngineState;

    fn is_active(&self) -> bool {
        self.state() == EngineState::Active
    }

    /// Turns the container into an editing surface, running the input
    /// pipeline over its content.
    fn make_editable(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
    ) -> Result<(), EngineError>;

    /// One step of an asynchronous bootstrap.
    fn poll_bootstrap(
        &mut self,
        _page: &mut Page,
        _ctx: &mut EngineContext<'_>,
    ) -> Result<EngineState, EngineError> {
        Ok(self.state())
    }

    /// The document being edited and its edit root, once active.
    fn surface<'a>(&'a self, page: &'a Page) -> Option<(&'a Dom, NodeId)>;

    fn surface_mut<'a>(&'a mut self, page: &'a mut Page) -> Option<(&'a mut Dom, NodeId)>;

    fn history_mut(&mut self) -> &mut History;

    fn style(&self, page: &Page, prop: &str) -> Option<String>;

    fn set_style(&mut self, page: &mut Page, prop: &str, value: &str);

    fn supports(&self, command: Command) -> bool {
        !command.is_clipboard()
    }

    /// Whether `enter` is bound in multi-line fields too, because the
    /// native line break of the surface is not a `<br>`.
    fn binds_enter(&self) -> bool {
        false
    }

    fn capture_bookmark(&self, page: &Page) -> Option<Bookmark> {
        let (dom, root) = self.surface(page)?;
        Bookmark::capture(dom, root)
    }

    fn restore_bookmark(&mut self, page: &mut Page, bookmark: &Bookmark) {
        if let Some((dom, root)) = self.surface_mut(page) {
            bookmark.restore(dom, root);
        }
    }

    /// Called after the user moved the selection or typed.
    fn note_selection(&mut self, _page: &Page) {}

    fn find_annotation_at_selection(&self, page: &Page) -> Option<NodeId> {
        let (dom, root) = self.surface(page)?;
        common::find_annotation(dom, root)
    }

    fn insert_annotation(
        &mut self,
        page: &mut Page,
        annotation: &Annotation,
    ) -> Result<NodeId, EngineError> {
        self.record_history(page);
        let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        common::insert_annotation(dom, root, annotation)
    }

    fn update_annotation(
        &mut self,
        page: &mut Page,
        el: NodeId,
        annotation: &Annotation,
    ) -> Result<(), EngineError> {
        self.record_history(page);
        let (dom, _) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        annotation.write(dom, el);
        Ok(())
    }

    fn delete_annotation(&mut self, page: &mut Page) -> Result<(), EngineError> {
        if self.find_annotation_at_selection(page).is_none() {
            return Err(EngineError::NoAnnotation);
        }
        self.record_history(page);
        let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        common::delete_annotation(dom, root)
    }

    /// Runs an editing command of the surface: inline markup, undo/redo and
    /// the clipboard. Other commands are handled by the field.
    fn exec_command(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
        command: Command,
    ) -> Result<(), EngineError> {
        if !self.is_active() {
            return Err(EngineError::NotReady);
        }
        if let Some(tag) = command.inline_tag() {
            self.before_markup(page);
            self.record_history(page);
            let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
            let range = common::toggle_inline(dom, root, tag);
            self.after_markup(page, ctx, range);
            return Ok(());
        }
        match command {
            Command::Undo => self.undo(page),
            Command::Redo => self.redo(page),
            Command::Cut | Command::Copy | Command::Paste => {
                self.clipboard_command(page, ctx, command)
            }
            other => {
                log::debug!("{} does not run {other}", self.kind());
                Ok(())
            }
        }
    }

    /// Called before inline markup is applied.
    fn before_markup(&mut self, _page: &mut Page) {}

    /// Called after inline markup was applied to `range`.
    fn after_markup(
        &mut self,
        _page: &mut Page,
        _ctx: &mut EngineContext<'_>,
        _range: Option<Range>,
    ) {
    }

    /// Called after alignment or indent changed.
    fn after_block_style(&mut self, _page: &mut Page) {}

    fn clipboard_command(
        &mut self,
        _page: &mut Page,
        _ctx: &mut EngineContext<'_>,
        command: Command,
    ) -> Result<(), EngineError> {
        log::debug!("{command} left to the host on {}", self.kind());
        Ok(())
    }

    /// Snapshots the content for undo.
    fn record_history(&mut self, page: &Page) {
        let Some(html) = self.surface(page).map(|(dom, root)| dom.inner_html(root)) else {
            return;
        };
        self.history_mut().record(html);
    }

    fn undo(&mut self, page: &mut Page) -> Result<(), EngineError> {
        let current = self
            .surface(page)
            .map(|(dom, root)| dom.inner_html(root))
            .ok_or(EngineError::NotReady)?;
        if let Some(previous) = self.history_mut().undo(current) {
            replace_content(self.surface_mut(page), &previous);
        }
        Ok(())
    }

    fn redo(&mut self, page: &mut Page) -> Result<(), EngineError> {
        let current = self
            .surface(page)
            .map(|(dom, root)| dom.inner_html(root))
            .ok_or(EngineError::NotReady)?;
        if let Some(next) = self.history_mut().redo(current) {
            replace_content(self.surface_mut(page), &next);
        }
        Ok(())
    }

    fn insert_text(&mut self, page: &mut Page, text: &str) -> Result<(), EngineError> {
        self.record_history(page);
        let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        common::insert_text(dom, root, text);
        Ok(())
    }

    fn insert_html(&mut self, page: &mut Page, html: &str) -> Result<(), EngineError> {
        self.record_history(page);
        let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        common::insert_html(dom, root, html);
        Ok(())
    }

    fn insert_line_break(&mut self, page: &mut Page) -> Result<(), EngineError> {
        self.record_history(page);
        let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        common::insert_line_break(dom, root);
        Ok(())
    }

    /// Inserts pasted foreign markup, cleaned by the paste pipeline.
    fn paste(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
        html: &str,
    ) -> Result<(), EngineError> {
        self.record_history(page);
        let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        common::paste_html(dom, root, &ctx.pipelines.paste, html);
        Ok(())
    }

    fn select_all(&mut self, page: &mut Page) {
        if let Some((dom, root)) = self.surface_mut(page) {
            common::select_all(dom, root);
        }
    }

    fn collapse_to_end(&mut self, page: &mut Page) {
        if let Some((dom, root)) = self.surface_mut(page) {
            common::collapse_to_end(dom, root);
        }
    }

    /// Gives an unhandled key to the surface.
    fn native_key(
        &mut self,
        page: &mut Page,
        _ctx: &mut EngineContext<'_>,
        event: &KeyEvent,
    ) -> Result<(), EngineError> {
        if matches!(event.code, codes::BACKSPACE | codes::DELETE | codes::ENTER) {
            self.record_history(page);
        }
        let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        common::native_key(dom, root, event);
        Ok(())
    }

    /// Called after a bound chord ran.
    fn after_key_dispatch(&mut self, page: &Page, _binding: &Binding) {
        self.note_selection(page);
    }

    fn after_key_up(&mut self, page: &Page, _event: &KeyEvent) {
        self.note_selection(page);
    }

    /// Runs a scheduled task of this engine.
    fn run_task(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
        task: &TaskKind,
    ) -> Result<(), EngineError> {
        match task {
            TaskKind::BootstrapPoll => self.poll_bootstrap(page, ctx).map(|_| ()),
            TaskKind::Reselect(bookmark) => {
                self.restore_bookmark(page, bookmark);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

fn replace_content(surface: Option<(&mut Dom, NodeId)>, html: &str) {
    if let Some((dom, root)) = surface {
        dom.set_inner_html(root, html);
        common::caret_at_end(dom, root);
    }
}

/// Builds the engine the host supports for a field.
pub fn create_adapter(
    capabilities: &HostCapabilities,
    field: &str,
    container: NodeId,
    config: &FieldConfig,
    retry: RetryPolicy,
) -> Result<Box<dyn EngineAdapter>, EngineError> {
    let kind = capabilities.probe()?;
    log::debug!("field {field} uses the {kind} engine");
    Ok(match kind {
        EngineKind::IsolatedDocument => Box::new(IsolatedDocument::new(
            field,
            container,
            &config.frame_head,
            retry,
        )),
        EngineKind::ContentEditable => Box::new(ContentEditable::new(container)),
        EngineKind::LegacySelection => Box::new(LegacySelection::new(container)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(HostCapabilities::design_mode(), Ok(EngineKind::IsolatedDocument))]
    #[case(HostCapabilities::content_editable(), Ok(EngineKind::ContentEditable))]
    #[case(HostCapabilities::legacy(), Ok(EngineKind::LegacySelection))]
    #[case(HostCapabilities::none(), Err(EngineError::Unsupported))]
    fn probe_order(
        #[case] capabilities: HostCapabilities,
        #[case] expected: Result<EngineKind, EngineError>,
    ) {
        pretty_assertions::assert_eq!(capabilities.probe(), expected);
    }

    #[test]
    fn kinds_display_kebab_case() {
        pretty_assertions::assert_eq!(EngineKind::LegacySelection.to_string(), "legacy-selection");
    }
}
