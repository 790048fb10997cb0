//! Editing inside a nested frame document in design mode.
//!
//! The container is hidden and a frame is inserted after it. The frame's
//! document loads asynchronously, so the engine polls it on a fixed
//! interval: once it is ready the edit root is built inside its body, the
//! container's content and styles are copied in and the surface becomes
//! active. Polling stops after [`RetryPolicy::max_attempts`], leaving the
//! field in [`EngineState::Failed`].
//!
//! Styles that shape the text (padding, alignment, fonts, colors) belong to
//! the nested body; the rest (size, border) to the frame element.

use crate::annotation;
use crate::dom::{Dom, NodeId, Position, Range};
use crate::keymap::{KeyEvent, codes};
use crate::page::Page;
use crate::scheduler::TaskKind;

use super::{
    EngineAdapter, EngineContext, EngineError, EngineKind, EngineState, History, RetryPolicy,
    common,
};

/// Class of the element that holds the content inside the nested body.
pub const EDIT_ROOT_CLASS: &str = "mf-edit-root";
pub const FRAME_CLASS: &str = "mf-frame";

/// Style properties applied to the nested body rather than the frame.
pub const BODY_STYLES: &[&str] = &[
    "padding-left",
    "padding-right",
    "text-align",
    "color",
    "font-family",
    "font-size",
    "font-weight",
    "font-style",
    "line-height",
    "background-color",
];

fn is_body_style(prop: &str) -> bool {
    BODY_STYLES.contains(&prop)
}

/// The frame's document once it has loaded.
#[derive(Debug)]
struct FrameDocument {
    dom: Dom,
    body: NodeId,
    edit_root: NodeId,
}

#[derive(Debug)]
pub struct IsolatedDocument {
    field: String,
    container: NodeId,
    frame: Option<NodeId>,
    doc: Option<FrameDocument>,
    frame_head: String,
    state: EngineState,
    retry: RetryPolicy,
    history: History,
}

impl IsolatedDocument {
    pub fn new(field: &str, container: NodeId, frame_head: &str, retry: RetryPolicy) -> Self {
        Self {
            field: field.to_string(),
            container,
            frame: None,
            doc: None,
            frame_head: frame_head.to_string(),
            state: EngineState::Uninitialized,
            retry,
            history: History::default(),
        }
    }

    pub fn frame(&self) -> Option<NodeId> {
        self.frame
    }

    /// The nested document's body, once loaded.
    pub fn body(&self) -> Option<NodeId> {
        self.doc.as_ref().map(|d| d.body)
    }

    fn insert_frame(&mut self, page: &mut Page) -> NodeId {
        let frame = page.dom.create_element("iframe");
        page.dom.set_attr(frame, "id", &format!("{}_frame", self.field));
        page.dom.set_attr(frame, "class", FRAME_CLASS);
        page.dom.set_attr(frame, "frameborder", "0");
        for (prop, value) in page.dom.style_declarations(self.container) {
            if !is_body_style(&prop) {
                page.dom.set_style_property(frame, &prop, &value);
            }
        }
        page.dom.insert_after(self.container, frame);
        page.dom.set_style_property(self.container, "display", "none");
        frame
    }

    /// Builds the nested document: head, body with the container's text
    /// styles, and the edit root holding the container's content.
    fn build_structure(&mut self, page: &Page, ctx: &mut EngineContext<'_>) {
        let mut dom = Dom::parse(&format!(
            "<html><head>{}</head><body></body></html>",
            self.frame_head
        ));
        let root = dom.root();
        let body = match dom.elements_by_tag(root, "body").first() {
            Some(&body) => body,
            None => {
                let body = dom.create_element("body");
                dom.append_child(root, body);
                body
            }
        };
        for (prop, value) in page.dom.style_declarations(self.container) {
            if is_body_style(&prop) {
                dom.set_style_property(body, &prop, &value);
            }
        }
        let edit_root = dom.create_element("div");
        dom.set_attr(edit_root, "class", EDIT_ROOT_CLASS);
        dom.append_child(body, edit_root);
        for &child in page.dom.children(self.container) {
            let copy = dom.import(&page.dom, child);
            dom.append_child(edit_root, copy);
        }
        ctx.pipelines.input.run(&mut dom, edit_root);
        common::caret_at_end(&mut dom, edit_root);

        self.doc = Some(FrameDocument {
            dom,
            body,
            edit_root,
        });
    }

    /// Puts stray body content back into an edit root, recreating it when a
    /// deletion took it away. An emptied root gets a line break with the
    /// caret before it.
    fn ensure_edit_root(&mut self) {
        let Some(doc) = self.doc.as_mut() else {
            return;
        };
        let dom = &mut doc.dom;
        let intact = dom.parent(doc.edit_root) == Some(doc.body)
            && dom.children(doc.body).len() == 1;
        if intact {
            return;
        }
        let edit_root = dom.create_element("div");
        dom.set_attr(edit_root, "class", EDIT_ROOT_CLASS);
        for child in dom.children(doc.body).to_vec() {
            if child == doc.edit_root {
                dom.move_children(child, edit_root);
                dom.detach(child);
            } else {
                dom.append_child(edit_root, child);
            }
        }
        dom.append_child(doc.body, edit_root);
        doc.edit_root = edit_root;

        if dom.text_content(edit_root).is_empty() && dom.children(edit_root).is_empty() {
            let br = dom.create_element("br");
            dom.append_child(edit_root, br);
            dom.selection = Some(Range::collapsed(Position::new(edit_root, 0)));
        } else {
            common::caret_at_end(dom, edit_root);
        }
        log::debug!("recreated edit root of {}", self.field);
    }

    /// Keeps the caret off a line break that ends the content.
    fn tame_trailing_break(&mut self) {
        let Some(doc) = self.doc.as_mut() else {
            return;
        };
        let dom = &mut doc.dom;
        let root = doc.edit_root;
        let Some(last) = dom.last_child(root).filter(|&n| dom.is_tag(n, "br")) else {
            return;
        };
        let Some(caret) = common::selection_in(dom, root).filter(|r| r.is_collapsed()) else {
            return;
        };
        let before_break = Position::new(root, dom.index_in_parent(last).unwrap_or(0));
        if dom.compare_positions(caret.start, before_break) == std::cmp::Ordering::Greater {
            dom.selection = Some(Range::collapsed(before_break));
        }
    }
}

impl EngineAdapter for IsolatedDocument {
    fn kind(&self) -> EngineKind {
        EngineKind::IsolatedDocument
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn make_editable(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
    ) -> Result<(), EngineError> {
        if self.state != EngineState::Uninitialized {
            return Ok(());
        }
        self.frame = Some(self.insert_frame(page));
        self.state = EngineState::Loading { attempts: 0 };
        ctx.tasks.schedule(ctx.field, TaskKind::BootstrapPoll);
        log::debug!("field {} waiting for its frame document", ctx.field);
        Ok(())
    }

    fn poll_bootstrap(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
    ) -> Result<EngineState, EngineError> {
        let attempts = match self.state {
            EngineState::Loading { attempts } => attempts + 1,
            EngineState::StructureBuilt => {
                // Key, click and paste events of the nested document are
                // routed through the registry from here on.
                self.state = EngineState::EventsWired;
                ctx.tasks.schedule(ctx.field, TaskKind::BootstrapPoll);
                return Ok(self.state);
            }
            EngineState::EventsWired => {
                self.state = EngineState::Active;
                log::info!("field {} editable", ctx.field);
                return Ok(self.state);
            }
            other => return Ok(other),
        };

        if page.frame_load_polls.is_some_and(|polls| attempts >= polls) {
            self.build_structure(page, ctx);
            self.state = EngineState::StructureBuilt;
            ctx.tasks.schedule(ctx.field, TaskKind::BootstrapPoll);
            log::debug!("frame document of field {} ready after {attempts} polls", ctx.field);
        } else if attempts >= self.retry.max_attempts {
            self.state = EngineState::Failed;
            log::warn!(
                "frame document of field {} not ready after {attempts} polls, giving up",
                ctx.field
            );
            return Err(EngineError::BootstrapTimedOut {
                field: ctx.field.to_string(),
                attempts,
            });
        } else {
            self.state = EngineState::Loading { attempts };
            ctx.tasks.schedule(ctx.field, TaskKind::BootstrapPoll);
        }
        Ok(self.state)
    }

    fn surface<'a>(&'a self, _page: &'a Page) -> Option<(&'a Dom, NodeId)> {
        let doc = self.doc.as_ref().filter(|_| self.is_active())?;
        Some((&doc.dom, doc.edit_root))
    }

    fn surface_mut<'a>(&'a mut self, _page: &'a mut Page) -> Option<(&'a mut Dom, NodeId)> {
        if !self.is_active() {
            return None;
        }
        let doc = self.doc.as_mut()?;
        Some((&mut doc.dom, doc.edit_root))
    }

    fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    fn style(&self, page: &Page, prop: &str) -> Option<String> {
        match (&self.doc, self.frame) {
            (Some(doc), _) if is_body_style(prop) => doc.dom.style_property(doc.body, prop),
            (_, Some(frame)) if !is_body_style(prop) => page.dom.style_property(frame, prop),
            _ => page.dom.style_property(self.container, prop),
        }
    }

    fn set_style(&mut self, page: &mut Page, prop: &str, value: &str) {
        match (&mut self.doc, self.frame) {
            (Some(doc), _) if is_body_style(prop) => {
                doc.dom.set_style_property(doc.body, prop, value)
            }
            (_, Some(frame)) if !is_body_style(prop) => {
                page.dom.set_style_property(frame, prop, value)
            }
            _ => page.dom.set_style_property(self.container, prop, value),
        }
    }

    /// Native undo drops the annotation class, so it is put back.
    fn undo(&mut self, page: &mut Page) -> Result<(), EngineError> {
        let current = self
            .surface(page)
            .map(|(dom, root)| dom.inner_html(root))
            .ok_or(EngineError::NotReady)?;
        if let Some(previous) = self.history.undo(current)
            && let Some((dom, root)) = self.surface_mut(page)
        {
            dom.set_inner_html(root, &previous);
            annotation::restore_classes(dom, root);
            common::caret_at_end(dom, root);
        }
        Ok(())
    }

    fn native_key(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
        event: &KeyEvent,
    ) -> Result<(), EngineError> {
        if !self.is_active() {
            return Err(EngineError::NotReady);
        }
        let deleting = !event.ctrl
            && !event.alt
            && matches!(event.code, codes::BACKSPACE | codes::DELETE);

        if deleting {
            self.record_history(page);
            let Some(doc) = self.doc.as_mut() else {
                return Err(EngineError::NotReady);
            };
            let body_range = doc.dom.selection.filter(|sel| {
                doc.dom.is_within(sel.start, doc.body)
                    && common::selection_in(&doc.dom, doc.edit_root).is_none()
            });
            match body_range {
                Some(range) => {
                    let at = doc.dom.delete_contents(range);
                    doc.dom.selection = Some(Range::collapsed(at));
                }
                None => common::native_key(&mut doc.dom, doc.edit_root, event),
            }
            self.ensure_edit_root();
            return Ok(());
        }

        if event.code == codes::DOWN && !event.shift {
            ctx.tasks.schedule(ctx.field, TaskKind::TameTrailingBreak);
        }
        if event.code == codes::ENTER {
            self.record_history(page);
        }
        let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        common::native_key(dom, root, event);
        Ok(())
    }

    fn run_task(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
        task: &TaskKind,
    ) -> Result<(), EngineError> {
        match task {
            TaskKind::BootstrapPoll => self.poll_bootstrap(page, ctx).map(|_| ()),
            TaskKind::TameTrailingBreak => {
                self.tame_trailing_break();
                Ok(())
            }
            TaskKind::Reselect(bookmark) => {
                self.restore_bookmark(page, bookmark);
                Ok(())
            }
            TaskKind::ReleaseSelectAll => Ok(()),
        }
    }
}
