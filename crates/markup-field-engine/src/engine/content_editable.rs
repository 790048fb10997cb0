//! Editing the container in place.
//!
//! The container is the edit root. Its selection is the page selection,
//! which any other field or dialog may move, so the engine bookmarks the
//! selection after every key-up and click and puts it back before markup
//! commands and after alignment or indent changes.

use crate::bookmark::Bookmark;
use crate::dom::{Dom, NodeId, Range};
use crate::page::Page;

use super::{EngineAdapter, EngineContext, EngineError, EngineKind, EngineState, History};

#[derive(Debug)]
pub struct ContentEditable {
    container: NodeId,
    state: EngineState,
    history: History,
    bookmark: Option<Bookmark>,
}

impl ContentEditable {
    pub fn new(container: NodeId) -> Self {
        Self {
            container,
            state: EngineState::Uninitialized,
            history: History::default(),
            bookmark: None,
        }
    }

    fn restore_stored(&mut self, page: &mut Page) {
        if let Some(bookmark) = self.bookmark.clone() {
            self.restore_bookmark(page, &bookmark);
        }
    }
}

impl EngineAdapter for ContentEditable {
    fn kind(&self) -> EngineKind {
        EngineKind::ContentEditable
    }

    fn state(&self) -> EngineState {
        self.state
    }

    fn make_editable(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
    ) -> Result<(), EngineError> {
        if self.state == EngineState::Active {
            return Ok(());
        }
        page.dom.set_attr(self.container, "contenteditable", "true");
        ctx.pipelines.input.run(&mut page.dom, self.container);
        self.state = EngineState::Active;
        log::info!("field {} editable in place", ctx.field);
        Ok(())
    }

    fn surface<'a>(&'a self, page: &'a Page) -> Option<(&'a Dom, NodeId)> {
        self.is_active().then_some((&page.dom, self.container))
    }

    fn surface_mut<'a>(&'a mut self, page: &'a mut Page) -> Option<(&'a mut Dom, NodeId)> {
        self.is_active().then_some((&mut page.dom, self.container))
    }

    fn history_mut(&mut self) -> &mut History {
        &mut self.history
    }

    fn style(&self, page: &Page, prop: &str) -> Option<String> {
        page.dom.style_property(self.container, prop)
    }

    fn set_style(&mut self, page: &mut Page, prop: &str, value: &str) {
        page.dom.set_style_property(self.container, prop, value);
    }

    fn binds_enter(&self) -> bool {
        true
    }

    fn note_selection(&mut self, page: &Page) {
        if let Some(bookmark) = self.capture_bookmark(page) {
            self.bookmark = Some(bookmark);
        }
    }

    fn restore_bookmark(&mut self, page: &mut Page, bookmark: &Bookmark) {
        if let Some((dom, root)) = self.surface_mut(page) {
            bookmark.restore(dom, root);
        }
        self.bookmark = Some(bookmark.clone());
    }

    fn before_markup(&mut self, page: &mut Page) {
        self.restore_stored(page);
    }

    fn after_markup(
        &mut self,
        page: &mut Page,
        _ctx: &mut EngineContext<'_>,
        _range: Option<Range>,
    ) {
        self.note_selection(page);
    }

    fn after_block_style(&mut self, page: &mut Page) {
        self.restore_stored(page);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;
    use crate::engine::{Clipboard, common};
    use crate::filters::Pipelines;
    use crate::scheduler::TaskQueue;
    use pretty_assertions::assert_eq;

    fn setup(html: &str) -> (Page, ContentEditable, TaskQueue, Pipelines, Clipboard) {
        let page = Page::new(&format!(r#"<form><div id="f">{html}</div></form><p id="elsewhere">x</p>"#));
        let container = page.element("f").unwrap();
        (
            page,
            ContentEditable::new(container),
            TaskQueue::new(),
            Pipelines::new(false),
            Clipboard::default(),
        )
    }

    #[test]
    fn markup_applies_to_the_stored_selection() {
        // Given an active field where "two" was selected by the user
        let (mut page, mut engine, mut tasks, pipelines, mut clipboard) = setup("one two");
        let mut ctx = EngineContext {
            field: "f",
            tasks: &mut tasks,
            pipelines: &pipelines,
            clipboard: &mut clipboard,
        };
        engine.make_editable(&mut page, &mut ctx).unwrap();
        let (dom, root) = engine.surface_mut(&mut page).unwrap();
        dom.selection = Some(common::range_between(dom, root, 4, 7));
        engine.note_selection(&page);

        // When the page selection moves elsewhere before the command runs
        let elsewhere = page.element("elsewhere").unwrap();
        page.dom.selection = Some(page.dom.select_contents(elsewhere));
        engine.exec_command(&mut page, &mut ctx, Command::Bold).unwrap();

        // Then the stored selection is the one formatted
        let (dom, root) = engine.surface(&page).unwrap();
        assert_eq!(dom.inner_html(root), "one <b>two</b>");
    }

    #[test]
    fn container_becomes_the_edit_root() {
        let (mut page, mut engine, mut tasks, pipelines, mut clipboard) =
            setup(r#"<abbr title="World Wide Web">WWW</abbr>"#);
        let mut ctx = EngineContext {
            field: "f",
            tasks: &mut tasks,
            pipelines: &pipelines,
            clipboard: &mut clipboard,
        };
        assert!(engine.surface(&page).is_none());

        engine.make_editable(&mut page, &mut ctx).unwrap();

        let container = page.element("f").unwrap();
        assert_eq!(engine.state(), EngineState::Active);
        assert_eq!(page.dom.attr(container, "contenteditable"), Some("true"));
        assert!(
            page.dom
                .inner_html(container)
                .starts_with(r#"<a data-mf-tag="abbr" class="mf-abbr""#)
        );
        assert!(engine.binds_enter());
        assert!(!engine.supports(Command::Paste));
    }
}
