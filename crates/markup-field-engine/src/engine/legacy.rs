//! Editing the container through the legacy text-range selection model.
//!
//! Markup commands lose the selection on this substrate, so the range they
//! touched is re-selected by a follow-up task. Cut, copy and paste are
//! commands here: the engine keeps its own clipboard, and a paste whose
//! text differs from the last internal cut or copy came from another
//! application and is inserted as plain text.

use crate::bookmark::Bookmark;
use crate::commands::Command;
use crate::dom::{Dom, NodeId, Range};
use crate::page::Page;
use crate::scheduler::TaskKind;

use super::{
    Clipboard, EngineAdapter, EngineContext, EngineError, EngineKind, EngineState, History, common,
};

#[derive(Debug)]
pub struct LegacySelection {
    container: NodeId,
    state: EngineState,
    history: History,
}

impl LegacySelection {
    pub fn new(container: NodeId) -> Self {
        Self {
            container,
            state: EngineState::Uninitialized,
            history: History::default(),
        }
    }

    fn copy_selection(&self, page: &Page, clipboard: &mut Clipboard) -> Option<Range> {
        let (dom, root) = self.surface(page)?;
        let range = common::selection_in(dom, root).filter(|r| !r.is_collapsed())?;
        clipboard.html = dom.range_html(range);
        clipboard.text = dom.range_text(range);
        Some(range)
    }
}

impl EngineAdapter for LegacySelection {
    fn kind(&self) -> EngineKind {
        EngineKind::LegacySelection
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
        log::info!("field {} editable through text ranges", ctx.field);
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

    fn supports(&self, _command: Command) -> bool {
        true
    }

    fn after_markup(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
        range: Option<Range>,
    ) {
        let Some((dom, root)) = self.surface(page) else {
            return;
        };
        if let Some(bookmark) = range.and_then(|r| Bookmark::from_range(dom, root, r)) {
            ctx.tasks.schedule(ctx.field, TaskKind::Reselect(bookmark));
        }
    }

    /// Text ranges keep their extent when the field loses focus.
    fn collapse_to_end(&mut self, _page: &mut Page) {}

    fn clipboard_command(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
        command: Command,
    ) -> Result<(), EngineError> {
        match command {
            Command::Copy => {
                self.copy_selection(page, ctx.clipboard);
            }
            Command::Cut => {
                if let Some(range) = self.copy_selection(page, ctx.clipboard) {
                    self.record_history(page);
                    let (dom, _) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
                    let at = dom.delete_contents(range);
                    dom.selection = Some(Range::collapsed(at));
                }
            }
            Command::Paste => {
                let html = ctx.clipboard.html.clone();
                if !html.is_empty() {
                    self.record_history(page);
                    let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
                    common::paste_html(dom, root, &ctx.pipelines.paste, &html);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn paste(
        &mut self,
        page: &mut Page,
        ctx: &mut EngineContext<'_>,
        html: &str,
    ) -> Result<(), EngineError> {
        self.record_history(page);
        let text = common::plain_text(html);
        let (dom, root) = self.surface_mut(page).ok_or(EngineError::NotReady)?;
        if text == ctx.clipboard.text {
            common::paste_html(dom, root, &ctx.pipelines.paste, html);
        } else {
            log::debug!("external paste into {}, inserting text only", ctx.field);
            common::insert_text(dom, root, &text);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::Pipelines;
    use crate::scheduler::TaskQueue;
    use pretty_assertions::assert_eq;

    struct Fixture {
        page: Page,
        engine: LegacySelection,
        tasks: TaskQueue,
        pipelines: Pipelines,
        clipboard: Clipboard,
    }

    impl Fixture {
        fn new(html: &str) -> Self {
            let page = Page::with_capabilities(
                &format!(r#"<form><div id="f">{html}</div></form>"#),
                crate::engine::HostCapabilities::legacy(),
            );
            let container = page.element("f").unwrap();
            let mut fixture = Self {
                page,
                engine: LegacySelection::new(container),
                tasks: TaskQueue::new(),
                pipelines: Pipelines::new(false),
                clipboard: Clipboard::default(),
            };
            fixture.with_ctx(|engine, page, ctx| engine.make_editable(page, ctx).unwrap());
            fixture
        }

        fn with_ctx<R>(
            &mut self,
            f: impl FnOnce(&mut LegacySelection, &mut Page, &mut EngineContext<'_>) -> R,
        ) -> R {
            let mut ctx = EngineContext {
                field: "f",
                tasks: &mut self.tasks,
                pipelines: &self.pipelines,
                clipboard: &mut self.clipboard,
            };
            f(&mut self.engine, &mut self.page, &mut ctx)
        }

        fn select(&mut self, start: usize, end: usize) {
            let (dom, root) = self.engine.surface_mut(&mut self.page).unwrap();
            dom.selection = Some(common::range_between(dom, root, start, end));
        }

        fn html(&self) -> String {
            let (dom, root) = self.engine.surface(&self.page).unwrap();
            dom.inner_html(root)
        }
    }

    #[test]
    fn markup_schedules_a_reselect() {
        let mut fx = Fixture::new("one two");
        fx.select(0, 3);

        fx.with_ctx(|e, p, ctx| e.exec_command(p, ctx, Command::Italic).unwrap());

        assert_eq!(fx.html(), "<i>one</i> two");
        assert_eq!(fx.tasks.len(), 1);

        // The selection is lost, then the follow-up puts it back.
        fx.page.dom.selection = None;
        let task = fx.tasks.pop_due(crate::scheduler::RESELECT_MS).unwrap();
        fx.with_ctx(|e, p, ctx| e.run_task(p, ctx, &task.kind).unwrap());
        let sel = fx.page.dom.selection.unwrap();
        assert_eq!(fx.page.dom.range_text(sel), "one");
    }

    #[test]
    fn cut_then_paste_round_trips_markup() {
        let mut fx = Fixture::new("a <b>bold</b> move");
        fx.select(2, 6);

        fx.with_ctx(|e, p, ctx| e.exec_command(p, ctx, Command::Cut).unwrap());
        assert_eq!(fx.html(), "a  move");
        assert_eq!(fx.clipboard.text, "bold");

        fx.select(7, 7);
        fx.with_ctx(|e, p, ctx| e.exec_command(p, ctx, Command::Paste).unwrap());
        assert_eq!(fx.html(), "a  move<b>bold</b>");
    }

    #[test]
    fn external_paste_inserts_text_only() {
        let mut fx = Fixture::new("x");
        fx.select(1, 1);

        fx.with_ctx(|e, p, ctx| e.paste(p, ctx, "<b>loud</b> <i>words</i>").unwrap());

        assert_eq!(fx.html(), "xloud words");
    }

    #[test]
    fn collapsing_keeps_the_range() {
        let mut fx = Fixture::new("abc");
        fx.select(0, 2);

        fx.engine.collapse_to_end(&mut fx.page);

        assert!(!fx.page.dom.selection.unwrap().is_collapsed());
        assert!(fx.engine.supports(Command::Cut));
    }
}
