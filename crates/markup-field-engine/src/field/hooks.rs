use std::fmt;

use crate::engine::EngineAdapter;
use crate::page::Page;

/// What a hook may touch: the field's page and its editing surface.
pub struct HookContext<'a> {
    pub id: &'a str,
    pub page: &'a mut Page,
    pub engine: &'a mut dyn EngineAdapter,
}

/// Callbacks run on focus, blur and form submission.
///
/// The defaults mark the focused field with an inset border.
pub trait FieldHooks: fmt::Debug {
    fn on_focus(&self, ctx: &mut HookContext<'_>) {
        ctx.engine.set_style(ctx.page, "border-style", "inset");
    }

    fn on_blur(&self, ctx: &mut HookContext<'_>) {
        ctx.engine.set_style(ctx.page, "border-style", "solid");
    }

    fn on_submit(&self, _ctx: &mut HookContext<'_>) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHooks;

impl FieldHooks for DefaultHooks {}
