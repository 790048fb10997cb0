//! The registry of every field on a page.
//!
//! The registry is the single owner of field state: the fields themselves,
//! which one is focused, the timer queue, the internal clipboard, popups,
//! toolbars and the pending link targets. Host events arrive as method calls
//! and are routed to the field they concern.
//!
//! Focus moves through [`FieldRegistry::focus`] only, which runs the blur
//! sequence of the previous field before the focus sequence of the next, so
//! at most one field is ever focused.

use std::collections::BTreeMap;
use std::rc::Rc;

use markup_field_config::{ConfigLayer, FieldConfig, FieldType};

use crate::annotation::Annotation;
use crate::bookmark::Bookmark;
use crate::commands::{Binding, Command};
use crate::dom::NodeId;
use crate::engine::{
    Clipboard, EngineError, EngineKind, EngineState, RetryPolicy, common, create_adapter,
};
use crate::filters::Pipelines;
use crate::host::{FormSubmission, Notifier, RequestLayer};
use crate::keymap::{Dispatch, KeyEvent, Keymap};
use crate::l10n::{self, Lexicon, Localizer};
use crate::page::Page;
use crate::popup::{
    HelpRow, LinkDialog, LinkForm, LinkOutcome, PopupKind, PopupManager, help_rows, render_help,
    render_link_dialog,
};
use crate::postback::{Postback, input_names};
use crate::scheduler::{TaskKind, TaskQueue};
use crate::toolbar::{ButtonBar, SpecialCharBar, Toolbars};

use super::{DefaultHooks, Field, FieldError, FieldHooks, HiddenInputs, HookContext, SelectAll};

/// Resources every field's engine shares.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) tasks: TaskQueue,
    pub(crate) clipboard: Clipboard,
}

/// Where a link to a structured host object goes once the host has picked
/// the object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLinkTarget {
    pub field: String,
    pub bookmark: Option<Bookmark>,
}

pub struct FieldRegistry {
    fields: BTreeMap<String, Field>,
    /// Field ids in creation order.
    order: Vec<String>,
    focused: Option<String>,
    global: ConfigLayer,
    default_hooks: Rc<dyn FieldHooks>,
    retry: RetryPolicy,
    shared: Shared,
    notifier: Box<dyn Notifier>,
    popups: PopupManager,
    toolbars: Toolbars,
    link_dialog: Option<LinkDialog>,
    pending_external_link: Option<ExternalLinkTarget>,
    /// Set by a click inside a popup; swallows the window click that follows.
    cancel_next_window_click: bool,
}

/// Turns an editing error into what the user sees.
fn report(notifier: &dyn Notifier, lexicon: &Lexicon, id: &str, err: EngineError) {
    match err {
        EngineError::NothingSelected => notifier.notify(&lexicon.localize(l10n::SELECT_TEXT_FIRST)),
        EngineError::NoAnnotation => notifier.notify(&lexicon.localize(l10n::NO_ELEMENT_TO_DELETE)),
        EngineError::NotReady => log::debug!("field {id} is not editable yet"),
        other => log::warn!("field {id}: {other}"),
    }
}

impl FieldRegistry {
    pub fn new(global: ConfigLayer, notifier: Box<dyn Notifier>) -> Self {
        Self {
            fields: BTreeMap::new(),
            order: Vec::new(),
            focused: None,
            global,
            default_hooks: Rc::new(DefaultHooks),
            retry: RetryPolicy::default(),
            shared: Shared::default(),
            notifier,
            popups: PopupManager::new(),
            toolbars: Toolbars::default(),
            link_dialog: None,
            pending_external_link: None,
            cancel_next_window_click: false,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Hooks for fields created without their own.
    pub fn with_default_hooks(mut self, hooks: Rc<dyn FieldHooks>) -> Self {
        self.default_hooks = hooks;
        self
    }

    pub fn with_popups(mut self, popups: PopupManager) -> Self {
        self.popups = popups;
        self
    }

    // Accessors

    pub fn field(&self, id: &str) -> Option<&Field> {
        self.fields.get(id)
    }

    /// Field ids in creation order.
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused.as_deref()
    }

    pub fn popups(&self) -> &PopupManager {
        &self.popups
    }

    pub fn popups_mut(&mut self) -> &mut PopupManager {
        &mut self.popups
    }

    pub fn toolbars(&self) -> &Toolbars {
        &self.toolbars
    }

    pub fn tasks(&self) -> &TaskQueue {
        &self.shared.tasks
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.shared.clipboard
    }

    pub fn link_dialog(&self) -> Option<&LinkDialog> {
        self.link_dialog.as_ref()
    }

    pub fn pending_external_link(&self) -> Option<&ExternalLinkTarget> {
        self.pending_external_link.as_ref()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Field, FieldError> {
        self.fields
            .get_mut(id)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))
    }

    fn get(&self, id: &str) -> Result<&Field, FieldError> {
        self.fields
            .get(id)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))
    }

    // Lifecycle

    /// Turns `container` into a field and returns its id.
    ///
    /// Options are layered as built-in defaults, the global layer, the
    /// container's `type` attribute and finally `instance`.
    pub fn create(
        &mut self,
        page: &mut Page,
        container: NodeId,
        instance: &ConfigLayer,
        hooks: Option<Rc<dyn FieldHooks>>,
    ) -> Result<String, FieldError> {
        if page.dom.element(container).is_none() || !page.dom.is_attached(container) {
            return Err(FieldError::ContainerNotFound);
        }
        let id = match page.dom.attr(container, "id").filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => {
                let id = format!("mf-{}", uuid::Uuid::new_v4());
                page.dom.set_attr(container, "id", &id);
                id
            }
        };
        if self.fields.contains_key(&id) {
            return Err(FieldError::DuplicateId(id));
        }

        let type_layer = page
            .dom
            .attr(container, "type")
            .and_then(FieldType::from_attr)
            .map(ConfigLayer::with_type)
            .unwrap_or_default();
        let config = FieldConfig::resolve(&[&self.global, &type_layer, instance]);

        let form = page
            .find_form(container, config.form.as_deref())
            .ok_or_else(|| FieldError::OutsideForm(id.clone()))?;

        let engine = create_adapter(&page.capabilities, &id, container, &config, self.retry)?;

        let [value_name, indent_name, align_name] = input_names(&id);
        let value_id = format!("{id}_return");
        let inputs = HiddenInputs {
            value: page.ensure_hidden_input(form, &value_name, Some(&value_id), ""),
            indent: page.ensure_hidden_input(form, &indent_name, Some(&indent_name), "0"),
            align: page.ensure_hidden_input(form, &align_name, Some(&align_name), "left"),
        };

        let keymap = Keymap::build(&config, |c| engine.supports(c), engine.binds_enter());
        let mut field = Field {
            id: id.clone(),
            form,
            container,
            inputs,
            pipelines: Pipelines::from_config(&config),
            lexicon: Lexicon::for_lang(&config.lang),
            keymap,
            engine,
            hooks: hooks.unwrap_or_else(|| self.default_hooks.clone()),
            bookmark: None,
            select_all: SelectAll::Released,
            config,
        };
        field.store_postback(page);

        let deferred =
            field.config.defer_frame_creation && field.engine.kind() == EngineKind::IsolatedDocument;
        if !deferred {
            field.run(&mut self.shared, |engine, ctx| engine.make_editable(page, ctx))?;
        }

        log::debug!("created field {id} with the {} engine", field.engine.kind());
        self.fields.insert(id.clone(), field);
        self.order.push(id.clone());
        Ok(id)
    }

    /// Blurs the field if focused, drops its pending tasks and forgets it.
    pub fn remove(&mut self, page: &mut Page, id: &str) -> Result<(), FieldError> {
        self.get(id)?;
        if self.focused.as_deref() == Some(id) {
            self.blur(page);
        }
        self.shared.tasks.cancel_field(id);
        if self.link_dialog.as_ref().is_some_and(|d| d.field == id) {
            self.dialog_cancel(page);
        }
        if self
            .pending_external_link
            .as_ref()
            .is_some_and(|t| t.field == id)
        {
            self.pending_external_link = None;
        }
        self.fields.remove(id);
        self.order.retain(|f| f != id);
        log::debug!("removed field {id}");
        Ok(())
    }

    /// Makes a field with deferred creation editable. Called on the first
    /// pointer hover and on focus.
    pub fn hover(&mut self, page: &mut Page, id: &str) -> Result<(), FieldError> {
        let field = self
            .fields
            .get_mut(id)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))?;
        if field.engine.state() == EngineState::Uninitialized {
            field.run(&mut self.shared, |engine, ctx| engine.make_editable(page, ctx))?;
        }
        Ok(())
    }

    // Focus

    pub fn focus(&mut self, page: &mut Page, id: &str) -> Result<(), FieldError> {
        self.get(id)?;
        if self.focused.as_deref() == Some(id) {
            return Ok(());
        }
        if let Some(previous) = self.focused.take() {
            self.blur_field(page, &previous);
        }
        self.popups.hide(PopupKind::LinkDialog);
        self.link_dialog = None;
        self.hover(page, id)?;

        let field = self
            .fields
            .get_mut(id)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))?;
        field.hooks.clone().on_focus(&mut HookContext {
            id,
            page: &mut *page,
            engine: field.engine.as_mut(),
        });
        match field.bookmark.take() {
            Some(bookmark) => field.engine.restore_bookmark(page, &bookmark),
            None => {
                if let Some((dom, root)) = field.engine.surface_mut(page)
                    && common::selection_in(dom, root).is_none()
                {
                    common::caret_at_end(dom, root);
                }
            }
        }

        if field.config.attach_button_bar {
            self.toolbars.button_bar = Some(ButtonBar::build(id, &field.keymap, &field.lexicon));
        }
        if field.config.attach_special_char_bar {
            self.toolbars.special_char_bar = Some(SpecialCharBar::build(
                id,
                &field.config,
                &field.keymap,
                &field.lexicon,
            ));
        }
        if self.popups.is_visible(PopupKind::Help) {
            let html = render_help(
                &help_rows(&field.keymap, &field.config, &field.lexicon),
                &field.lexicon,
            );
            self.popups.show(PopupKind::Help, html);
        }
        self.focused = Some(id.to_string());
        self.refresh_toolbars(page);
        log::debug!("focused {id}");
        Ok(())
    }

    /// Blurs the focused field, if any.
    pub fn blur(&mut self, page: &mut Page) {
        if let Some(id) = self.focused.take() {
            self.blur_field(page, &id);
        }
    }

    fn blur_field(&mut self, page: &mut Page, id: &str) {
        self.toolbars.hide();
        self.popups.hide(PopupKind::LinkDialog);
        self.link_dialog = None;
        let Some(field) = self.fields.get_mut(id) else {
            return;
        };
        field.bookmark = field.engine.capture_bookmark(page);
        field.engine.collapse_to_end(page);
        field.select_all = SelectAll::Released;
        field.store_postback(page);
        field.hooks.clone().on_blur(&mut HookContext {
            id,
            page: &mut *page,
            engine: field.engine.as_mut(),
        });
        log::debug!("blurred {id}");
    }

    /// A click anywhere in the window outside the fields.
    pub fn window_click(&mut self, page: &mut Page) {
        if std::mem::take(&mut self.cancel_next_window_click) {
            return;
        }
        self.blur(page);
    }

    /// A click inside a popup, which must not blur the field.
    pub fn popup_click(&mut self) {
        self.cancel_next_window_click = true;
    }

    // Input events

    /// Routes a key-down. Bound chords run and report [`Dispatch::Handled`];
    /// everything else goes to the editing surface.
    pub fn key_down(
        &mut self,
        page: &mut Page,
        id: &str,
        event: &KeyEvent,
    ) -> Result<Dispatch, FieldError> {
        self.focus(page, id)?;
        let dispatch = self.get(id)?.keymap.dispatch(event);
        match &dispatch {
            Dispatch::Handled(binding) => {
                log::debug!("{id}: {} runs {}", event.chord().unwrap_or_default(), binding.name());
                self.run_binding(page, id, binding)?;
                if let Some(field) = self.fields.get_mut(id) {
                    field.engine.after_key_dispatch(page, binding);
                }
            }
            Dispatch::Native => {
                let field = self
                    .fields
                    .get_mut(id)
                    .ok_or_else(|| FieldError::UnknownField(id.to_string()))?;
                if !event.ctrl {
                    field.schedule_select_all_release(&mut self.shared.tasks);
                }
                let result =
                    field.run(&mut self.shared, |engine, ctx| engine.native_key(page, ctx, event));
                if let Err(err) = result {
                    report(self.notifier.as_ref(), &field.lexicon, id, err);
                }
            }
        }
        Ok(dispatch)
    }

    pub fn key_up(&mut self, page: &mut Page, id: &str, event: &KeyEvent) -> Result<(), FieldError> {
        self.get_mut(id)?.engine.after_key_up(page, event);
        self.refresh_toolbars(page);
        Ok(())
    }

    /// A click inside the field, after the surface moved the selection.
    pub fn click(&mut self, page: &mut Page, id: &str) -> Result<(), FieldError> {
        self.focus(page, id)?;
        let field = self.get_mut(id)?;
        field.restore_select_all(page);
        field.engine.note_selection(page);
        self.refresh_toolbars(page);
        Ok(())
    }

    /// Moves the selection of a field to the characters `start..end`, as a
    /// pointer drag would.
    pub fn select(
        &mut self,
        page: &mut Page,
        id: &str,
        start: usize,
        end: usize,
    ) -> Result<(), FieldError> {
        self.focus(page, id)?;
        let field = self.get_mut(id)?;
        let (dom, root) = field.engine.surface_mut(page).ok_or(EngineError::NotReady)?;
        dom.selection = Some(common::range_between(dom, root, start, end));
        field.engine.note_selection(page);
        self.refresh_toolbars(page);
        Ok(())
    }

    /// Text typed into the field.
    pub fn type_text(&mut self, page: &mut Page, id: &str, text: &str) -> Result<(), FieldError> {
        self.focus(page, id)?;
        let field = self
            .fields
            .get_mut(id)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))?;
        field.schedule_select_all_release(&mut self.shared.tasks);
        match field.engine.insert_text(page, text) {
            Ok(()) => field.engine.note_selection(page),
            Err(err) => report(self.notifier.as_ref(), &field.lexicon, id, err),
        }
        Ok(())
    }

    /// Markup pasted into the field from the system clipboard.
    pub fn paste(&mut self, page: &mut Page, id: &str, html: &str) -> Result<(), FieldError> {
        self.focus(page, id)?;
        let field = self
            .fields
            .get_mut(id)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))?;
        let result = field.run(&mut self.shared, |engine, ctx| engine.paste(page, ctx, html));
        if let Err(err) = result {
            report(self.notifier.as_ref(), &field.lexicon, id, err);
        }
        Ok(())
    }

    /// Runs the due tasks of the next `ms` milliseconds.
    pub fn advance_time(&mut self, page: &mut Page, ms: u64) {
        let until = self.shared.tasks.now() + ms;
        while let Some(task) = self.shared.tasks.pop_due(until) {
            let Some(field) = self.fields.get_mut(&task.field) else {
                continue;
            };
            if task.kind == TaskKind::ReleaseSelectAll {
                field.select_all = SelectAll::Released;
                continue;
            }
            let result =
                field.run(&mut self.shared, |engine, ctx| engine.run_task(page, ctx, &task.kind));
            if let Err(err) = result {
                report(self.notifier.as_ref(), &field.lexicon, &task.field, err);
            }
        }
        self.shared.tasks.advance_to(until);
    }

    // Commands

    /// Runs a command the field has available, as a toolbar button does.
    pub fn run_command(
        &mut self,
        page: &mut Page,
        id: &str,
        command: Command,
    ) -> Result<(), FieldError> {
        self.focus(page, id)?;
        if !self.get(id)?.keymap.has_command(command) {
            log::debug!("{command} is not available in {id}");
            return Ok(());
        }
        self.exec(page, id, command)
    }

    fn run_binding(&mut self, page: &mut Page, id: &str, binding: &Binding) -> Result<(), FieldError> {
        let indent = self.get(id)?.keymap.has_command(Command::Indent);
        match binding {
            Binding::Command(command) => return self.exec(page, id, *command),
            Binding::Tab if indent => return self.exec(page, id, Command::Indent),
            Binding::Tab | Binding::Escape => {
                self.blur(page);
                return Ok(());
            }
            Binding::Enter | Binding::SpecialChar { .. } => {}
        }

        let field = self
            .fields
            .get_mut(id)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))?;
        let result = match binding {
            Binding::Enter if field.config.is_multi_line() => field.engine.insert_line_break(page),
            Binding::Enter => {
                self.notifier
                    .notify(&field.lexicon.localize(l10n::ENTER_NOT_ALLOWED));
                Ok(())
            }
            Binding::SpecialChar { ch, .. } => field.engine.insert_text(page, &ch.to_string()),
            _ => Ok(()),
        };
        if let Err(err) = result {
            report(self.notifier.as_ref(), &field.lexicon, id, err);
        }
        Ok(())
    }

    fn exec(&mut self, page: &mut Page, id: &str, command: Command) -> Result<(), FieldError> {
        if command == Command::AddHtml {
            return self.open_link_dialog(page, id);
        }
        let field = self
            .fields
            .get_mut(id)
            .ok_or_else(|| FieldError::UnknownField(id.to_string()))?;
        if let Some(alignment) = command.alignment() {
            field.align(page, alignment);
            return Ok(());
        }
        let result = match command {
            Command::ToggleSelectAll => {
                field.toggle_select_all(page);
                Ok(())
            }
            Command::Indent => {
                field.indent_by(page, 1);
                Ok(())
            }
            Command::Outdent => {
                field.indent_by(page, -1);
                Ok(())
            }
            Command::DeleteHtml => field.engine.delete_annotation(page),
            Command::SpecialChars => {
                let attached = field.config.attach_special_char_bar;
                if self.toolbars.special_char_bar.is_some() && !attached {
                    self.toolbars.special_char_bar = None;
                } else {
                    self.toolbars.special_char_bar = Some(SpecialCharBar::build(
                        id,
                        &field.config,
                        &field.keymap,
                        &field.lexicon,
                    ));
                }
                Ok(())
            }
            Command::Help => {
                if self.popups.is_visible(PopupKind::Help) {
                    self.popups.hide(PopupKind::Help);
                } else {
                    let html = render_help(
                        &help_rows(&field.keymap, &field.config, &field.lexicon),
                        &field.lexicon,
                    );
                    self.popups.show(PopupKind::Help, html);
                }
                Ok(())
            }
            other => field.run(&mut self.shared, |engine, ctx| {
                engine.exec_command(page, ctx, other)
            }),
        };
        if let Err(err) = result {
            report(self.notifier.as_ref(), &field.lexicon, id, err);
        }
        self.refresh_toolbars(page);
        Ok(())
    }

    fn refresh_toolbars(&mut self, page: &Page) {
        if let Some(bar) = self.toolbars.button_bar.as_mut()
            && let Some(field) = self.fields.get(&bar.field)
            && let Some((dom, root)) = field.engine.surface(page)
        {
            bar.refresh(dom, root);
        }
    }

    /// Rows of the help screen for a field.
    pub fn help_rows(&self, id: &str) -> Result<Vec<HelpRow>, FieldError> {
        let field = self.get(id)?;
        Ok(help_rows(&field.keymap, &field.config, &field.lexicon))
    }

    // Link dialog

    fn open_link_dialog(&mut self, page: &mut Page, id: &str) -> Result<(), FieldError> {
        let field = self.get(id)?;
        let existing = field.engine.find_annotation_at_selection(page).and_then(|el| {
            field
                .engine
                .surface(page)
                .and_then(|(dom, _)| Annotation::read(dom, el))
        });
        let selected = field
            .engine
            .surface(page)
            .and_then(|(dom, root)| common::selection_in(dom, root))
            .is_some_and(|r| !r.is_collapsed());
        if existing.is_none() && !selected {
            report(self.notifier.as_ref(), &field.lexicon, id, EngineError::NothingSelected);
            return Ok(());
        }

        let form = LinkForm::prefill(existing.as_ref());
        let html = render_link_dialog(&form, &field.lexicon);
        let dialog = LinkDialog {
            field: id.to_string(),
            bookmark: field.engine.capture_bookmark(page),
            existing,
            form,
        };
        self.popups.show(PopupKind::LinkDialog, html);
        self.link_dialog = Some(dialog);
        Ok(())
    }

    /// Applies the submitted link dialog to the selection it was opened on.
    pub fn dialog_submit(
        &mut self,
        page: &mut Page,
        form: &LinkForm,
    ) -> Result<LinkOutcome, FieldError> {
        let Some(dialog) = self.link_dialog.take() else {
            return Ok(LinkOutcome::Nothing);
        };
        self.popups.hide(PopupKind::LinkDialog);
        let field = self
            .fields
            .get_mut(&dialog.field)
            .ok_or_else(|| FieldError::UnknownField(dialog.field.clone()))?;
        if let Some(bookmark) = &dialog.bookmark {
            field.engine.restore_bookmark(page, bookmark);
        }

        let outcome = form.decide(dialog.existing.as_ref());
        let result = match &outcome {
            LinkOutcome::Nothing => Ok(()),
            LinkOutcome::Delete => field.engine.delete_annotation(page),
            LinkOutcome::Update(annotation) => match field.engine.find_annotation_at_selection(page) {
                Some(el) => field.engine.update_annotation(page, el, annotation),
                None => Err(EngineError::NoAnnotation),
            },
            LinkOutcome::Insert(annotation) => {
                field.engine.insert_annotation(page, annotation).map(|_| ())
            }
        };
        if let Err(err) = result {
            report(self.notifier.as_ref(), &field.lexicon, &dialog.field, err);
        }
        log::debug!("link dialog of {} closed with {outcome:?}", dialog.field);
        self.focus(page, &dialog.field)?;
        Ok(outcome)
    }

    /// Closes the link dialog without changes.
    pub fn dialog_cancel(&mut self, page: &mut Page) {
        let Some(dialog) = self.link_dialog.take() else {
            return;
        };
        self.popups.hide(PopupKind::LinkDialog);
        if let Some(field) = self.fields.get_mut(&dialog.field)
            && let Some(bookmark) = &dialog.bookmark
        {
            field.engine.restore_bookmark(page, bookmark);
        }
    }

    // Links to host objects

    /// Remembers the selection of a field for a link the host will complete
    /// once the user picked an object. Returns `false`, after notifying,
    /// when nothing is selected.
    pub fn begin_external_link(&mut self, page: &Page, id: &str) -> Result<bool, FieldError> {
        let field = self.get(id)?;
        let selected = field
            .engine
            .surface(page)
            .and_then(|(dom, root)| common::selection_in(dom, root))
            .is_some_and(|r| !r.is_collapsed());
        if !selected && field.engine.find_annotation_at_selection(page).is_none() {
            report(self.notifier.as_ref(), &field.lexicon, id, EngineError::NothingSelected);
            return Ok(false);
        }
        self.pending_external_link = Some(ExternalLinkTarget {
            field: id.to_string(),
            bookmark: field.engine.capture_bookmark(page),
        });
        Ok(true)
    }

    /// Links the remembered selection to the object the host picked.
    pub fn complete_external_link(
        &mut self,
        page: &mut Page,
        tag: &str,
        object_id: &str,
        url: &str,
        title: &str,
    ) -> Result<(), FieldError> {
        let Some(target) = self.pending_external_link.take() else {
            return Ok(());
        };
        let field = self
            .fields
            .get_mut(&target.field)
            .ok_or_else(|| FieldError::UnknownField(target.field.clone()))?;
        if let Some(bookmark) = &target.bookmark {
            field.engine.restore_bookmark(page, bookmark);
        }
        let mut annotation = Annotation::link(url).with_title(title);
        annotation.external_tag = Some(tag.to_string());
        annotation.external_id = Some(object_id.to_string());

        let result = match field.engine.find_annotation_at_selection(page) {
            Some(el) => field.engine.update_annotation(page, el, &annotation),
            None => field.engine.insert_annotation(page, &annotation).map(|_| ()),
        };
        if let Err(err) = result {
            report(self.notifier.as_ref(), &field.lexicon, &target.field, err);
        }
        Ok(())
    }

    pub fn cancel_external_link(&mut self) {
        self.pending_external_link = None;
    }

    // Values

    pub fn value(&self, page: &Page, id: &str) -> Result<String, FieldError> {
        Ok(self.get(id)?.value(page))
    }

    /// Replaces a field's content and updates its hidden inputs.
    pub fn set_value(&mut self, page: &mut Page, id: &str, html: &str) -> Result<(), FieldError> {
        let field = self.get_mut(id)?;
        field.set_value(page, html);
        field.store_postback(page);
        Ok(())
    }

    pub fn postback(&self, page: &Page, id: &str) -> Result<Postback, FieldError> {
        Ok(self.get(id)?.postback(page))
    }

    /// Stores the postbacks of the form's fields, runs their submit hooks and
    /// collects the form's values.
    pub fn submit_form(
        &mut self,
        page: &mut Page,
        form_id: &str,
    ) -> Result<FormSubmission, FieldError> {
        let form = page
            .element(form_id)
            .filter(|&f| page.dom.is_tag(f, "form"))
            .ok_or_else(|| FieldError::UnknownForm(form_id.to_string()))?;

        for id in &self.order {
            let Some(field) = self.fields.get_mut(id).filter(|f| f.form == form) else {
                continue;
            };
            field.store_postback(page);
            field.hooks.clone().on_submit(&mut HookContext {
                id,
                page: &mut *page,
                engine: field.engine.as_mut(),
            });
        }

        let submission = FormSubmission {
            form: Some(form_id.to_string()),
            action: page.dom.attr(form, "action").unwrap_or_default().to_string(),
            method: page
                .dom
                .attr(form, "method")
                .unwrap_or("post")
                .to_ascii_lowercase(),
            values: page.form_values(form),
        };
        log::debug!("submitting form {form_id} with {} values", submission.values.len());
        Ok(submission)
    }

    /// Submits a form through the host's request layer and returns the
    /// response body.
    pub fn submit_with(
        &mut self,
        page: &mut Page,
        form_id: &str,
        requests: &mut dyn RequestLayer,
    ) -> Result<String, FieldError> {
        let submission = self.submit_form(page, form_id)?;
        Ok(requests.submit(&submission)?)
    }
}
