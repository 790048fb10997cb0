//! Popups: the link dialog and the help screen.
//!
//! The [`PopupManager`] keeps which popup is visible, what it shows and
//! where the user last dragged it. A popup is centered the first time it is
//! shown; after a drag, later shows reuse the offset. Rendering is left to
//! an optional [`PopupHost`].

use std::collections::BTreeMap;

use markup_field_config::FieldConfig;

use crate::annotation::{Annotation, AnnotationKind};
use crate::bookmark::Bookmark;
use crate::commands::{Command, display_name, display_shortcut};
use crate::keymap::Keymap;
use crate::l10n::Localizer;

/// URL the link dialog offers when there is no link yet.
pub const URL_PROMPT: &str = "http://";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PopupKind {
    LinkDialog,
    Help,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PopupPosition {
    #[default]
    Centered,
    /// Moved from the centered position by a drag.
    Offset { delta_x: i32, delta_y: i32 },
}

/// Displays popups on behalf of the manager.
pub trait PopupHost {
    fn show(&mut self, kind: PopupKind, html: &str, position: PopupPosition);
    fn hide(&mut self, kind: PopupKind);
}

#[derive(Debug, Clone, Default)]
struct PopupState {
    visible: bool,
    html: String,
    position: PopupPosition,
}

#[derive(Default)]
pub struct PopupManager {
    popups: BTreeMap<PopupKind, PopupState>,
    host: Option<Box<dyn PopupHost>>,
}

impl PopupManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(host: Box<dyn PopupHost>) -> Self {
        Self {
            popups: BTreeMap::new(),
            host: Some(host),
        }
    }

    /// Shows `kind` with `html` and returns where it appears.
    pub fn show(&mut self, kind: PopupKind, html: String) -> PopupPosition {
        let state = self.popups.entry(kind).or_default();
        state.visible = true;
        state.html = html;
        if let Some(host) = self.host.as_mut() {
            host.show(kind, &state.html, state.position);
        }
        log::debug!("showing {kind:?} at {:?}", state.position);
        state.position
    }

    pub fn hide(&mut self, kind: PopupKind) {
        let Some(state) = self.popups.get_mut(&kind).filter(|s| s.visible) else {
            return;
        };
        state.visible = false;
        if let Some(host) = self.host.as_mut() {
            host.hide(kind);
        }
    }

    pub fn is_visible(&self, kind: PopupKind) -> bool {
        self.popups.get(&kind).is_some_and(|s| s.visible)
    }

    /// Markup of a visible popup.
    pub fn content(&self, kind: PopupKind) -> Option<&str> {
        self.popups
            .get(&kind)
            .filter(|s| s.visible)
            .map(|s| s.html.as_str())
    }

    pub fn position(&self, kind: PopupKind) -> PopupPosition {
        self.popups
            .get(&kind)
            .map(|s| s.position)
            .unwrap_or_default()
    }

    /// Remembers where a drag of `kind` ended, relative to the center.
    pub fn drag_end(&mut self, kind: PopupKind, delta_x: i32, delta_y: i32) {
        self.popups.entry(kind).or_default().position = PopupPosition::Offset { delta_x, delta_y };
    }
}

/// The values of the link dialog's inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkForm {
    pub kind: AnnotationKind,
    pub url: String,
    pub title: String,
}

/// What submitting the link dialog does to the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Nothing,
    Delete,
    Update(Annotation),
    Insert(Annotation),
}

impl LinkForm {
    /// The form for the annotation under the selection, or an empty link.
    pub fn prefill(existing: Option<&Annotation>) -> Self {
        match existing {
            Some(a) => Self {
                kind: a.kind,
                url: a
                    .protected_url
                    .clone()
                    .unwrap_or_else(|| URL_PROMPT.to_string()),
                title: a.title.clone().unwrap_or_default(),
            },
            None => Self {
                kind: AnnotationKind::Link,
                url: URL_PROMPT.to_string(),
                title: String::new(),
            },
        }
    }

    /// Decides the outcome of a submission against the annotation the
    /// dialog was opened on.
    pub fn decide(&self, existing: Option<&Annotation>) -> LinkOutcome {
        let url = self.url.trim();
        let title = self.title.trim();

        if self.kind.is_link() {
            if url == URL_PROMPT {
                return LinkOutcome::Nothing;
            }
            if url.is_empty() {
                return match existing {
                    Some(_) => LinkOutcome::Delete,
                    None => LinkOutcome::Nothing,
                };
            }
        } else if title.is_empty() {
            return match existing {
                Some(_) => LinkOutcome::Delete,
                None => LinkOutcome::Nothing,
            };
        }

        let mut annotation = if self.kind.is_link() {
            Annotation::link(url).with_title(title)
        } else {
            Annotation::phrase(self.kind, title)
        };
        match existing {
            Some(old) => {
                annotation.external_tag.clone_from(&old.external_tag);
                annotation.external_id.clone_from(&old.external_id);
                if !self.kind.is_link() && *old == annotation {
                    LinkOutcome::Nothing
                } else {
                    LinkOutcome::Update(annotation)
                }
            }
            None => LinkOutcome::Insert(annotation),
        }
    }
}

/// An open link dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDialog {
    pub field: String,
    /// Selection when the dialog opened, put back when it closes.
    pub bookmark: Option<Bookmark>,
    pub existing: Option<Annotation>,
    pub form: LinkForm,
}

const LINK_DIALOG_TEMPLATE: &str = concat!(
    r#"<form class="mf-link-dialog">"#,
    r#"<h3>[Insert]</h3>"#,
    r#"<label><input type="radio" name="kind" value="a"{a}> [Link]</label>"#,
    r#"<label><input type="radio" name="kind" value="abbr"{abbr}> [Abbreviation]</label>"#,
    r#"<label><input type="radio" name="kind" value="acronym"{acronym}> [Acronym]</label>"#,
    r#"<label>[URL] <input type="text" name="url" value="{url}"></label>"#,
    r#"<label>[Title] <input type="text" name="title" value="{title}"></label>"#,
    r#"<button name="ok">[OK]</button><button name="cancel">[Cancel]</button>"#,
    "</form>",
);

pub fn render_link_dialog(form: &LinkForm, localizer: &dyn Localizer) -> String {
    let mut html = localizer.localize_dialog(LINK_DIALOG_TEMPLATE);
    for kind in AnnotationKind::ALL {
        let checked = if kind == form.kind { " checked" } else { "" };
        html = html.replace(&format!("{{{}}}", kind.token()), checked);
    }
    html.replace(
        "{url}",
        &html_escape::encode_double_quoted_attribute(&form.url),
    )
    .replace(
        "{title}",
        &html_escape::encode_double_quoted_attribute(&form.title),
    )
}

/// One line of the help screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpRow {
    pub name: String,
    pub shortcut: String,
}

impl HelpRow {
    fn new(localizer: &dyn Localizer, name: &str, chord: &str) -> Self {
        Self {
            name: localizer.localize(&display_name(name)),
            shortcut: display_shortcut(chord),
        }
    }
}

/// Rows for the bound commands, then the special characters. `help` itself
/// and the keys every field has are left out.
pub fn help_rows(keymap: &Keymap, config: &FieldConfig, localizer: &dyn Localizer) -> Vec<HelpRow> {
    let commands = keymap
        .commands()
        .iter()
        .filter(|&&c| c != Command::Help)
        .filter(|&&c| !(c == Command::SpecialChars && config.attach_special_char_bar))
        .filter_map(|&c| {
            keymap
                .chord_for(c)
                .map(|chord| HelpRow::new(localizer, c.name(), chord))
        });
    let specials = config.special_chars.iter().filter_map(|s| {
        keymap
            .chord_for_special(&s.name)
            .map(|chord| HelpRow::new(localizer, &s.name, chord))
    });
    commands.chain(specials).collect()
}

pub fn render_help(rows: &[HelpRow], localizer: &dyn Localizer) -> String {
    let mut html = localizer.localize_dialog(r#"<table class="mf-help"><tr><th colspan="2">[Shortcuts]</th></tr>"#);
    for row in rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>",
            html_escape::encode_text(&row.name),
            html_escape::encode_text(&row.shortcut)
        ));
    }
    html.push_str("</table>");
    html.push_str(&localizer.localize_dialog(r#"<button name="close">[Close]</button>"#));
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::l10n::Lexicon;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn popups_remember_where_they_were_dragged() {
        let mut popups = PopupManager::new();

        assert_eq!(
            popups.show(PopupKind::Help, "<p>help</p>".into()),
            PopupPosition::Centered
        );
        popups.drag_end(PopupKind::Help, 40, -12);
        popups.hide(PopupKind::Help);
        assert!(!popups.is_visible(PopupKind::Help));
        assert_eq!(popups.content(PopupKind::Help), None);

        let again = popups.show(PopupKind::Help, "<p>help</p>".into());

        assert_eq!(
            again,
            PopupPosition::Offset {
                delta_x: 40,
                delta_y: -12
            }
        );
        assert_eq!(
            popups.position(PopupKind::LinkDialog),
            PopupPosition::Centered
        );
    }

    fn outcome(o: &LinkOutcome) -> &'static str {
        match o {
            LinkOutcome::Nothing => "nothing",
            LinkOutcome::Delete => "delete",
            LinkOutcome::Update(_) => "update",
            LinkOutcome::Insert(_) => "insert",
        }
    }

    #[rstest]
    #[case::untouched_prompt(None, AnnotationKind::Link, "http://", "", "nothing")]
    #[case::empty_url_new(None, AnnotationKind::Link, "", "", "nothing")]
    #[case::new_link(None, AnnotationKind::Link, "http://a.example", "", "insert")]
    #[case::empty_url_existing(Some(Annotation::link("/x")), AnnotationKind::Link, "", "", "delete")]
    #[case::changed_link(Some(Annotation::link("/x")), AnnotationKind::Link, "/y", "", "update")]
    #[case::empty_title_new(None, AnnotationKind::Abbreviation, "", "", "nothing")]
    #[case::new_phrase(None, AnnotationKind::Acronym, "", "NATO", "insert")]
    #[case::empty_title_existing(Some(Annotation::phrase(AnnotationKind::Abbreviation, "World")), AnnotationKind::Abbreviation, "", "", "delete")]
    #[case::unchanged_phrase(Some(Annotation::phrase(AnnotationKind::Abbreviation, "World")), AnnotationKind::Abbreviation, "", "World", "nothing")]
    #[case::changed_phrase(Some(Annotation::phrase(AnnotationKind::Abbreviation, "World")), AnnotationKind::Abbreviation, "", "Wide", "update")]
    #[case::phrase_to_link(Some(Annotation::phrase(AnnotationKind::Abbreviation, "World")), AnnotationKind::Link, "/w", "", "update")]
    fn link_dialog_decisions(
        #[case] existing: Option<Annotation>,
        #[case] kind: AnnotationKind,
        #[case] url: &str,
        #[case] title: &str,
        #[case] expected: &str,
    ) {
        let form = LinkForm {
            kind,
            url: url.to_string(),
            title: title.to_string(),
        };

        assert_eq!(outcome(&form.decide(existing.as_ref())), expected);
    }

    #[test]
    fn updates_keep_the_external_reference() {
        let mut existing = Annotation::link("/story/7");
        existing.external_tag = Some("story-reference".into());
        existing.external_id = Some("7".into());
        let form = LinkForm {
            title: "Seven".into(),
            ..LinkForm::prefill(Some(&existing))
        };

        let LinkOutcome::Update(updated) = form.decide(Some(&existing)) else {
            panic!("expected an update");
        };

        assert_eq!(updated.external_tag.as_deref(), Some("story-reference"));
        assert_eq!(updated.title.as_deref(), Some("Seven"));
        assert_eq!(updated.protected_url.as_deref(), Some("/story/7"));
    }

    #[test]
    fn dialog_is_prefilled_and_localized() {
        let form = LinkForm::prefill(None);
        let html = render_link_dialog(&form, &Lexicon::for_lang("de"));

        assert!(html.contains(r#"value="a" checked> Link"#));
        assert!(html.contains(r#"value="abbr"> Abkürzung"#));
        assert!(html.contains(r#"Titel <input type="text" name="title" value="">"#));
        assert!(html.contains(r#"name="url" value="http://""#));
        assert!(html.contains(">Abbrechen</button>"));
    }

    #[test]
    fn dialog_values_are_escaped() {
        let form = LinkForm {
            kind: AnnotationKind::Abbreviation,
            url: String::new(),
            title: r#"say "[OK]""#.into(),
        };
        let html = render_link_dialog(&form, &Lexicon::english());

        assert!(html.contains(r#"value="say &quot;[OK]&quot;""#));
        assert!(html.contains(r#"value="abbr" checked>"#));
    }

    #[test]
    fn help_rows_skip_help_and_fixed_keys() {
        let config = FieldConfig::default();
        let keymap = Keymap::build(&config, |c| !c.is_clipboard(), false);

        let rows = help_rows(&keymap, &config, &Lexicon::english());

        let names: Vec<_> = rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"Toggle Selectall"));
        assert!(!names.contains(&"Help"));
        assert!(!names.contains(&"Cut"));
        assert!(names.contains(&"Specialchars"));
        assert_eq!(names.last(), Some(&"Ndash"));
        assert_eq!(rows.len(), 22 - 1 - 3 + 5);
        assert_eq!(rows[1].shortcut, "Ctrl-B");
    }

    #[test]
    fn help_rows_drop_specialchars_when_the_bar_is_attached() {
        let config = FieldConfig {
            attach_special_char_bar: true,
            ..FieldConfig::default()
        };
        let keymap = Keymap::build(&config, |_| true, false);

        let rows = help_rows(&keymap, &config, &Lexicon::english());

        assert!(rows.iter().all(|r| r.name != "Specialchars"));
    }

    #[test]
    fn help_screen_lists_rows() {
        let rows = vec![HelpRow {
            name: "Bold".into(),
            shortcut: "Ctrl-B".into(),
        }];

        assert_eq!(
            render_help(&rows, &Lexicon::for_lang("de")),
            concat!(
                r#"<table class="mf-help"><tr><th colspan="2">Tastenkürzel</th></tr>"#,
                "<tr><td>Bold</td><td>Ctrl-B</td></tr></table>",
                r#"<button name="close">Schließen</button>"#
            )
        );
    }
}
