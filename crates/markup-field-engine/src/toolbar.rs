//! Button and special-character bars of the focused field.

use markup_field_config::FieldConfig;

use crate::commands::{Command, display_name, display_shortcut};
use crate::dom::{Dom, NodeId};
use crate::engine::common;
use crate::keymap::Keymap;
use crate::l10n::Localizer;

/// `Bold: Ctrl-B`, or just the name for an unbound command.
pub fn tooltip(localizer: &dyn Localizer, name: &str, chord: Option<&str>) -> String {
    let label = localizer.localize(&display_name(name));
    match chord {
        Some(chord) => format!("{label}: {}", display_shortcut(chord)),
        None => label,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub command: Command,
    pub tooltip: String,
    /// Whether the inline markup of the command applies at the selection.
    pub pressed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonBar {
    pub field: String,
    pub buttons: Vec<Button>,
}

impl ButtonBar {
    /// One button per available command, in configured order.
    pub fn build(field: &str, keymap: &Keymap, localizer: &dyn Localizer) -> Self {
        let buttons = keymap
            .commands()
            .iter()
            .map(|&command| Button {
                command,
                tooltip: tooltip(localizer, command.name(), keymap.chord_for(command)),
                pressed: false,
            })
            .collect();
        Self {
            field: field.to_string(),
            buttons,
        }
    }

    pub fn refresh(&mut self, dom: &Dom, root: NodeId) {
        for button in &mut self.buttons {
            button.pressed = button
                .command
                .inline_tag()
                .is_some_and(|tag| common::has_inline(dom, root, tag));
        }
    }

    pub fn button(&self, command: Command) -> Option<&Button> {
        self.buttons.iter().find(|b| b.command == command)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialCharButton {
    pub name: String,
    pub ch: char,
    pub tooltip: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialCharBar {
    pub field: String,
    pub chars: Vec<SpecialCharButton>,
}

impl SpecialCharBar {
    pub fn build(
        field: &str,
        config: &FieldConfig,
        keymap: &Keymap,
        localizer: &dyn Localizer,
    ) -> Self {
        let chars = config
            .special_chars
            .iter()
            .map(|special| SpecialCharButton {
                name: special.name.clone(),
                ch: special.ch,
                tooltip: tooltip(localizer, &special.name, keymap.chord_for_special(&special.name)),
            })
            .collect();
        Self {
            field: field.to_string(),
            chars,
        }
    }
}

/// Bars shown for the focused field. Both are hidden on blur.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Toolbars {
    pub button_bar: Option<ButtonBar>,
    pub special_char_bar: Option<SpecialCharBar>,
}

impl Toolbars {
    pub fn hide(&mut self) {
        self.button_bar = None;
        self.special_char_bar = None;
    }

    pub fn is_hidden(&self) -> bool {
        self.button_bar.is_none() && self.special_char_bar.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Position, Range};
    use crate::l10n::Lexicon;
    use pretty_assertions::assert_eq;

    fn keymap(config: &FieldConfig) -> Keymap {
        Keymap::build(config, |_| true, false)
    }

    #[test]
    fn tooltips_name_the_shortcut() {
        let config = FieldConfig::default();
        let bar = ButtonBar::build("f", &keymap(&config), &Lexicon::english());

        assert_eq!(bar.buttons.len(), config.available_commands.len());
        assert_eq!(bar.button(Command::Bold).unwrap().tooltip, "Bold: Ctrl-B");
        assert_eq!(bar.button(Command::Indent).unwrap().tooltip, "Indent: Tab");
        assert_eq!(
            bar.button(Command::DeleteHtml).unwrap().tooltip,
            "Delete Html: Ctrl-Shift-L"
        );
    }

    #[test]
    fn tooltips_are_localized() {
        let config = FieldConfig::default();
        let bar = ButtonBar::build("f", &keymap(&config), &Lexicon::for_lang("de-DE"));

        assert_eq!(bar.button(Command::Bold).unwrap().tooltip, "Fett: Ctrl-B");
    }

    #[test]
    fn pressed_follows_the_selection() {
        let config = FieldConfig::default();
        let mut bar = ButtonBar::build("f", &keymap(&config), &Lexicon::english());
        let mut dom = Dom::parse(r#"<div id="e">plain <b>bold</b></div>"#);
        let root = dom.element_by_id("e").unwrap();
        let bold_text = dom.first_child(dom.child(root, 1).unwrap()).unwrap();
        dom.selection = Some(Range::collapsed(Position::new(bold_text, 2)));

        bar.refresh(&dom, root);

        assert!(bar.button(Command::Bold).unwrap().pressed);
        assert!(!bar.button(Command::Italic).unwrap().pressed);
        assert!(!bar.button(Command::Undo).unwrap().pressed);
    }

    #[test]
    fn special_char_bar_lists_configured_chars() {
        let config = FieldConfig::default();
        let bar = SpecialCharBar::build("f", &config, &keymap(&config), &Lexicon::english());

        let names: Vec<_> = bar.chars.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ldquo", "rdquo", "lsquo", "rsquo", "ndash"]);
        assert_eq!(bar.chars[4].tooltip, "Ndash: Ctrl-0");
        assert_eq!(bar.chars[4].ch, '\u{2013}');
    }
}
