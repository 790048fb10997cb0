//! Shortcut map and key dispatch.
//!
//! The active map of a field is built once from its configuration: every
//! available command the engine supports gets its configured or default
//! chord, special characters get theirs, and `tab`, `escape` and, for
//! single-line fields, `enter` are always bound. A key-down whose chord is
//! bound is handled and its native default suppressed; anything else is
//! left to the editing surface.
//!
//! ## Modules
//!
//! - [`chord`]: key events, keycode tables and chord names

pub mod chord;

pub use chord::{KeyEvent, codes};

use std::collections::BTreeMap;

use markup_field_config::FieldConfig;

use crate::commands::{Binding, Command, default_special_char_shortcut};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A binding matched; the native default must be suppressed.
    Handled(Binding),
    /// No binding; the editing surface handles the key.
    Native,
}

#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: BTreeMap<String, Binding>,
    /// Available commands in configured order, after engine filtering.
    commands: Vec<Command>,
}

impl Keymap {
    /// Builds the active map. `supports` reports whether the engine adapter
    /// implements a command; `enter_in_multi_line` binds `enter` for
    /// multi-line fields too, for surfaces whose native line break is wrong.
    pub fn build(
        config: &FieldConfig,
        supports: impl Fn(Command) -> bool,
        enter_in_multi_line: bool,
    ) -> Self {
        let mut keymap = Keymap::default();

        for name in &config.available_commands {
            let Some(command) = Command::from_name(name) else {
                log::warn!("ignoring unknown command {name:?}");
                continue;
            };
            if !supports(command) || keymap.commands.contains(&command) {
                continue;
            }
            keymap.commands.push(command);

            if command == Command::SpecialChars && config.attach_special_char_bar {
                continue;
            }
            let chord = config
                .shortcut_override(command.name())
                .unwrap_or(command.default_shortcut());
            keymap.bind(chord, Binding::Command(command));
        }

        for special in &config.special_chars {
            let chord = config
                .shortcut_override(&special.name)
                .or_else(|| default_special_char_shortcut(&special.name));
            if let Some(chord) = chord {
                keymap.bind(
                    chord,
                    Binding::SpecialChar {
                        name: special.name.clone(),
                        ch: special.ch,
                    },
                );
            }
        }

        keymap.bind("escape", Binding::Escape);
        keymap.bind("tab", Binding::Tab);
        if !config.is_multi_line() || enter_in_multi_line {
            keymap.bind("enter", Binding::Enter);
        }
        keymap
    }

    fn bind(&mut self, chord: &str, binding: Binding) {
        if !chord::is_valid_chord(chord) {
            log::warn!("ignoring malformed chord {chord:?} for {}", binding.name());
            return;
        }
        if let Some(previous) = self.bindings.insert(chord.to_string(), binding)
            && !matches!(previous, Binding::Command(Command::Indent))
        {
            log::debug!("chord {chord} rebound, was {}", previous.name());
        }
    }

    pub fn binding_for(&self, chord: &str) -> Option<&Binding> {
        self.bindings.get(chord)
    }

    pub fn dispatch(&self, event: &KeyEvent) -> Dispatch {
        match event.chord().and_then(|c| self.bindings.get(&c)) {
            Some(binding) => Dispatch::Handled(binding.clone()),
            None => Dispatch::Native,
        }
    }

    /// The chord bound to a command, if any.
    pub fn chord_for(&self, command: Command) -> Option<&str> {
        let indent_via_tab = command == Command::Indent && self.has_command(Command::Indent);
        self.bindings
            .iter()
            .find(|(_, b)| **b == Binding::Command(command) || (indent_via_tab && **b == Binding::Tab))
            .map(|(chord, _)| chord.as_str())
    }

    pub fn chord_for_special(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(_, b)| matches!(b, Binding::SpecialChar { name: n, .. } if n == name))
            .map(|(chord, _)| chord.as_str())
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn has_command(&self, command: Command) -> bool {
        self.commands.contains(&command)
    }

    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(c, b)| (c.as_str(), b))
    }
}
