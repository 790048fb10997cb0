//! The fixed command vocabulary.
//!
//! Commands are plain data. What a command does is decided by the field
//! controller and the engine adapter that runs it.

use std::fmt;

use crate::postback::Alignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    ToggleSelectAll,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Subscript,
    Superscript,
    Cut,
    Copy,
    Paste,
    AlignLeft,
    AlignCenter,
    AlignRight,
    Justify,
    Indent,
    Outdent,
    AddHtml,
    DeleteHtml,
    Redo,
    Undo,
    SpecialChars,
    Help,
}

impl Command {
    pub const ALL: [Command; 22] = [
        Command::ToggleSelectAll,
        Command::Bold,
        Command::Italic,
        Command::Underline,
        Command::Strikethrough,
        Command::Subscript,
        Command::Superscript,
        Command::Cut,
        Command::Copy,
        Command::Paste,
        Command::AlignLeft,
        Command::AlignCenter,
        Command::AlignRight,
        Command::Justify,
        Command::Indent,
        Command::Outdent,
        Command::AddHtml,
        Command::DeleteHtml,
        Command::Redo,
        Command::Undo,
        Command::SpecialChars,
        Command::Help,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::ToggleSelectAll => "toggle_selectall",
            Command::Bold => "bold",
            Command::Italic => "italic",
            Command::Underline => "underline",
            Command::Strikethrough => "strikethrough",
            Command::Subscript => "subscript",
            Command::Superscript => "superscript",
            Command::Cut => "cut",
            Command::Copy => "copy",
            Command::Paste => "paste",
            Command::AlignLeft => "align_left",
            Command::AlignCenter => "align_center",
            Command::AlignRight => "align_right",
            Command::Justify => "justify",
            Command::Indent => "indent",
            Command::Outdent => "outdent",
            Command::AddHtml => "add_html",
            Command::DeleteHtml => "delete_html",
            Command::Redo => "redo",
            Command::Undo => "undo",
            Command::SpecialChars => "specialchars",
            Command::Help => "help",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn default_shortcut(self) -> &'static str {
        match self {
            Command::ToggleSelectAll => "ctrl_a",
            Command::Bold => "ctrl_b",
            Command::Italic => "ctrl_i",
            Command::Underline => "ctrl_u",
            Command::Strikethrough => "ctrl_t",
            Command::Subscript => "ctrl_d",
            Command::Superscript => "ctrl_s",
            Command::Cut => "ctrl_x",
            Command::Copy => "ctrl_c",
            Command::Paste => "ctrl_v",
            Command::AlignLeft => "ctrl_q",
            Command::AlignCenter => "ctrl_e",
            Command::AlignRight => "ctrl_r",
            Command::Justify => "ctrl_w",
            Command::Indent => "tab",
            Command::Outdent => "shift_tab",
            Command::AddHtml => "ctrl_l",
            Command::DeleteHtml => "ctrl_shift_l",
            Command::Redo => "ctrl_y",
            Command::Undo => "ctrl_z",
            Command::SpecialChars => "ctrl_6",
            Command::Help => "ctrl_h",
        }
    }

    /// The element an inline markup command toggles.
    pub fn inline_tag(self) -> Option<&'static str> {
        match self {
            Command::Bold => Some("b"),
            Command::Italic => Some("i"),
            Command::Underline => Some("u"),
            Command::Strikethrough => Some("strike"),
            Command::Subscript => Some("sub"),
            Command::Superscript => Some("sup"),
            _ => None,
        }
    }

    pub fn alignment(self) -> Option<Alignment> {
        match self {
            Command::AlignLeft => Some(Alignment::Left),
            Command::AlignCenter => Some(Alignment::Center),
            Command::AlignRight => Some(Alignment::Right),
            Command::Justify => Some(Alignment::Justify),
            _ => None,
        }
    }

    pub fn is_clipboard(self) -> bool {
        matches!(self, Command::Cut | Command::Copy | Command::Paste)
    }

    /// Commands after which the content differs, recorded for undo.
    pub fn mutates_content(self) -> bool {
        self.inline_tag().is_some() || matches!(self, Command::Cut | Command::Paste)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Default chords of the built-in special characters.
pub fn default_special_char_shortcut(name: &str) -> Option<&'static str> {
    match name {
        "ldquo" => Some("ctrl_2"),
        "rdquo" => Some("ctrl_3"),
        "lsquo" => Some("ctrl_4"),
        "rsquo" => Some("ctrl_5"),
        "ndash" => Some("ctrl_0"),
        _ => None,
    }
}

/// What a bound chord does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Command(Command),
    /// Indents when `indent` is available, otherwise leaves the field.
    Tab,
    /// Leaves the field.
    Escape,
    /// Rejected in single-line fields; a line break elsewhere.
    Enter,
    SpecialChar { name: String, ch: char },
}

impl Binding {
    pub fn name(&self) -> &str {
        match self {
            Binding::Command(c) => c.name(),
            Binding::Tab => "tab",
            Binding::Escape => "esc",
            Binding::Enter => "enter",
            Binding::SpecialChar { name, .. } => name,
        }
    }
}

/// `align_left` -> `Align Left`.
pub fn display_name(name: &str) -> String {
    name.split('_')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

/// `ctrl_shift_l` -> `Ctrl-Shift-L`.
pub fn display_shortcut(chord: &str) -> String {
    chord
        .split('_')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
