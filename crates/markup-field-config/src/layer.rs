use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Whether a field accepts line breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    #[serde(alias = "text")]
    SingleLine,
    #[serde(alias = "area", alias = "textarea")]
    MultiLine,
}

impl FieldType {
    /// Parses the value of a container's `type` attribute.
    pub fn from_attr(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "single-line" | "text" => Some(FieldType::SingleLine),
            "multi-line" | "area" | "textarea" => Some(FieldType::MultiLine),
            _ => None,
        }
    }
}

/// A character that can be inserted by name, from a shortcut or the special-char bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialCharDef {
    pub name: String,
    pub ch: char,
}

impl SpecialCharDef {
    pub fn new(name: &str, ch: char) -> Self {
        Self {
            name: name.to_string(),
            ch,
        }
    }
}

/// One layer of field options. Every option is optional so that layers can
/// be stacked: built-in defaults, the global file, the container's `type`
/// attribute and finally the per-instance options.
///
/// Unknown keys in a TOML layer are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigLayer {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_commands: Option<Vec<String>>,
    /// Chord overrides keyed by command or special-char name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortcut_for: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_chars: Option<Vec<SpecialCharDef>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach_button_bar: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attach_special_char_bar: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defer_frame_creation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_head: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_markup_filters: Option<bool>,
    /// Id of the owning form, when it is not an ancestor of the container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form: Option<String>,
}

impl ConfigLayer {
    pub fn with_type(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Self::default()
        }
    }

    /// Stacks `over` on top of `self`. Options set in `over` win; shortcut
    /// overrides are merged key by key, lists are replaced wholesale.
    pub fn merge(mut self, over: &ConfigLayer) -> ConfigLayer {
        fn take<T: Clone>(base: &mut Option<T>, over: &Option<T>) {
            if over.is_some() {
                base.clone_from(over);
            }
        }

        take(&mut self.field_type, &over.field_type);
        take(&mut self.available_commands, &over.available_commands);
        take(&mut self.special_chars, &over.special_chars);
        take(&mut self.lang, &over.lang);
        take(&mut self.indent_size, &over.indent_size);
        take(&mut self.attach_button_bar, &over.attach_button_bar);
        take(&mut self.attach_special_char_bar, &over.attach_special_char_bar);
        take(&mut self.defer_frame_creation, &over.defer_frame_creation);
        take(&mut self.frame_head, &over.frame_head);
        take(&mut self.use_markup_filters, &over.use_markup_filters);
        take(&mut self.form, &over.form);

        if let Some(over_shortcuts) = &over.shortcut_for {
            let shortcuts = self.shortcut_for.get_or_insert_with(BTreeMap::new);
            for (name, chord) in over_shortcuts {
                shortcuts.insert(name.clone(), chord.clone());
            }
        }

        self
    }
}

/// Command names enabled when no layer overrides `available_commands`.
pub const DEFAULT_COMMANDS: &[&str] = &[
    "toggle_selectall",
    "bold",
    "italic",
    "underline",
    "strikethrough",
    "subscript",
    "superscript",
    "cut",
    "copy",
    "paste",
    "align_left",
    "align_center",
    "align_right",
    "justify",
    "indent",
    "outdent",
    "add_html",
    "delete_html",
    "redo",
    "undo",
    "specialchars",
    "help",
];

/// Fully resolved options of one field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub field_type: FieldType,
    pub available_commands: Vec<String>,
    pub shortcut_for: BTreeMap<String, String>,
    pub special_chars: Vec<SpecialCharDef>,
    pub lang: String,
    pub indent_size: u32,
    pub attach_button_bar: bool,
    pub attach_special_char_bar: bool,
    pub defer_frame_creation: bool,
    pub frame_head: String,
    pub use_markup_filters: bool,
    pub form: Option<String>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            field_type: FieldType::SingleLine,
            available_commands: DEFAULT_COMMANDS.iter().map(|c| c.to_string()).collect(),
            shortcut_for: BTreeMap::new(),
            special_chars: vec![
                SpecialCharDef::new("ldquo", '\u{201C}'),
                SpecialCharDef::new("rdquo", '\u{201D}'),
                SpecialCharDef::new("lsquo", '\u{2018}'),
                SpecialCharDef::new("rsquo", '\u{2019}'),
                SpecialCharDef::new("ndash", '\u{2013}'),
            ],
            lang: "en".to_string(),
            indent_size: 20,
            attach_button_bar: false,
            attach_special_char_bar: false,
            defer_frame_creation: true,
            frame_head: String::new(),
            use_markup_filters: false,
            form: None,
        }
    }
}

impl FieldConfig {
    /// Resolves the built-in defaults overlaid by `layers`, lowest priority first.
    pub fn resolve(layers: &[&ConfigLayer]) -> Self {
        let merged = layers
            .iter()
            .fold(ConfigLayer::default(), |acc, layer| acc.merge(layer));
        Self::default().apply(merged)
    }

    fn apply(mut self, layer: ConfigLayer) -> Self {
        if let Some(v) = layer.field_type {
            self.field_type = v;
        }
        if let Some(v) = layer.available_commands {
            self.available_commands = v;
        }
        if let Some(v) = layer.shortcut_for {
            self.shortcut_for = v;
        }
        if let Some(v) = layer.special_chars {
            self.special_chars = v;
        }
        if let Some(v) = layer.lang {
            self.lang = v;
        }
        if let Some(v) = layer.indent_size {
            self.indent_size = v;
        }
        if let Some(v) = layer.attach_button_bar {
            self.attach_button_bar = v;
        }
        if let Some(v) = layer.attach_special_char_bar {
            self.attach_special_char_bar = v;
        }
        if let Some(v) = layer.defer_frame_creation {
            self.defer_frame_creation = v;
        }
        if let Some(v) = layer.frame_head {
            self.frame_head = v;
        }
        if let Some(v) = layer.use_markup_filters {
            self.use_markup_filters = v;
        }
        self.form = layer.form;
        self
    }

    pub fn is_multi_line(&self) -> bool {
        self.field_type == FieldType::MultiLine
    }

    pub fn has_command(&self, name: &str) -> bool {
        self.available_commands.iter().any(|c| c == name)
    }

    /// The configured chord override for a command or special char, if any.
    pub fn shortcut_override(&self, name: &str) -> Option<&str> {
        self.shortcut_for.get(name).map(String::as_str)
    }
}
