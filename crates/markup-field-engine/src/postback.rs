use serde::{Deserialize, Serialize};
use std::fmt;

/// Block alignment of a field, posted as `F_align`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    pub fn as_str(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "justify",
        }
    }

    /// Reads a `text-align` value; anything unknown is `left`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            "justify" => Alignment::Justify,
            _ => Alignment::Left,
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The values a field writes into its hidden form inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Postback {
    pub html: String,
    /// Indent in pixels.
    pub indent: i32,
    pub align: Alignment,
}

/// Names of the hidden inputs of field `id`: value, indent, alignment.
pub fn input_names(id: &str) -> [String; 3] {
    [id.to_string(), format!("{id}_indent"), format!("{id}_align")]
}
