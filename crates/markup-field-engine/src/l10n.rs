//! Localized strings.
//!
//! Strings are keyed by their English text. English is returned as is;
//! other languages look the key up and fall back to English when a
//! translation is missing.

use regex::Regex;
use std::sync::LazyLock;

static BRACKETED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]").expect("Invalid bracketed string regex"));

pub const SELECT_TEXT_FIRST: &str = "You have to select some text to insert a HTML element.";
pub const NO_ELEMENT_TO_DELETE: &str = "You didn't select any HTML element to delete!";
pub const ENTER_NOT_ALLOWED: &str = "The 'ENTER' key you pressed is not allowed in this context!";

const GERMAN: &[(&str, &str)] = &[
    (
        SELECT_TEXT_FIRST,
        "Sie müssen Text markieren, um ein HTML-Element einzufügen.",
    ),
    (
        NO_ELEMENT_TO_DELETE,
        "Sie haben kein HTML-Element zum Löschen ausgewählt!",
    ),
    (
        ENTER_NOT_ALLOWED,
        "Die 'ENTER'-Taste ist in diesem Zusammenhang nicht erlaubt!",
    ),
    ("Insert", "Einfügen"),
    ("Abbreviation", "Abkürzung"),
    ("Acronym", "Akronym"),
    ("Link", "Link"),
    ("URL", "URL"),
    ("Title", "Titel"),
    ("OK", "OK"),
    ("Cancel", "Abbrechen"),
    ("Close", "Schließen"),
    ("Shortcuts", "Tastenkürzel"),
    ("Toggle Selectall", "Alles markieren"),
    ("Bold", "Fett"),
    ("Italic", "Kursiv"),
    ("Underline", "Unterstrichen"),
    ("Strikethrough", "Durchgestrichen"),
    ("Subscript", "Tiefgestellt"),
    ("Superscript", "Hochgestellt"),
    ("Cut", "Ausschneiden"),
    ("Copy", "Kopieren"),
    ("Paste", "Einfügen"),
    ("Align Left", "Linksbündig"),
    ("Align Center", "Zentriert"),
    ("Align Right", "Rechtsbündig"),
    ("Justify", "Blocksatz"),
    ("Indent", "Einrücken"),
    ("Outdent", "Ausrücken"),
    ("Add Html", "HTML-Element einfügen"),
    ("Delete Html", "HTML-Element löschen"),
    ("Redo", "Wiederherstellen"),
    ("Undo", "Rückgängig"),
    ("Specialchars", "Sonderzeichen"),
    ("Help", "Hilfe"),
];

/// Looks up display strings.
pub trait Localizer {
    fn localize(&self, text: &str) -> String;

    /// Replaces every `[text]` in a dialog template by its translation.
    fn localize_dialog(&self, template: &str) -> String {
        BRACKETED_RE
            .replace_all(template, |caps: &regex::Captures<'_>| self.localize(&caps[1]))
            .into_owned()
    }
}

/// The built-in string tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lexicon {
    table: Option<&'static [(&'static str, &'static str)]>,
}

impl Lexicon {
    pub fn english() -> Self {
        Self { table: None }
    }

    /// The lexicon for an RFC 3066 language tag; unknown languages get English.
    pub fn for_lang(lang: &str) -> Self {
        let primary = lang
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "de" => Self {
                table: Some(GERMAN),
            },
            "en" => Self::english(),
            _ => {
                log::warn!("no strings for language {lang:?}, using English");
                Self::english()
            }
        }
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::english()
    }
}

impl Localizer for Lexicon {
    fn localize(&self, text: &str) -> String {
        self.table
            .and_then(|t| t.iter().find(|(en, _)| *en == text))
            .map_or(text, |(_, translated)| *translated)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("en", "Bold", "Bold")]
    #[case("de", "Bold", "Fett")]
    #[case("de-AT", "Cancel", "Abbrechen")]
    #[case("de", "Unknown string", "Unknown string")]
    #[case("fr", "Bold", "Bold")]
    fn lookups(#[case] lang: &str, #[case] text: &str, #[case] expected: &str) {
        assert_eq!(Lexicon::for_lang(lang).localize(text), expected);
    }

    #[test]
    fn dialog_templates() {
        let template = r#"<label>[Title]</label><input value="[OK]">"#;

        assert_eq!(
            Lexicon::english().localize_dialog(template),
            r#"<label>Title</label><input value="OK">"#
        );
        assert_eq!(
            Lexicon::for_lang("de").localize_dialog(template),
            r#"<label>Titel</label><input value="OK">"#
        );
    }
}
