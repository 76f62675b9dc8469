//! Target-language heuristic: Sinhala script in, English out; anything else goes to Sinhala.

use std::fmt;

/// Sinhala Unicode block (U+0D80..=U+0DFF).
const SINHALA_BLOCK: std::ops::RangeInclusive<char> = '\u{0D80}'..='\u{0DFF}';

/// One of the two languages the bot translates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    English,
    Sinhala,
}

impl Language {
    /// Two-letter code sent to the translator (`to=` parameter).
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Sinhala => "si",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Sinhala => "Sinhala",
        }
    }

    /// Parse a two-letter code (case-insensitive). Only `en` and `si` are known.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Some(Language::English),
            "si" => Some(Language::Sinhala),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// True if any character of `text` is in the Sinhala block.
pub fn contains_sinhala(text: &str) -> bool {
    text.chars().any(|c| SINHALA_BLOCK.contains(&c))
}

/// Pick the translation target for `text`.
///
/// Text with at least one Sinhala character is translated to English; everything else
/// (English, other scripts, digits, punctuation, empty) is translated to Sinhala.
pub fn target_language(text: &str) -> Language {
    if contains_sinhala(text) {
        Language::English
    } else {
        Language::Sinhala
    }
}
