//! Supported languages and identifier normalization
//!
//! Callers name languages loosely: a full name ("Hindi"), a short ISO 639
//! code ("hi"), a FLORES-200 code ("hin_Deva") or a BCP 47 tag with a region
//! ("hi-IN"). [`normalize`] folds all of these into one [`Language`], and each
//! provider then asks for the code in its own [`CodeScheme`].
//!
//! # Example
//!
//! ```
//! use krishi_translate::language::{CodeScheme, Language, normalize};
//!
//! let lang = normalize("HINDI").unwrap();
//! assert_eq!(lang, Language::Hindi);
//! assert_eq!(lang.code(CodeScheme::Iso639), "hi");
//! assert_eq!(lang.code(CodeScheme::Flores), "hin_Deva");
//! ```

use crate::error::{TranslateError, TranslateResult};
use serde::Serialize;
use std::fmt;

/// Code scheme a provider expects language codes in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeScheme {
    /// Short ISO 639 code (`en`, `hi`, `mai`, `sat`)
    Iso639,
    /// FLORES-200 code (`eng_Latn`, `hin_Deva`, `sat_Olck`)
    Flores,
    /// Canonical lowercase name (`english`, `santali`)
    Name,
}

/// Canonical supported language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
    Bengali,
    Urdu,
    Maithili,
    Santali,
    Marathi,
    Tamil,
    Telugu,
    Gujarati,
    Punjabi,
    Kannada,
    Malayalam,
    Odia,
    Assamese,
    Nepali,
}

/// (language, canonical name, ISO 639 code, FLORES-200 code)
const LANGUAGE_TABLE: &[(Language, &str, &str, &str)] = &[
    (Language::English, "english", "en", "eng_Latn"),
    (Language::Hindi, "hindi", "hi", "hin_Deva"),
    (Language::Bengali, "bengali", "bn", "ben_Beng"),
    (Language::Urdu, "urdu", "ur", "urd_Arab"),
    (Language::Maithili, "maithili", "mai", "mai_Deva"),
    (Language::Santali, "santali", "sat", "sat_Olck"),
    (Language::Marathi, "marathi", "mr", "mar_Deva"),
    (Language::Tamil, "tamil", "ta", "tam_Taml"),
    (Language::Telugu, "telugu", "te", "tel_Telu"),
    (Language::Gujarati, "gujarati", "gu", "guj_Gujr"),
    (Language::Punjabi, "punjabi", "pa", "pan_Guru"),
    (Language::Kannada, "kannada", "kn", "kan_Knda"),
    (Language::Malayalam, "malayalam", "ml", "mal_Mlym"),
    (Language::Odia, "odia", "or", "ory_Orya"),
    (Language::Assamese, "assamese", "as", "asm_Beng"),
    (Language::Nepali, "nepali", "ne", "npi_Deva"),
];

impl Language {
    /// All supported languages, in table order
    pub fn all() -> impl Iterator<Item = Language> {
        LANGUAGE_TABLE.iter().map(|(lang, ..)| *lang)
    }

    fn entry(self) -> &'static (Language, &'static str, &'static str, &'static str) {
        // Every variant has exactly one row; the table is checked by tests.
        LANGUAGE_TABLE
            .iter()
            .find(|(lang, ..)| *lang == self)
            .unwrap_or(&LANGUAGE_TABLE[0])
    }

    /// Canonical lowercase name, e.g. `"maithili"`
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    /// Code for this language in the given scheme
    pub fn code(self, scheme: CodeScheme) -> &'static str {
        let entry = self.entry();
        match scheme {
            CodeScheme::Iso639 => entry.2,
            CodeScheme::Flores => entry.3,
            CodeScheme::Name => entry.1,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Language {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

fn lookup(key: &str) -> Option<Language> {
    LANGUAGE_TABLE
        .iter()
        .find(|(_, name, iso, flores)| {
            *name == key || *iso == key || flores.eq_ignore_ascii_case(key)
        })
        .map(|(lang, ..)| *lang)
}

/// Resolve a language name or code to a [`Language`]
///
/// Matching is case-insensitive and ignores surrounding whitespace. A BCP 47
/// tag with a region or script subtag (`en-US`, `hi-IN`) falls back to its
/// primary subtag.
///
/// # Errors
///
/// `TranslateError::UnsupportedLanguage` when nothing matches.
pub fn normalize(identifier: &str) -> TranslateResult<Language> {
    let key = identifier.trim().to_lowercase();

    if let Some(lang) = lookup(&key) {
        return Ok(lang);
    }

    if let Some((primary, _)) = key.split_once('-') {
        if let Some(lang) = lookup(primary) {
            return Ok(lang);
        }
    }

    Err(TranslateError::UnsupportedLanguage(identifier.to_string()))
}
