//! Language tags and execution requests.

use std::fmt;
use std::str::FromStr;

/// A language the dispatcher knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    React,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Python, Language::JavaScript, Language::React];

    /// Canonical tag.
    pub fn tag(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::React => "react",
        }
    }

    /// Exact match on a canonical tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Language::ALL.into_iter().find(|language| language.tag() == tag)
    }

    /// Guess the language from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "py" => Some(Language::Python),
            "js" | "mjs" => Some(Language::JavaScript),
            "jsx" | "tsx" => Some(Language::React),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Lenient parse for user input: case-insensitive, with short aliases.
impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "javascript" | "js" => Ok(Language::JavaScript),
            "react" | "jsx" => Ok(Language::React),
            _ => Err(format!("unknown language '{}'", s)),
        }
    }
}

/// The language tag attached to a request, as chosen by the editor.
///
/// Only the canonical tags are known; anything else (aliases and other
/// casings included) stays representable as `Unknown` so it can be
/// dispatched and reported.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LanguageTag {
    Known(Language),
    Unknown(String),
}

impl LanguageTag {
    pub fn language(&self) -> Option<Language> {
        match self {
            LanguageTag::Known(language) => Some(*language),
            LanguageTag::Unknown(_) => None,
        }
    }
}

impl From<&str> for LanguageTag {
    fn from(tag: &str) -> Self {
        match Language::from_tag(tag) {
            Some(language) => LanguageTag::Known(language),
            None => LanguageTag::Unknown(tag.to_string()),
        }
    }
}

impl From<Language> for LanguageTag {
    fn from(language: Language) -> Self {
        LanguageTag::Known(language)
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LanguageTag::Known(language) => language.fmt(f),
            LanguageTag::Unknown(tag) => f.write_str(tag),
        }
    }
}

/// One "run" action: a language tag and the editor's source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    pub language: LanguageTag,
    pub source: String,
}

impl ExecutionRequest {
    pub fn new(language: impl Into<LanguageTag>, source: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_and_aliases() {
        assert_eq!("python".parse(), Ok(Language::Python));
        assert_eq!("PY".parse(), Ok(Language::Python));
        assert_eq!(" JavaScript ".parse(), Ok(Language::JavaScript));
        assert_eq!("jsx".parse(), Ok(Language::React));
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        assert_eq!(LanguageTag::from("react"), LanguageTag::Known(Language::React));
        for tag in ["js", "Python", " javascript ", "JSX"] {
            assert_eq!(LanguageTag::from(tag), LanguageTag::Unknown(tag.to_string()));
        }
        let tag = LanguageTag::from("ruby");
        assert_eq!(tag, LanguageTag::Unknown("ruby".to_string()));
        assert_eq!(tag.language(), None);
        assert_eq!(tag.to_string(), "ruby");
    }

    #[test]
    fn test_extensions() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension("mjs"), Some(Language::JavaScript));
        assert_eq!(Language::from_extension("TSX"), Some(Language::React));
        assert_eq!(Language::from_extension("rs"), None);
    }

    #[test]
    fn test_canonical_tags_round_trip() {
        for language in Language::ALL {
            assert_eq!(language.tag().parse(), Ok(language));
        }
    }
}
