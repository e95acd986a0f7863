use serde::{Deserialize, Serialize};
use sqlx::Type;
use strum_macros::{Display, EnumString};
use ts_rs::TS;

/// Languages every bilingual entity is stored in
#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "language", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    En,
    Es,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::En, Language::Es];

    /// The other language of the pair
    pub fn counterpart(self) -> Self {
        match self {
            Self::En => Self::Es,
            Self::Es => Self::En,
        }
    }

    /// English name, used when prompting the translation model
    pub fn name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Es => "Spanish",
        }
    }
}

/// One value per language, replacing per-language column names built at runtime.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
pub struct Bilingual<T> {
    pub en: T,
    pub es: T,
}

impl<T> Bilingual<T> {
    /// Place `source` under `source_language` and `counterpart` under the other one
    pub fn from_source(source_language: Language, source: T, counterpart: T) -> Self {
        match source_language {
            Language::En => Self {
                en: source,
                es: counterpart,
            },
            Language::Es => Self {
                en: counterpart,
                es: source,
            },
        }
    }

    pub fn get(&self, language: Language) -> &T {
        match language {
            Language::En => &self.en,
            Language::Es => &self.es,
        }
    }

    pub fn get_mut(&mut self, language: Language) -> &mut T {
        match language {
            Language::En => &mut self.en,
            Language::Es => &mut self.es,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Bilingual<U> {
        Bilingual {
            en: f(self.en),
            es: f(self.es),
        }
    }
}

/// Text one language carries for a post or product.
///
/// `content` is the rich-text body of a post; products only have `description`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
pub struct LocalizedFields {
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub slug: String,
}

impl LocalizedFields {
    /// Assemble from nullable columns; `None` unless title, slug and the primary
    /// text (content when `content_required`, otherwise description) are all present.
    pub fn from_columns(
        title: Option<&str>,
        description: Option<&str>,
        content: Option<&str>,
        slug: Option<&str>,
        content_required: bool,
    ) -> Option<Self> {
        let title = title.filter(|t| !t.trim().is_empty())?;
        let slug = slug.filter(|s| !s.trim().is_empty())?;
        if content_required {
            content.filter(|c| !c.trim().is_empty())?;
        } else {
            description.filter(|d| !d.trim().is_empty())?;
        }

        Some(Self {
            title: title.to_string(),
            description: description.unwrap_or_default().to_string(),
            content: content.map(str::to_string),
            slug: slug.to_string(),
        })
    }
}
