//! Machine translation of bilingual entity text through the language model.

use std::sync::Arc;

use db::models::language::{Language, LocalizedFields};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};
use utils::{slug::generate_slug, text::preview};

use super::language_model::{LanguageModel, LanguageModelError};

const SYSTEM_PROMPT: &str = "You are a professional translator for a travel community website. \
     You translate blog posts and store listings between English and Spanish. Output valid JSON only.";

#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("translation service error: {0}")]
    Service(#[from] LanguageModelError),
    #[error("could not parse translation response: {0}")]
    Parse(String),
    #[error("translation response is missing `{field}`")]
    Validation { field: &'static str },
}

/// Field holding an entity's main body text, which a translation must return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryText {
    /// Rich-text `content` (posts)
    Content,
    /// Plain `description` (products)
    Description,
}

#[derive(Debug, Serialize)]
struct SourcePayload<'a> {
    title: &'a str,
    description: &'a str,
    content: Option<&'a str>,
    slug: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct TranslationResponse {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    slug: Option<String>,
}

#[derive(Clone)]
pub struct TranslationGateway {
    model: Arc<dyn LanguageModel>,
}

impl TranslationGateway {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Translate `fields` from `from` into `to`.
    ///
    /// Same-language requests return the input without calling the model. A
    /// missing or unusable slug in the response is derived from the translated title.
    pub async fn translate(
        &self,
        fields: &LocalizedFields,
        from: Language,
        to: Language,
        primary: PrimaryText,
    ) -> Result<LocalizedFields, TranslationError> {
        if from == to {
            return Ok(fields.clone());
        }

        info!(from = %from, to = %to, title = %fields.title, "Translating entity text");

        let prompt = build_prompt(fields, from, to)?;
        let raw = self.model.complete(&prompt, Some(SYSTEM_PROMPT)).await.map_err(|e| {
            error!(from = %from, to = %to, error = %e, "Translation service call failed");
            e
        })?;

        let response = parse_response(&raw)?;
        into_fields(response, fields, primary)
    }
}

fn build_prompt(fields: &LocalizedFields, from: Language, to: Language) -> Result<String, TranslationError> {
    let source = SourcePayload {
        title: &fields.title,
        description: &fields.description,
        content: fields.content.as_deref(),
        slug: &fields.slug,
    };
    let source_json =
        serde_json::to_string_pretty(&source).map_err(|e| TranslationError::Parse(e.to_string()))?;

    Ok(format!(
        r#"Translate the following content from {from} to {to}.

## Source ({from})
```json
{source_json}
```

## Instructions
1. Preserve all HTML tags, attributes and embedded markup exactly as they are; translate only the human-readable text between them
2. Translate contextually and naturally for a {to}-speaking traveller, not word for word
3. Keep proper nouns, place names, brand names and product names unchanged unless they have a well-established {to} form
4. The slug must be a lowercase, hyphen-separated URL slug derived from the translated title
5. If a source field is null or empty, return it as null or empty

## Output Format
Return ONLY a JSON object with exactly these keys:
```json
{{
  "title": "translated title",
  "description": "translated description",
  "content": "translated content",
  "slug": "translated-slug"
}}
```
"#,
        from = from.name(),
        to = to.name(),
    ))
}

fn parse_response(raw: &str) -> Result<TranslationResponse, TranslationError> {
    let direct = match serde_json::from_str::<TranslationResponse>(raw.trim()) {
        Ok(response) => return Ok(response),
        Err(e) => e,
    };

    if let Some(Ok(response)) = fenced_block(raw).map(serde_json::from_str::<TranslationResponse>) {
        return Ok(response);
    }

    if let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) {
        if start < end {
            if let Ok(response) = serde_json::from_str::<TranslationResponse>(&raw[start..=end]) {
                return Ok(response);
            }
        }
    }

    error!(
        json_error = %direct,
        response_length = raw.len(),
        response_preview = %preview(raw, 500),
        "Failed to parse translation response"
    );
    Err(TranslationError::Parse(direct.to_string()))
}

/// Contents of the first ```json or bare ``` fenced block
fn fenced_block(text: &str) -> Option<&str> {
    if let Some(start) = text.find("```json") {
        let content_start = start + 7;
        if let Some(end) = text[content_start..].find("```") {
            return Some(text[content_start..content_start + end].trim());
        }
    }

    let start = text.find("```")?;
    let content_start = start + 3;
    // Skip past any language identifier on the opening line
    let content_start = text[content_start..]
        .find('\n')
        .map(|i| content_start + i + 1)
        .unwrap_or(content_start);
    let end = text[content_start..].find("```")?;
    Some(text[content_start..content_start + end].trim())
}

fn into_fields(
    response: TranslationResponse,
    source: &LocalizedFields,
    primary: PrimaryText,
) -> Result<LocalizedFields, TranslationError> {
    let present = |value: Option<String>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let title = present(response.title).ok_or(TranslationError::Validation { field: "title" })?;
    let description = present(response.description);
    let content = present(response.content);

    match primary {
        PrimaryText::Content if content.is_none() => {
            return Err(TranslationError::Validation { field: "content" });
        }
        PrimaryText::Description if description.is_none() => {
            return Err(TranslationError::Validation { field: "description" });
        }
        _ => {}
    }

    let slug = match present(response.slug).map(|s| generate_slug(&s)) {
        Some(slug) if !slug.is_empty() => slug,
        _ => {
            warn!(title = %title, "Translation returned no usable slug, deriving from title");
            generate_slug(&title)
        }
    };
    if slug.is_empty() {
        return Err(TranslationError::Validation { field: "slug" });
    }

    Ok(LocalizedFields {
        title,
        description: description.unwrap_or_default(),
        content: match primary {
            PrimaryText::Content => content,
            PrimaryText::Description if source.content.is_some() => content,
            PrimaryText::Description => None,
        },
        slug,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::ScriptedModel;

    fn post_fields() -> LocalizedFields {
        LocalizedFields {
            title: "Hello".to_string(),
            description: "A first post".to_string(),
            content: Some("<p>Hello <strong>world</strong></p>".to_string()),
            slug: "hello".to_string(),
        }
    }

    #[tokio::test]
    async fn test_same_language_is_identity_without_call() {
        let model = ScriptedModel::new(vec![]);
        let gateway = TranslationGateway::new(model.clone());

        let fields = post_fields();
        let out = gateway
            .translate(&fields, Language::En, Language::En, PrimaryText::Content)
            .await
            .unwrap();

        assert_eq!(out, fields);
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_translates_plain_json() {
        let model = ScriptedModel::replying(
            r#"{"title": "Hola", "description": "Una primera entrada", "content": "<p>Hola <strong>mundo</strong></p>", "slug": "hola"}"#,
        );
        let gateway = TranslationGateway::new(model.clone());

        let out = gateway
            .translate(&post_fields(), Language::En, Language::Es, PrimaryText::Content)
            .await
            .unwrap();

        assert_eq!(out.title, "Hola");
        assert_eq!(out.slug, "hola");
        assert_eq!(out.content.as_deref(), Some("<p>Hola <strong>mundo</strong></p>"));
        assert_eq!(model.calls(), 1);
        assert!(model.last_prompt().unwrap().contains("from English to Spanish"));
    }

    #[tokio::test]
    async fn test_missing_slug_is_derived_from_title() {
        let model = ScriptedModel::replying(
            r#"{"title": "Cómo Viajar a Japón", "description": "", "content": "<p>...</p>"}"#,
        );
        let gateway = TranslationGateway::new(model);

        let out = gateway
            .translate(&post_fields(), Language::En, Language::Es, PrimaryText::Content)
            .await
            .unwrap();
        assert_eq!(out.slug, "como-viajar-a-japon");
    }

    #[tokio::test]
    async fn test_missing_primary_text_fails_validation() {
        let model = ScriptedModel::replying(r#"{"title": "Hola", "content": "", "slug": "hola"}"#);
        let gateway = TranslationGateway::new(model);

        let err = gateway
            .translate(&post_fields(), Language::En, Language::Es, PrimaryText::Content)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::Validation { field: "content" }));
    }

    #[tokio::test]
    async fn test_product_requires_description() {
        let model = ScriptedModel::replying(r#"{"title": "Guide", "slug": "guide"}"#);
        let gateway = TranslationGateway::new(model);
        let fields = LocalizedFields {
            title: "Guía".to_string(),
            description: "Una guía".to_string(),
            content: None,
            slug: "guia".to_string(),
        };

        let err = gateway
            .translate(&fields, Language::Es, Language::En, PrimaryText::Description)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::Validation { field: "description" }));
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let model = ScriptedModel::failing(LanguageModelError::RateLimited);
        let gateway = TranslationGateway::new(model);

        let err = gateway
            .translate(&post_fields(), Language::En, Language::Es, PrimaryText::Content)
            .await
            .unwrap_err();
        assert!(matches!(err, TranslationError::Service(LanguageModelError::RateLimited)));
    }

    #[test]
    fn test_parse_fenced_json_block() {
        let raw = "Here is the translation:\n```json\n{\"title\": \"Hola\", \"content\": \"x\"}\n```\nEnjoy!";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.title.as_deref(), Some("Hola"));
    }

    #[test]
    fn test_parse_generic_fenced_block() {
        let raw = "```\n{\"title\": \"Hola\"}\n```";
        assert_eq!(parse_response(raw).unwrap().title.as_deref(), Some("Hola"));
    }

    #[test]
    fn test_parse_brace_slice() {
        let raw = "Sure! {\"title\": \"Hola\", \"slug\": \"hola\"} Let me know if you need more.";
        let response = parse_response(raw).unwrap();
        assert_eq!(response.slug.as_deref(), Some("hola"));
    }

    #[test]
    fn test_parse_failure() {
        let err = parse_response("Lo siento, no puedo ayudar con eso.").unwrap_err();
        assert!(matches!(err, TranslationError::Parse(_)));
    }

    #[test]
    fn test_model_slug_is_normalized() {
        let response = TranslationResponse {
            title: Some("Hola Mundo".to_string()),
            content: Some("<p>x</p>".to_string()),
            slug: Some("Hola Mundo!".to_string()),
            ..Default::default()
        };
        let out = into_fields(response, &post_fields(), PrimaryText::Content).unwrap();
        assert_eq!(out.slug, "hola-mundo");
    }
}
