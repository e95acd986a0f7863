use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::language::{Bilingual, Language, LocalizedFields};

/// Blog post with parallel English and Spanish columns
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Post {
    pub id: Uuid,
    pub source_language: Language, // Language the post was authored in
    pub title_en: Option<String>,
    pub title_es: Option<String>,
    pub description_en: Option<String>,
    pub description_es: Option<String>,
    pub content_en: Option<String>,
    pub content_es: Option<String>,
    pub slug_en: Option<String>,
    pub slug_es: Option<String>,
    pub cover_image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a post in its source language
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreatePost {
    pub language: Language,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub slug: Option<String>,
    pub cover_image_url: Option<String>,
    pub published: Option<bool>,
}

/// Request body for editing a post.
///
/// `title` and `slug` are accepted for form compatibility but never applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdatePost {
    pub language: Language,
    pub title: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub translate: Option<bool>,
    pub cover_image_url: Option<String>,
    pub published: Option<bool>,
}

/// A post's fields in one language, for rendering
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LocalizedPost {
    pub id: Uuid,
    pub language: Language, // Language actually served, after fallback
    pub title: String,
    pub description: String,
    pub content: String,
    pub slug: String,
    pub cover_image_url: Option<String>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persistence payload for a post row
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: Uuid,
    pub source_language: Language,
    pub text: Bilingual<Option<LocalizedFields>>,
    pub cover_image_url: Option<String>,
    pub published: bool,
}

impl Post {
    /// Fields for `language`, if that language is fully populated
    pub fn fields(&self, language: Language) -> Option<LocalizedFields> {
        let (title, description, content, slug) = match language {
            Language::En => (&self.title_en, &self.description_en, &self.content_en, &self.slug_en),
            Language::Es => (&self.title_es, &self.description_es, &self.content_es, &self.slug_es),
        };
        LocalizedFields::from_columns(
            title.as_deref(),
            description.as_deref(),
            content.as_deref(),
            slug.as_deref(),
            true,
        )
    }

    pub fn text(&self) -> Bilingual<Option<LocalizedFields>> {
        Bilingual {
            en: self.fields(Language::En),
            es: self.fields(Language::Es),
        }
    }

    pub fn to_record(&self) -> PostRecord {
        PostRecord {
            id: self.id,
            source_language: self.source_language,
            text: self.text(),
            cover_image_url: self.cover_image_url.clone(),
            published: self.published,
        }
    }

    /// View in `language`, falling back to the other language when it is missing
    pub fn localized(&self, language: Language) -> Option<LocalizedPost> {
        let (served, fields) = self
            .fields(language)
            .map(|f| (language, f))
            .or_else(|| self.fields(language.counterpart()).map(|f| (language.counterpart(), f)))?;

        Some(LocalizedPost {
            id: self.id,
            language: served,
            title: fields.title,
            description: fields.description,
            content: fields.content.unwrap_or_default(),
            slug: fields.slug,
            cover_image_url: self.cover_image_url.clone(),
            published: self.published,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn column<'a>(text: &'a Bilingual<Option<LocalizedFields>>, language: Language) -> Columns<'a> {
    let fields = text.get(language).as_ref();
    Columns {
        title: fields.map(|f| f.title.as_str()),
        description: fields.map(|f| f.description.as_str()),
        content: fields.and_then(|f| f.content.as_deref()),
        slug: fields.map(|f| f.slug.as_str()),
    }
}

struct Columns<'a> {
    title: Option<&'a str>,
    description: Option<&'a str>,
    content: Option<&'a str>,
    slug: Option<&'a str>,
}

impl Post {
    pub async fn create(pool: &SqlitePool, record: &PostRecord) -> Result<Self, sqlx::Error> {
        let en = column(&record.text, Language::En);
        let es = column(&record.text, Language::Es);
        let now = Utc::now();

        sqlx::query_as::<_, Post>(
            r#"INSERT INTO posts (
                id, source_language,
                title_en, title_es, description_en, description_es,
                content_en, content_es, slug_en, slug_es,
                cover_image_url, published, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            RETURNING *"#,
        )
        .bind(record.id)
        .bind(record.source_language)
        .bind(en.title)
        .bind(es.title)
        .bind(en.description)
        .bind(es.description)
        .bind(en.content)
        .bind(es.content)
        .bind(en.slug)
        .bind(es.slug)
        .bind(&record.cover_image_url)
        .bind(record.published)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Overwrite every mutable column of an existing post
    pub async fn update(pool: &SqlitePool, record: &PostRecord) -> Result<Self, sqlx::Error> {
        let en = column(&record.text, Language::En);
        let es = column(&record.text, Language::Es);

        sqlx::query_as::<_, Post>(
            r#"UPDATE posts
            SET title_en = $2, title_es = $3,
                description_en = $4, description_es = $5,
                content_en = $6, content_es = $7,
                slug_en = $8, slug_es = $9,
                cover_image_url = $10,
                published = $11,
                updated_at = $12
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(record.id)
        .bind(en.title)
        .bind(es.title)
        .bind(en.description)
        .bind(es.description)
        .bind(en.content)
        .bind(es.content)
        .bind(en.slug)
        .bind(es.slug)
        .bind(&record.cover_image_url)
        .bind(record.published)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Post whose English or Spanish slug equals `slug`
    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE slug_en = $1 OR slug_es = $1 LIMIT 1")
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Like [`Post::find_by_slug`] but ignoring the post `exclude_id`
    pub async fn find_by_slug_excluding(
        pool: &SqlitePool,
        slug: &str,
        exclude_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>(
            "SELECT * FROM posts WHERE (slug_en = $1 OR slug_es = $1) AND id != $2 LIMIT 1",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Post>("SELECT * FROM posts ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
