//! Create and update flows for bilingual posts and products.
//!
//! Order within a request is fixed: validate the source fields, check slug
//! availability, translate into the counterpart language, check the
//! translated slug, then persist. A failed translation aborts the write.

use async_trait::async_trait;
use db::models::{
    language::{Bilingual, Language, LocalizedFields},
    post::{CreatePost, Post, PostRecord, UpdatePost},
    product::{CreateProduct, Product, ProductRecord, UpdateProduct},
};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{info, warn};
use utils::{
    slug::{generate_slug, is_valid_slug},
    text::non_empty,
};
use uuid::Uuid;

use super::{
    pricing::{self, PriceEdit, PriceError},
    translation::{PrimaryText, TranslationError, TranslationGateway},
};

#[derive(Debug, Error)]
pub enum BilingualError {
    #[error("missing required field `{field}`")]
    Validation { field: &'static str },
    #[error("slug `{slug}` is already in use")]
    SlugConflict { slug: String },
    #[error("translation failed: {0}")]
    Translation(#[from] TranslationError),
    #[error("invalid price: {0}")]
    Price(#[from] PriceError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} not found")]
    NotFound(&'static str),
}

/// Lookup of which entity, other than `exclude`, uses a slug in either language column
#[async_trait]
pub trait SlugRegistry: Send + Sync {
    async fn slug_owner(&self, slug: &str, exclude: Option<Uuid>) -> Result<Option<Uuid>, sqlx::Error>;
}

pub struct PostSlugs<'a>(pub &'a SqlitePool);

#[async_trait]
impl SlugRegistry for PostSlugs<'_> {
    async fn slug_owner(&self, slug: &str, exclude: Option<Uuid>) -> Result<Option<Uuid>, sqlx::Error> {
        let post = match exclude {
            Some(id) => Post::find_by_slug_excluding(self.0, slug, id).await?,
            None => Post::find_by_slug(self.0, slug).await?,
        };
        Ok(post.map(|post| post.id))
    }
}

pub struct ProductSlugs<'a>(pub &'a SqlitePool);

#[async_trait]
impl SlugRegistry for ProductSlugs<'_> {
    async fn slug_owner(&self, slug: &str, exclude: Option<Uuid>) -> Result<Option<Uuid>, sqlx::Error> {
        let product = match exclude {
            Some(id) => Product::find_by_slug_excluding(self.0, slug, id).await?,
            None => Product::find_by_slug(self.0, slug).await?,
        };
        Ok(product.map(|product| product.id))
    }
}

/// Source-language text submitted at creation
#[derive(Debug, Clone, Default)]
pub struct SourceFields {
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub slug: Option<String>,
}

/// Body edit for one language. Titles and slugs are not part of it.
#[derive(Debug, Clone)]
pub struct BodyEdit {
    pub language: Language,
    pub description: Option<String>,
    pub content: Option<String>,
    pub translate: bool,
}

#[derive(Clone)]
pub struct BilingualSynchronizer {
    translator: TranslationGateway,
}

impl BilingualSynchronizer {
    pub fn new(translator: TranslationGateway) -> Self {
        Self { translator }
    }

    /// Fail with `SlugConflict` if another entity (other than `exclude`) uses `slug`
    pub async fn ensure_slug_available(
        registry: &dyn SlugRegistry,
        slug: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), BilingualError> {
        match registry.slug_owner(slug, exclude).await? {
            Some(owner) => {
                warn!(slug = %slug, owner = %owner, "Slug already in use");
                Err(BilingualError::SlugConflict {
                    slug: slug.to_string(),
                })
            }
            None => Ok(()),
        }
    }

    /// Validate source fields and produce both languages' text for a new entity
    pub async fn prepare_create(
        &self,
        language: Language,
        input: SourceFields,
        primary: PrimaryText,
        registry: &dyn SlugRegistry,
    ) -> Result<Bilingual<LocalizedFields>, BilingualError> {
        let title = non_empty(Some(&input.title))
            .ok_or(BilingualError::Validation { field: "title" })?
            .to_string();

        match primary {
            PrimaryText::Content if non_empty(input.content.as_deref()).is_none() => {
                return Err(BilingualError::Validation { field: "content" });
            }
            PrimaryText::Description if non_empty(Some(&input.description)).is_none() => {
                return Err(BilingualError::Validation { field: "description" });
            }
            _ => {}
        }

        let slug = match input.slug.as_deref() {
            Some(supplied) => {
                let slug = generate_slug(supplied);
                if !is_valid_slug(supplied) {
                    info!(supplied = %supplied, slug = %slug, "Normalized supplied slug");
                }
                slug
            }
            None => generate_slug(&title),
        };
        if slug.is_empty() {
            return Err(BilingualError::Validation { field: "slug" });
        }

        Self::ensure_slug_available(registry, &slug, None).await?;

        let source = LocalizedFields {
            title,
            description: input.description.trim().to_string(),
            content: input.content,
            slug,
        };

        let translated = self
            .translator
            .translate(&source, language, language.counterpart(), primary)
            .await?;

        if translated.slug != source.slug {
            Self::ensure_slug_available(registry, &translated.slug, None).await?;
        }

        Ok(Bilingual::from_source(language, source, translated))
    }

    /// Apply a body edit and, when asked, re-translate it into the counterpart's body.
    ///
    /// Titles and slugs of both languages are left exactly as they were.
    pub async fn prepare_body_update(
        &self,
        current: &Bilingual<Option<LocalizedFields>>,
        edit: BodyEdit,
        primary: PrimaryText,
    ) -> Result<Bilingual<Option<LocalizedFields>>, BilingualError> {
        let mut next = current.clone();
        let target = edit.language;

        let edited = next
            .get_mut(target)
            .as_mut()
            .ok_or(BilingualError::Validation { field: "language" })?;

        if let Some(description) = edit.description {
            if primary == PrimaryText::Description && description.trim().is_empty() {
                return Err(BilingualError::Validation { field: "description" });
            }
            edited.description = description.trim().to_string();
        }
        if let Some(content) = edit.content {
            if primary == PrimaryText::Content && content.trim().is_empty() {
                return Err(BilingualError::Validation { field: "content" });
            }
            edited.content = Some(content);
        }
        let edited = edited.clone();

        if !edit.translate {
            return Ok(next);
        }

        let counterpart = target.counterpart();
        let Some(existing) = next.get_mut(counterpart).as_mut() else {
            warn!(language = %counterpart, "No counterpart text to re-translate into, skipping");
            return Ok(next);
        };

        let translated = self
            .translator
            .translate(&edited, target, counterpart, primary)
            .await?;

        existing.description = translated.description;
        if primary == PrimaryText::Content || existing.content.is_some() {
            existing.content = translated.content;
        }

        Ok(next)
    }

    pub async fn create_post(&self, pool: &SqlitePool, data: CreatePost) -> Result<Post, BilingualError> {
        let text = self
            .prepare_create(
                data.language,
                SourceFields {
                    title: data.title,
                    description: data.description.unwrap_or_default(),
                    content: Some(data.content),
                    slug: data.slug,
                },
                PrimaryText::Content,
                &PostSlugs(pool),
            )
            .await?;

        let record = PostRecord {
            id: Uuid::new_v4(),
            source_language: data.language,
            text: text.map(Some),
            cover_image_url: data.cover_image_url,
            published: data.published.unwrap_or(false),
        };

        let post = Post::create(pool, &record)
            .await
            .map_err(|e| slug_race(e, &record.text))?;
        info!(post_id = %post.id, language = %post.source_language, "Created bilingual post");
        Ok(post)
    }

    pub async fn update_post(
        &self,
        pool: &SqlitePool,
        id: Uuid,
        data: UpdatePost,
    ) -> Result<Post, BilingualError> {
        let post = Post::find_by_id(pool, id)
            .await?
            .ok_or(BilingualError::NotFound("post"))?;

        if data.title.is_some() || data.slug.is_some() {
            warn!(post_id = %id, "Ignoring title/slug in post update");
        }

        let mut record = post.to_record();
        record.text = self
            .prepare_body_update(
                &record.text,
                BodyEdit {
                    language: data.language,
                    description: data.description,
                    content: data.content,
                    translate: data.translate.unwrap_or(false),
                },
                PrimaryText::Content,
            )
            .await?;
        if let Some(cover_image_url) = data.cover_image_url {
            record.cover_image_url = non_empty(Some(&cover_image_url)).map(str::to_string);
        }
        if let Some(published) = data.published {
            record.published = published;
        }

        let post = Post::update(pool, &record).await?;
        info!(post_id = %post.id, "Updated post");
        Ok(post)
    }

    pub async fn create_product(
        &self,
        pool: &SqlitePool,
        data: CreateProduct,
    ) -> Result<Product, BilingualError> {
        let price = pricing::from_submission(
            data.price,
            data.is_on_sale.unwrap_or(false),
            data.discount_percentage,
        )?;

        let text = self
            .prepare_create(
                data.language,
                SourceFields {
                    title: data.title,
                    description: data.description,
                    content: None,
                    slug: data.slug,
                },
                PrimaryText::Description,
                &ProductSlugs(pool),
            )
            .await?;

        let record = ProductRecord {
            id: Uuid::new_v4(),
            source_language: data.language,
            text: text.map(Some),
            price,
            product_type: data.product_type,
            sku: non_empty(data.sku.as_deref()).map(str::to_string),
            variants: data.variants.unwrap_or_default(),
            digital_files: data.digital_files.unwrap_or_default(),
            images: data.images.unwrap_or_default(),
        };

        let product = Product::create(pool, &record)
            .await
            .map_err(|e| slug_race(e, &record.text))?;
        info!(
            product_id = %product.id,
            language = %product.source_language,
            price = product.price,
            final_price = ?product.final_price,
            "Created bilingual product"
        );
        Ok(product)
    }

    pub async fn update_product(
        &self,
        pool: &SqlitePool,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Product, BilingualError> {
        let product = Product::find_by_id(pool, id)
            .await?
            .ok_or(BilingualError::NotFound("product"))?;
        let mut record = product.to_record();

        // Changed price fields go through the resolver in form order
        let current = record.price;
        let edits = [
            data.is_on_sale
                .filter(|on_sale| *on_sale != current.is_on_sale)
                .map(PriceEdit::IsOnSale),
            data.discount_percentage
                .filter(|d| Some(*d) != current.discount_percentage)
                .map(PriceEdit::DiscountPercentage),
            data.price
                .filter(|p| *p != current.price)
                .map(PriceEdit::OriginalPrice),
        ];
        record.price = pricing::resolve_all(&current, edits.into_iter().flatten())?;

        if let Some(requested) = data.slug.as_deref() {
            let slug = generate_slug(requested);
            if slug.is_empty() {
                return Err(BilingualError::Validation { field: "slug" });
            }
            let fields = record
                .text
                .get_mut(data.language)
                .as_mut()
                .ok_or(BilingualError::Validation { field: "language" })?;
            if fields.slug != slug {
                Self::ensure_slug_available(&ProductSlugs(pool), &slug, Some(id)).await?;
                fields.slug = slug;
            }
        }

        record.text = self
            .prepare_body_update(
                &record.text,
                BodyEdit {
                    language: data.language,
                    description: data.description,
                    content: None,
                    translate: data.translate.unwrap_or(false),
                },
                PrimaryText::Description,
            )
            .await?;

        if let Some(sku) = data.sku {
            record.sku = non_empty(Some(&sku)).map(str::to_string);
        }
        if let Some(variants) = data.variants {
            record.variants = variants;
        }
        if let Some(digital_files) = data.digital_files {
            record.digital_files = digital_files;
        }
        if let Some(images) = data.images {
            record.images = images;
        }

        let product = Product::update(pool, &record)
            .await
            .map_err(|e| slug_race(e, &record.text))?;
        info!(product_id = %product.id, "Updated product");
        Ok(product)
    }
}

/// A unique-index violation on insert means a concurrent write took one of the slugs
fn slug_race(err: sqlx::Error, text: &Bilingual<Option<LocalizedFields>>) -> BilingualError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            let slug = Language::ALL
                .iter()
                .filter_map(|l| text.get(*l).as_ref())
                .map(|f| f.slug.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            BilingualError::SlugConflict { slug }
        }
        _ => BilingualError::Database(err),
    }
}
