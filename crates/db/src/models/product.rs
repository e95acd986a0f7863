use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use tracing::warn;
use ts_rs::TS;
use uuid::Uuid;

use super::language::{Bilingual, Language, LocalizedFields};

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "product_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProductType {
    #[default]
    Physical,
    Digital,
}

/// Original price, discount toggle and the derived customer-facing price.
///
/// `final_price == None` means no discount applies and the customer pays `price`.
/// `Some(0.0)` is a real zero (free), never a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
pub struct PriceState {
    pub price: f64,
    pub final_price: Option<f64>,
    pub is_on_sale: bool,
    pub discount_percentage: Option<f64>,
}

impl PriceState {
    /// Regular-price state with no discount configured
    pub fn regular(price: f64) -> Self {
        Self {
            price,
            final_price: None,
            is_on_sale: false,
            discount_percentage: None,
        }
    }

    /// Price the customer is charged
    pub fn display_price(&self) -> f64 {
        self.final_price.unwrap_or(self.price)
    }
}

/// One variant dimension in one language, e.g. `Color: [Red, Blue]` in English
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct VariantItem {
    pub label: String,
    pub language: Language,
    pub values: Vec<String>,
}

/// Variant dimension after filtering to a single language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Variant {
    pub label: String,
    pub values: Vec<String>,
}

/// Keep only the variant dimensions tagged with `language`, preserving order
pub fn variants_for(items: &[VariantItem], language: Language) -> Vec<Variant> {
    items
        .iter()
        .filter(|item| item.language == language)
        .map(|item| Variant {
            label: item.label.clone(),
            values: item.values.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum DigitalFileKind {
    Url,
    File,
}

/// Download delivered for a digital product.
///
/// `values` lists the variant values the file belongs to; empty means every purchase gets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct DigitalFileDescriptor {
    pub values: Vec<String>,
    #[serde(rename = "type")]
    pub kind: DigitalFileKind,
    pub url: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Product {
    pub id: Uuid,
    pub source_language: Language,
    pub title_en: Option<String>,
    pub title_es: Option<String>,
    pub description_en: Option<String>,
    pub description_es: Option<String>,
    pub slug_en: Option<String>,
    pub slug_es: Option<String>,
    pub price: f64,
    pub final_price: Option<f64>,
    pub is_on_sale: bool,
    pub discount_percentage: Option<f64>,
    pub product_type: ProductType,
    pub sku: Option<String>,
    pub variants: String,      // JSON-serialized Vec<VariantItem>
    pub digital_files: String, // JSON-serialized Vec<DigitalFileDescriptor>
    pub images: String,        // JSON-serialized Vec<String>
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a product in its source language
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateProduct {
    pub language: Language,
    pub title: String,
    pub description: String,
    pub slug: Option<String>,
    pub price: f64,
    pub is_on_sale: Option<bool>,
    pub discount_percentage: Option<f64>,
    pub product_type: ProductType,
    pub sku: Option<String>,
    pub variants: Option<Vec<VariantItem>>,
    pub digital_files: Option<Vec<DigitalFileDescriptor>>,
    pub images: Option<Vec<String>>,
}

/// Request body for editing a product. `title` is accepted but never applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateProduct {
    pub language: Language,
    pub title: Option<String>,
    pub description: Option<String>,
    pub slug: Option<String>,
    pub translate: Option<bool>,
    pub price: Option<f64>,
    pub is_on_sale: Option<bool>,
    pub discount_percentage: Option<f64>,
    pub sku: Option<String>,
    pub variants: Option<Vec<VariantItem>>,
    pub digital_files: Option<Vec<DigitalFileDescriptor>>,
    pub images: Option<Vec<String>>,
}

/// A product's fields in one language, for the storefront
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LocalizedProduct {
    pub id: Uuid,
    pub language: Language,
    pub title: String,
    pub description: String,
    pub slug: String,
    pub price: PriceState,
    pub product_type: ProductType,
    pub sku: Option<String>,
    pub variants: Vec<Variant>,
    pub images: Vec<String>,
}

/// Persistence payload for a product row
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: Uuid,
    pub source_language: Language,
    pub text: Bilingual<Option<LocalizedFields>>,
    pub price: PriceState,
    pub product_type: ProductType,
    pub sku: Option<String>,
    pub variants: Vec<VariantItem>,
    pub digital_files: Vec<DigitalFileDescriptor>,
    pub images: Vec<String>,
}

fn parse_json_column<T: for<'de> Deserialize<'de> + Default>(id: Uuid, column: &str, json: &str) -> T {
    serde_json::from_str(json).unwrap_or_else(|e| {
        warn!(product_id = %id, column = column, error = %e, "Malformed JSON column, treating as empty");
        T::default()
    })
}

impl Product {
    pub fn fields(&self, language: Language) -> Option<LocalizedFields> {
        let (title, description, slug) = match language {
            Language::En => (&self.title_en, &self.description_en, &self.slug_en),
            Language::Es => (&self.title_es, &self.description_es, &self.slug_es),
        };
        LocalizedFields::from_columns(
            title.as_deref(),
            description.as_deref(),
            None,
            slug.as_deref(),
            false,
        )
    }

    pub fn text(&self) -> Bilingual<Option<LocalizedFields>> {
        Bilingual {
            en: self.fields(Language::En),
            es: self.fields(Language::Es),
        }
    }

    pub fn price_state(&self) -> PriceState {
        PriceState {
            price: self.price,
            final_price: self.final_price,
            is_on_sale: self.is_on_sale,
            discount_percentage: self.discount_percentage,
        }
    }

    pub fn parsed_variants(&self) -> Vec<VariantItem> {
        parse_json_column(self.id, "variants", &self.variants)
    }

    pub fn parsed_digital_files(&self) -> Vec<DigitalFileDescriptor> {
        parse_json_column(self.id, "digital_files", &self.digital_files)
    }

    pub fn parsed_images(&self) -> Vec<String> {
        parse_json_column(self.id, "images", &self.images)
    }

    pub fn to_record(&self) -> ProductRecord {
        ProductRecord {
            id: self.id,
            source_language: self.source_language,
            text: self.text(),
            price: self.price_state(),
            product_type: self.product_type,
            sku: self.sku.clone(),
            variants: self.parsed_variants(),
            digital_files: self.parsed_digital_files(),
            images: self.parsed_images(),
        }
    }

    /// View in `language`, falling back to the other language when it is missing
    pub fn localized(&self, language: Language) -> Option<LocalizedProduct> {
        let (served, fields) = self
            .fields(language)
            .map(|f| (language, f))
            .or_else(|| self.fields(language.counterpart()).map(|f| (language.counterpart(), f)))?;

        Some(LocalizedProduct {
            id: self.id,
            language: served,
            title: fields.title,
            description: fields.description,
            slug: fields.slug,
            price: self.price_state(),
            product_type: self.product_type,
            sku: self.sku.clone(),
            variants: variants_for(&self.parsed_variants(), served),
            images: self.parsed_images(),
        })
    }
}

struct EncodedRecord<'a> {
    title: Bilingual<Option<&'a str>>,
    description: Bilingual<Option<&'a str>>,
    slug: Bilingual<Option<&'a str>>,
    variants: String,
    digital_files: String,
    images: String,
}

impl<'a> EncodedRecord<'a> {
    fn new(record: &'a ProductRecord) -> Result<Self, sqlx::Error> {
        let pick = |f: fn(&'a LocalizedFields) -> &'a str| Bilingual {
            en: record.text.en.as_ref().map(f),
            es: record.text.es.as_ref().map(f),
        };
        let json = |value: serde_json::Result<String>| {
            value.map_err(|e| sqlx::Error::Protocol(e.to_string()))
        };

        Ok(Self {
            title: pick(|f| f.title.as_str()),
            description: pick(|f| f.description.as_str()),
            slug: pick(|f| f.slug.as_str()),
            variants: json(serde_json::to_string(&record.variants))?,
            digital_files: json(serde_json::to_string(&record.digital_files))?,
            images: json(serde_json::to_string(&record.images))?,
        })
    }
}

impl Product {
    pub async fn create(pool: &SqlitePool, record: &ProductRecord) -> Result<Self, sqlx::Error> {
        let encoded = EncodedRecord::new(record)?;
        let now = Utc::now();

        sqlx::query_as::<_, Product>(
            r#"INSERT INTO products (
                id, source_language,
                title_en, title_es, description_en, description_es, slug_en, slug_es,
                price, final_price, is_on_sale, discount_percentage,
                product_type, sku, variants, digital_files, images,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)
            RETURNING *"#,
        )
        .bind(record.id)
        .bind(record.source_language)
        .bind(encoded.title.en)
        .bind(encoded.title.es)
        .bind(encoded.description.en)
        .bind(encoded.description.es)
        .bind(encoded.slug.en)
        .bind(encoded.slug.es)
        .bind(record.price.price)
        .bind(record.price.final_price)
        .bind(record.price.is_on_sale)
        .bind(record.price.discount_percentage)
        .bind(record.product_type)
        .bind(&record.sku)
        .bind(&encoded.variants)
        .bind(&encoded.digital_files)
        .bind(&encoded.images)
        .bind(now)
        .fetch_one(pool)
        .await
    }

    /// Overwrite every mutable column of an existing product
    pub async fn update(pool: &SqlitePool, record: &ProductRecord) -> Result<Self, sqlx::Error> {
        let encoded = EncodedRecord::new(record)?;

        sqlx::query_as::<_, Product>(
            r#"UPDATE products
            SET title_en = $2, title_es = $3,
                description_en = $4, description_es = $5,
                slug_en = $6, slug_es = $7,
                price = $8, final_price = $9, is_on_sale = $10, discount_percentage = $11,
                product_type = $12, sku = $13,
                variants = $14, digital_files = $15, images = $16,
                updated_at = $17
            WHERE id = $1
            RETURNING *"#,
        )
        .bind(record.id)
        .bind(encoded.title.en)
        .bind(encoded.title.es)
        .bind(encoded.description.en)
        .bind(encoded.description.es)
        .bind(encoded.slug.en)
        .bind(encoded.slug.es)
        .bind(record.price.price)
        .bind(record.price.final_price)
        .bind(record.price.is_on_sale)
        .bind(record.price.discount_percentage)
        .bind(record.product_type)
        .bind(&record.sku)
        .bind(&encoded.variants)
        .bind(&encoded.digital_files)
        .bind(&encoded.images)
        .bind(Utc::now())
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_ids(pool: &SqlitePool, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error> {
        let mut products = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(product) = Self::find_by_id(pool, *id).await? {
                products.push(product);
            }
        }
        Ok(products)
    }

    /// Product whose English or Spanish slug equals `slug`
    pub async fn find_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE slug_en = $1 OR slug_es = $1 LIMIT 1",
        )
        .bind(slug)
        .fetch_optional(pool)
        .await
    }

    /// Like [`Product::find_by_slug`] but ignoring the product `exclude_id`
    pub async fn find_by_slug_excluding(
        pool: &SqlitePool,
        slug: &str,
        exclude_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE (slug_en = $1 OR slug_es = $1) AND id != $2 LIMIT 1",
        )
        .bind(slug)
        .bind(exclude_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn record() -> ProductRecord {
        let fields = |title: &str, slug: &str| LocalizedFields {
            title: title.to_string(),
            description: format!("{title} description"),
            content: None,
            slug: slug.to_string(),
        };
        ProductRecord {
            id: Uuid::new_v4(),
            source_language: Language::Es,
            text: Bilingual {
                en: Some(fields("Kyoto Guide", "kyoto-guide")),
                es: Some(fields("Guía de Kioto", "guia-de-kioto")),
            },
            price: PriceState {
                price: 20.0,
                final_price: Some(10.0),
                is_on_sale: true,
                discount_percentage: Some(50.0),
            },
            product_type: ProductType::Digital,
            sku: Some("GUIDE-KYOTO".to_string()),
            variants: vec![
                VariantItem {
                    label: "Format".to_string(),
                    language: Language::En,
                    values: vec!["PDF".to_string(), "EPUB".to_string()],
                },
                VariantItem {
                    label: "Formato".to_string(),
                    language: Language::Es,
                    values: vec!["PDF".to_string(), "EPUB".to_string()],
                },
            ],
            digital_files: vec![DigitalFileDescriptor {
                values: vec!["PDF".to_string()],
                kind: DigitalFileKind::File,
                url: "https://cdn.example.com/kyoto.pdf".to_string(),
            }],
            images: vec!["https://cdn.example.com/kyoto.jpg".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_round_trips_columns() {
        let db = DBService::new_in_memory().await.unwrap();
        let record = record();
        let product = Product::create(&db.pool, &record).await.unwrap();

        assert_eq!(product.to_record(), record);
        assert_eq!(product.price_state().display_price(), 10.0);
    }

    #[tokio::test]
    async fn test_find_by_slug_excluding_self() {
        let db = DBService::new_in_memory().await.unwrap();
        let product = Product::create(&db.pool, &record()).await.unwrap();

        assert!(Product::find_by_slug(&db.pool, "guia-de-kioto").await.unwrap().is_some());
        assert!(
            Product::find_by_slug_excluding(&db.pool, "guia-de-kioto", product.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            Product::find_by_slug_excluding(&db.pool, "kyoto-guide", Uuid::new_v4())
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn test_localized_filters_variants() {
        let db = DBService::new_in_memory().await.unwrap();
        let product = Product::create(&db.pool, &record()).await.unwrap();

        let view = product.localized(Language::Es).unwrap();
        assert_eq!(view.title, "Guía de Kioto");
        assert_eq!(view.variants.len(), 1);
        assert_eq!(view.variants[0].label, "Formato");
    }

    #[test]
    fn test_digital_file_descriptor_wire_format() {
        let json = r#"{"values":[],"type":"url","url":"https://example.com/map"}"#;
        let descriptor: DigitalFileDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(descriptor.kind, DigitalFileKind::Url);
        assert!(descriptor.values.is_empty());
    }

    #[test]
    fn test_free_display_price_is_zero() {
        let state = PriceState {
            price: 35.0,
            final_price: Some(0.0),
            is_on_sale: true,
            discount_percentage: Some(100.0),
        };
        assert_eq!(state.display_price(), 0.0);
        assert_eq!(PriceState::regular(12.5).display_price(), 12.5);
    }
}
