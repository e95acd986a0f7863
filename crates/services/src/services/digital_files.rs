//! Selection of downloadable files for digital products in a cart or order.

use std::collections::{BTreeMap, HashMap, HashSet};

use db::models::{
    cart::CartLineItem,
    product::{DigitalFileDescriptor, Product, ProductType},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Descriptors that apply to the selected variant values, in their original order.
///
/// A descriptor applies when it lists no values or shares at least one value
/// with the selection. Duplicates are kept.
pub fn match_files(
    selected_variants: &BTreeMap<String, String>,
    descriptors: &[DigitalFileDescriptor],
) -> Vec<DigitalFileDescriptor> {
    let selected: HashSet<&str> = selected_variants.values().map(String::as_str).collect();

    descriptors
        .iter()
        .filter(|d| d.values.is_empty() || d.values.iter().any(|v| selected.contains(v.as_str())))
        .cloned()
        .collect()
}

/// Files a customer receives for one cart line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct LineItemDownloads {
    pub product_id: Uuid,
    pub title: String,
    pub files: Vec<DigitalFileDescriptor>,
}

/// Resolve downloads for every line item whose stored product is digital.
///
/// The product type comes from `products`, never from the client's line item.
/// Items whose product no longer exists are skipped.
pub fn downloads_for_cart(items: &[CartLineItem], products: &[Product]) -> Vec<LineItemDownloads> {
    let by_id: HashMap<Uuid, &Product> = products.iter().map(|p| (p.id, p)).collect();

    items
        .iter()
        .filter_map(|item| {
            let product = by_id.get(&item.id)?;
            if product.product_type != ProductType::Digital {
                return None;
            }
            Some(LineItemDownloads {
                product_id: item.id,
                title: item.title.clone(),
                files: match_files(&item.selected_variants, &product.parsed_digital_files()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use db::models::{language::Language, product::DigitalFileKind};

    use super::*;

    fn file(values: &[&str], url: &str) -> DigitalFileDescriptor {
        DigitalFileDescriptor {
            values: values.iter().map(|v| v.to_string()).collect(),
            kind: DigitalFileKind::Url,
            url: url.to_string(),
        }
    }

    fn selection(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_matches_selected_and_unconditional_files() {
        let descriptors = vec![file(&["Blue"], "blue.zip"), file(&[], "readme.pdf"), file(&["Red"], "red.zip")];
        let matched = match_files(&selection(&[("Color", "Blue")]), &descriptors);
        assert_eq!(matched, vec![descriptors[0].clone(), descriptors[1].clone()]);
    }

    #[test]
    fn test_any_shared_value_matches() {
        let descriptors = vec![file(&["Large", "Blue"], "large-blue.zip"), file(&["Small"], "small.zip")];
        let matched = match_files(&selection(&[("Size", "Large"), ("Color", "Red")]), &descriptors);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].url, "large-blue.zip");
    }

    #[test]
    fn test_duplicates_keep_source_order() {
        let descriptors = vec![file(&["PDF"], "b.pdf"), file(&["PDF"], "a.pdf")];
        let matched = match_files(&selection(&[("Format", "PDF")]), &descriptors);
        assert_eq!(matched.iter().map(|d| d.url.as_str()).collect::<Vec<_>>(), ["b.pdf", "a.pdf"]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(match_files(&selection(&[("Color", "Blue")]), &[]).is_empty());
        let descriptors = vec![file(&["Blue"], "blue.zip"), file(&[], "all.zip")];
        assert_eq!(match_files(&BTreeMap::new(), &descriptors), vec![descriptors[1].clone()]);
    }

    fn product(product_type: ProductType, files: &[DigitalFileDescriptor]) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            source_language: Language::En,
            title_en: Some("Lisbon Map".to_string()),
            title_es: Some("Mapa de Lisboa".to_string()),
            description_en: Some("Printable map".to_string()),
            description_es: Some("Mapa imprimible".to_string()),
            slug_en: Some("lisbon-map".to_string()),
            slug_es: Some("mapa-de-lisboa".to_string()),
            price: 5.0,
            final_price: None,
            is_on_sale: false,
            discount_percentage: None,
            product_type,
            sku: None,
            variants: "[]".to_string(),
            digital_files: serde_json::to_string(files).unwrap(),
            images: "[]".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    fn line(product_id: Uuid, product_type: ProductType, variants: &[(&str, &str)]) -> CartLineItem {
        CartLineItem {
            id: product_id,
            title: "Lisbon Map".to_string(),
            total: 5.0,
            sku: None,
            quantity: 1,
            product_type,
            selected_variants: selection(variants),
        }
    }

    #[test]
    fn test_downloads_for_cart_skips_unknown_products() {
        let map = product(ProductType::Digital, &[file(&["A4"], "a4.pdf"), file(&["Letter"], "letter.pdf")]);
        let items = vec![
            line(map.id, ProductType::Digital, &[("Paper", "A4")]),
            line(Uuid::new_v4(), ProductType::Digital, &[]),
        ];

        let downloads = downloads_for_cart(&items, &[map.clone()]);
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].product_id, map.id);
        assert_eq!(downloads[0].files, vec![file(&["A4"], "a4.pdf")]);
    }

    #[test]
    fn test_stored_product_type_decides_delivery() {
        let map = product(ProductType::Digital, &[file(&[], "map.pdf")]);
        let poster = product(ProductType::Physical, &[file(&[], "poster.pdf")]);
        let items = vec![
            // Client mislabels both lines
            line(map.id, ProductType::Physical, &[]),
            line(poster.id, ProductType::Digital, &[]),
        ];

        let downloads = downloads_for_cart(&items, &[map.clone(), poster]);
        assert_eq!(downloads.len(), 1);
        assert_eq!(downloads[0].product_id, map.id);
        assert_eq!(downloads[0].files, vec![file(&[], "map.pdf")]);
    }
}
