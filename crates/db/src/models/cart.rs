use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::product::ProductType;

/// Cart line as held by the storefront client; only reconciled with the server at checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct CartLineItem {
    pub id: Uuid, // Product id
    pub title: String,
    pub total: f64,
    pub sku: Option<String>,
    pub quantity: u32,
    pub product_type: ProductType,
    #[serde(default)]
    pub selected_variants: BTreeMap<String, String>, // label -> chosen value
}
