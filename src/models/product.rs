use super::{default_true, new_id};
use crate::db::Document;
use crate::error::ApiError;
use crate::validation::Violations;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    pub sku: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Document for Product {
    const COLLECTION: &'static str = "products";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("sku", self.sku.clone())]
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub barcode: Option<String>,
    pub sku: Option<String>,
    pub is_active: Option<bool>,
}

impl ProductInput {
    fn check(&self, v: &mut Violations) {
        v.not_blank("name", self.name.as_ref());
        v.finite("price", self.price);
        v.not_blank("category", self.category.as_ref());
        v.not_blank("sku", self.sku.as_ref());
    }
}

impl Product {
    pub fn create(input: ProductInput) -> Result<Self, ApiError> {
        let mut v = Violations::new();
        v.required("name", input.name.as_ref());
        v.required("price", input.price.as_ref());
        v.required("category", input.category.as_ref());
        v.required("sku", input.sku.as_ref());
        input.check(&mut v);
        v.into_result()?;

        Ok(Self {
            id: new_id(),
            name: input.name.unwrap_or_default(),
            description: input.description,
            price: input.price.unwrap_or_default(),
            quantity: input.quantity.unwrap_or(0),
            category: input.category.unwrap_or_default(),
            image_url: input.image_url,
            barcode: input.barcode,
            sku: input.sku.unwrap_or_default(),
            is_active: input.is_active.unwrap_or(true),
            created_at: Utc::now(),
        })
    }

    pub fn apply(&mut self, input: ProductInput) -> Result<(), ApiError> {
        let mut v = Violations::new();
        input.check(&mut v);
        v.into_result()?;

        if let Some(name) = input.name {
            self.name = name;
        }
        if input.description.is_some() {
            self.description = input.description;
        }
        if let Some(price) = input.price {
            self.price = price;
        }
        if let Some(quantity) = input.quantity {
            self.quantity = quantity;
        }
        if let Some(category) = input.category {
            self.category = category;
        }
        if input.image_url.is_some() {
            self.image_url = input.image_url;
        }
        if input.barcode.is_some() {
            self.barcode = input.barcode;
        }
        if let Some(sku) = input.sku {
            self.sku = sku;
        }
        if let Some(active) = input.is_active {
            self.is_active = active;
        }
        Ok(())
    }
}
