use super::{new_id, Customer, Product};
use crate::db::Document;
use crate::error::ApiError;
use crate::validation::Violations;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "processing" => Some(OrderStatus::Processing),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub price: f64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub total: f64,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl Document for Order {
    const COLLECTION: &'static str = "orders";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub total: Option<f64>,
    pub status: Option<String>,
    pub items: Option<Vec<OrderItemInput>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

impl OrderInput {
    /// Validate every field and convert status and items into their typed
    /// forms.
    fn check(&self, v: &mut Violations) -> (Option<OrderStatus>, Option<Vec<OrderItem>>) {
        v.not_blank("customerName", self.customer_name.as_ref());
        v.finite("total", self.total);

        let status = self.status.as_deref().and_then(|raw| {
            let parsed = OrderStatus::parse(raw);
            if parsed.is_none() {
                v.push("status", "must be one of: pending, processing, completed, cancelled");
            }
            parsed
        });

        let items = self.items.as_ref().map(|items| {
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let field = |name: &str| format!("items.{i}.{name}");
                    v.required(&field("productId"), item.product_id.as_ref());
                    v.required(&field("quantity"), item.quantity.as_ref());
                    v.required(&field("price"), item.price.as_ref());
                    v.required(&field("name"), item.name.as_ref());
                    v.not_blank(&field("productId"), item.product_id.as_ref());
                    v.finite(&field("price"), item.price);
                    Some(OrderItem {
                        product_id: item.product_id.clone()?,
                        quantity: item.quantity?,
                        price: item.price?,
                        name: item.name.clone()?,
                    })
                })
                .collect()
        });

        (status, items)
    }
}

impl Order {
    pub fn create(input: OrderInput) -> Result<Self, ApiError> {
        let mut v = Violations::new();
        v.required("customerName", input.customer_name.as_ref());
        v.required("total", input.total.as_ref());
        let (status, items) = input.check(&mut v);
        v.into_result()?;

        Ok(Self {
            id: new_id(),
            customer_id: input.customer_id,
            customer_name: input.customer_name.unwrap_or_default(),
            total: input.total.unwrap_or_default(),
            status: status.unwrap_or_default(),
            items: items.unwrap_or_default(),
            created_at: Utc::now(),
        })
    }

    pub fn apply(&mut self, input: OrderInput) -> Result<(), ApiError> {
        let mut v = Violations::new();
        let (status, items) = input.check(&mut v);
        v.into_result()?;

        if input.customer_id.is_some() {
            self.customer_id = input.customer_id;
        }
        if let Some(name) = input.customer_name {
            self.customer_name = name;
        }
        if let Some(total) = input.total {
            self.total = total;
        }
        if let Some(status) = status {
            self.status = status;
        }
        if let Some(items) = items {
            self.items = items;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    pub sku: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: Option<ProductRef>,
    pub quantity: i64,
    pub price: f64,
    pub name: String,
}

/// An order with its customer and product references resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    #[serde(rename = "_id")]
    pub id: String,
    pub customer_id: Option<CustomerRef>,
    pub customer_name: String,
    pub total: f64,
    pub status: OrderStatus,
    pub items: Vec<OrderItemView>,
    pub created_at: DateTime<Utc>,
}

/// Lookup tables used to resolve order references. Missing targets resolve
/// to `null`.
#[derive(Debug, Default)]
pub struct References {
    customers: HashMap<String, CustomerRef>,
    products: HashMap<String, ProductRef>,
}

impl References {
    pub fn new(customers: &[Customer], products: &[Product]) -> Self {
        Self {
            customers: customers
                .iter()
                .map(|c| {
                    let r = CustomerRef {
                        id: c.id.clone(),
                        name: c.name.clone(),
                        email: c.email.clone(),
                    };
                    (c.id.clone(), r)
                })
                .collect(),
            products: products
                .iter()
                .map(|p| {
                    let r = ProductRef {
                        id: p.id.clone(),
                        name: p.name.clone(),
                        price: p.price,
                        sku: p.sku.clone(),
                    };
                    (p.id.clone(), r)
                })
                .collect(),
        }
    }

    pub fn populate(&self, order: Order) -> OrderView {
        OrderView {
            customer_id: order
                .customer_id
                .as_ref()
                .and_then(|id| self.customers.get(id).cloned()),
            items: order
                .items
                .into_iter()
                .map(|item| OrderItemView {
                    product_id: self.products.get(&item.product_id).cloned(),
                    quantity: item.quantity,
                    price: item.price,
                    name: item.name,
                })
                .collect(),
            id: order.id,
            customer_name: order.customer_name,
            total: order.total,
            status: order.status,
            created_at: order.created_at,
        }
    }
}
