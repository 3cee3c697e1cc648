use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct CartItemResponse {
    pub product_id: i32,
    pub name: String,
    pub emoji: String,
    pub price: i64,
    pub stock: i32,
    pub quantity: i32,
    pub line_total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total_price: i64,
}

impl CartResponse {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_price: 0,
        }
    }
}
