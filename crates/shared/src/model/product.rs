use crate::domain::enums::{Category, Condition, Platform};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub product_id: i32,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub original_price: i64,
    #[sqlx(try_from = "String")]
    pub platform: Platform,
    #[sqlx(try_from = "String")]
    pub condition: Condition,
    #[sqlx(try_from = "String")]
    pub category: Category,
    pub emoji: String,
    pub stock: i32,
    pub seller_id: i32,
    pub rating_average: f64,
    pub rating_count: i32,
    pub tags: Vec<String>,
    pub is_featured: bool,
    pub is_deal: bool,
    pub is_active: bool,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Product {
    /// Percentage off the original price, rounded.
    pub fn discount(&self) -> i64 {
        if self.original_price <= 0 || self.price >= self.original_price {
            return 0;
        }
        ((1.0 - self.price as f64 / self.original_price as f64) * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub review_id: i32,
    pub product_id: i32,
    pub user_id: i32,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: Option<NaiveDateTime>,
}
