use crate::domain::enums::{Category, Condition, Platform, ProductSort};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema, IntoParams)]
pub struct FindAllProducts {
    pub platform: Option<Platform>,
    pub condition: Option<Condition>,
    pub category: Option<Category>,

    #[validate(range(min = 0, message = "Minimum price cannot be negative"))]
    pub min_price: Option<i64>,

    #[validate(range(min = 0, message = "Maximum price cannot be negative"))]
    pub max_price: Option<i64>,

    pub search: Option<String>,
    pub sort: Option<ProductSort>,
    pub featured: Option<bool>,
    pub deals: Option<bool>,

    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "Page must be at least 1"))]
    pub page: i32,

    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: i32,
}

fn default_page() -> i32 {
    1
}

fn default_limit() -> i32 {
    12
}

impl Default for FindAllProducts {
    fn default() -> Self {
        Self {
            platform: None,
            condition: None,
            category: None,
            min_price: None,
            max_price: None,
            search: None,
            sort: None,
            featured: None,
            deals: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl FindAllProducts {
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
    }

    pub fn offset(&self) -> i64 {
        ((self.page - 1).max(0) * self.limit) as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    #[schema(example = "God of War Ragnarok")]
    pub name: String,

    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    #[schema(example = 2499)]
    pub price: i64,

    #[validate(range(min = 0, message = "Original price cannot be negative"))]
    #[schema(example = 4999)]
    pub original_price: i64,

    pub platform: Platform,
    pub condition: Condition,

    #[serde(default)]
    pub category: Category,

    #[serde(default = "default_emoji")]
    pub emoji: String,

    #[serde(default = "default_stock")]
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub is_featured: bool,

    #[serde(default)]
    pub is_deal: bool,
}

fn default_emoji() -> String {
    "🎮".to_string()
}

fn default_stock() -> i32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price: Option<i64>,

    #[validate(range(min = 0, message = "Original price cannot be negative"))]
    pub original_price: Option<i64>,

    pub platform: Option<Platform>,
    pub condition: Option<Condition>,
    pub category: Option<Category>,
    pub emoji: Option<String>,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,

    pub tags: Option<Vec<String>>,
    pub is_featured: Option<bool>,
    pub is_deal: Option<bool>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    #[schema(example = 5)]
    pub rating: i32,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Comment is too long"))]
    pub comment: String,
}

#[derive(Debug, Clone)]
pub struct CreateReviewRecord {
    pub product_id: i32,
    pub user_id: i32,
    pub name: String,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    #[schema(example = -2)]
    pub delta: i32,
}
