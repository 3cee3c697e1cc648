use crate::{
    domain::enums::{Category, Condition, Platform},
    model::{Product, Review},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ReviewResponse {
    pub id: i32,
    pub user_id: i32,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: Option<String>,
}

impl From<Review> for ReviewResponse {
    fn from(value: Review) -> Self {
        ReviewResponse {
            id: value.review_id,
            user_id: value.user_id,
            name: value.name,
            rating: value.rating,
            comment: value.comment,
            created_at: value.created_at.map(|dt| dt.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub original_price: i64,
    pub discount: i64,
    pub platform: Platform,
    pub condition: Condition,
    pub category: Category,
    pub emoji: String,
    pub stock: i32,
    pub seller_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seller_name: Option<String>,
    pub rating_average: f64,
    pub rating_count: i32,
    pub tags: Vec<String>,
    pub is_featured: bool,
    pub is_deal: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<ReviewResponse>>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<Product> for ProductResponse {
    fn from(value: Product) -> Self {
        ProductResponse {
            id: value.product_id,
            discount: value.discount(),
            name: value.name,
            description: value.description,
            price: value.price,
            original_price: value.original_price,
            platform: value.platform,
            condition: value.condition,
            category: value.category,
            emoji: value.emoji,
            stock: value.stock,
            seller_id: value.seller_id,
            seller_name: None,
            rating_average: value.rating_average,
            rating_count: value.rating_count,
            tags: value.tags,
            is_featured: value.is_featured,
            is_deal: value.is_deal,
            is_active: value.is_active,
            reviews: None,
            created_at: value.created_at.map(|dt| dt.to_string()),
            updated_at: value.updated_at.map(|dt| dt.to_string()),
        }
    }
}

impl ProductResponse {
    pub fn with_reviews(mut self, reviews: Vec<Review>) -> Self {
        self.reviews = Some(reviews.into_iter().map(ReviewResponse::from).collect());
        self
    }

    pub fn with_seller(mut self, seller_name: Option<String>) -> Self {
        self.seller_name = seller_name;
        self
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ProductListResponse {
    pub products: Vec<ProductResponse>,
    pub current_page: i32,
    pub total_pages: i64,
    pub total_products: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub struct StockResponse {
    pub product_id: i32,
    pub stock: i32,
}
