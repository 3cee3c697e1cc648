use super::now;
use crate::{
    abstract_trait::{ProductCommandRepositoryTrait, ProductQueryRepositoryTrait},
    domain::{
        enums::ProductSort,
        requests::{CreateProductRequest, CreateReviewRecord, FindAllProducts, UpdateProductRequest},
    },
    errors::RepositoryError,
    model::{Product, Review},
};
use async_trait::async_trait;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

#[derive(Default)]
struct CatalogState {
    products: HashMap<i32, Product>,
    reviews: Vec<Review>,
    next_product_id: i32,
    next_review_id: i32,
}

impl CatalogState {
    fn adjust(
        &mut self,
        product_id: i32,
        delta: i32,
        conditional: bool,
    ) -> Result<i32, RepositoryError> {
        let product = self
            .products
            .get_mut(&product_id)
            .ok_or(RepositoryError::NotFound)?;

        if conditional && delta < 0 && product.stock < -delta {
            return Err(RepositoryError::InsufficientStock {
                product_id,
                requested: -delta,
                available: product.stock,
            });
        }

        product.stock += delta;
        product.updated_at = now();
        Ok(product.stock)
    }
}

fn matches(product: &Product, req: &FindAllProducts) -> bool {
    let term = req.search_term().map(str::to_lowercase);

    product.is_active
        && req.platform.is_none_or(|p| product.platform == p)
        && req.condition.is_none_or(|c| product.condition == c)
        && req.category.is_none_or(|c| product.category == c)
        && req.min_price.is_none_or(|min| product.price >= min)
        && req.max_price.is_none_or(|max| product.price <= max)
        && term.as_deref().is_none_or(|term| {
            product.name.to_lowercase().contains(term)
                || product.description.to_lowercase().contains(term)
                || product
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(term))
        })
        && (req.featured != Some(true) || product.is_featured)
        && (req.deals != Some(true) || product.is_deal)
}

/// Shared product table. Clones see the same data, so the order store can
/// adjust stock in the catalog it was built with.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn stock_of(&self, product_id: i32) -> Option<i32> {
        self.state
            .read()
            .await
            .products
            .get(&product_id)
            .map(|product| product.stock)
    }

    pub(super) async fn apply(
        &self,
        product_id: i32,
        delta: i32,
        conditional: bool,
    ) -> Result<i32, RepositoryError> {
        self.state.write().await.adjust(product_id, delta, conditional)
    }
}

#[async_trait]
impl ProductQueryRepositoryTrait for InMemoryCatalog {
    async fn find_all(
        &self,
        req: &FindAllProducts,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let state = self.state.read().await;

        let mut found: Vec<Product> = state
            .products
            .values()
            .filter(|product| matches(product, req))
            .cloned()
            .collect();

        match req.sort {
            Some(ProductSort::PriceLow) => {
                found.sort_by_key(|p| (p.price, p.product_id));
            }
            Some(ProductSort::PriceHigh) => {
                found.sort_by_key(|p| (std::cmp::Reverse(p.price), p.product_id));
            }
            Some(ProductSort::Rating) => found.sort_by(|a, b| {
                b.rating_average
                    .total_cmp(&a.rating_average)
                    .then(a.product_id.cmp(&b.product_id))
            }),
            Some(ProductSort::Newest) | None => {
                found.sort_by_key(|p| std::cmp::Reverse((p.created_at, p.product_id)));
            }
        }

        let total = found.len() as i64;
        let page = found
            .into_iter()
            .skip(req.offset() as usize)
            .take(req.limit.max(0) as usize)
            .collect();

        Ok((page, total))
    }

    async fn find_by_id(&self, product_id: i32) -> Result<Option<Product>, RepositoryError> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }

    async fn find_by_ids(&self, product_ids: &[i32]) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(product_ids
            .iter()
            .filter_map(|id| state.products.get(id).cloned())
            .collect())
    }

    async fn find_reviews(&self, product_id: i32) -> Result<Vec<Review>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .reviews
            .iter()
            .rev()
            .filter(|review| review.product_id == product_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProductCommandRepositoryTrait for InMemoryCatalog {
    async fn create_product(
        &self,
        seller_id: i32,
        req: &CreateProductRequest,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        state.next_product_id += 1;

        let product = Product {
            product_id: state.next_product_id,
            name: req.name.clone(),
            description: req.description.clone(),
            price: req.price,
            original_price: req.original_price,
            platform: req.platform,
            condition: req.condition,
            category: req.category,
            emoji: req.emoji.clone(),
            stock: req.stock,
            seller_id,
            rating_average: 0.0,
            rating_count: 0,
            tags: req.tags.clone(),
            is_featured: req.is_featured,
            is_deal: req.is_deal,
            is_active: true,
            created_at: now(),
            updated_at: now(),
        };

        state.products.insert(product.product_id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        product_id: i32,
        req: &UpdateProductRequest,
    ) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or(RepositoryError::NotFound)?;

        if let Some(name) = &req.name {
            product.name = name.clone();
        }
        if let Some(description) = &req.description {
            product.description = description.clone();
        }
        if let Some(price) = req.price {
            product.price = price;
        }
        if let Some(original_price) = req.original_price {
            product.original_price = original_price;
        }
        if let Some(platform) = req.platform {
            product.platform = platform;
        }
        if let Some(condition) = req.condition {
            product.condition = condition;
        }
        if let Some(category) = req.category {
            product.category = category;
        }
        if let Some(emoji) = &req.emoji {
            product.emoji = emoji.clone();
        }
        if let Some(stock) = req.stock {
            product.stock = stock;
        }
        if let Some(tags) = &req.tags {
            product.tags = tags.clone();
        }
        if let Some(is_featured) = req.is_featured {
            product.is_featured = is_featured;
        }
        if let Some(is_deal) = req.is_deal {
            product.is_deal = is_deal;
        }
        if let Some(is_active) = req.is_active {
            product.is_active = is_active;
        }
        product.updated_at = now();

        Ok(product.clone())
    }

    async fn delete_product(&self, product_id: i32) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        state
            .products
            .remove(&product_id)
            .ok_or(RepositoryError::NotFound)?;
        state.reviews.retain(|review| review.product_id != product_id);
        Ok(())
    }

    async fn add_review(&self, record: &CreateReviewRecord) -> Result<Product, RepositoryError> {
        let mut state = self.state.write().await;

        if !state.products.contains_key(&record.product_id) {
            return Err(RepositoryError::NotFound);
        }
        if state
            .reviews
            .iter()
            .any(|r| r.product_id == record.product_id && r.user_id == record.user_id)
        {
            return Err(RepositoryError::AlreadyExists("review".to_string()));
        }

        state.next_review_id += 1;
        let review = Review {
            review_id: state.next_review_id,
            product_id: record.product_id,
            user_id: record.user_id,
            name: record.name.clone(),
            rating: record.rating,
            comment: record.comment.clone(),
            created_at: now(),
        };
        state.reviews.push(review);

        let ratings: Vec<i32> = state
            .reviews
            .iter()
            .filter(|r| r.product_id == record.product_id)
            .map(|r| r.rating)
            .collect();

        let product = state
            .products
            .get_mut(&record.product_id)
            .ok_or(RepositoryError::NotFound)?;
        product.rating_count = ratings.len() as i32;
        product.rating_average =
            ratings.iter().map(|r| *r as f64).sum::<f64>() / ratings.len() as f64;
        product.updated_at = now();

        Ok(product.clone())
    }

    async fn adjust_stock(
        &self,
        product_id: i32,
        delta: i32,
        conditional: bool,
    ) -> Result<i32, RepositoryError> {
        self.apply(product_id, delta, conditional).await
    }
}
