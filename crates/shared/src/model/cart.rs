use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashMap;

/// Upper bound for a single cart line.
pub const MAX_LINE_QUANTITY: i32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub product_id: i32,
    pub quantity: i32,
}

/// A user's pending selection. `total_price` is a cache recomputed from live
/// prices by [`Cart::recompute_total`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Cart {
    pub user_id: i32,
    pub total_price: i64,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    #[sqlx(skip)]
    pub items: Vec<CartItem>,
}

impl Cart {
    pub fn empty(user_id: i32) -> Self {
        Self {
            user_id,
            total_price: 0,
            created_at: None,
            updated_at: None,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, product_id: i32) -> Option<&CartItem> {
        self.items.iter().find(|item| item.product_id == product_id)
    }

    /// Merges into an existing line for the same product and returns the
    /// line's new quantity. Returns `None` and leaves the cart untouched when
    /// the merged quantity would fall outside `1..=MAX_LINE_QUANTITY`.
    pub fn add(&mut self, product_id: i32, quantity: i32) -> Option<i32> {
        let current = self.item(product_id).map_or(0, |item| item.quantity);
        let merged = current
            .checked_add(quantity)
            .filter(|merged| (1..=MAX_LINE_QUANTITY).contains(merged))?;

        match self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            Some(item) => item.quantity = merged,
            None => self.items.push(CartItem {
                product_id,
                quantity: merged,
            }),
        }
        Some(merged)
    }

    /// Returns false when the product is not in the cart. A quantity of zero
    /// or less drops the line.
    pub fn set_quantity(&mut self, product_id: i32, quantity: i32) -> bool {
        if self.item(product_id).is_none() {
            return false;
        }

        if quantity <= 0 {
            self.remove(product_id);
        } else if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.product_id == product_id)
        {
            item.quantity = quantity;
        }
        true
    }

    pub fn remove(&mut self, product_id: i32) {
        self.items.retain(|item| item.product_id != product_id);
    }

    /// Lines whose product has no live price are dropped.
    pub fn recompute_total(&mut self, prices: &HashMap<i32, i64>) {
        self.items.retain(|item| prices.contains_key(&item.product_id));
        self.total_price = self
            .items
            .iter()
            .filter_map(|item| {
                prices
                    .get(&item.product_id)
                    .map(|price| price * item.quantity as i64)
            })
            .sum();
    }

    pub fn product_ids(&self) -> Vec<i32> {
        self.items.iter().map(|item| item.product_id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prices() -> HashMap<i32, i64> {
        HashMap::from([(1, 100), (2, 250)])
    }

    #[test]
    fn duplicate_add_merges_quantity() {
        let mut cart = Cart::empty(9);
        cart.add(1, 1);
        cart.add(1, 2);
        cart.recompute_total(&prices());

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.total_price, 300);
    }

    #[test]
    fn add_rejects_overflowing_quantity() {
        let mut cart = Cart::empty(9);
        assert_eq!(cart.add(1, i32::MAX), None);
        assert!(cart.is_empty());

        assert_eq!(cart.add(1, MAX_LINE_QUANTITY), Some(MAX_LINE_QUANTITY));
        assert_eq!(cart.add(1, 1), None);
        assert_eq!(cart.add(1, i32::MAX), None);
        assert_eq!(cart.items[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn set_quantity_to_zero_drops_line() {
        let mut cart = Cart::empty(9);
        cart.add(1, 1);
        cart.add(2, 1);

        assert!(cart.set_quantity(2, 0));
        assert!(!cart.set_quantity(3, 4));
        cart.recompute_total(&prices());

        assert_eq!(cart.product_ids(), vec![1]);
        assert_eq!(cart.total_price, 100);
    }

    #[test]
    fn removing_absent_item_leaves_cart_unchanged() {
        let mut cart = Cart::empty(9);
        cart.add(1, 2);
        let before = cart.items.clone();

        cart.remove(42);

        assert_eq!(cart.items, before);
    }

    #[test]
    fn total_uses_live_prices_and_skips_missing_products() {
        let mut cart = Cart::empty(9);
        cart.add(1, 2);
        cart.add(5, 1);

        cart.recompute_total(&HashMap::from([(1, 80)]));

        assert_eq!(cart.total_price, 160);
        assert_eq!(cart.product_ids(), vec![1]);
    }
}
