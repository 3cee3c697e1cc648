use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct AddToCartRequest {
    #[validate(range(min = 1, message = "Product ID is required"))]
    #[schema(example = 1)]
    pub product_id: i32,

    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 99, message = "Quantity must be between 1 and 99"))]
    #[schema(example = 1)]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// A quantity of zero or less removes the line.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateCartRequest {
    #[validate(range(min = 1, message = "Product ID is required"))]
    #[schema(example = 1)]
    pub product_id: i32,

    #[validate(range(max = 99, message = "Quantity cannot exceed 99"))]
    #[schema(example = 2)]
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_past_the_line_cap_are_rejected() {
        let add = AddToCartRequest {
            product_id: 1,
            quantity: i32::MAX,
        };
        assert!(add.validate().is_err());

        let update = UpdateCartRequest {
            product_id: 1,
            quantity: 100,
        };
        assert!(update.validate().is_err());

        let removal = UpdateCartRequest {
            product_id: 1,
            quantity: 0,
        };
        assert!(removal.validate().is_ok());
    }
}
