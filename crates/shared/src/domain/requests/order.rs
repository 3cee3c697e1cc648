use crate::{
    domain::enums::{OrderStatus, PaymentMethod},
    model::ShippingAddress,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ShippingAddressRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 6, max = 15, message = "Phone must be 6 to 15 characters"))]
    pub phone: String,

    #[validate(length(min = 1, message = "Street is required"))]
    pub street: String,

    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,

    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,

    #[validate(length(min = 4, max = 10, message = "Pincode must be 4 to 10 characters"))]
    pub pincode: String,
}

impl From<ShippingAddressRequest> for ShippingAddress {
    fn from(value: ShippingAddressRequest) -> Self {
        ShippingAddress {
            name: value.name,
            phone: value.phone,
            street: value.street,
            city: value.city,
            state: value.state,
            pincode: value.pincode,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PlaceOrderRequest {
    #[validate(nested)]
    pub shipping_address: ShippingAddressRequest,

    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatusRequest {
    #[schema(example = "confirmed")]
    pub order_status: OrderStatus,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i32,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

/// Everything the store needs to persist a pending order.
#[derive(Debug, Clone)]
pub struct CreateOrderRecord {
    pub user_id: i32,
    pub tracking_id: String,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub subtotal: i64,
    pub delivery_charge: i64,
    pub total_amount: i64,
    pub items: Vec<NewOrderItem>,
}
