use crate::{
    domain::enums::{OrderStatus, PaymentMethod, PaymentStatus},
    model::{Order, OrderItem, OrderStats, ShippingAddress, User},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ShippingAddressResponse {
    pub name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl From<ShippingAddress> for ShippingAddressResponse {
    fn from(value: ShippingAddress) -> Self {
        ShippingAddressResponse {
            name: value.name,
            phone: value.phone,
            street: value.street,
            city: value.city,
            state: value.state,
            pincode: value.pincode,
        }
    }
}

/// Contact details of the buyer, shown on order detail and admin views.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct CustomerResponse {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<&User> for CustomerResponse {
    fn from(value: &User) -> Self {
        CustomerResponse {
            name: value.name.clone(),
            email: value.email.clone(),
            phone: value.phone.clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrderItemResponse {
    pub product_id: i32,
    pub name: String,
    pub price: i64,
    pub quantity: i32,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(value: OrderItem) -> Self {
        OrderItemResponse {
            product_id: value.product_id,
            name: value.name,
            price: value.price,
            quantity: value.quantity,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct OrderResponse {
    pub id: i32,
    pub user_id: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerResponse>,
    pub tracking_id: String,
    pub items: Vec<OrderItemResponse>,
    pub shipping_address: ShippingAddressResponse,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub subtotal: i64,
    pub delivery_charge: i64,
    pub total_amount: i64,
    pub delivered_at: Option<String>,
    pub cancelled_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<Order> for OrderResponse {
    fn from(value: Order) -> Self {
        OrderResponse {
            id: value.order_id,
            user_id: value.user_id,
            customer: None,
            tracking_id: value.tracking_id,
            items: value
                .items
                .into_iter()
                .map(OrderItemResponse::from)
                .collect(),
            shipping_address: value.shipping_address.into(),
            payment_method: value.payment_method,
            payment_status: value.payment_status,
            order_status: value.order_status,
            subtotal: value.subtotal,
            delivery_charge: value.delivery_charge,
            total_amount: value.total_amount,
            delivered_at: value.delivered_at.map(|dt| dt.to_string()),
            cancelled_at: value.cancelled_at.map(|dt| dt.to_string()),
            created_at: value.created_at.map(|dt| dt.to_string()),
            updated_at: value.updated_at.map(|dt| dt.to_string()),
        }
    }
}

impl OrderResponse {
    pub fn with_customer(mut self, user: Option<&User>) -> Self {
        self.customer = user.map(CustomerResponse::from);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub struct OrderStatsResponse {
    pub total_orders: i64,
    pub total_revenue: i64,
    pub pending_orders: i64,
    pub delivered_orders: i64,
}

impl From<OrderStats> for OrderStatsResponse {
    fn from(value: OrderStats) -> Self {
        OrderStatsResponse {
            total_orders: value.total_orders,
            total_revenue: value.total_revenue,
            pending_orders: value.pending_orders,
            delivered_orders: value.delivered_orders,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AdminOrdersResponse {
    pub orders: Vec<OrderResponse>,
    pub stats: OrderStatsResponse,
}
