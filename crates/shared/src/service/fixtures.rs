use crate::{
    domain::{
        enums::{Category, Condition, PaymentMethod, Platform},
        requests::{CreateProductRequest, PlaceOrderRequest, ShippingAddressRequest},
    },
};

pub fn new_product(name: &str, price: i64, stock: i32) -> CreateProductRequest {
    CreateProductRequest {
        name: name.to_string(),
        description: format!("{name} in great shape"),
        price,
        original_price: price * 2,
        platform: Platform::Ps5,
        condition: Condition::LikeNew,
        category: Category::Game,
        emoji: "🎮".to_string(),
        stock,
        tags: vec!["action".to_string()],
        is_featured: false,
        is_deal: false,
    }
}

pub fn place_order_request() -> PlaceOrderRequest {
    PlaceOrderRequest {
        shipping_address: ShippingAddressRequest {
            name: "Asha Rao".to_string(),
            phone: "9876543210".to_string(),
            street: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            pincode: "560001".to_string(),
        },
        payment_method: PaymentMethod::Cod,
    }
}
