mod cart;
mod order;
mod product;
mod user;

pub use self::cart::{Cart, CartItem, MAX_LINE_QUANTITY};
pub use self::order::{
    DELIVERY_CHARGE, FREE_DELIVERY_THRESHOLD, Order, OrderItem, OrderStats, ShippingAddress,
    delivery_charge_for,
};
pub use self::product::{Product, Review};
pub use self::user::User;
