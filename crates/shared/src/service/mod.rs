mod auth;
mod cart;
mod order;
mod product;

#[cfg(test)]
mod fixtures;

pub use self::auth::{AuthService, AuthServiceDeps, ProfileService, ProfileServiceDeps};
pub use self::cart::{CartService, CartServiceDeps};
pub use self::order::{OrderService, OrderServiceDeps};
pub use self::product::{ProductService, ProductServiceDeps};
