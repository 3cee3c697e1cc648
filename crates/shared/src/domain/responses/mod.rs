mod api;
mod cart;
mod order;
mod product;
mod user;

pub use self::api::ApiResponse;
pub use self::cart::{CartItemResponse, CartResponse};
pub use self::order::{
    AdminOrdersResponse, CustomerResponse, OrderItemResponse, OrderResponse, OrderStatsResponse,
    ShippingAddressResponse,
};
pub use self::product::{ProductListResponse, ProductResponse, ReviewResponse, StockResponse};
pub use self::user::{AddressResponse, AuthResponse, TokenResponse, UserResponse, WishlistResponse};
