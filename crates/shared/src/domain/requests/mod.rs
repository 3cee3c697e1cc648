mod auth;
mod cart;
mod order;
mod product;

pub use self::auth::{
    AddressRequest, CreateUserRecord, LoginRequest, RefreshTokenRequest, RegisterRequest,
    UpdateProfileRequest,
};
pub use self::cart::{AddToCartRequest, UpdateCartRequest};
pub use self::order::{
    CreateOrderRecord, NewOrderItem, PlaceOrderRequest, ShippingAddressRequest,
    UpdateOrderStatusRequest,
};
pub use self::product::{
    AdjustStockRequest, CreateProductRequest, CreateReviewRecord, CreateReviewRequest, FindAllProducts,
    UpdateProductRequest,
};
