use crate::{domain::enums::Role, model::User};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct AddressResponse {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub address: AddressResponse,
    pub wishlist: Vec<i32>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

// password hash never leaves the model
impl From<User> for UserResponse {
    fn from(value: User) -> Self {
        UserResponse {
            id: value.user_id,
            name: value.name,
            email: value.email,
            phone: value.phone,
            role: value.role,
            address: AddressResponse {
                street: value.street,
                city: value.city,
                state: value.state,
                pincode: value.pincode,
            },
            wishlist: value.wishlist,
            created_at: value.created_at.map(|dt| dt.to_string()),
            updated_at: value.updated_at.map(|dt| dt.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct WishlistResponse {
    pub added: bool,
    pub wishlist: Vec<i32>,
}
