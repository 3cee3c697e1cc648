mod database;
mod hashing;
mod jwt;
mod myconfig;

pub use self::database::{ConnectionManager, ConnectionPool};
pub use self::hashing::Hashing;
pub use self::jwt::{ACCESS_TOKEN, Claims, JwtConfig, REFRESH_TOKEN};
pub use self::myconfig::{CheckoutConfig, Config};
