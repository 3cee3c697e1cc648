mod identity;
mod profile;

pub use self::identity::{AuthService, AuthServiceDeps};
pub use self::profile::{ProfileService, ProfileServiceDeps};
