mod identity;
mod profile;

pub use self::identity::{AuthServiceTrait, DynAuthService};
pub use self::profile::{DynProfileService, ProfileServiceTrait};
