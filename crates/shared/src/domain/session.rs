use crate::domain::enums::Role;
use serde::{Deserialize, Serialize};

/// Authenticated caller, resolved once per request by the access gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i32,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: i32, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn can_sell(&self) -> bool {
        self.role.can_sell()
    }

    pub fn can_manage_order(&self, owner_id: i32) -> bool {
        self.user_id == owner_id || self.is_admin()
    }

    pub fn can_edit_product(&self, seller_id: i32) -> bool {
        self.user_id == seller_id || self.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owners_and_admins_manage_orders() {
        let owner = Session::new(1, Role::User);
        let stranger = Session::new(2, Role::Seller);
        let admin = Session::new(3, Role::Admin);

        assert!(owner.can_manage_order(1));
        assert!(!stranger.can_manage_order(1));
        assert!(admin.can_manage_order(1));
    }

    #[test]
    fn plain_users_cannot_sell() {
        assert!(!Session::new(1, Role::User).can_sell());
        assert!(Session::new(1, Role::Seller).can_sell());
        assert!(Session::new(1, Role::Admin).can_sell());
    }
}
