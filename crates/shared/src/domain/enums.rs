use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!(
                        "invalid {} '{}'",
                        stringify!($name),
                        other
                    )),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Ps5,
    Ps4,
    Xbox,
    Nintendo,
    Pc,
    Console,
    Accessories,
}

text_enum!(Platform {
    Ps5 => "ps5",
    Ps4 => "ps4",
    Xbox => "xbox",
    Nintendo => "nintendo",
    Pc => "pc",
    Console => "console",
    Accessories => "accessories",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    New,
    LikeNew,
    Excellent,
    Good,
    Fair,
}

text_enum!(Condition {
    New => "new",
    LikeNew => "like-new",
    Excellent => "excellent",
    Good => "good",
    Fair => "fair",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    #[default]
    Game,
    Console,
    Accessory,
    Merchandise,
}

text_enum!(Category {
    Game => "game",
    Console => "console",
    Accessory => "accessory",
    Merchandise => "merchandise",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    #[default]
    Cod,
    Upi,
    Razorpay,
}

text_enum!(PaymentMethod {
    Cod => "cod",
    Upi => "upi",
    Razorpay => "razorpay",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

text_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Failed => "failed",
    Refunded => "refunded",
});

/// Customer-visible order lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Placed,
    Confirmed,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
    Returned,
}

text_enum!(OrderStatus {
    Placed => "placed",
    Confirmed => "confirmed",
    Shipped => "shipped",
    OutForDelivery => "out-for-delivery",
    Delivered => "delivered",
    Cancelled => "cancelled",
    Returned => "returned",
});

impl OrderStatus {
    /// placed → confirmed → shipped → out-for-delivery → delivered,
    /// placed|confirmed → cancelled, delivered → returned.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        matches!(
            (self, next),
            (Placed, Confirmed)
                | (Confirmed, Shipped)
                | (Shipped, OutForDelivery)
                | (OutForDelivery, Delivered)
                | (Placed, Cancelled)
                | (Confirmed, Cancelled)
                | (Delivered, Returned)
        )
    }

    pub fn is_cancellable(self) -> bool {
        self.can_transition_to(OrderStatus::Cancelled)
    }
}

/// Saga sub-state of an order, separate from [`OrderStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum PlacementState {
    Pending,
    Placed,
    Failed,
}

text_enum!(PlacementState {
    Pending => "pending",
    Placed => "placed",
    Failed => "failed",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    #[default]
    User,
    Seller,
    Admin,
}

text_enum!(Role {
    User => "user",
    Seller => "seller",
    Admin => "admin",
});

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub fn can_sell(self) -> bool {
        matches!(self, Role::Seller | Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ProductSort {
    PriceLow,
    PriceHigh,
    Rating,
    Newest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_follows_lifecycle() {
        use OrderStatus::*;

        assert!(Placed.can_transition_to(Confirmed));
        assert!(OutForDelivery.can_transition_to(Delivered));
        assert!(Delivered.can_transition_to(Returned));

        assert!(!Placed.can_transition_to(Shipped));
        assert!(!Delivered.can_transition_to(Placed));
        assert!(!Cancelled.can_transition_to(Placed));
        assert!(!Shipped.can_transition_to(Cancelled));
    }

    #[test]
    fn only_early_orders_are_cancellable() {
        assert!(OrderStatus::Placed.is_cancellable());
        assert!(OrderStatus::Confirmed.is_cancellable());
        assert!(!OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
    }

    #[test]
    fn text_round_trips_through_wire_names() {
        assert_eq!(
            "out-for-delivery".parse::<OrderStatus>(),
            Ok(OrderStatus::OutForDelivery)
        );
        assert_eq!(Condition::LikeNew.as_str(), "like-new");
        assert!("bluray".parse::<Platform>().is_err());
    }
}
