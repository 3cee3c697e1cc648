//! In-memory stores backing the service tests and the HTTP test harness.
//! They honour the same contracts as the Postgres repositories, including
//! the conditional stock decrement and the per-item `stock_applied` flag.

mod cart;
mod catalog;
mod order;
mod user;

pub use self::cart::InMemoryCartStore;
pub use self::catalog::InMemoryCatalog;
pub use self::order::InMemoryOrderStore;
pub use self::user::InMemoryUserStore;

use chrono::{NaiveDateTime, Utc};

fn now() -> Option<NaiveDateTime> {
    Some(Utc::now().naive_utc())
}
