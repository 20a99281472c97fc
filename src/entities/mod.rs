// Entity Models - Accounting and social resources served by the mock API
//
// Each entity has:
// - Stable identity (UUID) generated at seeding time
// - Explicit foreign keys (`*_id` fields) instead of association proxies
// - Typed field accessors for the query pipeline (see `query::Queryable`)

pub mod currency;
pub mod account;
pub mod transfer;
pub mod group;
pub mod need;
pub mod offer;

pub use currency::{Currency, CurrencyStats};
pub use account::Account;
pub use transfer::{Transfer, TransferState};
pub use group::{Group, Member};
pub use need::Need;
pub use offer::Offer;
