//! Persistence layer for the farm marketplace.
//!
//! [`MarketStore`] serves committed reads and opens [`UnitOfWork`]s, which
//! carry every mutation. Two implementations are provided: [`InMemoryStore`]
//! for tests and local runs, and [`PostgresStore`] on top of sqlx.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use error::{Result, StoreError};
pub use memory::{InMemoryStore, InMemoryUnitOfWork};
pub use postgres::{PostgresStore, PostgresUnitOfWork};
pub use store::{MarketStore, ProductFilter, ProductSort, UnitOfWork, sort_products};
