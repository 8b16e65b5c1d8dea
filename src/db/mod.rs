//! Database layer (PostgreSQL).

pub mod postgres;

pub use postgres::PostgresDb;

/// Table names as constants.
pub mod tables {
    /// Raw webhook deliveries (one row per event)
    pub const WEBHOOKS: &str = "webhooks";
}
