//! # Mealbox Common Library
//!
//! Shared code for the Mealbox storefront crates including:
//! - Error type and result alias
//! - Bootstrap configuration (TOML, root folder resolution)
//! - Event types and the broadcast EventBus (including user notifications)
//! - Durable local store (SQLite key/value blobs)
//! - Remote service envelope types
//! - SSE streaming of events

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod sse;
pub mod store;

pub use error::{Error, Result};
pub use events::{EventBus, NotificationLevel, StorefrontEvent};
pub use store::{DurableStore, MemoryStore, SqliteStore};
