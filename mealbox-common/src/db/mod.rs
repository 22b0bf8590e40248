//! Database module for the durable local store

pub mod init;

pub use init::{create_local_store_table, init_database, init_memory_database};
