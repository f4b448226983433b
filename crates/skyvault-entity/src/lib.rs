//! # skyvault-entity
//!
//! Domain entity models for Skyvault. Every struct in this crate
//! represents a database row or a domain value object. All entities
//! derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and database
//! entities additionally derive `sqlx::FromRow`.

pub mod oauth;
pub mod user;
