//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits:
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process repositories sharing one store
//! - **notification**: SMS gateway, WeChat and email relay channels
//! - **knowledge**: the JSON medication knowledge base
//! - **tokens**: the bearer token store
//! - **adapters**: picks the adapters above from the service settings
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod adapters;
pub mod knowledge;
pub mod memory;
pub mod notification;
pub mod persistence;
pub mod tokens;
