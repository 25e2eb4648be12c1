//! # ParkHub
//!
//! Parking lot reservation service: administrators manage lots and their
//! spot inventory, drivers book the first free spot of a lot and are billed
//! per started hour on release.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: entities, capacity and billing rules, repository traits
//! - **application**: use cases (capacity manager, spot allocator, ledger, users)
//! - **infrastructure**: SeaORM persistence, JWT and password hashing
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: errors, clock, shutdown and validation helpers

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiServices};
