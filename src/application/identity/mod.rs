//! Identity module: user management and authentication
//!
//! Contains the `UserService` which orchestrates registration, login,
//! the admin user list and default admin seeding.

pub mod service;

pub use service::{AuthResult, RegisterUser, UserService};
