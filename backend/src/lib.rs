//! Warden: user and role administration backend.
//!
//! The binary in `main.rs` wires these modules together; integration tests
//! drive the same router through `api::build_router`.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod services;
pub mod state;
pub mod utils;
