//! Module for core business logic services.
//!
//! This module encapsulates services that orchestrate several data-access
//! calls into one operation, such as seeding the baseline roles and accounts
//! at startup.

pub mod seed;
