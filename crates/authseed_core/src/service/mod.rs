//! Use-case services.
//!
//! # Responsibility
//! - Orchestrate seed loading and gateway calls into one seeding run.
//! - Keep the CLI decoupled from storage and asset details.

pub mod seed_service;
