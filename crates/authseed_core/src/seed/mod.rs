//! Seed-data loading and reference resolution.
//!
//! # Responsibility
//! - Discover seed documents in an asset tree (`assets`).
//! - Parse documents into typed entity/link lists (`document`).
//! - Track ref -> identity mappings for one run (`resolver`).
//! - Describe the fixed, dependency-ordered phase plan (`phase`).
//!
//! Orchestration lives in `service::seed_service`.

pub mod assets;
pub mod document;
pub mod error;
pub mod phase;
pub mod resolver;
