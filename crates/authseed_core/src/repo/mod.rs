//! Persistence gateway consumed by the seeding engine.
//!
//! # Responsibility
//! - Define the entity/link contract (`AuthRepository`) seeding writes through.
//! - Define transactional phase scopes (`SeedGateway`, `PhaseScope`).
//! - Provide the SQLite implementation of both.
//!
//! # Invariants
//! - Create paths call the entity's `validate()` before any SQL mutation.
//! - Link paths never create missing entities; foreign keys reject dangling ids.

pub mod auth_repo;
pub mod gateway;
