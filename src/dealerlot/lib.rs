//! # Dealerlot Architecture
//!
//! Dealerlot is the **inventory core of a dealership back office**: a single-owner
//! vehicle store with local persistence, a backup ledger, soft delete, form drafts
//! and derived sales/inventory analytics. It is a library that happens to ship a
//! CLI client, not the other way around.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - Installs the tracing subscriber                          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Owns the InventoryState                                  │
//! │  - Sequences backup → command → recompute → save            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs) + metrics.rs + finance.rs    │
//! │  - Pure business logic over &mut InventoryState             │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - DataStore trait, DealerStore over a key/value backend    │
//! │  - State document, backup ledger, load-time recovery        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived Data
//!
//! `total_value`, `total_views`, `total_likes` and the two metrics blocks are never
//! patched incrementally. They are recomputed from the active collection after every
//! committed mutation, so they cannot drift from the vehicles they describe.
//!
//! ## No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes Rust arguments and returns `Result<CmdResult>`.
//! It never writes to stdout/stderr and never exits the process. Diagnostics go
//! through `tracing`; the binary decides where they end up.
//!
//! ## Module Overview
//!
//! - [`api`]: the facade, entry point for all operations
//! - [`commands`]: business logic for each operation
//! - [`metrics`]: sales and inventory aggregates
//! - [`finance`]: loan and auction-return calculators
//! - [`store`]: storage abstraction, persistence and backups
//! - [`model`]: `Vehicle`, `VehicleInput`, `SavedDraft` and friends
//! - [`state`]: the whole-store document
//! - [`index`]: display indexes (f1, 1, d1 notation)
//! - [`config`]: configuration management
//! - [`error`]: error types

pub mod api;
pub mod commands;
pub mod config;
pub mod error;
pub mod finance;
pub mod index;
pub mod metrics;
pub mod model;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
