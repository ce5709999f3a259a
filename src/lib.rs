//! Purpose: Library crate for loading, caching, and persisting JSON documents backed by files.
//! Exports: `api` (stable surface) and `core` (handles, pool registry, atomic I/O, errors).
//! Role: Keeps one in-memory document per file and writes it back atomically.
//! Invariants: Single-process, single-threaded use; no cross-process coordination.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
mod json;
mod paths;
