//! Purpose: Internal JSON text boundary shared by load and save paths.
//! Exports: `parse` (decode) and `write` (encode with `SerializationSettings`).
//! Role: Single seam for serde_json usage so callsites avoid ad hoc encode/decode logic.
//! Invariants: All file content is decoded and encoded through this module.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

pub(crate) mod parse;
pub(crate) mod write;
