//! Purpose: Define the stable public Rust API boundary for singlejson.
//! Exports: File handles, the pool registry, settings, and the error model.
//! Role: Public, additive-only surface; internal helpers stay private.
//! Invariants: Paths handed back by this API are canonical (absolute, resolved).

pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::file::{DefaultSource, FileGuard, JsonFile, JsonFileOptions};
pub use crate::core::format::{DEFAULT_INDENT, SerializationSettings};
pub use crate::core::pool::FilePool;
pub use crate::paths::canonical_path;
