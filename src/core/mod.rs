// Core modules implementing file handles, the pool registry, atomic I/O, and errors.
pub(crate) mod atomic;
pub mod error;
pub mod file;
pub mod format;
pub mod pool;
