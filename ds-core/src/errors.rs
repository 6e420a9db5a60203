//! Error prelude for application code.
//!
//! Library crates define their own typed errors; binaries and file helpers propagate through
//! `anyhow` and pull the common macros from here.
pub use anyhow::{
    anyhow,
    bail,
    ensure,
    Context,
    Result,
};

/// Result for operations that only signal success or failure.
pub type EmptyResult = Result<()>;
