//! Shared plumbing for the data simulator crates: logging setup, the error prelude used by
//! binaries, and helpers for inspecting untyped JSON schema fragments.

pub mod errors;
pub mod jsonutils;
pub mod logging;
