//! Public facade crate for `bbs`.
//!
//! This crate intentionally contains no IO or board-specific logic.
//! It re-exports the backend-agnostic types/traits from `bbs-core`.

pub use bbs_core::*;
