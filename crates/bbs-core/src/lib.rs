//! Backend-agnostic types and traits for the BBS client engine.
//!
//! This crate contains no IO. Concrete HTTP, filesystem, and board-specific
//! logic lives in `bbs-local`; this crate only defines the data model, the
//! error surface, and the trait seams (`HttpBackend`, `BoardPlugin`) that
//! `bbs-local` implements.

pub mod auth;
pub mod board;
pub mod cookie;
pub mod error;
pub mod favorites;
pub mod history;
pub mod http;
pub mod ng;
pub mod plugin;
pub mod post;
pub mod proxy;
pub mod thread;

pub use error::{Error, Result};
