pub mod dat_replace;
pub mod store;

pub use store::{CacheStore, CorruptionNotice};
