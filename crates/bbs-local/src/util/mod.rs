pub mod atomic_write;
pub mod boarddir;
pub mod html_entities;
pub mod lru;
pub mod masked_log;
