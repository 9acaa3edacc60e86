//! Concrete (reqwest + filesystem) implementation of the BBS client backend
//! engine. `bbs-core` defines the data model and trait seams; everything
//! here is the IO and board-specific logic that implements them.

pub mod auth;
pub mod board;
pub mod cache;
pub mod codec;
pub mod cookie_jar;
pub mod favorites;
pub mod history;
pub mod http_client;
pub mod ng;
pub mod parsers;
pub mod post_engine;
pub mod proxy;
pub mod round_scheduler;
pub mod samba;
pub mod util;
