//! newsreel: merge keyword search results from two news APIs into one
//! clean, recency-ordered, paginated feed.
//!
//! - [`feed`] fetches, sanitizes, filters, probes and sorts a page
//! - [`app`] holds the feed state machine that applies completed pages
//! - [`storage`] has the article model and the saved/favorite collections
//! - [`config`] loads `~/.config/newsreel/config.toml`

pub mod app;
pub mod config;
pub mod feed;
pub mod storage;
pub mod util;
