//! In-memory data model.
//!
//! Nothing here outlives the process: articles are rebuilt from the
//! providers on every launch and the saved/favorite lists are session-only.
//!
//! - [`types`]: normalized [`Article`], [`Provider`] and [`FeedQuery`]
//! - [`collections`]: URL-keyed [`ArticleCollection`] and the [`Library`]
//!   holding the saved and favorite lists

pub mod collections;
pub mod types;

pub use collections::{ArticleCollection, Library};
pub use types::{Article, FeedQuery, Provider, REMOVED_MARKER};
