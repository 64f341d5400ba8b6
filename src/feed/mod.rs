//! News aggregation: provider adapters, reachability probing and the
//! merge-filter-sort pipeline.
//!
//! - **Sources**: one adapter per news API, each mapping its own JSON shape
//!   into [`Article`](crate::storage::Article)
//! - **Probe**: fail-open existence check against each article URL
//! - **Pipeline**: fans a [`FeedQuery`](crate::storage::FeedQuery) out to every
//!   source, then sanitizes, filters, deduplicates, probes and sorts
//!
//! # Architecture
//!
//! - [`source`] - `NewsSource` trait, shared JSON fetching, `SourceError`
//! - [`newsapi`] - newsapi.org `/everything`
//! - [`worldnews`] - worldnewsapi.com `/search-news`
//! - [`probe`] - `Probe` trait and the HTTP implementation
//! - [`pipeline`] - `Pipeline::run`
//!
//! # Example
//!
//! ```ignore
//! use newsreel::feed::Pipeline;
//! use newsreel::storage::FeedQuery;
//!
//! let pipeline = Pipeline::from_config(&config)?;
//! let articles = pipeline.run(&FeedQuery::new("Nvidia")).await?;
//! ```

pub mod newsapi;
pub mod pipeline;
pub mod probe;
pub mod source;
pub mod worldnews;

pub use newsapi::NewsApiSource;
pub use pipeline::{Pipeline, PipelineError};
pub use probe::{redirect_policy, HttpProbe, Probe};
pub use source::{parse_timestamp, NewsSource, SourceError, TextField};
pub use worldnews::WorldNewsSource;
