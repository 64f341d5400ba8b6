//! Terminal user interface.
//!
//! A line-oriented session over the feed state machine:
//! - Main event loop (`run`) and one-shot mode (`run_once`)
//! - Command parsing and dispatch
//! - Printing of the feed, articles and collections
//!
//! # Module Structure
//!
//! - `loop_runner` - Event loop and signal handling
//! - `input` - Command parsing and dispatch
//! - `events` - Background completion handling
//! - `render` - Text rendering
//! - `helpers` - Article lookup and browser opening

mod events;
mod helpers;
mod input;
mod loop_runner;
mod render;

pub use loop_runner::{run, run_once, Action};
