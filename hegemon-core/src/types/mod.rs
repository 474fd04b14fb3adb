//! Shared value types: colours, dates, loader-boundary trees.

pub mod colour;
pub mod date;
pub mod tree;

pub use colour::Colour;
pub use date::{Date, Timespan};
pub use tree::{TreeValue, ValueTree};
