//! Application services

pub mod index;

pub use index::{BuildOptions, BuildOutcome, IndexService, Opened};
