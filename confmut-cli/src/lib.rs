//! Library half of the `confmut` binary: configuration loading and merging.

pub mod config;
