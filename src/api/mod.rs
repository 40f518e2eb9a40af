//! Public data model: requests, blocks, metrics, errors and configuration.

pub mod block;
pub mod config;
pub mod error;
pub mod stats;
