pub mod config;
pub mod discord;
pub mod error;
pub mod filter;
pub mod pipeline;
pub mod report;
pub mod sink;
pub mod sync;
