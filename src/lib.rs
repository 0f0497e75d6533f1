pub mod calendar;
pub mod config;
pub mod correlation;
pub mod error;
pub mod ingest;
pub mod output;
pub mod pipeline;
pub mod store;

pub use error::{Error, Result};
