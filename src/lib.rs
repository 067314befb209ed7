pub mod analyzers;
pub mod catalog;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;

pub use error::{PulseError, Result};
