pub mod cli;
pub mod config;
pub mod error;
pub mod job;
pub mod logging;
pub mod reading;
pub mod source;
pub mod util;
