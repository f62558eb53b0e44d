#[macro_use]
pub mod log;

pub use log::{LogLevel, Logger};
