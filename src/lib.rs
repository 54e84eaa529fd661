pub mod app;
pub mod config;
pub mod errors;
pub mod logging;
pub mod report;
pub mod utils;

pub use errors::{AppError, ConfigError, PiError};
pub use utils::cpu::pi::{pi_digits, pi_digits_with, PiOptions, Strategy};
