use std::fmt::{self, Display, Formatter};
use std::io;

/// Failures of the numeric core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PiError {
    InvalidDigitCount { digits: u64, max: u64 },
    ArithmeticInvariantViolation { term: u64, remainder: String },
    PrecisionUnderflow { precision: u64, required: u64 },
    DomainError(&'static str),
}

impl Display for PiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            PiError::InvalidDigitCount { digits, max } => {
                write!(f, "InvalidDigitCount: {} (expected 1..={})", digits, max)
            }
            PiError::ArithmeticInvariantViolation { term, remainder } => write!(
                f,
                "ArithmeticInvariantViolation: M recurrence left remainder {} at term {}",
                remainder, term
            ),
            PiError::PrecisionUnderflow { precision, required } => write!(
                f,
                "PrecisionUnderflow: working precision {} is below {}",
                precision, required
            ),
            PiError::DomainError(msg) => write!(f, "DomainError: {}", msg),
        }
    }
}

impl std::error::Error for PiError {}

#[derive(Debug)]
pub enum ConfigError {
    Io(io::Error),
    MissingSection(String),
    MissingKey { section: String, key: String },
    InvalidInteger { key: String, value: String },
    DigitCountOutOfRange(i64),
    LineWidthOutOfRange(i64),
    InvalidSetting { name: String, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO: {}", e),
            ConfigError::MissingSection(s) => write!(f, "MissingSection: [{}]", s),
            ConfigError::MissingKey { section, key } => {
                write!(f, "MissingKey: '{}' in [{}]", key, section)
            }
            ConfigError::InvalidInteger { key, value } => {
                write!(f, "InvalidInteger: {} = '{}'", key, value)
            }
            ConfigError::DigitCountOutOfRange(n) => {
                write!(f, "DigitCountOutOfRange: N must be between 1 and 1000000, got {}", n)
            }
            ConfigError::LineWidthOutOfRange(l) => {
                write!(f, "LineWidthOutOfRange: L must be between 1 and 100, got {}", l)
            }
            ConfigError::InvalidSetting { name, value } => {
                write!(f, "InvalidSetting: {} = '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(value: io::Error) -> Self { ConfigError::Io(value) }
}

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Compute(PiError),
    Io(io::Error),
    Logging(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "Config: {}", e),
            AppError::Compute(e) => write!(f, "Compute: {}", e),
            AppError::Io(e) => write!(f, "IO: {}", e),
            AppError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self { AppError::Config(value) }
}

impl From<PiError> for AppError {
    fn from(value: PiError) -> Self { AppError::Compute(value) }
}

impl From<io::Error> for AppError {
    fn from(value: io::Error) -> Self { AppError::Io(value) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_variant() {
        let e = PiError::InvalidDigitCount { digits: 0, max: 1_000_000 };
        assert!(e.to_string().starts_with("InvalidDigitCount"));

        let e = AppError::from(ConfigError::LineWidthOutOfRange(101));
        assert_eq!(
            e.to_string(),
            "Config: LineWidthOutOfRange: L must be between 1 and 100, got 101"
        );
    }
}
