use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::ConfigError;
use crate::utils::cpu::{
    decimal::RoundingMode,
    pi::{PiOptions, Strategy},
    precision::MAX_DIGITS,
};

pub const MAX_LINE_WIDTH: i64 = 100;
pub const MAIN_SECTION: &str = "Main";

lazy_static! {
    static ref SECTION_RE: Regex = Regex::new(r"^\s*\[([^\]]+)\]\s*$").unwrap();
    static ref ENTRY_RE: Regex = Regex::new(r"^\s*([^=:\s][^=:]*?)\s*[=:]\s*(.*?)\s*$").unwrap();
    // Inline comments need whitespace before the marker: "N = 100 # digits".
    static ref INLINE_COMMENT_RE: Regex = Regex::new(r"\s+[#;].*$").unwrap();
    // Underscores may group digits, one at a time: "1_000_000".
    static ref INTEGER_RE: Regex = Regex::new(r"^[+-]?[0-9]+(?:_[0-9]+)*$").unwrap();
}

/// Parses a base-10 integer the way `int()` reads an INI value: surrounding
/// whitespace, an optional sign and `_` between digits are accepted.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    if !INTEGER_RE.is_match(text) {
        return None;
    }
    text.replace('_', "").parse::<i64>().ok()
}

/// Minimal INI reader: `[section]` headers, `key = value` or `key: value`
/// entries, `#`/`;` comments. Keys are case-insensitive, sections are not.
#[derive(Debug, Default, Clone)]
pub struct IniFile {
    sections: HashMap<String, HashMap<String, String>>,
}

impl IniFile {
    pub fn parse(text: &str) -> Self {
        let mut ini = IniFile::default();
        let mut current: Option<String> = None;

        for line in text.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if let Some(caps) = SECTION_RE.captures(line) {
                let name = caps[1].trim().to_string();
                ini.sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let (Some(section), Some(caps)) = (current.as_ref(), ENTRY_RE.captures(line)) else {
                continue;
            };
            let key = caps[1].trim().to_lowercase();
            let value = INLINE_COMMENT_RE.replace(&caps[2], "").trim().to_string();
            if let Some(entries) = ini.sections.get_mut(section) {
                entries.insert(key, value);
            }
        }

        ini
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|entries| entries.get(&key.to_lowercase()))
            .map(String::as_str)
    }

    pub fn get_int(&self, section: &str, key: &str) -> Result<i64, ConfigError> {
        let entries = self
            .sections
            .get(section)
            .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?;
        let value = entries
            .get(&key.to_lowercase())
            .ok_or_else(|| ConfigError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })?;
        parse_int(value).ok_or_else(|| ConfigError::InvalidInteger {
            key: key.to_string(),
            value: value.clone(),
        })
    }
}

/// Validated run parameters: digit count N and output line width L.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    pub digits: u64,
    pub line_width: usize,
}

pub fn validate_params(n: i64, l: i64) -> Result<Params, ConfigError> {
    if !(1..=MAX_DIGITS as i64).contains(&n) {
        return Err(ConfigError::DigitCountOutOfRange(n));
    }
    if !(1..=MAX_LINE_WIDTH).contains(&l) {
        return Err(ConfigError::LineWidthOutOfRange(l));
    }
    Ok(Params {
        digits: n as u64,
        line_width: l as usize,
    })
}

/// Reads `N` and `L` from the `[Main]` section of `path` and validates them.
pub fn read_params(path: &Path) -> Result<Params, ConfigError> {
    let ini = IniFile::load(path)?;
    let n = ini.get_int(MAIN_SECTION, "N")?;
    let l = ini.get_int(MAIN_SECTION, "L")?;
    validate_params(n, l)
}

/// Process-level settings taken from the environment (`.env` included).
#[derive(Debug, Clone)]
pub struct Settings {
    pub config_path: PathBuf,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
    pub report_path: Option<PathBuf>,
    pub options: PiOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            config_path: PathBuf::from("PIi.ini"),
            output_path: PathBuf::from("PIi.prn"),
            log_path: PathBuf::from("PIi.log"),
            report_path: None,
            options: PiOptions::default(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let invalid = |name: &str, value: &str| ConfigError::InvalidSetting {
            name: name.to_string(),
            value: value.to_string(),
        };
        let defaults = Settings::default();

        let strategy = match var("PI_STRATEGY") {
            Some(v) => Strategy::parse(&v).ok_or_else(|| invalid("PI_STRATEGY", &v))?,
            None => defaults.options.strategy,
        };
        let rounding = match var("PI_ROUNDING") {
            Some(v) => RoundingMode::parse(&v).ok_or_else(|| invalid("PI_ROUNDING", &v))?,
            None => defaults.options.rounding,
        };
        let guard = match var("PI_GUARD_DIGITS") {
            Some(v) => v.trim().parse::<u64>().map_err(|_| invalid("PI_GUARD_DIGITS", &v))?,
            None => defaults.options.guard,
        };

        Ok(Settings {
            config_path: var("PI_CONFIG_PATH").map(PathBuf::from).unwrap_or(defaults.config_path),
            output_path: var("PI_OUTPUT_PATH").map(PathBuf::from).unwrap_or(defaults.output_path),
            log_path: var("PI_LOG_PATH").map(PathBuf::from).unwrap_or(defaults.log_path),
            report_path: var("PI_REPORT_PATH").map(PathBuf::from),
            options: PiOptions { strategy, rounding, guard },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
; digits of pi
[Main]
N = 1000   # digit count
l: 50 ; line width

[Other]
N = 7
";

    #[test]
    fn test_parse_ini() {
        let ini = IniFile::parse(SAMPLE);
        assert_eq!(ini.get("Main", "n"), Some("1000"));
        assert_eq!(ini.get_int("Main", "N").unwrap(), 1000);
        assert_eq!(ini.get_int("Main", "L").unwrap(), 50);
        assert_eq!(ini.get_int("Other", "N").unwrap(), 7);
        assert_eq!(ini.get("main", "N"), None);
    }

    #[test]
    fn test_missing_and_invalid_entries() {
        let ini = IniFile::parse("[Main]\nN = ten\n");
        assert!(matches!(ini.get_int("Main", "N"), Err(ConfigError::InvalidInteger { .. })));
        assert!(matches!(ini.get_int("Main", "L"), Err(ConfigError::MissingKey { .. })));
        assert!(matches!(ini.get_int("Extra", "N"), Err(ConfigError::MissingSection(_))));
    }

    #[test]
    fn test_validate_ranges() {
        assert!(matches!(validate_params(0, 10), Err(ConfigError::DigitCountOutOfRange(0))));
        assert!(matches!(
            validate_params(1_000_001, 10),
            Err(ConfigError::DigitCountOutOfRange(1_000_001))
        ));
        assert!(matches!(validate_params(100, 0), Err(ConfigError::LineWidthOutOfRange(0))));
        assert!(matches!(validate_params(100, 101), Err(ConfigError::LineWidthOutOfRange(101))));
        assert!(matches!(validate_params(-5, 10), Err(ConfigError::DigitCountOutOfRange(-5))));

        assert_eq!(validate_params(1, 1).unwrap(), Params { digits: 1, line_width: 1 });
        assert_eq!(
            validate_params(1_000_000, 100).unwrap(),
            Params { digits: 1_000_000, line_width: 100 }
        );
    }

    #[test]
    fn test_read_params_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let params = read_params(file.path()).unwrap();
        assert_eq!(params, Params { digits: 1000, line_width: 50 });
    }

    #[test]
    fn test_parse_int_accepts_grouped_digits() {
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int(" 1_000_000 "), Some(1_000_000));
        assert_eq!(parse_int("+42"), Some(42));
        assert_eq!(parse_int("-7"), Some(-7));
        assert_eq!(parse_int("007"), Some(7));
        for bad in ["", "_1", "1_", "1__0", "1 000", "1.0", "0x10", "ten"] {
            assert_eq!(parse_int(bad), None, "{:?}", bad);
        }
    }

    #[test]
    fn test_read_params_grouped_digits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PIi.ini");
        fs::write(&path, "[Main]\nN = 10_000\nL = 5_0\n").unwrap();
        let params = read_params(&path).unwrap();
        assert_eq!(params, Params { digits: 10_000, line_width: 50 });
    }

    #[test]
    fn test_read_params_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_params(&dir.path().join("absent.ini")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.config_path, PathBuf::from("PIi.ini"));
        assert_eq!(settings.output_path, PathBuf::from("PIi.prn"));
        assert_eq!(settings.log_path, PathBuf::from("PIi.log"));
        assert!(settings.report_path.is_none());
        assert_eq!(settings.options, PiOptions::default());
    }

    #[test]
    fn test_settings_overrides() {
        let vars: HashMap<&str, &str> = [
            ("PI_CONFIG_PATH", "conf/pi.ini"),
            ("PI_REPORT_PATH", "out/report.json"),
            ("PI_STRATEGY", "binary-split"),
            ("PI_ROUNDING", "half-even"),
            ("PI_GUARD_DIGITS", "12"),
            ("PI_LOG_PATH", "  "),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(|name| vars.get(name).map(|v| v.to_string())).unwrap();
        assert_eq!(settings.config_path, PathBuf::from("conf/pi.ini"));
        assert_eq!(settings.report_path, Some(PathBuf::from("out/report.json")));
        assert_eq!(settings.log_path, PathBuf::from("PIi.log"));
        assert_eq!(settings.options.strategy, Strategy::BinarySplit);
        assert_eq!(settings.options.rounding, RoundingMode::HalfEven);
        assert_eq!(settings.options.guard, 12);
    }

    #[test]
    fn test_settings_rejects_unknown_strategy() {
        let auto = Settings::from_lookup(|name| (name == "PI_STRATEGY").then(|| "auto".to_string()));
        assert_eq!(auto.unwrap().options.strategy, Strategy::Auto);

        let err = Settings::from_lookup(|name| {
            (name == "PI_STRATEGY").then(|| "monte-carlo".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting { .. }));
    }
}
