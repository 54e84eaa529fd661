use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::{json, Value};

use crate::utils::{cpu::pi::PiOptions, time};

/// Summary of one run, written as JSON when a report path is configured.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub digits: u64,
    pub line_width: usize,
    pub options: PiOptions,
    pub precision: u64,
    pub terms: u64,
    pub elapsed: Duration,
    pub seconds_per_million: f64,
    pub sha256: String,
    pub output: PathBuf,
}

impl RunReport {
    pub fn to_json(&self) -> Value {
        json!({
            "digits": self.digits,
            "line_width": self.line_width,
            "strategy": self.options.strategy.name(),
            "rounding": self.options.rounding.name(),
            "precision": self.precision,
            "terms": self.terms,
            "elapsed_ms": self.elapsed.as_millis() as u64,
            "seconds_per_million": self.seconds_per_million,
            "sha256": self.sha256,
            "output": self.output.display().to_string(),
            "finished_at": time::timestamp(),
        })
    }
}

pub fn save_report(report: &RunReport, path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let text = serde_json::to_string_pretty(&report.to_json())?;
    fs::write(path, text)
}
