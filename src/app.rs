use std::time::Duration;

use tracing::{error, info};

use crate::{
    config::{read_params, Params, Settings},
    errors::AppError,
    report::{save_report, RunReport},
    utils::{
        cpu::{
            pi::{evaluate, PiOptions},
            precision::Plan,
        },
        file::write_digit_lines,
        hash::digest_digits,
        time::{seconds_per_million, timed},
    },
};

/// What a completed run produced, besides the output file.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub params: Params,
    pub plan: Plan,
    pub lines: usize,
    pub elapsed: Duration,
    pub seconds_per_million: f64,
    pub sha256: String,
}

fn logged<T, E: Into<AppError>>(stage: &str, result: Result<T, E>) -> Result<T, AppError> {
    result.map_err(|e| {
        let e = e.into();
        error!("{}: {}", stage, e);
        e
    })
}

/// Reads parameters, computes the digits and writes them out.
pub fn run(settings: &Settings) -> Result<RunSummary, AppError> {
    info!("Program start");
    println!("Program start");

    let params = logged("Failed to read parameters", read_params(&settings.config_path))?;
    info!(
        digits = params.digits,
        line_width = params.line_width,
        config = %settings.config_path.display(),
        "Parameters loaded"
    );

    let options = PiOptions {
        strategy: settings.options.strategy.resolve(params.digits),
        ..settings.options
    };
    let plan = logged("Invalid precision plan", Plan::with_guard(params.digits, options.guard))?;

    info!(
        precision = plan.precision,
        terms = plan.terms,
        strategy = options.strategy.name(),
        "Computing pi"
    );
    let (digits, elapsed) = timed(|| evaluate(&plan, &options));
    let digits = logged("Computation failed", digits)?;
    info!(elapsed_ms = elapsed.as_millis() as u64, "Finished computing pi");

    let lines = logged(
        "Failed to write digits",
        write_digit_lines(&settings.output_path, &digits, params.line_width),
    )?;
    info!(lines, output = %settings.output_path.display(), "Digits written");

    let per_million = seconds_per_million(elapsed, params.digits);
    info!("Estimated time for 1 million digits of pi: {:.2} seconds", per_million);

    let sha256 = digest_digits(&digits);
    info!(sha256 = %sha256, "Digit digest");

    if let Some(path) = &settings.report_path {
        let report = RunReport {
            digits: params.digits,
            line_width: params.line_width,
            options,
            precision: plan.precision,
            terms: plan.terms,
            elapsed,
            seconds_per_million: per_million,
            sha256: sha256.clone(),
            output: settings.output_path.clone(),
        };
        logged("Failed to write report", save_report(&report, path))?;
        info!(report = %path.display(), "Run report written");
    }

    info!("Program finished");
    println!("Program finished");

    Ok(RunSummary {
        params,
        plan,
        lines,
        elapsed,
        seconds_per_million: per_million,
        sha256,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ConfigError, PiError};
    use crate::utils::cpu::pi::{Strategy, PI_100};
    use crate::utils::file::LINE_ENDING;
    use std::fs;
    use std::path::Path;

    fn settings_in(dir: &Path, n: i64, l: i64) -> Settings {
        let config_path = dir.join("PIi.ini");
        fs::write(&config_path, format!("[Main]\nN = {}\nL = {}\n", n, l)).unwrap();
        Settings {
            config_path,
            output_path: dir.join("PIi.prn"),
            log_path: dir.join("PIi.log"),
            report_path: None,
            options: PiOptions::default(),
        }
    }

    #[test]
    fn test_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), 50, 20);
        let summary = run(&settings).unwrap();

        assert_eq!(summary.lines, 3);
        assert_eq!(summary.plan.precision, 55);
        assert_eq!(summary.sha256, digest_digits(&PI_100[..50]));

        let written = fs::read_to_string(&settings.output_path).unwrap();
        let lines: Vec<&str> = written.split(LINE_ENDING).collect();
        assert_eq!(lines, vec![&PI_100[..20], &PI_100[20..40], &PI_100[40..50], ""]);
    }

    #[test]
    fn test_report_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path(), 30, 7);
        settings.report_path = Some(dir.path().join("report.json"));
        settings.options.strategy = Strategy::BinarySplit;
        run(&settings).unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap()).unwrap();
        assert_eq!(report["digits"], 30);
        assert_eq!(report["strategy"], "binary-split");
        assert_eq!(report["sha256"], digest_digits(&PI_100[..30]));
    }

    #[test]
    fn test_report_names_resolved_strategy() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path(), 30, 10);
        settings.report_path = Some(dir.path().join("report.json"));
        assert_eq!(settings.options.strategy, Strategy::Auto);
        run(&settings).unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap()).unwrap();
        assert_eq!(report["strategy"], "direct");
    }

    #[test]
    fn test_out_of_range_skips_computation() {
        for (n, l) in [(0, 10), (1_000_001, 10), (10, 0), (10, 101)] {
            let dir = tempfile::tempdir().unwrap();
            let settings = settings_in(dir.path(), n, l);
            let err = run(&settings).unwrap_err();
            assert!(
                matches!(
                    err,
                    AppError::Config(ConfigError::DigitCountOutOfRange(_))
                        | AppError::Config(ConfigError::LineWidthOutOfRange(_))
                ),
                "n = {}, l = {}: {}",
                n,
                l,
                err
            );
            assert!(!settings.output_path.exists());
        }
    }

    #[test]
    fn test_small_guard_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path(), 20, 10);
        settings.options.guard = 3;
        let err = run(&settings).unwrap_err();
        assert!(matches!(err, AppError::Compute(PiError::PrecisionUnderflow { .. })));
        assert!(!settings.output_path.exists());
    }
}
