use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

pub fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(dur) => dur.as_secs().to_string(),
        Err(_) => "Error getting timestamp".to_string(),
    }
}

/// Runs `func` and returns its result with the wall-clock time it took.
pub fn timed<T, F>(func: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = func();
    (result, start.elapsed())
}

/// Linear extrapolation of `elapsed` for `digits` digits to one million digits.
pub fn seconds_per_million(elapsed: Duration, digits: u64) -> f64 {
    if digits == 0 {
        return 0.0;
    }
    elapsed.as_secs_f64() / digits as f64 * 1_000_000.0
}
