use std::fs::File;
use std::io::{self, BufWriter, Result, Write};
use std::path::Path;

#[cfg(windows)]
pub const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_ENDING: &str = "\n";

/// Writes `digits` to `path` as consecutive lines of `width` characters,
/// the last one possibly shorter. Returns the number of lines written.
pub fn write_digit_lines(path: &Path, digits: &str, width: usize) -> Result<usize> {
    if width == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "line width must be positive"));
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(128 * 1024, file);
    let mut lines = 0;
    for chunk in digits.as_bytes().chunks(width) {
        writer.write_all(chunk)?;
        writer.write_all(LINE_ENDING.as_bytes())?;
        lines += 1;
    }
    writer.flush()?;
    Ok(lines)
}
