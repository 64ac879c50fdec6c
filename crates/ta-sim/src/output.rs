//! Tabular diagnostics and output file naming.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::{SimError, SimResult};

/// Width of a floating point column.
pub const FIELD_WIDTH: usize = 14;
/// Width of an integer column.
pub const INT_FIELD_WIDTH: usize = FIELD_WIDTH / 2;
/// Digits after the decimal point in scientific columns.
pub const PRECISION: usize = 5;

/// File name of the tabular diagnostics inside the output directory.
pub const TDATA_FILE: &str = "tdata.txt";

/// Scientific notation with a signed two-digit exponent, e.g. `1.00000e-03`.
pub fn format_scientific(v: f64, precision: usize) -> String {
    let s = format!("{v:.precision$e}");
    match s.split_once('e') {
        Some((mantissa, exp)) => {
            let exp: i32 = exp.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => s,
    }
}

/// Shortest of fixed or scientific notation with `significant` digits,
/// trailing zeros removed.
pub fn format_general(v: f64, significant: usize) -> String {
    if v == 0.0 || !v.is_finite() {
        return format!("{v}");
    }
    let significant = significant.max(1);
    let digits = significant - 1;
    let sci = format!("{v:.digits$e}");
    let exp: i32 = sci
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    if exp < -4 || exp >= significant as i32 {
        let (mantissa, _) = sci.split_once('e').unwrap_or((sci.as_str(), ""));
        let mantissa = trim_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    } else {
        let decimals = (significant as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Snapshot file written after `time` years, e.g. `transient_0.0020198452.h5`.
pub fn snapshot_file_name(time: f64) -> String {
    format!("transient_{}.h5", format_general(time, 8))
}

/// Sink for the per-step diagnostic table.
pub struct TabularLog {
    sink: Box<dyn Write>,
    header_written: bool,
}

impl TabularLog {
    pub fn new(sink: Box<dyn Write>) -> Self {
        Self {
            sink,
            header_written: false,
        }
    }

    /// Create (truncate) `tdata.txt` inside `dir`.
    pub fn create_in(dir: &Path) -> SimResult<Self> {
        let path = dir.join(TDATA_FILE);
        std::fs::create_dir_all(dir).map_err(|source| SimError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let file = File::create(&path).map_err(|source| SimError::Io { path, source })?;
        Ok(Self::new(Box::new(BufWriter::new(file))))
    }

    pub fn header_written(&self) -> bool {
        self.header_written
    }

    /// Column titles, written once before the first row.
    pub fn write_header(&mut self, model_columns: &str) -> io::Result<()> {
        if self.header_written {
            return Ok(());
        }
        writeln!(
            self.sink,
            "{:>w$}{:>iw$}{:>w$}{:>w$}{:>iw$}{}",
            "# time_(y)",
            "step",
            "dt_(y)",
            "|x|",
            "NR",
            model_columns,
            w = FIELD_WIDTH,
            iw = INT_FIELD_WIDTH
        )?;
        self.header_written = true;
        Ok(())
    }

    pub fn write_row(&mut self, row: &DiagnosticRow, model_columns: &str) -> io::Result<()> {
        writeln!(
            self.sink,
            "{:>w$}{:>iw$}{:>w$}{:>w$}{:>iw$}{}",
            format_scientific(row.time_years, PRECISION),
            row.step,
            format_scientific(row.dt_years, PRECISION),
            format_scientific(row.state_norm, PRECISION),
            row.newton_iterations,
            model_columns,
            w = FIELD_WIDTH,
            iw = INT_FIELD_WIDTH
        )?;
        self.sink.flush()
    }
}

/// One accepted step as it appears in the diagnostic table.
#[derive(Clone, Debug, PartialEq)]
pub struct DiagnosticRow {
    pub time_years: f64,
    pub step: u64,
    pub dt_years: f64,
    pub state_norm: f64,
    pub newton_iterations: usize,
}

/// In-memory sink whose contents stay readable after being handed to a
/// [`TabularLog`].
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Write one value per line in full precision.
pub fn dump_vector(path: PathBuf, values: &[f64]) -> SimResult<()> {
    let mut text = String::with_capacity(values.len() * 24);
    for v in values {
        text.push_str(&format_scientific(*v, 16));
        text.push('\n');
    }
    std::fs::write(&path, text).map_err(|source| SimError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scientific_uses_two_digit_exponent() {
        assert_eq!(format_scientific(1e-3, 5), "1.00000e-03");
        assert_eq!(format_scientific(2.5, 5), "2.50000e+00");
        assert_eq!(format_scientific(-1.25e12, 2), "-1.25e+12");
        assert_eq!(format_scientific(0.0, 1), "0.0e+00");
    }

    #[test]
    fn general_format_matches_significant_digits() {
        assert_eq!(format_general(0.00201984520548, 8), "0.0020198452");
        assert_eq!(format_general(1.5, 8), "1.5");
        assert_eq!(format_general(10.0, 8), "10");
        assert_eq!(format_general(1.0e-6, 8), "1e-06");
        assert_eq!(format_general(123456789.0, 8), "1.2345679e+08");
        assert_eq!(format_general(0.0, 8), "0");
    }

    #[test]
    fn snapshot_names_follow_time() {
        assert_eq!(snapshot_file_name(0.25), "transient_0.25.h5");
    }

    #[test]
    fn header_is_written_once() {
        let buffer = SharedBuffer::default();
        let mut log = TabularLog::new(Box::new(buffer.clone()));
        log.write_header("   extra").unwrap();
        log.write_header("   extra").unwrap();
        let row = DiagnosticRow {
            time_years: 1.0,
            step: 1,
            dt_years: 0.5,
            state_norm: 2.0,
            newton_iterations: 0,
        };
        log.write_row(&row, "").unwrap();

        let text = buffer.contents();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("# time_(y)"));
        assert!(lines[0].ends_with("   extra"));
        assert_eq!(lines[1].len(), 3 * FIELD_WIDTH + 2 * INT_FIELD_WIDTH);
        assert!(lines[1].starts_with("   1.00000e+00"));
    }
}
