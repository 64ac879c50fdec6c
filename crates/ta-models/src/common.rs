//! Helpers shared by the models.

use std::path::Path;

use serde::Serialize;
use ta_core::numeric::ensure_finite;
use ta_sim::{SimError, SimResult};
use ta_sim::output::{FIELD_WIDTH, PRECISION, format_scientific};

/// Ensure a value is finite, returning SimError if not.
pub fn check_finite(value: f64, what: &'static str) -> SimResult<f64> {
    Ok(ensure_finite(value, what)?)
}

/// Diagnostic columns: titles when `describe`, values otherwise.
pub fn columns(describe: bool, titles: &[&str], values: &[f64]) -> String {
    if describe {
        titles.iter().map(|t| format!("{t:>w$}", w = FIELD_WIDTH)).collect()
    } else {
        values
            .iter()
            .map(|v| format!("{:>w$}", format_scientific(*v, PRECISION), w = FIELD_WIDTH))
            .collect()
    }
}

/// Write `snapshot` as pretty JSON to `path`.
pub fn write_snapshot<T: Serialize>(path: &Path, snapshot: &T) -> SimResult<()> {
    let text = serde_json::to_string_pretty(snapshot).map_err(|e| SimError::Model {
        message: format!("cannot serialize snapshot: {e}"),
    })?;
    std::fs::write(path, text).map_err(|source| SimError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "state saved");
    Ok(())
}
