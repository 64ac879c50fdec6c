//! Projection subspaces stored as Matrix Market multivectors.
//!
//! Only the dense `array` format is accepted: a banner, optional `%`
//! comments, a `rows cols` size line and `rows * cols` values in column-major
//! order.

use std::path::Path;

use ta_core::{Communicator, Layout, Matrix};

use crate::error::{AmsError, AmsResult};

const BANNER: &str = "%%MatrixMarket";

/// Parse a dense Matrix Market multivector.
pub fn parse_multivector(text: &str) -> Result<Matrix, String> {
    let mut lines = text.lines();

    let banner = lines.next().ok_or("empty file")?;
    let words: Vec<String> = banner.split_whitespace().map(str::to_ascii_lowercase).collect();
    if !words.first().is_some_and(|w| w.eq_ignore_ascii_case(BANNER)) {
        return Err(format!("missing {BANNER} banner"));
    }
    match words.as_slice() {
        [_, object, format, field, symmetry]
            if object == "matrix"
                && format == "array"
                && matches!(field.as_str(), "real" | "double" | "integer")
                && symmetry == "general" => {}
        _ => return Err(format!("unsupported header '{banner}', expected 'matrix array real general'")),
    }

    let mut data = lines.map(str::trim).filter(|l| !l.is_empty() && !l.starts_with('%'));

    let size = data.next().ok_or("missing size line")?;
    let dims: Vec<usize> = size
        .split_whitespace()
        .map(|w| w.parse::<usize>().map_err(|e| format!("bad size line '{size}': {e}")))
        .collect::<Result<_, _>>()?;
    let &[rows, cols] = dims.as_slice() else {
        return Err(format!("size line '{size}' must hold rows and columns"));
    };

    let values: Vec<f64> = data
        .flat_map(str::split_whitespace)
        .map(|w| w.parse::<f64>().map_err(|e| format!("bad value '{w}': {e}")))
        .collect::<Result<_, _>>()?;
    if values.len() != rows * cols {
        return Err(format!("expected {} values, found {}", rows * cols, values.len()));
    }
    Ok(Matrix::from_column_slice(rows, cols, &values))
}

/// Read the subspace at `path` and distribute it like `target`.
///
/// Each process keeps the rows of a plain linear split of the file, then the
/// rows are moved to their owners in `target`. Collective: every process of
/// `comm` must call it.
pub fn load_subspace(path: &Path, target: &Layout, comm: &dyn Communicator) -> AmsResult<Matrix> {
    let text = std::fs::read_to_string(path).map_err(|source| AmsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let global = parse_multivector(&text).map_err(|what| AmsError::Subspace {
        path: path.to_path_buf(),
        what,
    })?;
    if global.nrows() != target.global_len() {
        return Err(AmsError::Subspace {
            path: path.to_path_buf(),
            what: format!("{} rows, model has {} unknowns", global.nrows(), target.global_len()),
        });
    }

    let linear = Layout::linear(target.global_len(), comm.rank(), comm.size())?;
    let local = global.select_rows(linear.global_ids());
    let redistributed = target.import(&linear, &local, comm)?;

    tracing::info!(
        path = %path.display(),
        vectors = redistributed.ncols(),
        local_rows = redistributed.nrows(),
        "loaded projection subspace"
    );
    Ok(redistributed)
}
