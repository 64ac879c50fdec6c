//! Ownership of global indices across processes.

use std::collections::HashMap;

use crate::comm::Communicator;
use crate::error::{CoreError, CoreResult};
use crate::numeric::Matrix;

/// Which global rows of a distributed vector live on this process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    global_len: usize,
    owned: Vec<usize>,
}

impl Layout {
    /// Everything owned locally (single process).
    pub fn contiguous(global_len: usize) -> Self {
        Self {
            global_len,
            owned: (0..global_len).collect(),
        }
    }

    /// Naive block distribution: ranks own consecutive chunks, the first
    /// `global_len % size` ranks one extra row each.
    pub fn linear(global_len: usize, rank: usize, size: usize) -> CoreResult<Self> {
        if size == 0 || rank >= size {
            return Err(CoreError::InvalidArg {
                what: "rank must lie inside the group",
            });
        }
        let base = global_len / size;
        let extra = global_len % size;
        let start = rank * base + rank.min(extra);
        let len = base + usize::from(rank < extra);
        Ok(Self {
            global_len,
            owned: (start..start + len).collect(),
        })
    }

    pub fn from_global_ids(global_len: usize, owned: Vec<usize>) -> CoreResult<Self> {
        if owned.iter().any(|&g| g >= global_len) {
            return Err(CoreError::InvalidArg {
                what: "global id outside the global length",
            });
        }
        Ok(Self { global_len, owned })
    }

    pub fn global_len(&self) -> usize {
        self.global_len
    }

    pub fn local_len(&self) -> usize {
        self.owned.len()
    }

    pub fn global_ids(&self) -> &[usize] {
        &self.owned
    }

    /// Import the rows of `local` (laid out by `source`) into this layout.
    ///
    /// Collective: every process of `comm` must call it.
    pub fn import(
        &self,
        source: &Layout,
        local: &Matrix,
        comm: &dyn Communicator,
    ) -> CoreResult<Matrix> {
        if local.nrows() != source.local_len() {
            return Err(CoreError::DimensionMismatch {
                what: "imported rows",
                expected: source.local_len(),
                found: local.nrows(),
            });
        }
        if source.global_len != self.global_len {
            return Err(CoreError::DimensionMismatch {
                what: "global length",
                expected: self.global_len,
                found: source.global_len,
            });
        }

        let ncols = local.ncols();
        let outgoing = source
            .owned
            .iter()
            .enumerate()
            .map(|(i, &g)| (g, local.row(i).iter().copied().collect()))
            .collect();
        let incoming: HashMap<usize, Vec<f64>> = comm.all_gather_rows(outgoing)?.into_iter().collect();

        let mut out = Matrix::zeros(self.owned.len(), ncols);
        for (i, g) in self.owned.iter().enumerate() {
            let row = incoming.get(g).ok_or_else(|| CoreError::Collective {
                what: format!("import: global row {g} was not provided by any process"),
            })?;
            if row.len() != ncols {
                return Err(CoreError::Collective {
                    what: format!("import: global row {g} has {} columns, expected {ncols}", row.len()),
                });
            }
            for (j, v) in row.iter().enumerate() {
                out[(i, j)] = *v;
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comm::SerialComm;

    #[test]
    fn linear_layout_covers_all_rows() {
        let parts: Vec<_> = (0..3).map(|r| Layout::linear(10, r, 3).unwrap()).collect();
        assert_eq!(parts[0].global_ids(), &[0, 1, 2, 3]);
        assert_eq!(parts[1].global_ids(), &[4, 5, 6]);
        assert_eq!(parts[2].global_ids(), &[7, 8, 9]);
    }

    #[test]
    fn import_permutes_rows_by_global_id() {
        let source = Layout::contiguous(3);
        let target = Layout::from_global_ids(3, vec![2, 0, 1]).unwrap();
        let m = Matrix::from_row_slice(3, 2, &[0.0, 0.5, 1.0, 1.5, 2.0, 2.5]);

        let out = target.import(&source, &m, &SerialComm).unwrap();
        assert_eq!(out.row(0)[0], 2.0);
        assert_eq!(out.row(1)[1], 0.5);
        assert_eq!(out.row(2)[0], 1.0);
    }

    #[test]
    fn import_rejects_missing_rows() {
        let source = Layout::from_global_ids(3, vec![0, 1]).unwrap();
        let target = Layout::contiguous(3);
        let m = Matrix::zeros(2, 1);
        assert!(matches!(
            target.import(&source, &m, &SerialComm),
            Err(CoreError::Collective { .. })
        ));
    }
}
