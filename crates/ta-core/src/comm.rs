//! Collective communication between the processes of one run.
//!
//! Every process calls the same collectives in the same order. A failed
//! collective leaves the group inconsistent, so callers treat
//! [`CoreError::Collective`] as fatal.

use std::sync::{Arc, Barrier, Mutex};

use crate::error::{CoreError, CoreResult};
use crate::numeric::Real;

/// A matrix row tagged with its global index.
pub type GlobalRow = (usize, Vec<Real>);

pub trait Communicator {
    fn rank(&self) -> usize;

    fn size(&self) -> usize;

    /// Broadcast `value` from `root`; every process returns the root's value.
    fn broadcast_u32(&self, value: u32, root: usize) -> CoreResult<u32>;

    /// Gather the rows contributed by every process on every process.
    fn all_gather_rows(&self, rows: Vec<GlobalRow>) -> CoreResult<Vec<GlobalRow>>;
}

/// Single-process communicator.
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn broadcast_u32(&self, value: u32, root: usize) -> CoreResult<u32> {
        if root != 0 {
            return Err(CoreError::Collective {
                what: format!("broadcast root {root} outside a group of size 1"),
            });
        }
        Ok(value)
    }

    fn all_gather_rows(&self, rows: Vec<GlobalRow>) -> CoreResult<Vec<GlobalRow>> {
        Ok(rows)
    }
}

struct Shared {
    size: usize,
    barrier: Barrier,
    word: Mutex<Option<u32>>,
    rows: Mutex<Vec<Vec<GlobalRow>>>,
}

/// In-process group of communicators, one per thread.
///
/// Each handle must be driven from its own thread; collectives block on a
/// shared barrier until all members arrive.
pub struct LocalGroup;

impl LocalGroup {
    pub fn new(size: usize) -> CoreResult<Vec<LocalComm>> {
        if size == 0 {
            return Err(CoreError::InvalidArg {
                what: "group size must be positive",
            });
        }
        let shared = Arc::new(Shared {
            size,
            barrier: Barrier::new(size),
            word: Mutex::new(None),
            rows: Mutex::new(vec![Vec::new(); size]),
        });
        Ok((0..size)
            .map(|rank| LocalComm {
                rank,
                shared: Arc::clone(&shared),
            })
            .collect())
    }
}

/// One member of a [`LocalGroup`].
pub struct LocalComm {
    rank: usize,
    shared: Arc<Shared>,
}

fn poisoned(what: &str) -> CoreError {
    CoreError::Collective {
        what: format!("{what}: a group member panicked"),
    }
}

impl Communicator for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn broadcast_u32(&self, value: u32, root: usize) -> CoreResult<u32> {
        if root >= self.shared.size {
            return Err(CoreError::Collective {
                what: format!(
                    "broadcast root {root} outside a group of size {}",
                    self.shared.size
                ),
            });
        }
        if self.rank == root {
            *self.shared.word.lock().map_err(|_| poisoned("broadcast"))? = Some(value);
        }
        self.shared.barrier.wait();
        let received = *self.shared.word.lock().map_err(|_| poisoned("broadcast"))?;
        // Nobody may overwrite the slot before every member has read it.
        self.shared.barrier.wait();

        tracing::trace!(rank = self.rank, root, "broadcast complete");
        received.ok_or_else(|| CoreError::Collective {
            what: "broadcast root did not publish a value".to_string(),
        })
    }

    fn all_gather_rows(&self, rows: Vec<GlobalRow>) -> CoreResult<Vec<GlobalRow>> {
        self.shared.rows.lock().map_err(|_| poisoned("all-gather"))?[self.rank] = rows;
        self.shared.barrier.wait();
        let gathered = self
            .shared
            .rows
            .lock()
            .map_err(|_| poisoned("all-gather"))?
            .iter()
            .flatten()
            .cloned()
            .collect();
        self.shared.barrier.wait();
        Ok(gathered)
    }
}
