//! Shared random seed across a process group.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use ta_core::{Communicator, CoreResult};

/// Rank that draws and broadcasts the seed.
pub const SEED_ROOT: usize = 0;

/// Agree on one seed across `comm`.
///
/// A non-zero `configured` seed is used as is. Zero asks the root process to
/// draw from `entropy`; other processes never touch their entropy source.
/// Collective: every process must call it.
pub fn shared_seed(configured: u32, comm: &dyn Communicator, entropy: &mut dyn RngCore) -> CoreResult<u32> {
    let local = if configured == 0 && comm.rank() == SEED_ROOT {
        entropy.next_u32()
    } else {
        configured
    };
    let seed = comm.broadcast_u32(local, SEED_ROOT)?;
    tracing::info!(seed, rank = comm.rank(), "Global seed");
    Ok(seed)
}

/// Random stream of sample path `path` on process `rank`.
///
/// Streams are a pure function of `(seed, rank, path)`, so a rerun with the
/// logged seed replays every path.
pub fn path_rng(seed: u32, rank: usize, path: u64) -> StdRng {
    let offset = ((rank as u64) << 32).wrapping_add(path);
    StdRng::seed_from_u64(u64::from(seed).wrapping_add(offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ta_core::SerialComm;

    /// Entropy source that counts how often it is asked.
    struct Counting {
        calls: usize,
    }

    impl RngCore for Counting {
        fn next_u32(&mut self) -> u32 {
            self.calls += 1;
            7
        }

        fn next_u64(&mut self) -> u64 {
            u64::from(self.next_u32())
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(7);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }

    #[test]
    fn configured_seed_skips_entropy() {
        let mut entropy = Counting { calls: 0 };
        assert_eq!(shared_seed(1234, &SerialComm, &mut entropy).unwrap(), 1234);
        assert_eq!(entropy.calls, 0);
    }

    #[test]
    fn zero_seed_draws_once_on_root() {
        let mut entropy = Counting { calls: 0 };
        assert_eq!(shared_seed(0, &SerialComm, &mut entropy).unwrap(), 7);
        assert_eq!(entropy.calls, 1);
    }

    #[test]
    fn path_streams_replay_and_differ() {
        let a: Vec<u32> = (0..4).map(|_| path_rng(9, 0, 3).next_u32()).collect();
        assert!(a.windows(2).all(|w| w[0] == w[1]));

        let mut p0 = path_rng(9, 0, 0);
        let mut p1 = path_rng(9, 0, 1);
        let s0: Vec<u64> = (0..8).map(|_| p0.next_u64()).collect();
        let s1: Vec<u64> = (0..8).map(|_| p1.next_u64()).collect();
        assert_ne!(s0, s1);
    }

    #[test]
    fn rank_offset_is_deterministic() {
        // Path 2^32 on rank 0 and path 0 on rank 1 share a stream.
        let mut a = path_rng(5, 1, 0);
        let mut b = path_rng(5, 0, 1 << 32);
        assert_eq!(a.next_u64(), b.next_u64());
    }
}
