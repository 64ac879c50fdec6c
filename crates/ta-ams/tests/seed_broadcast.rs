//! Seed agreement across an in-process group.

use std::thread;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use ta_ams::{AmsParams, Endpoints, TransientFactory, path_rng};
use ta_core::{Communicator, LocalGroup, Vector};
use ta_sim::{Physics, SimResult};

struct Drift;

impl Physics for Drift {
    fn dim(&self) -> usize {
        2
    }

    fn initial_state(&self) -> Vector {
        Vector::zeros(2)
    }

    fn rhs(&self, x: &Vector) -> SimResult<Vector> {
        Ok(-x)
    }

    fn noise_forcing(&self) -> Vector {
        Vector::from_element(2, 0.1)
    }
}

fn endpoints() -> Endpoints {
    Endpoints::new(
        Vector::from_element(2, -1.0),
        Vector::zeros(2),
        Vector::from_element(2, 1.0),
    )
}

/// Per rank: the agreed seed and the first draw of path 0.
fn run_group(size: usize, configured: u32) -> Vec<(usize, u32, u64)> {
    let comms = LocalGroup::new(size).unwrap();
    let handles: Vec<_> = comms
        .into_iter()
        .map(|comm| {
            thread::spawn(move || {
                let rank = comm.rank();
                let params = AmsParams {
                    seed: configured,
                    ..AmsParams::default()
                };
                // Every rank has a different entropy source.
                let mut entropy = StdRng::seed_from_u64(1000 + rank as u64);
                let factory = TransientFactory::new(params, &comm).unwrap();
                let transient = factory
                    .stochastic(Drift, endpoints(), None, &mut entropy)
                    .unwrap();
                let seed = transient.seed().unwrap();
                (rank, seed, transient.path_rng(0).next_u64())
            })
        })
        .collect();

    let mut results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    results.sort_by_key(|r| r.0);
    results
}

#[test]
fn drawn_seed_is_shared_by_every_rank() {
    let results = run_group(3, 0);
    let expected = StdRng::seed_from_u64(1000).next_u32();

    for (_, seed, _) in &results {
        assert_eq!(*seed, expected);
    }
}

#[test]
fn configured_seed_is_shared_by_every_rank() {
    let results = run_group(4, 99);
    assert!(results.iter().all(|(_, seed, _)| *seed == 99));
}

#[test]
fn path_streams_differ_only_by_rank_offset() {
    let results = run_group(3, 42);

    for (rank, seed, first) in &results {
        assert_eq!(*first, path_rng(*seed, *rank, 0).next_u64());
    }
    assert_ne!(results[0].2, results[1].2);
    assert_ne!(results[1].2, results[2].2);
}
