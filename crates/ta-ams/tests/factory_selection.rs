//! Variant and score selection of the transient factory.

use rand::SeedableRng;
use rand::rngs::StdRng;
use ta_ams::{AmsParams, Endpoints, TransientFactory};
use ta_core::{Matrix, SerialComm, Vector};
use ta_sim::{Physics, SimResult, ThetaKind};

/// Independent double wells dx/dt = x - x^3 with additive noise.
struct DoubleWell {
    n: usize,
    sigma: f64,
}

impl Physics for DoubleWell {
    fn dim(&self) -> usize {
        self.n
    }

    fn initial_state(&self) -> Vector {
        Vector::from_element(self.n, -1.0)
    }

    fn rhs(&self, x: &Vector) -> SimResult<Vector> {
        Ok(x.map(|v| v - v * v * v))
    }

    fn noise_forcing(&self) -> Vector {
        Vector::from_element(self.n, self.sigma)
    }
}

fn wells() -> DoubleWell {
    DoubleWell { n: 3, sigma: 0.3 }
}

fn endpoints() -> Endpoints {
    Endpoints::new(
        Vector::from_element(3, -1.0),
        Vector::zeros(3),
        Vector::from_element(3, 1.0),
    )
}

fn params(dof: usize) -> AmsParams {
    AmsParams {
        seed: 17,
        dof,
        time_step: 0.25,
        end_time: 1.0,
        ..AmsParams::default()
    }
}

fn temp_dir(name: &str) -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("ta_ams_{name}_{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn deterministic_transient_has_no_noise_or_score() {
    let factory = TransientFactory::new(params(1), &SerialComm).unwrap();
    let x0 = Vector::from_element(3, 0.5);
    let transient = factory.deterministic_from(wells(), x0.clone()).unwrap();

    assert!(!transient.has_score());
    assert_eq!(transient.seed(), None);
    assert_eq!(transient.step_map().model().borrow().kind(), &ThetaKind::Deterministic);

    let a = transient.run_path(0).unwrap();
    let b = transient.run_path(1).unwrap();
    assert_eq!(a.final_state, b.final_state);
    assert_eq!(a.steps, 4);
    assert!(a.scores.is_empty());
    // Drifts toward the upper well.
    assert!(a.final_state.iter().all(|&v| v > 0.5 && v < 1.0));
}

#[test]
fn deterministic_transient_without_initial_state_cannot_run_paths() {
    let factory = TransientFactory::new(params(1), &SerialComm).unwrap();
    let transient = factory.deterministic(wells()).unwrap();
    assert!(transient.run_path(0).is_err());
    assert!(transient.trajectory(&Vector::from_element(3, 0.2), 0).is_ok());
}

#[test]
fn stochastic_transient_scores_between_endpoints() {
    let factory = TransientFactory::new(params(1), &SerialComm).unwrap();
    let mut entropy = StdRng::seed_from_u64(1);
    let transient = factory.stochastic(wells(), endpoints(), None, &mut entropy).unwrap();

    assert_eq!(transient.step_map().model().borrow().kind(), &ThetaKind::Stochastic);
    assert_eq!(transient.seed(), Some(17));
    assert_eq!(transient.global_len(), 3);
    assert_eq!(transient.initial_state(), Some(&Vector::from_element(3, -1.0)));
    assert_eq!(transient.score(&Vector::from_element(3, -1.0)), Some(0.0));
    assert_eq!(transient.score(&Vector::from_element(3, 1.0)), Some(1.0));
    assert_eq!(transient.score(&Vector::zeros(3)), Some(0.5));
}

#[test]
fn ocean_dof_selects_saddle_score() {
    let factory = TransientFactory::new(params(6), &SerialComm).unwrap();
    let mut entropy = StdRng::seed_from_u64(1);
    let near_start = Endpoints::new(
        Vector::from_element(3, -1.0),
        Vector::from_element(3, -0.5),
        Vector::from_element(3, 1.0),
    );
    let ocean = factory
        .stochastic(wells(), near_start.clone(), None, &mut entropy)
        .unwrap();
    let default = TransientFactory::new(params(1), &SerialComm)
        .unwrap()
        .stochastic(wells(), near_start, None, &mut entropy)
        .unwrap();

    // The ocean family puts the saddle at one half, the default family
    // only sees distances to the two wells.
    let saddle = Vector::from_element(3, -0.5);
    assert!((ocean.score(&saddle).unwrap() - 0.5).abs() < 1e-12);
    assert!((default.score(&saddle).unwrap() - 0.25).abs() < 1e-12);
}

#[test]
fn same_seed_and_path_replay_exactly() {
    let factory = TransientFactory::new(params(1), &SerialComm).unwrap();
    let mut entropy = StdRng::seed_from_u64(1);
    let transient = factory.stochastic(wells(), endpoints(), None, &mut entropy).unwrap();

    let a = transient.run_path(4).unwrap();
    let b = transient.run_path(4).unwrap();
    let c = transient.run_path(5).unwrap();

    assert_eq!(a, b);
    assert_ne!(a.final_state, c.final_state);
    assert_eq!(a.scores.len(), a.steps);
    assert!(a.scores.iter().all(|s| (0.0..=1.0).contains(s)));
}

#[test]
fn projected_noise_stays_in_basis_span() {
    let factory = TransientFactory::new(params(1), &SerialComm).unwrap();
    let mut entropy = StdRng::seed_from_u64(1);
    let basis = Matrix::from_column_slice(3, 1, &[2.0, 2.0, 2.0]);
    let transient = factory
        .stochastic(wells(), endpoints(), Some(basis), &mut entropy)
        .unwrap();

    let model = transient.step_map().model().clone();
    assert!(matches!(model.borrow().kind(), ThetaKind::StochasticProjected { .. }));

    let x = Vector::from_vec(vec![-0.9, -1.1, -1.0]);
    let deterministic = transient.step_map().step(&x, 0.01).unwrap();
    let mut rng = transient.path_rng(0);
    let noisy = transient.time_step(&x, 0.01, &mut rng).unwrap();
    let noise = noisy - deterministic;

    assert!(noise.norm() > 0.0);
    assert!((noise[0] - noise[1]).abs() < 1e-12);
    assert!((noise[1] - noise[2]).abs() < 1e-12);

    // Scores are taken along (1, 1, 1) only.
    let on_line = transient.score(&Vector::zeros(3)).unwrap();
    let off_line = transient.score(&Vector::from_vec(vec![0.5, -0.5, 0.0])).unwrap();
    assert!((on_line - 0.5).abs() < 1e-12);
    assert!((on_line - off_line).abs() < 1e-12);
}

#[test]
fn configured_space_selects_projected_variant() {
    let dir = temp_dir("space");
    let path = dir.join("basis.mtx");
    std::fs::write(
        &path,
        "%%MatrixMarket matrix array real general\n3 1\n1.0\n1.0\n1.0\n",
    )
    .unwrap();

    let mut with_space = params(1);
    with_space.space = path.display().to_string();
    let factory = TransientFactory::new(with_space, &SerialComm).unwrap();
    let mut entropy = StdRng::seed_from_u64(1);
    let transient = factory
        .stochastic_from_config(wells(), endpoints(), &mut entropy)
        .unwrap();
    let model = transient.step_map().model().borrow();
    let basis = model.basis().unwrap();
    assert_eq!(basis.ncols(), 1);
    assert!((basis.column(0).norm() - 1.0).abs() < 1e-12);
    drop(model);

    let factory = TransientFactory::new(params(1), &SerialComm).unwrap();
    let transient = factory
        .stochastic_from_config(wells(), endpoints(), &mut entropy)
        .unwrap();
    assert_eq!(transient.step_map().model().borrow().kind(), &ThetaKind::Stochastic);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_space_file_is_an_error() {
    let mut with_space = params(1);
    with_space.space = "/nonexistent/basis.mtx".to_string();
    let factory = TransientFactory::new(with_space, &SerialComm).unwrap();
    let mut entropy = StdRng::seed_from_u64(1);
    assert!(
        factory
            .stochastic_from_config(wells(), endpoints(), &mut entropy)
            .is_err()
    );
}
