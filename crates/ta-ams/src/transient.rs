//! Trajectory driver around a single theta step.

use rand::Rng;
use rand::rngs::StdRng;
use ta_core::Vector;
use ta_sim::{Physics, ThetaStep};

use crate::error::{AmsError, AmsResult};
use crate::params::AmsParams;
use crate::score::ScoreFunction;
use crate::seed::path_rng;

/// Score at which a trajectory has reached the target state.
pub const TARGET_SCORE: f64 = 1.0;

/// One sample path.
#[derive(Clone, Debug, PartialEq)]
pub struct Trajectory {
    pub path: u64,
    pub final_state: Vector,
    /// Model time reached.
    pub time: f64,
    pub steps: usize,
    /// Score after every step; empty without a score function.
    pub scores: Vec<f64>,
}

impl Trajectory {
    pub fn max_score(&self) -> Option<f64> {
        self.scores.iter().copied().reduce(f64::max)
    }

    pub fn reached_target(&self) -> bool {
        self.max_score().is_some_and(|s| s >= TARGET_SCORE)
    }
}

/// Marches states with a [`ThetaStep`] plus explicit noise.
pub struct Transient<P> {
    step: ThetaStep<P>,
    score: Option<ScoreFunction>,
    x0: Option<Vector>,
    global_len: usize,
    dt: f64,
    end_time: f64,
    seed: Option<u32>,
    rank: usize,
}

impl<P: Physics> Transient<P> {
    pub fn new(step: ThetaStep<P>) -> Self {
        let params = AmsParams::default();
        let global_len = step.model().borrow().dim();
        Self {
            step,
            score: None,
            x0: None,
            global_len,
            dt: params.time_step,
            end_time: params.end_time,
            seed: None,
            rank: 0,
        }
    }

    pub fn with_initial_state(mut self, x0: Vector) -> Self {
        self.x0 = Some(x0);
        self
    }

    pub fn with_score(mut self, score: ScoreFunction, x0: Vector, global_len: usize) -> Self {
        self.score = Some(score);
        self.x0 = Some(x0);
        self.global_len = global_len;
        self
    }

    /// Take the driver's time step and end time from `params`.
    pub fn set_parameters(&mut self, params: &AmsParams) -> AmsResult<()> {
        params.validate()?;
        self.dt = params.time_step;
        self.end_time = params.end_time;
        Ok(())
    }

    /// Seed the per-path random streams of process `rank`.
    pub fn set_random_engine(&mut self, seed: u32, rank: usize) {
        self.seed = Some(seed);
        self.rank = rank;
    }

    pub fn seed(&self) -> Option<u32> {
        self.seed
    }

    pub fn time_step_size(&self) -> f64 {
        self.dt
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn global_len(&self) -> usize {
        self.global_len
    }

    pub fn initial_state(&self) -> Option<&Vector> {
        self.x0.as_ref()
    }

    pub fn step_map(&self) -> &ThetaStep<P> {
        &self.step
    }

    pub fn has_score(&self) -> bool {
        self.score.is_some()
    }

    /// Score of `x`, if a score function is wired in.
    pub fn score(&self, x: &Vector) -> Option<f64> {
        self.score.as_ref().map(|f| f(x))
    }

    /// Random stream of `path` on this process.
    pub fn path_rng(&self, path: u64) -> StdRng {
        path_rng(self.seed.unwrap_or(0), self.rank, path)
    }

    /// One implicit step of size `dt` followed by the model's noise.
    pub fn time_step<R: Rng + ?Sized>(&self, x: &Vector, dt: f64, rng: &mut R) -> AmsResult<Vector> {
        let x_new = self.step.step(x, dt)?;
        Ok(self.step.perturb(&x_new, dt, rng))
    }

    /// March path `path` from the stored initial state.
    pub fn run_path(&self, path: u64) -> AmsResult<Trajectory> {
        let x0 = self.x0.clone().ok_or_else(|| AmsError::Config {
            what: "transient has no initial state".to_string(),
        })?;
        self.trajectory(&x0, path)
    }

    /// March from `x0` until the end time, stopping early once the score
    /// reaches the target.
    pub fn trajectory(&self, x0: &Vector, path: u64) -> AmsResult<Trajectory> {
        let mut rng = self.path_rng(path);
        let mut x = x0.clone();
        let mut time = 0.0;
        let mut steps = 0;
        let mut scores = Vec::new();

        while time < self.end_time {
            x = self.time_step(&x, self.dt, &mut rng)?;
            time += self.dt;
            steps += 1;

            if let Some(s) = self.score(&x) {
                scores.push(s);
                if s >= TARGET_SCORE {
                    break;
                }
            }
        }

        tracing::debug!(path, steps, time, "trajectory finished");
        Ok(Trajectory {
            path,
            final_state: x,
            time,
            steps,
            scores,
        })
    }
}
