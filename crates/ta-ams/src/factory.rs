//! Composition root for transients.
//!
//! Picks the theta model variant, wraps it in a [`ThetaStep`], wires the
//! score function and agrees on the random seed across the process group.

use std::cell::RefCell;
use std::rc::Rc;

use rand::RngCore;
use ta_core::{Communicator, Layout, Matrix, Vector};
use ta_sim::{Physics, ThetaModel, ThetaStep};

use crate::error::{AmsError, AmsResult};
use crate::params::AmsParams;
use crate::score::{Endpoints, ScoreFamily, score_function};
use crate::seed::shared_seed;
use crate::space::load_subspace;
use crate::transient::Transient;

pub struct TransientFactory<'a> {
    params: AmsParams,
    comm: &'a dyn Communicator,
}

/// Stochastic transients run on a full replica of the state on every
/// process; the processes split the paths, not the unknowns. Scores and
/// projections are then local computations needing no reduction.
fn require_replicated(layout: &Layout) -> AmsResult<()> {
    if layout.local_len() == layout.global_len() {
        return Ok(());
    }
    Err(AmsError::Config {
        what: format!(
            "stochastic transients need all {} unknowns on every process, this one owns {}",
            layout.global_len(),
            layout.local_len()
        ),
    })
}

fn shared<P: Physics>(model: ThetaModel<P>) -> ThetaStep<P> {
    ThetaStep::new(Rc::new(RefCell::new(model)))
}

impl<'a> TransientFactory<'a> {
    pub fn new(params: AmsParams, comm: &'a dyn Communicator) -> AmsResult<Self> {
        params.validate()?;
        Ok(Self { params, comm })
    }

    pub fn params(&self) -> &AmsParams {
        &self.params
    }

    /// Plain time marching without noise or scores.
    pub fn deterministic<P: Physics>(&self, physics: P) -> AmsResult<Transient<P>> {
        let model = ThetaModel::deterministic(physics, &self.params.theta)?;
        let mut transient = Transient::new(shared(model));
        transient.set_parameters(&self.params)?;
        Ok(transient)
    }

    /// As [`TransientFactory::deterministic`], starting from `x0`.
    pub fn deterministic_from<P: Physics>(&self, physics: P, x0: Vector) -> AmsResult<Transient<P>> {
        Ok(self.deterministic(physics)?.with_initial_state(x0))
    }

    /// Noisy transient scored between `endpoints`.
    ///
    /// With a `basis` the noise and the score live in its span, and the
    /// endpoints are restricted to basis coordinates before scoring.
    /// Collective: the seed is broadcast over the factory's communicator.
    /// The physics must hold every unknown on every process; a partial
    /// layout is rejected before any collective is entered.
    pub fn stochastic<P: Physics>(
        &self,
        physics: P,
        endpoints: Endpoints,
        basis: Option<Matrix>,
        entropy: &mut dyn RngCore,
    ) -> AmsResult<Transient<P>> {
        let layout = physics.layout();
        require_replicated(&layout)?;
        let global_len = layout.global_len();
        let family = ScoreFamily::from_dof(self.params.dof);
        let x0 = endpoints.start.clone();

        let (model, score) = match basis {
            Some(basis) => {
                let model = ThetaModel::projected(physics, &self.params.theta, basis)?;
                let restricted = Endpoints::new(
                    model.restrict(&endpoints.start)?,
                    model.restrict(&endpoints.saddle)?,
                    model.restrict(&endpoints.target)?,
                );
                tracing::info!(?family, vectors = restricted.start.len(), "projected stochastic transient");
                let score = score_function(family, restricted, model.basis().cloned())?;
                (model, score)
            }
            None => {
                let model = ThetaModel::stochastic(physics, &self.params.theta)?;
                tracing::info!(?family, "stochastic transient");
                (model, score_function(family, endpoints, None)?)
            }
        };

        let mut transient = Transient::new(shared(model)).with_score(score, x0, global_len);
        transient.set_parameters(&self.params)?;

        let seed = shared_seed(self.params.seed, self.comm, entropy)?;
        transient.set_random_engine(seed, self.comm.rank());
        Ok(transient)
    }

    /// [`TransientFactory::stochastic`] with the basis read from the
    /// configured `space` file, if any. The file rows are gathered in the
    /// order of the physics layout on every process.
    pub fn stochastic_from_config<P: Physics>(
        &self,
        physics: P,
        endpoints: Endpoints,
        entropy: &mut dyn RngCore,
    ) -> AmsResult<Transient<P>> {
        let layout = physics.layout();
        require_replicated(&layout)?;
        let basis = match self.params.space_path() {
            Some(path) => Some(load_subspace(&path, &layout, self.comm)?),
            None => None,
        };
        self.stochastic(physics, endpoints, basis, entropy)
    }
}
