//! Stommel two-box model of the overturning circulation.
//!
//! Nondimensional temperature and salinity differences between the boxes
//! relax to their forcing while being mixed by a flow proportional to
//! `|T - S|`:
//!
//! ```text
//! dT/dt = eta1 - T (1 + |T - S|)
//! dS/dt = eta2 - S (eta3 + |T - S|)
//! ```
//!
//! For suitable forcing the model has a thermally driven and a salinity
//! driven steady state separated by a saddle. Noise acts on the freshwater
//! forcing, i.e. on the salinity equation only.

use std::path::Path;

use serde::{Deserialize, Serialize};
use ta_core::{Matrix, Vector};
use ta_sim::{Physics, SimError, SimResult};

use crate::common::{check_finite, columns, write_snapshot};

/// Intervals scanned when bracketing steady states.
const SCAN_INTERVALS: usize = 4000;
const BISECTION_STEPS: usize = 200;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StommelParams {
    #[serde(rename = "thermal forcing")]
    pub eta1: f64,
    #[serde(rename = "freshwater forcing")]
    pub eta2: f64,
    #[serde(rename = "salinity relaxation")]
    pub eta3: f64,
    /// Amplitude of the freshwater noise.
    #[serde(rename = "noise amplitude")]
    pub sigma: f64,
    #[serde(rename = "initial temperature")]
    pub t0: f64,
    #[serde(rename = "initial salinity")]
    pub s0: f64,
}

impl Default for StommelParams {
    fn default() -> Self {
        Self {
            eta1: 3.0,
            eta2: 1.0,
            eta3: 0.3,
            sigma: 0.05,
            t0: 1.7,
            s0: 0.95,
        }
    }
}

#[derive(Debug, Serialize)]
struct StommelSnapshot<'a> {
    temperature: f64,
    salinity: f64,
    flow_strength: f64,
    accepted_steps: usize,
    params: &'a StommelParams,
}

#[derive(Clone, Debug)]
pub struct Stommel {
    params: StommelParams,
    accepted_steps: usize,
}

impl Stommel {
    pub fn new(params: StommelParams) -> SimResult<Self> {
        check_finite(params.eta1, "thermal forcing")?;
        check_finite(params.eta2, "freshwater forcing")?;
        check_finite(params.sigma, "noise amplitude")?;
        check_finite(params.t0, "initial temperature")?;
        check_finite(params.s0, "initial salinity")?;
        if !(params.eta3.is_finite() && params.eta3 > 0.0) {
            return Err(SimError::InvalidArg {
                what: "salinity relaxation must be positive",
            });
        }
        Ok(Self {
            params,
            accepted_steps: 0,
        })
    }

    pub fn params(&self) -> &StommelParams {
        &self.params
    }

    /// Steps reported through `post_process` so far.
    pub fn accepted_steps(&self) -> usize {
        self.accepted_steps
    }

    /// Steady-state residual in terms of the flow strength `q = T - S`.
    fn flow_balance(&self, q: f64) -> f64 {
        let p = &self.params;
        p.eta1 / (1.0 + q.abs()) - p.eta2 / (p.eta3 + q.abs()) - q
    }

    fn state_for_flow(&self, q: f64) -> Vector {
        let p = &self.params;
        Vector::from_vec(vec![p.eta1 / (1.0 + q.abs()), p.eta2 / (p.eta3 + q.abs())])
    }

    /// All steady states, ordered by increasing flow strength `T - S`.
    pub fn equilibria(&self) -> Vec<Vector> {
        let p = &self.params;
        // |T| <= |eta1| and |S| <= |eta2| / eta3 bound the flow.
        let bound = p.eta1.abs() + p.eta2.abs() / p.eta3 + 1.0;
        let h = 2.0 * bound / SCAN_INTERVALS as f64;

        let mut roots = Vec::new();
        for i in 0..SCAN_INTERVALS {
            let (mut a, mut b) = (-bound + i as f64 * h, -bound + (i + 1) as f64 * h);
            let (mut fa, fb) = (self.flow_balance(a), self.flow_balance(b));
            if fa == 0.0 {
                roots.push(a);
                continue;
            }
            if fa * fb > 0.0 || fb == 0.0 {
                continue;
            }
            for _ in 0..BISECTION_STEPS {
                let mid = 0.5 * (a + b);
                let fm = self.flow_balance(mid);
                if fm == 0.0 || b - a < f64::EPSILON * bound {
                    a = mid;
                    b = mid;
                    break;
                }
                if fa * fm < 0.0 {
                    b = mid;
                } else {
                    a = mid;
                    fa = fm;
                }
            }
            roots.push(0.5 * (a + b));
        }
        roots.into_iter().map(|q| self.state_for_flow(q)).collect()
    }

    /// Thermally driven state, saddle and salinity driven state.
    pub fn transition_states(&self) -> SimResult<(Vector, Vector, Vector)> {
        let mut states = self.equilibria();
        if states.len() != 3 {
            return Err(SimError::Model {
                message: format!(
                    "expected 3 steady states for the given forcing, found {}",
                    states.len()
                ),
            });
        }
        let thermal = states.remove(2);
        let saddle = states.remove(1);
        let salinity = states.remove(0);
        tracing::info!(
            thermal_flow = thermal[0] - thermal[1],
            saddle_flow = saddle[0] - saddle[1],
            salinity_flow = salinity[0] - salinity[1],
            "Stommel steady states"
        );
        Ok((thermal, saddle, salinity))
    }
}

impl Physics for Stommel {
    fn dim(&self) -> usize {
        2
    }

    fn initial_state(&self) -> Vector {
        Vector::from_vec(vec![self.params.t0, self.params.s0])
    }

    fn rhs(&self, x: &Vector) -> SimResult<Vector> {
        let p = &self.params;
        let (t, s) = (x[0], x[1]);
        let q = (t - s).abs();
        Ok(Vector::from_vec(vec![
            check_finite(p.eta1 - t * (1.0 + q), "temperature tendency")?,
            check_finite(p.eta2 - s * (p.eta3 + q), "salinity tendency")?,
        ]))
    }

    fn jacobian(&self, x: &Vector) -> SimResult<Matrix> {
        let p = &self.params;
        let (t, s) = (x[0], x[1]);
        let q = (t - s).abs();
        // d|T - S|/dT; the kink at T = S takes the one-sided value 0.
        let sign = if t == s { 0.0 } else { (t - s).signum() };
        Ok(Matrix::from_row_slice(
            2,
            2,
            &[
                -(1.0 + q) - t * sign,
                t * sign,
                -s * sign,
                -(p.eta3 + q) + s * sign,
            ],
        ))
    }

    fn noise_forcing(&self) -> Vector {
        Vector::from_vec(vec![0.0, self.params.sigma])
    }

    fn post_process(&mut self, _x: &Vector) -> SimResult<()> {
        self.accepted_steps += 1;
        Ok(())
    }

    fn write_data(&self, x: &Vector, describe: bool) -> String {
        columns(describe, &["T", "S", "psi"], &[x[0], x[1], x[0] - x[1]])
    }

    fn save_state(&self, x: &Vector, path: &Path) -> SimResult<()> {
        write_snapshot(
            path,
            &StommelSnapshot {
                temperature: x[0],
                salinity: x[1],
                flow_strength: x[0] - x[1],
                accepted_steps: self.accepted_steps,
                params: &self.params,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ta_solver::central_difference_jacobian;

    fn model() -> Stommel {
        Stommel::new(StommelParams::default()).unwrap()
    }

    #[test]
    fn analytic_jacobian_matches_differences() {
        let m = model();
        for x in [[1.7, 0.95], [0.5, 2.0], [2.9, 3.1]] {
            let x = Vector::from_row_slice(&x);
            let exact = m.jacobian(&x).unwrap();
            let numeric = central_difference_jacobian(&x, |v| m.rhs(v), 1e-6).unwrap();
            assert_relative_eq!(exact, numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn default_forcing_is_bistable() {
        let m = model();
        let states = m.equilibria();
        assert_eq!(states.len(), 3);
        for x in &states {
            assert!(m.rhs(x).unwrap().amax() < 1e-10);
        }
        let flows: Vec<f64> = states.iter().map(|x| x[0] - x[1]).collect();
        assert!(flows[0] < 0.0 && flows[1] > 0.0 && flows[2] > flows[1]);
    }

    #[test]
    fn strong_freshwater_forcing_leaves_one_state() {
        let m = Stommel::new(StommelParams {
            eta2: 2.0,
            ..StommelParams::default()
        })
        .unwrap();
        assert_eq!(m.equilibria().len(), 1);
        assert!(m.transition_states().is_err());
    }

    #[test]
    fn noise_only_forces_salinity() {
        let n = model().noise_forcing();
        assert_eq!(n[0], 0.0);
        assert_eq!(n[1], 0.05);
    }

    #[test]
    fn non_positive_relaxation_is_rejected() {
        let params = StommelParams {
            eta3: 0.0,
            ..StommelParams::default()
        };
        assert!(Stommel::new(params).is_err());
    }
}
