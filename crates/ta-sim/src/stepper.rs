//! Adaptive implicit time stepping with Newton per step.
//!
//! Each step snapshots the model, runs an undamped Newton loop on the theta
//! residual, and either accepts the result or restores the snapshot and
//! retries with a smaller step. Accepted steps adapt the step size to the
//! Newton iteration count.

use std::path::PathBuf;

use ta_core::units::timescale_in_years;
use ta_core::{norm_inf, norm2};

use crate::control::StepControl;
use crate::error::{SimError, SimResult};
use crate::model::Model;
use crate::output::{DiagnosticRow, TDATA_FILE, TabularLog, dump_vector, snapshot_file_name};
use crate::params::ThetaParams;

/// Newton increments larger than this (infinity norm) abort the step.
pub const DIVERGENCE_THRESHOLD: f64 = 1e2;

/// Residual dump written when a step fails to converge.
pub const FAILED_RHS_FILE: &str = "failed_rhs.txt";

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// End time or step budget reached.
    Completed,
    /// Newton failed at the minimum step size.
    MinimumStepReached,
}

impl RunStatus {
    /// Process exit code for this outcome.
    pub fn code(self) -> i32 {
        match self {
            RunStatus::Completed => 0,
            RunStatus::MinimumStepReached => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunSummary {
    pub status: RunStatus,
    pub steps: u64,
    pub time_years: f64,
    /// Step size the next step would have used.
    pub dt: f64,
    pub total_newton_iterations: usize,
    pub rejected_steps: usize,
}

pub struct ThetaStepper<'a, M: Model + ?Sized> {
    model: &'a mut M,
    control: StepControl,
    time: f64,
    dt: f64,
    in_years: f64,
    end_time: f64,
    step: u64,
    max_steps: i64,
    output_frequency: i64,
    newton_tolerance: f64,
    newton_iteration_limit: usize,
    k: usize,
    total_newton_iterations: usize,
    rejected_steps: usize,
    norm_dx: f64,
    norm_f: f64,
    output_dir: PathBuf,
    log: TabularLog,
}

impl<'a, M: Model + ?Sized> ThetaStepper<'a, M> {
    /// Stepper writing its diagnostic table to `tdata.txt` in the output directory.
    pub fn new(model: &'a mut M, params: &ThetaParams) -> SimResult<Self> {
        params.validate()?;
        let log = TabularLog::create_in(&params.output_dir)?;
        Self::with_log(model, params, log)
    }

    pub fn with_log(model: &'a mut M, params: &ThetaParams, log: TabularLog) -> SimResult<Self> {
        params.validate()?;
        model.set_theta(params.theta)?;

        Ok(Self {
            model,
            control: StepControl::from_params(params),
            time: 0.0,
            dt: params.initial_dt,
            in_years: timescale_in_years(params.timescale_days),
            end_time: params.end_time_years,
            step: 0,
            max_steps: params.max_steps,
            output_frequency: params.output_frequency,
            newton_tolerance: params.newton_tolerance,
            newton_iteration_limit: params.newton_iteration_limit,
            k: 0,
            total_newton_iterations: 0,
            rejected_steps: 0,
            norm_dx: 0.0,
            norm_f: 0.0,
            output_dir: params.output_dir.clone(),
            log,
        })
    }

    /// Simulation time in years.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Accepted steps so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    /// Current step size in model time units.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Newton iterations of the most recent step attempt.
    pub fn newton_iterations(&self) -> usize {
        self.k
    }

    pub fn total_newton_iterations(&self) -> usize {
        self.total_newton_iterations
    }

    pub fn rejected_steps(&self) -> usize {
        self.rejected_steps
    }

    fn within_step_budget(&self) -> bool {
        self.max_steps < 0 || (self.step as i64) < self.max_steps
    }

    fn summary(&self, status: RunStatus) -> RunSummary {
        RunSummary {
            status,
            steps: self.step,
            time_years: self.time,
            dt: self.dt,
            total_newton_iterations: self.total_newton_iterations,
            rejected_steps: self.rejected_steps,
        }
    }

    /// Step until the end time or the step budget is reached.
    ///
    /// Failed Newton solves, including model evaluations that error out inside
    /// the Newton loop, are retried with a smaller step from the restored
    /// state; a failure at the minimum step size ends the run with
    /// [`RunStatus::MinimumStepReached`]. Errors are reserved for failures
    /// outside the Newton loop and for I/O.
    pub fn run(&mut self) -> SimResult<RunSummary> {
        let mut in_budget = self.within_step_budget();
        while self.time < self.end_time && in_budget {
            tracing::info!("Timestepping:    t = {} y", self.time);

            self.model.pre_process()?;
            self.model.store()?;

            if !self.newton()? {
                tracing::warn!("Newton did not converge! ||F|| = {}, restoring model", self.norm_f);
                dump_vector(
                    self.output_dir.join(FAILED_RHS_FILE),
                    self.model.rhs().as_slice(),
                )?;

                let old_dt = self.dt;
                self.dt = self.control.shrink(self.dt);
                self.rejected_steps += 1;
                tracing::info!(old_dt, new_dt = self.dt, "adjusting time step");

                if self.dt == self.control.min_dt {
                    tracing::warn!(dt = self.dt, "minimum timestep reached, exiting");
                    return Ok(self.summary(RunStatus::MinimumStepReached));
                }
                self.model.restore();
                continue;
            }

            self.step += 1;
            self.time += self.dt * self.in_years;

            tracing::info!(
                step = self.step,
                time = self.time,
                residual_norm = self.norm_f,
                increment_norm = self.norm_dx,
                "Newton converged"
            );

            self.model.post_process()?;

            if self.output_frequency > 0 && (self.step as i64) % self.output_frequency == 0 {
                let path = self.output_dir.join(snapshot_file_name(self.time));
                self.model.save_state_to_file(&path)?;
            }

            self.write_data()?;

            self.dt = self.control.adapt(self.dt, self.k);
            in_budget = self.within_step_budget();
            self.total_newton_iterations += self.k;
        }
        Ok(self.summary(RunStatus::Completed))
    }

    /// Undamped Newton on the current step. Returns whether it converged;
    /// `self.k` holds the iteration index it stopped at. A failed model
    /// evaluation counts as non-convergence so the caller can cut back.
    fn newton(&mut self) -> SimResult<bool> {
        let limit = self.newton_iteration_limit;
        let mut k = 0;
        while k != limit {
            if let Err(err) = self.newton_iteration() {
                tracing::warn!(iter = k, error = %err, "Newton evaluation failed");
                k = limit;
                break;
            }

            tracing::debug!(
                iter = k,
                residual_norm = self.norm_f,
                increment_norm = self.norm_dx,
                "Newton solver"
            );

            if self.norm_dx < self.newton_tolerance && self.norm_f < self.newton_tolerance {
                break;
            } else if self.norm_dx > DIVERGENCE_THRESHOLD {
                tracing::warn!("Norm exploding! ||dx||inf = {}", self.norm_dx);
                k = limit;
                break;
            }
            k += 1;
        }
        self.k = k;
        Ok(k != limit)
    }

    fn newton_iteration(&mut self) -> SimResult<()> {
        self.model.set_timestep(self.dt)?;
        self.model.compute_rhs()?;
        self.model.compute_jacobian()?;

        // Solve J dx = -R so the update is additive.
        let neg_rhs = -self.model.rhs();
        self.model.solve(&neg_rhs)?;
        let dx = self.model.solution().clone();
        self.norm_dx = norm_inf(&dx);

        *self.model.state_mut() += &dx;

        self.model.compute_rhs()?;
        self.norm_f = norm2(self.model.rhs());
        Ok(())
    }

    fn write_data(&mut self) -> SimResult<()> {
        let io_err = |source| SimError::Io {
            path: self.output_dir.join(TDATA_FILE),
            source,
        };

        if !self.log.header_written() {
            let columns = self.model.write_data(true);
            self.log.write_header(&columns).map_err(io_err)?;
        }
        let row = DiagnosticRow {
            time_years: self.time,
            step: self.step,
            dt_years: self.dt * self.in_years,
            state_norm: norm2(self.model.state()),
            newton_iterations: self.k,
        };
        let columns = self.model.write_data(false);
        self.log.write_row(&row, &columns).map_err(io_err)
    }
}
