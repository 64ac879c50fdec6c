//! Finite difference Jacobians and dense linear solves.

use crate::error::{SolverError, SolverResult};
use ta_core::{Matrix, Vector};

/// Perturbation of coordinate `x_j`, relative for large entries.
fn step_size(x_j: f64, epsilon: f64) -> f64 {
    epsilon * x_j.abs().max(1.0)
}

/// Column-by-column one-sided difference `(f(x + h e_j) - f(x)) / h`.
pub fn finite_difference_jacobian<F, E>(x: &Vector, f: F, epsilon: f64) -> Result<Matrix, E>
where
    F: Fn(&Vector) -> Result<Vector, E>,
{
    let base = f(x)?;
    let mut jac = Matrix::zeros(base.len(), x.len());
    let mut shifted = x.clone();

    for (j, &x_j) in x.iter().enumerate() {
        let h = step_size(x_j, epsilon);
        shifted[j] = x_j + h;
        let column = (f(&shifted)? - &base) / h;
        shifted[j] = x_j;
        jac.set_column(j, &column);
    }
    Ok(jac)
}

/// Symmetric difference `(f(x + h e_j) - f(x - h e_j)) / 2h`. Second order
/// accurate at two evaluations per column.
pub fn central_difference_jacobian<F, E>(x: &Vector, f: F, epsilon: f64) -> Result<Matrix, E>
where
    F: Fn(&Vector) -> Result<Vector, E>,
{
    let mut jac = Matrix::zeros(f(x)?.len(), x.len());
    let mut shifted = x.clone();

    for (j, &x_j) in x.iter().enumerate() {
        let h = step_size(x_j, epsilon);
        shifted[j] = x_j + h;
        let forward = f(&shifted)?;
        shifted[j] = x_j - h;
        let backward = f(&shifted)?;
        shifted[j] = x_j;
        jac.set_column(j, &((forward - backward) / (2.0 * h)));
    }
    Ok(jac)
}

/// Solve `a · x = b` by LU factorization.
pub fn solve_dense(a: &Matrix, b: &Vector) -> SolverResult<Vector> {
    if !a.is_square() || a.nrows() != b.len() {
        return Err(SolverError::ProblemSetup {
            what: format!(
                "cannot solve a {}x{} system with a right-hand side of length {}",
                a.nrows(),
                a.ncols(),
                b.len()
            ),
        });
    }
    a.clone().lu().solve(b).ok_or_else(|| SolverError::Singular {
        what: "Jacobian solve failed".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coupled(x: &Vector) -> SolverResult<Vector> {
        Ok(Vector::from_vec(vec![x[0] * x[1], x[0] - 3.0 * x[1] * x[1]]))
    }

    #[test]
    fn one_sided_difference_of_coupled_map() {
        let x = Vector::from_vec(vec![2.0, -1.0]);
        let jac = finite_difference_jacobian(&x, coupled, 1e-7).unwrap();
        let exact = Matrix::from_row_slice(2, 2, &[-1.0, 2.0, 1.0, 6.0]);
        assert!((jac - exact).amax() < 1e-5);
    }

    #[test]
    fn central_difference_is_sharper() {
        let x = Vector::from_vec(vec![2.0, -1.0]);
        let jac = central_difference_jacobian(&x, coupled, 1e-5).unwrap();
        let exact = Matrix::from_row_slice(2, 2, &[-1.0, 2.0, 1.0, 6.0]);
        assert!((jac - exact).amax() < 1e-8);
    }

    #[test]
    fn dense_solve_detects_singular_matrix() {
        let a = Matrix::zeros(2, 2);
        let b = Vector::from_element(2, 1.0);
        assert!(matches!(solve_dense(&a, &b), Err(SolverError::Singular { .. })));
    }
}
