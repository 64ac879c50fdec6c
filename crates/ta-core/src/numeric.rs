use crate::CoreError;

/// Scalar type of every state, residual and parameter.
pub type Real = f64;

/// Dense state, residual and increment vectors.
pub type Vector = nalgebra::DVector<Real>;

/// Dense matrices (Jacobians, projection bases).
pub type Matrix = nalgebra::DMatrix<Real>;

/// Pass `value` through, or name it in a [`CoreError::NonFinite`].
pub fn ensure_finite(value: Real, what: &'static str) -> Result<Real, CoreError> {
    if !value.is_finite() {
        return Err(CoreError::NonFinite { what, value });
    }
    Ok(value)
}

/// Euclidean norm.
pub fn norm2(v: &Vector) -> Real {
    v.norm()
}

/// Maximum absolute entry. A NaN entry yields `+inf` so that blow-up guards
/// comparing against a threshold still fire.
pub fn norm_inf(v: &Vector) -> Real {
    v.iter().fold(0.0, |acc: Real, &x| {
        if x.is_nan() {
            Real::INFINITY
        } else {
            acc.max(x.abs())
        }
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn inf_norm_bounded_by_two_norm(xs in prop::collection::vec(-1e3_f64..1e3_f64, 1..16)) {
            let v = Vector::from_vec(xs);
            let inf = norm_inf(&v);
            let two = norm2(&v);
            prop_assert!(inf <= two + 1e-9);
            prop_assert!(two <= inf * (v.len() as f64).sqrt() + 1e-9);
        }
    }
}
