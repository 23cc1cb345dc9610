//! Small dense linear-algebra helpers shared by the force model, the Newton solver
//! and the eclipse detector.

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use crate::syzygy_errors::SyzygyError;

/// Euclidean norm of a 3-vector, rejecting zero-length (and non-finite) inputs.
///
/// Arguments
/// -----------------
/// * `d`: the displacement vector.
/// * `what`: a short label of the displacement, used in the error message.
///
/// Return
/// ----------
/// * `Ok(|d|)` when `|d| > 0` and finite,
/// * `Err(SyzygyError::DegenerateGeometry)` otherwise.
pub(crate) fn nonzero_norm(d: &Vector3<f64>, what: &str) -> Result<f64, SyzygyError> {
    let norm = d.norm();
    if norm > 0.0 && norm.is_finite() {
        Ok(norm)
    } else {
        Err(SyzygyError::DegenerateGeometry(format!(
            "{what} has norm {norm}"
        )))
    }
}

/// Outer product `d dᵀ` of a 3-vector with itself.
#[inline]
pub(crate) fn outer3(d: &Vector3<f64>) -> Matrix3<f64> {
    d * d.transpose()
}

/// Solve the dense linear system `a · x = b` by LU decomposition with partial pivoting.
///
/// Return
/// ----------
/// * `Err(SyzygyError::SingularJacobian)` if the matrix cannot be factorized or the
///   solution is not finite.
pub(crate) fn lu_solve(a: DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, SyzygyError> {
    let x = a.lu().solve(b).ok_or(SyzygyError::SingularJacobian)?;
    if x.iter().all(|v| v.is_finite()) {
        Ok(x)
    } else {
        Err(SyzygyError::SingularJacobian)
    }
}
