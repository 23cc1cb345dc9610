use crate::constants::{JacobianMatrix, StateVector};
use crate::syzygy_errors::SyzygyError;

/// First-order system of ordinary differential equations `dy/dt = f(t, y)` together with
/// its Jacobian `∂f/∂y`, as required by the implicit β-method.
///
/// Implementations must be pure with respect to their arguments: two calls with the same
/// `(t, y)` return bit-identical results.
pub trait OdeSystem {
    /// Length of the state vector.
    fn dimension(&self) -> usize;

    /// Evaluate the right-hand side `f(t, y)`.
    fn rhs(&self, t: f64, y: &StateVector) -> Result<StateVector, SyzygyError>;

    /// Evaluate the Jacobian `∂f/∂y (t, y)`, a `dimension() × dimension()` matrix.
    fn jacobian(&self, t: f64, y: &StateVector) -> Result<JacobianMatrix, SyzygyError>;
}
