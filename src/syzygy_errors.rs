use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum SyzygyError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Newton linear solve failed: Jacobian matrix is singular")]
    SingularJacobian,

    #[error("Integration stalled at step {step} (t = {time}): Newton solver did not converge")]
    IntegrationStalled { step: usize, time: f64 },

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Degenerate quadratic fit around t = {time}: zero curvature")]
    DegenerateExtremumFit { time: f64 },
}

impl PartialEq for SyzygyError {
    fn eq(&self, other: &Self) -> bool {
        use SyzygyError::*;
        match (self, other) {
            (InvalidConfiguration(a), InvalidConfiguration(b)) => a == b,
            (DegenerateGeometry(a), DegenerateGeometry(b)) => a == b,
            (
                IntegrationStalled { step: s1, time: t1 },
                IntegrationStalled { step: s2, time: t2 },
            ) => s1 == s2 && t1 == t2,
            (DegenerateExtremumFit { time: a }, DegenerateExtremumFit { time: b }) => a == b,

            (SingularJacobian, SingularJacobian) => true,

            _ => false,
        }
    }
}
