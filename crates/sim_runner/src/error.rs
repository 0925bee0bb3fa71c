//! Runner errors.

use sim_ecm::EcmError;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configured step size cannot advance simulated time.
    #[error("step size must be greater than zero")]
    ZeroStepSize,

    /// Building the world entity failed.
    #[error(transparent)]
    Ecm(#[from] EcmError),
}
