//! A mock iterative ground-state solver, used to exercise the callback stack
//! the way a real optimizer would: one callback invocation per completed
//! iteration, adopting the returned `(state, environment)` pair.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use vigil_core::{BoxError, CallbackList};
use vigil_observers::traits::{HasEnergy, HasSiteErrors};

/// The solver's candidate solution: converges geometrically toward the
/// ground state as sweeps accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockState {
    pub sweep: usize,
    pub overlap: f64,
}

/// Auxiliary solver data threaded alongside the state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockEnvironment {
    pub contractions: usize,
    pub residuals: Vec<f64>,
}

/// A transverse-field chain whose energy and convergence measures are cheap
/// closed forms of the mock state.
pub struct TransverseIsing {
    pub field: f64,
}

impl HasEnergy<MockState, MockEnvironment> for TransverseIsing {
    fn energy(&self, state: &MockState, _environment: &MockEnvironment) -> Complex64 {
        Complex64::new(-self.field + state.overlap, 1e-10)
    }
}

impl HasSiteErrors<MockState, MockEnvironment> for TransverseIsing {
    fn site_errors(&self, _state: &MockState, environment: &MockEnvironment) -> Vec<f64> {
        environment.residuals.clone()
    }
}

/// Runs `iterations` mock sweeps, invoking `callbacks` after each one.
///
/// Each sweep halves the state's distance to the fixed point and shrinks the
/// per-site residuals by an order of magnitude, mimicking a converging
/// optimization.
///
/// # Errors
///
/// Propagates the first callback error, like a solver aborting the run.
pub fn run(
    model: &TransverseIsing,
    iterations: usize,
    callbacks: &mut CallbackList<'_, MockState, TransverseIsing, MockEnvironment>,
) -> Result<(MockState, MockEnvironment), BoxError> {
    let mut state = MockState {
        sweep: 0,
        overlap: 1.0,
    };
    let mut environment = MockEnvironment {
        contractions: 0,
        residuals: vec![1.0, 1.0, 1.0],
    };

    for iteration in 0..iterations {
        state.sweep = iteration;
        state.overlap *= 0.5;
        environment.contractions += 2;
        for residual in &mut environment.residuals {
            *residual *= 0.1;
        }

        (state, environment) = callbacks.invoke(iteration, state, model, environment)?;
    }

    Ok((state, environment))
}
