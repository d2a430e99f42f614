//! Capability traits for the built-in observables.
//!
//! These traits abstract over solver-specific model types, so the recording
//! recipes work against any optimizer whose model can report an energy
//! expectation value and per-site convergence errors.
//!
//! # Example
//!
//! ```rust
//! use num_complex::Complex64;
//! use vigil_observers::traits::{HasEnergy, HasSiteErrors};
//!
//! struct FieldModel {
//!     field: f64,
//! }
//!
//! impl HasEnergy<Vec<f64>, ()> for FieldModel {
//!     fn energy(&self, state: &Vec<f64>, _environment: &()) -> Complex64 {
//!         Complex64::new(-self.field * state.iter().sum::<f64>(), 0.0)
//!     }
//! }
//!
//! impl HasSiteErrors<Vec<f64>, ()> for FieldModel {
//!     fn site_errors(&self, state: &Vec<f64>, _environment: &()) -> Vec<f64> {
//!         state.iter().map(|x| x.abs()).collect()
//!     }
//! }
//! ```

use num_complex::Complex64;

/// A model that can evaluate its energy against a candidate state.
pub trait HasEnergy<S, E> {
    /// Expectation value of the model Hamiltonian for `state`, contracted
    /// through the solver `environment`.
    ///
    /// The value is complex in general; for a Hermitian Hamiltonian the
    /// imaginary part is numerical noise.
    fn energy(&self, state: &S, environment: &E) -> Complex64;
}

/// A model that can report per-site convergence errors for a candidate state.
pub trait HasSiteErrors<S, E> {
    /// The solver's fixed-point residual at each tensor-network site.
    ///
    /// The worst (largest) entry is the usual convergence measure for the
    /// state as a whole.
    fn site_errors(&self, state: &S, environment: &E) -> Vec<f64>;
}
