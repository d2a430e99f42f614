//! Recording and checkpoint effects for iterative ground-state solvers.
//!
//! This crate provides the two concrete [`Effect`] implementations used to
//! monitor a variational optimization while it runs, plus the capability
//! traits they need from the hosting solver's types:
//!
//! - [`traits`] — capability traits the built-in observables require from
//!   the model ([`HasEnergy`], [`HasSiteErrors`])
//! - [`record`] — [`Recorder`], an effect that evaluates named observables
//!   and appends the results to per-name logs
//! - [`checkpoint`] — [`Checkpointer`], an effect that snapshots the solver's
//!   state and environment and persists the record to disk
//!
//! [`Effect`]: vigil_core::Effect
//! [`HasEnergy`]: traits::HasEnergy
//! [`HasSiteErrors`]: traits::HasSiteErrors

pub mod checkpoint;
pub mod record;
pub mod traits;

pub use checkpoint::{Checkpointer, Snapshot};
pub use record::{Observable, Recorder, SharedRecorder};
