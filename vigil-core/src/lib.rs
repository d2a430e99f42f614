//! Core scheduling abstractions for observing an iterative solver.
//!
//! This crate defines the pieces a hosting optimizer composes to observe,
//! record, and checkpoint its progress:
//!
//! - [`Step`] — a borrowed view of one completed solver iteration
//! - [`Trigger`] — a condition deciding whether an effect fires on a step
//! - [`Effect`] — a side-effecting action threaded through the solve
//! - [`Callback`], [`CallbackList`] — bind triggers to effects and run them
//!   in order, once per iteration
//!
//! The hosting solver calls the top-level callback once per completed
//! iteration, passing the iteration index, its current state, the model, and
//! the solver environment, then adopts the returned `(state, environment)`
//! pair as the basis for the next iteration.
//!
//! # Example
//!
//! ```ignore
//! use vigil_core::{Callback, CallbackList, TimeUnit, Trigger};
//!
//! let mut callbacks = CallbackList::new()
//!     .with(Callback::new(Trigger::iteration_elapsed(10), &mut recorder))
//!     .with(Callback::new(
//!         Trigger::time_elapsed(30.0, TimeUnit::Minutes)?,
//!         &mut checkpointer,
//!     ));
//!
//! for iteration in 0..max_sweeps {
//!     let (next_state, next_env) = vumps_sweep(state, &model, env)?;
//!     (state, env) = callbacks.invoke(iteration, next_state, &model, next_env)?;
//! }
//! ```

mod callback;
mod effect;
mod step;
mod trigger;

pub use callback::{Callback, CallbackList};
pub use effect::{BoxError, Effect};
pub use step::Step;
pub use trigger::{TimeUnit, Trigger, TriggerError};
