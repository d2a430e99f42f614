//! An effect that evaluates named observables and logs the results.
//!
//! A [`Recorder`] owns a set of named observable functions and one
//! append-only log per name. Each firing evaluates every observable against
//! the current [`Step`] and appends the results, in registration order. The
//! solver's state and environment are never modified.

use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

use indexmap::IndexMap;
use jiff::Timestamp;
use serde_json::Value;
use vigil_core::{BoxError, Effect, Step};

use crate::traits::{HasEnergy, HasSiteErrors};

/// A user-supplied observable: a pure function of one completed iteration.
///
/// The returned [`Value`] is appended to the observable's log verbatim.
/// Panics inside the function propagate to the caller of the recording
/// effect; no suppression layer exists here.
pub type Observable<S, M, E> = Box<dyn for<'a> Fn(Step<'a, S, M, E>) -> Value>;

/// An effect that computes named observables and appends them to logs.
///
/// Observables are registered with [`observable`][Self::observable] before
/// the solve; their insertion order is preserved in the logs and is the
/// order they are evaluated in. Logs grow by exactly one entry per name per
/// firing.
///
/// # Example
///
/// ```ignore
/// let mut recorder = Recorder::energy_convergence();
/// let callback = Callback::new(Trigger::iteration_elapsed(10), &mut recorder);
/// // ... run the solve ...
/// let energies = recorder.log("energies").unwrap();
/// ```
pub struct Recorder<S, M, E> {
    // A list of maps rather than one map: `combine` concatenates the inputs'
    // function sets without deduplicating names (see its caveat).
    observables: Vec<IndexMap<String, Observable<S, M, E>>>,
    logs: IndexMap<String, Vec<Value>>,
    firings: usize,
}

impl<S, M, E> Recorder<S, M, E> {
    /// Creates a recorder with no observables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            observables: vec![IndexMap::new()],
            logs: IndexMap::new(),
            firings: 0,
        }
    }

    /// Registers an observable under `name`, with an empty log.
    ///
    /// Registration order determines evaluation and log order. Registering
    /// the same name again replaces the function but keeps the existing log.
    #[must_use]
    pub fn observable(
        mut self,
        name: impl Into<String>,
        compute: impl for<'a> Fn(Step<'a, S, M, E>) -> Value + 'static,
    ) -> Self {
        let name = name.into();
        self.logs.entry(name.clone()).or_default();
        self.observables[0].insert(name, Box::new(compute));
        self
    }

    /// Evaluates every observable against `step` and appends the results.
    pub fn record(&mut self, step: Step<'_, S, M, E>) {
        for observables in &self.observables {
            for (name, compute) in observables {
                let value = compute(step);
                self.logs.entry(name.clone()).or_default().push(value);
            }
        }
        self.firings += 1;
    }

    /// All logs, keyed by observable name in registration order.
    pub fn logs(&self) -> &IndexMap<String, Vec<Value>> {
        &self.logs
    }

    /// The log for a single observable, if it is registered.
    pub fn log(&self, name: &str) -> Option<&[Value]> {
        self.logs.get(name).map(Vec::as_slice)
    }

    /// How many times this recorder has fired.
    #[must_use]
    pub fn firings(&self) -> usize {
        self.firings
    }

    /// Merges two recorders, keeping both sets of observable functions.
    ///
    /// Logs are unioned by name; when both sides hold a log for the same
    /// name, the right-hand log wins. The function sets are concatenated
    /// *without* deduplication, so a name registered on both sides appends
    /// twice per firing to a single log afterwards. Keep the name sets
    /// disjoint unless that is what you want.
    #[must_use]
    pub fn combine(mut self, other: Self) -> Self {
        self.logs.extend(other.logs);
        self.observables.extend(other.observables);
        self.firings = self.firings.max(other.firings);
        self
    }

    /// Wraps the recorder for shared use from several callbacks.
    #[must_use]
    pub fn into_shared(self) -> SharedRecorder<S, M, E> {
        SharedRecorder {
            inner: Rc::new(RefCell::new(self)),
        }
    }
}

impl<S, M, E> Recorder<S, M, E>
where
    M: HasEnergy<S, E> + HasSiteErrors<S, E>,
    S: 'static,
    M: 'static,
    E: 'static,
{
    /// A recorder tracking ground-state convergence, with three observables:
    ///
    /// - `energies` — real part of the model's energy expectation value
    /// - `times` — wall-clock time of the evaluation, as fractional Unix
    ///   seconds
    /// - `errors` — the worst per-site convergence error, `NaN` when the
    ///   model reports no sites
    ///
    /// Non-finite values serialize as JSON `null`.
    #[must_use]
    pub fn energy_convergence() -> Self {
        Self::new()
            .observable("energies", |step: Step<'_, S, M, E>| {
                Value::from(step.model.energy(step.state, step.environment).re)
            })
            .observable("times", |_step| {
                Value::from(Timestamp::now().as_millisecond() as f64 / 1e3)
            })
            .observable("errors", |step: Step<'_, S, M, E>| {
                let worst = step
                    .model
                    .site_errors(step.state, step.environment)
                    .into_iter()
                    .fold(f64::NAN, f64::max);
                Value::from(worst)
            })
    }
}

impl<S, M, E> Default for Recorder<S, M, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, M, E> Effect<S, M, E> for Recorder<S, M, E> {
    fn apply(
        &mut self,
        iteration: usize,
        state: S,
        model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError> {
        self.record(Step {
            iteration,
            state: &state,
            model,
            environment: &environment,
        });
        Ok((state, environment))
    }
}

/// Allows `&mut Recorder` to be used as the effect, so the caller keeps
/// ownership and can read the logs after the solve.
impl<S, M, E> Effect<S, M, E> for &mut Recorder<S, M, E> {
    fn apply(
        &mut self,
        iteration: usize,
        state: S,
        model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError> {
        (*self).apply(iteration, state, model, environment)
    }
}

/// A recorder shared between several owners on the solver thread.
///
/// One recorder often plays two roles at once: the effect of a scheduled
/// recording callback, and the observable source attached to a
/// [`Checkpointer`][crate::Checkpointer]. Invocation is strictly sequential
/// (one callback in flight at a time), so shared access is interior
/// mutability, not locking. Do not hold a [`borrow`][Self::borrow] across a
/// callback invocation.
pub struct SharedRecorder<S, M, E> {
    inner: Rc<RefCell<Recorder<S, M, E>>>,
}

impl<S, M, E> SharedRecorder<S, M, E> {
    /// Immutable access to the underlying recorder.
    pub fn borrow(&self) -> Ref<'_, Recorder<S, M, E>> {
        self.inner.borrow()
    }

    /// Mutable access to the underlying recorder.
    pub fn borrow_mut(&self) -> RefMut<'_, Recorder<S, M, E>> {
        self.inner.borrow_mut()
    }
}

impl<S, M, E> Clone for SharedRecorder<S, M, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, M, E> Effect<S, M, E> for SharedRecorder<S, M, E> {
    fn apply(
        &mut self,
        iteration: usize,
        state: S,
        model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError> {
        self.borrow_mut().record(Step {
            iteration,
            state: &state,
            model,
            environment: &environment,
        });
        Ok((state, environment))
    }
}
