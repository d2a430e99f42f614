use crate::{BoxError, Effect, Step, Trigger};

/// Binds one [`Trigger`] to one [`Effect`].
///
/// Invoking a callback evaluates its trigger against the current step and,
/// only if it fires, applies the effect. A callback whose trigger stays
/// quiet returns the `(state, environment)` pair untouched and causes no
/// side effects.
pub struct Callback<'a, S, M, E> {
    trigger: Trigger,
    effect: Box<dyn Effect<S, M, E> + 'a>,
}

impl<'a, S, M, E> Callback<'a, S, M, E> {
    /// Creates a callback from a trigger and an effect.
    ///
    /// Pass the effect by value to hand it over entirely, or as `&mut` to
    /// keep ownership and inspect the effect after the solve (effects
    /// implement `Effect` for their mutable references).
    pub fn new(trigger: Trigger, effect: impl Effect<S, M, E> + 'a) -> Self {
        Self {
            trigger,
            effect: Box::new(effect),
        }
    }

    /// The condition deciding when this callback's effect runs.
    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// Evaluates the trigger and conditionally applies the effect.
    ///
    /// # Errors
    ///
    /// Propagates the effect's error when the trigger fired and the effect
    /// failed.
    pub fn invoke(
        &mut self,
        iteration: usize,
        state: S,
        model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError> {
        let fired = self.trigger.evaluate(Step {
            iteration,
            state: &state,
            model,
            environment: &environment,
        });

        if fired {
            self.effect.apply(iteration, state, model, environment)
        } else {
            Ok((state, environment))
        }
    }
}

/// An ordered sequence of callbacks invoked once per iteration.
///
/// Invocation threads the `(state, environment)` pair through the callbacks
/// in order, so a later callback observes any updates made by an earlier
/// one. A list is itself an [`Effect`], and [`From`] wraps it as a
/// [`Callback`] that fires on every iteration, so lists nest.
pub struct CallbackList<'a, S, M, E> {
    callbacks: Vec<Callback<'a, S, M, E>>,
}

impl<'a, S, M, E> CallbackList<'a, S, M, E> {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self {
            callbacks: Vec::new(),
        }
    }

    /// Appends a callback, preserving invocation order.
    pub fn push(&mut self, callback: Callback<'a, S, M, E>) {
        self.callbacks.push(callback);
    }

    /// Chaining form of [`push`][Self::push].
    #[must_use]
    pub fn with(mut self, callback: Callback<'a, S, M, E>) -> Self {
        self.push(callback);
        self
    }

    /// Number of callbacks in the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    /// Whether the list holds no callbacks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    /// The callback at `index`, if any.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Callback<'a, S, M, E>> {
        self.callbacks.get_mut(index)
    }

    /// Invokes every callback in order, threading the pair through.
    ///
    /// # Errors
    ///
    /// Stops at the first failing callback and propagates its error.
    pub fn invoke(
        &mut self,
        iteration: usize,
        state: S,
        model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError> {
        let mut pair = (state, environment);
        for callback in &mut self.callbacks {
            pair = callback.invoke(iteration, pair.0, model, pair.1)?;
        }
        Ok(pair)
    }
}

impl<S, M, E> Default for CallbackList<'_, S, M, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, M, E> Effect<S, M, E> for CallbackList<'_, S, M, E> {
    fn apply(
        &mut self,
        iteration: usize,
        state: S,
        model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError> {
        self.invoke(iteration, state, model, environment)
    }
}

impl<'a, S, M, E> From<CallbackList<'a, S, M, E>> for Callback<'a, S, M, E>
where
    S: 'a,
    M: 'a,
    E: 'a,
{
    /// Wraps a list as a callback that fires on every iteration and runs
    /// all children in order.
    fn from(list: CallbackList<'a, S, M, E>) -> Self {
        Callback::new(Trigger::always(), list)
    }
}
