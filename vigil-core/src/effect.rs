/// Boxed error type surfaced by effect application.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A side-effecting action applied to the solver's progress when its trigger
/// fires.
///
/// Effects take ownership of the `(state, environment)` pair and return a
/// possibly updated pair, which the solver adopts for the next iteration.
/// The built-in effects never modify the pair; they record observables or
/// persist snapshots and hand the values straight back.
///
/// Closures with the matching signature implement `Effect` automatically,
/// and a built-in impl for `()` provides a no-op effect that returns its
/// inputs unchanged.
pub trait Effect<S, M, E> {
    /// Applies the effect to one completed iteration.
    ///
    /// # Errors
    ///
    /// Implementations surface their own failures (e.g. a checkpoint write)
    /// as a boxed error; the hosting solver decides whether to abort.
    fn apply(
        &mut self,
        iteration: usize,
        state: S,
        model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError>;
}

/// Blanket implementation for effect closures.
impl<S, M, E, F> Effect<S, M, E> for F
where
    F: FnMut(usize, S, &M, E) -> Result<(S, E), BoxError>,
{
    fn apply(
        &mut self,
        iteration: usize,
        state: S,
        model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError> {
        self(iteration, state, model, environment)
    }
}

/// A no-op effect that returns its inputs unchanged.
impl<S, M, E> Effect<S, M, E> for () {
    fn apply(
        &mut self,
        _iteration: usize,
        state: S,
        _model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError> {
        Ok((state, environment))
    }
}
