/// A borrowed view of one completed solver iteration.
///
/// Triggers and observables are functions of the same four values: the
/// iteration index, the current candidate state, the model being solved, and
/// the solver environment. `Step` carries them as one unit so those
/// signatures stay uniform.
///
/// The state and environment are opaque to this crate; they are only ever
/// read through these borrows or cloned for snapshots.
#[derive(Debug)]
pub struct Step<'a, S, M, E> {
    /// Index of the iteration that just completed (starts at 0).
    pub iteration: usize,

    /// The solver's current candidate state.
    pub state: &'a S,

    /// The model being solved.
    pub model: &'a M,

    /// Auxiliary solver data paired with the state.
    pub environment: &'a E,
}

impl<S, M, E> Clone for Step<'_, S, M, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S, M, E> Copy for Step<'_, S, M, E> {}
