//! Conditions that decide when a callback's effect fires.
//!
//! A [`Trigger`] is evaluated once per completed solver iteration against the
//! current [`Step`]. The built-in conditions fire on iteration multiples or
//! after a wall-clock interval, and arbitrary schedules are built by combining
//! them with [`Trigger::any_of`] and [`Trigger::all_of`].

use std::{
    str::FromStr,
    time::{Duration, Instant},
};

use crate::Step;

/// Errors from constructing or parsing a trigger condition.
#[derive(Debug, thiserror::Error)]
pub enum TriggerError {
    #[error("unrecognized time unit `{0}`, expected `s`, `min`, or `h`")]
    UnknownUnit(String),

    #[error("time period must be finite and positive, got {0}")]
    InvalidPeriod(f64),
}

/// Units accepted for elapsed-time periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
}

impl TimeUnit {
    /// Number of seconds in one unit.
    fn seconds(self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3600.0,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = TriggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "s" | "sec" | "seconds" => Ok(Self::Seconds),
            "min" | "minutes" => Ok(Self::Minutes),
            "h" | "hr" | "hours" => Ok(Self::Hours),
            other => Err(TriggerError::UnknownUnit(other.to_owned())),
        }
    }
}

/// A condition deciding whether an effect fires on a given step.
///
/// Evaluation never touches the solver's state or environment. The one piece
/// of internal mutability is the [`TimeElapsed`][Trigger::TimeElapsed] clock,
/// which resets each time that condition fires.
#[derive(Debug)]
pub enum Trigger {
    /// Fires on every iteration that is a multiple of `period`.
    ///
    /// Iteration 0 is a multiple of every period, so this fires on the very
    /// first invocation. A `period` of 0 never fires.
    IterationElapsed {
        period: usize,
    },

    /// Fires when more than `period` has elapsed since construction or the
    /// last firing, then restarts the interval.
    ///
    /// Evaluate this only after a full iteration completes; evaluating it
    /// mid-iteration consumes the interval without a matching effect.
    TimeElapsed {
        period: Duration,
        last: Instant,
    },

    /// Fires when at least one child condition fires.
    Any(Vec<Trigger>),

    /// Fires when every child condition fires.
    ///
    /// An empty conjunction is vacuously true; see [`Trigger::always`].
    All(Vec<Trigger>),
}

impl Trigger {
    /// A condition that fires every `period` iterations.
    #[must_use]
    pub fn iteration_elapsed(period: usize) -> Self {
        Self::IterationElapsed { period }
    }

    /// A condition that fires once more than `period` of wall-clock time has
    /// passed, measured in `unit`.
    ///
    /// The interval starts at construction.
    ///
    /// # Errors
    ///
    /// Returns [`TriggerError::InvalidPeriod`] if `period` is not finite and
    /// positive, or is too large to represent as a duration.
    pub fn time_elapsed(period: f64, unit: TimeUnit) -> Result<Self, TriggerError> {
        if !period.is_finite() || period <= 0.0 {
            return Err(TriggerError::InvalidPeriod(period));
        }
        let period = Duration::try_from_secs_f64(period * unit.seconds())
            .map_err(|_| TriggerError::InvalidPeriod(period))?;
        Ok(Self::TimeElapsed {
            period,
            last: Instant::now(),
        })
    }

    /// Combines conditions so the result fires when any of them fires.
    ///
    /// Children that are themselves `Any` are flattened into the new
    /// condition rather than nested.
    #[must_use]
    pub fn any_of(conditions: impl IntoIterator<Item = Trigger>) -> Self {
        let mut children = Vec::new();
        for condition in conditions {
            match condition {
                Self::Any(nested) => children.extend(nested),
                other => children.push(other),
            }
        }
        Self::Any(children)
    }

    /// Combines conditions so the result fires only when all of them fire.
    ///
    /// Children that are themselves `All` are flattened into the new
    /// condition rather than nested.
    #[must_use]
    pub fn all_of(conditions: impl IntoIterator<Item = Trigger>) -> Self {
        let mut children = Vec::new();
        for condition in conditions {
            match condition {
                Self::All(nested) => children.extend(nested),
                other => children.push(other),
            }
        }
        Self::All(children)
    }

    /// A condition that fires on every iteration.
    #[must_use]
    pub fn always() -> Self {
        Self::All(Vec::new())
    }

    /// Evaluates the condition against one completed iteration.
    ///
    /// Combinators evaluate every child, left to right, without
    /// short-circuiting: a nested `TimeElapsed` clock must reset on the same
    /// iterations whether or not its siblings already decided the outcome,
    /// so repeated runs stay reproducible.
    pub fn evaluate<S, M, E>(&mut self, step: Step<'_, S, M, E>) -> bool {
        match self {
            Self::IterationElapsed { period } => *period > 0 && step.iteration % *period == 0,
            Self::TimeElapsed { period, last } => {
                let now = Instant::now();
                if now.duration_since(*last) > *period {
                    *last = now;
                    true
                } else {
                    false
                }
            }
            Self::Any(children) => children
                .iter_mut()
                .fold(false, |fired, child| child.evaluate(step) || fired),
            Self::All(children) => children
                .iter_mut()
                .fold(true, |fired, child| child.evaluate(step) && fired),
        }
    }
}
