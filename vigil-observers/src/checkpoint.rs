//! An effect that snapshots solver progress and persists it to disk.
//!
//! A [`Checkpointer`] keeps the most recent `(state, environment)` pair seen
//! by the solve, merged with user-supplied parameters and (optionally) the
//! logs of an attached [`SharedRecorder`]. Each firing refreshes the stored
//! snapshot and, in the default every-tick mode, rewrites the checkpoint
//! file. The host owns the checkpointer and calls [`finalize`] exactly once
//! during orderly or signal-triggered shutdown for a best-effort final save.
//!
//! [`finalize`]: Checkpointer::finalize

use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use vigil_core::{BoxError, Effect};

use crate::record::SharedRecorder;

/// Errors from persisting a checkpoint record.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to serialize checkpoint record")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write checkpoint to `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The most recently seen `(state, environment)` pair.
///
/// Snapshots hold clones taken at firing time, so later mutation of the live
/// solver values never changes what was captured.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<S, E> {
    pub state: S,
    pub environment: E,
}

/// An effect that snapshots the solve and writes it to a checkpoint file.
///
/// Construct with [`new`][Self::new] and chain builder methods; all options
/// are independent with sensible defaults (save on every firing, save even
/// when no snapshot exists yet).
///
/// # Example
///
/// ```ignore
/// let mut checkpointer = Checkpointer::new("ground_state.json")
///     .param("bond_dimension", 64)
///     .recorder(recorder.clone())
///     .save_every_tick(false);
///
/// // ... run the solve with `&mut checkpointer` as a callback effect ...
///
/// checkpointer.finalize();
/// ```
pub struct Checkpointer<S, M, E> {
    params: IndexMap<String, Value>,
    recorder: Option<SharedRecorder<S, M, E>>,
    snapshot: Option<Snapshot<S, E>>,
    savepath: PathBuf,
    save_every_tick: bool,
    save_without_snapshot: bool,
}

impl<S, M, E> Checkpointer<S, M, E> {
    /// Creates a checkpointer writing to `savepath`.
    #[must_use]
    pub fn new(savepath: impl Into<PathBuf>) -> Self {
        Self {
            params: IndexMap::new(),
            recorder: None,
            snapshot: None,
            savepath: savepath.into(),
            save_every_tick: true,
            save_without_snapshot: true,
        }
    }

    /// Adds a user parameter persisted with every checkpoint.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Attaches a recorder whose logs are persisted with the checkpoint.
    #[must_use]
    pub fn recorder(mut self, recorder: SharedRecorder<S, M, E>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Whether every firing writes the checkpoint file (default `true`).
    ///
    /// With `false`, firings only refresh the in-memory snapshot and nothing
    /// touches disk until [`finalize`][Self::finalize].
    #[must_use]
    pub fn save_every_tick(mut self, save: bool) -> Self {
        self.save_every_tick = save;
        self
    }

    /// Whether [`finalize`][Self::finalize] still writes a record when no
    /// snapshot was ever taken (default `true`).
    ///
    /// The record then carries the parameters with `null` state and
    /// environment entries, which downstream readers must expect.
    #[must_use]
    pub fn save_without_snapshot(mut self, save: bool) -> Self {
        self.save_without_snapshot = save;
        self
    }

    /// The destination path for checkpoint files.
    pub fn savepath(&self) -> &Path {
        &self.savepath
    }

    /// The stored snapshot, absent until the first firing.
    pub fn snapshot(&self) -> Option<&Snapshot<S, E>> {
        self.snapshot.as_ref()
    }

    /// Overwrites the stored snapshot with clones of the current pair.
    pub fn update(&mut self, state: &S, environment: &E)
    where
        S: Clone,
        E: Clone,
    {
        self.snapshot = Some(Snapshot {
            state: state.clone(),
            environment: environment.clone(),
        });
    }
}

impl<S, M, E> Checkpointer<S, M, E>
where
    S: Serialize,
    E: Serialize,
{
    /// Writes the full checkpoint record to [`savepath`][Self::savepath].
    ///
    /// The record is a single top-level `"data"` object holding the user
    /// `parameters`, the snapshot `state` and `environment` (`null` while no
    /// snapshot exists), and the attached recorder's `observables` logs when
    /// a recorder is attached. The file is written to a temporary sibling
    /// first and renamed into place, so readers never observe a torn record.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the filesystem write fails.
    pub fn save(&self) -> Result<(), Error> {
        let mut data = serde_json::Map::new();
        data.insert("parameters".into(), serde_json::to_value(&self.params)?);
        match &self.snapshot {
            Some(snapshot) => {
                data.insert("state".into(), serde_json::to_value(&snapshot.state)?);
                data.insert(
                    "environment".into(),
                    serde_json::to_value(&snapshot.environment)?,
                );
            }
            None => {
                data.insert("state".into(), Value::Null);
                data.insert("environment".into(), Value::Null);
            }
        }
        if let Some(recorder) = &self.recorder {
            data.insert(
                "observables".into(),
                serde_json::to_value(recorder.borrow().logs())?,
            );
        }

        let mut record = serde_json::Map::new();
        record.insert("data".into(), Value::Object(data));

        self.write_atomic(&Value::Object(record))
    }

    /// Best-effort final save for the hosting process's shutdown path.
    ///
    /// Call exactly once, from whoever owns the checkpointer, when the
    /// process ends normally or is interrupted. When no snapshot was ever
    /// taken this warns and, unless configured otherwise, still persists the
    /// parameter-only record. Failures are logged rather than returned; the
    /// shutdown path must not propagate errors from a mid-update snapshot or
    /// an unwritable disk.
    pub fn finalize(&self) {
        if self.snapshot.is_none() {
            log::warn!(
                "no checkpoint was recorded before shutdown; \
                 saving parameters without a snapshot"
            );
            if !self.save_without_snapshot {
                return;
            }
        }
        if let Err(err) = self.save() {
            log::error!("final checkpoint save failed: {err}");
        }
    }

    fn write_atomic(&self, record: &Value) -> Result<(), Error> {
        let bytes = serde_json::to_vec_pretty(record)?;
        let tmp = self.savepath.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|source| Error::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.savepath).map_err(|source| Error::Io {
            path: self.savepath.clone(),
            source,
        })
    }
}

impl<S, M, E> Effect<S, M, E> for Checkpointer<S, M, E>
where
    S: Clone + Serialize,
    E: Clone + Serialize,
{
    fn apply(
        &mut self,
        _iteration: usize,
        state: S,
        _model: &M,
        environment: E,
    ) -> Result<(S, E), BoxError> {
        self.update(&state, &environment);
        if self.save_every_tick {
            self.save()?;
        }
        Ok((state, environment))
    }
}

/// Allows `&mut Checkpointer` to be used as the effect, so the host keeps
/// ownership and can run [`finalize`][Checkpointer::finalize] at shutdown.
impl<S, M, E> Effect<S, M, E> for &mut Checkpointer<S, M, E>
where
    S: Clone + Serialize,
    E: Clone + Serialize,
{
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

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;
    use crate::record::Recorder;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct FakeState {
        sweep: usize,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct FakeEnvironment {
        contractions: usize,
    }

    fn read_data(path: &Path) -> serde_json::Map<String, Value> {
        let raw = fs::read_to_string(path).unwrap();
        let record: Value = serde_json::from_str(&raw).unwrap();
        record["data"].as_object().unwrap().clone()
    }

    #[test]
    fn every_tick_mode_persists_the_latest_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let mut checkpointer: Checkpointer<FakeState, (), FakeEnvironment> =
            Checkpointer::new(&path).param("bond_dimension", 64);

        checkpointer
            .apply(0, FakeState { sweep: 0 }, &(), FakeEnvironment { contractions: 10 })
            .unwrap();
        let data = read_data(&path);
        assert_eq!(data["state"]["sweep"], Value::from(0));
        assert_eq!(data["parameters"]["bond_dimension"], Value::from(64));

        checkpointer
            .apply(1, FakeState { sweep: 1 }, &(), FakeEnvironment { contractions: 20 })
            .unwrap();
        let data = read_data(&path);
        assert_eq!(data["state"]["sweep"], Value::from(1));
        assert_eq!(data["environment"]["contractions"], Value::from(20));
    }

    #[test]
    fn snapshot_stores_a_copy_of_the_live_pair() {
        let dir = tempfile::tempdir().unwrap();
        let mut checkpointer: Checkpointer<FakeState, (), FakeEnvironment> =
            Checkpointer::new(dir.path().join("checkpoint.json")).save_every_tick(false);

        let mut state = FakeState { sweep: 3 };
        let environment = FakeEnvironment { contractions: 1 };
        checkpointer.update(&state, &environment);
        state.sweep = 99;

        assert_eq!(checkpointer.snapshot().unwrap().state.sweep, 3);
    }

    #[test]
    fn on_demand_mode_writes_nothing_until_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let mut checkpointer: Checkpointer<FakeState, (), FakeEnvironment> =
            Checkpointer::new(&path).save_every_tick(false);

        checkpointer
            .apply(0, FakeState { sweep: 0 }, &(), FakeEnvironment { contractions: 5 })
            .unwrap();
        assert!(!path.exists());

        checkpointer.finalize();
        let data = read_data(&path);
        assert_eq!(data["state"]["sweep"], Value::from(0));
    }

    #[test]
    fn finalize_without_snapshot_saves_placeholders() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let checkpointer: Checkpointer<FakeState, (), FakeEnvironment> =
            Checkpointer::new(&path).param("tolerance", 1e-8);

        checkpointer.finalize();

        let data = read_data(&path);
        assert_eq!(data["state"], Value::Null);
        assert_eq!(data["environment"], Value::Null);
        assert_eq!(data["parameters"]["tolerance"], Value::from(1e-8));
    }

    #[test]
    fn finalize_without_snapshot_can_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let checkpointer: Checkpointer<FakeState, (), FakeEnvironment> =
            Checkpointer::new(&path).save_without_snapshot(false);

        checkpointer.finalize();

        assert!(!path.exists());
    }

    #[test]
    fn attached_recorder_logs_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let shared = Recorder::new()
            .observable("iters", |step: vigil_core::Step<'_, FakeState, (), FakeEnvironment>| {
                Value::from(step.iteration)
            })
            .into_shared();
        let mut recording = shared.clone();
        let mut checkpointer: Checkpointer<FakeState, (), FakeEnvironment> =
            Checkpointer::new(&path).recorder(shared);

        let state = FakeState { sweep: 0 };
        let environment = FakeEnvironment { contractions: 0 };
        let (state, environment) = recording.apply(0, state, &(), environment).unwrap();
        let (state, environment) = recording.apply(1, state, &(), environment).unwrap();
        checkpointer.apply(1, state, &(), environment).unwrap();

        let data = read_data(&path);
        assert_eq!(
            data["observables"]["iters"],
            Value::from(vec![Value::from(0), Value::from(1)])
        );
    }

    #[test]
    fn save_leaves_no_temporary_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let mut checkpointer: Checkpointer<FakeState, (), FakeEnvironment> =
            Checkpointer::new(&path);

        checkpointer
            .apply(0, FakeState { sweep: 0 }, &(), FakeEnvironment { contractions: 0 })
            .unwrap();

        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }
}
