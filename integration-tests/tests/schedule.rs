//! Scheduled recording against the mock solver loop.

use integration_tests::mock_solver::{self, MockEnvironment, MockState, TransverseIsing};
use serde_json::Value;
use vigil_core::{BoxError, Callback, CallbackList, Step, Trigger};
use vigil_observers::Recorder;

type MockRecorder = Recorder<MockState, TransverseIsing, MockEnvironment>;

#[test]
fn recording_follows_the_iteration_schedule() {
    let model = TransverseIsing { field: 1.0 };
    let mut recorder: MockRecorder = Recorder::new().observable(
        "sweeps",
        |step: Step<'_, MockState, TransverseIsing, MockEnvironment>| {
            Value::from(step.state.sweep)
        },
    );

    let mut callbacks =
        CallbackList::new().with(Callback::new(Trigger::iteration_elapsed(2), &mut recorder));
    mock_solver::run(&model, 10, &mut callbacks).unwrap();
    drop(callbacks);

    let sweeps: Vec<u64> = recorder
        .log("sweeps")
        .unwrap()
        .iter()
        .map(|v| v.as_u64().unwrap())
        .collect();
    assert_eq!(sweeps, vec![0, 2, 4, 6, 8]);
}

#[test]
fn effects_thread_updates_in_list_order() {
    let model = TransverseIsing { field: 1.0 };
    let add_one = Callback::new(
        Trigger::iteration_elapsed(1),
        |_iter: usize,
         mut state: MockState,
         _model: &TransverseIsing,
         environment: MockEnvironment|
         -> Result<(MockState, MockEnvironment), BoxError> {
            state.overlap += 1.0;
            Ok((state, environment))
        },
    );
    let double = Callback::new(
        Trigger::iteration_elapsed(1),
        |_iter: usize,
         mut state: MockState,
         _model: &TransverseIsing,
         environment: MockEnvironment|
         -> Result<(MockState, MockEnvironment), BoxError> {
            state.overlap *= 2.0;
            Ok((state, environment))
        },
    );

    let mut callbacks = CallbackList::new().with(add_one).with(double);
    let (state, _) = mock_solver::run(&model, 1, &mut callbacks).unwrap();

    // One sweep leaves overlap at 0.5; (0.5 + 1) * 2 shows add-then-double.
    approx::assert_relative_eq!(state.overlap, 3.0);
}

#[test]
fn energy_convergence_recipe_tracks_the_solve() {
    let model = TransverseIsing { field: 1.0 };
    let mut recorder: MockRecorder = Recorder::energy_convergence();

    let mut callbacks =
        CallbackList::new().with(Callback::new(Trigger::iteration_elapsed(1), &mut recorder));
    mock_solver::run(&model, 5, &mut callbacks).unwrap();
    drop(callbacks);

    let energies: Vec<f64> = recorder
        .log("energies")
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    let errors: Vec<f64> = recorder
        .log("errors")
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();

    assert_eq!(energies.len(), 5);
    approx::assert_relative_eq!(energies[0], -0.5);
    assert!(energies.windows(2).all(|w| w[1] < w[0]));
    assert!(errors.windows(2).all(|w| w[1] < w[0]));
    assert_eq!(recorder.log("times").unwrap().len(), 5);
}

#[test]
fn nested_lists_run_in_sequence() {
    let model = TransverseIsing { field: 1.0 };
    let mut outer_recorder: MockRecorder = Recorder::new().observable(
        "sweeps",
        |step: Step<'_, MockState, TransverseIsing, MockEnvironment>| {
            Value::from(step.state.sweep)
        },
    );
    let mut inner_recorder: MockRecorder = Recorder::new().observable(
        "sweeps",
        |step: Step<'_, MockState, TransverseIsing, MockEnvironment>| {
            Value::from(step.state.sweep)
        },
    );

    let inner = CallbackList::new().with(Callback::new(
        Trigger::iteration_elapsed(3),
        &mut inner_recorder,
    ));
    let mut callbacks = CallbackList::new()
        .with(Callback::new(
            Trigger::iteration_elapsed(2),
            &mut outer_recorder,
        ))
        .with(Callback::from(inner));
    mock_solver::run(&model, 7, &mut callbacks).unwrap();
    drop(callbacks);

    assert_eq!(outer_recorder.log("sweeps").unwrap().len(), 4); // 0, 2, 4, 6
    assert_eq!(inner_recorder.log("sweeps").unwrap().len(), 3); // 0, 3, 6
}
