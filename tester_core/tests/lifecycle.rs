mod common;

use common::{feed_constant, feed_level, flaky_tester, spy_tester};
use rstest::rstest;
use tester_core::error::TesterError;
use tester_core::{Event, LifecycleState, SweepCfg, Verdict};

#[test]
fn press_starts_run_at_level_zero() {
    let mut t = spy_tester(SweepCfg::default());
    assert_eq!(t.state(), LifecycleState::Idle);

    let state = t.handle(Event::ButtonPressed).unwrap();
    assert_eq!(state, LifecycleState::Running);
    assert_eq!(t.level(), 0);
    assert_eq!(t.output().levels, vec![0]);
    assert_eq!(t.display().shown(), Some("WAIT"));
    assert_eq!(t.input().requests, 0);
}

#[test]
fn clean_sweep_passes_after_all_levels() {
    let mut t = spy_tester(SweepCfg::default());
    t.handle(Event::ButtonPressed).unwrap();

    let mut medians = 0;
    while t.state() == LifecycleState::Running {
        feed_constant(&mut t, 1000);
        medians += 1;
    }

    assert_eq!(t.state(), LifecycleState::Halted(Verdict::Pass));
    assert_eq!(medians, 51);
    let expected: Vec<u32> = (0..=2500).step_by(50).collect();
    assert_eq!(t.output().levels, expected);
    assert_eq!(t.input().requests, 51 * 9);
    assert_eq!(t.report().advances, 50);
    assert_eq!(t.report().steps.len(), 51);
    assert_eq!(t.report().verdict, Some(Verdict::Pass));
    assert_eq!(t.display().shown(), Some("PASS"));
}

#[test]
fn fail_at_1200_stops_the_sweep() {
    let mut t = spy_tester(SweepCfg::default());
    t.handle(Event::ButtonPressed).unwrap();

    for _ in 0..24 {
        assert_eq!(feed_constant(&mut t, 1000), LifecycleState::Running);
    }
    assert_eq!(t.level(), 1200);
    let state = feed_level(&mut t, &[4500, 0, 4500, 4500, 12, 4500, 4500, 3, 7]);

    assert_eq!(state, LifecycleState::Halted(Verdict::Fail));
    assert_eq!(t.output().levels.last(), Some(&1200));
    assert_eq!(t.output().levels.len(), 25);
    let at = t.report().failed_at().copied().unwrap();
    assert_eq!((at.step, at.level, at.median), (24, 1200, 4500));
    assert_eq!(t.display().shown(), Some("FAIL"));

    // Stale completions after the verdict change nothing.
    let requests = t.input().requests;
    t.handle(Event::StimulusSettled).unwrap();
    t.handle(Event::SampleReady(9)).unwrap();
    assert_eq!(t.state(), LifecycleState::Halted(Verdict::Fail));
    assert_eq!(t.input().requests, requests);
    assert_eq!(t.output().levels.len(), 25);
    assert_eq!(t.ignored_events(), 2);
}

#[rstest]
#[case(4029, LifecycleState::Running)]
#[case(4030, LifecycleState::Halted(Verdict::Fail))]
#[case(-4030, LifecycleState::Halted(Verdict::Fail))]
#[case(-4029, LifecycleState::Running)]
fn threshold_is_inclusive_on_magnitude(#[case] reading: i32, #[case] expected: LifecycleState) {
    let mut t = spy_tester(SweepCfg::default());
    t.handle(Event::ButtonPressed).unwrap();
    assert_eq!(feed_constant(&mut t, reading), expected);
}

#[test]
fn single_outlier_does_not_fail() {
    let mut t = spy_tester(SweepCfg::default());
    t.handle(Event::ButtonPressed).unwrap();
    let state = feed_level(&mut t, &[100, 100, 100, 100, 4095, 100, 100, 100, 100]);
    assert_eq!(state, LifecycleState::Running);
    assert_eq!(t.report().steps[0].median, 100);
}

#[test]
fn presses_are_masked_while_running() {
    let mut t = spy_tester(SweepCfg::default());
    t.handle(Event::ButtonPressed).unwrap();
    feed_constant(&mut t, 10);
    let levels_before = t.output().levels.clone();

    for _ in 0..3 {
        assert_eq!(t.handle(Event::ButtonPressed).unwrap(), LifecycleState::Running);
    }
    assert_eq!(t.output().levels, levels_before);
    assert_eq!(t.level(), 50);
    assert_eq!(t.runs_started(), 1);
    assert_eq!(t.ignored_events(), 3);
}

#[test]
fn press_after_verdict_clears_then_restarts() {
    let cfg = SweepCfg {
        reference_max: 100,
        step_size: 50,
        sample_count: 3,
        fail_threshold: 4030,
    };
    let mut t = spy_tester(cfg);
    t.handle(Event::ButtonPressed).unwrap();
    while t.state() == LifecycleState::Running {
        feed_constant(&mut t, 5);
    }
    assert_eq!(t.state(), LifecycleState::Halted(Verdict::Pass));

    assert_eq!(t.handle(Event::ButtonPressed).unwrap(), LifecycleState::Idle);
    assert_eq!(t.display().shown(), Some(""));

    assert_eq!(t.handle(Event::ButtonPressed).unwrap(), LifecycleState::Running);
    assert_eq!(t.runs_started(), 2);
    assert_eq!(t.level(), 0);
    assert!(t.report().steps.is_empty());
    assert_eq!(t.report().verdict, None);
    assert_eq!(t.output().levels, vec![0, 50, 100, 0]);
}

#[test]
fn last_step_clamps_to_reference_max() {
    let cfg = SweepCfg {
        reference_max: 100,
        step_size: 30,
        sample_count: 1,
        fail_threshold: 4030,
    };
    let mut t = spy_tester(cfg);
    t.handle(Event::ButtonPressed).unwrap();
    while t.state() == LifecycleState::Running {
        feed_constant(&mut t, 0);
    }
    assert_eq!(t.output().levels, vec![0, 30, 60, 90, 100]);
    assert_eq!(t.report().advances, cfg.advances());
    assert_eq!(t.state(), LifecycleState::Halted(Verdict::Pass));
}

#[test]
fn events_while_idle_are_ignored() {
    let mut t = spy_tester(SweepCfg::default());
    assert_eq!(t.handle(Event::StimulusSettled).unwrap(), LifecycleState::Idle);
    assert_eq!(t.handle(Event::SampleReady(1)).unwrap(), LifecycleState::Idle);
    assert!(t.output().levels.is_empty());
    assert_eq!(t.ignored_events(), 2);
}

#[test]
fn sample_before_settle_is_out_of_order() {
    let mut t = spy_tester(SweepCfg::default());
    t.handle(Event::ButtonPressed).unwrap();
    let err = t.handle(Event::SampleReady(1)).unwrap_err();
    match err.downcast_ref::<TesterError>() {
        Some(TesterError::OutOfOrder { event, .. }) => assert_eq!(*event, "sample_ready"),
        other => panic!("expected OutOfOrder, got {other:?}"),
    }
    assert_eq!(t.state(), LifecycleState::Running);
}

#[test]
fn duplicate_settle_is_out_of_order() {
    let mut t = spy_tester(SweepCfg::default());
    t.handle(Event::ButtonPressed).unwrap();
    t.handle(Event::StimulusSettled).unwrap();
    let err = t.handle(Event::StimulusSettled).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TesterError>(),
        Some(TesterError::OutOfOrder { .. })
    ));
}

#[test]
fn each_sample_requests_the_next() {
    let mut t = spy_tester(SweepCfg::default());
    t.handle(Event::ButtonPressed).unwrap();
    t.handle(Event::StimulusSettled).unwrap();
    assert_eq!(t.input().requests, 1);
    t.handle(Event::SampleReady(1)).unwrap();
    assert_eq!(t.input().requests, 2);
    t.handle(Event::SampleReady(1)).unwrap();
    assert_eq!(t.input().requests, 3);
}

#[test]
fn output_failure_surfaces_from_start() {
    let mut t = flaky_tester(SweepCfg::default(), Some(0));
    let err = t.handle(Event::ButtonPressed).unwrap_err();
    let chain = format!("{err:#}");
    assert!(chain.contains("start sweep"), "{chain}");
    assert!(matches!(
        err.downcast_ref::<TesterError>(),
        Some(TesterError::Hardware(_))
    ));

    // The run is dropped, so the button is live again.
    assert_eq!(t.state(), LifecycleState::Idle);
    assert_eq!(t.display().shown(), Some(""));
    assert!(t.output().levels.is_empty());

    assert_eq!(t.handle(Event::ButtonPressed).unwrap(), LifecycleState::Running);
    assert_eq!(t.runs_started(), 2);
    assert_eq!(t.output().levels, vec![0]);
    assert_eq!(t.ignored_events(), 0);
}

#[test]
fn output_failure_mid_sweep_aborts_the_run() {
    let mut t = flaky_tester(SweepCfg::default(), Some(1));
    t.handle(Event::ButtonPressed).unwrap();
    t.handle(Event::StimulusSettled).unwrap();
    for _ in 0..8 {
        assert_eq!(t.handle(Event::SampleReady(10)).unwrap(), LifecycleState::Running);
    }
    let err = t.handle(Event::SampleReady(10)).unwrap_err();
    assert!(format!("{err:#}").contains("set stimulus level 50"));

    assert_eq!(t.state(), LifecycleState::Idle);
    assert_eq!(t.level(), 0);
    assert_eq!(t.report().advances, 0);
    assert_eq!(t.report().verdict, None);
    assert_eq!(t.output().levels, vec![0]);

    // Late completions for the dropped step are stale.
    assert_eq!(t.handle(Event::StimulusSettled).unwrap(), LifecycleState::Idle);
    assert_eq!(t.ignored_events(), 1);

    assert_eq!(t.handle(Event::ButtonPressed).unwrap(), LifecycleState::Running);
    assert_eq!(feed_constant(&mut t, 10), LifecycleState::Running);
    assert_eq!(t.output().levels, vec![0, 0, 50]);
    assert_eq!(t.level(), 50);
}

#[test]
fn press_after_fail_clears_then_restarts() {
    let cfg = SweepCfg {
        reference_max: 100,
        step_size: 50,
        sample_count: 3,
        fail_threshold: 4030,
    };
    let mut t = spy_tester(cfg);
    t.handle(Event::ButtonPressed).unwrap();
    feed_constant(&mut t, 5);
    assert_eq!(feed_constant(&mut t, 4095), LifecycleState::Halted(Verdict::Fail));
    assert_eq!(t.display().shown(), Some("FAIL"));

    assert_eq!(t.handle(Event::ButtonPressed).unwrap(), LifecycleState::Idle);
    assert_eq!(t.display().shown(), Some(""));

    assert_eq!(t.handle(Event::ButtonPressed).unwrap(), LifecycleState::Running);
    assert_eq!(t.level(), 0);
    assert_eq!(t.display().shown(), Some("WAIT"));
    assert!(t.report().steps.is_empty());
    assert_eq!(t.output().levels, vec![0, 50, 0]);
}
