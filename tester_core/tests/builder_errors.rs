mod common;

use common::{SpyDisplay, SpyInput, SpyOutput};
use rstest::rstest;
use tester_core::error::BuildError;
use tester_core::{DisplayCfg, LifecycleState, SweepCfg, Tester, build_tester};

#[rstest]
fn builder_missing_output_yields_typed_build_error() {
    let err = Tester::builder()
        // missing with_output()
        .with_input(SpyInput::default())
        .with_display(SpyDisplay::default())
        .try_build()
        .expect_err("should fail with MissingOutput");

    match err.downcast_ref::<BuildError>() {
        Some(BuildError::MissingOutput) => {}
        other => panic!("expected MissingOutput, got: {other:?}"),
    }
}

#[rstest]
fn builder_missing_display_yields_typed_build_error() {
    let err = Tester::builder()
        .with_output(SpyOutput::default())
        .with_input(SpyInput::default())
        .try_build()
        .expect_err("should fail with MissingDisplay");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingDisplay)
    ));
}

#[rstest]
#[case(SweepCfg { reference_max: 0, ..SweepCfg::default() }, "reference_max")]
#[case(SweepCfg { step_size: 0, ..SweepCfg::default() }, "step_size must be > 0")]
#[case(SweepCfg { step_size: 2501, ..SweepCfg::default() }, "step_size must be <=")]
#[case(SweepCfg { sample_count: 0, ..SweepCfg::default() }, "sample_count")]
#[case(SweepCfg { sample_count: 65, ..SweepCfg::default() }, "sample_count")]
#[case(SweepCfg { fail_threshold: 0, ..SweepCfg::default() }, "fail_threshold")]
fn builder_rejects_invalid_sweep(#[case] cfg: SweepCfg, #[case] needle: &str) {
    let err = Tester::builder()
        .with_output(SpyOutput::default())
        .with_input(SpyInput::default())
        .with_display(SpyDisplay::default())
        .with_sweep(cfg)
        .build()
        .expect_err("invalid sweep should be rejected");
    match err.downcast_ref::<BuildError>() {
        Some(BuildError::InvalidConfig(msg)) => assert!(msg.contains(needle), "{msg}"),
        other => panic!("expected InvalidConfig, got: {other:?}"),
    }
}

#[rstest]
fn builder_rejects_empty_display_text() {
    let texts = DisplayCfg {
        pass_text: String::new(),
        ..DisplayCfg::default()
    };
    let err = build_tester(
        SpyOutput::default(),
        SpyInput::default(),
        SpyDisplay::default(),
        None,
        Some(texts),
    )
    .expect_err("empty text should be rejected");
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}

#[rstest]
fn built_tester_starts_idle_without_touching_peripherals() {
    let t = Tester::builder()
        .with_output(SpyOutput::default())
        .with_input(SpyInput::default())
        .with_display(SpyDisplay::default())
        .build()
        .unwrap();
    assert_eq!(t.state(), LifecycleState::Idle);
    assert_eq!(t.level(), 0);
    assert_eq!(*t.sweep_cfg(), SweepCfg::default());
}
