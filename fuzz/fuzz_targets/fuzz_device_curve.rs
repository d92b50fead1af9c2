#![no_main]
use libfuzzer_sys::fuzz_target;
use tester_config::{CurvePoint, DeviceCurve};

fuzz_target!(|input: (Vec<(u32, i32)>, Vec<u32>)| {
    let (rows, probes) = input;
    let rows: Vec<CurvePoint> = rows
        .into_iter()
        .map(|(level, reading)| CurvePoint { level, reading })
        .collect();
    let Ok(curve) = DeviceCurve::from_rows(rows) else {
        return;
    };
    let lo = curve.points().iter().map(|p| p.reading).min().unwrap_or(0);
    let hi = curve.points().iter().map(|p| p.reading).max().unwrap_or(0);
    for level in probes {
        let r = curve.reading_at(level);
        // Interpolation never leaves the range spanned by the points.
        assert!((lo..=hi).contains(&r));
    }
});
