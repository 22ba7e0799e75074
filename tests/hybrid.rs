use hybrid_fft::accelerator::emulated::Op;
use hybrid_fft::accelerator::{DeviceBuffer, EmulatedAccelerator, Kernel};
use hybrid_fft::hybrid::DEBUG_SENTINEL;
use hybrid_fft::{DeviceOp, DeviceStatus, Fft, FftError, FinishStrategy, HybridOptions};
use num_complex::Complex64;

mod common;
use common::{assert_slice_relative, random_signal, Faulty, DEVICE_EPSILON};

const STRATEGIES: [FinishStrategy; 2] = [FinishStrategy::Host, FinishStrategy::DeviceResubmit];

fn host_reference(x: &[Complex64], inverse: bool) -> Vec<Complex64> {
    Fft::<f64>::new(x.len(), inverse).transform(x).to_vec()
}

#[test]
fn both_strategies_match_host_for_16_points_in_groups_of_4() {
    let x = random_signal(16, 16);
    let expected = host_reference(&x, false);
    for finish in STRATEGIES {
        let mut fft = Fft::<f64>::new(16, false);
        let mut device = EmulatedAccelerator::new();
        let options = HybridOptions::new(4).with_finish(finish);
        let spectrum = fft.transform_hybrid(&x, &mut device, options).unwrap();
        assert_slice_relative(spectrum, &expected, DEVICE_EPSILON, &format!("{finish:?}"));
    }
}

#[test]
fn strategies_match_host_across_sizes_and_directions() {
    for (n, points) in [(2, 2), (8, 2), (64, 8), (256, 16), (1024, 256), (4096, 2048)] {
        for inverse in [false, true] {
            let x = random_signal(n, (n + points) as u64);
            let expected = host_reference(&x, inverse);
            for finish in STRATEGIES {
                let mut fft = Fft::<f64>::new(n, inverse);
                let mut device = EmulatedAccelerator::new();
                let options = HybridOptions::new(points).with_finish(finish);
                let spectrum = fft.transform_hybrid(&x, &mut device, options).unwrap();
                // Inverse output is unscaled, so its rounding error grows with sqrt(n).
                let epsilon = if inverse { DEVICE_EPSILON * (n as f64).sqrt() } else { DEVICE_EPSILON };
                assert_slice_relative(
                    spectrum,
                    &expected,
                    epsilon,
                    &format!("n = {n}, points = {points}, inverse = {inverse}, {finish:?}"),
                );
            }
        }
    }
}

#[test]
fn group_larger_than_transform_needs_no_second_phase() {
    let x = random_signal(8, 3);
    let mut fft = Fft::<f64>::new(8, false);
    let mut device = EmulatedAccelerator::new();
    let options = HybridOptions::new(64).with_finish(FinishStrategy::DeviceResubmit);
    let spectrum = fft.transform_hybrid(&x, &mut device, options).unwrap().to_vec();

    assert_slice_relative(&spectrum, &host_reference(&x, false), DEVICE_EPSILON, "clamped group");
    assert!(!device.ops().contains(&Op::Dispatch(Kernel::SingleStage)));
}

#[test]
fn phase_one_orders_writes_dispatch_barrier_read() {
    let x = random_signal(16, 1);
    let mut fft = Fft::<f64>::new(16, false);
    let mut device = EmulatedAccelerator::new();
    fft.transform_hybrid(&x, &mut device, HybridOptions::new(4)).unwrap();

    assert_eq!(
        device.ops(),
        &[
            Op::Write(DeviceBuffer::Samples),
            Op::Write(DeviceBuffer::PointsPerGroup),
            Op::Write(DeviceBuffer::Direction),
            Op::Release(DeviceBuffer::Debug),
            Op::Dispatch(Kernel::GroupStages),
            Op::Barrier,
            Op::Read(DeviceBuffer::Samples),
        ]
    );
    assert_eq!(device.pending(), 0);
}

#[test]
fn resubmit_waits_after_every_remaining_stage() {
    // 64 points in groups of 4: 2 fused stages, 4 resubmitted ones.
    let x = random_signal(64, 2);
    let mut fft = Fft::<f64>::new(64, true);
    let mut device = EmulatedAccelerator::new();
    let options = HybridOptions::new(4).with_finish(FinishStrategy::DeviceResubmit);
    fft.transform_hybrid(&x, &mut device, options).unwrap();

    let stage_ops = &device.ops()[7..];
    assert_eq!(stage_ops.len(), 4 * 3 + 1);
    for chunk in stage_ops[..12].chunks(3) {
        assert_eq!(
            chunk,
            &[
                Op::Write(DeviceBuffer::StageSize),
                Op::Dispatch(Kernel::SingleStage),
                Op::Barrier,
            ]
        );
    }
    assert_eq!(stage_ops[12], Op::Read(DeviceBuffer::Samples));
}

#[test]
fn engine_is_reusable_across_frames() {
    let mut fft = Fft::<f64>::new(32, false);
    let mut device = EmulatedAccelerator::new();
    for seed in 0..3 {
        let x = random_signal(32, seed);
        let spectrum = fft.transform_hybrid(&x, &mut device, HybridOptions::new(8)).unwrap();
        assert_slice_relative(spectrum, &host_reference(&x, false), DEVICE_EPSILON, "frame");
    }
}

#[test]
fn debug_capture_marks_every_work_item() {
    let n = 32;
    let x = random_signal(n, 11);
    let mut fft = Fft::<f64>::new(n, false);
    let mut device = EmulatedAccelerator::new();
    let options = HybridOptions::new(8).with_debug_capture(true);
    fft.transform_hybrid(&x, &mut device, options).unwrap();

    let records = fft.debug_records();
    assert_eq!(records.len(), n);
    assert!(records[..n / 2].iter().all(|&r| r != DEBUG_SENTINEL));
    assert!(records[n / 2..].iter().all(|&r| r == DEBUG_SENTINEL));
    assert!(device.ops().contains(&Op::Read(DeviceBuffer::Debug)));
}

#[test]
fn capture_does_not_leak_into_later_transforms() {
    // One device shared by a capturing 16-point engine and a plain 64-point
    // one, in both orders and with both finishes.
    let mut device = EmulatedAccelerator::new();
    let small = random_signal(16, 21);
    let large = random_signal(64, 22);
    let mut fft16 = Fft::<f64>::new(16, false);
    let mut fft64 = Fft::<f64>::new(64, false);

    for finish in STRATEGIES {
        let capture = HybridOptions::new(4).with_finish(finish).with_debug_capture(true);
        let plain = HybridOptions::new(4).with_finish(finish);

        fft16.transform_hybrid(&small, &mut device, capture).unwrap();
        assert_eq!(fft16.debug_records().len(), 16);

        let spectrum = fft64.transform_hybrid(&large, &mut device, plain).unwrap();
        assert_slice_relative(spectrum, &host_reference(&large, false), DEVICE_EPSILON, "after capture");
        assert!(fft64.debug_records().is_empty());

        // The same engine stops reporting records once capture is off.
        fft16.transform_hybrid(&small, &mut device, plain).unwrap();
        assert!(fft16.debug_records().is_empty());
    }
    assert_eq!(device.pending(), 0);
}

#[test]
fn engines_of_different_sizes_share_one_device() {
    let mut device = EmulatedAccelerator::new();
    for n in [256, 8, 1024, 32] {
        let x = random_signal(n, n as u64);
        let mut fft = Fft::<f64>::new(n, true);
        let options = HybridOptions::new(8).with_debug_capture(n == 1024);
        let spectrum = fft.transform_hybrid(&x, &mut device, options).unwrap();
        let epsilon = DEVICE_EPSILON * (n as f64).sqrt();
        assert_slice_relative(spectrum, &host_reference(&x, true), epsilon, &format!("n = {n}"));
        assert_eq!(fft.debug_records().len(), if n == 1024 { n } else { 0 });
    }
}

#[test]
fn host_finish_keeps_engine_precision_past_large_groups() {
    // Many host-finished stages of size up to 4096 after a 2048-point group.
    let n = 4096;
    let x = random_signal(n, 6144);
    for inverse in [false, true] {
        let expected = host_reference(&x, inverse);
        let mut host = Fft::<f64>::new(n, inverse);
        let mut resubmit = Fft::<f64>::new(n, inverse);
        let mut device = EmulatedAccelerator::new();
        let options = HybridOptions::new(2048);
        let by_host = host.transform_hybrid(&x, &mut device, options).unwrap().to_vec();
        let by_device = resubmit
            .transform_hybrid(&x, &mut device, options.with_finish(FinishStrategy::DeviceResubmit))
            .unwrap();

        let max_err = |got: &[Complex64]| {
            got.iter()
                .zip(&expected)
                .map(|(g, e)| (g - e).norm())
                .fold(0.0f64, f64::max)
        };
        // Only the fused f32 stages round, so the host finish is no worse than
        // running every stage on the device.
        assert!(
            max_err(&by_host) <= max_err(by_device) * 1.5,
            "inverse = {inverse}: host {:e}, device {:e}",
            max_err(&by_host),
            max_err(by_device)
        );
    }
}

#[test]
fn single_point_does_no_device_work() {
    let mut fft = Fft::<f64>::new(1, false);
    let mut device = EmulatedAccelerator::new();
    let x = [Complex64::new(0.5, -0.5)];
    let spectrum = fft.transform_hybrid(&x, &mut device, HybridOptions::default()).unwrap();
    assert_eq!(spectrum, &x);
    assert!(device.ops().is_empty());
}

#[test]
fn invalid_points_per_group_is_rejected() {
    let x = random_signal(16, 0);
    let mut fft = Fft::<f64>::new(16, false);
    let mut device = EmulatedAccelerator::with_max_group_points(8);
    for points in [0, 1, 3, 6, 16] {
        let err = fft
            .transform_hybrid(&x, &mut device, HybridOptions::new(points))
            .unwrap_err();
        assert!(
            matches!(err, FftError::InvalidPointsPerGroup { points: p, max: 8 } if p == points),
            "points = {points}: {err}"
        );
    }
    assert!(device.ops().is_empty());
}

#[test]
fn device_failures_are_reported_with_operation_and_location() {
    let cases = [
        (DeviceOp::Write, 1, DeviceStatus::SizeMismatch { device: 4, host: 8 }),
        (DeviceOp::Dispatch, 0, DeviceStatus::Launch("out of resources".into())),
        (DeviceOp::Barrier, 2, DeviceStatus::Sync("device lost".into())),
        (DeviceOp::Read, 1, DeviceStatus::UnknownBuffer),
    ];
    for (op, fail_at, status) in cases {
        let x = random_signal(64, 4);
        let mut fft = Fft::<f64>::new(64, false);
        let mut device = Faulty::new(EmulatedAccelerator::new(), op, fail_at, status.clone());
        let options = HybridOptions::new(4).with_finish(FinishStrategy::DeviceResubmit);

        match fft.transform_hybrid(&x, &mut device, options) {
            Err(FftError::Device(err)) => {
                assert_eq!(err.op, op);
                assert_eq!(err.status, status);
                assert!(err.location.file().ends_with("hybrid.rs"), "{}", err.location);
            }
            other => panic!("{op}: expected a device error, got {other:?}"),
        }
    }
}

#[test]
fn failure_stops_all_further_device_work() {
    let x = random_signal(64, 8);
    let mut fft = Fft::<f64>::new(64, false);
    let mut device = Faulty::new(
        EmulatedAccelerator::new(),
        DeviceOp::Dispatch,
        1,
        DeviceStatus::Launch("watchdog".into()),
    );
    let options = HybridOptions::new(4).with_finish(FinishStrategy::DeviceResubmit);
    assert!(fft.transform_hybrid(&x, &mut device, options).is_err());

    // Group dispatch, then the first stage's write before its failed dispatch.
    let ops = device.inner.ops();
    assert_eq!(ops.last(), Some(&Op::Write(DeviceBuffer::StageSize)));
    assert_eq!(ops.iter().filter(|op| matches!(op, Op::Dispatch(_))).count(), 1);
}
