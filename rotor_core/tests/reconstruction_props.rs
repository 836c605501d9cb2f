use proptest::prelude::*;
use rotor_core::CheckpointLog;
use rotor_core::RotationEngine;
use rotor_core::reconstruct::GapReconstructor;

fn diffs(steps: &[f64]) -> Vec<f64> {
    steps.windows(2).map(|w| w[1] - w[0]).collect()
}

proptest! {
    #[test]
    fn regular_spacing_gives_unit_steps(
        n in 1usize..6,
        start in 0usize..6,
        delta in 5_000u64..500_000,
        samples in 2usize..12,
        t0 in 0u64..1_000_000_000,
    ) {
        let mut log = CheckpointLog::new(12);
        for i in 0..samples {
            log.append(t0 + i as u64 * delta, (start + i) % n);
        }
        let mut r = GapReconstructor::with_capacity(12);
        let rec = r.reconstruct(&log, n, 2).unwrap();
        prop_assert_eq!(rec.min_interval_us, delta as f64);
        // one ordinal per trigger; a lone switch advances a full turn each time
        prop_assert!(diffs(r.steps()).iter().all(|&d| d == 1.0));
    }

    #[test]
    fn missed_revolutions_add_whole_turns(
        n in 2usize..6,
        k in 1usize..4,
        delta in 5_000u64..100_000,
        gap_at in 1usize..5,
    ) {
        // six regular triggers, with k full revolutions skipped before trigger `gap_at`
        let mut log = CheckpointLog::new(8);
        let mut t = 0u64;
        for i in 0..6usize {
            if i == gap_at {
                t += (k * n) as u64 * delta;
            }
            log.append(t, i % n);
            t += delta;
        }
        let mut r = GapReconstructor::with_capacity(8);
        r.reconstruct(&log, n, 4).unwrap();
        let d = diffs(r.steps());
        for (j, step) in d.iter().enumerate() {
            let want = if j + 1 == gap_at { (1 + k * n) as f64 } else { 1.0 };
            prop_assert_eq!(*step, want, "diff {} of {:?}", j, d);
        }
    }

    #[test]
    fn steps_never_decrease(
        n in 1usize..5,
        gaps in prop::collection::vec(1u64..200_000, 1..10),
        ords in prop::collection::vec(0usize..5, 10),
    ) {
        let mut log = CheckpointLog::new(12);
        let mut t = 0u64;
        log.append(t, ords[0] % n);
        for (g, o) in gaps.iter().zip(&ords[1..]) {
            t += g;
            log.append(t, o % n);
        }
        let mut r = GapReconstructor::with_capacity(12);
        r.reconstruct(&log, n, 2).unwrap();
        prop_assert!(diffs(r.steps()).iter().all(|&d| d >= 0.0));
        prop_assert_eq!(r.steps().last().copied(), Some(ords[gaps.len()] as f64 % n as f64));
    }

    #[test]
    fn too_few_samples_never_yield_phase(
        times in prop::collection::vec(0u64..10_000_000, 0..4),
        query in 0u64..20_000_000,
    ) {
        let mut engine = RotationEngine::builder()
            .with_switch_count(2)
            .with_min_valid_samples(4)
            .build()
            .unwrap();
        for (i, t) in times.iter().enumerate() {
            engine.register_checkpoint(*t, i % 2);
        }
        prop_assert!(!engine.is_reliable());
        prop_assert_eq!(engine.estimated_phase(query), None);
    }

    #[test]
    fn phase_is_always_in_unit_range(
        stream in prop::collection::vec((1u64..300_000, 0usize..4), 0..40),
        queries in prop::collection::vec(0u64..60_000, 1..8),
    ) {
        let mut engine = RotationEngine::builder()
            .with_switch_count(3)
            .build()
            .unwrap();
        let mut t = 1_000u64;
        for (dt, o) in stream {
            t += dt;
            engine.register_checkpoint(t, o);
            engine.tick(t);
            for q in &queries {
                if let Some(p) = engine.estimated_phase(t + q) {
                    prop_assert!((0.0..1.0).contains(&p), "phase {} out of range", p);
                }
            }
        }
    }

    #[test]
    fn constant_rate_slope_matches_spacing(
        delta in 10_001u64..999_999,
        n in 1usize..4,
    ) {
        let mut engine = RotationEngine::builder()
            .with_switch_count(n)
            .with_history_size(8)
            .with_min_valid_samples(4)
            .with_pause_threshold_us(10_000_000)
            .build()
            .unwrap();
        for i in 0..8u64 {
            engine.register_checkpoint(i * delta, i as usize % n);
        }
        let rate = engine.rotation_rate().unwrap();
        let want = 1e6 / delta as f64;
        prop_assert!((rate - want).abs() < 1e-6 * want);
        prop_assert!(engine.is_reliable());
    }
}
