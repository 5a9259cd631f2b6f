#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use gantt_layout::breaks::{breaks_from_json, find_break_at, Break, BreakTranslation};
    use gantt_layout::broken_axis::{AxisKind, BrokenAxis};
    use gantt_layout::scales::AxisScale;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_breaks(rng: &mut StdRng) -> Vec<Break> {
        (0..rng.random_range(1..8))
            .map(|_| {
                let from = rng.random_range(0.0..900.0);
                let brk = Break::new(from, from + rng.random_range(1.0..80.0));
                if rng.random_bool(0.3) {
                    brk.with_size(rng.random_range(0.0..1.0))
                } else {
                    brk
                }
            })
            .collect()
    }

    fn near_boundary(breaks: &[Break], value: f64) -> bool {
        breaks
            .iter()
            .any(|b| (b.from - value).abs() < 1e-6 || (b.to - value).abs() < 1e-6)
    }

    #[test]
    fn test_scale_with_breaks_offset() {
        // Domain [0, 100], break [40, 60]: 80 visible units over 100px.
        let mut axis = BrokenAxis::new(AxisKind::Value, 0.0, 100.0);
        let scale = AxisScale::for_axis(&axis, (0.0, 100.0));
        assert_eq!(scale.map(80.0), 80.0);

        axis.set_breaks(vec![Break::new(40.0, 60.0)]);
        let scale = AxisScale::for_axis(&axis, (0.0, 100.0));
        let mapped = scale.map(80.0);
        assert!((mapped - 75.0).abs() < 0.001, "Expected 75.0, got {}", mapped);
        let mapped_max = scale.map(100.0);
        assert!((mapped_max - 100.0).abs() < 0.001, "Expected 100.0, got {}", mapped_max);
        assert!((scale.pixels_per_unit() - 1.25).abs() < 1e-9);
        assert!((axis.translation().scale_factor() - 1.25).abs() < 1e-9);
    }

    #[test]
    fn test_translation_inverse_outside_boundaries() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let breaks = random_breaks(&mut rng);
            let translation = BreakTranslation::compute(&breaks, 0.0, 1000.0);
            for _ in 0..50 {
                let value = rng.random_range(0.0..1000.0);
                if near_boundary(&breaks, value) || find_break_at(value, &breaks).is_some() {
                    continue;
                }
                let back = translation.to_value(translation.to_linear(value));
                assert!(
                    (back - value).abs() < 1e-6,
                    "value {value} came back as {back} with {breaks:?}"
                );
            }
        }
    }

    #[test]
    fn test_to_linear_monotonic() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let breaks = random_breaks(&mut rng);
            let translation = BreakTranslation::compute(&breaks, 0.0, 1000.0);
            let mut previous = f64::NEG_INFINITY;
            for step in 0..2000 {
                let linear = translation.to_linear(step as f64 * 0.5);
                assert!(linear >= previous - 1e-9, "not monotonic at {}", step as f64 * 0.5);
                previous = linear;
            }
        }
    }

    #[test]
    fn test_overlapping_breaks_coalesce() {
        let breaks = vec![
            Break::new(10.0, 30.0),
            Break::new(20.0, 40.0),
            Break::new(40.0, 50.0),
            Break::new(70.0, 80.0),
        ];
        let translation = BreakTranslation::compute(&breaks, 0.0, 100.0);
        let coalesced: Vec<(f64, f64)> =
            translation.breaks().iter().map(|b| (b.from, b.to)).collect();
        assert_eq!(coalesced, vec![(10.0, 50.0), (70.0, 80.0)]);
        assert_eq!(translation.removed(), 50.0);
        assert_eq!(translation.unit_length(), 50.0);
        assert_eq!(translation.to_linear(60.0), 20.0);
        assert_eq!(translation.to_linear(25.0), 10.0);
    }

    #[test]
    fn test_extremes_clipped_out_of_breaks() {
        let breaks = vec![Break::new(-10.0, 5.0), Break::new(90.0, 120.0)];
        let translation = BreakTranslation::compute(&breaks, 0.0, 100.0);
        assert_eq!(translation.min(), 5.0);
        assert_eq!(translation.max(), 90.0);

        // The whole range sits in one break
        let swallowed = BreakTranslation::compute(&[Break::new(0.0, 100.0)], 10.0, 20.0);
        assert_eq!(swallowed.min(), 100.0);
        assert_eq!(swallowed.max(), swallowed.min());
    }

    #[test]
    fn test_repeating_breaks() {
        let brk = Break::new(5.0, 7.0).with_repeat(10.0);
        assert!(brk.contains(5.0));
        assert!(brk.contains(26.0));
        assert!(!brk.contains(27.0));
        assert!(brk.contains(-4.0));

        let translation = BreakTranslation::compute(&[brk], 0.0, 100.0);
        assert_eq!(translation.breaks().len(), 10);
        assert_eq!(translation.removed(), 20.0);
        assert_eq!(translation.to_linear(100.0), 80.0);
    }

    #[test]
    fn test_weekend_breaks() {
        let wednesday = NaiveDate::from_ymd_opt(2026, 1, 14).unwrap();
        let weekend = Break::weekends_from(wednesday).unwrap();
        let saturday = 1_768_608_000_000.0;
        assert_eq!(weekend.from, saturday);
        let day = 24.0 * 3600.0 * 1000.0;
        assert!(weekend.contains(saturday + 7.0 * day + 1.0));
        assert!(!weekend.contains(saturday + 2.0 * day));
    }

    #[test]
    fn test_show_points_policy() {
        let breaks = breaks_from_json(
            r#"[{"from": 1, "to": 3}, {"from": 5, "to": 8, "showPoints": true, "breakSize": 1}]"#,
        )
        .unwrap();
        assert_eq!(breaks[1].size, 1.0);

        let mut axis = BrokenAxis::new(AxisKind::Category, 0.0, 10.0);
        axis.set_breaks(breaks);
        assert!(axis.is_in_any_break(2.0, true));
        assert!(axis.is_in_any_break(6.0, false));
        assert!(!axis.is_in_any_break(6.0, true));
        assert_eq!(axis.find_break_at(6.0).map(|b| b.from), Some(5.0));
        assert_eq!(axis.find_break_at(4.0), None);
    }

    #[test]
    fn test_identity_without_breaks() {
        let axis = BrokenAxis::new(AxisKind::Value, -50.0, 50.0);
        assert_eq!(axis.to_linear(12.5), 12.5);
        assert_eq!(axis.to_value(-7.0), -7.0);
        assert_eq!(axis.translation().unit_length(), 100.0);
    }
}
