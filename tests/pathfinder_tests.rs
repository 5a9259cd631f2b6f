#[cfg(test)]
mod tests {
    use gantt_layout::data_types::{Bounds, PathfinderOptions, Point};
    use gantt_layout::error::LayoutError;
    use gantt_layout::pathfinder::{ChartElement, Pathfinder, RouteResult};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const HARD: Bounds = Bounds {
        x_min: 0.0,
        x_max: 600.0,
        y_min: 0.0,
        y_max: 400.0,
    };

    fn random_chart(rng: &mut StdRng, count: usize) -> Vec<ChartElement> {
        (0..count)
            .map(|i| {
                let x = rng.random_range(0.0..560.0);
                let y = rng.random_range(0.0..380.0);
                let bounds = Bounds::from_rect(x, y, rng.random_range(5.0..40.0), 20.0);
                ChartElement::new(format!("e{i}"), bounds)
            })
            .collect()
    }

    fn assert_connected(result: &RouteResult, start: Point, end: Point, context: &str) {
        assert!(!result.is_empty(), "{context}: empty path");
        assert_eq!(result.path[0], start, "{context}: path does not start at start");
        assert_eq!(*result.path.last().unwrap(), end, "{context}: path does not end at end");
        for pair in result.obstacles.windows(2) {
            assert_eq!(pair[0].end, pair[1].start, "{context}: gap between segments");
        }
    }

    #[test]
    fn test_fast_avoid_stays_in_hard_bounds() {
        let mut rng = StdRng::seed_from_u64(2024);
        for round in 0..60 {
            let mut pathfinder =
                Pathfinder::new(HARD, PathfinderOptions::default().with_algorithm("fastAvoid"));
            let count = rng.random_range(0..25);
            pathfinder.set_elements(random_chart(&mut rng, count));

            for attempt in 0..10 {
                let start = Point::new(rng.random_range(0.0..600.0), rng.random_range(0.0..400.0));
                let end = Point::new(rng.random_range(0.0..600.0), rng.random_range(0.0..400.0));
                let result = pathfinder.route("fastAvoid", start, end).unwrap();
                let context = format!("round {round} attempt {attempt}");

                for point in &result.path {
                    assert!(
                        HARD.contains(*point),
                        "{context}: {point:?} outside hard bounds"
                    );
                }
                assert_connected(&result, start, end, &context);
                for segment in &result.obstacles {
                    assert!(segment.is_axis_aligned(), "{context}: diagonal {segment:?}");
                }
            }
        }
    }

    #[test]
    fn test_simple_connect_is_connected() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut pathfinder =
            Pathfinder::new(HARD, PathfinderOptions::default().with_margin(3.0));
        pathfinder.set_elements(random_chart(&mut rng, 15));

        for attempt in 0..100 {
            let start = Point::new(rng.random_range(0.0..600.0), rng.random_range(0.0..400.0));
            let end = Point::new(rng.random_range(0.0..600.0), rng.random_range(0.0..400.0));
            let result = pathfinder.route("simpleConnect", start, end).unwrap();
            assert_connected(&result, start, end, &format!("attempt {attempt}"));
            assert!(result.path.len() <= 6);
        }
    }

    #[test]
    fn test_connect_routes_around_elements() {
        let mut pathfinder = Pathfinder::new(
            HARD,
            PathfinderOptions::from_json(r#"{"type": "fastAvoid", "algorithmMargin": 2}"#).unwrap(),
        );
        pathfinder.set_elements(vec![
            ChartElement::new("task-1", Bounds::new(20.0, 120.0, 50.0, 70.0)),
            ChartElement::new("blocker", Bounds::new(200.0, 260.0, 40.0, 120.0)),
            ChartElement::new("task-2", Bounds::new(320.0, 420.0, 50.0, 70.0)),
        ]);

        let result = pathfinder.connect("task-1", "task-2").unwrap();
        let start = Point::new(120.0, 60.0);
        let end = Point::new(320.0, 60.0);
        assert_connected(&result, start, end, "connect");

        let blocker = Bounds::new(200.0, 260.0, 40.0, 120.0);
        for segment in &result.obstacles {
            let mid = (segment.start + segment.end) / 2.0;
            assert!(!blocker.contains(mid), "{segment:?} crosses the blocker");
        }
        assert_eq!(pathfinder.line_obstacles().len(), result.obstacles.len());
    }

    #[test]
    fn test_unknown_algorithm_is_an_error() {
        let mut pathfinder = Pathfinder::new(HARD, PathfinderOptions::default());
        let err = pathfinder
            .route("curvy", Point::ZERO, Point::new(5.0, 5.0))
            .unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownAlgorithm {
                name: "curvy".to_string()
            }
        );

        pathfinder.set_options(PathfinderOptions::default().with_algorithm("curvy"));
        let result = pathfinder.route_or_empty(Point::ZERO, Point::new(5.0, 5.0));
        assert!(result.is_empty());
        assert!(result.obstacles.is_empty());
    }

    #[test]
    fn test_invalidate_clears_line_obstacles() {
        let mut pathfinder = Pathfinder::new(HARD, PathfinderOptions::default());
        pathfinder
            .route("straight", Point::new(1.0, 1.0), Point::new(50.0, 80.0))
            .unwrap();
        assert_eq!(pathfinder.line_obstacles().len(), 1);
        let generation = pathfinder.generation();
        pathfinder.invalidate();
        assert!(pathfinder.line_obstacles().is_empty());
        assert_eq!(pathfinder.generation(), generation + 1);
    }

    #[test]
    fn test_options_from_json() {
        let options = PathfinderOptions::from_json(
            r#"{"type": "simpleConnect", "startDirectionX": false,
                "startMarker": {"align": "center", "verticalAlign": "bottom"}}"#,
        )
        .unwrap();
        assert_eq!(options.algorithm, "simpleConnect");
        assert_eq!(options.start_direction_x, Some(false));
        assert_eq!(options.algorithm_margin, None);

        let mut pathfinder = Pathfinder::new(HARD, options);
        pathfinder.set_elements(vec![
            ChartElement::new("a", Bounds::new(10.0, 30.0, 10.0, 20.0)),
            ChartElement::new("b", Bounds::new(100.0, 140.0, 100.0, 120.0)),
        ]);
        let result = pathfinder.connect("a", "b").unwrap();
        assert_eq!(result.path[0], Point::new(20.0, 20.0));
        assert_eq!(*result.path.last().unwrap(), Point::new(100.0, 110.0));
    }
}
