#[cfg(test)]
mod tests {
    use gantt_layout::data_types::{records_from_json, Record};
    use gantt_layout::tree::build_tree;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::HashMap;

    #[test]
    fn test_ranges_inferred_from_children() {
        let records = vec![
            Record::new("A"),
            Record::new("B").with_parent("A").with_range(0.0, 10.0),
            Record::new("C").with_parent("A").with_range(5.0, 20.0),
        ];
        let root = build_tree(&records);

        assert_eq!(root.depth, 0);
        assert_eq!(root.children.len(), 1);
        let a = &root.children[0];
        assert_eq!(a.id.as_deref(), Some("A"));
        assert_eq!(a.depth, 1);
        assert_eq!(a.start(), Some(0.0));
        assert_eq!(a.end(), Some(20.0));
        assert_eq!(a.descendants, 2);
        assert_eq!(a.height, 1);
        assert!(a.children.iter().all(|c| c.depth == 2));
        assert_eq!(root.height, 2);
    }

    #[test]
    fn test_milestone_contributes_start_only() {
        let records = vec![
            Record::new("P"),
            Record::new("M").with_parent("P").with_start(30.0).as_milestone(),
            Record::new("T").with_parent("P").with_range(5.0, 10.0),
        ];
        let root = build_tree(&records);
        let p = root.find("P").unwrap();
        assert_eq!(p.start(), Some(5.0));
        assert_eq!(p.end(), Some(30.0));
    }

    #[test]
    fn test_own_range_wins_over_children() {
        let records = vec![
            Record::new("P").with_range(-5.0, 100.0),
            Record::new("C").with_parent("P").with_range(0.0, 10.0),
        ];
        let root = build_tree(&records);
        let p = root.find("P").unwrap();
        assert_eq!((p.start(), p.end()), (Some(-5.0), Some(100.0)));
    }

    #[test]
    fn test_orphans_hoisted_to_root() {
        let records = vec![
            Record::new("A").with_parent("missing"),
            Record::new("B").with_parent("A"),
        ];
        let root = build_tree(&records);
        assert_eq!(root.children.len(), 1);
        let a = &root.children[0];
        assert_eq!(a.parent, None);
        assert_eq!(a.children[0].id.as_deref(), Some("B"));
    }

    #[test]
    fn test_parent_cycle_broken() {
        let records = vec![
            Record::new("A").with_parent("C"),
            Record::new("B").with_parent("A"),
            Record::new("C").with_parent("B"),
            Record::new("D"),
        ];
        let root = build_tree(&records);
        assert_eq!(root.descendants, 4);
        assert_eq!(root.iter().filter(|n| !n.is_root()).count(), 4);
        assert_eq!(root.children.len(), 2);
    }

    #[test]
    fn test_records_from_json_tolerates_missing_fields() {
        let records = records_from_json(
            r#"[{"id": "A"}, {"parent": "A", "start": 1, "end": 2}, {"name": "loose"}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 3);
        let root = build_tree(&records);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.find("A").unwrap().end(), Some(2.0));

        assert!(records_from_json("{\"id\": 1}").is_err());
    }

    #[test]
    fn test_every_record_appears_once() {
        let mut rng = StdRng::seed_from_u64(17);
        for round in 0..50 {
            let count = rng.random_range(1..40);
            let records: Vec<Record> = (0..count)
                .map(|i| {
                    let record = Record::new(format!("r{i}"));
                    match rng.random_range(0..4) {
                        0 => record,
                        1 => record.with_parent("ghost"),
                        _ => record.with_parent(format!("r{}", rng.random_range(0..count))),
                    }
                })
                .collect();

            let root = build_tree(&records);
            let mut seen: HashMap<usize, usize> = HashMap::new();
            for node in root.iter().filter(|n| !n.is_root()) {
                *seen.entry(node.index.unwrap()).or_default() += 1;
            }
            assert_eq!(seen.len(), count, "round {round}: missing records");
            assert!(seen.values().all(|&c| c == 1), "round {round}: duplicated records");
            assert_eq!(root.descendants, count, "round {round}");
        }
    }
}
