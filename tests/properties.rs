//! Property tests for planning.

mod support;
use support::*;

use std::collections::HashSet;

use proptest::prelude::*;

use sopsistry::core::domain::ActionKind;
use sopsistry::core::planner::Planner;

fn file_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::btree_set("[a-z]{1,8}", 1..12)
        .prop_map(|names| names.into_iter().map(|n| format!("{n}.yaml")).collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn no_file_twice_within_a_scope(names in file_names()) {
        let t = Test::new();
        for name in &names {
            t.write(name, PLAIN_YAML);
        }
        // Overlapping patterns in one scope.
        let manifest = manifest_with(
            &["alice"],
            vec![scope("s", &["*.yaml", "**/*.yaml", "*"], &["alice"])],
        );

        let plan = Planner::new(t.root()).compute_plan(&manifest).unwrap();
        let unique: HashSet<_> = plan.iter().map(|a| a.file.clone()).collect();
        prop_assert_eq!(unique.len(), plan.len());
        prop_assert_eq!(plan.len(), names.len());
    }

    #[test]
    fn empty_scope_plans_only_skips(names in file_names()) {
        let t = Test::new();
        for name in &names {
            t.write(name, PLAIN_YAML);
        }
        let manifest = manifest_with(&["alice"], vec![scope("s", &["*.yaml"], &[])]);

        let plan = Planner::new(t.root()).compute_plan(&manifest).unwrap();
        prop_assert!(plan.iter().all(|a| a.kind == ActionKind::Skip));
        prop_assert!(plan.iter().all(|a| a.recipients.is_empty()));
    }

    #[test]
    fn planning_is_repeatable(names in file_names(), encrypted in prop::collection::vec(any::<bool>(), 12)) {
        let t = Test::new();
        for (name, enc) in names.iter().zip(&encrypted) {
            if *enc {
                t.write(name, "sops:\n  recipients: age1old\n---\nk: v\n");
            } else {
                t.write(name, PLAIN_YAML);
            }
        }
        let manifest = manifest_with(
            &["alice", "bob"],
            vec![
                scope("a", &["*.yaml"], &["alice"]),
                scope("b", &["*.yaml"], &["alice", "bob"]),
            ],
        );
        let planner = Planner::new(t.root());

        let first = planner.compute_plan(&manifest).unwrap();
        let second = planner.compute_plan(&manifest).unwrap();
        prop_assert_eq!(&first, &second);

        for action in first.iter() {
            let idx = names.iter().position(|n| action.file.to_str() == Some(n.as_str())).unwrap();
            let expected = if encrypted[idx] { ActionKind::Reencrypt } else { ActionKind::Encrypt };
            prop_assert_eq!(action.kind, expected);
        }
    }
}
