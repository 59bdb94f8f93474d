use chrono::NaiveDate;
use skytally_core::{
    CompareMode, DiffResult, LoadedSnapshots, Record, ServiceKind, Side, SnapshotKey, Table,
};
use std::collections::BTreeSet;

fn table(day: u32, rows: &[(&str, &str)]) -> Table {
    let records = rows
        .iter()
        .map(|(id, state)| Record::new().with("id", *id).with("state", *state))
        .collect();
    Table::new(
        ServiceKind::Compute,
        NaiveDate::from_ymd_opt(2024, 11, day).unwrap(),
        vec!["id".into(), "state".into()],
        records,
    )
}

fn diff(source: &Table, target: &Table, mode: CompareMode) -> DiffResult {
    LoadedSnapshots::load(source, target, SnapshotKey::single("id"))
        .unwrap()
        .diff(mode)
}

fn set(keys: &[&str]) -> BTreeSet<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

fn keys(table: &Table) -> BTreeSet<String> {
    table.records().iter().map(|r| r.cell("id")).collect()
}

/// target に新しいインスタンスが増えたケース
#[test]
fn test_scenario_added_instance() {
    let source = table(1, &[("i-1", "running")]);
    let target = table(2, &[("i-1", "running"), ("i-2", "running")]);

    let result = diff(&source, &target, CompareMode::KeysOnly);

    assert_eq!(result.added, set(&["i-2"]));
    assert!(result.removed.is_empty());
    assert_eq!(result.common, set(&["i-1"]));
    assert!(result.warnings.is_empty());
}

/// target からインスタンスが消えたケース
#[test]
fn test_scenario_removed_instance() {
    let source = table(1, &[("i-1", ""), ("i-2", "")]);
    let target = table(2, &[("i-1", "")]);

    let result = diff(&source, &target, CompareMode::KeysOnly);

    assert!(result.added.is_empty());
    assert_eq!(result.removed, set(&["i-2"]));
    assert_eq!(result.common, set(&["i-1"]));
}

#[test]
fn test_partition_and_symmetry_properties() {
    let pool = ["i-1", "i-2", "i-3", "i-4", "i-5", "i-6"];

    // Every pair of subsets drawn from bit masks over the pool.
    for source_mask in 1u32..(1 << pool.len()) {
        for target_mask in [1u32, 0b000111, 0b101010, 0b111111, source_mask ^ 0b110011] {
            if target_mask == 0 {
                continue;
            }
            let pick = |mask: u32| -> Vec<(&str, &str)> {
                pool.iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, id)| (*id, "running"))
                    .collect()
            };
            let source = table(1, &pick(source_mask));
            let target = table(2, &pick(target_mask));

            let forward = diff(&source, &target, CompareMode::KeysOnly);
            let backward = diff(&target, &source, CompareMode::KeysOnly);

            assert!(forward.added.is_disjoint(&forward.removed));
            assert!(forward.added.is_disjoint(&forward.common));
            assert!(forward.removed.is_disjoint(&forward.common));

            let union: BTreeSet<String> = forward
                .added
                .iter()
                .chain(&forward.removed)
                .chain(&forward.common)
                .cloned()
                .collect();
            let all_keys: BTreeSet<String> = keys(&source).union(&keys(&target)).cloned().collect();
            assert_eq!(union, all_keys);

            assert_eq!(forward.added, backward.removed);
            assert_eq!(forward.removed, backward.added);
            assert_eq!(forward.common, backward.common);
        }
    }
}

#[test]
fn test_duplicate_key_warns_once_and_last_row_wins() {
    let source = table(
        1,
        &[
            ("i-1", "pending"),
            ("i-2", "running"),
            ("i-1", "stopped"),
            ("i-1", "running"),
        ],
    );
    let target = table(2, &[("i-1", "running"), ("i-2", "running")]);

    let loaded = LoadedSnapshots::load(&source, &target, SnapshotKey::single("id")).unwrap();
    assert_eq!(loaded.warnings().len(), 1);
    assert_eq!(loaded.warnings()[0].side, Side::Source);
    assert_eq!(loaded.warnings()[0].key, "i-1");
    assert_eq!(loaded.warnings()[0].occurrences, 3);

    // The last source row for i-1 is "running", so nothing changed.
    let result = loaded.diff(CompareMode::Fields);
    assert!(result.changed.is_empty());
    assert_eq!(result.common, set(&["i-1", "i-2"]));
}

#[test]
fn test_duplicates_on_both_sides_warn_per_side() {
    let source = table(1, &[("i-1", "a"), ("i-1", "b")]);
    let target = table(2, &[("i-1", "a"), ("i-1", "b"), ("i-2", "c"), ("i-2", "c")]);

    let result = diff(&source, &target, CompareMode::KeysOnly);

    let reported: Vec<(Side, &str)> = result
        .warnings
        .iter()
        .map(|w| (w.side, w.key.as_str()))
        .collect();
    assert_eq!(
        reported,
        vec![(Side::Source, "i-1"), (Side::Target, "i-1"), (Side::Target, "i-2")]
    );
}

#[test]
fn test_field_comparison_flags_changed_rows() {
    let source = table(1, &[("i-1", "running"), ("i-2", "running")]);
    let target = table(2, &[("i-1", "stopped"), ("i-2", "running")]);

    let keys_only = diff(&source, &target, CompareMode::KeysOnly);
    assert!(keys_only.changed.is_empty());
    assert!(!keys_only.has_changes());

    let fields = diff(&source, &target, CompareMode::Fields);
    assert_eq!(fields.changed.len(), 1);
    assert_eq!(fields.changed["i-1"], vec!["state".to_string()]);
    assert!(fields.is_changed("i-1"));
    // Changed rows are informational; both keys stay common.
    assert_eq!(fields.common, set(&["i-1", "i-2"]));
}
