//! Cross-crate properties of planning and reconciliation.

use camino::Utf8PathBuf;
use chrono::{DateTime, Duration, Utc};
use mg_core::{FileEntry, FxHashSet, InventoryConfig, MasterDedupRow, fx_hash_set};
use mg_inventory::{InventoryParser, TargetResolver, read_master_csv};
use mg_planner::{DedupPlanner, MasterDeduplicator};

const INVENTORY: &str = "\
| path | size | modified |
|------|------|----------|
| src/App.js | 100 | 2024-01-01 10:00:00 |
| src/App.jsx | 110 | 2024-01-02 10:00:00 |
| src/App.tsx | 140 | 2024-02-01 10:00:00 |
| src/widgets/Widget.jsx | 80 | 2024-01-01 10:00:00 |
| src/widgets/Widget.jsx | 80 | 2024-03-01 10:00:00 |
| src/charts/Chart.test.jsx | 40 | 2024-01-01 10:00:00 |
| src/charts/Chart.jsx | 60 | not a date |
| lib/server.mjs | 500 | 2024-01-01T08:30 |
| lib/legacy.cjs | 0 | 2024-01-01 |
| node_modules/react/index.js | 900 | 2024-01-01 |
| src/__tests__/Form.js | 30 | 2024-01-01 |
| src/forms/Form.ts | 33 | 2024-01-01 |
| README.md | 10 | 2024-01-01 |
garbage line without pipes
";

fn entries() -> Vec<FileEntry> {
    let config = InventoryConfig::default();
    InventoryParser::new(&config).parse(INVENTORY)
}

fn set(paths: &[Utf8PathBuf]) -> FxHashSet<&str> {
    let mut out = fx_hash_set();
    out.extend(paths.iter().map(|p| p.as_str()));
    out
}

#[test]
fn test_lists_are_disjoint_and_cover_survivors() {
    let entries = entries();
    let plan = DedupPlanner::new()
        .plan(&entries, 1, Some(r"(^|/)node_modules/"), false)
        .unwrap();

    let lists = [
        set(&plan.keep_typed),
        set(&plan.drop_already_converted),
        set(&plan.convert_candidates),
        set(&plan.tests_skipped),
    ];
    for (i, a) in lists.iter().enumerate() {
        for b in &lists[i + 1..] {
            assert!(a.is_disjoint(b), "{a:?} overlaps {b:?}");
        }
    }

    let resolver = TargetResolver::new();
    let mut survivors: Vec<&str> = entries
        .iter()
        .filter(|e| e.size >= 1 && !e.path.as_str().starts_with("node_modules/"))
        .filter(|e| TargetResolver::is_typed(&e.extension) || resolver.is_legacy(&e.extension))
        .map(|e| e.path.as_str())
        .collect();
    survivors.sort_unstable();
    survivors.dedup();

    let mut union: Vec<&str> = lists.iter().flatten().copied().collect();
    union.sort_unstable();
    assert_eq!(union, survivors);
    assert_eq!(plan.counts.total, survivors.len());
}

#[test]
fn test_inventory_plan_outcome() {
    let plan = DedupPlanner::new()
        .plan(&entries(), 1, Some(r"(^|/)node_modules/"), false)
        .unwrap();

    let keep: Vec<&str> = plan.keep_typed.iter().map(|p| p.as_str()).collect();
    let drop: Vec<&str> = plan.drop_already_converted.iter().map(|p| p.as_str()).collect();
    let convert: Vec<&str> = plan.convert_candidates.iter().map(|p| p.as_str()).collect();
    let skipped: Vec<&str> = plan.tests_skipped.iter().map(|p| p.as_str()).collect();

    assert_eq!(keep, vec!["src/App.tsx", "src/forms/Form.ts"]);
    assert_eq!(drop, vec!["src/App.js", "src/App.jsx", "src/__tests__/Form.js"]);
    assert_eq!(
        convert,
        vec!["lib/server.mjs", "src/charts/Chart.jsx", "src/widgets/Widget.jsx"]
    );
    assert_eq!(skipped, vec!["src/charts/Chart.test.jsx"]);

    let server = plan
        .targets
        .iter()
        .find(|t| t.source.as_str() == "lib/server.mjs")
        .unwrap();
    assert_eq!(server.target.as_str(), "lib/server.mts");
}

#[test]
fn test_plan_is_idempotent() {
    let entries = entries();
    let planner = DedupPlanner::new();
    let first = planner.plan(&entries, 0, None, true).unwrap();
    let second = planner.plan(&entries, 0, None, true).unwrap();
    assert_eq!(first, second);

    let mut reversed = entries;
    reversed.reverse();
    let third = planner.plan(&reversed, 0, None, true).unwrap();
    assert_eq!(first, third);
}

#[test]
fn test_large_synthetic_inventory_is_order_independent() {
    let entries: Vec<FileEntry> = (0..2_000)
        .map(|i| {
            let ext = ["js", "jsx", "ts", "tsx"][i % 4];
            FileEntry::new(
                format!("pkg{}/mod{}.{ext}", i % 13, i % 157),
                (i % 5) as u64,
                DateTime::<Utc>::UNIX_EPOCH + Duration::hours((i % 9) as i64),
            )
        })
        .collect();

    let planner = DedupPlanner::new();
    let forward = planner.plan(&entries, 0, None, false).unwrap();
    let mut shuffled = entries.clone();
    shuffled.rotate_left(777);
    let rotated = planner.plan(&shuffled, 0, None, false).unwrap();
    assert_eq!(forward, rotated);
}

#[test]
fn test_master_csv_precedence() {
    let csv = "\
root,abs_path,rel_path,base_name,ext,size,mtime
/mnt/b,/mnt/b/src/App.js,src/App.js,App.js,.js,120,1700000000
/mnt/a,/mnt/a/SRC/app.js,SRC\\app.js,app.js,.js,120,1700000100
/mnt/c,/mnt/c/src/util.js,src/util.js,util.js,.js,9,1700000000
";
    let rows: Vec<MasterDedupRow> = read_master_csv(csv.as_bytes()).unwrap();
    let dedup = MasterDeduplicator::new(vec!["/mnt/a".to_owned(), "/mnt/b".to_owned()]).unwrap();
    let outcome = dedup.reconcile(rows);

    assert_eq!(outcome.kept.len(), 2);
    assert_eq!(outcome.kept[0].root, "/mnt/a");
    assert_eq!(outcome.kept[1].root, "/mnt/c");
    assert_eq!(outcome.discarded.len(), 1);
    assert_eq!(outcome.discarded[0].row.root, "/mnt/b");
    assert_eq!(
        outcome.discarded[0].kept_abs_path.as_str(),
        "/mnt/a/SRC/app.js"
    );
}
