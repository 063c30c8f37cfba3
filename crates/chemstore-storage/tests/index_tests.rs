use std::collections::BTreeSet;
use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;

use chemstore_schema::catalog::{
    conformer_leaf, conformer_trunk, species_leaf, species_trunk, theory_leaf,
};
use chemstore_schema::{spec, SpecValue, Specifier};
use chemstore_storage::{layout, DirIndex, ExistingMode, StoreError};
use proptest::prelude::*;
use tempfile::tempdir;

const METHANE: &str = "InChI=1S/CH4/h1H4";

fn species_index(prefix: &std::path::Path) -> DirIndex {
    let trunk = Arc::new(species_trunk().unwrap());
    DirIndex::new(Arc::new(species_leaf().unwrap().rooted_under(trunk)), prefix)
}

#[test]
fn methane_singlet_node() {
    let dir = tempdir().unwrap();
    let index = DirIndex::new(Arc::new(species_leaf().unwrap()), dir.path());
    let specs = spec![METHANE, 1];

    let path = index.path(&specs).unwrap();
    assert_eq!(path.strip_prefix(dir.path()).unwrap().components().count(), 4);

    let created = index.create(&specs).unwrap();
    assert_eq!(created, path);

    let fields = index.read_specifier(&path).unwrap();
    assert_eq!(fields.get("inchi"), Some(&SpecValue::from(METHANE)));
    assert_eq!(fields.get("multiplicity"), Some(&SpecValue::from(1)));
}

#[test]
fn two_multiplicities_enumerate_exactly() {
    let dir = tempdir().unwrap();
    let index = species_index(dir.path());
    index.create(&spec![METHANE, 1]).unwrap();
    index.create(&spec![METHANE, 3]).unwrap();

    let found = index.existing(&[], ExistingMode::Strict).unwrap();
    assert_eq!(found, BTreeSet::from([spec![METHANE, 1], spec![METHANE, 3]]));
}

#[test]
fn conformers_under_a_theory_node() {
    let dir = tempdir().unwrap();
    let theory = Arc::new(theory_leaf().unwrap());
    let thy_index = DirIndex::new(theory.clone(), dir.path());
    let thy_specs = spec!["b3lyp", "6-31g*", true];
    let thy_path = thy_index.create(&thy_specs).unwrap();

    let trunk = Arc::new(conformer_trunk().unwrap().rooted_under(theory));
    let leaf = DirIndex::new(
        Arc::new(conformer_leaf().unwrap().rooted_under(trunk)),
        dir.path(),
    );

    let mut c0 = thy_specs.clone();
    c0.push(SpecValue::from("c0"));
    let mut c1 = thy_specs.clone();
    c1.push(SpecValue::from("c1"));

    let p0 = leaf.create(&c0).unwrap();
    let p1 = leaf.create(&c1).unwrap();
    assert_ne!(p0, p1);
    assert!(p0.starts_with(&thy_path));
    assert!(p1.starts_with(&thy_path));

    let found = leaf.existing(&thy_specs, ExistingMode::Strict).unwrap();
    assert_eq!(found, BTreeSet::from([spec!["c0"], spec!["c1"]]));

    // The same nodes through a chain prefixed by the theory node path.
    let chain = layout::conformer(&thy_path).unwrap();
    assert_eq!(chain.leaf().path(&spec!["c0"]).unwrap(), p0);
    assert_eq!(
        chain.leaf().existing(&[], ExistingMode::Strict).unwrap(),
        found
    );
}

#[test]
fn create_is_idempotent() {
    let dir = tempdir().unwrap();
    let index = species_index(dir.path());
    let specs = spec![METHANE, 1];

    let first = index.create(&specs).unwrap();
    let before = fs::read_to_string(first.join("dir.json")).unwrap();
    let second = index.create(&specs).unwrap();
    let after = fs::read_to_string(second.join("dir.json")).unwrap();
    assert_eq!(first, second);
    assert_eq!(before, after);
}

#[test]
fn path_before_create_and_exists_after() {
    let dir = tempdir().unwrap();
    let index = species_index(dir.path());
    let specs = spec![METHANE, 3];

    let path = index.path(&specs).unwrap();
    assert!(!path.exists());
    assert!(!index.exists(&specs).unwrap());
    assert!(index.existing(&[], ExistingMode::Strict).unwrap().is_empty());

    index.create(&specs).unwrap();
    assert!(index.exists(&specs).unwrap());
}

#[test]
fn overwrite_rewrites_specifier_file() {
    let dir = tempdir().unwrap();
    let index = DirIndex::new(Arc::new(theory_leaf().unwrap()), dir.path());
    // Same node, different casing: the directory is shared, the recorded
    // method follows whoever wrote last with overwrite.
    let path = index.create(&spec!["b3lyp", "sto-3g", false]).unwrap();
    index.create(&spec!["B3LYP", "sto-3g", false]).unwrap();
    assert_eq!(
        index.read_specifier(&path).unwrap().get("method"),
        Some(&SpecValue::from("b3lyp"))
    );

    index
        .create_with(&spec!["B3LYP", "sto-3g", false], true)
        .unwrap();
    assert_eq!(
        index.read_specifier(&path).unwrap().get("method"),
        Some(&SpecValue::from("B3LYP"))
    );
}

#[test]
fn bad_values_fail_without_touching_disk() {
    let dir = tempdir().unwrap();
    let index = species_index(dir.path());
    let err = index.create(&spec![METHANE, 0]).unwrap_err();
    assert!(matches!(err, StoreError::Schema(_)));
    let err = index.exists(&spec![METHANE]).unwrap_err();
    assert!(matches!(err, StoreError::Schema(_)));
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn nodes_report_their_paths() {
    let dir = tempdir().unwrap();
    let index = species_index(dir.path());
    let path = index.create(&spec![METHANE, 1]).unwrap();
    let nodes = index.existing_nodes(&[], ExistingMode::Lenient).unwrap();
    assert_eq!(nodes.get(&spec![METHANE, 1]), Some(&path));
    assert_eq!(index.specifier_of(&path).unwrap(), spec![METHANE, 1]);
}

#[test]
fn theory_enumeration_ignores_sibling_trunks() {
    let dir = tempdir().unwrap();
    let spc = layout::species(dir.path()).unwrap();
    let spc_path = spc.leaf().create(&spec![METHANE, 1]).unwrap();

    let thy = layout::theory(&spc_path).unwrap();
    let thy_specs = spec!["b3lyp", "6-31g*", true];
    let thy_path = thy.leaf().create(&thy_specs).unwrap();

    // Trunks of other layouts living in the same species node.
    layout::run(&spc_path)
        .unwrap()
        .leaf()
        .create(&spec!["energy"])
        .unwrap();
    layout::single_point(&spc_path)
        .unwrap()
        .leaf()
        .create(&spec!["mp2", "cc-pvdz", true])
        .unwrap();
    layout::conformer(&spc_path).unwrap().trunk().create(&[]).unwrap();

    let nodes = thy.leaf().existing_nodes(&[], ExistingMode::Strict).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes.get(&thy_specs), Some(&thy_path));
}

#[test]
fn racing_creators_agree_on_one_node() {
    const WRITERS: usize = 8;

    for _ in 0..25 {
        let dir = tempdir().unwrap();
        let chain = layout::conformer(dir.path()).unwrap();
        let leaf = chain.leaf();
        let barrier = Barrier::new(WRITERS);

        let results: Vec<_> = thread::scope(|scope| {
            let handles: Vec<_> = (0..WRITERS)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        leaf.create(&spec!["c0"])
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let expected = leaf.path(&spec!["c0"]).unwrap();
        for result in results {
            assert_eq!(result.unwrap(), expected);
        }

        let fields = leaf.read_specifier(&expected).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get("conformer_id"), Some(&SpecValue::from("c0")));

        let names: Vec<String> = fs::read_dir(&expected)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["dir.json"]);
    }
}

#[test]
fn racing_overwrites_leave_one_writers_content() {
    const WRITERS: usize = 8;

    let dir = tempdir().unwrap();
    let index = DirIndex::new(Arc::new(theory_leaf().unwrap()), dir.path());
    let spellings = ["b3lyp", "B3LYP", "B3lyp", "b3LYP"];
    let barrier = Barrier::new(WRITERS);

    let paths: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let index = &index;
                let barrier = &barrier;
                let method = spellings[i % spellings.len()];
                scope.spawn(move || {
                    barrier.wait();
                    index.create_with(&spec![method, "sto-3g", false], true)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap().unwrap())
            .collect()
    });
    assert!(paths.windows(2).all(|w| w[0] == w[1]));

    let fields = index.read_specifier(&paths[0]).unwrap();
    let method = fields.get("method").and_then(SpecValue::as_str).unwrap();
    assert!(spellings.contains(&method));
    assert_eq!(fields.get("basis"), Some(&SpecValue::from("sto-3g")));
}

fn conformer_ids() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::btree_set("c[0-9]{1,3}", 1..8)
        .prop_map(|ids| ids.into_iter().collect())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn enumeration_matches_creations_in_any_order(ids in conformer_ids(), seed in any::<u64>()) {
        let dir = tempdir().unwrap();
        let chain = layout::conformer(dir.path()).unwrap();

        let mut order = ids.clone();
        // Deterministic shuffle from the seed.
        let len = order.len();
        for i in 0..len {
            let j = (seed.rotate_left(i as u32) as usize) % len;
            order.swap(i, j);
        }
        for id in &order {
            chain.leaf().create(&spec![id.as_str()]).unwrap();
        }

        let found = chain.leaf().existing(&[], ExistingMode::Strict).unwrap();
        let expected: BTreeSet<Specifier> = ids.iter().map(|id| spec![id.as_str()]).collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn round_trip_recovers_projections(mult in 1i64..7, cid in "c[0-9]{1,2}") {
        let dir = tempdir().unwrap();
        let index = species_index(dir.path());
        let specs = spec![METHANE, mult];
        let path = index.create(&specs).unwrap();
        let fields = index.read_specifier(&path).unwrap();
        let projected = index.schema().spec_file().unwrap().project(&specs);
        let read: Vec<_> = fields.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        prop_assert_eq!(read, projected);

        let cnf = layout::conformer(&path).unwrap();
        let cnf_path = cnf.leaf().create(&spec![cid.as_str()]).unwrap();
        prop_assert!(cnf_path.starts_with(&path));
    }
}
