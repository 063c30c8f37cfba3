//! The schema catalog: every entity type's addressing contract.
//!
//! | schema               | key                                   | arity -> depth |
//! |----------------------|---------------------------------------|----------------|
//! | `species_trunk`      |                                       | 0 -> 1         |
//! | `species_leaf`       | (inchi, multiplicity)                 | 2 -> 4         |
//! | `theory_leaf`        | (method, basis, orb_restricted)       | 3 -> 1         |
//! | `run_trunk`          |                                       | 0 -> 1         |
//! | `run_leaf`           | (job)                                 | 1 -> 1         |
//! | `conformer_trunk`    |                                       | 0 -> 1         |
//! | `conformer_leaf`     | (conformer_id)                        | 1 -> 1         |
//! | `scan_trunk`         |                                       | 0 -> 1         |
//! | `scan_branch`        | (tors_names)                          | 1 -> 1         |
//! | `scan_leaf`          | (grid_idxs)                           | 1 -> 1         |
//! | `single_point_trunk` |                                       | 0 -> 1         |
//! | `single_point_leaf`  | (method, basis, orb_restricted)       | 3 -> 1         |
//!
//! Every factory returns a parentless schema. Hierarchies are assembled by
//! rooting one schema under another with [`Schema::rooted_under`] or
//! [`SchemaBuilder::parent`](crate::schema::SchemaBuilder::parent).

use std::sync::Arc;

use crate::error::SchemaResult;
use crate::schema::Schema;
use crate::token::{check_plain_name, letter_block, short_code};
use crate::value::{SpecValue, ValueKind};

/// Width of the species token derived from the InChI main layer.
pub const SPECIES_MAIN_BLOCK_LEN: usize = 14;
/// Width of the species token derived from the full InChI.
pub const SPECIES_FULL_BLOCK_LEN: usize = 10;
/// Width of each method/basis code in a theory segment.
pub const THEORY_CODE_LEN: usize = 5;

/// Handle for a catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SchemaKind {
    SpeciesTrunk,
    SpeciesLeaf,
    TheoryLeaf,
    RunTrunk,
    RunLeaf,
    ConformerTrunk,
    ConformerLeaf,
    ScanTrunk,
    ScanBranch,
    ScanLeaf,
    SinglePointTrunk,
    SinglePointLeaf,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 12] = [
        SchemaKind::SpeciesTrunk,
        SchemaKind::SpeciesLeaf,
        SchemaKind::TheoryLeaf,
        SchemaKind::RunTrunk,
        SchemaKind::RunLeaf,
        SchemaKind::ConformerTrunk,
        SchemaKind::ConformerLeaf,
        SchemaKind::ScanTrunk,
        SchemaKind::ScanBranch,
        SchemaKind::ScanLeaf,
        SchemaKind::SinglePointTrunk,
        SchemaKind::SinglePointLeaf,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::SpeciesTrunk => "species_trunk",
            SchemaKind::SpeciesLeaf => "species_leaf",
            SchemaKind::TheoryLeaf => "theory_leaf",
            SchemaKind::RunTrunk => "run_trunk",
            SchemaKind::RunLeaf => "run_leaf",
            SchemaKind::ConformerTrunk => "conformer_trunk",
            SchemaKind::ConformerLeaf => "conformer_leaf",
            SchemaKind::ScanTrunk => "scan_trunk",
            SchemaKind::ScanBranch => "scan_branch",
            SchemaKind::ScanLeaf => "scan_leaf",
            SchemaKind::SinglePointTrunk => "single_point_trunk",
            SchemaKind::SinglePointLeaf => "single_point_leaf",
        }
    }

    /// Build the descriptor for this kind.
    pub fn build(self) -> SchemaResult<Schema> {
        match self {
            SchemaKind::SpeciesTrunk => species_trunk(),
            SchemaKind::SpeciesLeaf => species_leaf(),
            SchemaKind::TheoryLeaf => theory_leaf(),
            SchemaKind::RunTrunk => run_trunk(),
            SchemaKind::RunLeaf => run_leaf(),
            SchemaKind::ConformerTrunk => conformer_trunk(),
            SchemaKind::ConformerLeaf => conformer_leaf(),
            SchemaKind::ScanTrunk => scan_trunk(),
            SchemaKind::ScanBranch => scan_branch(),
            SchemaKind::ScanLeaf => scan_leaf(),
            SchemaKind::SinglePointTrunk => single_point_trunk(),
            SchemaKind::SinglePointLeaf => single_point_leaf(),
        }
    }
}

/// Registry of every schema descriptor, built eagerly.
#[derive(Debug, Clone)]
pub struct Catalog {
    schemas: Vec<Arc<Schema>>,
}

impl Catalog {
    /// Build every entry of [`SchemaKind::ALL`].
    pub fn standard() -> SchemaResult<Self> {
        let schemas = SchemaKind::ALL
            .iter()
            .map(|kind| kind.build().map(Arc::new))
            .collect::<SchemaResult<Vec<_>>>()?;
        Ok(Self { schemas })
    }

    pub fn get(&self, kind: SchemaKind) -> &Arc<Schema> {
        // `schemas` is built in `SchemaKind::ALL` order, which is declaration order.
        &self.schemas[kind as usize]
    }

    pub fn by_name(&self, name: &str) -> Option<&Arc<Schema>> {
        self.schemas.iter().find(|s| s.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SchemaKind, &Arc<Schema>)> {
        SchemaKind::ALL.iter().copied().zip(self.schemas.iter())
    }
}

// ============================================================================
// Trunks
// ============================================================================

fn species_trunk_segments(_: &[SpecValue]) -> Result<Vec<String>, String> {
    Ok(vec!["SPC".to_string()])
}

fn run_trunk_segments(_: &[SpecValue]) -> Result<Vec<String>, String> {
    Ok(vec!["RUN".to_string()])
}

fn conformer_trunk_segments(_: &[SpecValue]) -> Result<Vec<String>, String> {
    Ok(vec!["CONFS".to_string()])
}

fn scan_trunk_segments(_: &[SpecValue]) -> Result<Vec<String>, String> {
    Ok(vec!["SCANS".to_string()])
}

fn single_point_trunk_segments(_: &[SpecValue]) -> Result<Vec<String>, String> {
    Ok(vec!["SP".to_string()])
}

pub fn species_trunk() -> SchemaResult<Schema> {
    Schema::builder("species_trunk")
        .arity(0)
        .depth(1)
        .encode(species_trunk_segments)
        .build()
}

pub fn run_trunk() -> SchemaResult<Schema> {
    Schema::builder("run_trunk")
        .arity(0)
        .depth(1)
        .encode(run_trunk_segments)
        .build()
}

pub fn conformer_trunk() -> SchemaResult<Schema> {
    Schema::builder("conformer_trunk")
        .arity(0)
        .depth(1)
        .encode(conformer_trunk_segments)
        .build()
}

pub fn scan_trunk() -> SchemaResult<Schema> {
    Schema::builder("scan_trunk")
        .arity(0)
        .depth(1)
        .encode(scan_trunk_segments)
        .build()
}

pub fn single_point_trunk() -> SchemaResult<Schema> {
    Schema::builder("single_point_trunk")
        .arity(0)
        .depth(1)
        .encode(single_point_trunk_segments)
        .build()
}

// ============================================================================
// Species
// ============================================================================

/// The pieces of an InChI string a species directory is derived from.
struct InchiLayers<'a> {
    formula: &'a str,
    /// Formula plus connectivity and hydrogen layers.
    main: String,
}

fn parse_inchi(inchi: &str) -> Result<InchiLayers<'_>, String> {
    let body = inchi
        .strip_prefix("InChI=")
        .ok_or_else(|| format!("`{inchi}` is not an InChI string"))?;
    let mut layers = body.split('/');
    if layers.next().map_or(true, str::is_empty) {
        return Err(format!("`{inchi}` has no version layer"));
    }
    let formula = layers
        .next()
        .filter(|f| !f.is_empty())
        .ok_or_else(|| format!("`{inchi}` has no formula layer"))?;
    if let Some(c) = formula
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '.'))
    {
        return Err(format!("formula layer `{formula}` contains {c:?}"));
    }

    let mut main = formula.to_string();
    for layer in layers.take_while(|l| l.starts_with('c') || l.starts_with('h')) {
        main.push('/');
        main.push_str(layer);
    }
    Ok(InchiLayers { formula, main })
}

fn species_leaf_segments(specs: &[SpecValue]) -> Result<Vec<String>, String> {
    let inchi = str_at(specs, 0)?;
    let mult = int_at(specs, 1)?;
    if mult < 1 {
        return Err(format!("multiplicity must be positive, got {mult}"));
    }
    let layers = parse_inchi(inchi)?;
    Ok(vec![
        layers.formula.to_string(),
        letter_block(&layers.main, SPECIES_MAIN_BLOCK_LEN),
        mult.to_string(),
        letter_block(inchi, SPECIES_FULL_BLOCK_LEN),
    ])
}

fn species_formula(specs: &[SpecValue]) -> SpecValue {
    let formula = specs
        .first()
        .and_then(SpecValue::as_str)
        .and_then(|inchi| parse_inchi(inchi).ok())
        .map(|layers| layers.formula.to_string())
        .unwrap_or_default();
    SpecValue::Str(formula)
}

pub fn species_leaf() -> SchemaResult<Schema> {
    Schema::builder("species_leaf")
        .arity(2)
        .signature(&[ValueKind::Str, ValueKind::Int])
        .depth(4)
        .encode(species_leaf_segments)
        .project("inchi", first)
        .project("formula", species_formula)
        .project("multiplicity", second)
        .key_fields(&["inchi", "multiplicity"])
        .build()
}

// ============================================================================
// Theory levels
// ============================================================================

/// `R`/`U` followed by short codes of the lowercased method and basis.
///
/// Case is folded: `B3LYP` and `b3lyp` address the same level of theory.
fn theory_segments(specs: &[SpecValue]) -> Result<Vec<String>, String> {
    let method = str_at(specs, 0)?;
    let basis = str_at(specs, 1)?;
    let restricted = bool_at(specs, 2)?;
    if method.trim().is_empty() {
        return Err("method is empty".to_string());
    }
    if basis.trim().is_empty() {
        return Err("basis is empty".to_string());
    }
    let orb = if restricted { 'R' } else { 'U' };
    Ok(vec![format!(
        "{orb}{}{}",
        short_code(&method.to_lowercase(), THEORY_CODE_LEN),
        short_code(&basis.to_lowercase(), THEORY_CODE_LEN)
    )])
}

/// Theory nodes share their directory with sibling trunks (`CONFS`, `RUN`,
/// `SP`, ...); only `R`/`U` plus two lowercase codes can be one of them.
fn theory_candidate(names: &[&str]) -> bool {
    let Some(rest) = names
        .first()
        .and_then(|n| n.strip_prefix('R').or_else(|| n.strip_prefix('U')))
    else {
        return false;
    };
    rest.len() == 2 * THEORY_CODE_LEN
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
}

const THEORY_SIGNATURE: &[ValueKind] = &[ValueKind::Str, ValueKind::Str, ValueKind::Bool];

pub fn theory_leaf() -> SchemaResult<Schema> {
    Schema::builder("theory_leaf")
        .arity(3)
        .signature(THEORY_SIGNATURE)
        .encode(theory_segments)
        .candidate(theory_candidate)
        .project("method", first)
        .project("basis", second)
        .project("orb_restricted", third)
        .key_fields(&["method", "basis", "orb_restricted"])
        .build()
}

pub fn single_point_leaf() -> SchemaResult<Schema> {
    Schema::builder("single_point_leaf")
        .arity(3)
        .signature(THEORY_SIGNATURE)
        .encode(theory_segments)
        .candidate(theory_candidate)
        .project("method", first)
        .project("basis", second)
        .project("orb_restricted", third)
        .key_fields(&["method", "basis", "orb_restricted"])
        .build()
}

// ============================================================================
// Runs and conformers
// ============================================================================

fn run_leaf_segments(specs: &[SpecValue]) -> Result<Vec<String>, String> {
    let job = str_at(specs, 0)?;
    check_plain_name("job", job)?;
    Ok(vec![job.to_string()])
}

pub fn run_leaf() -> SchemaResult<Schema> {
    Schema::builder("run_leaf")
        .arity(1)
        .signature(&[ValueKind::Str])
        .encode(run_leaf_segments)
        .project("job", first)
        .key_fields(&["job"])
        .build()
}

fn conformer_leaf_segments(specs: &[SpecValue]) -> Result<Vec<String>, String> {
    let cid = str_at(specs, 0)?;
    check_plain_name("conformer id", cid)?;
    Ok(vec![cid.to_string()])
}

pub fn conformer_leaf() -> SchemaResult<Schema> {
    Schema::builder("conformer_leaf")
        .arity(1)
        .signature(&[ValueKind::Str])
        .encode(conformer_leaf_segments)
        .project("conformer_id", first)
        .key_fields(&["conformer_id"])
        .build()
}

// ============================================================================
// Scans
// ============================================================================

/// Torsion names joined with `_`; names must be alphanumeric so the join is
/// unambiguous.
fn scan_branch_segments(specs: &[SpecValue]) -> Result<Vec<String>, String> {
    let names = specs
        .first()
        .and_then(SpecValue::as_str_list)
        .ok_or("expected a list of torsion names")?;
    if names.is_empty() {
        return Err("no torsion names".to_string());
    }
    for name in names {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("torsion name `{name}` must be non-empty and alphanumeric"));
        }
    }
    Ok(vec![names.join("_")])
}

pub fn scan_branch() -> SchemaResult<Schema> {
    Schema::builder("scan_branch")
        .arity(1)
        .signature(&[ValueKind::StrList])
        .encode(scan_branch_segments)
        .project("tors_names", first)
        .key_fields(&["tors_names"])
        .build()
}

/// Grid indices joined with `-`; indices must be non-negative.
fn scan_leaf_segments(specs: &[SpecValue]) -> Result<Vec<String>, String> {
    let idxs = specs
        .first()
        .and_then(SpecValue::as_int_list)
        .ok_or("expected a list of grid indices")?;
    if idxs.is_empty() {
        return Err("no grid indices".to_string());
    }
    if let Some(idx) = idxs.iter().find(|i| **i < 0) {
        return Err(format!("grid index {idx} is negative"));
    }
    let parts: Vec<String> = idxs.iter().map(|i| i.to_string()).collect();
    Ok(vec![parts.join("-")])
}

pub fn scan_leaf() -> SchemaResult<Schema> {
    Schema::builder("scan_leaf")
        .arity(1)
        .signature(&[ValueKind::IntList])
        .encode(scan_leaf_segments)
        .project("grid_idxs", first)
        .key_fields(&["grid_idxs"])
        .build()
}

// ============================================================================
// Helpers
// ============================================================================

fn first(specs: &[SpecValue]) -> SpecValue {
    specs[0].clone()
}

fn second(specs: &[SpecValue]) -> SpecValue {
    specs[1].clone()
}

fn third(specs: &[SpecValue]) -> SpecValue {
    specs[2].clone()
}

fn str_at(specs: &[SpecValue], i: usize) -> Result<&str, String> {
    specs
        .get(i)
        .and_then(SpecValue::as_str)
        .ok_or_else(|| format!("value {i} is not a string"))
}

fn int_at(specs: &[SpecValue], i: usize) -> Result<i64, String> {
    specs
        .get(i)
        .and_then(SpecValue::as_int)
        .ok_or_else(|| format!("value {i} is not an integer"))
}

fn bool_at(specs: &[SpecValue], i: usize) -> Result<bool, String> {
    specs
        .get(i)
        .and_then(SpecValue::as_bool)
        .ok_or_else(|| format!("value {i} is not a boolean"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::segments;
    use crate::error::SchemaError;
    use crate::spec;

    fn catalog() -> Catalog {
        Catalog::standard().unwrap()
    }

    #[test]
    fn arities_and_depths() {
        let expected = [
            (SchemaKind::SpeciesTrunk, 0, 1),
            (SchemaKind::SpeciesLeaf, 2, 4),
            (SchemaKind::TheoryLeaf, 3, 1),
            (SchemaKind::RunTrunk, 0, 1),
            (SchemaKind::RunLeaf, 1, 1),
            (SchemaKind::ConformerTrunk, 0, 1),
            (SchemaKind::ConformerLeaf, 1, 1),
            (SchemaKind::ScanTrunk, 0, 1),
            (SchemaKind::ScanBranch, 1, 1),
            (SchemaKind::ScanLeaf, 1, 1),
            (SchemaKind::SinglePointTrunk, 0, 1),
            (SchemaKind::SinglePointLeaf, 3, 1),
        ];
        let catalog = catalog();
        for (kind, arity, depth) in expected {
            let schema = catalog.get(kind);
            assert_eq!(schema.name(), kind.name());
            assert_eq!(schema.arity(), arity, "{}", kind.name());
            assert_eq!(schema.depth(), depth, "{}", kind.name());
            assert_eq!(schema.spec_file().is_some(), arity > 0, "{}", kind.name());
        }
    }

    #[test]
    fn lookup_by_name() {
        let catalog = catalog();
        assert_eq!(
            catalog.by_name("scan_branch").map(|s| s.arity()),
            Some(1)
        );
        assert!(catalog.by_name("nope").is_none());
        assert_eq!(catalog.iter().count(), SchemaKind::ALL.len());
    }

    #[test]
    fn methane_species_segments() {
        let schema = species_leaf().unwrap();
        let segs = segments(&schema, &spec!["InChI=1S/CH4/h1H4", 1]).unwrap();
        assert_eq!(segs.len(), 4);
        assert_eq!(segs[0], "CH4");
        assert_eq!(segs[1].len(), SPECIES_MAIN_BLOCK_LEN);
        assert_eq!(segs[2], "1");
        assert_eq!(segs[3].len(), SPECIES_FULL_BLOCK_LEN);
    }

    #[test]
    fn multiplicity_separates_species() {
        let schema = species_leaf().unwrap();
        let singlet = segments(&schema, &spec!["InChI=1S/CH4/h1H4", 1]).unwrap();
        let triplet = segments(&schema, &spec!["InChI=1S/CH4/h1H4", 3]).unwrap();
        assert_ne!(singlet, triplet);
        assert_eq!(singlet[..2], triplet[..2]);
    }

    #[test]
    fn stereo_layers_only_change_the_full_block() {
        let schema = species_leaf().unwrap();
        let a = segments(
            &schema,
            &spec!["InChI=1S/C4H8/c1-3-4-2/h3-4H,1-2H3/b4-3+", 1],
        )
        .unwrap();
        let b = segments(
            &schema,
            &spec!["InChI=1S/C4H8/c1-3-4-2/h3-4H,1-2H3/b4-3-", 1],
        )
        .unwrap();
        assert_eq!(a[1], b[1]);
        assert_ne!(a[3], b[3]);
    }

    #[test]
    fn bad_species_values() {
        let schema = species_leaf().unwrap();
        for specs in [
            spec!["CH4", 1],
            spec!["InChI=1S/", 1],
            spec!["InChI=1S/CH4/h1H4", 0],
        ] {
            let err = segments(&schema, &specs).unwrap_err();
            assert!(matches!(err, SchemaError::Encoding { .. }), "{err}");
        }
    }

    #[test]
    fn species_formula_projection() {
        let schema = species_leaf().unwrap();
        let fields = schema
            .spec_file()
            .unwrap()
            .project(&spec!["InChI=1S/CH4/h1H4", 1]);
        assert_eq!(
            fields,
            vec![
                ("inchi".to_string(), SpecValue::from("InChI=1S/CH4/h1H4")),
                ("formula".to_string(), SpecValue::from("CH4")),
                ("multiplicity".to_string(), SpecValue::from(1)),
            ]
        );
    }

    #[test]
    fn theory_code_folds_case() {
        let schema = theory_leaf().unwrap();
        let a = segments(&schema, &spec!["b3lyp", "6-31g*", true]).unwrap();
        let b = segments(&schema, &spec!["B3LYP", "6-31G*", true]).unwrap();
        let u = segments(&schema, &spec!["b3lyp", "6-31g*", false]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, u);
        assert!(a[0].starts_with('R'));
        assert!(u[0].starts_with('U'));
        assert_eq!(a[0].len(), 1 + 2 * THEORY_CODE_LEN);
    }

    #[test]
    fn theory_nodes_are_told_apart_from_sibling_trunks() {
        let schema = theory_leaf().unwrap();
        let seg = segments(&schema, &spec!["ccsd(t)", "cc-pvtz", false]).unwrap();
        let name = seg[0].as_str();
        assert!(schema.could_be_node(&[name]));
        for trunk in ["RUN", "SP", "CONFS", "SCANS", "Rshort"] {
            assert!(!schema.could_be_node(&[trunk]), "{trunk}");
        }
        assert!(!single_point_leaf().unwrap().could_be_node(&["RUN"]));
        assert!(species_leaf().unwrap().could_be_node(&["CH4", "X", "1", "Y"]));
    }

    #[test]
    fn scan_segments() {
        let branch = scan_branch().unwrap();
        let leaf = scan_leaf().unwrap();
        assert_eq!(
            segments(&branch, &spec![vec!["D5", "D8"]]).unwrap(),
            vec!["D5_D8"]
        );
        assert_eq!(
            segments(&leaf, &spec![vec![0i64, 12]]).unwrap(),
            vec!["0-12"]
        );
        assert!(segments(&branch, &spec![vec!["D_5"]]).is_err());
        assert!(segments(&leaf, &spec![vec![-1i64]]).is_err());
        assert!(segments(&leaf, &spec![Vec::<i64>::new()]).is_err());
    }

    #[test]
    fn run_and_conformer_names_are_verbatim() {
        assert_eq!(
            segments(&run_leaf().unwrap(), &spec!["energy"]).unwrap(),
            vec!["energy"]
        );
        assert_eq!(
            segments(&conformer_leaf().unwrap(), &spec!["c0"]).unwrap(),
            vec!["c0"]
        );
        assert!(segments(&conformer_leaf().unwrap(), &spec!["c 0"]).is_err());
    }
}
