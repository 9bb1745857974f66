//! # Aggregation of Normalized Source Tables
//!
//! ## Aim
//! Fold any number of normalized source tables into one wide table: one
//! row per (ParentID, MetaboliteKey), one 0/1 flag column per source, the
//! structures each source contributed, and Markush/group annotations
//! merged across sources. The extended variant additionally elects a
//! consensus structure per row and derives molecular formula and [M+H]+
//! mass from it.
//!
//! ## Main Data Structures
//! - `AggregatedRow` / `AggregatedTable`: the wide outer-join result.
//! - `Derived`: formula and mass when a consensus structure exists, or the
//!   incompatible-structure marker when the contributing sources disagree
//!   beyond repair or contributed no structure at all.

use crate::Adapters::records::SourceTable;
use crate::Normalizer::molprops::{molecular_properties, INCOMPATIBLE_STRUCTURE};
use log::warn;
use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Derived chemistry for one aggregated row. `Incompatible` marks rows
/// whose consensus structure is absent or does not survive property
/// calculation; both display columns then carry the marker string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Derived {
    Props { formula: String, mass_mh: f64 },
    Incompatible,
}

impl Derived {
    pub fn formula_display(&self) -> String {
        match self {
            Derived::Props { formula, .. } => formula.clone(),
            Derived::Incompatible => INCOMPATIBLE_STRUCTURE.to_string(),
        }
    }

    pub fn mass_display(&self) -> String {
        match self {
            Derived::Props { mass_mh, .. } => format!("{:.4}", mass_mh),
            Derived::Incompatible => INCOMPATIBLE_STRUCTURE.to_string(),
        }
    }
}

/// One row of the wide table. `flags` maps source name to 0/1; after
/// aggregation every row carries an entry for every participating source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedRow {
    pub parent_id: String,
    pub metabolite_key: String,
    pub flags: BTreeMap<String, u8>,
    /// (source, clean structure) pairs, join order, unique
    pub structures: Vec<(String, String)>,
    pub metabolite_group: Option<String>,
    pub markush: bool,
    pub consensus_structure: Option<String>,
    pub derived: Option<Derived>,
}

impl AggregatedRow {
    fn new(parent_id: &str, metabolite_key: &str) -> Self {
        AggregatedRow {
            parent_id: parent_id.to_string(),
            metabolite_key: metabolite_key.to_string(),
            flags: BTreeMap::new(),
            structures: Vec::new(),
            metabolite_group: None,
            markush: false,
            consensus_structure: None,
            derived: None,
        }
    }

    /// Flag value for one source; sources that never saw the row read 0.
    pub fn flag(&self, source: &str) -> u8 {
        self.flags.get(source).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedTable {
    /// flag columns in join order
    pub sources: Vec<String>,
    pub rows: Vec<AggregatedRow>,
}

impl AggregatedTable {
    pub fn get(&self, parent_id: &str, metabolite_key: &str) -> Option<&AggregatedRow> {
        self.rows
            .iter()
            .find(|r| r.parent_id == parent_id && r.metabolite_key == metabolite_key)
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Re-export the wide table as per-source tables. Aggregating the
    /// result again reproduces the same row set, which is what makes the
    /// fold order immaterial.
    pub fn to_source_tables(&self) -> Vec<SourceTable> {
        use crate::Adapters::records::MetaboliteRecord;
        let mut tables: Vec<SourceTable> =
            self.sources.iter().map(|s| SourceTable::new(s)).collect();
        for row in &self.rows {
            for (i, source) in self.sources.iter().enumerate() {
                if row.flag(source) == 0 {
                    continue;
                }
                let clean = row
                    .structures
                    .iter()
                    .find(|(s, _)| s == source)
                    .map(|(_, structure)| structure.clone());
                let mut record = MetaboliteRecord::new(
                    row.parent_id.clone(),
                    row.metabolite_key.clone(),
                    clean,
                );
                record.metabolite_group = row.metabolite_group.clone();
                record.markush = row.markush;
                tables[i].push(record);
            }
        }
        tables
    }

    /// Console rendering of the wide table.
    pub fn pretty_print(&self) {
        let mut table = Table::new();
        let mut header = row!["ParentID", "MetaboliteKey"];
        for source in &self.sources {
            header.add_cell(prettytable::Cell::new(source));
        }
        header.add_cell(prettytable::Cell::new("Consensus"));
        header.add_cell(prettytable::Cell::new("Formula"));
        header.add_cell(prettytable::Cell::new("[M+H]+"));
        table.add_row(header);
        for r in &self.rows {
            let mut cells = row![r.parent_id, r.metabolite_key];
            for source in &self.sources {
                cells.add_cell(prettytable::Cell::new(&r.flag(source).to_string()));
            }
            cells.add_cell(prettytable::Cell::new(
                r.consensus_structure.as_deref().unwrap_or(""),
            ));
            let (formula, mass) = match &r.derived {
                Some(d) => (d.formula_display(), d.mass_display()),
                None => (String::new(), String::new()),
            };
            cells.add_cell(prettytable::Cell::new(&formula));
            cells.add_cell(prettytable::Cell::new(&mass));
            table.add_row(cells);
        }
        table.printstd();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn merge_source(
    rows: &mut Vec<AggregatedRow>,
    index: &mut HashMap<(String, String), usize>,
    table: &SourceTable,
) {
    for record in &table.rows {
        let key = (record.parent_id.clone(), record.metabolite_key.clone());
        let at = *index.entry(key).or_insert_with(|| {
            rows.push(AggregatedRow::new(&record.parent_id, &record.metabolite_key));
            rows.len() - 1
        });
        let row = &mut rows[at];
        row.flags.insert(table.source.clone(), 1);
        if let Some(clean) = &record.clean_structure {
            let pair = (table.source.clone(), clean.clone());
            if !row.structures.contains(&pair) {
                row.structures.push(pair);
            }
        }
        if row.metabolite_group.is_none() {
            row.metabolite_group = record.metabolite_group.clone();
        }
        row.markush |= record.markush;
    }
}

/// Majority vote over the structures the sources contributed; ties go to
/// the structure first contributed in join order.
fn consensus_structure(structures: &[(String, String)]) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for (_, structure) in structures {
        match counts.iter_mut().find(|(s, _)| s == structure) {
            Some((_, n)) => *n += 1,
            None => counts.push((structure, 1)),
        }
    }
    // keep the first maximum: max_by_key would return the last one on ties
    let mut best: Option<(&str, usize)> = None;
    for (structure, n) in counts {
        if best.is_none_or(|(_, best_n)| n > best_n) {
            best = Some((structure, n));
        }
    }
    best.map(|(s, _)| s.to_string())
}

/// Outer-join fold over the source tables. Requires at least two tables;
/// with fewer there is nothing to compare and the call returns `None` with
/// a warning. Every row of the result carries a 0/1 flag for every source.
pub fn aggregate(tables: &[SourceTable]) -> Option<AggregatedTable> {
    if tables.len() < 2 {
        warn!(
            "aggregation needs at least two source tables, got {}",
            tables.len()
        );
        return None;
    }
    let mut rows: Vec<AggregatedRow> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for table in tables {
        merge_source(&mut rows, &mut index, table);
    }
    let sources: Vec<String> = tables.iter().map(|t| t.source.clone()).collect();
    for row in &mut rows {
        for source in &sources {
            row.flags.entry(source.clone()).or_insert(0);
        }
    }
    Some(AggregatedTable { sources, rows })
}

/// `aggregate` plus consensus election and derived chemistry per row.
/// Rows with no contributed structure (Markush groups, key-only sources)
/// get the incompatible-structure marker rather than being dropped.
pub fn aggregate_extended(tables: &[SourceTable]) -> Option<AggregatedTable> {
    let mut aggregated = aggregate(tables)?;
    for row in &mut aggregated.rows {
        row.consensus_structure = consensus_structure(&row.structures);
        row.derived = Some(match &row.consensus_structure {
            Some(structure) => match molecular_properties(structure) {
                Ok(props) => Derived::Props {
                    formula: props.formula,
                    mass_mh: props.mass_mh,
                },
                Err(e) => {
                    warn!(
                        "row ({}, {}): {}",
                        row.parent_id, row.metabolite_key, e
                    );
                    Derived::Incompatible
                }
            },
            None => Derived::Incompatible,
        });
    }
    Some(aggregated)
}

////////////////////////////AGGREGATION TESTS/////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Adapters::records::MetaboliteRecord;

    fn source(name: &str, rows: Vec<(&str, &str, Option<&str>)>) -> SourceTable {
        let mut table = SourceTable::new(name);
        for (parent, key, clean) in rows {
            table.push(MetaboliteRecord::new(
                parent.to_string(),
                key.to_string(),
                clean.map(|s| s.to_string()),
            ));
        }
        table
    }

    #[test]
    fn test_disjoint_union_with_zero_flags() {
        let a = source("A", vec![("P1", "K1", Some("CCO"))]);
        let b = source("B", vec![("P2", "K2", Some("C=O"))]);
        let agg = aggregate(&[a, b]).unwrap();
        assert_eq!(agg.n_rows(), 2);
        let r1 = agg.get("P1", "K1").unwrap();
        assert_eq!(r1.flag("A"), 1);
        assert_eq!(r1.flag("B"), 0);
        let r2 = agg.get("P2", "K2").unwrap();
        assert_eq!(r2.flag("A"), 0);
        assert_eq!(r2.flag("B"), 1);
    }

    #[test]
    fn test_overlap_merges_into_one_row() {
        let a = source("A", vec![("P1", "K1", Some("CCO"))]);
        let b = source("B", vec![("P1", "K1", Some("CCO")), ("P1", "K2", None)]);
        let agg = aggregate(&[a, b]).unwrap();
        assert_eq!(agg.n_rows(), 2);
        let shared = agg.get("P1", "K1").unwrap();
        assert_eq!(shared.flag("A"), 1);
        assert_eq!(shared.flag("B"), 1);
        assert_eq!(shared.structures.len(), 2);
    }

    #[test]
    fn test_fewer_than_two_tables_rejected() {
        assert!(aggregate(&[]).is_none());
        let single = source("A", vec![("P1", "K1", None)]);
        assert!(aggregate(&[single]).is_none());
    }

    #[test]
    fn test_reaggregation_reproduces_row_set() {
        let a = source("A", vec![("P1", "K1", Some("CCO")), ("P2", "K3", None)]);
        let b = source("B", vec![("P1", "K1", Some("CCO")), ("P1", "K2", Some("C=O"))]);
        let c = source("C", vec![("P2", "K3", Some("CCN"))]);
        let agg = aggregate(&[a, b, c]).unwrap();
        let again = aggregate(&agg.to_source_tables()).unwrap();
        assert_eq!(agg.n_rows(), again.n_rows());
        for row in &agg.rows {
            let other = again.get(&row.parent_id, &row.metabolite_key).unwrap();
            assert_eq!(row.flags, other.flags);
        }
    }

    #[test]
    fn test_consensus_majority_and_tie_break() {
        let a = source("A", vec![("P1", "K1", Some("CCO"))]);
        let b = source("B", vec![("P1", "K1", Some("CCO"))]);
        let c = source("C", vec![("P1", "K1", Some("OCC"))]);
        let agg = aggregate_extended(&[a, b, c]).unwrap();
        let row = agg.get("P1", "K1").unwrap();
        assert_eq!(row.consensus_structure.as_deref(), Some("CCO"));
        match row.derived.as_ref().unwrap() {
            Derived::Props { formula, mass_mh } => {
                assert_eq!(formula, "C2H6O");
                assert!((mass_mh - 47.0497).abs() < 1e-3);
            }
            other => panic!("unexpected derived value: {:?}", other),
        }

        // tie between two structures goes to the first in join order
        let a = source("A", vec![("P1", "K1", Some("CCO"))]);
        let b = source("B", vec![("P1", "K1", Some("OCC"))]);
        let agg = aggregate_extended(&[a, b]).unwrap();
        let row = agg.get("P1", "K1").unwrap();
        assert_eq!(row.consensus_structure.as_deref(), Some("CCO"));
    }

    #[test]
    fn test_structureless_row_marked_incompatible() {
        let mut markush_row = MetaboliteRecord::new("P1".into(), "K9".into(), None);
        markush_row.markush = true;
        markush_row.metabolite_group = Some("MRKSH-01".into());
        let mut a = SourceTable::new("Reported");
        a.push(markush_row);
        let b = source("B", vec![("P1", "K1", Some("CCO"))]);
        let agg = aggregate_extended(&[a, b]).unwrap();
        let row = agg.get("P1", "K9").unwrap();
        assert!(row.markush);
        assert_eq!(row.consensus_structure, None);
        assert_eq!(row.derived, Some(Derived::Incompatible));
        assert_eq!(
            row.derived.as_ref().unwrap().formula_display(),
            INCOMPATIBLE_STRUCTURE
        );
    }
}
