//! Common record types shared by every source adapter: the normalized
//! metabolite row, the per-source row set, and the read-only parent index
//! that resolves a compound's identifier from its structure key. The index
//! is always passed into an adapter explicitly so adapters stay
//! independently testable and never share ambient lookup state.

use crate::Normalizer::structure::Structure;
use crate::Utils::load_from_file::RawTable;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// One normalized prediction (or reported) row. Identity is the pair
/// (parent_id, metabolite_key); adapters collapse exact duplicates before
/// returning, and rows are immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetaboliteRecord {
    pub parent_id: String,
    pub metabolite_key: String,
    /// canonical stereo-stripped structure, when one could be computed
    pub clean_structure: Option<String>,
    /// curated metabolite identifier; carries the group id for Markush rows
    pub metabolite_group: Option<String>,
    /// true when the row denotes an ambiguous group of related candidates
    /// rather than one exact structure
    pub markush: bool,
}

impl MetaboliteRecord {
    pub fn new(parent_id: String, metabolite_key: String, clean_structure: Option<String>) -> Self {
        MetaboliteRecord {
            parent_id,
            metabolite_key,
            clean_structure,
            metabolite_group: None,
            markush: false,
        }
    }
}

/// Output of one adapter run: the source name doubles as the flag column
/// name in the aggregated table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceTable {
    pub source: String,
    pub rows: Vec<MetaboliteRecord>,
}

impl SourceTable {
    pub fn new(source: &str) -> Self {
        SourceTable {
            source: source.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, record: MetaboliteRecord) {
        self.rows.push(record);
    }

    /// Collapse exact duplicate rows, keeping first occurrences.
    pub fn dedup(&mut self) {
        let mut seen: HashSet<MetaboliteRecord> = HashSet::new();
        self.rows.retain(|record| seen.insert(record.clone()));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Read-only mapping from a standardized structure key to a ParentID.
/// Built once by the caller (typically from a compound-list export) and
/// never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParentIndex {
    map: HashMap<String, String>,
}

impl ParentIndex {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ParentIndex {
            map: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Build the index from a compound-list table: one row per parent with
    /// a structure column and an identifier column. With
    /// `reduce_specificity` the keys are QSAR-ready (stereo-independent),
    /// which is what the toolbox-style adapters look parents up by. Rows
    /// with unparseable structures are skipped with a warning.
    pub fn from_table(
        table: &RawTable,
        smiles_column: &str,
        id_column: &str,
        reduce_specificity: bool,
    ) -> Result<Self, crate::Utils::load_from_file::TableError> {
        let columns = table.require_columns(&[smiles_column, id_column])?;
        let (smiles_col, id_col) = (columns[0], columns[1]);
        let mut map = HashMap::new();
        for i in 0..table.n_rows() {
            let smiles = table.value(i, smiles_col).trim();
            let id = table.value(i, id_col).trim();
            if smiles.is_empty() || id.is_empty() {
                continue;
            }
            match Structure::parse(smiles) {
                Ok(structure) => {
                    map.insert(structure.standard_key(reduce_specificity), id.to_string());
                }
                Err(e) => warn!("parent index row {} skipped: {}", i, e),
            }
        }
        Ok(ParentIndex { map })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_keeps_first() {
        let mut table = SourceTable::new("Meteor");
        let rec = MetaboliteRecord::new("P1".into(), "KEY1".into(), Some("CCO".into()));
        table.push(rec.clone());
        table.push(rec.clone());
        let mut other = rec.clone();
        other.markush = true;
        table.push(other);
        table.dedup();
        // the markush variant is not an exact duplicate, so it survives
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], rec);
    }

    #[test]
    fn test_parent_index_from_table() {
        let table = RawTable::from_rows(
            vec!["QSAR_READY_SMILES", "DTXSID"],
            vec![
                vec!["CCO", "DTXSID100"],
                vec!["bad smiles", "DTXSID200"],
                vec!["c1ccccc1", "DTXSID300"],
            ],
        );
        let index = ParentIndex::from_table(&table, "QSAR_READY_SMILES", "DTXSID", true).unwrap();
        assert_eq!(index.len(), 2);
        let key = crate::Normalizer::structure::smiles_to_key("CCO", true).unwrap();
        assert_eq!(index.get(&key), Some("DTXSID100"));
    }
}
