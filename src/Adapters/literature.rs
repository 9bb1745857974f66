//! # Reported-Metabolite Adapters
//!
//! ## Aim
//! Turn the curated literature registry into the same common schema the
//! prediction adapters emit, so the aggregate can treat "Reported" as just
//! another flag column. Two layers:
//! - `ChemRegAdapter`: the plain registry export, exact structures only.
//! - `LiteratureAdapter`: the registry export merged with the Markush
//!   group table, so ambiguous literature entries (a group of related
//!   candidate structures reported as one observation) survive
//!   normalization instead of being dropped as unparseable.

use crate::Adapters::adapter_api::{AdapterError, SourceAdapter};
use crate::Adapters::records::{MetaboliteRecord, SourceTable};
use crate::Adapters::structure_fields;
use crate::Utils::load_from_file::RawTable;
use log::{info, warn};
use std::collections::{HashMap, HashSet};

pub const REPORTED_SOURCE: &str = "Reported";

/// Rewrite a structure key so it no longer claims full specificity: the
/// last four characters become the reduced-specificity suffix. Group keys
/// coming from the curation table are full keys of one representative
/// member, which would wrongly distinguish stereo variants.
fn group_key(key: &str) -> Option<String> {
    if key.len() < 4 || !key.is_ascii() {
        return None;
    }
    Some(format!("{}SA-N", &key[..key.len() - 4]))
}

/// Curated literature registry, exact structures only. Rows whose
/// structure does not parse are dropped with a warning; `LiteratureAdapter`
/// is the variant that rescues them through the Markush table.
#[derive(Debug, Clone)]
pub struct ChemRegAdapter;

impl ChemRegAdapter {
    pub fn new() -> Self {
        ChemRegAdapter
    }
}

impl SourceAdapter for ChemRegAdapter {
    fn source_name(&self) -> String {
        REPORTED_SOURCE.to_string()
    }

    fn clean(&self, table: &RawTable) -> Result<SourceTable, AdapterError> {
        let columns = table.require_columns(&["Parent", "Structure_SMILES"])?;
        let (parent_col, smiles_col) = (columns[0], columns[1]);
        let mut out = SourceTable::new(REPORTED_SOURCE);
        for i in 0..table.n_rows() {
            let parent = table.value(i, parent_col).trim();
            let smiles = table.value(i, smiles_col).trim();
            if parent.is_empty() || smiles.is_empty() {
                continue;
            }
            if let Some((key, clean)) = structure_fields(smiles, REPORTED_SOURCE, i) {
                out.push(MetaboliteRecord::new(parent.to_string(), key, clean));
            }
        }
        out.dedup();
        info!("{}: {} reported rows", REPORTED_SOURCE, out.len());
        Ok(out)
    }
}

/// Literature registry with Markush accounting. Built from the curation
/// table, which both maps curated entry names to group identifiers and
/// lists group members for parents the registry export does not cover.
#[derive(Debug, Clone)]
pub struct LiteratureAdapter {
    /// curated group id -> standardized group key
    group_keys: HashMap<String, String>,
    /// (parent, group id, group key) rows to append for parents absent
    /// from the registry export
    supplement_rows: Vec<(String, String, String)>,
}

impl LiteratureAdapter {
    /// `markush_table` is the curation table of ambiguous literature
    /// entries: one row per group member, keyed by the group identifier.
    pub fn new(markush_table: &RawTable) -> Result<Self, AdapterError> {
        let columns =
            markush_table.require_columns(&["Parent DTXSID", "Markush DTXSID", "JChemInchiKey"])?;
        let (parent_col, group_col, key_col) = (columns[0], columns[1], columns[2]);
        let mut group_keys = HashMap::new();
        let mut supplement_rows = Vec::new();
        for i in 0..markush_table.n_rows() {
            let parent = markush_table.value(i, parent_col).trim();
            let group = markush_table.value(i, group_col).trim();
            let raw_key = markush_table.value(i, key_col).trim();
            if group.is_empty() || raw_key.is_empty() {
                continue;
            }
            let Some(key) = group_key(raw_key) else {
                warn!("Markush table row {}: malformed key '{}'; skipped", i, raw_key);
                continue;
            };
            group_keys
                .entry(group.to_string())
                .or_insert_with(|| key.clone());
            if !parent.is_empty() {
                supplement_rows.push((parent.to_string(), group.to_string(), key));
            }
        }
        info!(
            "Markush curation: {} groups, {} member rows",
            group_keys.len(),
            supplement_rows.len()
        );
        Ok(LiteratureAdapter {
            group_keys,
            supplement_rows,
        })
    }
}

impl SourceAdapter for LiteratureAdapter {
    fn source_name(&self) -> String {
        REPORTED_SOURCE.to_string()
    }

    fn clean(&self, table: &RawTable) -> Result<SourceTable, AdapterError> {
        let columns = table.require_columns(&["Parent", "Query", "Structure_SMILES"])?;
        let (parent_col, query_col, smiles_col) = (columns[0], columns[1], columns[2]);
        let mut out = SourceTable::new(REPORTED_SOURCE);
        let mut seen_parents: HashSet<String> = HashSet::new();
        for i in 0..table.n_rows() {
            let parent = table.value(i, parent_col).trim();
            let query = table.value(i, query_col).trim();
            let smiles = table.value(i, smiles_col).trim();
            if parent.is_empty() {
                continue;
            }
            seen_parents.insert(parent.to_string());
            match structure_fields(smiles, REPORTED_SOURCE, i) {
                Some((key, clean)) => {
                    let mut record = MetaboliteRecord::new(parent.to_string(), key, clean);
                    if !query.is_empty() {
                        record.metabolite_group = Some(query.to_string());
                    }
                    out.push(record);
                }
                None => {
                    // unparseable registry entries are rescued when the
                    // curation table knows the entry as a Markush group
                    let Some(key) = self.group_keys.get(query) else {
                        continue;
                    };
                    let mut record =
                        MetaboliteRecord::new(parent.to_string(), key.clone(), None);
                    record.metabolite_group = Some(query.to_string());
                    record.markush = true;
                    out.push(record);
                }
            }
        }
        // group members whose parent never appears in the registry export
        // still count as reported observations
        for (parent, group, key) in &self.supplement_rows {
            if seen_parents.contains(parent) {
                continue;
            }
            let mut record = MetaboliteRecord::new(parent.clone(), key.clone(), None);
            record.metabolite_group = Some(group.clone());
            record.markush = true;
            out.push(record);
        }
        out.dedup();
        info!("{}: {} reported rows (Markush merged)", REPORTED_SOURCE, out.len());
        Ok(out)
    }
}
