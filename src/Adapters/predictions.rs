//! # Prediction Tool Adapters
//!
//! ## Aim
//! One cleanup routine per upstream metabolite-prediction tool. Each
//! adapter reads only the columns its export format documents, resolves the
//! parent compound (directly, through the read-only `ParentIndex`, or by
//! forward-filling the most recently seen parent over interleaved
//! parent/metabolite rows), normalizes every metabolite structure through
//! the canonicalizer and deduplicates before returning.
//!
//! ## Formats
//! - `TimesAdapter`: metabolism-simulator reports where parent rows carry
//!   the identifier and metabolite rows leave it blank; trailing footer
//!   rows are skipped. One instance per model module (e.g. in-vivo vs
//!   in-vitro rat liver), the module name becomes the flag column.
//! - `MeteorAdapter`: structure-prediction reports keyed by a query name
//!   with a trailing parenthesized qualifier.
//! - `ToolBoxAdapter`: toolbox exports carrying parent SMILES only; the
//!   parent is resolved through the QSAR-ready (reduced-specificity) key.
//! - `BioTransformerAdapter`: exports that already carry standardized keys
//!   for both metabolite and precursor.
//! - `CtsAdapter`: transformation-simulator exports where parent rows are
//!   the ones without a route annotation.

use crate::Adapters::adapter_api::{AdapterError, SourceAdapter};
use crate::Adapters::records::{MetaboliteRecord, ParentIndex, SourceTable};
use crate::Adapters::structure_fields;
use crate::Normalizer::structure::Structure;
use crate::Utils::load_from_file::RawTable;
use log::{info, warn};
use regex::Regex;

/// Oasis TIMES style reports. Parent and metabolite rows are interleaved;
/// the parent identifier is forward-filled onto following metabolite rows
/// by an explicit fold, so the dependency on input row order is a stated
/// contract rather than a data-frame side effect.
#[derive(Debug, Clone)]
pub struct TimesAdapter {
    /// designates the model module generating the metabolites,
    /// e.g. "TIMES_RatInVivo"; used as the flag column name
    pub model_module: String,
    /// extra header lines above the first data row
    pub header_offset: usize,
    /// trailing summary lines to skip
    pub footer_rows: usize,
}

impl TimesAdapter {
    pub fn new(model_module: &str) -> Self {
        TimesAdapter {
            model_module: model_module.to_string(),
            header_offset: 1,
            footer_rows: 2,
        }
    }

    pub fn with_layout(model_module: &str, header_offset: usize, footer_rows: usize) -> Self {
        TimesAdapter {
            model_module: model_module.to_string(),
            header_offset,
            footer_rows,
        }
    }
}

impl SourceAdapter for TimesAdapter {
    fn source_name(&self) -> String {
        self.model_module.clone()
    }

    fn clean(&self, table: &RawTable) -> Result<SourceTable, AdapterError> {
        let columns = table.require_columns(&["Chem. Name", "Smiles"])?;
        let (name_col, smiles_col) = (columns[0], columns[1]);
        let end = table.n_rows().saturating_sub(self.footer_rows);
        let mut out = SourceTable::new(&self.model_module);
        let mut last_parent: Option<String> = None;
        for i in self.header_offset..end {
            let name = table.value(i, name_col).trim();
            let smiles = table.value(i, smiles_col).trim();
            if !name.is_empty() {
                // parent row: remember the identifier, emit nothing
                last_parent = Some(name.to_string());
                continue;
            }
            let Some(parent) = last_parent.clone() else {
                warn!("{} row {}: metabolite before any parent row", self.model_module, i);
                continue;
            };
            if smiles.is_empty() {
                continue;
            }
            if let Some((key, clean)) = structure_fields(smiles, &self.model_module, i) {
                out.push(MetaboliteRecord::new(parent, key, clean));
            }
        }
        out.dedup();
        info!("{}: {} metabolite rows", self.model_module, out.len());
        Ok(out)
    }
}

/// Nexus Meteor reports. Metabolite rows are those with a non-empty parent
/// structure column; the parent identifier sits in the query name with a
/// trailing parenthesized qualifier that gets scrubbed off.
#[derive(Debug, Clone)]
pub struct MeteorAdapter;

impl MeteorAdapter {
    pub fn new() -> Self {
        MeteorAdapter
    }
}

impl SourceAdapter for MeteorAdapter {
    fn source_name(&self) -> String {
        "Meteor".to_string()
    }

    fn clean(&self, table: &RawTable) -> Result<SourceTable, AdapterError> {
        let columns = table.require_columns(&["SMILES", "Query Name", "Parent"])?;
        let (smiles_col, query_col, parent_col) = (columns[0], columns[1], columns[2]);
        let qualifier = Regex::new(r"\s*\([^()]*\)").unwrap();
        let mut out = SourceTable::new("Meteor");
        for i in 0..table.n_rows() {
            if table.value(i, parent_col).trim().is_empty() {
                // parent entries carry no Parent value and are excluded
                continue;
            }
            let parent_id = qualifier
                .replace_all(table.value(i, query_col).trim(), "")
                .trim()
                .to_string();
            if parent_id.is_empty() {
                warn!("Meteor row {}: empty query name; row dropped", i);
                continue;
            }
            let smiles = table.value(i, smiles_col).trim();
            if smiles.is_empty() {
                continue;
            }
            if let Some((key, clean)) = structure_fields(smiles, "Meteor", i) {
                out.push(MetaboliteRecord::new(parent_id, key, clean));
            }
        }
        out.dedup();
        info!("Meteor: {} metabolite rows", out.len());
        Ok(out)
    }
}

/// OECD Toolbox exports: each row pairs the parent SMILES with one
/// metabolite SMILES. The parent is resolved through the index keyed on
/// the QSAR-ready key, so stereoisomer differences between the export and
/// the compound list do not break the lookup. Unresolved parents are
/// dropped with a warning.
#[derive(Debug, Clone)]
pub struct ToolBoxAdapter {
    pub index: ParentIndex,
    pub footer_rows: usize,
}

impl ToolBoxAdapter {
    pub fn new(index: ParentIndex) -> Self {
        ToolBoxAdapter {
            index,
            footer_rows: 2,
        }
    }
}

impl SourceAdapter for ToolBoxAdapter {
    fn source_name(&self) -> String {
        "ToolBox".to_string()
    }

    fn clean(&self, table: &RawTable) -> Result<SourceTable, AdapterError> {
        let columns = table.require_columns(&["SMILES", "Metabolite"])?;
        let (smiles_col, metabolite_col) = (columns[0], columns[1]);
        let end = table.n_rows().saturating_sub(self.footer_rows);
        let mut out = SourceTable::new("ToolBox");
        for i in 0..end {
            let metabolite = table.value(i, metabolite_col).trim();
            if metabolite.is_empty() {
                continue;
            }
            let parent_smiles = table.value(i, smiles_col).trim();
            let parent_key = match Structure::parse(parent_smiles) {
                Ok(structure) => structure.standard_key(true),
                Err(e) => {
                    warn!("ToolBox row {}: unparseable parent: {}; row dropped", i, e);
                    continue;
                }
            };
            let Some(parent_id) = self.index.get(&parent_key) else {
                warn!("ToolBox row {}: parent not in index; row dropped", i);
                continue;
            };
            if let Some((key, clean)) = structure_fields(metabolite, "ToolBox", i) {
                out.push(MetaboliteRecord::new(parent_id.to_string(), key, clean));
            }
        }
        out.dedup();
        info!("ToolBox: {} metabolite rows", out.len());
        Ok(out)
    }
}

/// BioTransformer exports. The export already carries standardized keys
/// for the metabolite and its precursor; the precursor key is resolved
/// through the full-specificity index and forward-filled over rows whose
/// precursor is absent from it. The clean structure is recomputed from the
/// export's SMILES column.
#[derive(Debug, Clone)]
pub struct BioTransformerAdapter {
    pub index: ParentIndex,
}

impl BioTransformerAdapter {
    pub fn new(index: ParentIndex) -> Self {
        BioTransformerAdapter { index }
    }
}

impl SourceAdapter for BioTransformerAdapter {
    fn source_name(&self) -> String {
        "BioTransformer".to_string()
    }

    fn clean(&self, table: &RawTable) -> Result<SourceTable, AdapterError> {
        let columns = table.require_columns(&["InChIKey", "Precursor InChIKey", "SMILES"])?;
        let (key_col, precursor_col, smiles_col) = (columns[0], columns[1], columns[2]);
        let mut out = SourceTable::new("BioTransformer");
        let mut last_parent: Option<String> = None;
        for i in 0..table.n_rows() {
            if let Some(parent_id) = self.index.get(table.value(i, precursor_col).trim()) {
                last_parent = Some(parent_id.to_string());
            }
            let Some(parent) = last_parent.clone() else {
                warn!("BioTransformer row {}: no resolvable precursor yet; row dropped", i);
                continue;
            };
            let metabolite_key = table.value(i, key_col).trim();
            if metabolite_key.is_empty() {
                continue;
            }
            let clean = match Structure::parse(table.value(i, smiles_col).trim()) {
                Ok(structure) => Some(structure.canonical_smiles()),
                Err(e) => {
                    warn!("BioTransformer row {}: {}; clean structure left empty", i, e);
                    None
                }
            };
            out.push(MetaboliteRecord::new(
                parent,
                metabolite_key.to_string(),
                clean,
            ));
        }
        out.dedup();
        info!("BioTransformer: {} metabolite rows", out.len());
        Ok(out)
    }
}

/// Chemical Transformation Simulator exports: rows without a route
/// annotation are parents; metabolite rows inherit the last resolved
/// parent. An unresolvable parent invalidates its metabolites rather than
/// letting them attach to the previous compound.
#[derive(Debug, Clone)]
pub struct CtsAdapter {
    pub index: ParentIndex,
}

impl CtsAdapter {
    pub fn new(index: ParentIndex) -> Self {
        CtsAdapter { index }
    }
}

impl SourceAdapter for CtsAdapter {
    fn source_name(&self) -> String {
        "CTS".to_string()
    }

    fn clean(&self, table: &RawTable) -> Result<SourceTable, AdapterError> {
        let columns = table.require_columns(&["smiles", "routes"])?;
        let (smiles_col, routes_col) = (columns[0], columns[1]);
        let mut out = SourceTable::new("CTS");
        let mut last_parent: Option<String> = None;
        for i in 0..table.n_rows() {
            let smiles = table.value(i, smiles_col).trim();
            if smiles.is_empty() {
                continue;
            }
            if table.value(i, routes_col).trim().is_empty() {
                // parent row
                last_parent = match Structure::parse(smiles) {
                    Ok(structure) => {
                        let key = structure.standard_key(false);
                        let resolved = self.index.get(&key).map(|id| id.to_string());
                        if resolved.is_none() {
                            warn!("CTS row {}: parent not in index; its metabolites will be dropped", i);
                        }
                        resolved
                    }
                    Err(e) => {
                        warn!("CTS row {}: unparseable parent: {}", i, e);
                        None
                    }
                };
                continue;
            }
            let Some(parent) = last_parent.clone() else {
                continue;
            };
            if let Some((key, clean)) = structure_fields(smiles, "CTS", i) {
                out.push(MetaboliteRecord::new(parent, key, clean));
            }
        }
        out.dedup();
        info!("CTS: {} metabolite rows", out.len());
        Ok(out)
    }
}
