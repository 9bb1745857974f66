//! # Rule-Based Metabolite Generation
//!
//! ## Aim
//! Generate candidate metabolites directly from parent structures with a
//! library of transformation rules, then feed them through the same common
//! schema as the external tools. The engine sits behind a trait so the
//! bundled substitution ruleset can be swapped for a heavier external
//! predictor without touching the adapter.
//!
//! ## Main Data Structures
//! - `TransformationEngine`: the expansion seam, one parent in, scored
//!   candidates out.
//! - `SubstitutionRuleEngine`: pattern-substitution rules over canonical
//!   structure strings; ships a phase-I-style default ruleset.
//! - `RuleEngineAdapter`: wraps an engine as a `SourceAdapter` over a
//!   compound-list table.

use crate::Adapters::adapter_api::{AdapterError, SourceAdapter};
use crate::Adapters::records::{MetaboliteRecord, ParentIndex, SourceTable};
use crate::Normalizer::structure::Structure;
use crate::Utils::load_from_file::RawTable;
use log::{error, info, warn};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExpansionError {
    #[error("Rule '{rule}' has a malformed pattern: {source}")]
    InvalidPattern {
        rule: String,
        source: regex::Error,
    },
    #[error("Rule '{rule}' produced an invalid candidate structure '{smiles}'")]
    InvalidCandidate { rule: String, smiles: String },
    #[error("Rule '{rule}' carries a score outside (0, 1]")]
    InvalidScore { rule: String },
}

/// One scored candidate emitted by an engine. `pathway` names the
/// transformation that produced it; the untransformed parent is echoed
/// with pathway "parent".
#[derive(Debug, Clone, PartialEq)]
pub struct RuleCandidate {
    pub smiles: String,
    pub pathway: String,
    pub score: f64,
}

/// Expansion seam: one parent structure in, candidates out. Per-candidate
/// failures come back as `Err` items so the caller decides the skip
/// policy.
pub trait TransformationEngine {
    fn expand(&self, parent: &Structure) -> Vec<Result<RuleCandidate, ExpansionError>>;
}

/// One substring-substitution rule applied to the canonical structure
/// string. Deliberately coarse next to a real reaction engine, but enough
/// to exercise the full pipeline on phase-I-style transformations.
#[derive(Debug, Clone)]
pub struct TransformationRule {
    pub name: String,
    pub pattern: Regex,
    pub replacement: String,
    pub probability: f64,
}

impl TransformationRule {
    pub fn new(
        name: &str,
        pattern: &str,
        replacement: &str,
        probability: f64,
    ) -> Result<Self, ExpansionError> {
        let pattern = Regex::new(pattern).map_err(|source| ExpansionError::InvalidPattern {
            rule: name.to_string(),
            source,
        })?;
        Ok(TransformationRule {
            name: name.to_string(),
            pattern,
            replacement: replacement.to_string(),
            probability,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubstitutionRuleEngine {
    pub rules: Vec<TransformationRule>,
}

impl SubstitutionRuleEngine {
    pub fn new(rules: Vec<TransformationRule>) -> Self {
        SubstitutionRuleEngine { rules }
    }

    /// Phase-I-style default ruleset over canonical structure strings.
    pub fn phase1() -> Self {
        let rules = [
            ("aromatic hydroxylation", r"c1ccccc1", "c1ccc(O)cc1", 0.8),
            ("O-demethylation", r"OC\b", "O", 0.6),
            ("N-demethylation", r"N\(C\)C", "NC", 0.6),
            ("ester hydrolysis", r"C\(=O\)OC", "C(=O)O", 0.7),
            ("aliphatic hydroxylation", r"CC\b", "CC(O)", 0.4),
        ]
        .into_iter()
        .filter_map(|(name, pattern, replacement, probability)| {
            match TransformationRule::new(name, pattern, replacement, probability) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    error!("default ruleset: {}", e);
                    None
                }
            }
        })
        .collect();
        SubstitutionRuleEngine::new(rules)
    }
}

impl TransformationEngine for SubstitutionRuleEngine {
    fn expand(&self, parent: &Structure) -> Vec<Result<RuleCandidate, ExpansionError>> {
        let source = parent.canonical_smiles();
        let mut out = vec![Ok(RuleCandidate {
            smiles: source.clone(),
            pathway: "parent".to_string(),
            score: 1.0,
        })];
        for rule in &self.rules {
            if !(rule.probability > 0.0 && rule.probability <= 1.0) {
                out.push(Err(ExpansionError::InvalidScore {
                    rule: rule.name.clone(),
                }));
                continue;
            }
            if !rule.pattern.is_match(&source) {
                continue;
            }
            let candidate = rule
                .pattern
                .replace(&source, rule.replacement.as_str())
                .to_string();
            match Structure::parse(&candidate) {
                Ok(structure) => out.push(Ok(RuleCandidate {
                    smiles: structure.canonical_smiles(),
                    pathway: rule.name.clone(),
                    score: rule.probability,
                })),
                Err(_) => out.push(Err(ExpansionError::InvalidCandidate {
                    rule: rule.name.clone(),
                    smiles: candidate,
                })),
            }
        }
        out
    }
}

/// Adapter over a compound-list table: every parent structure is expanded
/// through the engine and the candidates land in the common schema.
/// Candidate failures are logged and skipped, never fatal.
pub struct RuleEngineAdapter {
    pub index: ParentIndex,
    /// strip stereo marks from parents before expansion so the rules see
    /// QSAR-ready strings
    pub keep_stereochemistry: bool,
    pub engine: Box<dyn TransformationEngine>,
}

impl RuleEngineAdapter {
    pub fn new(index: ParentIndex, engine: Box<dyn TransformationEngine>) -> Self {
        RuleEngineAdapter {
            index,
            keep_stereochemistry: false,
            engine,
        }
    }
}

impl SourceAdapter for RuleEngineAdapter {
    fn source_name(&self) -> String {
        "RuleEngine".to_string()
    }

    fn clean(&self, table: &RawTable) -> Result<SourceTable, AdapterError> {
        let columns = table.require_columns(&["SMILES"])?;
        let smiles_col = columns[0];
        let mut out = SourceTable::new("RuleEngine");
        for i in 0..table.n_rows() {
            let raw = table.value(i, smiles_col).trim();
            if raw.is_empty() {
                continue;
            }
            let parent_structure = match Structure::parse(raw) {
                Ok(s) => s,
                Err(e) => {
                    warn!("RuleEngine row {}: unparseable parent: {}; skipped", i, e);
                    continue;
                }
            };
            let parent_smiles = if self.keep_stereochemistry {
                parent_structure.isomeric_smiles()
            } else {
                parent_structure.canonical_smiles()
            };
            // re-parse so expansion always works on the chosen rendering
            let Ok(parent_structure) = Structure::parse(&parent_smiles) else {
                continue;
            };
            let Some(parent_id) = self.index.get(&parent_structure.standard_key(false)) else {
                warn!("RuleEngine row {}: parent not in index; skipped", i);
                continue;
            };
            for candidate in self.engine.expand(&parent_structure) {
                let candidate = match candidate {
                    Ok(c) => c,
                    Err(e) => {
                        error!("RuleEngine row {}: {}", i, e);
                        continue;
                    }
                };
                if candidate.pathway == "parent" {
                    continue;
                }
                match Structure::parse(&candidate.smiles) {
                    Ok(structure) => out.push(MetaboliteRecord::new(
                        parent_id.to_string(),
                        structure.standard_key(false),
                        Some(structure.canonical_smiles()),
                    )),
                    Err(e) => error!("RuleEngine row {}: candidate rejected: {}", i, e),
                }
            }
        }
        out.dedup();
        info!("RuleEngine: {} metabolite rows", out.len());
        Ok(out)
    }
}
