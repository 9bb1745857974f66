//! # Source Adapters
//!
//! ## Aim
//! Normalize the heterogeneous outputs of metabolite-prediction tools and
//! the curated literature registry into one common schema keyed by
//! (ParentID, MetaboliteKey), so downstream aggregation never needs
//! tool-specific logic.
//!
//! ## Main Data Structures
//! - `records`: `MetaboliteRecord`, `SourceTable`, `ParentIndex`.
//! - `adapter_api`: the `SourceAdapter` trait and the `AdapterKind`
//!   dispatch enum.
//! - `predictions`: adapters for the external prediction tools.
//! - `literature`: adapters for reported metabolites, including Markush
//!   group accounting.
//! - `rule_engine`: rule-based candidate generation behind the
//!   `TransformationEngine` trait.

use crate::Normalizer::structure::Structure;
use log::warn;

/// common record types and the parent index
pub mod records;

/// the `SourceAdapter` trait and dispatch enum
pub mod adapter_api;

/// adapters for external prediction tool exports
pub mod predictions;

/// adapters for the curated literature registry
pub mod literature;

/// rule-based candidate generation
pub mod rule_engine;

pub mod adapter_tests;

/// Normalize one structure cell into (key, clean structure), logging and
/// returning None when it does not parse. The key is full-specificity;
/// adapters that need QSAR-ready keys call the normalizer directly.
pub(crate) fn structure_fields(
    smiles: &str,
    context: &str,
    row: usize,
) -> Option<(String, Option<String>)> {
    match Structure::parse(smiles) {
        Ok(structure) => Some((
            structure.standard_key(false),
            Some(structure.canonical_smiles()),
        )),
        Err(e) => {
            warn!("{} row {}: {}", context, row, e);
            None
        }
    }
}
