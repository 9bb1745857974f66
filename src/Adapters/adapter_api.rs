//! # Source Adapter API
//!
//! ## Aim
//! Single seam over the per-tool cleanup routines: every adapter reads one
//! raw export table and emits rows in the common schema
//! {ParentID, MetaboliteKey, CleanStructure, SourceFlag}. Auxiliary state
//! (parent index, model module name, Markush supplement, rule engine) is
//! carried by the adapter value itself, so `clean` stays a pure function of
//! the input table.
//!
//! ## Propagation policy
//! Per-row failures (unparseable structure, unresolved parent) are absorbed
//! inside `clean` as dropped rows or null fields, logged and never fatal.
//! Only structural misuse (a required column absent from the export) fails
//! the call.

use crate::Adapters::literature::{ChemRegAdapter, LiteratureAdapter};
use crate::Adapters::predictions::{
    BioTransformerAdapter, CtsAdapter, MeteorAdapter, TimesAdapter, ToolBoxAdapter,
};
use crate::Adapters::records::SourceTable;
use crate::Adapters::rule_engine::RuleEngineAdapter;
use crate::Utils::load_from_file::{RawTable, TableError};
use enum_dispatch::enum_dispatch;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("Input table rejected: {0}")]
    Table(#[from] TableError),
}

#[enum_dispatch]
pub trait SourceAdapter {
    /// Name of the flag column this adapter contributes to the aggregate.
    fn source_name(&self) -> String;
    /// Normalize one raw export into the common schema.
    fn clean(&self, table: &RawTable) -> Result<SourceTable, AdapterError>;
}

#[enum_dispatch(SourceAdapter)]
pub enum AdapterKind {
    Times(TimesAdapter),
    Meteor(MeteorAdapter),
    ToolBox(ToolBoxAdapter),
    BioTransformer(BioTransformerAdapter),
    Cts(CtsAdapter),
    ChemReg(ChemRegAdapter),
    Literature(LiteratureAdapter),
    RuleEngine(RuleEngineAdapter),
}
