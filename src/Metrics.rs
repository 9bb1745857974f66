//! # Sensitivity and Precision over the Aggregated Table
//!
//! ## Aim
//! Score each model (or combination of models) against the reported
//! literature metabolites, with Markush groups counted once per
//! (parent, group) pair instead of once per member structure.
//!
//! ## Definitions
//! - precision = true positives / all predictions of the model
//! - sensitivity = true positives / all reported metabolites, where a
//!   Markush group contributes one denominator unit and at most one true
//!   positive no matter how many member structures were predicted.
//! Both ratios read 0.0 when their denominator is empty and are rounded
//! to three decimals.

use crate::Aggregation::AggregatedTable;
use prettytable::{row, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Flag column carrying the literature observations.
pub const REPORTED_FLAG: &str = "Reported";

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("Model column '{0}' not present in the aggregated table")]
    UnknownModelColumn(String),
    #[error("Aggregated table has no '{0}' column to score against")]
    MissingReportedFlag(String),
    #[error("Model selector names no columns")]
    EmptySelector,
}

/// Which prediction flags count as "the model predicted it": one source
/// column, or the OR over several (scoring tools as an ensemble).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSelector {
    Single(String),
    Any(Vec<String>),
}

impl ModelSelector {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            ModelSelector::Single(c) => vec![c.as_str()],
            ModelSelector::Any(cs) => cs.iter().map(|c| c.as_str()).collect(),
        }
    }

    /// Label used in reports: the column name, or the columns joined
    /// with '|' for a combination.
    pub fn label(&self) -> String {
        match self {
            ModelSelector::Single(c) => c.clone(),
            ModelSelector::Any(cs) => cs.join("|"),
        }
    }

    fn validate(&self, table: &AggregatedTable) -> Result<(), MetricError> {
        let columns = self.columns();
        if columns.is_empty() {
            return Err(MetricError::EmptySelector);
        }
        for column in columns {
            if !table.sources.iter().any(|s| s == column) {
                return Err(MetricError::UnknownModelColumn(column.to_string()));
            }
        }
        Ok(())
    }

    fn predicted(&self, row: &crate::Aggregation::AggregatedRow) -> bool {
        self.columns().iter().any(|c| row.flag(c) == 1)
    }
}

impl From<&str> for ModelSelector {
    fn from(column: &str) -> Self {
        ModelSelector::Single(column.to_string())
    }
}

impl From<Vec<&str>> for ModelSelector {
    fn from(columns: Vec<&str>) -> Self {
        ModelSelector::Any(columns.into_iter().map(|c| c.to_string()).collect())
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

fn require_reported(table: &AggregatedTable) -> Result<(), MetricError> {
    if table.sources.iter().any(|s| s == REPORTED_FLAG) {
        Ok(())
    } else {
        Err(MetricError::MissingReportedFlag(REPORTED_FLAG.to_string()))
    }
}

/// Group identity of a Markush row; rows without a curated group id fall
/// back to the metabolite key, so each of them forms its own group.
fn group_id(row: &crate::Aggregation::AggregatedRow) -> &str {
    row.metabolite_group
        .as_deref()
        .unwrap_or(&row.metabolite_key)
}

/// Number of distinct (parent, group) pairs among Markush rows the model
/// predicted. Counted independently of the reported flag: a predicted
/// member structure of a reported group lands in a separate exact-key row,
/// so the group row itself is the only witness of the hit.
pub fn sum_markush_parents(
    table: &AggregatedTable,
    model: &ModelSelector,
) -> Result<usize, MetricError> {
    model.validate(table)?;
    let mut pairs: HashSet<(&str, &str)> = HashSet::new();
    for row in &table.rows {
        if row.markush && model.predicted(row) {
            pairs.insert((row.parent_id.as_str(), group_id(row)));
        }
    }
    Ok(pairs.len())
}

/// Fraction of the model's predictions that were reported. Markush rows
/// count as hits here like any other row; 0.0 when the model predicted
/// nothing.
pub fn precision(table: &AggregatedTable, model: &ModelSelector) -> Result<f64, MetricError> {
    model.validate(table)?;
    require_reported(table)?;
    let mut predicted = 0usize;
    let mut hits = 0usize;
    for row in &table.rows {
        if !model.predicted(row) {
            continue;
        }
        predicted += 1;
        if row.flag(REPORTED_FLAG) == 1 {
            hits += 1;
        }
    }
    if predicted == 0 {
        return Ok(0.0);
    }
    Ok(round3(hits as f64 / predicted as f64))
}

/// Fraction of reported metabolites the model found. Exact rows count one
/// each; a reported Markush group counts one denominator unit and one true
/// positive if the model predicted the group, regardless of how many
/// member rows it produced. 0.0 when nothing was reported.
pub fn sensitivity(table: &AggregatedTable, model: &ModelSelector) -> Result<f64, MetricError> {
    model.validate(table)?;
    require_reported(table)?;
    let mut exact_reported = 0usize;
    let mut exact_hits = 0usize;
    let mut reported_groups: HashSet<(&str, &str)> = HashSet::new();
    for row in &table.rows {
        if row.flag(REPORTED_FLAG) != 1 {
            continue;
        }
        if row.markush {
            reported_groups.insert((row.parent_id.as_str(), group_id(row)));
            continue;
        }
        exact_reported += 1;
        if model.predicted(row) {
            exact_hits += 1;
        }
    }
    let group_hits = sum_markush_parents(table, model)?;
    let denominator = exact_reported + reported_groups.len();
    if denominator == 0 {
        return Ok(0.0);
    }
    Ok(round3((exact_hits + group_hits) as f64 / denominator as f64))
}

/// Scores of one model against the literature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRow {
    pub model: String,
    pub sensitivity: f64,
    pub precision: f64,
}

/// Sensitivity/precision report over a set of model selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricReport {
    pub rows: Vec<MetricRow>,
}

impl MetricReport {
    pub fn compute(
        table: &AggregatedTable,
        models: &[ModelSelector],
    ) -> Result<Self, MetricError> {
        let mut rows = Vec::with_capacity(models.len());
        for model in models {
            rows.push(MetricRow {
                model: model.label(),
                sensitivity: sensitivity(table, model)?,
                precision: precision(table, model)?,
            });
        }
        Ok(MetricReport { rows })
    }

    pub fn pretty_print(&self) {
        let mut table = Table::new();
        table.add_row(row!["Model", "Sensitivity", "Precision"]);
        for r in &self.rows {
            table.add_row(row![
                r.model,
                format!("{:.3}", r.sensitivity),
                format!("{:.3}", r.precision)
            ]);
        }
        table.printstd();
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

//////////////////////////////METRICS TESTS///////////////////////////////
