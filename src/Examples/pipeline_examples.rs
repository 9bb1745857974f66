use crate::Adapters::adapter_api::SourceAdapter;
use crate::Adapters::literature::LiteratureAdapter;
use crate::Adapters::predictions::{MeteorAdapter, TimesAdapter, ToolBoxAdapter};
use crate::Adapters::records::ParentIndex;
use crate::Adapters::rule_engine::{RuleEngineAdapter, SubstitutionRuleEngine};
use crate::Aggregation::{aggregate, aggregate_extended};
use crate::Metrics::{MetricReport, ModelSelector};
use crate::Utils::load_from_file::RawTable;
use log::info;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

fn init_logging() {
    let _ = TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

/// small in-memory exports standing in for real tool output files
fn demo_times_export() -> RawTable {
    RawTable::from_rows(
        vec!["Chem. Name", "Smiles"],
        vec![
            vec!["report generated by the simulator", ""],
            vec!["DTXSID100", "c1ccccc1"],
            vec!["", "Oc1ccccc1"],
            vec!["", "OC(=O)c1ccccc1"],
            vec!["DTXSID200", "CCO"],
            vec!["", "CC=O"],
            vec!["total compounds: 2", ""],
            vec!["", ""],
        ],
    )
}

fn demo_meteor_export() -> RawTable {
    RawTable::from_rows(
        vec!["SMILES", "Query Name", "Parent"],
        vec![
            vec!["c1ccccc1", "DTXSID100 (parent)", ""],
            vec!["Oc1ccccc1", "DTXSID100 (query 1)", "c1ccccc1"],
            vec!["CC=O", "DTXSID200 (query 2)", "CCO"],
            vec!["CC(=O)O", "DTXSID200 (query 2)", "CCO"],
        ],
    )
}

fn demo_registry_export() -> RawTable {
    RawTable::from_rows(
        vec!["Parent", "Query", "Structure_SMILES"],
        vec![
            vec!["DTXSID100", "M1", "Oc1ccccc1"],
            vec!["DTXSID100", "MRKSH-01", "Markush"],
            vec!["DTXSID200", "M2", "CC=O"],
        ],
    )
}

fn demo_markush_table() -> RawTable {
    RawTable::from_rows(
        vec!["Parent DTXSID", "Markush DTXSID", "JChemInchiKey"],
        vec![vec![
            "DTXSID100",
            "MRKSH-01",
            "AAAAAAAAAAAAAA-BBBBBBBBNA-M",
        ]],
    )
}

fn demo_compound_list() -> RawTable {
    RawTable::from_rows(
        vec!["QSAR_READY_SMILES", "DTXSID"],
        vec![vec!["c1ccccc1", "DTXSID100"], vec!["CCO", "DTXSID200"]],
    )
}

pub fn model_comparison_examples(task: usize) {
    match task {
        0 => {
            // normalize two tool exports and aggregate them with the
            // literature, then print the wide table
            init_logging();
            let times = TimesAdapter::new("TIMES_RatInVivo")
                .clean(&demo_times_export())
                .unwrap();
            let meteor = MeteorAdapter::new().clean(&demo_meteor_export()).unwrap();
            let literature = LiteratureAdapter::new(&demo_markush_table())
                .unwrap()
                .clean(&demo_registry_export())
                .unwrap();
            let aggregated = aggregate(&[literature, times, meteor]).unwrap();
            info!("aggregated {} rows", aggregated.n_rows());
            aggregated.pretty_print();
        }
        1 => {
            // extended aggregation: consensus structures plus derived
            // formula and [M+H]+ mass per row
            init_logging();
            let times = TimesAdapter::new("TIMES_RatInVivo")
                .clean(&demo_times_export())
                .unwrap();
            let meteor = MeteorAdapter::new().clean(&demo_meteor_export()).unwrap();
            let literature = LiteratureAdapter::new(&demo_markush_table())
                .unwrap()
                .clean(&demo_registry_export())
                .unwrap();
            let aggregated = aggregate_extended(&[literature, times, meteor]).unwrap();
            aggregated.pretty_print();
            println!("{}", aggregated.to_json().unwrap());
        }
        2 => {
            // score each tool and their combination against the reported
            // metabolites
            init_logging();
            let times = TimesAdapter::new("TIMES_RatInVivo")
                .clean(&demo_times_export())
                .unwrap();
            let meteor = MeteorAdapter::new().clean(&demo_meteor_export()).unwrap();
            let literature = LiteratureAdapter::new(&demo_markush_table())
                .unwrap()
                .clean(&demo_registry_export())
                .unwrap();
            let aggregated = aggregate(&[literature, times, meteor]).unwrap();
            let report = MetricReport::compute(
                &aggregated,
                &[
                    ModelSelector::from("TIMES_RatInVivo"),
                    ModelSelector::from("Meteor"),
                    ModelSelector::from(vec!["TIMES_RatInVivo", "Meteor"]),
                ],
            )
            .unwrap();
            report.pretty_print();
        }
        3 => {
            // parent resolution through the QSAR-ready index, as the
            // toolbox-style exports need it
            init_logging();
            let index =
                ParentIndex::from_table(&demo_compound_list(), "QSAR_READY_SMILES", "DTXSID", true)
                    .unwrap();
            let export = RawTable::from_rows(
                vec!["SMILES", "Metabolite"],
                vec![
                    vec!["c1ccccc1", "Oc1ccccc1"],
                    vec!["CCO", "CC=O"],
                    vec!["total", ""],
                    vec!["", ""],
                ],
            );
            let cleaned = ToolBoxAdapter::new(index).clean(&export).unwrap();
            for row in &cleaned.rows {
                println!(
                    "{} -> {} ({})",
                    row.parent_id,
                    row.metabolite_key,
                    row.clean_structure.as_deref().unwrap_or("")
                );
            }
        }
        4 => {
            // generate candidates with the bundled substitution rules and
            // compare them against the literature
            init_logging();
            let index =
                ParentIndex::from_table(&demo_compound_list(), "QSAR_READY_SMILES", "DTXSID", false)
                    .unwrap();
            let engine = Box::new(SubstitutionRuleEngine::phase1());
            let generated = RuleEngineAdapter::new(index, engine)
                .clean(&RawTable::from_rows(
                    vec!["SMILES"],
                    vec![vec!["c1ccccc1"], vec!["CCO"]],
                ))
                .unwrap();
            let literature = LiteratureAdapter::new(&demo_markush_table())
                .unwrap()
                .clean(&demo_registry_export())
                .unwrap();
            let aggregated = aggregate(&[literature, generated]).unwrap();
            aggregated.pretty_print();
            let report =
                MetricReport::compute(&aggregated, &[ModelSelector::from("RuleEngine")]).unwrap();
            report.pretty_print();
        }
        _ => {
            println!("there is no task with number {}", task);
        }
    }
}
