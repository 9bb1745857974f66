/////////////////////////ADAPTER TESTS///////////////////////////////////
// Cleanup routines exercised on small in-memory export tables: parent
// forward-fill, index resolution, query-name scrubbing, Markush merging
// and rule-engine candidate handling.

#[cfg(test)]
mod tests {
    use crate::Adapters::adapter_api::{AdapterKind, SourceAdapter};
    use crate::Adapters::literature::{ChemRegAdapter, LiteratureAdapter};
    use crate::Adapters::predictions::{
        BioTransformerAdapter, CtsAdapter, MeteorAdapter, TimesAdapter, ToolBoxAdapter,
    };
    use crate::Adapters::records::ParentIndex;
    use crate::Adapters::rule_engine::{
        ExpansionError, RuleCandidate, RuleEngineAdapter, SubstitutionRuleEngine,
        TransformationEngine, TransformationRule,
    };
    use crate::Normalizer::structure::{smiles_to_key, Structure};
    use crate::Utils::load_from_file::RawTable;

    #[test]
    fn test_times_forward_fill() {
        // parent rows carry the name, metabolite rows leave it blank
        let table = RawTable::from_rows(
            vec!["Chem. Name", "Smiles"],
            vec![
                vec!["P1", "c1ccccc1"],
                vec!["", "CCO"],
                vec!["", "C=O"],
                vec!["P2", "CCN"],
                vec!["", "CCC"],
            ],
        );
        let adapter = TimesAdapter::with_layout("TIMES_RatInVivo", 0, 0);
        let cleaned = adapter.clean(&table).unwrap();
        assert_eq!(cleaned.source, "TIMES_RatInVivo");
        assert_eq!(cleaned.len(), 3);
        assert_eq!(cleaned.rows[0].parent_id, "P1");
        assert_eq!(cleaned.rows[1].parent_id, "P1");
        assert_eq!(cleaned.rows[2].parent_id, "P2");
        assert_eq!(cleaned.rows[0].metabolite_key, smiles_to_key("CCO", false).unwrap());
        assert_eq!(cleaned.rows[0].clean_structure.as_deref(), Some("CCO"));
    }

    #[test]
    fn test_times_skips_header_and_footer() {
        let table = RawTable::from_rows(
            vec!["Chem. Name", "Smiles"],
            vec![
                vec!["generated by TIMES", ""],
                vec!["P1", "CCO"],
                vec!["", "C=O"],
                vec!["total:", "1"],
                vec!["", ""],
            ],
        );
        let adapter = TimesAdapter::new("TIMES_RatInVivo");
        let cleaned = adapter.clean(&table).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.rows[0].parent_id, "P1");
    }

    #[test]
    fn test_meteor_strips_query_qualifier() {
        let table = RawTable::from_rows(
            vec!["SMILES", "Query Name", "Parent"],
            vec![
                // parent entry: no Parent value, excluded
                vec!["c1ccccc1", "DTXSID100 (parent)", ""],
                vec!["CCO", "DTXSID100 (query 1)", "c1ccccc1"],
                vec!["bad smiles", "DTXSID100 (query 1)", "c1ccccc1"],
            ],
        );
        let cleaned = MeteorAdapter::new().clean(&table).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.rows[0].parent_id, "DTXSID100");
    }

    #[test]
    fn test_toolbox_resolves_parent_by_reduced_key() {
        // index built with QSAR-ready keys; the export carries a stereo
        // variant of the same parent
        let list = RawTable::from_rows(
            vec!["QSAR_READY_SMILES", "DTXSID"],
            vec![vec!["CC(N)C(=O)O", "DTXSID500"]],
        );
        let index = ParentIndex::from_table(&list, "QSAR_READY_SMILES", "DTXSID", true).unwrap();
        let table = RawTable::from_rows(
            vec!["SMILES", "Metabolite"],
            vec![
                vec!["C[C@H](N)C(=O)O", "CCO"],
                vec!["CCCCCCCC", "C=O"], // not in index, dropped
                vec!["total", ""],
                vec!["", ""],
            ],
        );
        let cleaned = ToolBoxAdapter::new(index).clean(&table).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.rows[0].parent_id, "DTXSID500");
    }

    #[test]
    fn test_biotransformer_precursor_forward_fill() {
        let parent_key = smiles_to_key("c1ccccc1", false).unwrap();
        let index = ParentIndex::from_pairs(vec![(parent_key.clone(), "DTXSID700")]);
        // second row's precursor is an intermediate metabolite absent from
        // the index, so the parent carries over
        let intermediate_key = smiles_to_key("CCO", false).unwrap();
        let table = RawTable::from_rows(
            vec!["InChIKey", "Precursor InChIKey", "SMILES"],
            vec![
                vec![intermediate_key.as_str(), parent_key.as_str(), "CCO"],
                vec!["SOMEMETABOLITEKEY-XXXXXXXXSA-N", intermediate_key.as_str(), "C=O"],
            ],
        );
        let cleaned = BioTransformerAdapter::new(index).clean(&table).unwrap();
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned.rows[0].parent_id, "DTXSID700");
        assert_eq!(cleaned.rows[1].parent_id, "DTXSID700");
        // the export's own key column is kept verbatim
        assert_eq!(cleaned.rows[1].metabolite_key, "SOMEMETABOLITEKEY-XXXXXXXXSA-N");
    }

    #[test]
    fn test_cts_routes_split_parents_from_metabolites() {
        let parent_key = smiles_to_key("c1ccccc1", false).unwrap();
        let index = ParentIndex::from_pairs(vec![(parent_key, "DTXSID900")]);
        let table = RawTable::from_rows(
            vec!["smiles", "routes"],
            vec![
                vec!["c1ccccc1", ""],
                vec!["CCO", "hydrolysis"],
                // unknown parent resets the fill, its metabolite is dropped
                vec!["CCCCCCCCCC", ""],
                vec!["C=O", "oxidation"],
            ],
        );
        let cleaned = CtsAdapter::new(index).clean(&table).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.rows[0].parent_id, "DTXSID900");
        assert_eq!(cleaned.rows[0].clean_structure.as_deref(), Some("CCO"));
    }

    #[test]
    fn test_chemreg_drops_unparseable_rows() {
        let table = RawTable::from_rows(
            vec!["Parent", "Structure_SMILES"],
            vec![
                vec!["DTXSID1", "CCO"],
                vec!["DTXSID1", "not a structure"],
                vec!["DTXSID1", "CCO"], // duplicate collapses
            ],
        );
        let cleaned = ChemRegAdapter::new().clean(&table).unwrap();
        assert_eq!(cleaned.source, "Reported");
        assert_eq!(cleaned.len(), 1);
        assert!(!cleaned.rows[0].markush);
    }

    #[test]
    fn test_literature_markush_rescue_and_supplement() {
        let markush = RawTable::from_rows(
            vec!["Parent DTXSID", "Markush DTXSID", "JChemInchiKey"],
            vec![
                vec!["DTXSID1", "MRKSH-01", "AAAAAAAAAAAAAA-BBBBBBBBNA-M"],
                // parent absent from the registry export below
                vec!["DTXSID2", "MRKSH-02", "CCCCCCCCCCCCCC-DDDDDDDDNA-M"],
            ],
        );
        let adapter = LiteratureAdapter::new(&markush).unwrap();
        let registry = RawTable::from_rows(
            vec!["Parent", "Query", "Structure_SMILES"],
            vec![
                vec!["DTXSID1", "M1", "CCO"],
                // ambiguous entry: no parseable structure, known group
                vec!["DTXSID1", "MRKSH-01", "Markush"],
                // unknown group and no structure, dropped
                vec!["DTXSID1", "M9", ""],
            ],
        );
        let cleaned = adapter.clean(&registry).unwrap();
        assert_eq!(cleaned.len(), 3);

        let exact = &cleaned.rows[0];
        assert!(!exact.markush);
        assert_eq!(exact.metabolite_group.as_deref(), Some("M1"));

        // group key specificity got rewritten to the reduced suffix
        let rescued = &cleaned.rows[1];
        assert!(rescued.markush);
        assert_eq!(rescued.metabolite_key, "AAAAAAAAAAAAAA-BBBBBBBBSA-N");
        assert_eq!(rescued.metabolite_group.as_deref(), Some("MRKSH-01"));
        assert!(rescued.clean_structure.is_none());

        let supplement = &cleaned.rows[2];
        assert_eq!(supplement.parent_id, "DTXSID2");
        assert!(supplement.markush);
        assert_eq!(supplement.metabolite_group.as_deref(), Some("MRKSH-02"));
    }

    struct FlakyEngine;

    impl TransformationEngine for FlakyEngine {
        fn expand(&self, parent: &Structure) -> Vec<Result<RuleCandidate, ExpansionError>> {
            vec![
                Ok(RuleCandidate {
                    smiles: parent.canonical_smiles(),
                    pathway: "parent".to_string(),
                    score: 1.0,
                }),
                Ok(RuleCandidate {
                    smiles: "CCO".to_string(),
                    pathway: "oxidation".to_string(),
                    score: 0.5,
                }),
                Err(ExpansionError::InvalidCandidate {
                    rule: "broken rule".to_string(),
                    smiles: "((".to_string(),
                }),
            ]
        }
    }

    #[test]
    fn test_rule_engine_adapter_skips_failures_and_parent_echo() {
        let parent_key = smiles_to_key("c1ccccc1", false).unwrap();
        let index = ParentIndex::from_pairs(vec![(parent_key, "DTXSID300")]);
        let table = RawTable::from_rows(vec!["SMILES"], vec![vec!["c1ccccc1"]]);
        let adapter = RuleEngineAdapter::new(index, Box::new(FlakyEngine));
        let cleaned = adapter.clean(&table).unwrap();
        // the parent echo and the failed candidate both vanish
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.rows[0].parent_id, "DTXSID300");
        assert_eq!(
            cleaned.rows[0].metabolite_key,
            smiles_to_key("CCO", false).unwrap()
        );
    }

    #[test]
    fn test_adapter_kind_dispatches_to_each_variant() {
        // heterogeneous adapters driven through the common dispatch enum
        let times_table = RawTable::from_rows(
            vec!["Chem. Name", "Smiles"],
            vec![vec!["P1", "c1ccccc1"], vec!["", "CCO"]],
        );
        let meteor_table = RawTable::from_rows(
            vec!["SMILES", "Query Name", "Parent"],
            vec![vec!["CCO", "DTXSID100 (query 1)", "c1ccccc1"]],
        );
        let adapters: Vec<(AdapterKind, RawTable)> = vec![
            (
                AdapterKind::Times(TimesAdapter::with_layout("TIMES_RatInVivo", 0, 0)),
                times_table,
            ),
            (AdapterKind::Meteor(MeteorAdapter::new()), meteor_table),
        ];
        let names: Vec<String> = adapters.iter().map(|(a, _)| a.source_name()).collect();
        assert_eq!(names, vec!["TIMES_RatInVivo", "Meteor"]);
        for (adapter, table) in &adapters {
            let cleaned = adapter.clean(table).unwrap();
            assert_eq!(cleaned.source, adapter.source_name());
            assert_eq!(cleaned.len(), 1);
            assert_eq!(
                cleaned.rows[0].metabolite_key,
                smiles_to_key("CCO", false).unwrap()
            );
        }
    }

    #[test]
    fn test_rule_with_malformed_pattern_is_rejected() {
        let err = TransformationRule::new("broken", r"((", "O", 0.5).unwrap_err();
        assert!(matches!(err, ExpansionError::InvalidPattern { .. }));
        // the shipped ruleset compiles in full
        assert_eq!(SubstitutionRuleEngine::phase1().rules.len(), 5);
    }

    #[test]
    fn test_substitution_engine_emits_scored_candidates() {
        let parent = Structure::parse("c1ccccc1").unwrap();
        let engine = SubstitutionRuleEngine::phase1();
        let candidates = engine.expand(&parent);
        assert!(candidates.len() >= 2);
        let echo = candidates[0].as_ref().unwrap();
        assert_eq!(echo.pathway, "parent");
        assert!((echo.score - 1.0).abs() < 1e-12);
        let hydroxylated = candidates
            .iter()
            .filter_map(|c| c.as_ref().ok())
            .find(|c| c.pathway == "aromatic hydroxylation")
            .unwrap();
        assert_eq!(hydroxylated.smiles, "c1ccc(O)cc1");
        assert!(hydroxylated.score > 0.0 && hydroxylated.score <= 1.0);
    }
}
