//! Joins trial-derived rows with the validated inhibitor→kinase mapping
//! and the kinase reference table to produce concrete (cancer, kinase)
//! link rows.
//!
//! A drug missing from the validated mapping, or a kinase symbol missing
//! from the reference table, signals a data-integrity problem between the
//! two source files and is fatal — these joins are only ever run over
//! inputs that are supposed to be mutually consistent.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use oncokin_common::{Link, OncokinError, Result, TrialPhase};
use oncokin_ingest::reference::KinaseReferenceTable;
use oncokin_ingest::trials::TrialLink;
use oncokin_ingest::ValidatedLink;

/// One fully-resolved (cancer, kinase) row, annotated with the trial
/// context it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedLink {
    pub cancer_name: String,
    pub mesh_id: String,
    pub kinase_symbol: String,
    pub gene_id: String,
    pub drug_name: String,
    pub phase: TrialPhase,
    pub start_year: i32,
    pub trial_ids: BTreeSet<String>,
}

impl ResolvedLink {
    /// The (gene_id, mesh_id) pair this row contributes to the label sets.
    pub fn link(&self) -> Link {
        Link::new(self.gene_id.clone(), self.mesh_id.clone())
    }
}

pub struct LinkResolver;

impl LinkResolver {
    /// Expand each trial row over every kinase inhibited by its drug.
    ///
    /// When `dedupe` is set, rows sharing a (mesh_id, gene_id) pair are
    /// collapsed to the first encountered in input order, yielding one
    /// row per kinase-cancer pair regardless of how many trials or
    /// phases support it.
    pub fn resolve(
        trial_links: &[TrialLink],
        inhibitor_to_kinases: &BTreeMap<String, Vec<ValidatedLink>>,
        reference: &KinaseReferenceTable,
        dedupe: bool,
    ) -> Result<Vec<ResolvedLink>> {
        let mut resolved = Vec::new();
        let mut seen: BTreeSet<(String, String)> = BTreeSet::new();

        for trial in trial_links {
            let kinases = inhibitor_to_kinases
                .get(&trial.drug_name)
                .ok_or_else(|| OncokinError::UnresolvedDrug(trial.drug_name.clone()))?;
            for validated in kinases {
                let gene_id = reference
                    .symbol_to_gene_id(&validated.kinase_symbol)
                    .map_err(|_| OncokinError::UnresolvedKinase(validated.kinase_symbol.clone()))?;
                if dedupe {
                    let key = (trial.mesh_id.clone(), gene_id.to_string());
                    if !seen.insert(key) {
                        continue;
                    }
                }
                resolved.push(ResolvedLink {
                    cancer_name: trial.cancer_name.clone(),
                    mesh_id: trial.mesh_id.clone(),
                    kinase_symbol: validated.kinase_symbol.clone(),
                    gene_id: gene_id.to_string(),
                    drug_name: trial.drug_name.clone(),
                    phase: trial.phase,
                    start_year: trial.start_year,
                    trial_ids: trial.trial_ids.clone(),
                });
            }
        }
        info!(
            n_trial_rows = trial_links.len(),
            n_resolved = resolved.len(),
            dedupe,
            "Resolved kinase-cancer links"
        );
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference() -> KinaseReferenceTable {
        KinaseReferenceTable::from_tsv(
            "EGFR\tepidermal growth factor receptor\t1956\tENSG00000146648\n\
             ERBB2\terb-b2 receptor tyrosine kinase 2\t2064\tENSG00000141736\n",
            "prot_kinase.tsv",
        )
        .unwrap()
    }

    fn afatinib_mapping() -> BTreeMap<String, Vec<ValidatedLink>> {
        let mut map = BTreeMap::new();
        map.insert(
            "afatinib".to_string(),
            vec![
                ValidatedLink {
                    inhibitor: "afatinib".to_string(),
                    kinase_symbol: "EGFR".to_string(),
                    activity_value: Some(0.0001),
                    evidence_id: "18408761".to_string(),
                },
                ValidatedLink {
                    inhibitor: "afatinib".to_string(),
                    kinase_symbol: "ERBB2".to_string(),
                    activity_value: Some(0.014),
                    evidence_id: "18408761".to_string(),
                },
            ],
        );
        map
    }

    fn trial(mesh_id: &str, phase: TrialPhase, year: i32) -> TrialLink {
        TrialLink {
            cancer_name: "Some Cancer".to_string(),
            mesh_id: mesh_id.to_string(),
            drug_name: "afatinib".to_string(),
            phase,
            start_year: year,
            trial_ids: BTreeSet::from(["NCT1".to_string()]),
        }
    }

    #[test]
    fn test_expands_over_all_kinases() {
        let trials = vec![trial("meshd002289", TrialPhase::Phase4, 2014)];
        let rows =
            LinkResolver::resolve(&trials, &afatinib_mapping(), &reference(), false).unwrap();
        assert_eq!(rows.len(), 2);
        let gene_ids: Vec<&str> = rows.iter().map(|r| r.gene_id.as_str()).collect();
        assert_eq!(gene_ids, vec!["ncbigene1956", "ncbigene2064"]);
    }

    #[test]
    fn test_dedupe_collapses_repeat_pairs_first_wins() {
        let trials = vec![
            trial("meshd002289", TrialPhase::Phase1, 2009),
            trial("meshd002289", TrialPhase::Phase4, 2014),
        ];
        let rows = LinkResolver::resolve(&trials, &afatinib_mapping(), &reference(), true).unwrap();
        // One row per (mesh, gene) pair; first occurrence (phase 1) wins.
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.phase == TrialPhase::Phase1));

        let undeduped =
            LinkResolver::resolve(&trials, &afatinib_mapping(), &reference(), false).unwrap();
        assert_eq!(undeduped.len(), 4);
    }

    #[test]
    fn test_unknown_drug_is_fatal() {
        let mut trials = vec![trial("meshd002289", TrialPhase::Phase1, 2009)];
        trials[0].drug_name = "notadrugib".to_string();
        let err =
            LinkResolver::resolve(&trials, &afatinib_mapping(), &reference(), false).unwrap_err();
        assert!(matches!(err, OncokinError::UnresolvedDrug(_)));
    }

    #[test]
    fn test_unknown_kinase_is_fatal() {
        let trials = vec![trial("meshd002289", TrialPhase::Phase1, 2009)];
        let mut mapping = afatinib_mapping();
        mapping.get_mut("afatinib").unwrap()[0].kinase_symbol = "NOTAKINASE".to_string();
        let err = LinkResolver::resolve(&trials, &mapping, &reference(), false).unwrap_err();
        assert!(matches!(err, OncokinError::UnresolvedKinase(_)));
    }
}
