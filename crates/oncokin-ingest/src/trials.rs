//! Clinical-trial-by-phase records and per-drug aggregation.
//!
//! The trial export has one row per (disease, drug, phase) with the start
//! and completion years and a semicolon-joined list of registry ids.
//! Rows are parsed into [`TrialRecord`]s and aggregated into one
//! [`KinaseInhibitorProfile`] per distinct drug, mapping cancer → phase →
//! studies.
//!
//! This component is deliberately cutoff-agnostic: the flattened link
//! views return the full trial history, and year filtering happens once,
//! in the dataset assembler, instead of being re-implemented by every
//! consumer.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use oncokin_common::entities::canonical_mesh_id;
use oncokin_common::{OncokinError, Result, TrialPhase};

/// One parsed row of the trial-by-phase export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialRecord {
    pub cancer_name: String,
    /// Canonical MeSH id, e.g. "meshd002289".
    pub mesh_id: String,
    pub drug_name: String,
    pub phase: TrialPhase,
    pub start_year: i32,
    pub completion_year: i32,
    /// NCT registry ids backing this row.
    pub trial_ids: BTreeSet<String>,
}

impl TrialRecord {
    /// Build from raw export fields. The phase label must be one of
    /// "Phase 1" .. "Phase 4"; the MeSH code is canonicalized here so
    /// that nothing downstream ever sees a raw code.
    pub fn from_fields(
        cancer_name: &str,
        raw_mesh: &str,
        drug_name: &str,
        phase_label: &str,
        start_year: i32,
        completion_year: i32,
        joined_trial_ids: &str,
    ) -> Result<Self> {
        let phase = TrialPhase::from_label(phase_label)?;
        let trial_ids = joined_trial_ids
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Ok(Self {
            cancer_name: cancer_name.to_string(),
            mesh_id: canonical_mesh_id(raw_mesh),
            drug_name: drug_name.to_string(),
            phase,
            start_year,
            completion_year,
            trial_ids,
        })
    }
}

/// Studies of one phase against one cancer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudyEntry {
    pub start_year: i32,
    pub trial_ids: BTreeSet<String>,
}

/// All trials of one cancer under one drug, grouped by phase.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancerTrials {
    pub cancer_name: String,
    pub mesh_id: String,
    pub by_phase: BTreeMap<TrialPhase, Vec<StudyEntry>>,
}

/// One profile per distinct drug observed in the trial feed: the cancers
/// it was tried against and the phases reached. Created on first sighting
/// and mutated via [`KinaseInhibitorProfile::add_study`]; never deleted
/// within a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KinaseInhibitorProfile {
    pub drug_name: String,
    /// mesh_id → trials, in deterministic key order.
    pub cancers: BTreeMap<String, CancerTrials>,
}

impl KinaseInhibitorProfile {
    pub fn new(drug_name: impl Into<String>) -> Self {
        Self {
            drug_name: drug_name.into(),
            cancers: BTreeMap::new(),
        }
    }

    pub fn add_study(
        &mut self,
        cancer_name: &str,
        mesh_id: &str,
        phase: TrialPhase,
        start_year: i32,
        trial_ids: BTreeSet<String>,
    ) {
        let cancer = self
            .cancers
            .entry(mesh_id.to_string())
            .or_insert_with(|| CancerTrials {
                cancer_name: cancer_name.to_string(),
                mesh_id: mesh_id.to_string(),
                by_phase: BTreeMap::new(),
            });
        cancer
            .by_phase
            .entry(phase)
            .or_default()
            .push(StudyEntry { start_year, trial_ids });
    }

    pub fn n_studies(&self) -> usize {
        self.cancers
            .values()
            .flat_map(|c| c.by_phase.values())
            .map(|studies| studies.len())
            .sum()
    }
}

/// Flattened (cancer, drug, phase, year) row produced by the link views
/// and consumed by the link resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrialLink {
    pub cancer_name: String,
    pub mesh_id: String,
    pub drug_name: String,
    pub phase: TrialPhase,
    pub start_year: i32,
    pub trial_ids: BTreeSet<String>,
}

/// Expected first column of the trial export header.
const TRIAL_HEADER_PREFIX: &str = "disease";
const TRIAL_FIELD_COUNT: usize = 7;

/// Parsed trial export plus the per-drug profile aggregation.
#[derive(Debug, Clone, Default)]
pub struct ClinicalTrialRecordSet {
    records: Vec<TrialRecord>,
    profiles: BTreeMap<String, KinaseInhibitorProfile>,
}

impl ClinicalTrialRecordSet {
    // ── Constructors ─────────────────────────────────────────────────────

    /// Parse the tab-separated trial-by-phase export. The header must
    /// start with "disease"; each row must carry exactly seven fields
    /// with integer years.
    pub fn from_tsv(tsv: &str, source: &str) -> Result<Self> {
        let mut lines = tsv.lines().enumerate();
        match lines.next() {
            Some((_, header)) if header.starts_with(TRIAL_HEADER_PREFIX) => {}
            _ => {
                return Err(OncokinError::MalformedRow {
                    file: source.to_string(),
                    line: 1,
                    detail: "bad header line in trial-by-phase file".to_string(),
                })
            }
        }

        let mut records = Vec::new();
        for (idx, line) in lines {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != TRIAL_FIELD_COUNT {
                return Err(OncokinError::MalformedRow {
                    file: source.to_string(),
                    line: idx + 1,
                    detail: format!("expected {TRIAL_FIELD_COUNT} fields, got {}", fields.len()),
                });
            }
            let parse_year = |raw: &str| -> Result<i32> {
                raw.trim().parse::<i32>().map_err(|_| OncokinError::MalformedRow {
                    file: source.to_string(),
                    line: idx + 1,
                    detail: format!("unparsable year '{raw}'"),
                })
            };
            let record = TrialRecord::from_fields(
                fields[0],
                fields[1],
                fields[2],
                fields[3],
                parse_year(fields[4])?,
                parse_year(fields[5])?,
                fields[6],
            )?;
            records.push(record);
        }
        let mut set = Self::default();
        set.ingest(records);
        info!(
            n_trials = set.records.len(),
            n_drugs = set.profiles.len(),
            source,
            "Ingested clinical trial records"
        );
        Ok(set)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_tsv(&raw, &path.display().to_string())
    }

    /// Ingest already-validated records, aggregating per-drug profiles.
    pub fn ingest(&mut self, records: Vec<TrialRecord>) {
        for record in records {
            let profile = self.profile_for(&record.drug_name);
            profile.add_study(
                &record.cancer_name,
                &record.mesh_id,
                record.phase,
                record.start_year,
                record.trial_ids.clone(),
            );
            self.records.push(record);
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    /// The profile for a drug, created lazily on first sighting.
    pub fn profile_for(&mut self, drug: &str) -> &mut KinaseInhibitorProfile {
        self.profiles
            .entry(drug.to_string())
            .or_insert_with(|| KinaseInhibitorProfile::new(drug))
    }

    pub fn profiles(&self) -> impl Iterator<Item = &KinaseInhibitorProfile> {
        self.profiles.values()
    }

    pub fn drug_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Trial counts per phase.
    pub fn phase_counts(&self) -> BTreeMap<TrialPhase, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.phase).or_insert(0) += 1;
        }
        counts
    }

    // ── Flattened link views (cutoff-agnostic) ───────────────────────────

    /// One row per (drug, cancer, phase, study) over the full history.
    pub fn all_links(&self) -> Vec<TrialLink> {
        self.links_filtered(|_| true)
    }

    /// Same as [`ClinicalTrialRecordSet::all_links`], restricted to
    /// phase-4 studies.
    pub fn phase4_links(&self) -> Vec<TrialLink> {
        self.links_filtered(TrialPhase::is_phase4)
    }

    fn links_filtered(&self, keep: impl Fn(&TrialPhase) -> bool) -> Vec<TrialLink> {
        let mut links = Vec::new();
        for profile in self.profiles.values() {
            for cancer in profile.cancers.values() {
                for (phase, studies) in &cancer.by_phase {
                    if !keep(phase) {
                        continue;
                    }
                    for study in studies {
                        links.push(TrialLink {
                            cancer_name: cancer.cancer_name.clone(),
                            mesh_id: cancer.mesh_id.clone(),
                            drug_name: profile.drug_name.clone(),
                            phase: *phase,
                            start_year: study.start_year,
                            trial_ids: study.trial_ids.clone(),
                        });
                    }
                }
            }
        }
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TRIAL_TSV: &str = "disease\tmesh_id\tdrug\tphase\tstart_date\tcompletion_date\tnct_id\n\
        Carcinoma, Non-Small-Cell Lung\tD002289\tafatinib\tPhase 4\t2014\t2020\tNCT04413201;NCT02695290\n\
        Multiple Myeloma\tD009101\tafatinib\tPhase 1\t2020\t2020\tNCT03878524\n\
        Multiple Myeloma\tD009101\tafatinib\tPhase 2\t2015\t2016\tNCT02693535\n";

    #[test]
    fn test_parse_groups_by_drug_and_cancer() {
        let set = ClinicalTrialRecordSet::from_tsv(TRIAL_TSV, "ct_by_phase.tsv").unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.drug_names(), vec!["afatinib"]);

        let profile = set.profiles().next().unwrap();
        assert_eq!(profile.cancers.len(), 2);
        assert_eq!(profile.n_studies(), 3);

        let nsclc = &profile.cancers["meshd002289"];
        assert_eq!(nsclc.cancer_name, "Carcinoma, Non-Small-Cell Lung");
        let phase4 = &nsclc.by_phase[&TrialPhase::Phase4];
        assert_eq!(phase4.len(), 1);
        assert_eq!(phase4[0].start_year, 2014);
        assert_eq!(phase4[0].trial_ids.len(), 2);
    }

    #[test]
    fn test_rejects_bad_header() {
        let bad = "illness\tmesh_id\tdrug\tphase\tstart\tend\tnct\n";
        assert!(matches!(
            ClinicalTrialRecordSet::from_tsv(bad, "ct.tsv"),
            Err(OncokinError::MalformedRow { line: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_arity_and_year() {
        let short = "disease\tmesh_id\tdrug\tphase\tstart\tend\tnct\n\
                     Multiple Myeloma\tD009101\tafatinib\tPhase 1\t2020\n";
        assert!(ClinicalTrialRecordSet::from_tsv(short, "ct.tsv").is_err());

        let bad_year = "disease\tmesh_id\tdrug\tphase\tstart\tend\tnct\n\
                        Multiple Myeloma\tD009101\tafatinib\tPhase 1\tsoon\t2020\tNCT1\n";
        assert!(ClinicalTrialRecordSet::from_tsv(bad_year, "ct.tsv").is_err());
    }

    #[test]
    fn test_rejects_invalid_phase() {
        let bad_phase = "disease\tmesh_id\tdrug\tphase\tstart\tend\tnct\n\
                         Multiple Myeloma\tD009101\tafatinib\tEarly Phase 1\t2020\t2020\tNCT1\n";
        assert!(matches!(
            ClinicalTrialRecordSet::from_tsv(bad_phase, "ct.tsv"),
            Err(OncokinError::InvalidPhase(_))
        ));
    }

    #[test]
    fn test_all_links_returns_full_history() {
        let set = ClinicalTrialRecordSet::from_tsv(TRIAL_TSV, "ct_by_phase.tsv").unwrap();
        let all = set.all_links();
        assert_eq!(all.len(), 3);
        // No year filtering at this layer: both the 2014 and 2020 rows are
        // present.
        assert!(all.iter().any(|l| l.start_year == 2014));
        assert!(all.iter().any(|l| l.start_year == 2020));
    }

    #[test]
    fn test_phase4_links_restricts_phase() {
        let set = ClinicalTrialRecordSet::from_tsv(TRIAL_TSV, "ct_by_phase.tsv").unwrap();
        let phase4 = set.phase4_links();
        assert_eq!(phase4.len(), 1);
        assert_eq!(phase4[0].mesh_id, "meshd002289");
        assert_eq!(phase4[0].phase, TrialPhase::Phase4);
    }

    #[test]
    fn test_mesh_ids_are_canonical() {
        let set = ClinicalTrialRecordSet::from_tsv(TRIAL_TSV, "ct_by_phase.tsv").unwrap();
        for record in set.records() {
            assert!(record.mesh_id.starts_with("meshd"));
        }
    }

    #[test]
    fn test_semicolon_joined_trial_ids_split() {
        let record = TrialRecord::from_fields(
            "Carcinoma, Non-Small-Cell Lung",
            "D002289",
            "afatinib",
            "Phase 1",
            2009,
            2020,
            "NCT01999985;NCT03054038;NCT04448379",
        )
        .unwrap();
        assert_eq!(record.trial_ids.len(), 3);
        assert!(record.trial_ids.contains("NCT03054038"));
    }
}
