//! Temporal, leakage-aware assembly of labeled (kinase, cancer) link
//! sets.
//!
//! The assembler simulates a training "now" with a cutoff year and emits
//! four disjoint universes from the resolved link rows:
//!
//! - positive training: phase-4 links with start year at or before the
//!   cutoff (post-approval trials are the ground-truth signal);
//! - negative training: rejection-sampled pairs from the full
//!   gene × MeSH cross product, excluding anything tested at *any* phase
//!   up to the cutoff — a pair in a phase-1 trial is not a safe negative;
//! - positive test: links starting inside a later window, minus anything
//!   already known at the cutoff (the leakage guard);
//! - negative test: further rejection samples, additionally disjoint from
//!   the training negatives.
//!
//! All year comparisons are inclusive on both bounds. Sampling is bounded
//! by an attempt ceiling and fails loudly rather than returning a short
//! sample.

use std::collections::BTreeSet;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use oncokin_common::{Link, OncokinError, Result, SamplerSettings, TrialPhase};

use crate::resolver::ResolvedLink;
use crate::sampler::RandomSource;

/// Which trial phases count when building a positive set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PhaseFilter {
    AllPhases,
    Phase4Only,
}

/// The four label sets of one historical experiment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LabelSets {
    pub positive_training: BTreeSet<Link>,
    pub negative_training: BTreeSet<Link>,
    pub positive_test: BTreeSet<Link>,
    pub negative_test: BTreeSet<Link>,
}

/// Training sets plus the untried cross product, for novel predictions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NovelPredictionSets {
    pub positive_training: BTreeSet<Link>,
    pub negative_training: BTreeSet<Link>,
    pub candidates: Vec<Link>,
}

/// Cutoff-year label-set assembly over an immutable snapshot of resolved
/// links. Instances own nothing mutable: each call builds transient sets
/// from the inputs the assembler was constructed with, so read-only
/// sharing across experiments is safe.
#[derive(Debug, Clone)]
pub struct DatasetAssembler {
    /// Resolved rows over every phase, full history, undeduplicated.
    all_phases: Vec<ResolvedLink>,
    /// Resolved rows restricted to phase 4, full history.
    phase4: Vec<ResolvedLink>,
    /// Every canonical gene id in the kinome reference.
    gene_universe: Vec<String>,
    /// Every canonical MeSH id in the cancer vocabulary.
    mesh_universe: Vec<String>,
    settings: SamplerSettings,
}

impl DatasetAssembler {
    pub fn new(
        all_phases: Vec<ResolvedLink>,
        phase4: Vec<ResolvedLink>,
        gene_universe: Vec<String>,
        mesh_universe: Vec<String>,
        settings: SamplerSettings,
    ) -> Result<Self> {
        if all_phases.is_empty() {
            return Err(OncokinError::EmptyDataset(
                "no resolved trial links".to_string(),
            ));
        }
        if gene_universe.is_empty() || mesh_universe.is_empty() {
            return Err(OncokinError::EmptyDataset(
                "kinase or cancer universe is empty".to_string(),
            ));
        }
        Ok(Self {
            all_phases,
            phase4,
            gene_universe,
            mesh_universe,
            settings,
        })
    }

    // ── Positive sets ────────────────────────────────────────────────────

    /// Ground-truth positives for training: every phase-4 link with
    /// start year at or before the cutoff. Monotone in the cutoff year.
    pub fn positive_training_set(&self, cutoff_year: i32) -> BTreeSet<Link> {
        self.phase4
            .iter()
            .filter(|r| r.start_year <= cutoff_year)
            .map(ResolvedLink::link)
            .collect()
    }

    /// Everything known at the cutoff, at any phase. This is the
    /// exclusion universe for negative sampling and the leakage guard for
    /// test positives: tested-at-all means not-a-negative and
    /// not-new-knowledge.
    pub fn known_links_as_of(&self, cutoff_year: i32) -> BTreeSet<Link> {
        self.all_phases
            .iter()
            .filter(|r| r.start_year <= cutoff_year)
            .map(ResolvedLink::link)
            .collect()
    }

    /// Positive examples for a historical test window: links (under the
    /// phase filter) starting in `[begin_year, end_year]`, minus anything
    /// already known at the cutoff.
    pub fn positive_test_set(
        &self,
        cutoff_year: i32,
        begin_year: i32,
        end_year: i32,
        phase_filter: PhaseFilter,
    ) -> Result<BTreeSet<Link>> {
        if begin_year < cutoff_year || end_year < begin_year {
            return Err(OncokinError::InvalidYearRange {
                begin: begin_year,
                end: end_year,
                cutoff: cutoff_year,
            });
        }
        let rows = match phase_filter {
            PhaseFilter::AllPhases => &self.all_phases,
            PhaseFilter::Phase4Only => &self.phase4,
        };
        let known = self.known_links_as_of(cutoff_year);
        let mut n_skipped = 0usize;
        let mut test_links = BTreeSet::new();
        for row in rows
            .iter()
            .filter(|r| r.start_year >= begin_year && r.start_year <= end_year)
        {
            let link = row.link();
            // A test example must be new knowledge relative to training
            // time.
            if known.contains(&link) {
                n_skipped += 1;
                continue;
            }
            test_links.insert(link);
        }
        info!(
            n_skipped,
            n_test = test_links.len(),
            cutoff_year,
            begin_year,
            end_year,
            "Built positive test set (skipped links already known at training time)"
        );
        Ok(test_links)
    }

    // ── Negative sets ────────────────────────────────────────────────────

    /// Rejection-sample `factor × |positive|` pairs from the cross
    /// product, excluding everything known at the cutoff and intra-set
    /// duplicates.
    pub fn negative_training_set(
        &self,
        positive: &BTreeSet<Link>,
        cutoff_year: i32,
        factor: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<BTreeSet<Link>> {
        let quota = positive.len() * factor;
        let known = self.known_links_as_of(cutoff_year);
        self.sample_negatives(quota, &[&known], rng)
    }

    /// Rejection-sample `count` test negatives: excluded from everything
    /// known at the cutoff *and* from the training negatives, so the test
    /// never trivially reuses training signal.
    pub fn negative_test_set(
        &self,
        training_negatives: &BTreeSet<Link>,
        cutoff_year: i32,
        count: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<BTreeSet<Link>> {
        let known = self.known_links_as_of(cutoff_year);
        self.sample_negatives(count, &[&known, training_negatives], rng)
    }

    fn sample_negatives(
        &self,
        quota: usize,
        exclude: &[&BTreeSet<Link>],
        rng: &mut dyn RandomSource,
    ) -> Result<BTreeSet<Link>> {
        let mut negatives = BTreeSet::new();
        let mut attempts = 0u64;
        let mut n_skipped = 0u64;
        while negatives.len() < quota && attempts < self.settings.attempt_ceiling {
            attempts += 1;
            let gene_id = &self.gene_universe[rng.pick(self.gene_universe.len())];
            let mesh_id = &self.mesh_universe[rng.pick(self.mesh_universe.len())];
            let link = Link::new(gene_id.clone(), mesh_id.clone());
            // Colliding with a known positive or an earlier draw happens
            // by chance and is not worrisome, but we count it.
            if exclude.iter().any(|set| set.contains(&link)) || negatives.contains(&link) {
                n_skipped += 1;
                continue;
            }
            negatives.insert(link);
        }
        if negatives.len() < quota {
            return Err(OncokinError::NegativeSamplingExhausted {
                requested: quota,
                obtained: negatives.len(),
                attempts,
            });
        }
        debug!(
            quota,
            attempts, n_skipped, "Rejection sampling met its negative quota"
        );
        Ok(negatives)
    }

    // ── Novel predictions ────────────────────────────────────────────────

    /// The full gene × MeSH cross product minus every positive link ever
    /// observed, regardless of year: the "not yet tried" candidate space.
    /// Deterministic order (gene-major, following the two universes).
    pub fn novel_prediction_set(&self) -> Vec<Link> {
        let observed: BTreeSet<Link> = self.all_phases.iter().map(ResolvedLink::link).collect();
        let mut candidates = Vec::new();
        for gene_id in &self.gene_universe {
            for mesh_id in &self.mesh_universe {
                let link = Link::new(gene_id.clone(), mesh_id.clone());
                if !observed.contains(&link) {
                    candidates.push(link);
                }
            }
        }
        info!(
            n_candidates = candidates.len(),
            n_observed = observed.len(),
            "Built novel prediction candidate set"
        );
        candidates
    }

    /// Training sets up to the current year plus the untried candidate
    /// space, for a novel-prediction run.
    pub fn novel_prediction_run(
        &self,
        factor: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<NovelPredictionSets> {
        let cutoff_year = chrono::Utc::now().year();
        let positive_training = self.positive_training_set(cutoff_year);
        let negative_training =
            self.negative_training_set(&positive_training, cutoff_year, factor, rng)?;
        Ok(NovelPredictionSets {
            positive_training,
            negative_training,
            candidates: self.novel_prediction_set(),
        })
    }

    // ── Convenience ──────────────────────────────────────────────────────

    /// The four label sets of one historical experiment. Test negatives
    /// are drawn at `factor ×` the positive test count, mirroring the
    /// training ratio.
    pub fn training_and_test_sets(
        &self,
        cutoff_year: i32,
        begin_year: i32,
        end_year: i32,
        factor: usize,
        phase_filter: PhaseFilter,
        rng: &mut dyn RandomSource,
    ) -> Result<LabelSets> {
        let positive_training = self.positive_training_set(cutoff_year);
        let negative_training =
            self.negative_training_set(&positive_training, cutoff_year, factor, rng)?;
        let positive_test =
            self.positive_test_set(cutoff_year, begin_year, end_year, phase_filter)?;
        let negative_test = self.negative_test_set(
            &negative_training,
            cutoff_year,
            positive_test.len() * factor,
            rng,
        )?;
        Ok(LabelSets {
            positive_training,
            negative_training,
            positive_test,
            negative_test,
        })
    }

    /// Labelled counts describing the assembled dataset, for display in a
    /// notebook or report.
    pub fn summary(&self) -> Vec<(String, String)> {
        let mut rows = Vec::new();
        rows.push((
            "Resolved kinase-cancer link rows (all phases)".to_string(),
            self.all_phases.len().to_string(),
        ));
        for phase in TrialPhase::ALL {
            let n = self.all_phases.iter().filter(|r| r.phase == phase).count();
            rows.push((
                format!("{} link rows included in this analysis", phase.as_str()),
                n.to_string(),
            ));
        }
        rows.push((
            "Protein kinases in reference universe".to_string(),
            self.gene_universe.len().to_string(),
        ));
        rows.push((
            "MeSH ids for cancer concepts".to_string(),
            self.mesh_universe.len().to_string(),
        ));
        rows
    }
}
