//! PKI↔PK affinity links from a DrugCentral-style export.
//!
//! The affinity table has one row per (inhibitor, kinase, evidence)
//! triple with an optional activity value in micromolar. A link is
//! considered trustworthy when its activity value is at or below the
//! cutoff (default 0.03 µM = 30 nM), or when it carries no value at all —
//! those rows come from a curated positive source rather than a
//! quantitative screen and are provisionally valid. Inhibitors that pass
//! the cutoff against too many kinases are reduced by rank: their broad
//! target profile would dilute any single kinase-cancer signal.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use oncokin_common::{FilterSettings, OncokinError, Result};

/// Recognized activity measurement kinds. Anything else in the ACT_TYPE
/// column is a data-integrity problem and fails the load.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ActivityKind {
    Kd,
    Ki,
    Ic50,
    Ec50,
    /// Row carried no measurement kind (evidence-only entries).
    Unspecified,
}

impl ActivityKind {
    /// Parse the ACT_TYPE column. Empty or single-character values are
    /// treated as unspecified, matching the source export convention.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.len() <= 1 {
            return Ok(ActivityKind::Unspecified);
        }
        match trimmed {
            "Kd" => Ok(ActivityKind::Kd),
            "Ki" => Ok(ActivityKind::Ki),
            "IC50" => Ok(ActivityKind::Ic50),
            "EC50" => Ok(ActivityKind::Ec50),
            other => Err(OncokinError::MalformedRecord(format!(
                "unrecognized ACT_TYPE: {other}"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Kd => "Kd",
            ActivityKind::Ki => "Ki",
            ActivityKind::Ic50 => "IC50",
            ActivityKind::Ec50 => "EC50",
            ActivityKind::Unspecified => "",
        }
    }
}

/// One raw row of the affinity table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AffinityRecord {
    pub inhibitor: String,
    pub kinase_symbol: String,
    /// Activity in micromolar. `None` means the link came from a curated
    /// positive source with no quantitative screen behind it.
    pub activity_value: Option<f64>,
    pub activity_kind: ActivityKind,
    /// PubMed id (or similar) backing this row.
    pub evidence_id: String,
}

impl AffinityRecord {
    /// Evidence-only rows are provisionally valid; quantified rows must be
    /// at or below the threshold.
    pub fn is_valid_or_not_provided(&self, act_threshold_um: f64) -> bool {
        match self.activity_value {
            None => true,
            Some(v) => v <= act_threshold_um,
        }
    }
}

/// A retained (inhibitor, kinase) edge after filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidatedLink {
    pub inhibitor: String,
    pub kinase_symbol: String,
    pub activity_value: Option<f64>,
    pub evidence_id: String,
}

impl ValidatedLink {
    /// Ordering by affinity: lower activity value means stronger binding
    /// and sorts first. Links with no value sort last — they are the
    /// weakest evidence, never the strongest.
    pub fn affinity_cmp(&self, other: &Self) -> Ordering {
        match (self.activity_value, other.activity_value) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }

    /// The ACT_VALUE cell for the export table; "n/a" when missing.
    pub fn activity_cell(&self) -> String {
        match self.activity_value {
            Some(v) => format!("{v}"),
            None => "n/a".to_string(),
        }
    }
}

/// Expected header prefix of the affinity export.
const AFFINITY_HEADER: [&str; 5] = ["PKI", "PK", "PMID", "ACT_VALUE (uM)", "ACT_TYPE"];

/// In-memory store of raw affinity records with threshold + promiscuity
/// filtering.
#[derive(Debug, Clone, Default)]
pub struct AffinityLinkStore {
    records: Vec<AffinityRecord>,
}

impl AffinityLinkStore {
    // ── Constructors ─────────────────────────────────────────────────────

    pub fn from_records(records: Vec<AffinityRecord>) -> Self {
        Self { records }
    }

    /// Read the tab-separated affinity export. The header must match the
    /// DrugCentral-style column set; every data row must carry exactly
    /// five fields.
    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        for (i, expected) in AFFINITY_HEADER.iter().enumerate() {
            if headers.get(i) != Some(expected) {
                return Err(OncokinError::MalformedRow {
                    file: source.to_string(),
                    line: 1,
                    detail: format!(
                        "bad affinity header, expected column {} to be '{expected}'",
                        i + 1
                    ),
                });
            }
        }

        let mut records = Vec::new();
        for (idx, row) in rdr.records().enumerate() {
            let row = row?;
            let line = idx + 2; // header is line 1
            if row.len() != AFFINITY_HEADER.len() {
                return Err(OncokinError::MalformedRow {
                    file: source.to_string(),
                    line,
                    detail: format!("expected {} fields, got {}", AFFINITY_HEADER.len(), row.len()),
                });
            }
            let raw_value = row.get(3).unwrap_or("").trim();
            let activity_value = if raw_value.is_empty() {
                None
            } else {
                Some(raw_value.parse::<f64>().map_err(|_| OncokinError::MalformedRow {
                    file: source.to_string(),
                    line,
                    detail: format!("unparsable ACT_VALUE '{raw_value}'"),
                })?)
            };
            let activity_kind = ActivityKind::parse(row.get(4).unwrap_or(""))?;
            records.push(AffinityRecord {
                inhibitor: row.get(0).unwrap_or("").to_string(),
                kinase_symbol: row.get(1).unwrap_or("").to_string(),
                activity_value,
                activity_kind,
                evidence_id: row.get(2).unwrap_or("").to_string(),
            });
        }
        info!(n = records.len(), source, "Ingested PKI/PK affinity links");
        Ok(Self { records })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, &path.display().to_string())
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[AffinityRecord] {
        &self.records
    }

    // ── Filtering ────────────────────────────────────────────────────────

    /// Group validity candidates by inhibitor at the given threshold.
    fn candidates(&self, act_threshold_um: f64) -> BTreeMap<String, Vec<ValidatedLink>> {
        let mut by_inhibitor: BTreeMap<String, Vec<ValidatedLink>> = BTreeMap::new();
        for rec in &self.records {
            if rec.is_valid_or_not_provided(act_threshold_um) {
                by_inhibitor
                    .entry(rec.inhibitor.clone())
                    .or_default()
                    .push(ValidatedLink {
                        inhibitor: rec.inhibitor.clone(),
                        kinase_symbol: rec.kinase_symbol.clone(),
                        activity_value: rec.activity_value,
                        evidence_id: rec.evidence_id.clone(),
                    });
            }
        }
        by_inhibitor
    }

    /// Retained links per inhibitor at the given threshold, with the
    /// promiscuity cap applied by rank-and-truncate: candidates are sorted
    /// by ascending activity value (missing values last) and only the
    /// first `promiscuity_limit` survive.
    pub fn filter(
        &self,
        promiscuity_limit: usize,
        act_threshold_um: f64,
    ) -> Result<BTreeMap<String, Vec<ValidatedLink>>> {
        if self.records.is_empty() {
            return Err(OncokinError::EmptyDataset(
                "no affinity records loaded".to_string(),
            ));
        }
        let mut retained = self.candidates(act_threshold_um);
        let mut n_links = 0usize;
        for (inhibitor, links) in retained.iter_mut() {
            if links.len() > promiscuity_limit {
                warn!(
                    inhibitor = inhibitor.as_str(),
                    n_candidates = links.len(),
                    limit = promiscuity_limit,
                    "Inhibitor is too promiscuous, keeping only the highest-affinity links"
                );
                links.sort_by(|a, b| a.affinity_cmp(b));
                links.truncate(promiscuity_limit);
            }
            debug!(inhibitor = inhibitor.as_str(), n_kinases = links.len(), "Retained links");
            n_links += links.len();
        }
        info!(
            n_inhibitors = retained.len(),
            n_links, "Extracted filtered PKI<->PK interactions"
        );
        Ok(retained)
    }

    /// Filter with the published defaults (30 nM, 5 kinases per PKI).
    pub fn filter_with_defaults(&self) -> Result<BTreeMap<String, Vec<ValidatedLink>>> {
        let defaults = FilterSettings::default();
        self.filter(defaults.promiscuity_limit, defaults.act_threshold_um)
    }

    /// Every validity candidate at the given threshold with no promiscuity
    /// cap. Used as the conservative exclusion universe: a pair that was
    /// screened at any credible affinity is not a safe negative, whether
    /// or not it survived truncation.
    pub fn all_links(&self, act_threshold_um: f64) -> Result<BTreeMap<String, Vec<ValidatedLink>>> {
        if self.records.is_empty() {
            return Err(OncokinError::EmptyDataset(
                "no affinity records loaded".to_string(),
            ));
        }
        Ok(self.candidates(act_threshold_um))
    }

    // ── Export ───────────────────────────────────────────────────────────

    /// Serialize the filtered mapping as the tab-separated link table
    /// consumed downstream: PKI, PK, ACT_VALUE ("n/a" when missing), PMID.
    pub fn export(
        &self,
        path: impl AsRef<Path>,
        promiscuity_limit: usize,
        act_threshold_um: f64,
    ) -> Result<()> {
        let retained = self.filter(promiscuity_limit, act_threshold_um)?;
        let mut out = String::from("PKI\tPK\tACT_VALUE\tPMID\n");
        let mut n_rows = 0usize;
        for links in retained.values() {
            for link in links {
                out.push_str(&format!(
                    "{}\t{}\t{}\t{}\n",
                    link.inhibitor,
                    link.kinase_symbol,
                    link.activity_cell(),
                    link.evidence_id
                ));
                n_rows += 1;
            }
        }
        std::fs::write(path.as_ref(), out)?;
        info!(
            n_rows,
            path = %path.as_ref().display(),
            limit = promiscuity_limit,
            threshold = act_threshold_um,
            "Wrote PKI/PK link table"
        );
        Ok(())
    }

    /// Re-parse a table written by [`AffinityLinkStore::export`].
    pub fn parse_exported(raw: &str, source: &str) -> Result<Vec<ValidatedLink>> {
        let mut lines = raw.lines().enumerate();
        match lines.next() {
            Some((_, header)) if header.starts_with("PKI") => {}
            _ => {
                return Err(OncokinError::MalformedRow {
                    file: source.to_string(),
                    line: 1,
                    detail: "bad header of drug-kinase link table".to_string(),
                })
            }
        }
        let mut links = Vec::new();
        for (idx, line) in lines {
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 4 {
                return Err(OncokinError::MalformedRow {
                    file: source.to_string(),
                    line: idx + 1,
                    detail: format!("expected 4 fields, got {}", fields.len()),
                });
            }
            let activity_value = match fields[2] {
                "n/a" => None,
                raw => Some(raw.parse::<f64>().map_err(|_| OncokinError::MalformedRow {
                    file: source.to_string(),
                    line: idx + 1,
                    detail: format!("unparsable ACT_VALUE '{raw}'"),
                })?),
            };
            links.push(ValidatedLink {
                inhibitor: fields[0].to_string(),
                kinase_symbol: fields[1].to_string(),
                activity_value,
                evidence_id: fields[3].to_string(),
            });
        }
        Ok(links)
    }
}
