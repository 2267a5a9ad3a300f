//! Core entity types for the kinase/cancer dataset pipeline.
//! These are the value types shared by the ingest and dataset crates.

use serde::{Deserialize, Serialize};

use crate::{OncokinError, Result};

// ---------------------------------------------------------------------------
// Clinical trial phase
// ---------------------------------------------------------------------------

/// Clinical trial phase. The trial export encodes these as "Phase 1" ..
/// "Phase 4"; anything else is rejected at construction time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TrialPhase {
    Phase1,
    Phase2,
    Phase3,
    Phase4,
}

impl TrialPhase {
    /// Parse from the "Phase N" label used in the trial-by-phase export.
    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim() {
            "Phase 1" => Ok(TrialPhase::Phase1),
            "Phase 2" => Ok(TrialPhase::Phase2),
            "Phase 3" => Ok(TrialPhase::Phase3),
            "Phase 4" => Ok(TrialPhase::Phase4),
            other => Err(OncokinError::InvalidPhase(other.to_string())),
        }
    }

    /// The label as it appears in the trial-by-phase export.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrialPhase::Phase1 => "Phase 1",
            TrialPhase::Phase2 => "Phase 2",
            TrialPhase::Phase3 => "Phase 3",
            TrialPhase::Phase4 => "Phase 4",
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            TrialPhase::Phase1 => 1,
            TrialPhase::Phase2 => 2,
            TrialPhase::Phase3 => 3,
            TrialPhase::Phase4 => 4,
        }
    }

    /// Phase 4 trials are post-approval and treated as confirmatory
    /// evidence of a drug-disease association.
    pub fn is_phase4(&self) -> bool {
        matches!(self, TrialPhase::Phase4)
    }

    pub const ALL: [TrialPhase; 4] = [
        TrialPhase::Phase1,
        TrialPhase::Phase2,
        TrialPhase::Phase3,
        TrialPhase::Phase4,
    ];
}

// ---------------------------------------------------------------------------
// Reference identities
// ---------------------------------------------------------------------------

/// One row of the protein-kinase reference table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KinaseIdentity {
    /// HGNC-style gene symbol, e.g. "EGFR". Unique key.
    pub symbol: String,
    /// Canonical gene id, e.g. "ncbigene1956".
    pub gene_id: String,
    /// Ensembl gene id as carried in the reference file.
    pub ensembl_id: String,
}

/// One row of the cancer vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CancerIdentity {
    /// Canonical MeSH id, e.g. "meshd002289".
    pub mesh_id: String,
    /// Display label, e.g. "Carcinoma, Non-Small-Cell Lung".
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Canonical id forms
// ---------------------------------------------------------------------------

/// Canonical MeSH id: lower-case only the first character of the raw code
/// and prefix with "mesh". "D002289" becomes "meshd002289". Every
/// downstream join depends on this exact textual form, and re-applying the
/// transform to an already-canonical id is a no-op.
pub fn canonical_mesh_id(raw: &str) -> String {
    if let Some(code) = raw.strip_prefix("mesh") {
        // Already canonical if the type letter is lower case.
        let mut chars = code.chars();
        if let Some(first) = chars.next() {
            if first.is_lowercase() {
                return raw.to_string();
            }
            let mut id = String::with_capacity(raw.len());
            id.push_str("mesh");
            id.extend(first.to_lowercase());
            id.push_str(chars.as_str());
            return id;
        }
        return raw.to_string();
    }
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => {
            let mut id = String::with_capacity(raw.len() + 4);
            id.push_str("mesh");
            id.extend(first.to_lowercase());
            id.push_str(chars.as_str());
            id
        }
        None => String::from("mesh"),
    }
}

/// Canonical gene id: "ncbigene" + the numeric NCBI gene id, with no other
/// transformation. Idempotent on an already-prefixed id.
pub fn canonical_gene_id(raw: &str) -> String {
    if raw.starts_with("ncbigene") {
        raw.to_string()
    } else {
        format!("ncbigene{}", raw.trim())
    }
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// The atomic unit of the label sets: one (kinase, cancer) pair keyed by
/// canonical gene id and MeSH id. Compared and hashed by value so it can
/// live in the positive / negative / test universes, which must stay
/// mutually disjoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Link {
    /// Canonical gene id, e.g. "ncbigene1956".
    pub gene_id: String,
    /// Canonical MeSH id, e.g. "meshd002289".
    pub mesh_id: String,
}

impl Link {
    pub fn new(gene_id: impl Into<String>, mesh_id: impl Into<String>) -> Self {
        Self {
            gene_id: gene_id.into(),
            mesh_id: mesh_id.into(),
        }
    }

    /// The key under which this pair's feature vector is stored,
    /// e.g. "ncbigene1956-meshd002289".
    pub fn embedding_key(&self) -> String {
        format!("{}-{}", self.gene_id, self.mesh_id)
    }

    /// Inverse of [`Link::embedding_key`].
    pub fn parse_key(key: &str) -> Result<Self> {
        match key.split_once('-') {
            Some((gene_id, mesh_id)) if !gene_id.is_empty() && !mesh_id.is_empty() => {
                Ok(Link::new(gene_id, mesh_id))
            }
            _ => Err(OncokinError::MalformedRecord(format!(
                "not a gene-mesh key: '{key}'"
            ))),
        }
    }
}

impl std::fmt::Display for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.gene_id, self.mesh_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_phase_label_round_trip() {
        for phase in TrialPhase::ALL {
            assert_eq!(TrialPhase::from_label(phase.as_str()).unwrap(), phase);
        }
    }

    #[test]
    fn test_phase_rejects_unknown_label() {
        assert!(matches!(
            TrialPhase::from_label("Early Phase 1"),
            Err(OncokinError::InvalidPhase(_))
        ));
        assert!(TrialPhase::from_label("Phase 5").is_err());
    }

    #[test]
    fn test_canonical_mesh_id() {
        assert_eq!(canonical_mesh_id("D002289"), "meshd002289");
        assert_eq!(canonical_mesh_id("C535575"), "meshc535575");
        // Idempotent on canonical input
        assert_eq!(canonical_mesh_id("meshd002289"), "meshd002289");
    }

    #[test]
    fn test_canonical_gene_id() {
        assert_eq!(canonical_gene_id("1956"), "ncbigene1956");
        assert_eq!(canonical_gene_id("ncbigene1956"), "ncbigene1956");
    }

    #[test]
    fn test_link_equality_is_by_value() {
        let a = Link::new("ncbigene1956", "meshd002289");
        let b = Link::new("ncbigene1956", "meshd002289");
        assert_eq!(a, b);

        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn test_embedding_key_round_trip() {
        let link = Link::new("ncbigene7010", "meshd018195");
        let key = link.embedding_key();
        assert_eq!(key, "ncbigene7010-meshd018195");
        assert_eq!(Link::parse_key(&key).unwrap(), link);
    }

    #[test]
    fn test_parse_key_rejects_garbage() {
        assert!(Link::parse_key("ncbigene7010").is_err());
        assert!(Link::parse_key("-meshd018195").is_err());
    }
}
