//! Static reference tables: protein-kinase symbols and the cancer
//! vocabulary.
//!
//! Both files are headerless TSVs loaded once per run and read-only
//! thereafter. Lookups come in two flavours: the single-key form fails
//! fast on a missing entry; the batch form skips and counts, because gaps
//! in gene-id or embedding coverage are expected and must be surfaced to
//! the caller rather than silently dropped.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use oncokin_common::entities::{canonical_gene_id, canonical_mesh_id, CancerIdentity, KinaseIdentity};
use oncokin_common::{OncokinError, Result};

/// How many keys a batch lookup skipped, out of how many were asked for.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkipCount {
    pub skipped: usize,
    pub total: usize,
}

impl SkipCount {
    pub fn resolved(&self) -> usize {
        self.total - self.skipped
    }
}

// ---------------------------------------------------------------------------
// Kinase reference table
// ---------------------------------------------------------------------------

/// Symbol ↔ gene-id mapping for the protein kinome, from a headerless
/// 4-column TSV: symbol, description, NCBI gene id, Ensembl id.
#[derive(Debug, Clone)]
pub struct KinaseReferenceTable {
    by_symbol: HashMap<String, KinaseIdentity>,
    by_gene_id: HashMap<String, String>, // gene_id -> symbol
    // Keeps the file's row order for deterministic universe iteration.
    symbols: Vec<String>,
}

impl KinaseReferenceTable {
    pub fn from_tsv(tsv: &str, source: &str) -> Result<Self> {
        let mut by_symbol = HashMap::new();
        let mut by_gene_id = HashMap::new();
        let mut symbols = Vec::new();

        for (idx, line) in tsv.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() != 4 {
                return Err(OncokinError::MalformedRow {
                    file: source.to_string(),
                    line: idx + 1,
                    detail: format!("expected 4 fields, got {}", fields.len()),
                });
            }
            let symbol = fields[0].trim().to_string();
            if by_symbol.contains_key(&symbol) {
                warn!(
                    symbol = symbol.as_str(),
                    line = idx + 1,
                    "Duplicate kinase symbol, keeping the first row"
                );
                continue;
            }
            let identity = KinaseIdentity {
                symbol: symbol.clone(),
                gene_id: canonical_gene_id(fields[2].trim()),
                ensembl_id: fields[3].trim().to_string(),
            };
            by_gene_id.insert(identity.gene_id.clone(), symbol.clone());
            by_symbol.insert(symbol.clone(), identity);
            symbols.push(symbol);
        }
        info!(n = symbols.len(), source, "Ingested protein kinase reference table");
        Ok(Self {
            by_symbol,
            by_gene_id,
            symbols,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_tsv(&raw, &path.display().to_string())
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Canonical gene id for a symbol; fails fast when absent.
    pub fn symbol_to_gene_id(&self, symbol: &str) -> Result<&str> {
        self.by_symbol
            .get(symbol)
            .map(|k| k.gene_id.as_str())
            .ok_or_else(|| OncokinError::UnknownKinase(symbol.to_string()))
    }

    pub fn gene_id_to_symbol(&self, gene_id: &str) -> Result<&str> {
        self.by_gene_id
            .get(gene_id)
            .map(|s| s.as_str())
            .ok_or_else(|| OncokinError::UnknownKinase(gene_id.to_string()))
    }

    pub fn identity(&self, symbol: &str) -> Option<&KinaseIdentity> {
        self.by_symbol.get(symbol)
    }

    /// The full gene-id universe, in file order.
    pub fn gene_ids(&self) -> Vec<String> {
        self.symbols
            .iter()
            .map(|s| self.by_symbol[s].gene_id.clone())
            .collect()
    }

    /// Resolve a batch of symbols, skipping and counting the unknown ones.
    pub fn resolve_symbols<'a, I>(&self, symbols: I) -> (Vec<&str>, SkipCount)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut resolved = Vec::new();
        let mut count = SkipCount::default();
        for symbol in symbols {
            count.total += 1;
            match self.by_symbol.get(symbol) {
                Some(identity) => resolved.push(identity.gene_id.as_str()),
                None => count.skipped += 1,
            }
        }
        if count.skipped > 0 {
            warn!(
                skipped = count.skipped,
                total = count.total,
                "Some kinase symbols had no gene-id mapping"
            );
        }
        (resolved, count)
    }
}

// ---------------------------------------------------------------------------
// Cancer vocabulary
// ---------------------------------------------------------------------------

/// MeSH id ↔ display-name mapping for the neoplasm vocabulary, from a
/// headerless TSV with 2 or 3 columns: MeSH code, label, optional
/// synonyms.
#[derive(Debug, Clone)]
pub struct CancerVocabulary {
    by_mesh_id: HashMap<String, CancerIdentity>,
    mesh_ids: Vec<String>,
}

impl CancerVocabulary {
    pub fn from_tsv(tsv: &str, source: &str) -> Result<Self> {
        let mut by_mesh_id = HashMap::new();
        let mut mesh_ids = Vec::new();

        for (idx, line) in tsv.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            // At a minimum there is a MeSH id and a label; most rows carry
            // a third synonym field.
            if fields.len() < 2 || fields.len() > 3 {
                return Err(OncokinError::MalformedRow {
                    file: source.to_string(),
                    line: idx + 1,
                    detail: format!("expected 2-3 fields, got {}", fields.len()),
                });
            }
            let mesh_id = canonical_mesh_id(fields[0].trim());
            if by_mesh_id.contains_key(&mesh_id) {
                warn!(
                    mesh_id = mesh_id.as_str(),
                    line = idx + 1,
                    "Duplicate MeSH id, keeping the first row"
                );
                continue;
            }
            let identity = CancerIdentity {
                mesh_id: mesh_id.clone(),
                display_name: fields[1].trim().to_string(),
            };
            by_mesh_id.insert(mesh_id.clone(), identity);
            mesh_ids.push(mesh_id);
        }
        info!(n = mesh_ids.len(), source, "Ingested cancer vocabulary");
        Ok(Self { by_mesh_id, mesh_ids })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_tsv(&raw, &path.display().to_string())
    }

    pub fn len(&self) -> usize {
        self.mesh_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mesh_ids.is_empty()
    }

    /// Display name for a canonical MeSH id; fails fast when absent.
    pub fn name_of(&self, mesh_id: &str) -> Result<&str> {
        self.by_mesh_id
            .get(mesh_id)
            .map(|c| c.display_name.as_str())
            .ok_or_else(|| OncokinError::UnknownMeshId(mesh_id.to_string()))
    }

    /// The full MeSH-id universe, in file order.
    pub fn mesh_ids(&self) -> &[String] {
        &self.mesh_ids
    }

    /// Resolve a batch of MeSH ids, skipping and counting the unknown ones.
    pub fn resolve_mesh_ids<'a, I>(&self, ids: I) -> (Vec<&CancerIdentity>, SkipCount)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut resolved = Vec::new();
        let mut count = SkipCount::default();
        for id in ids {
            count.total += 1;
            match self.by_mesh_id.get(id) {
                Some(identity) => resolved.push(identity),
                None => count.skipped += 1,
            }
        }
        if count.skipped > 0 {
            warn!(
                skipped = count.skipped,
                total = count.total,
                "Some MeSH ids were not in the cancer vocabulary"
            );
        }
        (resolved, count)
    }
}
