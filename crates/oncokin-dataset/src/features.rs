//! Feature-vector lookup for (kinase, cancer) links.
//!
//! Embeddings are produced outside this pipeline; the core only needs a
//! numeric vector per concept key. A link's feature vector is the
//! difference between its kinase vector and its cancer vector. Links
//! whose concepts have no embedding are skipped and counted, never
//! silently dropped.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use oncokin_common::{Link, OncokinError, Result};
use oncokin_ingest::reference::SkipCount;

/// A labeled feature vector for one link, keyed like
/// "ncbigene1956-meshd002289".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkVector {
    pub key: String,
    pub values: Vec<f64>,
}

/// In-memory concept-embedding lookup: key → vector.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingTable {
    vectors: HashMap<String, Vec<f64>>,
}

impl EmbeddingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TSV with one concept per line: key, then the vector
    /// components.
    pub fn from_tsv(tsv: &str, source: &str) -> Result<Self> {
        let mut vectors = HashMap::new();
        for (idx, line) in tsv.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let key = match fields.next() {
                Some(k) if !k.is_empty() => k.to_string(),
                _ => {
                    return Err(OncokinError::MalformedRow {
                        file: source.to_string(),
                        line: idx + 1,
                        detail: "missing concept key".to_string(),
                    })
                }
            };
            let values: std::result::Result<Vec<f64>, _> =
                fields.map(|f| f.trim().parse::<f64>()).collect();
            let values = values.map_err(|_| OncokinError::MalformedRow {
                file: source.to_string(),
                line: idx + 1,
                detail: format!("unparsable vector component for '{key}'"),
            })?;
            vectors.insert(key, values);
        }
        info!(n = vectors.len(), source, "Ingested concept embeddings");
        Ok(Self { vectors })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_tsv(&raw, &path.display().to_string())
    }

    pub fn insert(&mut self, key: impl Into<String>, vector: Vec<f64>) {
        self.vectors.insert(key.into(), vector);
    }

    pub fn get(&self, key: &str) -> Option<&[f64]> {
        self.vectors.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Difference vectors (kinase − cancer) for a set of links. Links
    /// missing either concept embedding are skipped and counted.
    pub fn difference_vectors<'a, I>(&self, links: I) -> Result<(Vec<LinkVector>, SkipCount)>
    where
        I: IntoIterator<Item = &'a Link>,
    {
        let mut out = Vec::new();
        let mut count = SkipCount::default();
        for link in links {
            count.total += 1;
            let kinase = self.vectors.get(&link.gene_id);
            let cancer = self.vectors.get(&link.mesh_id);
            let (kinase, cancer) = match (kinase, cancer) {
                (Some(k), Some(c)) => (k, c),
                _ => {
                    count.skipped += 1;
                    continue;
                }
            };
            if kinase.len() != cancer.len() {
                return Err(OncokinError::MalformedRecord(format!(
                    "embedding dimension mismatch for {}: {} vs {}",
                    link,
                    kinase.len(),
                    cancer.len()
                )));
            }
            let values = kinase.iter().zip(cancer.iter()).map(|(k, c)| k - c).collect();
            out.push(LinkVector {
                key: link.embedding_key(),
                values,
            });
        }
        if count.total == 0 {
            return Err(OncokinError::EmptyDataset(
                "no links given for difference vectors".to_string(),
            ));
        }
        info!(
            n_vectors = out.len(),
            skipped = count.skipped,
            "Extracted kinase-cancer difference vectors"
        );
        Ok((out, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn table() -> EmbeddingTable {
        let mut table = EmbeddingTable::new();
        table.insert("ncbigene1956", vec![1.0, 2.0, 3.0]);
        table.insert("ncbigene2064", vec![0.5, 0.5, 0.5]);
        table.insert("meshd002289", vec![1.0, 1.0, 1.0]);
        table
    }

    #[test]
    fn test_difference_vector_is_kinase_minus_cancer() {
        let links = vec![Link::new("ncbigene1956", "meshd002289")];
        let (vectors, count) = table().difference_vectors(&links).unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].key, "ncbigene1956-meshd002289");
        assert_eq!(vectors[0].values, vec![0.0, 1.0, 2.0]);
        assert_eq!(count.skipped, 0);
    }

    #[test]
    fn test_missing_concepts_are_skipped_and_counted() {
        let links = vec![
            Link::new("ncbigene1956", "meshd002289"),
            Link::new("ncbigene9999", "meshd002289"), // unknown kinase
            Link::new("ncbigene2064", "meshd999999"), // unknown cancer
        ];
        let (vectors, count) = table().difference_vectors(&links).unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(count.skipped, 2);
        assert_eq!(count.total, 3);
    }

    #[test]
    fn test_dimension_mismatch_is_fatal() {
        let mut table = table();
        table.insert("meshd000001", vec![1.0]);
        let links = vec![Link::new("ncbigene1956", "meshd000001")];
        assert!(matches!(
            table.difference_vectors(&links),
            Err(OncokinError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_empty_link_set_is_an_error() {
        let links: Vec<Link> = vec![];
        assert!(matches!(
            table().difference_vectors(&links),
            Err(OncokinError::EmptyDataset(_))
        ));
    }

    #[test]
    fn test_from_tsv() {
        let tsv = "ncbigene1956\t1.0\t2.0\nmeshd002289\t0.5\t0.25\n";
        let table = EmbeddingTable::from_tsv(tsv, "embeddings.tsv").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("ncbigene1956").unwrap(), &[1.0, 2.0]);

        let bad = "ncbigene1956\tone\ttwo\n";
        assert!(EmbeddingTable::from_tsv(bad, "embeddings.tsv").is_err());
    }
}
