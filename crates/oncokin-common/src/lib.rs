//! oncokin-common — Shared types, errors, and configuration used across all
//! Oncokin crates.

pub mod entities;
pub mod pipeline_config;

// Re-export commonly used types
pub use entities::{CancerIdentity, KinaseIdentity, Link, TrialPhase};
pub use pipeline_config::{FilterSettings, PipelineConfig, SamplerSettings};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OncokinError {
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Malformed row in {file} (line {line}): {detail}")]
    MalformedRow {
        file: String,
        line: usize,
        detail: String,
    },

    #[error("Invalid clinical trial phase: '{0}'")]
    InvalidPhase(String),

    #[error("Invalid year range [{begin}, {end}] for cutoff {cutoff}")]
    InvalidYearRange { begin: i32, end: i32, cutoff: i32 },

    #[error("Unknown kinase symbol: {0}")]
    UnknownKinase(String),

    #[error("Unknown MeSH id: {0}")]
    UnknownMeshId(String),

    #[error("Drug has no validated kinase links: {0}")]
    UnresolvedDrug(String),

    #[error("Kinase has no gene-id mapping: {0}")]
    UnresolvedKinase(String),

    #[error("Negative sampling exhausted: requested {requested}, obtained {obtained} after {attempts} attempts")]
    NegativeSamplingExhausted {
        requested: usize,
        obtained: usize,
        attempts: u64,
    },

    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<csv::Error> for OncokinError {
    fn from(err: csv::Error) -> Self {
        OncokinError::Csv(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OncokinError>;
