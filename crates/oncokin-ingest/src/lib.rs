//! oncokin-ingest — File-backed loaders for the kinase/cancer dataset
//! pipeline: affinity links, reference tables, and clinical-trial records.

pub mod affinity;
pub mod reference;
pub mod trials;

pub use affinity::{ActivityKind, AffinityLinkStore, AffinityRecord, ValidatedLink};
pub use reference::{CancerVocabulary, KinaseReferenceTable, SkipCount};
pub use trials::{ClinicalTrialRecordSet, KinaseInhibitorProfile, TrialLink, TrialRecord};
