//! End-to-end ingest of a DrugCentral-style affinity export from disk,
//! with the scenarios the published analysis depends on.

use oncokin_ingest::affinity::AffinityLinkStore;

const AFFINITY_TSV: &str = "\
PKI\tPK\tPMID\tACT_VALUE (uM)\tACT_TYPE
afatinib\tEGFR\t18408761\t0.0001\tKd
afatinib\tERBB2\t18408761\t0.014\tKd
alpelisib\tPIK3CA\t25544637\t\t
alpelisib\tPIK3CA\t25544637\t0.004600446663935\tIC50
apatinib\tKIT\t20923544\t0.428999964569677\tIC50
";

fn store_from_tempfile() -> AffinityLinkStore {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("DrugCentralPKIPK.csv");
    std::fs::write(&path, AFFINITY_TSV).unwrap();
    AffinityLinkStore::from_file(&path).unwrap()
}

#[test]
fn test_afatinib_egfr_kept_with_value_and_pmid() {
    let store = store_from_tempfile();
    let retained = store.filter_with_defaults().unwrap();
    let egfr = retained["afatinib"]
        .iter()
        .find(|l| l.kinase_symbol == "EGFR")
        .expect("afatinib/EGFR missing");
    assert_eq!(egfr.activity_value, Some(0.0001));
    assert_eq!(egfr.evidence_id, "18408761");
}

#[test]
fn test_alpelisib_pik3ca_keeps_both_evidence_rows() {
    // One curated evidence-only row and one quantified row survive as
    // separate records; the caller decides whether to collapse them.
    let store = store_from_tempfile();
    let retained = store.filter_with_defaults().unwrap();
    let rows: Vec<_> = retained["alpelisib"]
        .iter()
        .filter(|l| l.kinase_symbol == "PIK3CA")
        .collect();
    assert_eq!(rows.len(), 2);
    let cells: Vec<String> = rows.iter().map(|l| l.activity_cell()).collect();
    assert!(cells.contains(&"n/a".to_string()));
}

#[test]
fn test_apatinib_kit_removed_kd_too_high() {
    let store = store_from_tempfile();
    let retained = store.filter_with_defaults().unwrap();
    assert!(!retained.contains_key("apatinib"));
}

#[test]
fn test_export_file_round_trip_is_order_independent() {
    let store = store_from_tempfile();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("drug_kinase_links.tsv");
    store.export(&path, 5, 0.03).unwrap();

    let raw = std::fs::read_to_string(&path).unwrap();
    let parsed = AffinityLinkStore::parse_exported(&raw, "drug_kinase_links.tsv").unwrap();

    let mut expected: Vec<(String, String, String)> = store
        .filter_with_defaults()
        .unwrap()
        .values()
        .flatten()
        .map(|l| (l.inhibitor.clone(), l.kinase_symbol.clone(), l.activity_cell()))
        .collect();
    let mut actual: Vec<(String, String, String)> = parsed
        .iter()
        .map(|l| (l.inhibitor.clone(), l.kinase_symbol.clone(), l.activity_cell()))
        .collect();
    expected.sort();
    actual.sort();
    assert_eq!(expected, actual);
}
