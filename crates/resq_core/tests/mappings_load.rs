use std::fs;

use resq_core::{CategoryKey, Mappings, ResqError};
use tempfile::tempdir;

#[test]
fn loads_all_mapping_files() {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    fs::write(
        base.join("clusters.json"),
        r#"{"Nordfeld": ["wind_onshore"], "Suedheide": ["biogas_chp", "pv_roof"]}"#,
    )
    .expect("clusters");
    fs::write(
        base.join("labels.json"),
        r#"{"wind_onshore": {"label": "Wind an Land", "bus": false},
            "electricity": {"label": "Strom", "bus": true}}"#,
    )
    .expect("labels");
    fs::write(
        base.join("categories.json"),
        r#"{"wind_onshore|electricity": {"category": "production", "carrier": "electricity", "is_renewable": true},
            "electricity_demand|": {"category": "demand", "carrier": "electricity", "is_renewable": false}}"#,
    )
    .expect("categories");

    let mappings = Mappings::load(base).expect("load");
    assert_eq!(mappings.clusters.len(), 3);
    assert_eq!(mappings.clusters.cluster_for("pv_roof"), Some("Suedheide"));
    assert_eq!(mappings.clusters.cluster_for("gas_import"), None);
    assert!(mappings.labels["electricity"].is_bus);
    assert_eq!(mappings.labels["wind_onshore"].label, "Wind an Land");

    let production = &mappings.categories[&CategoryKey::parse("wind_onshore|electricity")];
    assert!(production.is_renewable);
    let demand_key = CategoryKey::parse("electricity_demand|");
    assert_eq!(demand_key.to_node, None);
    assert_eq!(mappings.categories[&demand_key].category, "demand");
}

#[test]
fn missing_files_yield_empty_mappings() {
    let dir = tempdir().expect("tempdir");
    let mappings = Mappings::load(dir.path()).expect("load");
    assert!(mappings.clusters.is_empty());
    assert!(mappings.labels.is_empty());
    assert!(mappings.categories.is_empty());
}

#[test]
fn malformed_or_conflicting_files_fail() {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    fs::write(base.join("labels.json"), "[1, 2").expect("labels");
    let err = Mappings::load(base).expect_err("malformed");
    assert!(matches!(err, ResqError::Validation { .. }));

    fs::remove_file(base.join("labels.json")).expect("remove");
    fs::write(
        base.join("clusters.json"),
        r#"{"Nordfeld": ["wind_onshore"], "Suedheide": ["wind_onshore"]}"#,
    )
    .expect("clusters");
    let err = Mappings::load(base).expect_err("conflict");
    match err {
        ResqError::ClusterConflict {
            component,
            first,
            second,
        } => {
            assert_eq!(component, "wind_onshore");
            assert_eq!(first, "Nordfeld");
            assert_eq!(second, "Suedheide");
        }
        other => panic!("unexpected error {other:?}"),
    }
}
