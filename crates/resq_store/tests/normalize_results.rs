use std::collections::BTreeMap;
use std::path::Path;

use resq_store::{
    ClusterApi, ClusterId, ClusterMap, ClusterSeed, Mappings, NodePair, ResqConfig, ResqError,
    ResqResult, ResqStore, ResultBundle, ResultEntry, ResultsApi, ScenarioApi, ScenarioId,
    ScenarioKey,
};
use tempfile::tempdir;

const SQUARE: &str = "POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))";

fn mappings() -> ResqResult<Mappings> {
    let mut clusters = BTreeMap::new();
    clusters.insert("Nordfeld".to_string(), vec!["wind_onshore".to_string()]);
    clusters.insert(
        "Suedheide".to_string(),
        vec!["electricity_sued".to_string(), "biogas_chp".to_string()],
    );
    Ok(Mappings::with_clusters(ClusterMap::from_clusters(clusters)?))
}

async fn open(base: &Path, failpoints: Option<Vec<String>>) -> ResqResult<ResqStore> {
    let mut config = ResqConfig::default_sqlite(base.join("results.sqlite").to_string_lossy());
    config.failpoints = failpoints;
    let store = ResqStore::connect(&config, base)
        .await?
        .with_mappings(mappings()?);
    store.seed_reference_data().await?;
    store
        .seed_clusters(vec![
            ClusterSeed::new("Nordfeld", SQUARE),
            ClusterSeed::new("Suedheide", SQUARE),
        ])
        .await?;
    Ok(store)
}

async fn scenario(store: &ResqStore) -> ResqResult<ScenarioId> {
    Ok(store
        .create_or_get_scenario(ScenarioKey::new("P3", "RCP8.5", "mean"))
        .await?
        .id())
}

async fn cluster_id(store: &ResqStore, name: &str) -> ResqResult<ClusterId> {
    let cluster = store
        .list_clusters()
        .await?
        .into_iter()
        .find(|cluster| cluster.name == name)
        .expect("cluster seeded");
    Ok(cluster.id)
}

fn flow(source: &str, destination: &str, attribute: &str, value: f64) -> ResultEntry {
    ResultEntry::new(
        NodePair::edge(source, destination),
        ResultBundle::endogenous().with_scalar(attribute, value),
    )
}

#[tokio::test]
async fn missing_scenario_writes_nothing() -> ResqResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), None).await?;
    let err = store
        .normalize_and_store(
            ScenarioId(404),
            vec![flow("wind_onshore", "electricity_sued", "capacity", 12.0)],
        )
        .await
        .expect_err("no scenario");
    assert!(matches!(err, ResqError::ScenarioNotFound { id: 404 }));
    assert!(store.list_scalars(ScenarioId(404)).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn destination_cluster_overrides_source_cluster() -> ResqResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), None).await?;
    let scenario = scenario(&store).await?;
    let nordfeld = cluster_id(&store, "Nordfeld").await?;
    let suedheide = cluster_id(&store, "Suedheide").await?;

    store
        .normalize_and_store(
            scenario,
            vec![
                flow("wind_onshore", "electricity_sued", "flow", 1.0),
                flow("wind_onshore", "electricity_nord", "flow", 2.0),
                flow("gas_import", "electricity_sued", "flow", 3.0),
                flow("gas_import", "electricity_nord", "flow", 4.0),
            ],
        )
        .await?;

    let by_pair: BTreeMap<(String, Option<String>), Option<ClusterId>> = store
        .list_scalars(scenario)
        .await?
        .into_iter()
        .map(|row| ((row.from_node, row.to_node), row.cluster_id))
        .collect();
    let pair = |from: &str, to: &str| (from.to_string(), Some(to.to_string()));
    assert_eq!(by_pair[&pair("wind_onshore", "electricity_sued")], Some(suedheide));
    assert_eq!(by_pair[&pair("wind_onshore", "electricity_nord")], Some(nordfeld));
    assert_eq!(by_pair[&pair("gas_import", "electricity_sued")], Some(suedheide));
    assert_eq!(by_pair[&pair("gas_import", "electricity_nord")], None);
    Ok(())
}

#[tokio::test]
async fn scalars_and_sequences_are_cleaned() -> ResqResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), None).await?;
    let scenario = scenario(&store).await?;

    let bundle = ResultBundle::endogenous()
        .with_scalar("invest", 7.5)
        .with_scalar("expandable", true)
        .with_scalar("solver", "cbc")
        .with_sequence("flow", vec![Some(1.0), None, Some(f64::NAN), Some(2.5)]);
    let report = store
        .normalize_and_store(
            scenario,
            vec![ResultEntry::new(NodePair::node("biogas_chp"), bundle)],
        )
        .await?;
    assert_eq!(report.scalars, 2);
    assert_eq!(report.skipped_scalars, 1);
    assert_eq!(report.sequences, 1);

    let scalars = store.list_scalars(scenario).await?;
    let values: BTreeMap<String, f64> = scalars
        .iter()
        .map(|row| (row.attribute.clone(), row.value))
        .collect();
    assert_eq!(values["invest"], 7.5);
    assert_eq!(values["expandable"], 1.0);
    assert!(!values.contains_key("solver"));
    assert!(scalars.iter().all(|row| row.to_node.is_none()));

    let sequences = store.list_sequences(scenario).await?;
    assert_eq!(sequences.len(), 1);
    assert_eq!(sequences[0].series, vec![1.0, 2.5]);
    assert_eq!(sequences[0].total, 3.5);
    assert_eq!(
        sequences[0].cluster_id,
        Some(cluster_id(&store, "Suedheide").await?)
    );
    Ok(())
}

#[tokio::test]
async fn failure_mid_batch_rolls_back_everything() -> ResqResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(
        dir.path(),
        Some(vec!["normalize_after_scalars".to_string()]),
    )
    .await?;
    let scenario = scenario(&store).await?;

    let err = store
        .normalize_and_store(
            scenario,
            vec![ResultEntry::new(
                NodePair::edge("wind_onshore", "electricity_nord"),
                ResultBundle::endogenous()
                    .with_scalar("capacity", 40.0)
                    .with_sequence("flow", vec![Some(1.0)]),
            )],
        )
        .await
        .expect_err("failpoint");
    assert!(matches!(err, ResqError::Storage { .. }));
    assert!(store.list_scalars(scenario).await?.is_empty());
    assert!(store.list_sequences(scenario).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn drift_in_batch_rolls_back_everything() -> ResqResult<()> {
    let dir = tempdir().expect("tempdir");
    let base = dir.path();
    let config = ResqConfig::default_sqlite(base.join("drift.sqlite").to_string_lossy());
    let store = ResqStore::connect(&config, base)
        .await?
        .with_mappings(mappings()?);
    store.seed_reference_data().await?;
    store
        .seed_clusters(vec![ClusterSeed::new("Nordfeld", SQUARE)])
        .await?;
    let scenario = scenario(&store).await?;

    let err = store
        .normalize_and_store(
            scenario,
            vec![
                flow("wind_onshore", "electricity_nord", "flow", 1.0),
                flow("biogas_chp", "electricity_nord", "flow", 2.0),
            ],
        )
        .await
        .expect_err("drift");
    assert!(matches!(err, ResqError::ClusterNotFound { .. }));
    assert!(store.list_scalars(scenario).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn second_write_of_same_key_conflicts() -> ResqResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), None).await?;
    let scenario = scenario(&store).await?;

    store
        .normalize_and_store(
            scenario,
            vec![
                flow("wind_onshore", "electricity_nord", "flow", 1.0),
                ResultEntry::new(
                    NodePair::node("biogas_chp"),
                    ResultBundle::endogenous().with_scalar("capacity", 5.0),
                ),
            ],
        )
        .await?;

    let err = store
        .normalize_and_store(
            scenario,
            vec![flow("wind_onshore", "electricity_nord", "flow", 9.0)],
        )
        .await
        .expect_err("edge conflict");
    assert!(err.is_uniqueness_conflict());

    let err = store
        .normalize_and_store(
            scenario,
            vec![ResultEntry::new(
                NodePair::node("biogas_chp"),
                ResultBundle::endogenous().with_scalar("capacity", 6.0),
            )],
        )
        .await
        .expect_err("node conflict");
    assert!(err.is_uniqueness_conflict());

    let scalars = store.list_scalars(scenario).await?;
    assert_eq!(scalars.len(), 2);
    assert!(scalars.iter().any(|row| row.value == 1.0));
    Ok(())
}

#[tokio::test]
async fn simulation_inputs_are_exogenous() -> ResqResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), None).await?;
    let scenario = scenario(&store).await?;

    let report = store
        .store_simulation_results(
            scenario,
            vec![(
                NodePair::edge("wind_onshore", "electricity_nord"),
                ResultBundle::endogenous().with_scalar("nominal_value", 40.0),
            )],
            vec![(
                NodePair::edge("wind_onshore", "electricity_nord"),
                ResultBundle::endogenous().with_sequence("flow", vec![Some(3.0), Some(4.0)]),
            )],
        )
        .await?;
    assert_eq!(report.scalars, 1);
    assert_eq!(report.sequences, 1);

    let scalars = store.list_scalars(scenario).await?;
    assert!(scalars[0].is_exogenous);
    let sequences = store.list_sequences(scenario).await?;
    assert!(!sequences[0].is_exogenous);
    assert_eq!(sequences[0].total, 7.0);
    Ok(())
}

#[tokio::test]
async fn deleting_scenario_cascades_to_results() -> ResqResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), None).await?;
    let scenario = scenario(&store).await?;
    store
        .normalize_and_store(
            scenario,
            vec![ResultEntry::new(
                NodePair::edge("wind_onshore", "electricity_nord"),
                ResultBundle::endogenous()
                    .with_scalar("capacity", 40.0)
                    .with_sequence("flow", vec![Some(1.0), Some(2.0)]),
            )],
        )
        .await?;

    store.delete_scenario(scenario).await?;
    assert!(store.list_scalars(scenario).await?.is_empty());
    assert!(store.list_sequences(scenario).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn deleting_cluster_clears_attribution() -> ResqResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = open(dir.path(), None).await?;
    let scenario = scenario(&store).await?;
    store
        .normalize_and_store(
            scenario,
            vec![flow("wind_onshore", "electricity_nord", "flow", 1.0)],
        )
        .await?;
    let nordfeld = cluster_id(&store, "Nordfeld").await?;
    assert_eq!(store.list_scalars(scenario).await?[0].cluster_id, Some(nordfeld));

    store.delete_cluster(nordfeld).await?;
    let scalars = store.list_scalars(scenario).await?;
    assert_eq!(scalars.len(), 1);
    assert_eq!(scalars[0].cluster_id, None);
    Ok(())
}
