use async_trait::async_trait;

use crate::{
    ClusterId, ClusterRecord, ClusterSeed, NodePair, ResqResult, ResultBundle, ResultEntry,
    ScalarRecord, ScenarioId, ScenarioKey, ScenarioOutcome, ScenarioRecord, SensitivityId,
    SensitivityInput, SensitivityRecord, SequenceRecord, StoreReport, ViewDefinition,
};

#[async_trait]
pub trait ScenarioApi {
    async fn create_or_get_scenario(&self, key: ScenarioKey) -> ResqResult<ScenarioOutcome>;
    async fn find_scenario(&self, key: &ScenarioKey) -> ResqResult<Option<ScenarioId>>;
    async fn get_scenario(&self, id: ScenarioId) -> ResqResult<Option<ScenarioRecord>>;
    async fn list_scenarios(&self) -> ResqResult<Vec<ScenarioRecord>>;
    async fn delete_scenario(&self, id: ScenarioId) -> ResqResult<()>;
    async fn delete_all_scenarios(&self) -> ResqResult<u64>;
    async fn create_sensitivity(&self, input: SensitivityInput) -> ResqResult<SensitivityId>;
    async fn get_sensitivity(&self, id: SensitivityId) -> ResqResult<Option<SensitivityRecord>>;
}

#[async_trait]
pub trait ClusterApi {
    async fn lookup_cluster_for_component(&self, component: &str) -> ResqResult<Option<ClusterId>>;
    async fn seed_clusters(&self, clusters: Vec<ClusterSeed>) -> ResqResult<usize>;
    async fn list_clusters(&self) -> ResqResult<Vec<ClusterRecord>>;
    async fn delete_cluster(&self, id: ClusterId) -> ResqResult<()>;
}

#[async_trait]
pub trait ResultsApi {
    async fn normalize_and_store(
        &self,
        scenario: ScenarioId,
        entries: Vec<ResultEntry>,
    ) -> ResqResult<StoreReport>;

    /// Stores a simulation's input set (exogenous) and output set
    /// (endogenous) as one batch.
    async fn store_simulation_results(
        &self,
        scenario: ScenarioId,
        inputs: Vec<(NodePair, ResultBundle)>,
        outputs: Vec<(NodePair, ResultBundle)>,
    ) -> ResqResult<StoreReport>;

    async fn list_scalars(&self, scenario: ScenarioId) -> ResqResult<Vec<ScalarRecord>>;
    async fn list_sequences(&self, scenario: ScenarioId) -> ResqResult<Vec<SequenceRecord>>;
}

#[async_trait]
pub trait ViewApi {
    async fn create_or_refresh_view(&self, view: &ViewDefinition, recreate: bool) -> ResqResult<()>;
    async fn refresh_view(&self, name: &str, recreate: bool) -> ResqResult<()>;
    async fn refresh_all_views(&self, recreate: bool) -> ResqResult<()>;
    async fn delete_view(&self, name: &str) -> ResqResult<()>;
    async fn delete_all_views(&self) -> ResqResult<()>;
    async fn list_views(&self) -> ResqResult<Vec<String>>;
}
