use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Order, Query};
use sea_orm::{ConnectionTrait, QueryResult, TransactionTrait};

use crate::cluster::ClusterIndex;
use crate::db::*;
use crate::store::{col_name, exec, query_all, read_i64, read_opt_i64};
use crate::ResqStore;
use resq_core::{
    ClusterId, NodePair, ResqError, ResqResult, ResultBundle, ResultEntry, ResultsApi,
    ScalarRecord, ScenarioId, SequenceRecord, StoreReport, clean_series, tag_simulation_results,
};

const FAILPOINT_AFTER_SCALARS: &str = "normalize_after_scalars";

/// Attribution for one result: the source's cluster, replaced by the
/// destination's when the destination resolves to one.
async fn attribute_cluster<C: ConnectionTrait>(
    index: &mut ClusterIndex<'_>,
    conn: &C,
    nodes: &NodePair,
) -> ResqResult<Option<ClusterId>> {
    let mut cluster = index.lookup(conn, nodes.source_label()).await?;
    if let Some(destination) = nodes.destination_label() {
        if let Some(id) = index.lookup(conn, destination).await? {
            cluster = Some(id);
        }
    }
    Ok(cluster)
}

struct RowContext<'a> {
    scenario: ScenarioId,
    is_exogenous: bool,
    from_node: &'a str,
    to_node: Option<&'a str>,
    cluster: Option<ClusterId>,
}

async fn insert_scalar<C: ConnectionTrait>(
    conn: &C,
    row: &RowContext<'_>,
    attribute: &str,
    value: f64,
) -> ResqResult<()> {
    let insert = Query::insert()
        .into_table(Scalar::Table)
        .columns([
            Scalar::ScenarioId,
            Scalar::IsExogenous,
            Scalar::FromNode,
            Scalar::ToNode,
            Scalar::Attribute,
            Scalar::Value,
            Scalar::ClusterId,
        ])
        .values_panic([
            row.scenario.get().into(),
            row.is_exogenous.into(),
            row.from_node.into(),
            row.to_node.map(str::to_string).into(),
            attribute.into(),
            value.into(),
            row.cluster.map(ClusterId::get).into(),
        ])
        .to_owned();
    exec(conn, &insert).await?;
    Ok(())
}

async fn insert_sequence<C: ConnectionTrait>(
    conn: &C,
    row: &RowContext<'_>,
    attribute: &str,
    series: &[Option<f64>],
) -> ResqResult<()> {
    let cleaned = clean_series(series);
    if cleaned.values.iter().any(|value| value.is_infinite()) {
        return Err(ResqError::validation(format!(
            "sequence {}/{attribute} holds an infinite value",
            row.from_node
        )));
    }
    let timeseries = serde_json::to_string(&cleaned.values)
        .map_err(|err| ResqError::storage(format!("encode sequence: {err}")))?;
    let insert = Query::insert()
        .into_table(Sequence::Table)
        .columns([
            Sequence::ScenarioId,
            Sequence::IsExogenous,
            Sequence::FromNode,
            Sequence::ToNode,
            Sequence::Attribute,
            Sequence::Timeseries,
            Sequence::TotalEnergy,
            Sequence::ClusterId,
        ])
        .values_panic([
            row.scenario.get().into(),
            row.is_exogenous.into(),
            row.from_node.into(),
            row.to_node.map(str::to_string).into(),
            attribute.into(),
            timeseries.into(),
            cleaned.total.into(),
            row.cluster.map(ClusterId::get).into(),
        ])
        .to_owned();
    exec(conn, &insert).await?;
    Ok(())
}

#[async_trait]
impl ResultsApi for ResqStore {
    /// Writes the whole batch in one transaction. Nothing is written when the
    /// scenario is missing or any row fails.
    async fn normalize_and_store(
        &self,
        scenario: ScenarioId,
        entries: Vec<ResultEntry>,
    ) -> ResqResult<StoreReport> {
        let tx = self.conn.begin().await?;
        if !self.scenario_exists(&tx, scenario).await? {
            return Err(ResqError::scenario_not_found(scenario));
        }
        let mut clusters = ClusterIndex::new(&self.mappings.clusters);
        let mut report = StoreReport::default();
        for entry in &entries {
            let row = RowContext {
                scenario,
                is_exogenous: entry.bundle.is_exogenous,
                from_node: entry.nodes.source_label(),
                to_node: entry.nodes.destination_label(),
                cluster: attribute_cluster(&mut clusters, &tx, &entry.nodes).await?,
            };
            for (attribute, value) in &entry.bundle.scalars {
                let Some(value) = value.as_measurement() else {
                    report.skipped_scalars += 1;
                    continue;
                };
                insert_scalar(&tx, &row, attribute, value).await?;
                report.scalars += 1;
            }
            self.maybe_failpoint(FAILPOINT_AFTER_SCALARS)?;
            for (attribute, series) in &entry.bundle.sequences {
                insert_sequence(&tx, &row, attribute, series).await?;
                report.sequences += 1;
            }
        }
        tx.commit().await?;
        log::info!(
            "stored {} scalars and {} sequences for scenario #{scenario} ({} skipped)",
            report.scalars,
            report.sequences,
            report.skipped_scalars
        );
        Ok(report)
    }

    async fn store_simulation_results(
        &self,
        scenario: ScenarioId,
        inputs: Vec<(NodePair, ResultBundle)>,
        outputs: Vec<(NodePair, ResultBundle)>,
    ) -> ResqResult<StoreReport> {
        self.normalize_and_store(scenario, tag_simulation_results(inputs, outputs))
            .await
    }

    async fn list_scalars(&self, scenario: ScenarioId) -> ResqResult<Vec<ScalarRecord>> {
        let select = Query::select()
            .from(Scalar::Table)
            .columns([
                Scalar::Id,
                Scalar::ScenarioId,
                Scalar::IsExogenous,
                Scalar::FromNode,
                Scalar::ToNode,
                Scalar::Attribute,
                Scalar::Value,
                Scalar::ClusterId,
            ])
            .and_where(Expr::col(Scalar::ScenarioId).eq(scenario.get()))
            .order_by(Scalar::Id, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(read_scalar).collect()
    }

    async fn list_sequences(&self, scenario: ScenarioId) -> ResqResult<Vec<SequenceRecord>> {
        let select = Query::select()
            .from(Sequence::Table)
            .columns([
                Sequence::Id,
                Sequence::ScenarioId,
                Sequence::IsExogenous,
                Sequence::FromNode,
                Sequence::ToNode,
                Sequence::Attribute,
                Sequence::Timeseries,
                Sequence::TotalEnergy,
                Sequence::ClusterId,
            ])
            .and_where(Expr::col(Sequence::ScenarioId).eq(scenario.get()))
            .order_by(Sequence::Id, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(read_sequence).collect()
    }
}

fn read_scalar(row: &QueryResult) -> ResqResult<ScalarRecord> {
    Ok(ScalarRecord {
        id: read_i64(row, Scalar::Id)?,
        scenario_id: ScenarioId(read_i64(row, Scalar::ScenarioId)?),
        is_exogenous: row.try_get("", &col_name(Scalar::IsExogenous))?,
        from_node: row.try_get("", &col_name(Scalar::FromNode))?,
        to_node: row.try_get("", &col_name(Scalar::ToNode))?,
        attribute: row.try_get("", &col_name(Scalar::Attribute))?,
        value: row.try_get("", &col_name(Scalar::Value))?,
        cluster_id: read_opt_i64(row, Scalar::ClusterId)?.map(ClusterId),
    })
}

fn read_sequence(row: &QueryResult) -> ResqResult<SequenceRecord> {
    let raw: String = row.try_get("", &col_name(Sequence::Timeseries))?;
    let series: Vec<f64> = serde_json::from_str(&raw)
        .map_err(|err| ResqError::storage(format!("decode sequence: {err}")))?;
    Ok(SequenceRecord {
        id: read_i64(row, Sequence::Id)?,
        scenario_id: ScenarioId(read_i64(row, Sequence::ScenarioId)?),
        is_exogenous: row.try_get("", &col_name(Sequence::IsExogenous))?,
        from_node: row.try_get("", &col_name(Sequence::FromNode))?,
        to_node: row.try_get("", &col_name(Sequence::ToNode))?,
        attribute: row.try_get("", &col_name(Sequence::Attribute))?,
        series,
        total: row.try_get("", &col_name(Sequence::TotalEnergy))?,
        cluster_id: read_opt_i64(row, Sequence::ClusterId)?.map(ClusterId),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use resq_core::ClusterMap;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn unmapped_endpoints_leave_attribution_empty() -> ResqResult<()> {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ResqStore::connect_sqlite(&dir.path().join("attr.sqlite")).await?;
        let map = ClusterMap::from_clusters(BTreeMap::new())?;
        let mut index = ClusterIndex::new(&map);
        let cluster = attribute_cluster(
            &mut index,
            store.connection(),
            &NodePair::edge("wind", "electricity"),
        )
        .await?;
        assert_eq!(cluster, None);
        Ok(())
    }
}
