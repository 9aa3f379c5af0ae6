use std::collections::HashMap;

use async_trait::async_trait;
use sea_orm::sea_query::{Alias, Expr, Func, Order, Query};
use sea_orm::{ConnectionTrait, QueryResult, TransactionTrait};

use crate::db::*;
use crate::store::{col_name, exec, query_all, query_one, read_i64};
use crate::ResqStore;
use resq_core::{
    ClusterApi, ClusterId, ClusterMap, ClusterRecord, ClusterSeed, ResqError, ResqResult,
};

/// Resolves components to persisted cluster ids through the static mapping.
/// Lookups are memoized, so one index should live no longer than one batch.
pub struct ClusterIndex<'a> {
    map: &'a ClusterMap,
    resolved: HashMap<String, ClusterId>,
}

impl<'a> ClusterIndex<'a> {
    pub fn new(map: &'a ClusterMap) -> Self {
        Self {
            map,
            resolved: HashMap::new(),
        }
    }

    /// `Ok(None)` for unmapped components. A mapped cluster that is missing
    /// from the cluster table is drift and fails with `ClusterNotFound`.
    pub async fn lookup<C: ConnectionTrait>(
        &mut self,
        conn: &C,
        component: &str,
    ) -> ResqResult<Option<ClusterId>> {
        let Some(cluster) = self.map.cluster_for(component) else {
            return Ok(None);
        };
        if let Some(id) = self.resolved.get(cluster) {
            return Ok(Some(*id));
        }
        let select = Query::select()
            .from(Cluster::Table)
            .column(Cluster::Id)
            .and_where(Expr::col(Cluster::Name).eq(cluster))
            .limit(1)
            .to_owned();
        let Some(row) = query_one(conn, &select).await? else {
            log::error!("cluster '{cluster}' for component '{component}' is not in the cluster table");
            return Err(ResqError::cluster_not_found(component, cluster));
        };
        let id = ClusterId(read_i64(&row, Cluster::Id)?);
        self.resolved.insert(cluster.to_string(), id);
        Ok(Some(id))
    }
}

#[async_trait]
impl ClusterApi for ResqStore {
    async fn lookup_cluster_for_component(&self, component: &str) -> ResqResult<Option<ClusterId>> {
        let mut index = ClusterIndex::new(&self.mappings.clusters);
        index.lookup(&self.conn, component).await
    }

    /// Seeds only an empty table; an already seeded table is left alone.
    async fn seed_clusters(&self, clusters: Vec<ClusterSeed>) -> ResqResult<usize> {
        let tx = self.conn.begin().await?;
        let count = Query::select()
            .from(Cluster::Table)
            .expr_as(Func::count(Expr::col(Cluster::Id)), Alias::new("n"))
            .to_owned();
        let existing: i64 = match query_one(&tx, &count).await? {
            Some(row) => row.try_get("", "n")?,
            None => 0,
        };
        if existing > 0 {
            log::info!("cluster table already holds {existing} rows; skipping seed");
            return Ok(0);
        }
        if clusters.is_empty() {
            return Ok(0);
        }
        let mut insert = Query::insert()
            .into_table(Cluster::Table)
            .columns([Cluster::Name, Cluster::Geometry])
            .to_owned();
        for seed in &clusters {
            insert.values_panic([seed.name.clone().into(), seed.geometry.clone().into()]);
        }
        exec(&tx, &insert).await?;
        tx.commit().await?;
        log::info!("seeded {} clusters", clusters.len());
        Ok(clusters.len())
    }

    async fn list_clusters(&self) -> ResqResult<Vec<ClusterRecord>> {
        let select = Query::select()
            .from(Cluster::Table)
            .columns([Cluster::Id, Cluster::Name, Cluster::Geometry])
            .order_by(Cluster::Name, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(read_cluster).collect()
    }

    /// Results attributed to the cluster survive with their attribution
    /// cleared.
    async fn delete_cluster(&self, id: ClusterId) -> ResqResult<()> {
        let delete = Query::delete()
            .from_table(Cluster::Table)
            .and_where(Expr::col(Cluster::Id).eq(id.get()))
            .to_owned();
        if exec(&self.conn, &delete).await? == 0 {
            return Err(ResqError::storage(format!("cluster #{id} not found")));
        }
        log::info!("deleted cluster #{id}");
        Ok(())
    }
}

fn read_cluster(row: &QueryResult) -> ResqResult<ClusterRecord> {
    Ok(ClusterRecord {
        id: ClusterId(read_i64(row, Cluster::Id)?),
        name: row.try_get("", &col_name(Cluster::Name))?,
        geometry: row.try_get("", &col_name(Cluster::Geometry))?,
    })
}
