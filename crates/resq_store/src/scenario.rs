use async_trait::async_trait;
use sea_orm::sea_query::{self, Alias, Expr, Order, Query, SelectStatement, SimpleExpr};
use sea_orm::{ConnectionTrait, QueryResult};

use crate::db::*;
use crate::store::{col_name, exec, query_all, query_one, read_i64, read_opt_i64};
use crate::ResqStore;
use resq_core::{
    ReferenceKind, ResqError, ResqResult, ScenarioApi, ScenarioId, ScenarioKey, ScenarioOutcome,
    ScenarioRecord, SensitivityId, SensitivityInput, SensitivityRecord,
};

/// Reference ids a scenario key resolves to.
#[derive(Clone, Copy, Debug)]
struct ResolvedKey {
    period_id: i64,
    climate_id: i64,
    weather_id: i64,
    sensitivity_id: Option<i64>,
}

impl ResqStore {
    async fn resolve_key<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: &ScenarioKey,
    ) -> ResqResult<ResolvedKey> {
        let period_id = resolve_name(
            conn,
            ReferenceKind::Period,
            (Period::Table, Period::Id, Period::Name),
            &key.period,
        )
        .await?;
        let climate_id = resolve_name(
            conn,
            ReferenceKind::Climate,
            (Climate::Table, Climate::Id, Climate::Name),
            &key.climate,
        )
        .await?;
        let weather_id = resolve_name(
            conn,
            ReferenceKind::Weather,
            (Weather::Table, Weather::Id, Weather::Name),
            &key.weather,
        )
        .await?;
        let sensitivity_id = match key.sensitivity {
            Some(id) => {
                let select = Query::select()
                    .from(Sensitivity::Table)
                    .column(Sensitivity::Id)
                    .and_where(Expr::col(Sensitivity::Id).eq(id.get()))
                    .limit(1)
                    .to_owned();
                if query_one(conn, &select).await?.is_none() {
                    return Err(ResqError::reference_not_found(
                        ReferenceKind::Sensitivity,
                        id.to_string(),
                    ));
                }
                Some(id.get())
            }
            None => None,
        };
        Ok(ResolvedKey {
            period_id,
            climate_id,
            weather_id,
            sensitivity_id,
        })
    }

    async fn find_resolved<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: ResolvedKey,
    ) -> ResqResult<Option<ScenarioId>> {
        let mut select = Query::select()
            .from(Scenario::Table)
            .column(Scenario::Id)
            .and_where(Expr::col(Scenario::PeriodId).eq(key.period_id))
            .and_where(Expr::col(Scenario::WeatherId).eq(key.weather_id))
            .and_where(Expr::col(Scenario::ClimateId).eq(key.climate_id))
            .limit(1)
            .to_owned();
        match key.sensitivity_id {
            Some(id) => select.and_where(Expr::col(Scenario::SensitivityId).eq(id)),
            None => select.and_where(Expr::col(Scenario::SensitivityId).is_null()),
        };
        let row = query_one(conn, &select).await?;
        row.map(|row| read_i64(&row, Scenario::Id).map(ScenarioId))
            .transpose()
    }

    async fn insert_scenario<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: ResolvedKey,
    ) -> ResqResult<ScenarioId> {
        let insert = Query::insert()
            .into_table(Scenario::Table)
            .columns([
                Scenario::PeriodId,
                Scenario::WeatherId,
                Scenario::ClimateId,
                Scenario::SensitivityId,
            ])
            .values_panic([
                key.period_id.into(),
                key.weather_id.into(),
                key.climate_id.into(),
                key.sensitivity_id.into(),
            ])
            .returning_col(Scenario::Id)
            .to_owned();
        let row = query_one(conn, &insert)
            .await?
            .ok_or_else(|| ResqError::storage("scenario insert returned no id"))?;
        Ok(ScenarioId(read_i64(&row, Scenario::Id)?))
    }

    pub(crate) async fn scenario_exists<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: ScenarioId,
    ) -> ResqResult<bool> {
        let select = Query::select()
            .from(Scenario::Table)
            .column(Scenario::Id)
            .and_where(Expr::col(Scenario::Id).eq(id.get()))
            .limit(1)
            .to_owned();
        Ok(query_one(conn, &select).await?.is_some())
    }
}

#[async_trait]
impl ScenarioApi for ResqStore {
    /// Resolves every reference before writing, then lets the partial unique
    /// indexes arbitrate between racing creators. Losing the race is reported
    /// as `AlreadyExisted`.
    async fn create_or_get_scenario(&self, key: ScenarioKey) -> ResqResult<ScenarioOutcome> {
        let resolved = self.resolve_key(&self.conn, &key).await?;
        if let Some(existing) = self.find_resolved(&self.conn, resolved).await? {
            return Ok(ScenarioOutcome::AlreadyExisted(existing));
        }
        match self.insert_scenario(&self.conn, resolved).await {
            Ok(id) => {
                log::info!(
                    "created scenario #{id} ({} / {} / {})",
                    key.period,
                    key.climate,
                    key.weather
                );
                Ok(ScenarioOutcome::Created(id))
            }
            Err(err) if err.is_uniqueness_conflict() => {
                let existing = self
                    .find_resolved(&self.conn, resolved)
                    .await?
                    .ok_or(err)?;
                Ok(ScenarioOutcome::AlreadyExisted(existing))
            }
            Err(err) => Err(err),
        }
    }

    async fn find_scenario(&self, key: &ScenarioKey) -> ResqResult<Option<ScenarioId>> {
        let resolved = self.resolve_key(&self.conn, key).await?;
        self.find_resolved(&self.conn, resolved).await
    }

    async fn get_scenario(&self, id: ScenarioId) -> ResqResult<Option<ScenarioRecord>> {
        let select = scenario_select()
            .and_where(Expr::col((Scenario::Table, Scenario::Id)).eq(id.get()))
            .to_owned();
        let row = query_one(&self.conn, &select).await?;
        row.map(|row| read_scenario(&row)).transpose()
    }

    async fn list_scenarios(&self) -> ResqResult<Vec<ScenarioRecord>> {
        let select = scenario_select()
            .order_by((Scenario::Table, Scenario::Id), Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(read_scenario).collect()
    }

    async fn delete_scenario(&self, id: ScenarioId) -> ResqResult<()> {
        let delete = Query::delete()
            .from_table(Scenario::Table)
            .and_where(Expr::col(Scenario::Id).eq(id.get()))
            .to_owned();
        if exec(&self.conn, &delete).await? == 0 {
            return Err(ResqError::scenario_not_found(id));
        }
        log::info!("deleted scenario #{id}");
        Ok(())
    }

    async fn delete_all_scenarios(&self) -> ResqResult<u64> {
        let delete = Query::delete().from_table(Scenario::Table).to_owned();
        let removed = exec(&self.conn, &delete).await?;
        log::info!("deleted {removed} scenarios");
        Ok(removed)
    }

    async fn create_sensitivity(&self, input: SensitivityInput) -> ResqResult<SensitivityId> {
        if !input.value.is_finite() {
            return Err(ResqError::validation(format!(
                "sensitivity value for {}:{} is not finite",
                input.node, input.attribute
            )));
        }
        let insert = Query::insert()
            .into_table(Sensitivity::Table)
            .columns([Sensitivity::Node, Sensitivity::Attribute, Sensitivity::Value])
            .values_panic([
                input.node.clone().into(),
                input.attribute.clone().into(),
                input.value.into(),
            ])
            .returning_col(Sensitivity::Id)
            .to_owned();
        let row = query_one(&self.conn, &insert)
            .await?
            .ok_or_else(|| ResqError::storage("sensitivity insert returned no id"))?;
        let id = SensitivityId(read_i64(&row, Sensitivity::Id)?);
        log::info!(
            "created sensitivity #{id} ({}:{}={})",
            input.node,
            input.attribute,
            input.value
        );
        Ok(id)
    }

    async fn get_sensitivity(&self, id: SensitivityId) -> ResqResult<Option<SensitivityRecord>> {
        let select = Query::select()
            .from(Sensitivity::Table)
            .columns([
                Sensitivity::Id,
                Sensitivity::Node,
                Sensitivity::Attribute,
                Sensitivity::Value,
            ])
            .and_where(Expr::col(Sensitivity::Id).eq(id.get()))
            .limit(1)
            .to_owned();
        let Some(row) = query_one(&self.conn, &select).await? else {
            return Ok(None);
        };
        Ok(Some(SensitivityRecord {
            id: SensitivityId(read_i64(&row, Sensitivity::Id)?),
            node: row.try_get("", &col_name(Sensitivity::Node))?,
            attribute: row.try_get("", &col_name(Sensitivity::Attribute))?,
            value: row.try_get("", &col_name(Sensitivity::Value))?,
        }))
    }
}

async fn resolve_name<C, T>(
    conn: &C,
    kind: ReferenceKind,
    columns: (T, T, T),
    name: &str,
) -> ResqResult<i64>
where
    C: ConnectionTrait,
    T: sea_query::Iden + Copy + 'static,
{
    let (table, id, name_col) = columns;
    let select = Query::select()
        .from(table)
        .column(id)
        .and_where(Expr::col(name_col).eq(name))
        .limit(1)
        .to_owned();
    let row = query_one(conn, &select)
        .await?
        .ok_or_else(|| ResqError::reference_not_found(kind, name))?;
    read_i64(&row, id)
}

fn scenario_select() -> SelectStatement {
    Query::select()
        .from(Scenario::Table)
        .column((Scenario::Table, Scenario::Id))
        .column((Scenario::Table, Scenario::SensitivityId))
        .expr_as(
            Expr::col((Period::Table, Period::Name)),
            Alias::new("period_name"),
        )
        .expr_as(
            Expr::col((Climate::Table, Climate::Name)),
            Alias::new("climate_name"),
        )
        .expr_as(
            Expr::col((Weather::Table, Weather::Name)),
            Alias::new("weather_name"),
        )
        .inner_join(
            Period::Table,
            join_on((Scenario::Table, Scenario::PeriodId), (Period::Table, Period::Id)),
        )
        .inner_join(
            Climate::Table,
            join_on((Scenario::Table, Scenario::ClimateId), (Climate::Table, Climate::Id)),
        )
        .inner_join(
            Weather::Table,
            join_on((Scenario::Table, Scenario::WeatherId), (Weather::Table, Weather::Id)),
        )
        .to_owned()
}

fn join_on<L, R>(left: L, right: R) -> SimpleExpr
where
    L: sea_query::IntoColumnRef,
    R: sea_query::IntoColumnRef,
{
    Expr::col(left).equals(right)
}

fn read_scenario(row: &QueryResult) -> ResqResult<ScenarioRecord> {
    Ok(ScenarioRecord {
        id: ScenarioId(read_i64(row, Scenario::Id)?),
        period: row.try_get("", "period_name")?,
        climate: row.try_get("", "climate_name")?,
        weather: row.try_get("", "weather_name")?,
        sensitivity_id: read_opt_i64(row, Scenario::SensitivityId)?.map(SensitivityId),
    })
}
