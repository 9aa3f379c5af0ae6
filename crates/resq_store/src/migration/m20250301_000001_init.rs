use sea_orm_migration::prelude::*;

use crate::db::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        create_reference_table(manager, Weather::Table, Weather::Id, Weather::Name, Weather::Description)
            .await?;
        create_reference_table(manager, Climate::Table, Climate::Id, Climate::Name, Climate::Description)
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Period::Table)
                    .if_not_exists()
                    .col(pk_col(Period::Id))
                    .col(ColumnDef::new(Period::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Period::ReferenceYear).integer())
                    .col(ColumnDef::new(Period::PeriodStart).integer())
                    .col(ColumnDef::new(Period::PeriodEnd).integer())
                    .col(ColumnDef::new(Period::Description).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sensitivity::Table)
                    .if_not_exists()
                    .col(pk_col(Sensitivity::Id))
                    .col(ColumnDef::new(Sensitivity::Node).string().not_null())
                    .col(ColumnDef::new(Sensitivity::Attribute).string().not_null())
                    .col(ColumnDef::new(Sensitivity::Value).double().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Scenario::Table)
                    .if_not_exists()
                    .col(pk_col(Scenario::Id))
                    .col(ColumnDef::new(Scenario::PeriodId).big_integer().not_null())
                    .col(ColumnDef::new(Scenario::WeatherId).big_integer().not_null())
                    .col(ColumnDef::new(Scenario::ClimateId).big_integer().not_null())
                    .col(ColumnDef::new(Scenario::SensitivityId).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scenario_period")
                            .from(Scenario::Table, Scenario::PeriodId)
                            .to(Period::Table, Period::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scenario_weather")
                            .from(Scenario::Table, Scenario::WeatherId)
                            .to(Weather::Table, Weather::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scenario_climate")
                            .from(Scenario::Table, Scenario::ClimateId)
                            .to(Climate::Table, Climate::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scenario_sensitivity")
                            .from(Scenario::Table, Scenario::SensitivityId)
                            .to(Sensitivity::Table, Sensitivity::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Cluster::Table)
                    .if_not_exists()
                    .col(pk_col(Cluster::Id))
                    .col(ColumnDef::new(Cluster::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Cluster::Geometry).text())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Scalar::Table)
                    .if_not_exists()
                    .col(pk_col(Scalar::Id))
                    .col(ColumnDef::new(Scalar::ScenarioId).big_integer().not_null())
                    .col(ColumnDef::new(Scalar::IsExogenous).boolean().not_null())
                    .col(ColumnDef::new(Scalar::FromNode).string().not_null())
                    .col(ColumnDef::new(Scalar::ToNode).string().null())
                    .col(ColumnDef::new(Scalar::Attribute).string().not_null())
                    .col(ColumnDef::new(Scalar::Value).double().not_null())
                    .col(ColumnDef::new(Scalar::ClusterId).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scalar_scenario")
                            .from(Scalar::Table, Scalar::ScenarioId)
                            .to(Scenario::Table, Scenario::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scalar_cluster")
                            .from(Scalar::Table, Scalar::ClusterId)
                            .to(Cluster::Table, Cluster::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sequence::Table)
                    .if_not_exists()
                    .col(pk_col(Sequence::Id))
                    .col(ColumnDef::new(Sequence::ScenarioId).big_integer().not_null())
                    .col(ColumnDef::new(Sequence::IsExogenous).boolean().not_null())
                    .col(ColumnDef::new(Sequence::FromNode).string().not_null())
                    .col(ColumnDef::new(Sequence::ToNode).string().null())
                    .col(ColumnDef::new(Sequence::Attribute).string().not_null())
                    .col(ColumnDef::new(Sequence::Timeseries).text().not_null())
                    .col(ColumnDef::new(Sequence::TotalEnergy).double().not_null())
                    .col(ColumnDef::new(Sequence::ClusterId).big_integer().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sequence_scenario")
                            .from(Sequence::Table, Sequence::ScenarioId)
                            .to(Scenario::Table, Scenario::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_sequence_cluster")
                            .from(Sequence::Table, Sequence::ClusterId)
                            .to(Cluster::Table, Cluster::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Label::Table)
                    .if_not_exists()
                    .col(pk_col(Label::Id))
                    .col(ColumnDef::new(Label::Component).string().not_null().unique_key())
                    .col(ColumnDef::new(Label::IsBus).boolean().not_null())
                    .col(ColumnDef::new(Label::Label).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(pk_col(Category::Id))
                    .col(ColumnDef::new(Category::FromNode).string().not_null())
                    .col(ColumnDef::new(Category::ToNode).string().null())
                    .col(ColumnDef::new(Category::Category).string().not_null())
                    .col(ColumnDef::new(Category::Carrier).string().not_null())
                    .col(ColumnDef::new(Category::IsRenewable).boolean().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scalar_scenario")
                    .table(Scalar::Table)
                    .col(Scalar::ScenarioId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_sequence_scenario")
                    .table(Sequence::Table)
                    .col(Sequence::ScenarioId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        drop_table(manager, Category::Table).await?;
        drop_table(manager, Label::Table).await?;
        drop_table(manager, Sequence::Table).await?;
        drop_table(manager, Scalar::Table).await?;
        drop_table(manager, Cluster::Table).await?;
        drop_table(manager, Scenario::Table).await?;
        drop_table(manager, Sensitivity::Table).await?;
        drop_table(manager, Period::Table).await?;
        drop_table(manager, Climate::Table).await?;
        drop_table(manager, Weather::Table).await?;
        Ok(())
    }
}

async fn create_reference_table<T: Iden + Copy + 'static>(
    manager: &SchemaManager<'_>,
    table: T,
    id: T,
    name: T,
    description: T,
) -> Result<(), DbErr> {
    manager
        .create_table(
            Table::create()
                .table(table)
                .if_not_exists()
                .col(pk_col(id))
                .col(ColumnDef::new(name).string().not_null().unique_key())
                .col(ColumnDef::new(description).string())
                .to_owned(),
        )
        .await
}

async fn drop_table(manager: &SchemaManager<'_>, table: impl Iden + 'static) -> Result<(), DbErr> {
    manager
        .drop_table(Table::drop().table(table).if_exists().to_owned())
        .await
}

fn pk_col(col: impl Iden + 'static) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}
